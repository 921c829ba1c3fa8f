use crate::record::RecordKind;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The info-API cookie (or the context pointer behind it) is unset. The process simply hasn't
    /// brought up CFM yet.
    #[error("no CFM context")]
    NoContext,

    #[error("short read at {addr:#x}: wanted {wanted} bytes, got {got}")]
    Io { addr: u64, wanted: usize, got: usize },

    #[error("{kind} field at offset {offset:#x} (width {width}) exceeds record length {len}")]
    MalformedLayout {
        kind: RecordKind,
        offset: usize,
        width: usize,
        len: usize,
    },

    #[error("section address overflows for container {container:#x} section {index}")]
    SectionAddress { container: u64, index: u32 },

    #[error("container name length {0} exceeds 63")]
    NameTooLong(usize),

    /// Not really a failure: the container has fewer sections than the requested index.
    #[error("section {index} out of range (container has {count})")]
    NoSection { index: u32, count: u32 },

    #[error("inconsistent container list: {0}")]
    Inconsistent(String),

    #[error("{kind} record length {len} exceeds maximum {max}")]
    RecordTooLarge {
        kind: RecordKind,
        len: usize,
        max: usize,
    },

    #[error("invalid layout table: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    pub fn is_no_context(&self) -> bool {
        matches!(self, Error::NoContext)
    }

    pub fn is_no_section(&self) -> bool {
        matches!(self, Error::NoSection { .. })
    }

    /// Malformed data (or a layout that doesn't match the target), as opposed to transport or
    /// list-consistency trouble.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::MalformedLayout { .. } | Error::SectionAddress { .. } | Error::NameTooLong(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
