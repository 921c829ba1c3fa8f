use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{record::RecordKind, Error, Result};

/// Upper bound on any record length a layout may declare. Record buffers are stack arrays of this
/// size.
pub const MAX_RECORD_LENGTH: usize = 1024;

/// Byte offsets and lengths of every CFM record field for one ABI variant.
///
/// Offsets are only checked against the record length when a field is decoded, so a layout that
/// doesn't match the target surfaces as [`Error::MalformedLayout`] on the first read rather than
/// here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CfmLayout {
    pub universe_length: usize,
    // each of these is a {head, tail, length} triple
    pub universe_container_offset: usize,
    pub universe_connection_offset: usize,
    pub universe_closure_offset: usize,

    pub container_length: usize,
    #[serde(default)]
    pub container_next_offset: usize,
    pub container_address_offset: usize,
    pub container_length_offset: usize,
    pub container_section_count_offset: usize,
    // hashed string word, then string address
    pub container_fragment_name_offset: usize,

    pub connection_length: usize,
    pub connection_next_offset: usize,
    pub connection_container_offset: usize,

    pub section_length: usize,
    pub section_total_length_offset: usize,

    pub instance_length: usize,
    pub instance_address_offset: usize,
}

impl CfmLayout {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read layout table {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("parse layout table {}", path.display()))
    }

    pub fn record_length(&self, kind: RecordKind) -> usize {
        match kind {
            RecordKind::Universe => self.universe_length,
            RecordKind::Container => self.container_length,
            RecordKind::Connection => self.connection_length,
            RecordKind::Section => self.section_length,
            RecordKind::Instance => self.instance_length,
        }
    }

    pub(crate) fn check_record_length(&self, kind: RecordKind) -> Result<usize> {
        let len = self.record_length(kind);
        if len > MAX_RECORD_LENGTH {
            return Err(Error::RecordTooLarge {
                kind,
                len,
                max: MAX_RECORD_LENGTH,
            });
        }
        Ok(len)
    }

    /// Rejects any record kind whose declared length exceeds [`MAX_RECORD_LENGTH`].
    pub fn check_record_lengths(&self) -> Result<()> {
        for kind in RecordKind::ALL {
            self.check_record_length(kind)?;
        }
        Ok(())
    }
}
