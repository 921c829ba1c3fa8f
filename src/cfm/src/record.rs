//! Readers for the individual CFM records.
//!
//! Each reader pulls exactly one record (as long as the layout says) out of remote memory into a
//! fixed stack buffer and decodes the fields it cares about. All values are big-endian u32.

use std::{borrow::Cow, fmt};

use tracing::trace;

use crate::{
    layout::MAX_RECORD_LENGTH,
    memory::{read_exact, read_u32_be, RemoteMemory},
    CfmLayout, Error, Result,
};

pub const MAX_NAME_LENGTH: usize = 63;

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum RecordKind {
    Universe,
    Container,
    Connection,
    Section,
    Instance,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Universe,
        RecordKind::Container,
        RecordKind::Connection,
        RecordKind::Section,
        RecordKind::Instance,
    ];
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Universe => "universe",
            RecordKind::Container => "container",
            RecordKind::Connection => "connection",
            RecordKind::Section => "section",
            RecordKind::Instance => "instance",
        })
    }
}

/// Stack copy of one record.
struct RecordBuf {
    kind: RecordKind,
    data: [u8; MAX_RECORD_LENGTH],
    len: usize,
}

impl RecordBuf {
    fn fetch(
        layout: &CfmLayout,
        mem: &impl RemoteMemory,
        kind: RecordKind,
        addr: u64,
    ) -> Result<Self> {
        let len = layout.check_record_length(kind)?;
        let mut data = [0u8; MAX_RECORD_LENGTH];
        read_exact(mem, addr, &mut data[..len])?;
        Ok(Self { kind, data, len })
    }

    fn u32(&self, offset: usize) -> Result<u32> {
        read_u32_be(&self.data[..self.len], offset, self.kind)
    }

    fn addr(&self, offset: usize) -> Result<u64> {
        self.u32(offset).map(u64::from)
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ListInfo {
    pub head: u64,
    pub tail: u64,
    pub length: u32,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct UniverseInfo {
    pub containers: ListInfo,
    pub connections: ListInfo,
    pub closures: ListInfo,
}

/// Length-prefixed fragment name: byte 0 is the length, then the bytes, then a NUL.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct PascalName {
    raw: [u8; MAX_NAME_LENGTH + 2],
}

impl PascalName {
    pub fn len(&self) -> usize {
        self.raw[0] as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name bytes without the length prefix or terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw[1..1 + self.len()]
    }

    /// Raw storage including the length prefix and NUL terminator.
    pub fn as_raw(&self) -> &[u8] {
        &self.raw[..self.len() + 2]
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }
}

impl Default for PascalName {
    fn default() -> Self {
        Self {
            raw: [0; MAX_NAME_LENGTH + 2],
        }
    }
}

impl fmt::Debug for PascalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_string_lossy(), f)
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ContainerInfo {
    pub next: u64,
    pub address: u64,
    pub length: u32,
    pub section_count: u32,
    pub name: PascalName,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ConnectionInfo {
    pub next: u64,
    pub container: u64,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SectionInfo {
    pub length: u32,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct InstanceInfo {
    pub address: u64,
}

fn parse_list(rec: &RecordBuf, offset: usize) -> Result<ListInfo> {
    Ok(ListInfo {
        head: rec.addr(offset)?,
        tail: rec.addr(offset + 4)?,
        length: rec.u32(offset + 8)?,
    })
}

pub fn fetch_universe_info(
    layout: &CfmLayout,
    mem: &impl RemoteMemory,
    addr: u64,
) -> Result<UniverseInfo> {
    let rec = RecordBuf::fetch(layout, mem, RecordKind::Universe, addr)?;
    Ok(UniverseInfo {
        containers: parse_list(&rec, layout.universe_container_offset)?,
        connections: parse_list(&rec, layout.universe_connection_offset)?,
        closures: parse_list(&rec, layout.universe_closure_offset)?,
    })
}

fn parse_container_link(layout: &CfmLayout, rec: &RecordBuf) -> Result<ContainerInfo> {
    Ok(ContainerInfo {
        next: rec.addr(layout.container_next_offset)?,
        address: rec.addr(layout.container_address_offset)?,
        length: rec.u32(layout.container_length_offset)?,
        section_count: rec.u32(layout.container_section_count_offset)?,
        name: PascalName::default(),
    })
}

/// Container record without its name. One remote read.
pub fn fetch_container_link(
    layout: &CfmLayout,
    mem: &impl RemoteMemory,
    addr: u64,
) -> Result<ContainerInfo> {
    let rec = RecordBuf::fetch(layout, mem, RecordKind::Container, addr)?;
    parse_container_link(layout, &rec)
}

/// Full container record, including the fragment name, which takes a second remote read.
pub fn fetch_container_info(
    layout: &CfmLayout,
    mem: &impl RemoteMemory,
    addr: u64,
) -> Result<ContainerInfo> {
    let rec = RecordBuf::fetch(layout, mem, RecordKind::Container, addr)?;
    let mut info = parse_container_link(layout, &rec)?;

    // high half of the hashed string word is the length
    let name_offset = layout.container_fragment_name_offset;
    let name_len = (rec.u32(name_offset)? >> 16) as usize;
    if name_len > MAX_NAME_LENGTH {
        return Err(Error::NameTooLong(name_len));
    }
    let name_addr = rec.addr(name_offset + 4)?;

    info.name.raw[0] = name_len as u8;
    if name_len > 0 {
        read_exact(mem, name_addr, &mut info.name.raw[1..1 + name_len])?;
    }
    info.name.raw[1 + name_len] = 0;

    trace!("container {:#x}: {:?}", addr, info);
    Ok(info)
}

pub fn fetch_connection_info(
    layout: &CfmLayout,
    mem: &impl RemoteMemory,
    addr: u64,
) -> Result<ConnectionInfo> {
    let rec = RecordBuf::fetch(layout, mem, RecordKind::Connection, addr)?;
    Ok(ConnectionInfo {
        next: rec.addr(layout.connection_next_offset)?,
        container: rec.addr(layout.connection_container_offset)?,
    })
}

/// Section record at an already-computed address. See [`crate::section`] for locating one.
pub fn fetch_section_info_at(
    layout: &CfmLayout,
    mem: &impl RemoteMemory,
    addr: u64,
) -> Result<SectionInfo> {
    let rec = RecordBuf::fetch(layout, mem, RecordKind::Section, addr)?;
    Ok(SectionInfo {
        length: rec.u32(layout.section_total_length_offset)?,
    })
}

pub fn fetch_instance_info(
    layout: &CfmLayout,
    mem: &impl RemoteMemory,
    addr: u64,
) -> Result<InstanceInfo> {
    let rec = RecordBuf::fetch(layout, mem, RecordKind::Instance, addr)?;
    Ok(InstanceInfo {
        address: rec.addr(layout.instance_address_offset)?,
    })
}
