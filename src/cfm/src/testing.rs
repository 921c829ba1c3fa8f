use std::{cell::Cell, collections::BTreeMap};

use crate::{memory::RemoteMemory, CfmLayout};

/// Byte-granular fake address space. Unwritten bytes are unreadable, so a read stops at the first
/// hole.
#[derive(Default)]
pub struct SparseMemory {
    bytes: BTreeMap<u64, u8>,
    reads: Cell<usize>,
}

impl SparseMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, addr: u64, data: &[u8]) {
        for (i, b) in data.iter().enumerate() {
            self.bytes.insert(addr + i as u64, *b);
        }
    }

    pub fn write_u32(&mut self, addr: u64, value: u32) {
        self.write(addr, &value.to_be_bytes());
    }

    pub fn unmap(&mut self, addr: u64, len: u64) {
        for a in addr..addr + len {
            self.bytes.remove(&a);
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl RemoteMemory for SparseMemory {
    fn read_partial(&self, addr: u64, buf: &mut [u8]) -> usize {
        self.reads.set(self.reads.get() + 1);
        for (i, slot) in buf.iter_mut().enumerate() {
            match self.bytes.get(&(addr + i as u64)) {
                Some(b) => *slot = *b,
                None => return i,
            }
        }
        buf.len()
    }
}

pub fn test_layout() -> CfmLayout {
    CfmLayout {
        universe_length: 40,
        universe_container_offset: 4,
        universe_connection_offset: 16,
        universe_closure_offset: 28,

        container_length: 64,
        container_next_offset: 0,
        container_address_offset: 4,
        container_length_offset: 8,
        container_section_count_offset: 12,
        container_fragment_name_offset: 16,

        connection_length: 16,
        connection_next_offset: 0,
        connection_container_offset: 4,

        section_length: 16,
        section_total_length_offset: 4,

        instance_length: 8,
        instance_address_offset: 4,
    }
}

pub const COOKIE: u64 = 0x1000;
pub const UNIVERSE: u64 = 0x2000;
const FIRST_CONTAINER: u64 = 0x10000;
const CONTAINER_STRIDE: u64 = 0x1000;
// name bytes live past the record and its trailing sections
const NAME_OFFSET: u64 = 0x800;

struct FakeContainer {
    name: Vec<u8>,
    address: u32,
    length: u32,
    sections: Vec<u32>,
}

/// Lays out a cookie, a universe, and a linked list of containers (with names and trailing
/// sections) according to a layout table.
pub struct ImageBuilder {
    layout: CfmLayout,
    containers: Vec<FakeContainer>,
}

pub struct Image {
    pub mem: SparseMemory,
    pub layout: CfmLayout,
    pub containers: Vec<u64>,
}

impl ImageBuilder {
    pub fn new(layout: CfmLayout) -> Self {
        Self {
            layout,
            containers: Vec::new(),
        }
    }

    pub fn container(mut self, name: &str, address: u32, length: u32, sections: &[u32]) -> Self {
        self.containers.push(FakeContainer {
            name: name.as_bytes().to_vec(),
            address,
            length,
            sections: sections.to_vec(),
        });
        self
    }

    pub fn build(self) -> Image {
        let layout = self.layout;
        let mut mem = SparseMemory::new();

        let addrs: Vec<u64> = (0..self.containers.len() as u64)
            .map(|i| FIRST_CONTAINER + i * CONTAINER_STRIDE)
            .collect();

        mem.write_u32(COOKIE, UNIVERSE as u32);
        mem.write(UNIVERSE, &vec![0u8; layout.universe_length]);
        let list = UNIVERSE + layout.universe_container_offset as u64;
        mem.write_u32(list, addrs.first().copied().unwrap_or(0) as u32);
        mem.write_u32(list + 4, addrs.last().copied().unwrap_or(0) as u32);
        mem.write_u32(list + 8, addrs.len() as u32);

        for (i, (c, &rec)) in self.containers.iter().zip(&addrs).enumerate() {
            let next = addrs.get(i + 1).copied().unwrap_or(0);
            let name_addr = rec + NAME_OFFSET;

            mem.write(rec, &vec![0u8; layout.container_length]);
            mem.write_u32(rec + layout.container_next_offset as u64, next as u32);
            mem.write_u32(rec + layout.container_address_offset as u64, c.address);
            mem.write_u32(rec + layout.container_length_offset as u64, c.length);
            mem.write_u32(
                rec + layout.container_section_count_offset as u64,
                c.sections.len() as u32,
            );
            let name_word = ((c.name.len() as u32) << 16) | 0x5a5a;
            let name_ref = rec + layout.container_fragment_name_offset as u64;
            mem.write_u32(name_ref, name_word);
            mem.write_u32(name_ref + 4, name_addr as u32);
            mem.write(name_addr, &c.name);

            let sections_base =
                rec + layout.container_length as u64 - 2 * layout.section_length as u64;
            for (j, &len) in c.sections.iter().enumerate() {
                let sec = sections_base + (j * layout.section_length) as u64;
                mem.write(sec, &vec![0u8; layout.section_length]);
                mem.write_u32(sec + layout.section_total_length_offset as u64, len);
            }
        }

        Image {
            mem,
            layout,
            containers: addrs,
        }
    }
}

impl Image {
    pub fn set_declared_length(&mut self, length: u32) {
        let list = UNIVERSE + self.layout.universe_container_offset as u64;
        self.mem.write_u32(list + 8, length);
    }

    pub fn set_next(&mut self, container: usize, next: u64) {
        let rec = self.containers[container];
        self.mem
            .write_u32(rec + self.layout.container_next_offset as u64, next as u32);
    }

    pub fn set_name_word(&mut self, container: usize, word: u32) {
        let rec = self.containers[container];
        self.mem
            .write_u32(rec + self.layout.container_fragment_name_offset as u64, word);
    }

    pub fn set_section_count(&mut self, container: usize, count: u32) {
        let rec = self.containers[container];
        self.mem
            .write_u32(rec + self.layout.container_section_count_offset as u64, count);
    }

    pub fn section_addr(&self, container: usize, index: usize) -> u64 {
        self.containers[container] + self.layout.container_length as u64
            - 2 * self.layout.section_length as u64
            + (index * self.layout.section_length) as u64
    }
}
