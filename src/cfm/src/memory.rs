use tracing::trace;

use crate::{record::RecordKind, Error, Result};

/// Read access to the address space of the process being inspected.
pub trait RemoteMemory {
    /// Best-effort read into `buf`. Returns how many leading bytes were filled, which may be fewer
    /// than requested (including zero) if part of the range is unreadable.
    fn read_partial(&self, addr: u64, buf: &mut [u8]) -> usize;
}

impl<M: RemoteMemory + ?Sized> RemoteMemory for &M {
    fn read_partial(&self, addr: u64, buf: &mut [u8]) -> usize {
        (**self).read_partial(addr, buf)
    }
}

/// Fills all of `buf` or fails with [`Error::Io`]. Short reads are not retried.
pub fn read_exact(mem: &impl RemoteMemory, addr: u64, buf: &mut [u8]) -> Result<()> {
    let got = mem.read_partial(addr, buf);
    trace!("read {:#x}+{}: got {}", addr, buf.len(), got);
    if got < buf.len() {
        return Err(Error::Io {
            addr,
            wanted: buf.len(),
            got,
        });
    }
    Ok(())
}

/// Decodes the big-endian u32 at `offset`, checking it lies within `buf`.
pub fn read_u32_be(buf: &[u8], offset: usize, kind: RecordKind) -> Result<u32> {
    let malformed = || Error::MalformedLayout {
        kind,
        offset,
        width: 4,
        len: buf.len(),
    };
    let end = offset.checked_add(4).ok_or_else(malformed)?;
    let bytes = buf.get(offset..end).ok_or_else(malformed)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Dereferences a 32-bit big-endian pointer in remote memory.
pub fn read_pointer(mem: &impl RemoteMemory, addr: u64) -> Result<u64> {
    let mut buf = [0u8; 4];
    read_exact(mem, addr, &mut buf)?;
    Ok(u32::from_be_bytes(buf) as u64)
}

#[cfg(target_os = "macos")]
pub use self::mach::TaskMemory;

#[cfg(target_os = "macos")]
mod mach {
    use sysx::mach::{vm, KernReturn, TaskPort};
    use tracing::trace;

    use super::RemoteMemory;

    /// Memory of a live Mach task, read with `mach_vm_read_overwrite`.
    pub struct TaskMemory {
        port: TaskPort,
    }

    impl TaskMemory {
        pub fn new(port: TaskPort) -> Self {
            Self { port }
        }

        pub fn for_pid(pid: i32) -> Result<Self, KernReturn> {
            TaskPort::for_pid(pid).map(Self::new)
        }
    }

    impl RemoteMemory for TaskMemory {
        fn read_partial(&self, addr: u64, buf: &mut [u8]) -> usize {
            vm::read_partial(&self.port, addr, buf).unwrap_or_else(|e| {
                trace!("task read at {:#x} failed: {}", addr, e);
                0
            })
        }
    }
}
