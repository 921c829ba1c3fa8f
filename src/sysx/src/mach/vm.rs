use mach2::{
    vm::mach_vm_read_overwrite,
    vm_types::{mach_vm_address_t, mach_vm_size_t},
};
use tracing::trace;

use super::{KernReturn, TaskPort};

// smallest page size on any Mach host. 16K hosts just take more iterations
const READ_CHUNK: u64 = 0x1000;

fn read_overwrite(task: &TaskPort, addr: u64, buf: &mut [u8]) -> Result<usize, KernReturn> {
    let mut actual: mach_vm_size_t = 0;
    let ret = unsafe {
        mach_vm_read_overwrite(
            task.as_raw(),
            addr as mach_vm_address_t,
            buf.len() as mach_vm_size_t,
            buf.as_mut_ptr() as mach_vm_address_t,
            &mut actual,
        )
    };
    KernReturn::result(ret)?;
    Ok(actual as usize)
}

/// Best-effort read of `buf.len()` bytes at `addr` in another task.
///
/// `mach_vm_read_overwrite` fails the whole request if any page in the range is unmapped, so on
/// failure this retries page by page and returns however many leading bytes were readable. An
/// error is only returned when nothing could be read at all.
pub fn read_partial(task: &TaskPort, addr: u64, buf: &mut [u8]) -> Result<usize, KernReturn> {
    if buf.is_empty() {
        return Ok(0);
    }

    match read_overwrite(task, addr, buf) {
        Ok(n) => return Ok(n),
        Err(e) if !e.is_unmapped() => return Err(e),
        Err(e) => trace!("full read at {:#x} failed ({}), retrying per page", addr, e),
    }

    let mut total = 0usize;
    while total < buf.len() {
        let cursor = addr.wrapping_add(total as u64);
        let to_boundary = READ_CHUNK - (cursor % READ_CHUNK);
        let chunk_len = (to_boundary as usize).min(buf.len() - total);

        match read_overwrite(task, cursor, &mut buf[total..total + chunk_len]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if total == 0 => return Err(e),
            Err(_) => break,
        }
    }

    Ok(total)
}
