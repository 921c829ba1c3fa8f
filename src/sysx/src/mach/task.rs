use mach2::{
    mach_port::mach_port_deallocate,
    port::{mach_port_name_t, MACH_PORT_NULL},
    traps::{mach_task_self, task_for_pid},
};

use super::KernReturn;

/// Send right to another task's control port. Released on drop.
#[derive(Debug)]
pub struct TaskPort {
    port: mach_port_name_t,
}

impl TaskPort {
    /// Needs the `com.apple.security.cs.debugger` entitlement or root, like any debugger.
    pub fn for_pid(pid: i32) -> Result<Self, KernReturn> {
        let mut port: mach_port_name_t = MACH_PORT_NULL;
        KernReturn::result(unsafe { task_for_pid(mach_task_self(), pid, &mut port) })?;
        Ok(Self { port })
    }

    pub fn as_raw(&self) -> mach_port_name_t {
        self.port
    }
}

impl Drop for TaskPort {
    fn drop(&mut self) {
        let ret = unsafe { mach_port_deallocate(mach_task_self(), self.port) };
        if let Err(e) = KernReturn::result(ret) {
            tracing::error!("failed to release task port {:#x}: {}", self.port, e);
        }
    }
}
