mod kern_return;
pub mod task;
pub mod vm;

pub use kern_return::KernReturn;
pub use task::TaskPort;
