//! Discovery of Code Fragment Manager (CFM) fragments loaded in another process.
//!
//! The CFM runtime keeps its bookkeeping in big-endian records whose field offsets differ per ABI
//! variant, so every decode goes through a [`CfmLayout`]. Starting from the info-API cookie,
//! [`update`] follows the universe's container list and hands a [`ModuleDescriptor`] for each
//! fragment to a [`ModuleRegistry`].

mod error;
pub mod layout;
pub mod memory;
mod projector;
pub mod record;
pub mod section;
pub mod walker;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use layout::{CfmLayout, MAX_RECORD_LENGTH};
pub use memory::RemoteMemory;
#[cfg(target_os = "macos")]
pub use memory::TaskMemory;
pub use projector::{update, CfmStatus, LoadReason, ModuleDescriptor, ModuleRegistry};
