use tracing::{debug, warn};

use crate::{
    memory::{read_pointer, RemoteMemory},
    record::fetch_container_info,
    section::fetch_container_section_info,
    walker::fetch_context_containers,
    CfmLayout, Error, Result,
};

/// Per-process CFM state the debugger keeps between scans.
#[derive(Debug, Clone, Default)]
pub struct CfmStatus {
    /// Address of the word holding the current universe pointer. Unset until the target's CFM
    /// runtime has reported in.
    pub info_api_cookie: Option<u64>,
    pub layout: CfmLayout,
}

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum LoadReason {
    Cfm,
}

/// One loaded code fragment, as handed to the module registry.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ModuleDescriptor {
    pub name: String,
    pub address: u64,
    pub slide: u64,
    pub length: u32,
    pub index: u32,
    /// Remote address of the container record. Doubles as the module's identity.
    pub container: u64,
    /// Total length of section 0, when the container has one.
    pub section_length: Option<u32>,
    pub reason: LoadReason,
}

/// Receives modules discovered by [`update`]. Deduplication across scans is up to the
/// implementation.
pub trait ModuleRegistry {
    fn create_entry(&mut self, module: ModuleDescriptor);
}

impl ModuleRegistry for Vec<ModuleDescriptor> {
    fn create_entry(&mut self, module: ModuleDescriptor) {
        self.push(module);
    }
}

fn project_container(
    layout: &CfmLayout,
    mem: &impl RemoteMemory,
    container: u64,
) -> Result<ModuleDescriptor> {
    let info = fetch_container_info(layout, mem, container)?;

    let section_length = if info.section_count > 0 {
        // a container that claims sections but can't produce the first one is skipped
        match fetch_container_section_info(layout, mem, container, 0) {
            Ok(section) => Some(section.length),
            Err(e) if e.is_no_section() => None,
            Err(e) => return Err(e),
        }
    } else {
        None
    };

    Ok(ModuleDescriptor {
        name: info.name.to_string_lossy().into_owned(),
        address: info.address,
        // CFM fragments aren't relocated after load
        slide: info.address,
        length: info.length,
        index: 0,
        container,
        section_length,
        reason: LoadReason::Cfm,
    })
}

/// Scans the target's CFM universe and registers one module per readable container, in list
/// order. Returns how many were registered.
///
/// [`Error::NoContext`] means CFM isn't up in the target yet. A container that fails to decode,
/// including its first section when it claims to have one, is skipped; failures reading the
/// universe or walking the list abort the scan.
pub fn update(
    mem: &impl RemoteMemory,
    status: &CfmStatus,
    registry: &mut impl ModuleRegistry,
) -> Result<usize> {
    let layout = &status.layout;
    layout.check_record_lengths()?;

    let cookie = match status.info_api_cookie {
        Some(cookie) if cookie != 0 => cookie,
        _ => return Err(Error::NoContext),
    };
    let universe = read_pointer(mem, cookie)?;
    if universe == 0 {
        return Err(Error::NoContext);
    }

    let (total, _) = fetch_context_containers(layout, mem, universe, 0, 0)?;
    let (reread_total, containers) = fetch_context_containers(layout, mem, universe, 0, total)?;
    if reread_total != total || containers.len() != total as usize {
        warn!(
            "container list changed during scan: {} then {} ({} walked)",
            total,
            reread_total,
            containers.len()
        );
        return Err(Error::Inconsistent(format!(
            "container count changed from {total} to {reread_total}"
        )));
    }

    let mut registered = 0;
    for container in containers {
        match project_container(layout, mem, container) {
            Ok(module) => {
                registry.create_entry(module);
                registered += 1;
            }
            Err(e) => debug!("skipping container {:#x}: {}", container, e),
        }
    }

    Ok(registered)
}
