use crate::{
    memory::RemoteMemory,
    record::{fetch_container_info, fetch_section_info_at, RecordKind, SectionInfo},
    CfmLayout, Error, Result,
};

/// Address of section `index` of the container record at `container`.
///
/// Sections are an array at the tail of the container record that stops one slot short of the
/// record's end.
pub fn section_address(layout: &CfmLayout, container: u64, index: u32) -> Result<u64> {
    let section_len = layout.section_length as u64;
    let trailer = section_len.checked_mul(2);
    let offset = (index as u64).checked_mul(section_len);
    container
        .checked_add(layout.container_length as u64)
        .zip(trailer)
        .and_then(|(end, trailer)| end.checked_sub(trailer))
        .zip(offset)
        .and_then(|(base, offset)| base.checked_add(offset))
        .ok_or(Error::SectionAddress { container, index })
}

/// Reads section `index` of a container. Fails with [`Error::NoSection`] when the container has
/// fewer sections.
pub fn fetch_container_section_info(
    layout: &CfmLayout,
    mem: &impl RemoteMemory,
    container: u64,
    index: u32,
) -> Result<SectionInfo> {
    layout.check_record_length(RecordKind::Section)?;
    let info = fetch_container_info(layout, mem, container)?;
    if index >= info.section_count {
        return Err(Error::NoSection {
            index,
            count: info.section_count,
        });
    }

    let addr = section_address(layout, container, index)?;
    fetch_section_info_at(layout, mem, addr)
}
