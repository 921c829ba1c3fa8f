use tracing::warn;

use crate::{
    memory::RemoteMemory,
    record::{fetch_container_link, fetch_universe_info},
    CfmLayout, Error, Result,
};

/// Follows container `next` links for a fixed number of steps.
///
/// The step count comes from the universe's declared list length, never from the null
/// terminator, so a cyclic list still ends. Hitting null early is an error.
pub struct ContainerCursor<'a, M> {
    layout: &'a CfmLayout,
    mem: &'a M,
    next: u64,
    remaining: u32,
}

impl<'a, M: RemoteMemory> ContainerCursor<'a, M> {
    pub fn new(layout: &'a CfmLayout, mem: &'a M, head: u64, steps: u32) -> Self {
        Self {
            layout,
            mem,
            next: head,
            remaining: steps,
        }
    }
}

impl<M: RemoteMemory> Iterator for ContainerCursor<'_, M> {
    type Item = Result<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let current = self.next;
        if current == 0 {
            self.remaining = 0;
            warn!("container list ended early");
            return Some(Err(Error::Inconsistent(
                "list shorter than declared length".to_string(),
            )));
        }

        match fetch_container_link(self.layout, self.mem, current) {
            Ok(link) => {
                self.next = link.next;
                self.remaining -= 1;
                Some(Ok(current))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}

/// Addresses of the containers in a universe, skipping `skip` and returning at most `take`.
///
/// Returns the declared total along with the addresses. Nothing past the universe is read when
/// `skip` is at or beyond the total.
pub fn fetch_context_containers(
    layout: &CfmLayout,
    mem: &impl RemoteMemory,
    universe: u64,
    skip: u32,
    take: u32,
) -> Result<(u32, Vec<u64>)> {
    let info = fetch_universe_info(layout, mem, universe)?;
    let total = info.containers.length;

    if skip >= total {
        return Ok((total, Vec::new()));
    }
    let take = take.min(total - skip);

    let mut cursor = ContainerCursor::new(layout, mem, info.containers.head, skip + take);
    for step in cursor.by_ref().take(skip as usize) {
        step?;
    }
    let addrs = cursor.collect::<Result<Vec<_>>>()?;

    Ok((total, addrs))
}
