//! Anything queries can read items from

use gridbag_container::{ContainerArena, ItemInstance};
use gridbag_core::ContainerId;

/// Read-only access to containers and their items
pub trait ItemSource {
    /// Every container id, ascending
    fn container_ids(&self) -> Vec<ContainerId>;

    /// Call `visit` for each item of `container` in insertion order.
    ///
    /// Returns false when the container does not exist.
    fn visit_items(&self, container: ContainerId, visit: &mut dyn FnMut(&ItemInstance)) -> bool;

    /// Call `read` exactly once with writers held off, so every container it
    /// visits shows the same committed state.
    ///
    /// Sources nobody mutates concurrently can rely on the default.
    fn read_consistent(&self, read: &mut dyn FnMut()) {
        read()
    }
}

impl ItemSource for ContainerArena {
    fn container_ids(&self) -> Vec<ContainerId> {
        ContainerArena::container_ids(self)
    }

    fn visit_items(&self, container: ContainerId, visit: &mut dyn FnMut(&ItemInstance)) -> bool {
        match self.container(container) {
            Ok(container) => {
                container.items().iter().for_each(visit);
                true
            }
            Err(_) => false,
        }
    }
}
