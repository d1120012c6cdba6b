//! Container nesting
//!
//! Nesting is stored as child -> holder links by id. A child container is the
//! one carried by a bag item; its holder is the container the bag lies in.

use gridbag_core::{ContainerId, InventoryError, Result};
use std::collections::BTreeMap;

/// Parent links between containers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    holders: BTreeMap<ContainerId, ContainerId>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Container currently holding `child`
    pub fn holder(&self, child: ContainerId) -> Option<ContainerId> {
        self.holders.get(&child).copied()
    }

    /// Is `container` held by nothing?
    pub fn is_root(&self, container: ContainerId) -> bool {
        !self.holders.contains_key(&container)
    }

    /// Holders of `container`, nearest first.
    ///
    /// Stops after visiting every link once, so a damaged table cannot loop.
    pub fn ancestors(&self, container: ContainerId) -> Vec<ContainerId> {
        let mut chain = Vec::new();
        let mut current = container;
        while let Some(holder) = self.holder(current) {
            if chain.len() > self.holders.len() || holder == container {
                break;
            }
            chain.push(holder);
            current = holder;
        }
        chain
    }

    /// Is `ancestor` equal to `container` or one of its holders?
    pub fn is_within(&self, container: ContainerId, ancestor: ContainerId) -> bool {
        container == ancestor || self.ancestors(container).contains(&ancestor)
    }

    /// Reject placing `child` somewhere inside itself
    pub fn check_nesting(&self, child: ContainerId, target: ContainerId) -> Result<()> {
        if self.is_within(target, child) {
            return Err(InventoryError::CyclicContainment {
                container: child,
                target,
            });
        }
        Ok(())
    }

    /// Record that `child` now lies inside `holder`
    pub fn attach(&mut self, child: ContainerId, holder: ContainerId) -> Result<()> {
        self.check_nesting(child, holder)?;
        self.holders.insert(child, holder);
        Ok(())
    }

    /// Make `child` a root container
    pub fn detach(&mut self, child: ContainerId) -> Option<ContainerId> {
        self.holders.remove(&child)
    }

    /// Containers directly held by `holder`
    pub fn children(&self, holder: ContainerId) -> Vec<ContainerId> {
        self.holders
            .iter()
            .filter(|(_, h)| **h == holder)
            .map(|(c, _)| *c)
            .collect()
    }

    /// Every container nested below `holder`, breadth first
    pub fn descendants(&self, holder: ContainerId) -> Vec<ContainerId> {
        let mut found = Vec::new();
        let mut frontier = vec![holder];
        while let Some(next) = frontier.pop() {
            for child in self.children(next) {
                if child != holder && !found.contains(&child) {
                    found.push(child);
                    frontier.push(child);
                }
            }
        }
        found
    }

    /// Iterate over `(child, holder)` links
    pub fn iter(&self) -> impl Iterator<Item = (ContainerId, ContainerId)> + '_ {
        self.holders.iter().map(|(c, h)| (*c, *h))
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(raw: u64) -> ContainerId {
        ContainerId::from_raw(raw)
    }

    #[test]
    fn test_attach_and_ancestors() {
        let mut topo = Topology::new();
        topo.attach(c(2), c(1)).unwrap();
        topo.attach(c(3), c(2)).unwrap();

        assert_eq!(topo.ancestors(c(3)), vec![c(2), c(1)]);
        assert!(topo.is_within(c(3), c(1)));
        assert!(topo.is_root(c(1)));
        assert_eq!(topo.descendants(c(1)), vec![c(2), c(3)]);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut topo = Topology::new();
        // A inside B
        topo.attach(c(1), c(2)).unwrap();
        // B inside A
        assert_eq!(
            topo.attach(c(2), c(1)),
            Err(InventoryError::CyclicContainment {
                container: c(2),
                target: c(1)
            })
        );
        assert_eq!(
            topo.attach(c(5), c(5)),
            Err(InventoryError::CyclicContainment {
                container: c(5),
                target: c(5)
            })
        );
        assert_eq!(topo.len(), 1);
    }

    #[test]
    fn test_detach() {
        let mut topo = Topology::new();
        topo.attach(c(2), c(1)).unwrap();
        assert_eq!(topo.detach(c(2)), Some(c(1)));
        assert!(topo.is_root(c(2)));
        assert!(topo.attach(c(1), c(2)).is_ok());
    }
}
