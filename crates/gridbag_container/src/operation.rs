//! Primitive operations

use gridbag_core::{ContainerId, DefinitionKey, ItemId, Rotation};
use gridbag_grid::Placement;

/// Where an added stack should go
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlacementRequest {
    /// Top up existing stacks, then use the first free slot
    #[default]
    Auto,
    /// Top up existing stacks, then put the first new stack here
    At(Placement),
    /// Top up this stack first, then the others, then free slots
    Onto(ItemId),
}

/// One primitive mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Add {
        container: ContainerId,
        definition: DefinitionKey,
        count: u32,
        placement: PlacementRequest,
    },
    Remove {
        item: ItemId,
    },
    Consume {
        item: ItemId,
        amount: u32,
    },
    Move {
        item: ItemId,
        from: ContainerId,
        to: ContainerId,
        placement: Option<Placement>,
    },
    Rotate {
        item: ItemId,
        rotation: Rotation,
    },
    Split {
        item: ItemId,
        amount: u32,
        placement: Option<Placement>,
    },
    Merge {
        source: ItemId,
        target: ItemId,
    },
}

impl Operation {
    pub fn add(container: ContainerId, definition: impl Into<DefinitionKey>, count: u32) -> Self {
        Operation::Add {
            container,
            definition: definition.into(),
            count,
            placement: PlacementRequest::Auto,
        }
    }

    pub fn add_at(
        container: ContainerId,
        definition: impl Into<DefinitionKey>,
        count: u32,
        placement: Placement,
    ) -> Self {
        Operation::Add {
            container,
            definition: definition.into(),
            count,
            placement: PlacementRequest::At(placement),
        }
    }

    pub fn remove(item: ItemId) -> Self {
        Operation::Remove { item }
    }

    pub fn consume(item: ItemId, amount: u32) -> Self {
        Operation::Consume { item, amount }
    }

    pub fn move_to(item: ItemId, from: ContainerId, to: ContainerId, placement: Option<Placement>) -> Self {
        Operation::Move {
            item,
            from,
            to,
            placement,
        }
    }

    pub fn rotate(item: ItemId, rotation: Rotation) -> Self {
        Operation::Rotate { item, rotation }
    }

    pub fn split(item: ItemId, amount: u32, placement: Option<Placement>) -> Self {
        Operation::Split {
            item,
            amount,
            placement,
        }
    }

    pub fn merge(source: ItemId, target: ItemId) -> Self {
        Operation::Merge { source, target }
    }

    /// Containers named directly by the operation
    pub fn containers(&self) -> Vec<ContainerId> {
        match self {
            Operation::Add { container, .. } => vec![*container],
            Operation::Move { from, to, .. } => vec![*from, *to],
            _ => Vec::new(),
        }
    }

    /// Existing items the operation refers to
    pub fn items(&self) -> Vec<ItemId> {
        match self {
            Operation::Add {
                placement: PlacementRequest::Onto(item),
                ..
            } => vec![*item],
            Operation::Add { .. } => Vec::new(),
            Operation::Remove { item }
            | Operation::Consume { item, .. }
            | Operation::Move { item, .. }
            | Operation::Rotate { item, .. }
            | Operation::Split { item, .. } => vec![*item],
            Operation::Merge { source, target } => vec![*source, *target],
        }
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Add { .. } => "add",
            Operation::Remove { .. } => "remove",
            Operation::Consume { .. } => "consume",
            Operation::Move { .. } => "move",
            Operation::Rotate { .. } => "rotate",
            Operation::Split { .. } => "split",
            Operation::Merge { .. } => "merge",
        }
    }
}
