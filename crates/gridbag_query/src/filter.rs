//! Composable item filters

use gridbag_catalog::ItemKind;
use gridbag_container::ItemInstance;
use gridbag_core::{DefinitionKey, Tag, TagSet};
use std::ops::Not;

/// Item kind without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindFilter {
    Basic,
    Consumable,
    Equippable,
    Container,
}

impl KindFilter {
    pub fn matches(self, kind: &ItemKind) -> bool {
        matches!(
            (self, kind),
            (KindFilter::Basic, ItemKind::Basic)
                | (KindFilter::Consumable, ItemKind::Consumable)
                | (KindFilter::Equippable, ItemKind::Equippable { .. })
                | (KindFilter::Container, ItemKind::Container(_))
        )
    }
}

/// Predicate over item instances
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ItemFilter {
    /// Every item
    #[default]
    All,
    /// Definition carries the tag or a descendant of it
    Tag(Tag),
    /// Definition matches at least one tag
    AnyTags(TagSet),
    /// Definition matches every tag
    AllTags(TagSet),
    /// Exact definition
    Definition(DefinitionKey),
    /// Stack count at least
    MinCount(u32),
    Kind(KindFilter),
    /// Instance value under `tag` is at least `value`
    TagValueAtLeast { tag: Tag, value: f64 },
    /// Held by an equipment container
    Equipped,
    /// Equipped in the slot or a sub-slot of it
    EquippedIn(Tag),
    And(Vec<ItemFilter>),
    Or(Vec<ItemFilter>),
    Not(Box<ItemFilter>),
}

impl ItemFilter {
    pub fn tag(tag: &str) -> Self {
        ItemFilter::Tag(Tag::new(tag))
    }

    pub fn any_tags<I, T>(tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        ItemFilter::AnyTags(tags.into_iter().collect())
    }

    pub fn all_tags<I, T>(tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        ItemFilter::AllTags(tags.into_iter().collect())
    }

    pub fn definition(key: impl Into<DefinitionKey>) -> Self {
        ItemFilter::Definition(key.into())
    }

    pub fn min_count(count: u32) -> Self {
        ItemFilter::MinCount(count)
    }

    pub fn kind(kind: KindFilter) -> Self {
        ItemFilter::Kind(kind)
    }

    pub fn value_at_least(tag: &str, value: f64) -> Self {
        ItemFilter::TagValueAtLeast {
            tag: Tag::new(tag),
            value,
        }
    }

    pub fn equipped() -> Self {
        ItemFilter::Equipped
    }

    pub fn equipped_in(slot: &str) -> Self {
        ItemFilter::EquippedIn(Tag::new(slot))
    }

    /// Both filters must match
    pub fn and(self, other: ItemFilter) -> Self {
        match self {
            ItemFilter::All => other,
            ItemFilter::And(mut filters) => {
                filters.push(other);
                ItemFilter::And(filters)
            }
            filter => ItemFilter::And(vec![filter, other]),
        }
    }

    /// Either filter must match
    pub fn or(self, other: ItemFilter) -> Self {
        match self {
            ItemFilter::Or(mut filters) => {
                filters.push(other);
                ItemFilter::Or(filters)
            }
            filter => ItemFilter::Or(vec![filter, other]),
        }
    }

    pub fn matches(&self, item: &ItemInstance) -> bool {
        match self {
            ItemFilter::All => true,
            ItemFilter::Tag(tag) => item.tags().has(tag),
            ItemFilter::AnyTags(tags) => item.tags().has_any(tags),
            ItemFilter::AllTags(tags) => item.tags().has_all(tags),
            ItemFilter::Definition(key) => item.key() == key,
            ItemFilter::MinCount(count) => item.count >= *count,
            ItemFilter::Kind(kind) => kind.matches(&item.definition.kind),
            ItemFilter::TagValueAtLeast { tag, value } => item
                .tag_values
                .get(tag)
                .map(|v| v >= *value)
                .unwrap_or(false),
            ItemFilter::Equipped => item.is_equipped(),
            ItemFilter::EquippedIn(slot) => item
                .equipped
                .as_ref()
                .map_or(false, |equipped| equipped.matches(slot)),
            ItemFilter::And(filters) => filters.iter().all(|f| f.matches(item)),
            ItemFilter::Or(filters) => filters.iter().any(|f| f.matches(item)),
            ItemFilter::Not(filter) => !filter.matches(item),
        }
    }
}

impl Not for ItemFilter {
    type Output = ItemFilter;

    fn not(self) -> ItemFilter {
        match self {
            ItemFilter::Not(inner) => *inner,
            filter => ItemFilter::Not(Box::new(filter)),
        }
    }
}
