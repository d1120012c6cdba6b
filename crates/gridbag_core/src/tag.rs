//! Hierarchical tags
//!
//! Tags are dotted paths such as `Item.Type.Weapon.Gun`. A tag matches itself
//! and every ancestor path, so querying for `Item.Type.Weapon` finds guns.

use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};

/// A hierarchical, dot-separated tag
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(Box<str>);

impl Tag {
    /// Create a new tag
    pub fn new(path: &str) -> Self {
        Self(path.trim_matches('.').into())
    }

    /// Get the tag path
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this tag equals `other` or is a descendant of it
    pub fn matches(&self, other: &Tag) -> bool {
        let own = self.as_str();
        let parent = other.as_str();
        own == parent
            || (own.len() > parent.len()
                && own.starts_with(parent)
                && own.as_bytes()[parent.len()] == b'.')
    }

    /// Exact comparison, ignoring hierarchy
    #[inline]
    pub fn matches_exact(&self, other: &Tag) -> bool {
        self == other
    }

    /// Get the parent tag (`A.B.C` -> `A.B`)
    pub fn parent(&self) -> Option<Tag> {
        self.0.rfind('.').map(|idx| Tag(self.0[..idx].into()))
    }

    /// Number of path segments
    pub fn depth(&self) -> usize {
        self.0.split('.').count()
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Tag {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

/// An ordered set of tags
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<Tag>);

impl TagSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Add a tag (builder pattern)
    pub fn with(mut self, tag: impl Into<Tag>) -> Self {
        self.insert(tag);
        self
    }

    /// Add a tag
    pub fn insert(&mut self, tag: impl Into<Tag>) -> bool {
        self.0.insert(tag.into())
    }

    /// Remove a tag
    pub fn remove(&mut self, tag: &Tag) -> bool {
        self.0.remove(tag)
    }

    /// Does any tag in the set match `tag` (hierarchically)?
    pub fn has(&self, tag: &Tag) -> bool {
        self.0.iter().any(|t| t.matches(tag))
    }

    /// Exact membership
    pub fn has_exact(&self, tag: &Tag) -> bool {
        self.0.contains(tag)
    }

    /// Does this set match any tag of `other`? An empty `other` never matches.
    pub fn has_any(&self, other: &TagSet) -> bool {
        other.iter().any(|t| self.has(t))
    }

    /// Does this set match every tag of `other`? An empty `other` always matches.
    pub fn has_all(&self, other: &TagSet) -> bool {
        other.iter().all(|t| self.has(t))
    }

    /// Iterate over tags in order
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Into<Tag>> FromIterator<T> for TagSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a Tag;
    type IntoIter = std::collections::btree_set::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Tags with numeric values attached, e.g. `Item.Durability = 80`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagValues(BTreeMap<Tag, f64>);

impl TagValues {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Set a value (builder pattern)
    pub fn with(mut self, tag: impl Into<Tag>, value: f64) -> Self {
        self.set(tag, value);
        self
    }

    /// Set a value, returning the previous one
    pub fn set(&mut self, tag: impl Into<Tag>, value: f64) -> Option<f64> {
        self.0.insert(tag.into(), value)
    }

    /// Get the value stored under exactly `tag`
    pub fn get(&self, tag: &Tag) -> Option<f64> {
        self.0.get(tag).copied()
    }

    /// Remove a value
    pub fn remove(&mut self, tag: &Tag) -> Option<f64> {
        self.0.remove(tag)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Tag, f64> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchical_match() {
        let gun = Tag::new("Item.Type.Weapon.Gun");
        assert!(gun.matches(&Tag::new("Item.Type.Weapon")));
        assert!(gun.matches(&Tag::new("Item")));
        assert!(gun.matches(&gun));
        assert!(!gun.matches(&Tag::new("Item.Type.Weap")));
        assert!(!Tag::new("Item.Type").matches(&gun));
    }

    #[test]
    fn test_parent_and_depth() {
        let tag = Tag::new("A.B.C");
        assert_eq!(tag.parent(), Some(Tag::new("A.B")));
        assert_eq!(tag.depth(), 3);
        assert_eq!(Tag::new("A").parent(), None);
    }

    #[test]
    fn test_tag_set_queries() {
        let set: TagSet = ["Item.Type.Ammo", "Item.Rarity.Common"].into_iter().collect();

        assert!(set.has(&Tag::new("Item.Type")));
        assert!(!set.has_exact(&Tag::new("Item.Type")));
        assert!(set.has_all(&TagSet::new().with("Item.Type").with("Item.Rarity")));
        assert!(!set.has_all(&TagSet::new().with("Item.Type.Weapon")));
        assert!(set.has_any(&TagSet::new().with("Item.Type.Weapon").with("Item.Rarity")));
        assert!(!set.has_any(&TagSet::new()));
        assert!(set.has_all(&TagSet::new()));
    }

    #[test]
    fn test_tag_values() {
        let mut values = TagValues::new().with("Item.Durability", 80.0);
        assert_eq!(values.get(&Tag::new("Item.Durability")), Some(80.0));
        assert_eq!(values.set("Item.Durability", 50.0), Some(80.0));
        assert_ne!(values, TagValues::new());
    }
}
