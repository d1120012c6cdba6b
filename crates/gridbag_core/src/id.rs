//! Identifiers for containers, item instances and item definitions

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use serde::{Deserialize, Serialize};

/// Identifier of a container.
///
/// Ids are totally ordered; multi-container transactions lock in ascending id order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(u64);

impl ContainerId {
    /// Create from a raw value
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value
    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContainerId({})", self.0)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Identifier of an item instance
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// Create from a raw value
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value
    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// Thread-safe id generator shared by containers and items.
///
/// Container and item ids come from the same counter, so a raw value is never
/// reused across the two kinds.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Create a new generator starting at 1
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Create a generator that hands out ids strictly above `raw`
    pub const fn starting_after(raw: u64) -> Self {
        Self {
            next: AtomicU64::new(raw + 1),
        }
    }

    /// Generate the next raw value
    pub fn next_raw(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Generate a container id
    pub fn next_container(&self) -> ContainerId {
        ContainerId(self.next_raw())
    }

    /// Generate an item id
    pub fn next_item(&self) -> ItemId {
        ItemId(self.next_raw())
    }

    /// Make sure future ids are strictly above `raw` (used after importing saved ids)
    pub fn reserve_through(&self, raw: u64) {
        self.next.fetch_max(raw + 1, Ordering::Relaxed);
    }

    /// Peek at the next raw value without consuming it
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable key of an item definition, e.g. `"iron_sword"`.
///
/// Carries a precomputed FNV-1a hash so catalog lookups and equality checks
/// on hot paths stay cheap.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DefinitionKey {
    name: Box<str>,
    hash: u64,
}

impl DefinitionKey {
    /// Create a new key
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            hash: fnv1a(name),
        }
    }

    /// Get the key as a string
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Get the precomputed hash
    #[inline]
    pub fn hash_value(&self) -> u64 {
        self.hash
    }
}

fn fnv1a(name: &str) -> u64 {
    let mut hash = 0xcbf29ce484222325u64;
    for byte in name.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

impl PartialEq for DefinitionKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.name == other.name
    }
}

impl Eq for DefinitionKey {}

impl core::hash::Hash for DefinitionKey {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl PartialOrd for DefinitionKey {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DefinitionKey {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Debug for DefinitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DefinitionKey({:?})", self.name)
    }
}

impl fmt::Display for DefinitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for DefinitionKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DefinitionKey {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<DefinitionKey> for String {
    fn from(key: DefinitionKey) -> Self {
        key.name.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generator() {
        let gen = IdGenerator::new();
        let c = gen.next_container();
        let i = gen.next_item();
        assert_eq!(c.raw(), 1);
        assert_eq!(i.raw(), 2);
    }

    #[test]
    fn test_reserve_through() {
        let gen = IdGenerator::new();
        gen.reserve_through(41);
        assert_eq!(gen.next_item().raw(), 42);

        // Never moves backwards
        gen.reserve_through(3);
        assert_eq!(gen.next_item().raw(), 43);
    }

    #[test]
    fn test_definition_key() {
        let a = DefinitionKey::new("ammo_9mm");
        let b: DefinitionKey = "ammo_9mm".into();
        assert_eq!(a, b);
        assert_eq!(a.hash_value(), b.hash_value());
        assert_ne!(a, DefinitionKey::new("ammo_45"));

        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"ammo_9mm\"");
        let back: DefinitionKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
