//! Item catalog
//!
//! The catalog is built once (in code or from a TOML file) and then shared
//! behind an `Arc`; nothing mutates it afterwards.
//!
//! # File Format
//!
//! ```toml
//! [[item]]
//! key = "ammo_9mm"
//! name = "9mm Rounds"
//! max_stack = 60
//! tags = ["Item.Type.Ammo"]
//!
//! [[item]]
//! key = "backpack"
//! name = "Backpack"
//! width = 2
//! height = 3
//!
//! [item.kind]
//! type = "container"
//! width = 6
//! height = 4
//! ```

use crate::definition::ItemDefinition;
use gridbag_core::{DefinitionKey, InventoryError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors from catalog loading
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    Write(#[from] toml::ser::Error),

    #[error("invalid definition: {0}")]
    Invalid(#[from] InventoryError),
}

#[derive(Serialize, Deserialize)]
struct CatalogToml {
    #[serde(default, rename = "item")]
    items: Vec<ItemDefinition>,
}

/// Registry of item definitions by key
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    definitions: HashMap<DefinitionKey, Arc<ItemDefinition>>,
}

impl ItemCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }

    /// Register a definition; keys must be unique
    pub fn register(&mut self, definition: ItemDefinition) -> Result<Arc<ItemDefinition>, InventoryError> {
        definition.validate()?;
        if self.definitions.contains_key(&definition.key) {
            return Err(InventoryError::DuplicateDefinition(definition.key));
        }
        let definition = Arc::new(definition);
        self.definitions
            .insert(definition.key.clone(), Arc::clone(&definition));
        Ok(definition)
    }

    /// Register (builder pattern)
    pub fn with(mut self, definition: ItemDefinition) -> Result<Self, InventoryError> {
        self.register(definition)?;
        Ok(self)
    }

    /// Look up a definition
    pub fn get(&self, key: &DefinitionKey) -> Result<&Arc<ItemDefinition>, InventoryError> {
        self.definitions
            .get(key)
            .ok_or_else(|| InventoryError::DefinitionNotFound(key.clone()))
    }

    /// Look up by string key
    pub fn get_str(&self, key: &str) -> Result<&Arc<ItemDefinition>, InventoryError> {
        self.get(&DefinitionKey::new(key))
    }

    pub fn contains(&self, key: &DefinitionKey) -> bool {
        self.definitions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// All definitions, sorted by key
    pub fn definitions(&self) -> Vec<&Arc<ItemDefinition>> {
        let mut defs: Vec<_> = self.definitions.values().collect();
        defs.sort_by(|a, b| a.key.cmp(&b.key));
        defs
    }

    /// Parse a catalog from TOML
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let raw: CatalogToml = toml::from_str(content)?;
        let mut catalog = Self::new();
        for definition in raw.items {
            catalog.register(definition)?;
        }
        log::debug!("Loaded item catalog with {} definitions", catalog.len());
        Ok(catalog)
    }

    /// Load a catalog file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML (sorted by key)
    pub fn to_toml_string(&self) -> Result<String, CatalogError> {
        let raw = CatalogToml {
            items: self
                .definitions()
                .into_iter()
                .map(|d| ItemDefinition::clone(d))
                .collect(),
        };
        Ok(toml::to_string(&raw)?)
    }
}
