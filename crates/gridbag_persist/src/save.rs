//! Save formats and directory-backed save slots

use crate::error::{PersistError, Result};
use crate::export::InventoryExport;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Save file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveFormat {
    /// JSON (human readable)
    Json,
    /// Binary (compact)
    #[default]
    Binary,
}

impl SaveFormat {
    /// File extension used for slots in this format
    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::Json => "json",
            SaveFormat::Binary => "sav",
        }
    }

    pub fn encode<T: Serialize>(self, value: &T) -> Result<Vec<u8>> {
        match self {
            SaveFormat::Json => serde_json::to_vec_pretty(value)
                .map_err(|e| PersistError::Serialization(e.to_string())),
            SaveFormat::Binary => {
                bincode::serialize(value).map_err(|e| PersistError::Serialization(e.to_string()))
            }
        }
    }

    pub fn decode<T: for<'de> Deserialize<'de>>(self, bytes: &[u8]) -> Result<T> {
        match self {
            SaveFormat::Json => serde_json::from_slice(bytes)
                .map_err(|e| PersistError::Deserialization(e.to_string())),
            SaveFormat::Binary => bincode::deserialize(bytes)
                .map_err(|e| PersistError::Deserialization(e.to_string())),
        }
    }
}

/// Save data header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveHeader {
    /// Save name/title
    pub name: String,
    /// Save timestamp (Unix timestamp)
    pub timestamp: u64,
    /// Number of containers in the save
    pub containers: usize,
    /// Number of item stacks in the save
    pub items: usize,
}

impl SaveHeader {
    /// Create a header stamped with the current time
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            containers: 0,
            items: 0,
        }
    }
}

/// Complete save data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub header: SaveHeader,
    pub inventory: InventoryExport,
}

impl SaveData {
    pub fn new(name: impl Into<String>, inventory: InventoryExport) -> Self {
        let mut header = SaveHeader::new(name);
        header.containers = inventory.container_count();
        header.items = inventory.item_count();
        Self { header, inventory }
    }
}

/// Save slot info
#[derive(Debug, Clone)]
pub struct SaveSlot {
    /// Slot identifier
    pub id: String,
    /// Save header (or None if empty)
    pub header: Option<SaveHeader>,
    /// File path
    pub path: PathBuf,
}

impl SaveSlot {
    /// Whether slot is occupied
    pub fn is_occupied(&self) -> bool {
        self.header.is_some()
    }
}

/// Named save slots in one directory
pub struct SaveStore {
    /// Base save directory
    save_dir: PathBuf,
    /// Save file format
    format: SaveFormat,
    /// Cached slot info
    slots: HashMap<String, SaveSlot>,
    /// Number of rotating autosave slots
    max_autosaves: usize,
}

impl SaveStore {
    /// Create a save store rooted at `save_dir`
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
            format: SaveFormat::default(),
            slots: HashMap::new(),
            max_autosaves: 3,
        }
    }

    /// Set save format
    pub fn with_format(mut self, format: SaveFormat) -> Self {
        self.format = format;
        self
    }

    /// Set max autosaves
    pub fn with_max_autosaves(mut self, max: usize) -> Self {
        self.max_autosaves = max.max(1);
        self
    }

    pub fn format(&self) -> SaveFormat {
        self.format
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Ensure save directory exists
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.save_dir)?;
        Ok(())
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.save_dir
            .join(format!("{}.{}", slot, self.format.extension()))
    }

    /// Write a save to a slot, replacing what was there
    pub fn save(&mut self, slot: &str, data: &SaveData) -> Result<()> {
        self.ensure_dir()?;
        let path = self.slot_path(slot);
        let bytes = self.format.encode(data)?;
        fs::write(&path, bytes)?;
        log::debug!("Saved slot '{}' to {}", slot, path.display());

        self.slots.insert(
            slot.to_string(),
            SaveSlot {
                id: slot.to_string(),
                header: Some(data.header.clone()),
                path,
            },
        );
        Ok(())
    }

    /// Read a save from a slot
    pub fn load(&self, slot: &str) -> Result<SaveData> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Err(PersistError::SlotNotFound(slot.to_string()));
        }

        let bytes = fs::read(&path)?;
        let data: SaveData = self.format.decode(&bytes)?;
        data.inventory.check_version()?;
        Ok(data)
    }

    /// Delete a save slot
    pub fn delete(&mut self, slot: &str) -> Result<()> {
        let path = self.slot_path(slot);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        self.slots.remove(slot);
        Ok(())
    }

    /// Check if slot exists
    pub fn exists(&self, slot: &str) -> bool {
        self.slot_path(slot).exists()
    }

    /// Get slot info
    pub fn slot(&mut self, slot: &str) -> Result<SaveSlot> {
        if let Some(cached) = self.slots.get(slot) {
            return Ok(cached.clone());
        }

        let path = self.slot_path(slot);
        let header = if path.exists() {
            Some(self.load(slot)?.header)
        } else {
            None
        };
        let info = SaveSlot {
            id: slot.to_string(),
            header,
            path,
        };
        self.slots.insert(slot.to_string(), info.clone());
        Ok(info)
    }

    /// List occupied slots, newest first
    pub fn list_slots(&mut self) -> Result<Vec<SaveSlot>> {
        self.ensure_dir()?;

        let ext = self.format.extension();
        let mut stems = Vec::new();
        for entry in fs::read_dir(&self.save_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == ext).unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    stems.push(stem.to_string());
                }
            }
        }

        let mut slots = Vec::new();
        for stem in stems {
            match self.slot(&stem) {
                Ok(slot) => slots.push(slot),
                Err(err) => log::warn!("Skipping unreadable save slot '{}': {}", stem, err),
            }
        }

        slots.sort_by(|a, b| {
            let ts_a = a.header.as_ref().map(|h| h.timestamp).unwrap_or(0);
            let ts_b = b.header.as_ref().map(|h| h.timestamp).unwrap_or(0);
            ts_b.cmp(&ts_a).then_with(|| a.id.cmp(&b.id))
        });
        Ok(slots)
    }

    /// Save into the first empty autosave slot, or over the oldest one
    pub fn autosave(&mut self, data: &SaveData) -> Result<String> {
        let mut candidates = Vec::with_capacity(self.max_autosaves);
        for index in 0..self.max_autosaves {
            let id = format!("autosave_{}", index);
            let timestamp = self.slot(&id)?.header.map(|h| h.timestamp);
            candidates.push((timestamp, index, id));
        }

        // Empty slots (None) sort first, then oldest, then lowest index
        candidates.sort();
        let slot = candidates
            .into_iter()
            .next()
            .map(|(_, _, id)| id)
            .unwrap_or_else(|| "autosave_0".to_string());
        self.save(&slot, data)?;
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_save(name: &str) -> SaveData {
        SaveData::new(
            name,
            InventoryExport {
                version: crate::export::EXPORT_VERSION,
                containers: Vec::new(),
            },
        )
    }

    #[test]
    fn test_save_store_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SaveStore::new(dir.path()).with_format(SaveFormat::Json);

        store.save("slot1", &empty_save("Test Save")).unwrap();
        assert!(store.exists("slot1"));
        assert!(dir.path().join("slot1.json").exists());

        let loaded = store.load("slot1").unwrap();
        assert_eq!(loaded.header.name, "Test Save");

        store.delete("slot1").unwrap();
        assert!(!store.exists("slot1"));
        assert!(matches!(
            store.load("slot1"),
            Err(PersistError::SlotNotFound(_))
        ));
    }

    #[test]
    fn test_autosave_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SaveStore::new(dir.path()).with_max_autosaves(2);

        assert_eq!(store.autosave(&empty_save("a")).unwrap(), "autosave_0");
        assert_eq!(store.autosave(&empty_save("b")).unwrap(), "autosave_1");
        assert_eq!(store.autosave(&empty_save("c")).unwrap(), "autosave_0");
        assert_eq!(store.load("autosave_0").unwrap().header.name, "c");
        assert_eq!(store.list_slots().unwrap().len(), 2);
    }

    #[test]
    fn test_newer_save_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SaveStore::new(dir.path());
        let mut data = empty_save("future");
        data.inventory.version += 1;
        store.save("future", &data).unwrap();

        assert!(matches!(
            store.load("future"),
            Err(PersistError::VersionMismatch { .. })
        ));
    }
}
