use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collapse::CollapseState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub key: String,
    pub name: String,
}

impl Folder {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    pub key: String,
    pub name: String,
    pub folders: Vec<Folder>,
}

impl Storage {
    pub fn new(key: impl Into<String>, name: impl Into<String>, folders: Vec<Folder>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            folders,
        }
    }

    pub fn folder_index(&self, folder_key: &str) -> Option<usize> {
        self.folders.iter().position(|folder| folder.key == folder_key)
    }

    pub fn first_folder(&self) -> Option<&Folder> {
        self.folders.first()
    }

    pub fn last_folder(&self) -> Option<&Folder> {
        self.folders.last()
    }
}

/// Storages in sidebar order, keyed by storage key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageMap {
    entries: IndexMap<String, Storage>,
}

impl StorageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a storage, replacing (in place) any storage with the same key.
    pub fn insert(&mut self, storage: Storage) {
        self.entries.insert(storage.key.clone(), storage);
    }

    pub fn get(&self, key: &str) -> Option<&Storage> {
        self.entries.get(key)
    }

    pub fn get_index(&self, ordinal: usize) -> Option<&Storage> {
        self.entries.get_index(ordinal).map(|(_, storage)| storage)
    }

    pub fn ordinal_of(&self, key: &str) -> Option<usize> {
        self.entries.get_index_of(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn first(&self) -> Option<&Storage> {
        self.entries.first().map(|(_, storage)| storage)
    }

    pub fn last(&self) -> Option<&Storage> {
        self.entries.last().map(|(_, storage)| storage)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Storage> {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<Storage> for StorageMap {
    fn from_iter<I: IntoIterator<Item = Storage>>(iter: I) -> Self {
        let mut map = StorageMap::new();
        for storage in iter {
            map.insert(storage);
        }
        map
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("storage key not found: '{key}'")]
    KeyNotFound { key: String },
    #[error("storage offset out of range: ordinal {ordinal} with {len} storages")]
    OffsetOutOfRange { ordinal: isize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageInfo {
    pub ordinal: usize,
    pub collapsed: bool,
}

/// Read-only view of the storage tree and its collapse state for one
/// navigation decision.
#[derive(Debug, Clone, Copy)]
pub struct TreeSnapshot<'a> {
    storages: &'a StorageMap,
    collapse: &'a CollapseState,
}

impl<'a> TreeSnapshot<'a> {
    pub fn new(storages: &'a StorageMap, collapse: &'a CollapseState) -> Self {
        Self { storages, collapse }
    }

    pub fn storages(&self) -> &'a StorageMap {
        self.storages
    }

    pub fn is_collapsed(&self, storage: &Storage) -> bool {
        self.collapse.is_collapsed(&storage.key)
    }

    /// Whether the storage's folders take part in vertical navigation.
    pub fn shows_folders(&self, storage: &Storage) -> bool {
        !storage.folders.is_empty() && !self.is_collapsed(storage)
    }

    /// Locates `storage_key`, then steps `offset` siblings away from it.
    pub fn find(
        &self,
        storage_key: &str,
        offset: isize,
    ) -> Result<(&'a Storage, StorageInfo), LookupError> {
        let base = self
            .storages
            .ordinal_of(storage_key)
            .ok_or_else(|| LookupError::KeyNotFound {
                key: storage_key.to_owned(),
            })?;
        let target = base as isize + offset;
        let storage = usize::try_from(target)
            .ok()
            .and_then(|ordinal| self.storages.get_index(ordinal))
            .ok_or(LookupError::OffsetOutOfRange {
                ordinal: target,
                len: self.storages.len(),
            })?;
        let info = StorageInfo {
            ordinal: target as usize,
            collapsed: self.is_collapsed(storage),
        };
        Ok((storage, info))
    }
}
