use std::collections::HashMap;

use super::tree::StorageMap;

/// Session-local record of which storages have their folders hidden.
///
/// Membership is keyed by storage key, so reordering or removing storages in
/// the catalog never shifts the state onto a different storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseState {
    collapsed: HashMap<String, bool>,
}

impl CollapseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self, storage_key: &str) -> bool {
        self.collapsed.get(storage_key).copied().unwrap_or(false)
    }

    /// Flips the storage and returns its new collapsed flag.
    pub fn toggle(&mut self, storage_key: &str) -> bool {
        let entry = self
            .collapsed
            .entry(storage_key.to_owned())
            .or_insert(false);
        *entry = !*entry;
        *entry
    }

    pub fn toggle_ordinal(&mut self, storages: &StorageMap, ordinal: usize) -> Option<bool> {
        let key = storages.get_index(ordinal)?.key.clone();
        Some(self.toggle(&key))
    }

    pub fn collapse_all(&mut self, storages: &StorageMap) {
        self.collapsed = storages.keys().map(|key| (key.to_owned(), true)).collect();
    }

    pub fn expand_all(&mut self) {
        self.collapsed.clear();
    }

    pub fn collapsed_count(&self) -> usize {
        self.collapsed.values().filter(|collapsed| **collapsed).count()
    }

    /// Drops entries for storages that are no longer in the tree.
    pub fn retain_known(&mut self, storages: &StorageMap) {
        self.collapsed
            .retain(|key, collapsed| *collapsed && storages.contains_key(key));
    }
}

impl<'a> FromIterator<&'a str> for CollapseState {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let collapsed = iter.into_iter().map(|key| (key.to_owned(), true)).collect();
        Self { collapsed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::tree::Storage;

    fn storages(keys: &[&str]) -> StorageMap {
        keys.iter()
            .map(|key| Storage::new(*key, *key, Vec::new()))
            .collect()
    }

    #[test]
    fn toggle_flips_membership() {
        let mut state = CollapseState::new();
        assert!(!state.is_collapsed("a"));
        assert!(state.toggle("a"));
        assert!(state.is_collapsed("a"));
        assert!(!state.toggle("a"));
        assert!(!state.is_collapsed("a"));
    }

    #[test]
    fn collapse_all_then_expand_all() {
        let map = storages(&["a", "b", "c"]);
        let mut state = CollapseState::new();
        state.collapse_all(&map);
        assert_eq!(state.collapsed_count(), 3);
        assert!(map.keys().all(|key| state.is_collapsed(key)));

        state.expand_all();
        assert_eq!(state.collapsed_count(), 0);
        assert_eq!(state, CollapseState::new());
    }

    #[test]
    fn state_follows_storage_through_reorder() {
        let before = storages(&["a", "b"]);
        let mut state = CollapseState::new();
        assert_eq!(state.toggle_ordinal(&before, 1), Some(true));

        let after = storages(&["b", "a"]);
        assert!(state.is_collapsed("b"));
        assert!(!state.is_collapsed("a"));
        assert_eq!(after.ordinal_of("b"), Some(0));
    }

    #[test]
    fn toggle_ordinal_ignores_out_of_range() {
        let map = storages(&["a"]);
        let mut state = CollapseState::new();
        assert_eq!(state.toggle_ordinal(&map, 4), None);
        assert_eq!(state.collapsed_count(), 0);
    }

    #[test]
    fn retain_known_prunes_removed_storages() {
        let mut state: CollapseState = ["a", "gone"].into_iter().collect();
        state.retain_known(&storages(&["a", "b"]));
        assert!(state.is_collapsed("a"));
        assert!(!state.is_collapsed("gone"));
        assert_eq!(state.collapsed_count(), 1);
    }
}
