use strum::{Display, EnumString};

use super::collapse::CollapseState;
use super::filters::{FilterCycle, FilterEntry};
use super::path::Location;
use super::tree::{LookupError, Storage, StorageMap, TreeSnapshot};
use super::NavigationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Computes vertical moves through the flattened sidebar:
/// filter entries, then each storage followed by its folders when expanded.
/// The order wraps at both ends.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    filters: FilterCycle,
}

impl Navigator {
    pub fn new(filters: FilterCycle) -> Self {
        Self { filters }
    }

    pub fn filters(&self) -> &FilterCycle {
        &self.filters
    }

    pub fn step(
        &self,
        from: &Location,
        tree: TreeSnapshot<'_>,
        direction: Direction,
    ) -> Result<Location, NavigationError> {
        match direction {
            Direction::Up => self.up(from, tree),
            Direction::Down => self.down(from, tree),
        }
    }

    pub fn up(&self, from: &Location, tree: TreeSnapshot<'_>) -> Result<Location, NavigationError> {
        match from {
            Location::Storage { storage_key } => self.up_from_storage(tree, storage_key),
            Location::Folder {
                storage_key,
                folder_key,
            } => up_from_folder(tree, storage_key, folder_key),
            filter => match self.filter_index(filter) {
                Some(0) => self.up_from_first_filter(tree),
                Some(index) => self.filter_location(index - 1),
                None => self.rejoin_cycle(filter, tree, Direction::Up),
            },
        }
    }

    pub fn down(
        &self,
        from: &Location,
        tree: TreeSnapshot<'_>,
    ) -> Result<Location, NavigationError> {
        match from {
            Location::Storage { storage_key } => self.down_from_storage(tree, storage_key),
            Location::Folder {
                storage_key,
                folder_key,
            } => self.down_from_folder(tree, storage_key, folder_key),
            filter => match self.filter_index(filter) {
                Some(index) if index >= self.filters.last_index() => {
                    self.down_from_last_filter(tree)
                }
                Some(index) => self.filter_location(index + 1),
                None => self.rejoin_cycle(filter, tree, Direction::Down),
            },
        }
    }

    /// Every location vertical moves can reach, in cycle order.
    pub fn visible_order(&self, tree: TreeSnapshot<'_>) -> Vec<Location> {
        let mut order: Vec<Location> = self.filters.iter().map(FilterEntry::location).collect();
        for storage in tree.storages().iter() {
            order.push(Location::storage(&storage.key));
            if tree.shows_folders(storage) {
                order.extend(
                    storage
                        .folders
                        .iter()
                        .map(|folder| Location::folder(&storage.key, &folder.key)),
                );
            }
        }
        order
    }

    fn filter_index(&self, location: &Location) -> Option<usize> {
        FilterEntry::from_location(location).and_then(|entry| self.filters.position(entry))
    }

    fn filter_location(&self, index: usize) -> Result<Location, NavigationError> {
        self.filters
            .get(index)
            .map(FilterEntry::location)
            .ok_or(NavigationError::MissingFilter { index })
    }

    fn up_from_storage(
        &self,
        tree: TreeSnapshot<'_>,
        storage_key: &str,
    ) -> Result<Location, NavigationError> {
        let (_, info) = tree.find(storage_key, 0)?;
        if info.ordinal == 0 {
            return self.filter_location(self.filters.last_index());
        }
        let (sibling, _) = tree.find(storage_key, -1)?;
        Ok(last_visible_in(tree, sibling))
    }

    fn down_from_storage(
        &self,
        tree: TreeSnapshot<'_>,
        storage_key: &str,
    ) -> Result<Location, NavigationError> {
        let (storage, _) = tree.find(storage_key, 0)?;
        match storage.first_folder() {
            Some(first) if tree.shows_folders(storage) => {
                Ok(Location::folder(&storage.key, &first.key))
            }
            _ => self.next_storage_or_first_filter(tree, storage_key),
        }
    }

    fn down_from_folder(
        &self,
        tree: TreeSnapshot<'_>,
        storage_key: &str,
        folder_key: &str,
    ) -> Result<Location, NavigationError> {
        let (storage, _) = tree.find(storage_key, 0)?;
        let index = folder_index(storage, folder_key)?;
        match storage.folders.get(index + 1) {
            Some(next) => Ok(Location::folder(&storage.key, &next.key)),
            None => self.next_storage_or_first_filter(tree, storage_key),
        }
    }

    fn up_from_first_filter(&self, tree: TreeSnapshot<'_>) -> Result<Location, NavigationError> {
        match tree.storages().last() {
            Some(last) => Ok(last_visible_in(tree, last)),
            None => self.filter_location(self.filters.last_index()),
        }
    }

    fn down_from_last_filter(&self, tree: TreeSnapshot<'_>) -> Result<Location, NavigationError> {
        match tree.storages().first() {
            Some(first) => Ok(Location::storage(&first.key)),
            None => self.filter_location(0),
        }
    }

    /// A filter left out of the cycle (Trash by default) is still rendered,
    /// so a move from it lands on the nearest cycled entry in render order.
    fn rejoin_cycle(
        &self,
        from: &Location,
        tree: TreeSnapshot<'_>,
        direction: Direction,
    ) -> Result<Location, NavigationError> {
        let rendered: Vec<FilterEntry> = FilterEntry::all().collect();
        let at = rendered
            .iter()
            .position(|entry| entry.location() == *from)
            .unwrap_or(0);
        let in_cycle = |entry: &&FilterEntry| self.filters.position(**entry).is_some();
        match direction {
            Direction::Up => match rendered[..at].iter().rev().find(in_cycle) {
                Some(previous) => Ok(previous.location()),
                None => self.up_from_first_filter(tree),
            },
            Direction::Down => match rendered[at + 1..].iter().find(in_cycle) {
                Some(next) => Ok(next.location()),
                None => self.down_from_last_filter(tree),
            },
        }
    }

    /// Only the immediate sibling is tried; past the last storage the cycle
    /// wraps to the first filter entry.
    fn next_storage_or_first_filter(
        &self,
        tree: TreeSnapshot<'_>,
        storage_key: &str,
    ) -> Result<Location, NavigationError> {
        match tree.find(storage_key, 1) {
            Ok((next, _)) => Ok(Location::storage(&next.key)),
            Err(LookupError::OffsetOutOfRange { .. }) => self.filter_location(0),
            Err(err) => Err(err.into()),
        }
    }
}

fn up_from_folder(
    tree: TreeSnapshot<'_>,
    storage_key: &str,
    folder_key: &str,
) -> Result<Location, NavigationError> {
    let (storage, _) = tree.find(storage_key, 0)?;
    match folder_index(storage, folder_key)? {
        0 => Ok(Location::storage(&storage.key)),
        index => Ok(Location::folder(
            &storage.key,
            &storage.folders[index - 1].key,
        )),
    }
}

fn folder_index(storage: &Storage, folder_key: &str) -> Result<usize, NavigationError> {
    storage
        .folder_index(folder_key)
        .ok_or_else(|| NavigationError::UnknownFolder {
            storage_key: storage.key.clone(),
            folder_key: folder_key.to_owned(),
        })
}

/// The bottom-most visible row of a storage: its last folder when expanded.
fn last_visible_in(tree: TreeSnapshot<'_>, storage: &Storage) -> Location {
    match storage.last_folder() {
        Some(last) if tree.shows_folders(storage) => Location::folder(&storage.key, &last.key),
        _ => Location::storage(&storage.key),
    }
}

/// The storage owning a storage or folder location.
pub fn current_storage(from: &Location) -> Result<Location, NavigationError> {
    from.storage_key()
        .map(Location::storage)
        .ok_or_else(|| NavigationError::NoStorageSelected {
            location: from.clone(),
        })
}

/// Collapses the storage implied by `from` and returns the location to focus.
/// A folder hands focus to its parent storage.
pub fn collapse(
    from: &Location,
    storages: &StorageMap,
    state: &mut CollapseState,
) -> Result<Location, NavigationError> {
    let storage_key = selected_storage_key(from)?;
    let (_, info) = TreeSnapshot::new(storages, state).find(storage_key, 0)?;
    if !info.collapsed {
        state.toggle(storage_key);
    }
    match from {
        Location::Folder { .. } => Ok(Location::storage(storage_key)),
        _ => Ok(from.clone()),
    }
}

pub fn expand(
    from: &Location,
    storages: &StorageMap,
    state: &mut CollapseState,
) -> Result<Location, NavigationError> {
    let storage_key = selected_storage_key(from)?;
    let (_, info) = TreeSnapshot::new(storages, state).find(storage_key, 0)?;
    if info.collapsed {
        state.toggle(storage_key);
    }
    Ok(from.clone())
}

pub fn collapse_all(storages: &StorageMap, state: &mut CollapseState) {
    state.collapse_all(storages);
}

pub fn expand_all(state: &mut CollapseState) {
    state.expand_all();
}

fn selected_storage_key(from: &Location) -> Result<&str, NavigationError> {
    from.storage_key()
        .ok_or_else(|| NavigationError::NoStorageSelected {
            location: from.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::tree::Folder;
    use assert_matches::assert_matches;

    fn storage(key: &str, folders: &[&str]) -> Storage {
        Storage::new(
            key,
            key,
            folders.iter().map(|f| Folder::new(*f, *f)).collect(),
        )
    }

    fn flat(keys: &[&str]) -> StorageMap {
        keys.iter().map(|key| storage(key, &[])).collect()
    }

    fn walk(
        nav: &Navigator,
        tree: TreeSnapshot<'_>,
        start: Location,
        direction: Direction,
        steps: usize,
    ) -> Vec<Location> {
        let mut seen = Vec::with_capacity(steps);
        let mut current = start;
        for _ in 0..steps {
            current = nav.step(&current, tree, direction).expect("step succeeds");
            seen.push(current.clone());
        }
        seen
    }

    #[test]
    fn flat_storages_move_between_siblings_and_filters() {
        let map = flat(&["s0", "s1", "s2"]);
        let collapse = CollapseState::new();
        let tree = TreeSnapshot::new(&map, &collapse);
        let nav = Navigator::default();

        assert_eq!(nav.down(&Location::storage("s0"), tree), Ok(Location::storage("s1")));
        assert_eq!(nav.down(&Location::storage("s2"), tree), Ok(Location::Home));
        assert_eq!(nav.up(&Location::storage("s0"), tree), Ok(Location::Starred));
        assert_eq!(nav.up(&Location::storage("s2"), tree), Ok(Location::storage("s1")));
    }

    #[test]
    fn expanded_storage_descends_into_folders() {
        let map: StorageMap = [storage("s0", &["f0", "f1"])].into_iter().collect();
        let collapse = CollapseState::new();
        let tree = TreeSnapshot::new(&map, &collapse);
        let nav = Navigator::default();

        assert_eq!(nav.down(&Location::storage("s0"), tree), Ok(Location::folder("s0", "f0")));
        assert_eq!(
            nav.down(&Location::folder("s0", "f0"), tree),
            Ok(Location::folder("s0", "f1"))
        );
        assert_eq!(nav.down(&Location::folder("s0", "f1"), tree), Ok(Location::Home));
        assert_eq!(
            nav.up(&Location::folder("s0", "f1"), tree),
            Ok(Location::folder("s0", "f0"))
        );
        assert_eq!(nav.up(&Location::folder("s0", "f0"), tree), Ok(Location::storage("s0")));
    }

    #[test]
    fn collapsed_storage_hides_its_folders() {
        let map: StorageMap = [storage("s0", &["f0", "f1"]), storage("s1", &[])]
            .into_iter()
            .collect();
        let collapse: CollapseState = ["s0"].into_iter().collect();
        let tree = TreeSnapshot::new(&map, &collapse);
        let nav = Navigator::default();

        assert_eq!(nav.down(&Location::storage("s0"), tree), Ok(Location::storage("s1")));
        assert_eq!(nav.up(&Location::storage("s1"), tree), Ok(Location::storage("s0")));

        let order = nav.visible_order(tree);
        let down = walk(&nav, tree, Location::Home, Direction::Down, order.len() * 2);
        let up = walk(&nav, tree, Location::Home, Direction::Up, order.len() * 2);
        for location in down.iter().chain(up.iter()) {
            assert_matches!(location, Location::Storage { .. } | Location::Home | Location::Starred);
        }
    }

    #[test]
    fn previous_sibling_entry_point_depends_on_its_state() {
        let map: StorageMap = [storage("s0", &["f0", "f1"]), storage("s1", &["g0"])]
            .into_iter()
            .collect();
        let nav = Navigator::default();

        let expanded = CollapseState::new();
        let tree = TreeSnapshot::new(&map, &expanded);
        assert_eq!(nav.up(&Location::storage("s1"), tree), Ok(Location::folder("s0", "f1")));
        assert_eq!(nav.up(&Location::Home, tree), Ok(Location::folder("s1", "g0")));

        let collapsed: CollapseState = ["s0", "s1"].into_iter().collect();
        let tree = TreeSnapshot::new(&map, &collapsed);
        assert_eq!(nav.up(&Location::storage("s1"), tree), Ok(Location::storage("s0")));
        assert_eq!(nav.up(&Location::Home, tree), Ok(Location::storage("s1")));
    }

    #[test]
    fn filter_entries_wrap_without_storages() {
        let map = StorageMap::new();
        let collapse = CollapseState::new();
        let tree = TreeSnapshot::new(&map, &collapse);
        let nav = Navigator::default();

        assert_eq!(nav.up(&Location::Home, tree), Ok(Location::Starred));
        assert_eq!(nav.down(&Location::Starred, tree), Ok(Location::Home));
        assert_eq!(nav.down(&Location::Home, tree), Ok(Location::Starred));
        assert_eq!(nav.up(&Location::Starred, tree), Ok(Location::Home));
    }

    #[test]
    fn last_filter_leads_to_first_storage_even_when_collapsed() {
        let map: StorageMap = [storage("s0", &["f0"])].into_iter().collect();
        let collapse: CollapseState = ["s0"].into_iter().collect();
        let tree = TreeSnapshot::new(&map, &collapse);
        let nav = Navigator::default();
        assert_eq!(nav.down(&Location::Starred, tree), Ok(Location::storage("s0")));
    }

    #[test]
    fn trash_outside_the_cycle_rejoins_it() {
        let map = flat(&["s0"]);
        let collapse = CollapseState::new();
        let tree = TreeSnapshot::new(&map, &collapse);
        let nav = Navigator::default();

        assert_eq!(nav.up(&Location::Trashed, tree), Ok(Location::Starred));
        assert_eq!(nav.down(&Location::Trashed, tree), Ok(Location::storage("s0")));

        let empty = StorageMap::new();
        let tree = TreeSnapshot::new(&empty, &collapse);
        assert_eq!(nav.down(&Location::Trashed, tree), Ok(Location::Home));

        let starred_only = Navigator::new(FilterCycle::new([FilterEntry::Starred]));
        assert_eq!(starred_only.up(&Location::Home, tree), Ok(Location::Starred));
        assert_eq!(starred_only.down(&Location::Home, tree), Ok(Location::Starred));
    }

    #[test]
    fn collapsed_last_storage_wraps_to_first_filter() {
        let map: StorageMap = [storage("s0", &["f0", "f1"])].into_iter().collect();
        let collapse: CollapseState = ["s0"].into_iter().collect();
        let tree = TreeSnapshot::new(&map, &collapse);
        let nav = Navigator::default();

        assert_eq!(nav.down(&Location::storage("s0"), tree), Ok(Location::Home));
        assert_eq!(nav.up(&Location::Home, tree), Ok(Location::storage("s0")));
    }

    #[test]
    fn trash_in_the_cycle_sits_after_starred() {
        let map = flat(&["s0"]);
        let collapse = CollapseState::new();
        let tree = TreeSnapshot::new(&map, &collapse);
        let nav = Navigator::new(FilterCycle::with_trashed(true));

        assert_eq!(nav.down(&Location::Starred, tree), Ok(Location::Trashed));
        assert_eq!(nav.down(&Location::Trashed, tree), Ok(Location::storage("s0")));
        assert_eq!(nav.up(&Location::storage("s0"), tree), Ok(Location::Trashed));
    }

    #[test]
    fn lookups_fail_for_unknown_keys() {
        let map: StorageMap = [storage("s0", &["f0"])].into_iter().collect();
        let collapse = CollapseState::new();
        let tree = TreeSnapshot::new(&map, &collapse);
        let nav = Navigator::default();

        assert_matches!(
            nav.down(&Location::storage("nope"), tree),
            Err(NavigationError::Lookup(LookupError::KeyNotFound { .. }))
        );
        assert_matches!(
            nav.up(&Location::folder("s0", "nope"), tree),
            Err(NavigationError::UnknownFolder { .. })
        );
        assert_matches!(
            nav.down(&Location::folder("s0", "nope"), tree),
            Err(NavigationError::UnknownFolder { .. })
        );
    }

    #[test]
    fn down_cycle_closes_after_visible_count() {
        let map: StorageMap = [
            storage("s0", &["f0", "f1"]),
            storage("s1", &[]),
            storage("s2", &["g0"]),
            storage("s3", &["h0", "h1", "h2"]),
        ]
        .into_iter()
        .collect();
        let collapse: CollapseState = ["s2"].into_iter().collect();
        let tree = TreeSnapshot::new(&map, &collapse);

        for nav in [Navigator::default(), Navigator::new(FilterCycle::with_trashed(true))] {
            let order = nav.visible_order(tree);
            // filters + 4 storages + f0, f1 + h0..h2
            assert_eq!(order.len(), nav.filters().len() + 4 + 2 + 3);

            let down = walk(&nav, tree, order[0].clone(), Direction::Down, order.len());
            let mut expected: Vec<Location> = order[1..].to_vec();
            expected.push(order[0].clone());
            assert_eq!(down, expected);

            let up = walk(&nav, tree, order[0].clone(), Direction::Up, order.len());
            let expected: Vec<Location> = order.iter().rev().cloned().collect();
            assert_eq!(up, expected);
        }
    }

    #[test]
    fn collapse_all_then_expand_all_restores_order() {
        let map: StorageMap = [storage("s0", &["f0"]), storage("s1", &["g0", "g1"])]
            .into_iter()
            .collect();
        let nav = Navigator::default();
        let mut state = CollapseState::new();
        state.toggle("s1");
        state.toggle("s1");
        let before = nav.visible_order(TreeSnapshot::new(&map, &state));

        collapse_all(&map, &mut state);
        let collapsed = nav.visible_order(TreeSnapshot::new(&map, &state));
        assert_eq!(collapsed.len(), nav.filters().len() + 2);

        expand_all(&mut state);
        assert_eq!(nav.visible_order(TreeSnapshot::new(&map, &state)), before);
    }

    #[test]
    fn collapse_from_folder_moves_focus_to_parent() {
        let map: StorageMap = [storage("s0", &["f0"])].into_iter().collect();
        let mut state = CollapseState::new();

        let focus = collapse(&Location::folder("s0", "f0"), &map, &mut state);
        assert_eq!(focus, Ok(Location::storage("s0")));
        assert!(state.is_collapsed("s0"));

        // already collapsed: stays collapsed
        let focus = collapse(&Location::storage("s0"), &map, &mut state);
        assert_eq!(focus, Ok(Location::storage("s0")));
        assert!(state.is_collapsed("s0"));
    }

    #[test]
    fn expand_keeps_focus_and_is_idempotent() {
        let map: StorageMap = [storage("s0", &["f0"])].into_iter().collect();
        let mut state: CollapseState = ["s0"].into_iter().collect();

        assert_eq!(
            expand(&Location::storage("s0"), &map, &mut state),
            Ok(Location::storage("s0"))
        );
        assert!(!state.is_collapsed("s0"));
        assert_eq!(
            expand(&Location::storage("s0"), &map, &mut state),
            Ok(Location::storage("s0"))
        );
        assert!(!state.is_collapsed("s0"));
    }

    #[test]
    fn horizontal_moves_need_a_storage() {
        let map = flat(&["s0"]);
        let mut state = CollapseState::new();
        assert_matches!(
            collapse(&Location::Home, &map, &mut state),
            Err(NavigationError::NoStorageSelected { location: Location::Home })
        );
        assert_matches!(
            expand(&Location::storage("gone"), &map, &mut state),
            Err(NavigationError::Lookup(LookupError::KeyNotFound { .. }))
        );
        assert_eq!(
            current_storage(&Location::folder("s0", "f")),
            Ok(Location::storage("s0"))
        );
        assert_matches!(
            current_storage(&Location::Starred),
            Err(NavigationError::NoStorageSelected { .. })
        );
    }

    #[test]
    fn direction_round_trips_through_strings() {
        assert_eq!(Direction::Up.to_string(), "up");
        assert_eq!("down".parse::<Direction>(), Ok(Direction::Down));
    }
}
