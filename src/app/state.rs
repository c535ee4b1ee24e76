use crate::config::AppConfig;
use crate::focus::{FocusChannel, FocusState, Region};
use crate::nav::{
    engine, CollapseState, Direction, FilterEntry, Location, LookupError, NavigationError,
    Navigator, StorageMap, TreeSnapshot,
};

use super::actions::SidebarCommand;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Focus moved to a new location.
    Moved(Location),
    /// Collapse state changed; focus stayed put.
    Restructured,
    FocusHandoff(Region),
    Unchanged,
}

/// One rendered sidebar line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarRow {
    pub location: Location,
    pub label: String,
    pub depth: u16,
    /// `Some` for storages that have folders to show or hide.
    pub collapsed: Option<bool>,
    pub selected: bool,
}

/// Session state of the sidebar: the tree snapshot, collapse flags, the
/// router path of the focused entry, and which region owns the keyboard.
#[derive(Debug)]
pub struct SidebarState {
    storages: StorageMap,
    collapse: CollapseState,
    navigator: Navigator,
    current_path: String,
    focus: FocusState,
    channel: FocusChannel,
    folded: bool,
    last_error: Option<String>,
}

impl SidebarState {
    pub fn new(storages: StorageMap, navigator: Navigator, start: Location) -> Self {
        let mut state = Self {
            storages,
            collapse: CollapseState::new(),
            navigator,
            current_path: start.encode(),
            focus: FocusState::default(),
            channel: FocusChannel::new(),
            folded: false,
            last_error: None,
        };
        if !state.location_exists(&start) {
            state.current_path = state.fallback_location().encode();
        }
        state
    }

    pub fn from_config(config: &AppConfig, storages: StorageMap) -> Self {
        Self::new(
            storages,
            Navigator::new(config.sidebar.filter_cycle()),
            config.sidebar.start_location(),
        )
    }

    pub fn storages(&self) -> &StorageMap {
        &self.storages
    }

    pub fn collapse(&self) -> &CollapseState {
        &self.collapse
    }

    pub fn focus(&self) -> &FocusState {
        &self.focus
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    pub fn current_location(&self) -> Result<Location, NavigationError> {
        Location::decode(&self.current_path).map_err(NavigationError::from)
    }

    /// Whether the sidebar column is hidden.
    pub fn is_folded(&self) -> bool {
        self.folded
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn active_region(&self) -> Region {
        self.focus.active().unwrap_or(Region::SideNav)
    }

    pub fn apply(&mut self, command: SidebarCommand) -> CommandOutcome {
        match command {
            SidebarCommand::FocusNextRegion => self.hand_off(self.active_region().next()),
            SidebarCommand::FocusPreviousRegion => {
                self.hand_off(self.active_region().previous())
            }
            SidebarCommand::Focus(region) => self.hand_off(region),
            SidebarCommand::ToggleFold => self.toggle_fold(),
            SidebarCommand::Select(location) => self.select(location),
            SidebarCommand::ToggleStorage(storage_key) => self.toggle_storage(&storage_key),
            _ if !self.focus.is_focused(Region::SideNav) => {
                tracing::trace!(?command, "sidebar unfocused, ignoring command");
                CommandOutcome::Unchanged
            }
            SidebarCommand::MoveUp => self.move_vertical(Direction::Up),
            SidebarCommand::MoveDown => self.move_vertical(Direction::Down),
            SidebarCommand::CollapseCurrentStorage => self.collapse_current(),
            SidebarCommand::ExpandCurrentStorage => self.expand_current(),
            SidebarCommand::CollapseAllStorages => self.collapse_all(),
            SidebarCommand::ExpandAllStorages => {
                let before = self.collapse.collapsed_count();
                engine::expand_all(&mut self.collapse);
                if before > 0 {
                    CommandOutcome::Restructured
                } else {
                    CommandOutcome::Unchanged
                }
            }
        }
    }

    /// Swaps in a fresh catalog snapshot. Focus falls back to the first
    /// filter entry when the focused storage or folder disappeared.
    pub fn reload(&mut self, storages: StorageMap) {
        self.storages = storages;
        self.collapse.retain_known(&self.storages);
        let still_there = self
            .current_location()
            .map(|location| self.location_exists(&location))
            .unwrap_or(false);
        if !still_there {
            let fallback = self.fallback_location();
            tracing::info!(
                from = %self.current_path,
                to = %fallback,
                "focused sidebar entry vanished after reload"
            );
            self.current_path = fallback.encode();
        }
    }

    /// Rows in display order. Trash is always rendered, even when it is not
    /// part of the up/down cycle.
    pub fn rows(&self) -> Vec<SidebarRow> {
        let selected = self.current_location().ok();
        let is_selected = |location: &Location| selected.as_ref() == Some(location);
        let mut rows = Vec::new();
        for entry in FilterEntry::all() {
            let location = entry.location();
            rows.push(SidebarRow {
                selected: is_selected(&location),
                label: entry.to_string(),
                depth: 0,
                collapsed: None,
                location,
            });
        }
        let tree = TreeSnapshot::new(&self.storages, &self.collapse);
        for storage in self.storages.iter() {
            let location = Location::storage(&storage.key);
            rows.push(SidebarRow {
                selected: is_selected(&location),
                label: storage.name.clone(),
                depth: 0,
                collapsed: (!storage.folders.is_empty()).then(|| tree.is_collapsed(storage)),
                location,
            });
            if !tree.shows_folders(storage) {
                continue;
            }
            for folder in &storage.folders {
                let location = Location::folder(&storage.key, &folder.key);
                rows.push(SidebarRow {
                    selected: is_selected(&location),
                    label: folder.name.clone(),
                    depth: 1,
                    collapsed: None,
                    location,
                });
            }
        }
        rows
    }

    fn move_vertical(&mut self, direction: Direction) -> CommandOutcome {
        let result = self.current_location().and_then(|from| {
            let tree = TreeSnapshot::new(&self.storages, &self.collapse);
            self.navigator.step(&from, tree, direction)
        });
        self.finish(result)
    }

    fn collapse_current(&mut self) -> CommandOutcome {
        let before = self.collapse.clone();
        let result = self
            .current_location()
            .and_then(|from| engine::collapse(&from, &self.storages, &mut self.collapse));
        self.finish_restructure(result, before)
    }

    fn expand_current(&mut self) -> CommandOutcome {
        let before = self.collapse.clone();
        let result = self
            .current_location()
            .and_then(|from| engine::expand(&from, &self.storages, &mut self.collapse));
        self.finish_restructure(result, before)
    }

    fn collapse_all(&mut self) -> CommandOutcome {
        let before = self.collapse.clone();
        engine::collapse_all(&self.storages, &mut self.collapse);
        let target = self
            .current_location()
            .and_then(|from| engine::current_storage(&from));
        match target {
            Ok(target) => self.finish_restructure(Ok(target), before),
            Err(err) => {
                // nothing to re-resolve when a filter entry is focused
                tracing::debug!(%err, "collapse-all kept focus");
                if self.collapse != before {
                    CommandOutcome::Restructured
                } else {
                    CommandOutcome::Unchanged
                }
            }
        }
    }

    fn finish_restructure(
        &mut self,
        result: Result<Location, NavigationError>,
        before: CollapseState,
    ) -> CommandOutcome {
        match self.finish(result) {
            CommandOutcome::Unchanged if self.collapse != before => CommandOutcome::Restructured,
            outcome => outcome,
        }
    }

    /// Applies a navigation result. Failures are logged and leave focus alone.
    fn finish(&mut self, result: Result<Location, NavigationError>) -> CommandOutcome {
        match result {
            Ok(target) => {
                self.last_error = None;
                let encoded = target.encode();
                if encoded == self.current_path {
                    return CommandOutcome::Unchanged;
                }
                tracing::debug!(from = %self.current_path, to = %encoded, "sidebar focus moved");
                self.current_path = encoded;
                CommandOutcome::Moved(target)
            }
            Err(err) => {
                tracing::warn!(%err, path = %self.current_path, "sidebar navigation failed");
                self.last_error = Some(err.to_string());
                CommandOutcome::Unchanged
            }
        }
    }

    /// Direct selection, e.g. a mouse click. A folder hidden under a
    /// collapsed storage resolves to that storage.
    fn select(&mut self, location: Location) -> CommandOutcome {
        if !self.location_exists(&location) {
            tracing::warn!(%location, "cannot select missing sidebar entry");
            self.last_error = Some(format!("'{location}' is not in the sidebar"));
            return CommandOutcome::Unchanged;
        }
        let target = match location {
            Location::Folder {
                ref storage_key, ..
            } if self.collapse.is_collapsed(storage_key) => {
                tracing::debug!(%location, "selected folder is hidden, focusing its storage");
                Location::storage(storage_key.as_str())
            }
            visible => visible,
        };
        self.finish(Ok(target))
    }

    /// Flips one storage's collapse flag. Focus on one of its folders moves
    /// up to the storage when the folders disappear.
    fn toggle_storage(&mut self, storage_key: &str) -> CommandOutcome {
        if !self.storages.contains_key(storage_key) {
            let err = NavigationError::from(LookupError::KeyNotFound {
                key: storage_key.to_owned(),
            });
            return self.finish(Err(err));
        }
        let collapsed = self.collapse.toggle(storage_key);
        let focus_hidden = matches!(
            self.current_location(),
            Ok(Location::Folder { storage_key: ref key, .. }) if key == storage_key
        );
        if collapsed && focus_hidden {
            return self.finish(Ok(Location::storage(storage_key)));
        }
        CommandOutcome::Restructured
    }

    /// Folding hides the sidebar column and hands focus to the note list;
    /// unfolding gives it back.
    fn toggle_fold(&mut self) -> CommandOutcome {
        self.folded = !self.folded;
        tracing::debug!(folded = self.folded, "sidebar fold toggled");
        let to = if self.folded {
            Region::NoteList
        } else {
            Region::SideNav
        };
        self.send_focus(to);
        CommandOutcome::Restructured
    }

    fn hand_off(&mut self, to: Region) -> CommandOutcome {
        if to == Region::SideNav && self.folded {
            self.folded = false;
        }
        if self.send_focus(to) {
            CommandOutcome::FocusHandoff(to)
        } else {
            CommandOutcome::Unchanged
        }
    }

    fn send_focus(&mut self, to: Region) -> bool {
        let from = self.active_region();
        if from == to {
            return false;
        }
        self.channel.hand_off(from, to);
        self.channel.drain(&mut self.focus);
        true
    }

    fn location_exists(&self, location: &Location) -> bool {
        match location {
            Location::Storage { storage_key } => self.storages.contains_key(storage_key),
            Location::Folder {
                storage_key,
                folder_key,
            } => self
                .storages
                .get(storage_key)
                .and_then(|storage| storage.folder_index(folder_key))
                .is_some(),
            _ => true,
        }
    }

    fn fallback_location(&self) -> Location {
        self.navigator
            .filters()
            .get(0)
            .map(FilterEntry::location)
            .unwrap_or(Location::Home)
    }
}
