use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use super::path::Location;

/// A fixed smart-filter entry at the top of the sidebar.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
pub enum FilterEntry {
    #[strum(to_string = "All Notes")]
    Home,
    #[strum(to_string = "Starred")]
    Starred,
    #[strum(to_string = "Trash")]
    Trashed,
}

impl FilterEntry {
    pub fn location(self) -> Location {
        match self {
            FilterEntry::Home => Location::Home,
            FilterEntry::Starred => Location::Starred,
            FilterEntry::Trashed => Location::Trashed,
        }
    }

    pub fn from_location(location: &Location) -> Option<Self> {
        match location {
            Location::Home => Some(FilterEntry::Home),
            Location::Starred => Some(FilterEntry::Starred),
            Location::Trashed => Some(FilterEntry::Trashed),
            _ => None,
        }
    }

    /// Every entry the sidebar renders, in display order.
    pub fn all() -> impl Iterator<Item = FilterEntry> {
        FilterEntry::iter()
    }
}

/// Ordered filter entries that take part in up/down cycling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCycle {
    entries: Vec<FilterEntry>,
}

impl FilterCycle {
    /// Entries are deduplicated in order; an empty cycle falls back to Home.
    pub fn new(entries: impl IntoIterator<Item = FilterEntry>) -> Self {
        let mut unique: Vec<FilterEntry> = Vec::new();
        for entry in entries {
            if !unique.contains(&entry) {
                unique.push(entry);
            }
        }
        if unique.is_empty() {
            unique.push(FilterEntry::Home);
        }
        Self { entries: unique }
    }

    pub fn with_trashed(cycle_trashed: bool) -> Self {
        if cycle_trashed {
            Self::new(FilterEntry::all())
        } else {
            Self::default()
        }
    }

    pub fn get(&self, index: usize) -> Option<FilterEntry> {
        self.entries.get(index).copied()
    }

    pub fn position(&self, entry: FilterEntry) -> Option<usize> {
        self.entries.iter().position(|candidate| *candidate == entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = FilterEntry> + '_ {
        self.entries.iter().copied()
    }
}

impl Default for FilterCycle {
    fn default() -> Self {
        Self::new([FilterEntry::Home, FilterEntry::Starred])
    }
}
