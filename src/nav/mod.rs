//! Sidebar keyboard navigation.
//!
//! Locations are decoded from router paths, moved through a snapshot of the
//! storage tree, and encoded back into paths. Every operation here is pure
//! apart from the explicit `&mut CollapseState` taken by collapse/expand.

use thiserror::Error;

pub mod collapse;
pub mod engine;
pub mod filters;
pub mod path;
pub mod tree;

pub use collapse::CollapseState;
pub use engine::{Direction, Navigator};
pub use filters::{FilterCycle, FilterEntry};
pub use path::{Location, ParseError};
pub use tree::{Folder, LookupError, Storage, StorageInfo, StorageMap, TreeSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("folder '{folder_key}' not found in storage '{storage_key}'")]
    UnknownFolder {
        storage_key: String,
        folder_key: String,
    },
    #[error("no filter entry at index {index}")]
    MissingFilter { index: usize },
    #[error("'{location}' is not a storage or folder")]
    NoStorageSelected { location: Location },
}

/// Decodes `path`, moves one step in `direction`, and encodes the target.
pub fn move_path(
    navigator: &Navigator,
    path: &str,
    tree: TreeSnapshot<'_>,
    direction: Direction,
) -> Result<String, NavigationError> {
    let from = Location::decode(path)?;
    navigator
        .step(&from, tree, direction)
        .map(|target| target.encode())
}
