use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const HOME_PATH: &str = "/home";
pub const STARRED_PATH: &str = "/starred";
pub const TRASHED_PATH: &str = "/trashed";
const STORAGES_PREFIX: &str = "/storages/";
const FOLDERS_SEGMENT: &str = "folders";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse sidebar path '{path}'")]
pub struct ParseError {
    pub path: String,
}

impl ParseError {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_owned(),
        }
    }
}

/// The focused entry of the sidebar, decoded from its router path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    Home,
    Starred,
    Trashed,
    Storage {
        storage_key: String,
    },
    Folder {
        storage_key: String,
        folder_key: String,
    },
}

impl Location {
    pub fn storage(key: impl Into<String>) -> Self {
        Location::Storage {
            storage_key: key.into(),
        }
    }

    pub fn folder(storage_key: impl Into<String>, folder_key: impl Into<String>) -> Self {
        Location::Folder {
            storage_key: storage_key.into(),
            folder_key: folder_key.into(),
        }
    }

    /// Structural parse only; the referenced storage or folder may not exist.
    pub fn decode(path: &str) -> Result<Self, ParseError> {
        if path.starts_with(STORAGES_PREFIX) {
            let parts: Vec<&str> = path.split('/').skip(1).collect();
            return match parts.as_slice() {
                [_, storage_key] if !storage_key.is_empty() => Ok(Location::storage(*storage_key)),
                [_, storage_key, FOLDERS_SEGMENT, folder_key]
                    if !storage_key.is_empty() && !folder_key.is_empty() =>
                {
                    Ok(Location::folder(*storage_key, *folder_key))
                }
                _ => Err(ParseError::new(path)),
            };
        }
        if path.starts_with(HOME_PATH) {
            Ok(Location::Home)
        } else if path.starts_with(STARRED_PATH) {
            Ok(Location::Starred)
        } else if path.starts_with(TRASHED_PATH) {
            Ok(Location::Trashed)
        } else {
            Err(ParseError::new(path))
        }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn storage_key(&self) -> Option<&str> {
        match self {
            Location::Storage { storage_key } | Location::Folder { storage_key, .. } => {
                Some(storage_key)
            }
            _ => None,
        }
    }

    pub fn is_filter(&self) -> bool {
        matches!(self, Location::Home | Location::Starred | Location::Trashed)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Home => f.write_str(HOME_PATH),
            Location::Starred => f.write_str(STARRED_PATH),
            Location::Trashed => f.write_str(TRASHED_PATH),
            Location::Storage { storage_key } => write!(f, "{STORAGES_PREFIX}{storage_key}"),
            Location::Folder {
                storage_key,
                folder_key,
            } => write!(
                f,
                "{STORAGES_PREFIX}{storage_key}/{FOLDERS_SEGMENT}/{folder_key}"
            ),
        }
    }
}

impl FromStr for Location {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Location::decode(s)
    }
}
