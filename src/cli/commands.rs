use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::app::App;
use crate::config::AppConfig;
use crate::nav::{
    self, CollapseState, Direction, FilterEntry, Location, Navigator, StorageMap, TreeSnapshot,
};
use crate::storage::{StorageHandle, StorageSummary};

#[derive(Subcommand, Debug, Clone)]
pub enum StorageCommand {
    /// Create a storage at the bottom of the sidebar
    Add(NameArgs),
    /// List storages in sidebar order
    List,
    /// Rename a storage
    Rename(RenameArgs),
    /// Delete a storage and all of its folders
    Remove(KeyArgs),
}

#[derive(Subcommand, Debug, Clone)]
pub enum FolderCommand {
    /// Create a folder at the bottom of a storage
    Add(FolderAddArgs),
    /// Delete a folder from a storage
    Remove(FolderRemoveArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StorageArgs {
    #[command(subcommand)]
    pub command: StorageCommand,
}

#[derive(Args, Debug, Clone)]
pub struct FolderArgs {
    #[command(subcommand)]
    pub command: FolderCommand,
}

#[derive(Args, Debug, Clone)]
pub struct NameArgs {
    /// Display name (whitespace trimmed)
    pub name: String,
}

#[derive(Args, Debug, Clone)]
pub struct KeyArgs {
    /// Storage key as shown by `storage list`
    pub key: String,
}

#[derive(Args, Debug, Clone)]
pub struct RenameArgs {
    /// Storage key
    pub key: String,
    /// New display name
    pub name: String,
}

#[derive(Args, Debug, Clone)]
pub struct FolderAddArgs {
    /// Key of the storage that will own the folder
    pub storage_key: String,
    /// Folder display name
    pub name: String,
}

#[derive(Args, Debug, Clone)]
pub struct FolderRemoveArgs {
    pub storage_key: String,
    pub folder_key: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TreeArgs {
    /// Treat these storage keys as collapsed
    #[arg(long = "collapsed", value_name = "KEY")]
    pub collapsed: Vec<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    Up,
    Down,
}

impl From<DirectionArg> for Direction {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Up => Direction::Up,
            DirectionArg::Down => Direction::Down,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct MoveArgs {
    /// Current sidebar path, e.g. /home or /storages/<key>/folders/<key>
    pub path: String,
    #[arg(value_enum)]
    pub direction: DirectionArg,
    /// Treat these storage keys as collapsed
    #[arg(long = "collapsed", value_name = "KEY")]
    pub collapsed: Vec<String>,
    /// Print a JSON object instead of the bare target path
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct MoveReport<'a> {
    from: &'a str,
    direction: String,
    to: String,
}

pub fn run_tui(app: &mut App) -> Result<()> {
    if !atty::is(atty::Stream::Stdout) {
        bail!("the interactive sidebar needs a terminal on stdout");
    }
    app.run()
}

pub fn handle_storage_command(storage: StorageHandle, args: StorageArgs) -> Result<()> {
    match args.command {
        StorageCommand::Add(args) => {
            let key = storage.add_storage(&args.name).context("creating storage")?;
            println!("Created storage {key}");
        }
        StorageCommand::List => {
            let summaries = storage.list_storages()?;
            print!("{}", format_storage_list(&summaries));
        }
        StorageCommand::Rename(args) => {
            storage
                .rename_storage(&args.key, &args.name)
                .with_context(|| format!("renaming storage {}", args.key))?;
            println!("Renamed storage {} to '{}'", args.key, args.name.trim());
        }
        StorageCommand::Remove(args) => {
            let folders = storage
                .remove_storage(&args.key)
                .with_context(|| format!("removing storage {}", args.key))?;
            println!("Removed storage {} ({folders} folder(s))", args.key);
        }
    }
    Ok(())
}

pub fn handle_folder_command(storage: StorageHandle, args: FolderArgs) -> Result<()> {
    match args.command {
        FolderCommand::Add(args) => {
            let key = storage
                .add_folder(&args.storage_key, &args.name)
                .with_context(|| format!("adding folder to storage {}", args.storage_key))?;
            println!(
                "Created folder {}",
                Location::folder(args.storage_key.as_str(), key)
            );
        }
        FolderCommand::Remove(args) => {
            storage
                .remove_folder(&args.storage_key, &args.folder_key)
                .context("removing folder")?;
            println!(
                "Removed folder {}",
                Location::folder(args.storage_key, args.folder_key)
            );
        }
    }
    Ok(())
}

pub fn print_tree(config: Arc<AppConfig>, storage: StorageHandle, args: TreeArgs) -> Result<()> {
    let tree = storage.load_tree()?;
    let collapse = collapse_from_keys(&tree, &args.collapsed);
    let navigator = Navigator::new(config.sidebar.filter_cycle());
    print!("{}", format_tree(&navigator, &tree, &collapse));
    Ok(())
}

pub fn move_once(config: Arc<AppConfig>, storage: StorageHandle, args: MoveArgs) -> Result<()> {
    let tree = storage.load_tree()?;
    let navigator = Navigator::new(config.sidebar.filter_cycle());
    let output = run_move(&navigator, &tree, &args)?;
    println!("{output}");
    Ok(())
}

fn run_move(navigator: &Navigator, tree: &StorageMap, args: &MoveArgs) -> Result<String> {
    let collapse = collapse_from_keys(tree, &args.collapsed);
    let direction = Direction::from(args.direction);
    let target = nav::move_path(
        navigator,
        args.path.trim(),
        TreeSnapshot::new(tree, &collapse),
        direction,
    )
    .with_context(|| format!("moving {direction} from {}", args.path))?;
    if !args.json {
        return Ok(target);
    }
    let report = MoveReport {
        from: args.path.trim(),
        direction: direction.to_string(),
        to: target,
    };
    serde_json::to_string(&report).context("serializing move report")
}

fn collapse_from_keys(tree: &StorageMap, keys: &[String]) -> CollapseState {
    for key in keys {
        if !tree.contains_key(key) {
            tracing::warn!(%key, "ignoring unknown storage key in --collapsed");
        }
    }
    keys.iter()
        .map(String::as_str)
        .filter(|key| tree.contains_key(key))
        .collect()
}

fn format_tree(navigator: &Navigator, tree: &StorageMap, collapse: &CollapseState) -> String {
    let snapshot = TreeSnapshot::new(tree, collapse);
    let mut out = String::new();
    for location in navigator.visible_order(snapshot) {
        let line = match &location {
            Location::Storage { storage_key } => {
                let storage = tree.get(storage_key);
                let name = storage.map(|s| s.name.as_str()).unwrap_or("?");
                let marker = match storage {
                    Some(s) if s.folders.is_empty() => " ",
                    Some(s) if snapshot.is_collapsed(s) => "+",
                    _ => "-",
                };
                format!("{marker} {name}  {location}")
            }
            Location::Folder {
                storage_key,
                folder_key,
            } => {
                let name = tree
                    .get(storage_key)
                    .and_then(|s| s.folders.iter().find(|f| &f.key == folder_key))
                    .map(|f| f.name.as_str())
                    .unwrap_or("?");
                format!("    {name}  {location}")
            }
            filter => {
                let label = FilterEntry::from_location(filter)
                    .map(|entry| entry.to_string())
                    .unwrap_or_default();
                format!("  {label}  {filter}")
            }
        };
        let _ = writeln!(&mut out, "{line}");
    }
    out
}

fn format_storage_list(summaries: &[StorageSummary]) -> String {
    if summaries.is_empty() {
        return "No storages yet.\n".to_string();
    }
    let mut out = String::new();
    for summary in summaries {
        let _ = writeln!(&mut out, "{}  {}", summary.key, summary.name);
        let _ = writeln!(
            &mut out,
            "    folders {}  created {}",
            summary.folder_count,
            format_timestamp(summary.created_at)
        );
    }
    out
}

fn format_timestamp(epoch: i64) -> String {
    OffsetDateTime::from_unix_timestamp(epoch)
        .map(|dt| dt.format(&Rfc3339).unwrap_or_else(|_| epoch.to_string()))
        .unwrap_or_else(|_| epoch.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::{Folder, Storage};

    type TestResult<T = ()> = Result<T>;

    fn sample_tree() -> StorageMap {
        [
            Storage::new("s0", "Notes", vec![Folder::new("f0", "Inbox")]),
            Storage::new("s1", "Work", Vec::new()),
        ]
        .into_iter()
        .collect()
    }

    fn move_args(path: &str, direction: DirectionArg) -> MoveArgs {
        MoveArgs {
            path: path.into(),
            direction,
            collapsed: Vec::new(),
            json: false,
        }
    }

    #[test]
    fn cli_move_prints_target_path() -> TestResult {
        let tree = sample_tree();
        let nav = Navigator::default();
        let output = run_move(&nav, &tree, &move_args("/storages/s0", DirectionArg::Down))?;
        assert_eq!(output, "/storages/s0/folders/f0");

        let mut args = move_args("/storages/s0", DirectionArg::Down);
        args.collapsed = vec!["s0".into(), "unknown".into()];
        assert_eq!(run_move(&nav, &tree, &args)?, "/storages/s1");
        Ok(())
    }

    #[test]
    fn cli_move_reports_json() -> TestResult {
        let tree = sample_tree();
        let mut args = move_args("/home", DirectionArg::Up);
        args.json = true;
        let output = run_move(&Navigator::default(), &tree, &args)?;
        let value: serde_json::Value = serde_json::from_str(&output)?;
        assert_eq!(value["from"], "/home");
        assert_eq!(value["direction"], "up");
        assert_eq!(value["to"], "/storages/s1");
        Ok(())
    }

    #[test]
    fn cli_move_fails_on_bad_paths() {
        let tree = sample_tree();
        let err = run_move(
            &Navigator::default(),
            &tree,
            &move_args("/storages/", DirectionArg::Down),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("cannot parse sidebar path"));
    }

    #[test]
    fn cli_tree_marks_collapsed_storages() {
        let tree = sample_tree();
        let nav = Navigator::default();
        let expanded = format_tree(&nav, &tree, &CollapseState::new());
        insta::assert_snapshot!(expanded.trim_end(), @r"
  All Notes  /home
  Starred  /starred
- Notes  /storages/s0
    Inbox  /storages/s0/folders/f0
  Work  /storages/s1
");

        let collapsed: CollapseState = ["s0"].into_iter().collect();
        let output = format_tree(&nav, &tree, &collapsed);
        assert!(output.contains("+ Notes"));
        assert!(!output.contains("Inbox"));
        assert_eq!(output.lines().count(), 4);
    }

    #[test]
    fn storage_list_formats_each_entry() {
        let output = format_storage_list(&[StorageSummary {
            key: "abc".into(),
            name: "Notes".into(),
            folder_count: 2,
            created_at: 0,
        }]);
        assert!(output.contains("abc  Notes"));
        assert!(output.contains("folders 2  created 1970-01-01T00:00:00Z"));
        assert_eq!(format_storage_list(&[]), "No storages yet.\n");
    }
}
