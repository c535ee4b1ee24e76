pub mod app;
pub mod cli;
pub mod config;
pub mod focus;
pub mod nav;
pub mod storage;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use nav::{Direction, Location, NavigationError, Navigator};
