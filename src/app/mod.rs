use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use ratatui::Terminal;

use crate::config::AppConfig;
use crate::focus::Region;
use crate::storage::StorageHandle;
use crate::ui::{self, Areas, SidebarHit};

pub mod actions;
pub mod state;

pub use actions::{Action, Keymap, SidebarCommand};
pub use state::{CommandOutcome, SidebarRow, SidebarState};

pub struct App {
    pub config: Arc<AppConfig>,
    pub storage: StorageHandle,
    sidebar: SidebarState,
    keymap: Keymap,
    list_state: ListState,
    areas: Areas,
    should_quit: bool,
    poll_interval: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, storage: StorageHandle) -> Result<Self> {
        let tree = storage
            .load_tree()
            .context("loading storages for initial sidebar state")?;
        let sidebar = SidebarState::from_config(&config, tree);
        let keymap = Keymap::new(config.keybindings);
        tracing::info!(
            storages = sidebar.storages().len(),
            start = %sidebar.current_path(),
            "sidebar ready"
        );
        Ok(Self {
            config,
            storage,
            sidebar,
            keymap,
            list_state: ListState::default(),
            areas: Areas::default(),
            should_quit: false,
            poll_interval: Duration::from_millis(250),
        })
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    pub fn sidebar(&self) -> &SidebarState {
        &self.sidebar
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let width = self.config.sidebar.width;
        loop {
            terminal
                .draw(|frame| {
                    self.areas = ui::draw_app(frame, &self.sidebar, width, &mut self.list_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            if event::poll(self.poll_interval).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    Event::Resize(_, _) => {
                        // no-op: next draw will naturally adapt to the new size
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if let Some(action) = self.keymap.resolve(key) {
            self.handle_action(action);
        }
    }

    /// Left clicks select sidebar rows or toggle a storage via its marker,
    /// and focus whichever region was clicked. The wheel moves focus.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (column, row) = (mouse.column, mouse.row);
        let in_sidebar = contains(self.areas.sidebar, column, row);
        let command = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if in_sidebar => {
                self.sidebar.apply(SidebarCommand::Focus(Region::SideNav));
                let rows = self.sidebar.rows();
                let offset = self.list_state.offset();
                match ui::hit_sidebar(self.areas.sidebar, offset, &rows, column, row) {
                    Some(SidebarHit::Marker(index)) => rows[index]
                        .location
                        .storage_key()
                        .map(|key| SidebarCommand::ToggleStorage(key.to_owned())),
                    Some(SidebarHit::Row(index)) => {
                        Some(SidebarCommand::Select(rows[index].location.clone()))
                    }
                    None => None,
                }
            }
            MouseEventKind::Down(MouseButton::Left) if contains(self.areas.notes, column, row) => {
                Some(SidebarCommand::Focus(Region::NoteList))
            }
            MouseEventKind::ScrollUp if in_sidebar => Some(SidebarCommand::MoveUp),
            MouseEventKind::ScrollDown if in_sidebar => Some(SidebarCommand::MoveDown),
            _ => None,
        };
        if let Some(command) = command {
            self.handle_action(Action::Sidebar(command));
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Reload => {
                if let Err(err) = self.reload() {
                    tracing::error!(?err, "failed to reload storages from catalog");
                }
            }
            Action::Sidebar(command) => {
                let outcome = self.sidebar.apply(command);
                tracing::trace!(?outcome, "sidebar command applied");
            }
        }
    }

    pub fn reload(&mut self) -> Result<()> {
        let tree = self.storage.load_tree().context("reloading storages")?;
        self.sidebar.reload(tree);
        Ok(())
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.right() && row >= area.y && row < area.bottom()
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigPaths, KeybindingProfile};
    use crate::nav::Location;
    use crate::storage;
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::layout::Rect;
    use tempfile::TempDir;

    fn app_with_catalog() -> anyhow::Result<(TempDir, App)> {
        let temp = TempDir::new()?;
        let config_dir = temp.path().join("config");
        let paths = ConfigPaths::rooted(
            config_dir.clone(),
            config_dir.join("config.toml"),
            temp.path().join("data"),
        );
        paths.ensure_directories()?;
        let mut config = AppConfig::default();
        config.keybindings = KeybindingProfile::Vim;
        config.storage.database_path = paths.database_path.clone();
        let catalog = storage::init(&paths, &config.storage)?;
        let app = App::new(Arc::new(config), catalog)?;
        Ok((temp, app))
    }

    fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        app.handle_key(KeyEvent::new(code, modifiers));
    }

    #[test]
    fn key_presses_drive_the_sidebar() -> anyhow::Result<()> {
        let (_temp, mut app) = app_with_catalog()?;
        assert_eq!(app.sidebar().current_location(), Ok(Location::Home));

        press(&mut app, KeyCode::Up, KeyModifiers::NONE);
        // seeded catalog: one expanded storage with one folder
        assert!(matches!(
            app.sidebar().current_location(),
            Ok(Location::Folder { .. })
        ));

        press(&mut app, KeyCode::Char('h'), KeyModifiers::NONE);
        assert!(matches!(
            app.sidebar().current_location(),
            Ok(Location::Storage { .. })
        ));
        assert_eq!(app.sidebar().collapse().collapsed_count(), 1);

        press(&mut app, KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(app.should_quit);
        Ok(())
    }

    fn click(app: &mut App, column: u16, row: u16) {
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        });
    }

    #[test]
    fn clicks_reach_trash_and_toggle_storages() -> anyhow::Result<()> {
        let (_temp, mut app) = app_with_catalog()?;
        app.areas = Areas::compute(Rect::new(0, 0, 80, 24), 32);

        // rows: All Notes, Starred, Trash, seeded storage, its folder
        click(&mut app, 10, 3);
        assert_eq!(app.sidebar().current_location(), Ok(Location::Trashed));

        click(&mut app, 3, 4);
        assert_eq!(app.sidebar().collapse().collapsed_count(), 1);
        assert_eq!(app.sidebar().rows().len(), 4);
        assert_eq!(app.sidebar().current_location(), Ok(Location::Trashed));

        press(&mut app, KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(app.sidebar().current_location(), Ok(Location::Starred));

        click(&mut app, 50, 5);
        assert_eq!(app.sidebar().active_region(), Region::NoteList);
        click(&mut app, 10, 1);
        assert_eq!(app.sidebar().active_region(), Region::SideNav);
        assert_eq!(app.sidebar().current_location(), Ok(Location::Home));
        Ok(())
    }

    #[test]
    fn reload_picks_up_catalog_changes() -> anyhow::Result<()> {
        let (_temp, mut app) = app_with_catalog()?;
        let key = app.storage.add_storage("Later")?;
        press(&mut app, KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert!(app.sidebar().storages().contains_key(&key));

        press(&mut app, KeyCode::Char('k'), KeyModifiers::NONE);
        assert_eq!(
            app.sidebar().current_location(),
            Ok(Location::storage(&key))
        );
        Ok(())
    }
}
