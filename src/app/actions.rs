use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::KeybindingProfile;
use crate::focus::Region;
use crate::nav::Location;

/// Commands the sidebar understands, independent of concrete keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarCommand {
    MoveUp,
    MoveDown,
    CollapseCurrentStorage,
    ExpandCurrentStorage,
    CollapseAllStorages,
    ExpandAllStorages,
    FocusNextRegion,
    FocusPreviousRegion,
    Focus(Region),
    /// Hide or show the sidebar column.
    ToggleFold,
    Select(Location),
    /// Flip one storage's collapse flag by key (collapse marker click).
    ToggleStorage(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Reload,
    Sidebar(SidebarCommand),
}

#[derive(Debug, Clone, Copy)]
pub struct Keymap {
    profile: KeybindingProfile,
}

impl Keymap {
    pub fn new(profile: KeybindingProfile) -> Self {
        Self { profile }
    }

    /// Bulk bindings are matched before their single-storage counterparts
    /// because they share keys and differ only by extra modifiers.
    pub fn resolve(&self, key: KeyEvent) -> Option<Action> {
        use SidebarCommand::*;

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);

        let command = match key.code {
            KeyCode::Char('c') if ctrl => return Some(Action::Quit),
            KeyCode::Char('r') if ctrl => return Some(Action::Reload),
            KeyCode::Char('q') if plain => return Some(Action::Quit),
            KeyCode::Char('t') if ctrl => ToggleFold,
            KeyCode::Up => MoveUp,
            KeyCode::Char('p') if ctrl => MoveUp,
            KeyCode::Down => MoveDown,
            KeyCode::Char('n') if ctrl => MoveDown,
            KeyCode::Left if ctrl && shift => CollapseAllStorages,
            KeyCode::Char('A') if ctrl => CollapseAllStorages,
            KeyCode::Right if ctrl && shift => ExpandAllStorages,
            KeyCode::Char('E') if ctrl => ExpandAllStorages,
            KeyCode::Left if shift => CollapseCurrentStorage,
            KeyCode::Char('a') if ctrl => CollapseCurrentStorage,
            KeyCode::Right if shift => ExpandCurrentStorage,
            KeyCode::Char('e') if ctrl => ExpandCurrentStorage,
            KeyCode::Right | KeyCode::Tab => FocusNextRegion,
            KeyCode::Char('f') if ctrl => FocusNextRegion,
            KeyCode::Left | KeyCode::BackTab => FocusPreviousRegion,
            KeyCode::Char('b') if ctrl => FocusPreviousRegion,
            KeyCode::Char(ch) if plain && self.profile == KeybindingProfile::Vim => {
                vim_command(ch)?
            }
            _ => return None,
        };
        Some(Action::Sidebar(command))
    }
}

fn vim_command(ch: char) -> Option<SidebarCommand> {
    let command = match ch {
        'k' => SidebarCommand::MoveUp,
        'j' => SidebarCommand::MoveDown,
        'h' => SidebarCommand::CollapseCurrentStorage,
        'l' => SidebarCommand::ExpandCurrentStorage,
        'H' => SidebarCommand::CollapseAllStorages,
        'L' => SidebarCommand::ExpandAllStorages,
        _ => return None,
    };
    Some(command)
}
