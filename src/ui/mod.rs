use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{SidebarRow, SidebarState};
use crate::focus::Region;
use crate::nav::Location;

const INDENT: &str = "  ";
const HIGHLIGHT_SYMBOL: &str = "▸ ";
const MARKER_WIDTH: u16 = 2;

/// Screen regions from the last frame, kept for mouse hit-testing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Areas {
    pub sidebar: Rect,
    pub notes: Rect,
    pub status: Rect,
}

impl Areas {
    pub fn compute(area: Rect, sidebar_width: u16) -> Self {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(2)])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(sidebar_width), Constraint::Min(10)])
            .split(vertical[0]);

        Self {
            sidebar: columns[0],
            notes: columns[1],
            status: vertical[1],
        }
    }
}

/// What a click inside the sidebar landed on, by row index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarHit {
    Row(usize),
    Marker(usize),
}

pub fn draw_app(
    frame: &mut Frame,
    state: &SidebarState,
    sidebar_width: u16,
    list_state: &mut ListState,
) -> Areas {
    let width = if state.is_folded() { 0 } else { sidebar_width };
    let areas = Areas::compute(frame.size(), width);

    if !state.is_folded() {
        draw_sidebar(frame, state, areas.sidebar, list_state);
    }
    draw_note_list(frame, state, areas.notes);

    let status = Paragraph::new(build_status_line(state)).style(Style::default().fg(Color::Gray));
    frame.render_widget(status, areas.status);
    areas
}

/// Maps a terminal cell to a sidebar row. `offset` is the list scroll
/// offset from the last render.
pub fn hit_sidebar(
    area: Rect,
    offset: usize,
    rows: &[SidebarRow],
    column: u16,
    row: u16,
) -> Option<SidebarHit> {
    let inner_x = area.x.saturating_add(1);
    let inner_y = area.y.saturating_add(1);
    let inner_right = area.right().saturating_sub(1);
    let inner_bottom = area.bottom().saturating_sub(1);
    if column < inner_x || column >= inner_right || row < inner_y || row >= inner_bottom {
        return None;
    }
    let index = offset + usize::from(row - inner_y);
    let hit = rows.get(index)?;
    let symbol_width = if rows.iter().any(|r| r.selected) {
        HIGHLIGHT_SYMBOL.width() as u16
    } else {
        0
    };
    let marker_start = inner_x + symbol_width + hit.depth * INDENT.width() as u16;
    let on_marker = hit.collapsed.is_some()
        && column >= marker_start
        && column < marker_start + MARKER_WIDTH;
    Some(if on_marker {
        SidebarHit::Marker(index)
    } else {
        SidebarHit::Row(index)
    })
}

fn region_style(state: &SidebarState, region: Region) -> Style {
    if state.focus().is_focused(region) {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn draw_sidebar(frame: &mut Frame, state: &SidebarState, area: Rect, list_state: &mut ListState) {
    let rows = state.rows();
    // borders plus highlight symbol
    let label_width = usize::from(area.width.saturating_sub(4));
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| ListItem::new(Line::from(row_spans(row, label_width))))
        .collect();

    list_state.select(rows.iter().position(|row| row.selected));

    let list = List::new(items)
        .block(
            Block::default()
                .title("Sidebar")
                .borders(Borders::ALL)
                .border_style(region_style(state, Region::SideNav)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(HIGHLIGHT_SYMBOL);
    frame.render_stateful_widget(list, area, list_state);
}

fn row_spans(row: &SidebarRow, width: usize) -> Vec<Span<'static>> {
    let marker = match row.collapsed {
        Some(true) => "▸ ",
        Some(false) => "▾ ",
        None if row.location.is_filter() => "",
        None if row.depth == 0 => "  ",
        None => "",
    };
    let indent = INDENT.repeat(usize::from(row.depth));
    let prefix = format!("{indent}{marker}");
    let remaining = width.saturating_sub(prefix.width());
    let label_style = match row.location {
        Location::Storage { .. } => Style::default().add_modifier(Modifier::BOLD),
        Location::Trashed => Style::default().fg(Color::Red),
        _ => Style::default(),
    };
    vec![
        Span::styled(prefix, Style::default().fg(Color::DarkGray)),
        Span::styled(truncate_to_width(&row.label, remaining), label_style),
    ]
}

fn draw_note_list(frame: &mut Frame, state: &SidebarState, area: Rect) {
    let heading = state
        .rows()
        .into_iter()
        .find(|row| row.selected)
        .map(|row| row.label)
        .unwrap_or_else(|| "Nothing selected".to_string());
    let lines = vec![
        Line::from(Span::styled(
            heading,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            state.current_path().to_string(),
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        Line::from("Notes for this location are listed here."),
    ];
    let body = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Notes")
                .borders(Borders::ALL)
                .border_style(region_style(state, Region::NoteList)),
        );
    frame.render_widget(body, area);
}

fn build_status_line(state: &SidebarState) -> Text<'static> {
    let focus = match state.active_region() {
        Region::SideNav => "Sidebar",
        Region::NoteList if state.is_folded() => "Notes (sidebar folded)",
        Region::NoteList => "Notes",
    };
    let mut spans = vec![
        Span::raw(format!("Storages: {} ", state.storages().len())),
        Span::raw(" | Collapsed: "),
        Span::styled(
            state.collapse().collapsed_count().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Focus: "),
        Span::styled(focus, Style::default().add_modifier(Modifier::BOLD)),
    ];
    if let Some(err) = state.last_error() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::ITALIC),
        ));
    }
    let hints = Line::from(Span::styled(
        "↑/↓ move  ⇧←/⇧→ collapse/expand  ^⇧←/^⇧→ all  → notes  ^t fold  ^r reload  q quit",
        Style::default().fg(Color::DarkGray),
    ));
    Text::from(vec![Line::from(spans), hints])
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let w = grapheme.width();
        if used + w + 1 > max_width {
            break;
        }
        out.push_str(grapheme);
        used += w;
    }
    out.push('…');
    out
}
