//! Rendering (§4.H): a 3-row header, a sortable list of [`FlatItem`]
//! rows, a transient status line, and the key legend. Differential —
//! the assembled frame is compared against the last one emitted and the
//! draw call is skipped on no change, so a quiet session never flickers.

use crate::state::{BridgeState, FlatItem};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, List, ListItem, Paragraph};
use ratatui::Frame;

const KEY_LEGEND: &str =
    "↑/k ↓/j move  n new  s stop  v voice  p paste  Enter attach  q quit";

pub struct HeaderInfo {
    pub repo_branch: String,
    pub release_tag: Option<String>,
    pub alert_count: usize,
    pub username: String,
    pub assistant_version: String,
    pub model: String,
    pub context_usage_pct: u8,
}

fn header_lines(info: &HeaderInfo, width: u16) -> Vec<Line<'static>> {
    let title = match &info.release_tag {
        Some(tag) => format!("{} ({tag})", info.repo_branch),
        None => info.repo_branch.clone(),
    };
    let alerts = if info.alert_count > 0 {
        format!("{} alert(s)", info.alert_count)
    } else {
        "no alerts".to_string()
    };
    let identity = format!(
        "{} · {} · {} · ctx {}%",
        info.username, info.assistant_version, info.model, info.context_usage_pct
    );
    vec![
        Line::from(Span::styled(
            pad(&title, width),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(pad(&alerts, width)),
        Line::from(pad(&identity, width)),
    ]
}

fn pad(s: &str, width: u16) -> String {
    let mut owned = s.to_string();
    let w = width as usize;
    if owned.len() < w {
        owned.push_str(&" ".repeat(w - owned.len()));
    }
    owned
}

fn health_dot(healthy: bool) -> &'static str {
    if healthy {
        "●"
    } else {
        "○"
    }
}

fn list_items(state: &BridgeState) -> Vec<ListItem<'static>> {
    state
        .flat_items
        .iter()
        .map(|item| {
            let (label, healthy) = match item {
                FlatItem::Container { container_id, .. } => {
                    let info = state.containers.iter().find(|c| &c.id == container_id);
                    let name = info.map(|c| c.name.clone()).unwrap_or_default();
                    let stack = info.map(|c| c.stack.clone()).unwrap_or_default();
                    let status = info.map(|c| c.status.clone()).unwrap_or_default();
                    (format!("{name}  {stack}  {status}"), info.map(|c| c.healthy).unwrap_or(false))
                }
                FlatItem::Session { session_id, .. } => (format!("  ↳ {session_id}"), true),
            };
            let is_selected = state.selected_item() == Some(item);
            let mut style = Style::default();
            if is_selected {
                style = style.add_modifier(Modifier::REVERSED);
            }
            ListItem::new(format!("{} {label}", health_dot(healthy))).style(style)
        })
        .collect()
}

/// Draws the whole bridge UI for one frame.
pub fn draw(frame: &mut Frame, state: &BridgeState, header: &HeaderInfo) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    draw_header(frame, chunks[0], header);
    draw_list(frame, chunks[1], state);
    draw_status(frame, chunks[2], state);
    draw_legend(frame, chunks[3]);
}

fn draw_header(frame: &mut Frame, area: Rect, header: &HeaderInfo) {
    let lines = header_lines(header, area.width);
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_list(frame: &mut Frame, area: Rect, state: &BridgeState) {
    let list = List::new(list_items(state)).block(Block::default());
    frame.render_widget(list, area);
}

fn draw_status(frame: &mut Frame, area: Rect, state: &BridgeState) {
    let text = state.status_message.clone().unwrap_or_default();
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::Yellow)),
        area,
    );
}

fn draw_legend(frame: &mut Frame, area: Rect) {
    frame.render_widget(
        Paragraph::new(KEY_LEGEND).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

/// Tracks the last rendered frame so the caller can skip the draw call
/// when nothing changed (§4.H differential-render contract).
#[derive(Default)]
pub struct FrameCache {
    last: Option<Buffer>,
}

impl FrameCache {
    pub fn new() -> Self {
        FrameCache::default()
    }

    /// Returns `true` if `buffer` differs from the last one recorded,
    /// in which case it's stored as the new baseline.
    pub fn changed(&mut self, buffer: &Buffer) -> bool {
        let changed = self.last.as_ref() != Some(buffer);
        if changed {
            self.last = Some(buffer.clone());
        }
        changed
    }
}
