//! Message handling (§4.H): the one place `BridgeState` is mutated.
//! Refresh rebuilds `containers`/`flat_items` from scratch and then
//! reconciles the cursor by `selected_id` first, falling back to a
//! clamped index — refreshes never move the user's selection unless its
//! target disappeared (§5, §8 cursor-stability property).

use crate::message::{Key, Msg};
use crate::state::{flatten, BridgeState};
use std::time::{Duration, Instant};

const STATUS_TTL: Duration = Duration::from_secs(3);

fn reconcile_cursor(state: &mut BridgeState) {
    if let Some(selected) = &state.selected_id {
        if let Some(idx) = state
            .flat_items
            .iter()
            .position(|item| item.stable_id() == selected)
        {
            state.cursor_index = idx;
            return;
        }
    }
    state.cursor_index = state.cursor_index.min(state.flat_items.len().saturating_sub(1));
    state.selected_id = state
        .flat_items
        .get(state.cursor_index)
        .map(|item| item.stable_id().to_string());
}

fn move_cursor(state: &mut BridgeState, delta: i64) {
    if state.flat_items.is_empty() {
        return;
    }
    let len = state.flat_items.len() as i64;
    let current = state.cursor_index as i64;
    let next = (current + delta).rem_euclid(len) as usize;
    state.cursor_index = next;
    state.selected_id = Some(state.flat_items[next].stable_id().to_string());
}

/// Applies one message to `state`. Returns a list of side-effecting
/// commands the caller should spawn as detached tasks (§5: "long-running
/// actions run on separate tasks and post their completion as a
/// statusMsg; the UI never blocks on them").
pub fn update(state: &mut BridgeState, msg: Msg) -> Vec<Command> {
    match msg {
        Msg::Tick => Vec::new(),
        Msg::Refresh(containers) => {
            state.containers = containers;
            state.flat_items = flatten(&state.containers);
            reconcile_cursor(state);
            Vec::new()
        }
        Msg::Key(key) => handle_key(state, key),
        Msg::StatusMsg(text) => {
            state.status_message = Some(text);
            state.status_expiry = Some(Instant::now() + STATUS_TTL);
            Vec::new()
        }
        Msg::ContainerStopped(name) => {
            state.status_message = Some(format!("{name} stopped"));
            state.status_expiry = Some(Instant::now() + STATUS_TTL);
            Vec::new()
        }
        Msg::Resize(w, h) => {
            state.width = w;
            state.height = h;
            Vec::new()
        }
    }
}

/// An action the caller dispatches on a detached task; its eventual
/// result is posted back as [`Msg::StatusMsg`] or [`Msg::ContainerStopped`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SpawnNewContainer { ccbox_args: Vec<String> },
    StopContainer { container_id: String },
    RecordAndPasteVoice { container_id: String },
    PasteClipboard { container_id: String },
    AttachShell { container_id: String },
    Quit,
}

fn handle_key(state: &mut BridgeState, key: Key) -> Vec<Command> {
    match key {
        Key::Up => {
            move_cursor(state, -1);
            Vec::new()
        }
        Key::Down => {
            move_cursor(state, 1);
            Vec::new()
        }
        Key::Quit => {
            state.quitting = true;
            vec![Command::Quit]
        }
        Key::New => vec![Command::SpawnNewContainer {
            ccbox_args: state.ccbox_args.clone(),
        }],
        Key::Stop => selected_container_id(state)
            .map(|container_id| vec![Command::StopContainer { container_id }])
            .unwrap_or_default(),
        Key::Record => selected_container_id(state)
            .map(|container_id| {
                state.is_recording = true;
                vec![Command::RecordAndPasteVoice { container_id }]
            })
            .unwrap_or_default(),
        Key::Paste => selected_container_id(state)
            .map(|container_id| {
                state.is_pasting = true;
                vec![Command::PasteClipboard { container_id }]
            })
            .unwrap_or_default(),
        Key::Enter => selected_container_id(state)
            .map(|container_id| vec![Command::AttachShell { container_id }])
            .unwrap_or_default(),
        Key::Other(_) => Vec::new(),
    }
}

fn selected_container_id(state: &BridgeState) -> Option<String> {
    use crate::state::FlatItem;
    match state.selected_item()? {
        FlatItem::Container { container_id, .. } => Some(container_id.clone()),
        FlatItem::Session { container_id, .. } => Some(container_id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ContainerInfo;

    fn container(id: &str) -> ContainerInfo {
        ContainerInfo {
            id: id.to_string(),
            name: format!("ccbox_{id}"),
            project: "proj".to_string(),
            stack: "python".to_string(),
            status: "Up".to_string(),
            healthy: true,
            sessions: Vec::new(),
        }
    }

    fn state() -> BridgeState {
        BridgeState::new("/home/user/proj".to_string(), vec![], 80, 24)
    }

    #[test]
    fn refresh_populates_flat_items_and_selects_first_row() {
        let mut state = state();
        update(&mut state, Msg::Refresh(vec![container("mock-1"), container("mock-2")]));
        assert_eq!(state.flat_items.len(), 2);
        assert_eq!(state.selected_id.as_deref(), Some("c:mock-1"));
    }

    #[test]
    fn cursor_follows_selected_id_across_refresh_reordering() {
        let mut state = state();
        update(&mut state, Msg::Refresh(vec![container("mock-1"), container("mock-2")]));
        update(&mut state, Msg::Key(Key::Down));
        assert_eq!(state.selected_id.as_deref(), Some("c:mock-2"));

        update(&mut state, Msg::Refresh(vec![container("mock-2"), container("mock-1")]));
        assert_eq!(state.cursor_index, 0);
        assert_eq!(state.selected_id.as_deref(), Some("c:mock-2"));
    }

    #[test]
    fn cursor_clamps_when_selection_disappears() {
        let mut state = state();
        update(&mut state, Msg::Refresh(vec![container("mock-1"), container("mock-2")]));
        update(&mut state, Msg::Key(Key::Down));
        update(&mut state, Msg::Refresh(vec![container("mock-1")]));
        assert_eq!(state.cursor_index, 0);
        assert_eq!(state.selected_id.as_deref(), Some("c:mock-1"));
    }

    #[test]
    fn quit_key_sets_quitting_and_returns_quit_command() {
        let mut state = state();
        let commands = update(&mut state, Msg::Key(Key::Quit));
        assert!(state.quitting);
        assert_eq!(commands, vec![Command::Quit]);
    }

    #[test]
    fn stop_key_targets_selected_container() {
        let mut state = state();
        update(&mut state, Msg::Refresh(vec![container("mock-1")]));
        let commands = update(&mut state, Msg::Key(Key::Stop));
        assert_eq!(
            commands,
            vec![Command::StopContainer {
                container_id: "mock-1".to_string()
            }]
        );
    }

    #[test]
    fn up_down_wraps_around_the_list() {
        let mut state = state();
        update(&mut state, Msg::Refresh(vec![container("mock-1"), container("mock-2")]));
        update(&mut state, Msg::Key(Key::Up));
        assert_eq!(state.selected_id.as_deref(), Some("c:mock-2"));
    }
}
