//! Bridge state (§4.H, §3 GLOSSARY): rebuilt from the daemon on every
//! refresh, never mutated in place — `update` always produces a fresh
//! `containers`/`flat_items` list and then reconciles the cursor onto it.

use ccbox_session::Session;
use std::time::Instant;

/// Runtime view of one live sandbox, rebuilt from the daemon each
/// refresh (§3 GLOSSARY `ContainerInfo`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    pub project: String,
    pub stack: String,
    pub status: String,
    pub healthy: bool,
    pub sessions: Vec<Session>,
}

/// UI navigation atom: either a container row or one of its session
/// rows. `stable_id` survives refreshes so the cursor can track the same
/// logical row even as the underlying list is rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatItem {
    Container { stable_id: String, container_id: String },
    Session {
        stable_id: String,
        container_id: String,
        session_id: String,
    },
}

impl FlatItem {
    pub fn stable_id(&self) -> &str {
        match self {
            FlatItem::Container { stable_id, .. } => stable_id,
            FlatItem::Session { stable_id, .. } => stable_id,
        }
    }
}

fn container_stable_id(id: &str) -> String {
    format!("c:{id}")
}

fn session_stable_id(container_id: &str, session_id: &str) -> String {
    format!("s:{container_id}:{session_id}")
}

/// Flattens `containers` into navigation rows: each container row
/// immediately followed by its sessions' rows, in discovery order.
pub fn flatten(containers: &[ContainerInfo]) -> Vec<FlatItem> {
    let mut items = Vec::new();
    for container in containers {
        items.push(FlatItem::Container {
            stable_id: container_stable_id(&container.id),
            container_id: container.id.clone(),
        });
        for session in &container.sessions {
            items.push(FlatItem::Session {
                stable_id: session_stable_id(&container.id, &session.session_id),
                container_id: container.id.clone(),
                session_id: session.session_id.clone(),
            });
        }
    }
    items
}

/// The full reactive state (§4.H): owned exclusively by the bridge's UI
/// task, mutated only inside `update`.
pub struct BridgeState {
    pub project_path: String,
    pub ccbox_args: Vec<String>,
    pub containers: Vec<ContainerInfo>,
    pub flat_items: Vec<FlatItem>,
    pub cursor_index: usize,
    pub selected_id: Option<String>,
    pub status_message: Option<String>,
    pub status_expiry: Option<Instant>,
    pub width: u16,
    pub height: u16,
    pub is_recording: bool,
    pub is_pasting: bool,
    pub quitting: bool,
}

impl BridgeState {
    pub fn new(project_path: String, ccbox_args: Vec<String>, width: u16, height: u16) -> Self {
        BridgeState {
            project_path,
            ccbox_args,
            containers: Vec::new(),
            flat_items: Vec::new(),
            cursor_index: 0,
            selected_id: None,
            status_message: None,
            status_expiry: None,
            width,
            height,
            is_recording: false,
            is_pasting: false,
            quitting: false,
        }
    }

    pub fn selected_item(&self) -> Option<&FlatItem> {
        self.flat_items.get(self.cursor_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(id: &str, sessions: Vec<Session>) -> ContainerInfo {
        ContainerInfo {
            id: id.to_string(),
            name: format!("ccbox_{id}"),
            project: "proj".to_string(),
            stack: "python".to_string(),
            status: "Up".to_string(),
            healthy: true,
            sessions,
        }
    }

    fn session(session_id: &str) -> Session {
        Session {
            id: session_id.chars().take(6).collect(),
            project_dir: "-home-user-proj".to_string(),
            session_id: session_id.to_string(),
            created_at: 0,
        }
    }

    #[test]
    fn flatten_interleaves_container_and_its_sessions() {
        let containers = vec![container("mock-1", vec![session("abc123")])];
        let items = flatten(&containers);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].stable_id(), "c:mock-1");
        assert_eq!(items[1].stable_id(), "s:mock-1:abc123");
    }

    #[test]
    fn flatten_empty_when_no_containers() {
        assert!(flatten(&[]).is_empty());
    }
}
