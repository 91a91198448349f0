//! In-memory `ContainerEngine` for tests: no real daemon, deterministic
//! state, grounded in the teacher's `MockProvider` but shaped to the new
//! trait (image/container tables instead of VM lifecycle calls).

use crate::engine::{ContainerEngine, ExecOutput};
use crate::types::{ContainerSpec, ContainerSummary};
use ccbox_core::error::{CcboxError, Result};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct State {
    images: Vec<String>,
    containers: HashMap<String, ContainerSummary>,
    next_id: u32,
    exec_log: Vec<(String, Vec<String>)>,
    copy_log: Vec<(String, String)>,
}

/// Always-reachable mock engine. `container_create` assigns sequential
/// ids (`mock-1`, `mock-2`, ...); `run_attached` always "succeeds" with
/// exit code 0 unless [`MockEngine::set_next_exit_code`] says otherwise.
pub struct MockEngine {
    state: Mutex<State>,
    next_exit_code: Mutex<i32>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            next_exit_code: Mutex::new(0),
        }
    }

    pub fn set_next_exit_code(&self, code: i32) {
        *self.next_exit_code.lock().expect("lock") = code;
    }

    pub fn exec_log(&self) -> Vec<(String, Vec<String>)> {
        self.state.lock().expect("lock").exec_log.clone()
    }

    pub fn copy_log(&self) -> Vec<(String, String)> {
        self.state.lock().expect("lock").copy_log.clone()
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerEngine for MockEngine {
    fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn image_build(
        &self,
        _context_dir: &std::path::Path,
        _dockerfile_path: &str,
        tags: &[String],
        _build_args: &[(String, String)],
        _labels: &[(String, String)],
        _target: Option<&str>,
        _no_cache: bool,
        parser: Option<Box<dyn ccbox_core::command_stream::ProgressParser>>,
    ) -> Result<()> {
        self.state.lock().expect("lock").images.extend(tags.iter().cloned());
        if let Some(p) = parser {
            p.finish();
        }
        Ok(())
    }

    fn image_pull(&self, reference: &str) -> Result<()> {
        self.state.lock().expect("lock").images.push(reference.to_string());
        Ok(())
    }

    fn image_tag(&self, _src: &str, dst: &str) -> Result<()> {
        self.state.lock().expect("lock").images.push(dst.to_string());
        Ok(())
    }

    fn image_list(&self, name_filter: &str) -> Result<Vec<String>> {
        let prefix = name_filter.trim_end_matches('*');
        Ok(self
            .state
            .lock()
            .expect("lock")
            .images
            .iter()
            .filter(|i| i.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn image_inspect(&self, reference: &str) -> Result<Option<serde_json::Value>> {
        if self.state.lock().expect("lock").images.iter().any(|i| i == reference) {
            Ok(Some(serde_json::json!({ "Id": reference })))
        } else {
            Ok(None)
        }
    }

    fn image_remove(&self, reference: &str, _force: bool, _prune_children: bool) -> Result<()> {
        self.state.lock().expect("lock").images.retain(|i| i != reference);
        Ok(())
    }

    fn container_create(&self, spec: &ContainerSpec) -> Result<String> {
        let mut state = self.state.lock().expect("lock");
        state.next_id += 1;
        let id = format!("mock-{}", state.next_id);
        let summary = ContainerSummary {
            id: id.clone(),
            name: spec.name.clone(),
            image: spec.image.clone(),
            status: "Created".to_string(),
            labels: spec.labels.clone(),
        };
        state.containers.insert(id.clone(), summary);
        Ok(id)
    }

    fn container_start(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().expect("lock");
        let container = state
            .containers
            .get_mut(id)
            .ok_or_else(|| CcboxError::Internal(format!("no such mock container: {id}")))?;
        container.status = "Up".to_string();
        Ok(())
    }

    fn container_wait(&self, _id: &str) -> Result<i32> {
        Ok(*self.next_exit_code.lock().expect("lock"))
    }

    fn container_stop(&self, id: &str, _grace_secs: u32) -> Result<()> {
        let mut state = self.state.lock().expect("lock");
        if let Some(c) = state.containers.get_mut(id) {
            c.status = "Exited".to_string();
        }
        Ok(())
    }

    fn container_remove(&self, id: &str, _force: bool) -> Result<()> {
        self.state.lock().expect("lock").containers.remove(id);
        Ok(())
    }

    fn container_list(&self, all: bool, label_filter: &str) -> Result<Vec<ContainerSummary>> {
        let state = self.state.lock().expect("lock");
        Ok(state
            .containers
            .values()
            .filter(|c| all || c.status == "Up")
            .filter(|c| label_filter.is_empty() || c.labels.contains_key(label_filter.split('=').next().unwrap_or(label_filter)))
            .cloned()
            .collect())
    }

    fn container_inspect(&self, id: &str) -> Result<Option<serde_json::Value>> {
        Ok(self
            .state
            .lock()
            .expect("lock")
            .containers
            .get(id)
            .map(|c| serde_json::json!({ "Id": c.id, "Name": c.name })))
    }

    fn run_attached(&self, spec: &ContainerSpec) -> Result<i32> {
        let id = self.container_create(spec)?;
        self.container_start(&id)?;
        let code = self.container_wait(&id)?;
        self.container_remove(&id, true)?;
        Ok(code)
    }

    fn exec(&self, id: &str, cmd: &[String]) -> Result<ExecOutput> {
        self.state.lock().expect("lock").exec_log.push((id.to_string(), cmd.to_vec()));
        Ok(ExecOutput {
            stdout: String::new(),
            exit_code: 0,
        })
    }

    fn copy_to_container(&self, id: &str, dest_path: &str, _tar_bytes: &[u8]) -> Result<()> {
        self.state.lock().expect("lock").copy_log.push((id.to_string(), dest_path.to_string()));
        Ok(())
    }

    fn volumes_prune(&self) -> Result<()> {
        Ok(())
    }

    fn build_cache_prune(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LogOptions, NetworkMode, ResourceLimits};
    use std::collections::HashMap as Map;

    fn spec(name: &str) -> ContainerSpec {
        ContainerSpec {
            image: "ccbox_base:latest".to_string(),
            name: name.to_string(),
            binds: vec![],
            tmpfs: vec![],
            env: vec![],
            labels: Map::new(),
            cap_drop: vec![],
            cap_add: vec![],
            privileged: false,
            security_opts: vec![],
            limits: ResourceLimits::default(),
            network_mode: NetworkMode::Full,
            log_options: LogOptions::default(),
            working_dir: "/ccbox".to_string(),
            tty: false,
            stdin_open: false,
            entrypoint_args: vec![],
        }
    }

    #[test]
    fn create_then_start_marks_container_running() {
        let engine = MockEngine::new();
        let id = engine.container_create(&spec("ccbox_proj")).unwrap();
        engine.container_start(&id).unwrap();
        let listed = engine.container_list(true, "").unwrap();
        assert_eq!(listed[0].status, "Up");
    }

    #[test]
    fn run_attached_creates_starts_waits_and_removes() {
        let engine = MockEngine::new();
        engine.set_next_exit_code(137);
        let code = engine.run_attached(&spec("ccbox_proj")).unwrap();
        assert_eq!(code, 137);
        assert!(engine.container_list(true, "").unwrap().is_empty());
    }

    #[test]
    fn exec_calls_are_recorded() {
        let engine = MockEngine::new();
        let id = engine.container_create(&spec("ccbox_proj")).unwrap();
        engine.exec(&id, &["find".to_string(), "/ccbox".to_string()]).unwrap();
        assert_eq!(engine.exec_log().len(), 1);
    }
}
