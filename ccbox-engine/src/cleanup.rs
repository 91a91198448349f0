//! Cleanup & pruning (§4.J), grounded in the teacher's `vm clean` command:
//! phases run sequentially and collect errors instead of aborting on the
//! first failure, so one stuck container doesn't block image removal.

use crate::engine::ContainerEngine;

/// Errors collected across every phase; callers decide how to surface
/// these (the binary crate prints one line per entry and a summary).
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub errors: Vec<String>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// `removeAll(deep)`: stop and remove every `ccbox`-labelled container,
/// remove every `ccbox_*` image, and — when `deep` — prune volumes and
/// the whole build cache too.
pub fn remove_all(engine: &dyn ContainerEngine, label_filter: &str, deep: bool) -> CleanupReport {
    let mut report = CleanupReport::default();

    let containers = match engine.container_list(true, label_filter) {
        Ok(c) => c,
        Err(e) => {
            report.errors.push(format!("listing containers: {e}"));
            Vec::new()
        }
    };
    for container in &containers {
        if container.status.starts_with("Up") {
            if let Err(e) = engine.container_stop(&container.id, 10) {
                report.errors.push(format!("stopping {}: {e}", container.name));
            }
        }
    }
    for container in &containers {
        if let Err(e) = engine.container_remove(&container.id, true) {
            report.errors.push(format!("removing container {}: {e}", container.name));
        }
    }

    let images = match engine.image_list("ccbox_*") {
        Ok(i) => i,
        Err(e) => {
            report.errors.push(format!("listing images: {e}"));
            Vec::new()
        }
    };
    for image in &images {
        if let Err(e) = engine.image_remove(image, true, true) {
            report.errors.push(format!("removing image {image}: {e}"));
        }
    }

    if deep {
        if let Err(e) = engine.volumes_prune() {
            report.errors.push(format!("pruning volumes: {e}"));
        }
        if let Err(e) = engine.build_cache_prune() {
            report.errors.push(format!("pruning build cache: {e}"));
        }
    }

    report
}

/// `pruneStale`: removes non-running containers and images not held by
/// any running container. Lighter than [`remove_all`] — typically run
/// before a new launch unless the caller opts out.
pub fn prune_stale(engine: &dyn ContainerEngine, label_filter: &str) -> CleanupReport {
    let mut report = CleanupReport::default();

    let all = match engine.container_list(true, label_filter) {
        Ok(c) => c,
        Err(e) => {
            report.errors.push(format!("listing containers: {e}"));
            return report;
        }
    };
    let running_images: std::collections::HashSet<String> = all
        .iter()
        .filter(|c| c.status.starts_with("Up"))
        .map(|c| c.image.clone())
        .collect();

    for container in all.iter().filter(|c| !c.status.starts_with("Up")) {
        if let Err(e) = engine.container_remove(&container.id, true) {
            report.errors.push(format!("removing stale container {}: {e}", container.name));
        }
    }

    let images = match engine.image_list("ccbox_*") {
        Ok(i) => i,
        Err(e) => {
            report.errors.push(format!("listing images: {e}"));
            return report;
        }
    };
    for image in images.iter().filter(|i| !running_images.contains(*i)) {
        let _ = engine.image_remove(image, false, true);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEngine;
    use crate::types::{ContainerSpec, LogOptions, NetworkMode, ResourceLimits};
    use std::collections::HashMap;

    fn spec(name: &str) -> ContainerSpec {
        ContainerSpec {
            image: "ccbox_base:latest".to_string(),
            name: name.to_string(),
            binds: vec![],
            tmpfs: vec![],
            env: vec![],
            labels: HashMap::new(),
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
    fn remove_all_stops_and_removes_running_containers() {
        let engine = MockEngine::new();
        let id = engine.container_create(&spec("ccbox_proj")).unwrap();
        engine.container_start(&id).unwrap();

        let report = remove_all(&engine, "", false);
        assert!(report.is_clean());
        assert!(engine.container_list(true, "").unwrap().is_empty());
    }

    #[test]
    fn remove_all_collects_errors_without_aborting() {
        struct FailingEngine(MockEngine);
        impl ContainerEngine for FailingEngine {
            fn ping(&self) -> ccbox_core::error::Result<()> {
                self.0.ping()
            }
            fn image_build(
                &self,
                a: &std::path::Path,
                b: &str,
                c: &[String],
                d: &[(String, String)],
                g: &[(String, String)],
                h: Option<&str>,
                e: bool,
                f: Option<Box<dyn ccbox_core::command_stream::ProgressParser>>,
            ) -> ccbox_core::error::Result<()> {
                self.0.image_build(a, b, c, d, g, h, e, f)
            }
            fn image_pull(&self, r: &str) -> ccbox_core::error::Result<()> {
                self.0.image_pull(r)
            }
            fn image_tag(&self, s: &str, d: &str) -> ccbox_core::error::Result<()> {
                self.0.image_tag(s, d)
            }
            fn image_list(&self, f: &str) -> ccbox_core::error::Result<Vec<String>> {
                self.0.image_list(f)
            }
            fn image_inspect(&self, r: &str) -> ccbox_core::error::Result<Option<serde_json::Value>> {
                self.0.image_inspect(r)
            }
            fn image_remove(&self, reference: &str, _force: bool, _prune_children: bool) -> ccbox_core::error::Result<()> {
                Err(ccbox_core::error::CcboxError::Internal(format!("cannot remove {reference}")))
            }
            fn container_create(&self, spec: &ContainerSpec) -> ccbox_core::error::Result<String> {
                self.0.container_create(spec)
            }
            fn container_start(&self, id: &str) -> ccbox_core::error::Result<()> {
                self.0.container_start(id)
            }
            fn container_wait(&self, id: &str) -> ccbox_core::error::Result<i32> {
                self.0.container_wait(id)
            }
            fn container_stop(&self, id: &str, g: u32) -> ccbox_core::error::Result<()> {
                self.0.container_stop(id, g)
            }
            fn container_remove(&self, id: &str, f: bool) -> ccbox_core::error::Result<()> {
                self.0.container_remove(id, f)
            }
            fn container_list(&self, all: bool, lf: &str) -> ccbox_core::error::Result<Vec<ContainerSummary>> {
                self.0.container_list(all, lf)
            }
            fn container_inspect(&self, id: &str) -> ccbox_core::error::Result<Option<serde_json::Value>> {
                self.0.container_inspect(id)
            }
            fn run_attached(&self, spec: &ContainerSpec) -> ccbox_core::error::Result<i32> {
                self.0.run_attached(spec)
            }
            fn exec(&self, id: &str, cmd: &[String]) -> ccbox_core::error::Result<crate::engine::ExecOutput> {
                self.0.exec(id, cmd)
            }
            fn copy_to_container(&self, id: &str, d: &str, t: &[u8]) -> ccbox_core::error::Result<()> {
                self.0.copy_to_container(id, d, t)
            }
            fn volumes_prune(&self) -> ccbox_core::error::Result<()> {
                self.0.volumes_prune()
            }
            fn build_cache_prune(&self) -> ccbox_core::error::Result<()> {
                self.0.build_cache_prune()
            }
        }

        use crate::types::ContainerSummary;
        let inner = MockEngine::new();
        inner.image_pull("ccbox_proj_python_abc:latest").unwrap();
        let engine = FailingEngine(inner);

        let report = remove_all(&engine, "", false);
        assert!(!report.is_clean());
        assert!(report.errors[0].contains("cannot remove"));
    }
}
