//! The `ContainerEngine` trait (§4.E): method names paraphrase the
//! engine's own HTTP API, but the only implementation in this crate talks
//! to it through the `docker` CLI, mirroring the teacher's
//! command-shelling providers rather than a daemon-socket client.

use crate::types::{ContainerSpec, ContainerSummary};
use ccbox_core::command_stream::ProgressParser;
use ccbox_core::error::Result;

/// Output of `containerExecCreate`/`Attach`/`Inspect` collapsed into one
/// call, since every caller here (session discovery, bridge input) wants
/// the combined result rather than the three-call dance.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub stdout: String,
    pub exit_code: i32,
}

pub trait ContainerEngine: Send + Sync {
    /// Health check; `Err` means the daemon isn't reachable.
    fn ping(&self) -> Result<()>;

    /// Builds `dockerfile_path` (relative to `context_dir`) with `tags`,
    /// streaming progress through `parser` if given. `labels` are stamped
    /// onto the built image; `target` selects a build stage in a
    /// multi-stage Dockerfile. BuildKit is always enabled (§6) and is not
    /// a parameter here.
    fn image_build(
        &self,
        context_dir: &std::path::Path,
        dockerfile_path: &str,
        tags: &[String],
        build_args: &[(String, String)],
        labels: &[(String, String)],
        target: Option<&str>,
        no_cache: bool,
        parser: Option<Box<dyn ProgressParser>>,
    ) -> Result<()>;

    fn image_pull(&self, reference: &str) -> Result<()>;
    fn image_tag(&self, src: &str, dst: &str) -> Result<()>;

    /// Image references matching `name_filter` (a `docker images` name
    /// pattern, e.g. `ccbox_myproj_python_*`).
    fn image_list(&self, name_filter: &str) -> Result<Vec<String>>;
    fn image_inspect(&self, reference: &str) -> Result<Option<serde_json::Value>>;
    fn image_remove(&self, reference: &str, force: bool, prune_children: bool) -> Result<()>;

    fn container_create(&self, spec: &ContainerSpec) -> Result<String>;
    fn container_start(&self, id: &str) -> Result<()>;
    fn container_wait(&self, id: &str) -> Result<i32>;
    fn container_stop(&self, id: &str, grace_secs: u32) -> Result<()>;
    fn container_remove(&self, id: &str, force: bool) -> Result<()>;
    fn container_list(&self, all: bool, label_filter: &str) -> Result<Vec<ContainerSummary>>;
    fn container_inspect(&self, id: &str) -> Result<Option<serde_json::Value>>;

    /// `runAttached(spec)` (§4.F contract): create, attach before start
    /// (so no early output is lost), start, stream stdio, wait. Returns
    /// the raw exit code — callers interpret it with
    /// [`crate::exit_code::interpret_exit_code`].
    fn run_attached(&self, spec: &ContainerSpec) -> Result<i32>;

    /// Runs `cmd` inside a live container and collects its output; used
    /// by session discovery and bridge input pushes.
    fn exec(&self, id: &str, cmd: &[String]) -> Result<ExecOutput>;

    /// Pushes a tar archive's bytes into the container at `dest_path`.
    fn copy_to_container(&self, id: &str, dest_path: &str, tar_bytes: &[u8]) -> Result<()>;

    fn volumes_prune(&self) -> Result<()>;
    fn build_cache_prune(&self) -> Result<()>;
}
