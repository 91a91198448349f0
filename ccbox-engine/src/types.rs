//! Data model for the engine seam (§3): `ImageRef`, `ContainerSpec` (the
//! create-time config a `RunSpec` lowers into), and `ContainerSummary`
//! (the raw daemon-side view `containerList` returns).

use std::collections::HashMap;

/// `{stack, name}` or `{project, hash, name}` per §3; `name` is always the
/// fully-qualified `docker` reference, so callers never re-derive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub name: String,
}

impl ImageRef {
    /// `ccbox_<stack>:latest`.
    pub fn stack(stack: &str) -> Self {
        Self {
            name: format!("ccbox_{stack}:latest"),
        }
    }

    /// `ccbox_<sanitized-project>_<stack>_<deps-hash>:latest`.
    pub fn project(sanitized_project: &str, stack: &str, deps_hash: &str) -> Self {
        Self {
            name: format!("ccbox_{sanitized_project}_{stack}_{deps_hash}:latest"),
        }
    }

    /// The glob that matches every tag of this project's images
    /// regardless of hash, for cache-reuse lookups (§4.D) and for the
    /// name-prefix filter cleanup uses (§4.J).
    pub fn project_prefix(sanitized_project: &str, stack: &str) -> String {
        format!("ccbox_{sanitized_project}_{stack}_")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TmpfsMount {
    pub container_path: &'static str,
    pub size_bytes: u64,
    pub mode: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub host_path: String,
    pub container_path: String,
    pub read_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDriver {
    JsonFile,
    /// `--ephemeral-logs`: tmpfs-only sink, nothing survives a restart.
    Tmpfs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    pub driver: LogDriver,
    pub max_size_mb: u32,
    pub max_files: u32,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            driver: LogDriver::JsonFile,
            max_size_mb: 10,
            max_files: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkMode {
    /// Host default bridge, no egress restriction.
    Full,
    /// Entrypoint applies the isolated nftables/iptables ruleset.
    Isolated,
    /// Isolated, parameterised by a JSON file at this host path.
    IsolatedWithRuleset(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLimits {
    pub pids: Option<u32>,
    pub memory: Option<String>,
    pub cpus: Option<String>,
}

/// The fully-resolved container invocation a [`ContainerEngine`] can act
/// on — what the run assembler's `RunSpec` (§4.F) lowers into at the
/// engine boundary. Constructed once per run, immutable thereafter.
///
/// [`ContainerEngine`]: crate::engine::ContainerEngine
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub image: String,
    pub name: String,
    pub binds: Vec<BindMount>,
    pub tmpfs: Vec<TmpfsMount>,
    pub env: Vec<(String, String)>,
    pub labels: HashMap<String, String>,
    pub cap_drop: Vec<String>,
    pub cap_add: Vec<String>,
    pub privileged: bool,
    pub security_opts: Vec<String>,
    pub limits: ResourceLimits,
    pub network_mode: NetworkMode,
    pub log_options: LogOptions,
    pub working_dir: String,
    pub tty: bool,
    pub stdin_open: bool,
    pub entrypoint_args: Vec<String>,
}

/// Raw `docker ps`-shaped row; the session/bridge layers enrich this into
/// the spec's `ContainerInfo` by adding health and session data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: String,
    pub labels: HashMap<String, String>,
}
