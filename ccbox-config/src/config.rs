//! `CcboxConfig`: the merged configuration schema from §6, every field
//! optional so three layers (global, project, CLI overrides) can be
//! merged by last-write-wins per field.

use ccbox_detector::Stack;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How the build orchestrator should install project dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepsMode {
    All,
    Prod,
    Skip,
}

/// The run assembler's network policy (§4.F).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkPolicy {
    Full,
    Isolated,
    /// A path to a JSON file parameterising the isolated ruleset.
    Path(String),
}

/// Build/attach progress rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    Auto,
    Plain,
    Tty,
}

/// The merged configuration schema (§6). `#[serde(flatten)]` keeps
/// forward-compatibility with keys this version doesn't know about,
/// mirroring the teacher's `VmConfig` shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CcboxConfig {
    pub stack: Option<Stack>,
    pub deps: Option<DepsMode>,
    #[serde(rename = "zeroResidue")]
    pub zero_residue: Option<bool>,
    #[serde(rename = "networkPolicy")]
    pub network_policy: Option<NetworkPolicy>,
    pub memory: Option<String>,
    pub cpus: Option<String>,
    pub progress: Option<ProgressMode>,
    pub cache: Option<bool>,
    pub prune: Option<bool>,
    pub fresh: Option<bool>,
    pub headless: Option<bool>,
    pub unrestricted: Option<bool>,
    #[serde(rename = "readOnly")]
    pub read_only: Option<bool>,
    pub debug: Option<bool>,
    #[serde(default)]
    pub env: IndexMap<String, String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml_ng::Value>,
}

impl CcboxConfig {
    /// Any of `--attach-mode | --no-bridge | --build | --headless`
    /// disables bridge mode (§9 open question — observed behaviour
    /// preserved across both variants of the source).
    pub fn bridge_disabled(&self) -> bool {
        self.headless.unwrap_or(false)
    }
}
