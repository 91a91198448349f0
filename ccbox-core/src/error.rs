//! Error taxonomy shared by every `ccbox` crate.

pub use anyhow::bail;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// Errors surfaced by the detection, build, run, and bridge pipelines.
///
/// Every variant maps to one of the kinds in the error handling design:
/// daemon availability/timeout, path validity, build failure, missing
/// input devices, and passthrough of the assistant process's own exit
/// status.
#[derive(Error, Debug)]
pub enum CcboxError {
    /// The container engine's daemon/socket could not be reached at all.
    DaemonUnavailable(String),

    /// The daemon was reached but a specific command it ran failed.
    DaemonCommandFailed { command: String, stderr: String },

    /// A call to the daemon exceeded its deadline.
    DaemonTimeout { command: String, seconds: u64 },

    /// A host or container path failed validation (traversal, NUL byte,
    /// not under any configured mount, etc).
    PathInvalid(String),

    /// The multi-stage image build failed; `stage` names which of
    /// base/stack/project failed.
    BuildFailed { stage: String, reason: String },

    /// A requested input device (clipboard, microphone) has no backing
    /// tool on this host/platform.
    InputUnavailable(String),

    /// The assistant process inside the container exited; its exit code
    /// is passed through unchanged, not treated as a ccbox failure.
    ContainerExit(i32),

    Config(String),
    Command(String),
    Dependency(String),
    Network(String),
    Internal(String),
    Filesystem(String),
    Serialization(String),

    Io(#[from] std::io::Error),
    Other(#[from] anyhow::Error),
}

impl Display for CcboxError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            CcboxError::DaemonUnavailable(s) => {
                write!(f, "Container engine is not reachable: {s}\n\n")?;
                write!(f, "Fix:\n")?;
                write!(f, "  • Start Docker Desktop, or\n")?;
                write!(f, "  • Run: sudo systemctl start docker\n")?;
                write!(f, "  • Verify: docker ps")
            }
            CcboxError::DaemonCommandFailed { command, stderr } => {
                write!(f, "`{command}` failed:\n{stderr}")
            }
            CcboxError::DaemonTimeout { command, seconds } => {
                write!(f, "`{command}` timed out after {seconds}s")
            }
            CcboxError::PathInvalid(s) => write!(f, "Invalid path: {s}"),
            CcboxError::BuildFailed { stage, reason } => {
                write!(f, "Image build failed at the {stage} stage\n\n")?;
                write!(f, "Reason: {reason}\n\n")?;
                write!(f, "Fix:\n")?;
                write!(f, "  • Re-run with --fresh to discard cached layers, or\n")?;
                write!(f, "  • Inspect the failing Dockerfile stage directly")
            }
            CcboxError::InputUnavailable(s) => write!(f, "Input device unavailable: {s}"),
            CcboxError::ContainerExit(code) => write!(f, "container exited with status {code}"),
            CcboxError::Config(s) => write!(f, "Configuration error: {s}"),
            CcboxError::Command(s) => write!(f, "Command failed: {s}"),
            CcboxError::Dependency(s) => write!(f, "Dependency not found: {s}"),
            CcboxError::Network(s) => write!(f, "Network error: {s}"),
            CcboxError::Internal(s) => write!(f, "Internal error: {s}"),
            CcboxError::Filesystem(s) => write!(f, "Filesystem error: {s}"),
            CcboxError::Serialization(s) => write!(f, "Serialization error: {s}"),
            CcboxError::Io(e) => write!(f, "I/O error: {e}"),
            CcboxError::Other(e) => write!(f, "{e}"),
        }
    }
}

impl From<serde_yaml_ng::Error> for CcboxError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        CcboxError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for CcboxError {
    fn from(err: serde_json::Error) -> Self {
        CcboxError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CcboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daemon_unavailable_includes_fix_hint() {
        let err = CcboxError::DaemonUnavailable("connection refused".into());
        let rendered = err.to_string();
        assert!(rendered.contains("Fix:"));
        assert!(rendered.contains("docker ps"));
    }

    #[test]
    fn container_exit_is_not_worded_as_a_failure() {
        let err = CcboxError::ContainerExit(130);
        assert_eq!(err.to_string(), "container exited with status 130");
    }
}
