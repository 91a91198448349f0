//! Host↔container path translation: the pure, filesystem-free half of the
//! FUSE-backed overlay that keeps the assistant's host-absolute-path
//! persistence format valid when the container's path form differs from
//! the host's (the Windows/WSL case).
//!
//! Every function here is a pure string transform except the two
//! `validate_project_path`/`normalize_directory_name` helpers, which are
//! documented as touching the filesystem (a single `stat`) or not.

mod dirmap;
mod pathmap;
mod sanitize;
mod transform;

pub use dirmap::encode_project_dir;
pub use pathmap::{PathMap, PathMapEntry};
pub use sanitize::{normalize_directory_name, sanitize_identifier};
pub use transform::{
    canonicalize, container_to_host, detect_form, host_to_container, host_to_docker_mount_form,
    validate_path, HostPathOrigin, PathForm,
};

use ccbox_core::error::{CcboxError, Result};
use std::path::Path;

/// Validates a project directory: the resolved absolute path must exist,
/// be a directory, and not be a symlink, in addition to passing the plain
/// string validation in [`validate_path`].
pub fn validate_project_path(raw: &str) -> Result<()> {
    validate_path(raw)?;

    let path = Path::new(raw);
    let meta = std::fs::symlink_metadata(path)
        .map_err(|e| CcboxError::PathInvalid(format!("{raw}: {e}")))?;

    if meta.file_type().is_symlink() {
        return Err(CcboxError::PathInvalid(format!(
            "{raw}: project path must not be a symlink"
        )));
    }
    if !meta.is_dir() {
        return Err(CcboxError::PathInvalid(format!(
            "{raw}: project path must be a directory"
        )));
    }
    Ok(())
}
