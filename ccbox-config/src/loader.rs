//! File discovery and load-then-merge. Argument parsing (the part that
//! turns CLI flags into a `CcboxConfig` overlay) is out of scope; this
//! loader only knows how to find and parse the two YAML layers and merge
//! them with a caller-supplied overrides layer.

use crate::config::CcboxConfig;
use crate::merge::merge;
use crate::paths::{global_config_path, project_config_path};
use ccbox_core::error::Result;
use std::path::Path;

/// Loads and merges the global config, the project config, and a
/// caller-supplied CLI-overrides layer, in that precedence order.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `~/.ccbox/config.yaml` if present; returns the default
    /// (all-`None`) config otherwise.
    pub fn load_global() -> Result<CcboxConfig> {
        match global_config_path() {
            Some(path) if path.is_file() => load_file(&path),
            _ => Ok(CcboxConfig::default()),
        }
    }

    /// Reads `<project_dir>/.ccbox.yaml` if present; returns the default
    /// config otherwise.
    pub fn load_project(project_dir: &Path) -> Result<CcboxConfig> {
        let path = project_config_path(project_dir);
        if path.is_file() {
            load_file(&path)
        } else {
            Ok(CcboxConfig::default())
        }
    }

    /// Loads and merges `global.then(project).then(cli_overrides)`.
    pub fn load(project_dir: &Path, cli_overrides: CcboxConfig) -> Result<CcboxConfig> {
        let global = Self::load_global()?;
        let project = Self::load_project(project_dir)?;
        Ok(merge(global, project, cli_overrides))
    }
}

fn load_file(path: &Path) -> Result<CcboxConfig> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml_ng::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_project_file_yields_default_config() {
        let dir = tempdir().unwrap();
        let cfg = ConfigLoader::load_project(dir.path()).unwrap();
        assert!(cfg.stack.is_none());
    }

    #[test]
    fn load_project_parses_present_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".ccbox.yaml"), "stack: rust\n").unwrap();
        let cfg = ConfigLoader::load_project(dir.path()).unwrap();
        assert_eq!(cfg.stack, Some(ccbox_detector::Stack::Rust));
    }
}
