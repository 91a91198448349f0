//! `ProjectIdentity` (§3): the host path plus its display and
//! container/image-safe names.

use ccbox_pathmap::{normalize_directory_name, sanitize_identifier};
use std::path::Path;

/// A project's identity as derived from its host-absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdentity {
    pub absolute_host_path: String,
    pub display_name: String,
    pub sanitized_name: String,
}

impl ProjectIdentity {
    pub fn from_path(path: &Path) -> Self {
        let absolute_host_path = path.to_string_lossy().into_owned();
        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let display_name = normalize_directory_name(&basename);
        let sanitized_name = sanitize_identifier(&display_name, 50);

        ProjectIdentity {
            absolute_host_path,
            display_name,
            sanitized_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_display_and_sanitized_names_from_basename() {
        let identity = ProjectIdentity::from_path(Path::new("/home/user/My Cool Project!"));
        assert_eq!(identity.display_name, "My Cool Project!");
        assert_eq!(identity.sanitized_name, "my-cool-project");
    }

    #[test]
    fn empty_basename_falls_back_to_project() {
        let identity = ProjectIdentity::from_path(Path::new("/"));
        assert_eq!(identity.sanitized_name, "project");
    }
}
