//! Package-manager detection: an independent pass over the project root
//! that emits install commands, separate from the language/stack scoring
//! pipeline (§4.C "Dependency detection").

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How install commands should be derived for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    All,
    Prod,
    Skip,
}

/// A statically known package manager and how to drive it.
#[derive(Debug, Clone)]
pub struct PackageManager {
    pub name: &'static str,
    pub install_all: &'static str,
    pub install_prod: &'static str,
    pub has_dev: bool,
    pub priority: i32,
}

/// One detected instance of a [`PackageManager`] in a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepsInfo {
    pub name: String,
    pub files: Vec<String>,
    pub install_all: String,
    pub install_prod: String,
    pub has_dev: bool,
    pub priority: i32,
}

impl DepsInfo {
    /// Derives the install command for the given mode. "skip" yields no
    /// command at all.
    pub fn install_command(&self, mode: InstallMode) -> Option<&str> {
        match mode {
            InstallMode::All => Some(&self.install_all),
            InstallMode::Prod => Some(&self.install_prod),
            InstallMode::Skip => None,
        }
    }
}

static MANAGERS: Lazy<Vec<PackageManager>> = Lazy::new(|| {
    vec![
        PackageManager {
            name: "bun",
            install_all: "bun install",
            install_prod: "bun install --production",
            has_dev: true,
            priority: 100,
        },
        PackageManager {
            name: "pnpm",
            install_all: "pnpm install",
            install_prod: "pnpm install --prod",
            has_dev: true,
            priority: 95,
        },
        PackageManager {
            name: "yarn",
            install_all: "yarn install",
            install_prod: "yarn install --production",
            has_dev: true,
            priority: 90,
        },
        PackageManager {
            name: "npm",
            install_all: "npm install",
            install_prod: "npm install --omit=dev",
            has_dev: true,
            priority: 80,
        },
        PackageManager {
            name: "cargo",
            install_all: "cargo fetch",
            install_prod: "cargo fetch",
            has_dev: false,
            priority: 90,
        },
        PackageManager {
            name: "go",
            install_all: "go mod download",
            install_prod: "go mod download",
            has_dev: false,
            priority: 90,
        },
        PackageManager {
            name: "poetry",
            install_all: "poetry install",
            install_prod: "poetry install --only main",
            has_dev: true,
            priority: 90,
        },
        PackageManager {
            name: "pdm",
            install_all: "pdm install",
            install_prod: "pdm install --prod",
            has_dev: true,
            priority: 85,
        },
        PackageManager {
            name: "uv",
            install_all: "uv sync",
            install_prod: "uv sync --no-dev",
            has_dev: true,
            priority: 85,
        },
        PackageManager {
            name: "pip",
            install_all: "pip install -r requirements.txt",
            install_prod: "pip install -r requirements.txt",
            has_dev: true,
            priority: 50,
        },
        PackageManager {
            name: "maven",
            install_all: "mvn install",
            install_prod: "mvn install -DskipTests",
            has_dev: false,
            priority: 90,
        },
        PackageManager {
            name: "gradle",
            install_all: "gradle build",
            install_prod: "gradle build -x test",
            has_dev: false,
            priority: 85,
        },
        PackageManager {
            name: "composer",
            install_all: "composer install",
            install_prod: "composer install --no-dev",
            has_dev: true,
            priority: 90,
        },
        PackageManager {
            name: "bundler",
            install_all: "bundle install",
            install_prod: "bundle install --without development test",
            has_dev: true,
            priority: 90,
        },
        PackageManager {
            name: "dotnet",
            install_all: "dotnet restore",
            install_prod: "dotnet restore",
            has_dev: false,
            priority: 90,
        },
    ]
});

fn file_exists(dir: &Path, name: &str) -> bool {
    dir.join(name).exists()
}

fn glob_exists(dir: &Path, suffix: &str) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries.flatten().any(|e| {
                e.file_name()
                    .to_string_lossy()
                    .ends_with(suffix)
            })
        })
        .unwrap_or(false)
}

/// Yarn berry (2+) lockfiles open with a `__metadata:` block; classic
/// lockfiles don't.
fn yarn_is_berry(dir: &Path) -> bool {
    fs::read_to_string(dir.join("yarn.lock"))
        .map(|content| content.contains("__metadata"))
        .unwrap_or(false)
}

fn manager(name: &str) -> PackageManager {
    MANAGERS.iter().find(|m| m.name == name).unwrap().clone()
}

fn detect_one(dir: &Path, name: &str) -> Option<DepsInfo> {
    let m = manager(name);
    let files: Vec<String> = match name {
        "bun" => {
            let bunfig = file_exists(dir, "bunfig.toml");
            let pm_field = fs::read_to_string(dir.join("package.json"))
                .ok()
                .and_then(|c| serde_json::from_str::<serde_json::Value>(&c).ok())
                .and_then(|j| j.get("packageManager")?.as_str().map(|s| s.starts_with("bun@")))
                .unwrap_or(false);
            if !bunfig && !pm_field {
                return None;
            }
            let mut f = Vec::new();
            if bunfig {
                f.push("bunfig.toml".to_string());
            }
            if pm_field {
                f.push("package.json".to_string());
            }
            f
        }
        "pnpm" => {
            if !file_exists(dir, "pnpm-lock.yaml") {
                return None;
            }
            vec!["pnpm-lock.yaml".to_string()]
        }
        "yarn" => {
            if !file_exists(dir, "yarn.lock") {
                return None;
            }
            let install_all = if yarn_is_berry(dir) {
                "yarn install"
            } else {
                "yarn install --frozen-lockfile"
            };
            return Some(DepsInfo {
                name: "yarn".to_string(),
                files: vec!["yarn.lock".to_string()],
                install_all: install_all.to_string(),
                install_prod: m.install_prod.to_string(),
                has_dev: m.has_dev,
                priority: m.priority,
            });
        }
        "npm" => {
            // Resolved only if no other JS lockfile already claimed node.
            if file_exists(dir, "pnpm-lock.yaml")
                || file_exists(dir, "yarn.lock")
                || file_exists(dir, "bunfig.toml")
            {
                return None;
            }
            if !file_exists(dir, "package.json") {
                return None;
            }
            let mut f = vec!["package.json".to_string()];
            if file_exists(dir, "package-lock.json") {
                f.push("package-lock.json".to_string());
            }
            f
        }
        "cargo" => {
            if !file_exists(dir, "Cargo.toml") {
                return None;
            }
            vec!["Cargo.toml".to_string()]
        }
        "go" => {
            if !file_exists(dir, "go.mod") {
                return None;
            }
            vec!["go.mod".to_string()]
        }
        "poetry" => {
            if !file_exists(dir, "poetry.lock") {
                return None;
            }
            vec!["poetry.lock".to_string()]
        }
        "pdm" => {
            if !file_exists(dir, "pdm.lock") {
                return None;
            }
            vec!["pdm.lock".to_string()]
        }
        "uv" => {
            if !file_exists(dir, "uv.lock") {
                return None;
            }
            vec!["uv.lock".to_string()]
        }
        "pip" => {
            // Merges requirements*.txt, or accepts pyproject.toml only if
            // no higher-priority Python manager already matched.
            let has_req = file_exists(dir, "requirements.txt");
            let has_pyproject = file_exists(dir, "pyproject.toml")
                && !file_exists(dir, "poetry.lock")
                && !file_exists(dir, "pdm.lock")
                && !file_exists(dir, "uv.lock");
            if !has_req && !has_pyproject {
                return None;
            }
            let mut f = Vec::new();
            if has_req {
                f.push("requirements.txt".to_string());
                for variant in ["requirements-dev.txt", "requirements-test.txt"] {
                    if file_exists(dir, variant) {
                        f.push(variant.to_string());
                    }
                }
            }
            if has_pyproject {
                f.push("pyproject.toml".to_string());
            }
            f
        }
        "maven" => {
            if !file_exists(dir, "pom.xml") {
                return None;
            }
            vec!["pom.xml".to_string()]
        }
        "gradle" => {
            if !file_exists(dir, "build.gradle") && !file_exists(dir, "build.gradle.kts") {
                return None;
            }
            let mut f = Vec::new();
            if file_exists(dir, "build.gradle") {
                f.push("build.gradle".to_string());
            }
            if file_exists(dir, "build.gradle.kts") {
                f.push("build.gradle.kts".to_string());
            }
            f
        }
        "composer" => {
            if !file_exists(dir, "composer.json") {
                return None;
            }
            vec!["composer.json".to_string()]
        }
        "bundler" => {
            if !file_exists(dir, "Gemfile") {
                return None;
            }
            vec!["Gemfile".to_string()]
        }
        "dotnet" => {
            if !glob_exists(dir, ".csproj") && !glob_exists(dir, ".sln") {
                return None;
            }
            vec![]
        }
        _ => return None,
    };

    Some(DepsInfo {
        name: m.name.to_string(),
        files,
        install_all: m.install_all.to_string(),
        install_prod: m.install_prod.to_string(),
        has_dev: m.has_dev,
        priority: m.priority,
    })
}

/// Detects every package manager present in `dir`, one [`DepsInfo`] per
/// manager, sorted descending by priority.
pub fn detect_dependencies(dir: &Path) -> Vec<DepsInfo> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let mut found: Vec<DepsInfo> = MANAGERS
        .iter()
        .filter_map(|m| detect_one(dir, m.name))
        .collect();
    found.sort_by(|a, b| b.priority.cmp(&a.priority));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) {
        let mut f = File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn npm_only_resolves_without_other_lockfiles() {
        let dir = tempdir().unwrap();
        write(dir.path(), "package.json", "{}");
        write(dir.path(), "package-lock.json", "{}");
        let deps = detect_dependencies(dir.path());
        assert!(deps.iter().any(|d| d.name == "npm"));
    }

    #[test]
    fn pnpm_lockfile_suppresses_npm() {
        let dir = tempdir().unwrap();
        write(dir.path(), "package.json", "{}");
        write(dir.path(), "pnpm-lock.yaml", "lockfileVersion: 6");
        let deps = detect_dependencies(dir.path());
        assert!(deps.iter().any(|d| d.name == "pnpm"));
        assert!(!deps.iter().any(|d| d.name == "npm"));
    }

    #[test]
    fn requirements_and_dev_variant_merge_into_one_pip_entry() {
        let dir = tempdir().unwrap();
        write(dir.path(), "requirements.txt", "flask\n");
        write(dir.path(), "requirements-dev.txt", "pytest\n");
        let deps = detect_dependencies(dir.path());
        let pip = deps.iter().find(|d| d.name == "pip").unwrap();
        assert_eq!(pip.files.len(), 2);
    }

    #[test]
    fn pyproject_only_used_when_no_lockfile_manager_present() {
        let dir = tempdir().unwrap();
        write(dir.path(), "pyproject.toml", "[project]\nname=\"x\"");
        write(dir.path(), "poetry.lock", "");
        let deps = detect_dependencies(dir.path());
        assert!(deps.iter().any(|d| d.name == "poetry"));
        let pip = deps.iter().find(|d| d.name == "pip");
        assert!(pip.is_none());
    }

    #[test]
    fn sorted_descending_by_priority() {
        let dir = tempdir().unwrap();
        write(dir.path(), "Cargo.toml", "[package]\nname=\"x\"");
        write(dir.path(), "requirements.txt", "flask\n");
        let deps = detect_dependencies(dir.path());
        for pair in deps.windows(2) {
            assert!(pair[0].priority >= pair[1].priority);
        }
    }

    #[test]
    fn install_mode_skip_yields_no_command() {
        let d = DepsInfo {
            name: "npm".into(),
            files: vec![],
            install_all: "npm install".into(),
            install_prod: "npm install --omit=dev".into(),
            has_dev: true,
            priority: 80,
        };
        assert_eq!(d.install_command(InstallMode::Skip), None);
        assert_eq!(d.install_command(InstallMode::All), Some("npm install"));
    }
}
