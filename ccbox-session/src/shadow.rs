//! Shadow-directory merge planning and application (§4.G): when a FUSE
//! daemon restart leaves two sibling session directories for the same
//! logical project (one under the literal encoded-path the assistant used
//! pre-translation, one under the container's native encoding),
//! `CCBOX_DIR_MAP` lists `<container-name>:<native-name>` pairs so the
//! caller can fold the stale directory into the native one. Planning
//! (`plan_merge`) stays a pure function of its inputs and is easy to
//! test; [`apply_dir_map`] is the side-effecting half that execs
//! `find`/`mv`/`rm`/`rmdir` inside the running container to carry the
//! plan out, mirroring `discover_sessions`'s single-`exec`-per-listing
//! style.

/// One pair from `CCBOX_DIR_MAP`'s wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirMapPair {
    pub container_name: String,
    pub native_name: String,
}

/// Parses `CCBOX_DIR_MAP`'s `<container>:<native>;<container>:<native>;…`
/// wire format.
pub fn parse_dir_map(raw: &str) -> Vec<DirMapPair> {
    raw.split(';')
        .filter(|s| !s.is_empty())
        .filter_map(|pair| {
            let (container_name, native_name) = pair.split_once(':')?;
            Some(DirMapPair {
                container_name: container_name.to_string(),
                native_name: native_name.to_string(),
            })
        })
        .collect()
}

/// One planned filesystem action: move a single `.jsonl` file, or
/// remove a directory once it's been drained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShadowAction {
    MoveFile { from: String, to: String },
    RemoveStaleIndex { path: String },
    RemoveEmptyDir { path: String },
}

/// Builds the merge plan for one `(container_name, native_name)` pair
/// given the filenames currently present in the container-named shadow
/// directory and the native one. Filename collisions are skipped (the
/// native copy wins, per §4.G), and both stale `.claude-index`-style
/// files plus the now-emptied shadow directory are queued for removal.
pub fn plan_merge(
    pair: &DirMapPair,
    shadow_files: &[String],
    native_files: &[String],
    stale_index_files: &[String],
) -> Vec<ShadowAction> {
    let mut actions = Vec::new();

    for file in shadow_files {
        if native_files.contains(file) {
            continue;
        }
        actions.push(ShadowAction::MoveFile {
            from: format!("{}/{file}", pair.container_name),
            to: format!("{}/{file}", pair.native_name),
        });
    }

    for index_file in stale_index_files {
        actions.push(ShadowAction::RemoveStaleIndex {
            path: index_file.clone(),
        });
    }

    actions.push(ShadowAction::RemoveEmptyDir {
        path: pair.container_name.clone(),
    });

    actions
}

const SESSIONS_ROOT: &str = "/ccbox/.claude/projects";

fn list_jsonl_basenames(
    engine: &dyn ccbox_engine::engine::ContainerEngine,
    container_id: &str,
    dir_name: &str,
) -> ccbox_core::error::Result<Vec<String>> {
    let output = engine.exec(
        container_id,
        &[
            "sh".to_string(),
            "-c".to_string(),
            format!(
                "cd {SESSIONS_ROOT}/{dir_name} 2>/dev/null && ls -1 -- *.jsonl 2>/dev/null || true"
            ),
        ],
    )?;
    Ok(output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

fn list_stale_index_files(
    engine: &dyn ccbox_engine::engine::ContainerEngine,
    container_id: &str,
    dir_name: &str,
) -> ccbox_core::error::Result<Vec<String>> {
    let output = engine.exec(
        container_id,
        &[
            "find".to_string(),
            format!("{SESSIONS_ROOT}/{dir_name}"),
            "-maxdepth".to_string(),
            "1".to_string(),
            "-type".to_string(),
            "f".to_string(),
            "!".to_string(),
            "-name".to_string(),
            "*.jsonl".to_string(),
        ],
    )?;
    let prefix = format!("{SESSIONS_ROOT}/");
    Ok(output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|line| line.strip_prefix(&prefix).unwrap_or(line).to_string())
        .collect())
}

fn apply_action(
    engine: &dyn ccbox_engine::engine::ContainerEngine,
    container_id: &str,
    action: &ShadowAction,
) -> ccbox_core::error::Result<()> {
    match action {
        ShadowAction::MoveFile { from, to } => {
            engine.exec(
                container_id,
                &["mv".to_string(), format!("{SESSIONS_ROOT}/{from}"), format!("{SESSIONS_ROOT}/{to}")],
            )?;
        }
        ShadowAction::RemoveStaleIndex { path } => {
            engine.exec(container_id, &["rm".to_string(), "-f".to_string(), format!("{SESSIONS_ROOT}/{path}")])?;
        }
        ShadowAction::RemoveEmptyDir { path } => {
            engine.exec(container_id, &["rmdir".to_string(), format!("{SESSIONS_ROOT}/{path}")])?;
        }
    }
    Ok(())
}

fn apply_pair(
    engine: &dyn ccbox_engine::engine::ContainerEngine,
    container_id: &str,
    pair: &DirMapPair,
) -> ccbox_core::error::Result<()> {
    let shadow_files = list_jsonl_basenames(engine, container_id, &pair.container_name)?;
    if shadow_files.is_empty() {
        return Ok(());
    }
    let native_files = list_jsonl_basenames(engine, container_id, &pair.native_name)?;
    let stale_index_files = list_stale_index_files(engine, container_id, &pair.container_name)?;

    for action in plan_merge(pair, &shadow_files, &native_files, &stale_index_files) {
        apply_action(engine, container_id, &action)?;
    }
    Ok(())
}

/// Applies every pair in `CCBOX_DIR_MAP`'s wire format against the
/// running container: lists each shadow directory's `.jsonl` files over
/// `exec`, skips pairs with nothing to merge, and otherwise runs
/// [`plan_merge`] and carries out its actions with `mv`/`rm`/`rmdir`.
/// Invoked once per container start (§4.G); best-effort, collecting
/// errors rather than aborting on the first failed pair, matching
/// `ccbox-engine::cleanup`'s "collect errors, don't abort" style.
pub fn apply_dir_map(
    engine: &dyn ccbox_engine::engine::ContainerEngine,
    container_id: &str,
    dir_map: &str,
) -> Vec<ccbox_core::error::CcboxError> {
    parse_dir_map(dir_map)
        .iter()
        .filter_map(|pair| apply_pair(engine, container_id, pair).err())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_pairs() {
        let pairs = parse_dir_map("-mnt-d-proj:-D-proj;-home-a:-home-b");
        assert_eq!(
            pairs,
            vec![
                DirMapPair {
                    container_name: "-mnt-d-proj".to_string(),
                    native_name: "-D-proj".to_string()
                },
                DirMapPair {
                    container_name: "-home-a".to_string(),
                    native_name: "-home-b".to_string()
                },
            ]
        );
    }

    #[test]
    fn empty_string_yields_no_pairs() {
        assert!(parse_dir_map("").is_empty());
    }

    #[test]
    fn moves_non_colliding_files_and_cleans_up() {
        let pair = DirMapPair {
            container_name: "-mnt-d-proj".to_string(),
            native_name: "-D-proj".to_string(),
        };
        let shadow = vec!["a.jsonl".to_string(), "b.jsonl".to_string()];
        let native = vec!["b.jsonl".to_string()];
        let stale = vec!["-mnt-d-proj/__store.db".to_string()];

        let plan = plan_merge(&pair, &shadow, &native, &stale);

        assert_eq!(
            plan[0],
            ShadowAction::MoveFile {
                from: "-mnt-d-proj/a.jsonl".to_string(),
                to: "-D-proj/a.jsonl".to_string(),
            }
        );
        assert!(!plan
            .iter()
            .any(|a| matches!(a, ShadowAction::MoveFile { from, .. } if from.contains("b.jsonl"))));
        assert!(plan
            .iter()
            .any(|a| matches!(a, ShadowAction::RemoveStaleIndex { .. })));
        assert_eq!(plan.last().unwrap(), &ShadowAction::RemoveEmptyDir {
            path: "-mnt-d-proj".to_string()
        });
    }

    /// Delegates to a [`ccbox_engine::mock::MockEngine`] for everything
    /// except `exec`, which it serves from canned per-directory `ls`/`find`
    /// output so [`apply_dir_map`]'s multi-exec sequencing can be tested
    /// without a real engine.
    struct ScriptedEngine {
        inner: ccbox_engine::mock::MockEngine,
        jsonl_by_dir: std::collections::HashMap<String, Vec<String>>,
        stale_by_dir: std::collections::HashMap<String, Vec<String>>,
    }

    impl ccbox_engine::engine::ContainerEngine for ScriptedEngine {
        fn ping(&self) -> ccbox_core::error::Result<()> {
            self.inner.ping()
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
            self.inner.image_build(a, b, c, d, g, h, e, f)
        }
        fn image_pull(&self, r: &str) -> ccbox_core::error::Result<()> {
            self.inner.image_pull(r)
        }
        fn image_tag(&self, s: &str, d: &str) -> ccbox_core::error::Result<()> {
            self.inner.image_tag(s, d)
        }
        fn image_list(&self, f: &str) -> ccbox_core::error::Result<Vec<String>> {
            self.inner.image_list(f)
        }
        fn image_inspect(&self, r: &str) -> ccbox_core::error::Result<Option<serde_json::Value>> {
            self.inner.image_inspect(r)
        }
        fn image_remove(&self, r: &str, force: bool, prune: bool) -> ccbox_core::error::Result<()> {
            self.inner.image_remove(r, force, prune)
        }
        fn container_create(&self, spec: &ccbox_engine::types::ContainerSpec) -> ccbox_core::error::Result<String> {
            self.inner.container_create(spec)
        }
        fn container_start(&self, id: &str) -> ccbox_core::error::Result<()> {
            self.inner.container_start(id)
        }
        fn container_wait(&self, id: &str) -> ccbox_core::error::Result<i32> {
            self.inner.container_wait(id)
        }
        fn container_stop(&self, id: &str, g: u32) -> ccbox_core::error::Result<()> {
            self.inner.container_stop(id, g)
        }
        fn container_remove(&self, id: &str, force: bool) -> ccbox_core::error::Result<()> {
            self.inner.container_remove(id, force)
        }
        fn container_list(
            &self,
            all: bool,
            label_filter: &str,
        ) -> ccbox_core::error::Result<Vec<ccbox_engine::types::ContainerSummary>> {
            self.inner.container_list(all, label_filter)
        }
        fn container_inspect(&self, id: &str) -> ccbox_core::error::Result<Option<serde_json::Value>> {
            self.inner.container_inspect(id)
        }
        fn run_attached(&self, spec: &ccbox_engine::types::ContainerSpec) -> ccbox_core::error::Result<i32> {
            self.inner.run_attached(spec)
        }
        fn exec(&self, id: &str, cmd: &[String]) -> ccbox_core::error::Result<ccbox_engine::engine::ExecOutput> {
            self.inner.exec(id, cmd)?;
            let joined = cmd.join(" ");
            for (dir, files) in &self.jsonl_by_dir {
                if joined.contains(&format!("cd {SESSIONS_ROOT}/{dir} ")) {
                    return Ok(ccbox_engine::engine::ExecOutput {
                        stdout: files.join("\n"),
                        exit_code: 0,
                    });
                }
            }
            for (dir, files) in &self.stale_by_dir {
                if joined.contains(&format!("{SESSIONS_ROOT}/{dir} ")) && joined.contains("find") {
                    return Ok(ccbox_engine::engine::ExecOutput {
                        stdout: files
                            .iter()
                            .map(|f| format!("{SESSIONS_ROOT}/{dir}/{f}"))
                            .collect::<Vec<_>>()
                            .join("\n"),
                        exit_code: 0,
                    });
                }
            }
            Ok(ccbox_engine::engine::ExecOutput { stdout: String::new(), exit_code: 0 })
        }
        fn copy_to_container(&self, id: &str, dest: &str, bytes: &[u8]) -> ccbox_core::error::Result<()> {
            self.inner.copy_to_container(id, dest, bytes)
        }
        fn volumes_prune(&self) -> ccbox_core::error::Result<()> {
            self.inner.volumes_prune()
        }
        fn build_cache_prune(&self) -> ccbox_core::error::Result<()> {
            self.inner.build_cache_prune()
        }
    }

    #[test]
    fn apply_dir_map_moves_files_and_skips_empty_shadow_dirs() {
        let mut jsonl_by_dir = std::collections::HashMap::new();
        jsonl_by_dir.insert("-mnt-d-proj".to_string(), vec!["a.jsonl".to_string(), "b.jsonl".to_string()]);
        jsonl_by_dir.insert("-D-proj".to_string(), vec!["b.jsonl".to_string()]);
        jsonl_by_dir.insert("-mnt-d-empty".to_string(), vec![]);
        jsonl_by_dir.insert("-D-empty".to_string(), vec![]);
        let mut stale_by_dir = std::collections::HashMap::new();
        stale_by_dir.insert("-mnt-d-proj".to_string(), vec!["__store.db".to_string()]);

        let engine = ScriptedEngine { inner: ccbox_engine::mock::MockEngine::new(), jsonl_by_dir, stale_by_dir };
        let dir_map = "-mnt-d-proj:-D-proj;-mnt-d-empty:-D-empty";

        let errors = apply_dir_map(&engine, "container-1", dir_map);
        assert!(errors.is_empty());

        let log = engine.inner.exec_log();
        let moved = log.iter().any(|(_, cmd)| {
            cmd.first().map(String::as_str) == Some("mv")
                && cmd.get(1).map(String::as_str) == Some("/ccbox/.claude/projects/-mnt-d-proj/a.jsonl")
        });
        assert!(moved, "expected a.jsonl to be moved, log: {log:?}");

        let moved_b = log.iter().any(|(_, cmd)| {
            cmd.first().map(String::as_str) == Some("mv")
                && cmd.iter().any(|a| a.contains("b.jsonl"))
        });
        assert!(!moved_b, "b.jsonl collides in both dirs and must not be moved");

        let removed_dir = log.iter().any(|(_, cmd)| {
            cmd.first().map(String::as_str) == Some("rmdir")
                && cmd.get(1).map(String::as_str) == Some("/ccbox/.claude/projects/-mnt-d-proj")
        });
        assert!(removed_dir, "expected the drained shadow dir to be removed");

        // the empty-shadow pair never even lists its native sibling
        let listed_empty_native = log
            .iter()
            .any(|(_, cmd)| cmd.join(" ").contains(&format!("cd {SESSIONS_ROOT}/-D-empty ")));
        assert!(!listed_empty_native);
    }
}
