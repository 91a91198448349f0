//! Session discovery (§4.G): sessions live inside the container as
//! `/ccbox/.claude/projects/<encoded-host-path>/<sessionId>.jsonl`. A
//! single `find` exec enumerates every `.jsonl` file; we take the last
//! two path components off each line rather than shelling out to `awk`.

use ccbox_engine::engine::ContainerEngine;
use ccbox_core::error::Result;

/// One discovered conversation log. `id` is the 6-character display
/// prefix of the session's stem; `created_at` defaults to discovery time
/// since no `stat` is performed (§4.G: "tolerated as approximate").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub project_dir: String,
    pub session_id: String,
    pub created_at: i64,
}

const SESSIONS_ROOT: &str = "/ccbox/.claude/projects";

fn parse_jsonl_line(line: &str, created_at: i64) -> Option<Session> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let stem = line.strip_suffix(".jsonl")?;
    let mut components = stem.rsplitn(2, '/');
    let session_id = components.next()?.to_string();
    let project_dir = components.next()?.rsplit('/').next()?.to_string();
    let id: String = session_id.chars().take(6).collect();
    Some(Session {
        id,
        project_dir,
        session_id,
        created_at,
    })
}

/// Runs `find <root> -name '*.jsonl' -type f` inside `container_id` and
/// parses every resulting line. `now` is passed in rather than read from
/// the clock here, keeping the parsing half of this function pure and
/// easy to test.
pub fn discover_sessions(
    engine: &dyn ContainerEngine,
    container_id: &str,
    now: i64,
) -> Result<Vec<Session>> {
    let output = engine.exec(
        container_id,
        &[
            "find".to_string(),
            SESSIONS_ROOT.to_string(),
            "-name".to_string(),
            "*.jsonl".to_string(),
            "-type".to_string(),
            "f".to_string(),
        ],
    )?;

    Ok(output
        .stdout
        .lines()
        .filter_map(|line| parse_jsonl_line(line, now))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccbox_engine::mock::MockEngine;
    use ccbox_engine::types::{ContainerSpec, LogOptions, NetworkMode, ResourceLimits};
    use std::collections::HashMap;

    fn spec() -> ContainerSpec {
        ContainerSpec {
            image: "ccbox_base:latest".to_string(),
            name: "ccbox_proj".to_string(),
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
    fn parses_trailing_two_components_and_six_char_id() {
        let line = "/ccbox/.claude/projects/-home-user-proj/abcdef1234567890.jsonl";
        let session = parse_jsonl_line(line, 1000).unwrap();
        assert_eq!(session.project_dir, "-home-user-proj");
        assert_eq!(session.session_id, "abcdef1234567890");
        assert_eq!(session.id, "abcdef");
        assert_eq!(session.created_at, 1000);
    }

    #[test]
    fn skips_blank_lines() {
        assert!(parse_jsonl_line("", 0).is_none());
        assert!(parse_jsonl_line("   ", 0).is_none());
    }

    #[test]
    fn discover_issues_a_single_find_exec() {
        let engine = MockEngine::new();
        let id = engine.container_create(&spec()).unwrap();
        discover_sessions(&engine, &id, 0).unwrap();
        let log = engine.exec_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].1[0], "find");
    }
}
