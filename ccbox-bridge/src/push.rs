//! Push-payload contract for the `v` (voice) and `p` (paste) keys
//! (§4.H): wrap the payload as a single-entry tar at
//! `.claude/input/paste-<unix-millis>.<ext>`, inspect the container for
//! its working directory (default `/ccbox`), and `copyToContainer`.

use ccbox_core::error::{CcboxError, Result};
use ccbox_engine::engine::ContainerEngine;
use std::io::Write;

/// Builds the single-entry tar archive `copyToContainer` ships. `ext` is
/// `"png"` for an image paste, `"txt"` otherwise, per the push-payload
/// contract.
pub fn build_paste_tar(bytes: &[u8], ext: &str, unix_millis: u128) -> Result<Vec<u8>> {
    let entry_path = format!(".claude/input/paste-{unix_millis}.{ext}");

    let mut builder = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_size(bytes.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, &entry_path, bytes)
        .map_err(|e| CcboxError::Internal(format!("building paste tar: {e}")))?;

    builder
        .into_inner()
        .map_err(|e| CcboxError::Internal(format!("finishing paste tar: {e}")))
}

fn working_dir_of(engine: &dyn ContainerEngine, container_id: &str) -> Result<String> {
    let inspected = engine.container_inspect(container_id)?;
    Ok(inspected
        .as_ref()
        .and_then(|v| v.get("Config"))
        .and_then(|c| c.get("WorkingDir"))
        .and_then(|w| w.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("/ccbox")
        .to_string())
}

/// Pushes `bytes` (an image or text paste, or a voice transcript) into
/// `container_id` at the input directory the entrypoint watches.
pub fn push_payload(
    engine: &dyn ContainerEngine,
    container_id: &str,
    bytes: &[u8],
    ext: &str,
    unix_millis: u128,
) -> Result<()> {
    let tar_bytes = build_paste_tar(bytes, ext, unix_millis)?;
    let workdir = working_dir_of(engine, container_id)?;
    engine.copy_to_container(container_id, &workdir, &tar_bytes)
}

/// Reads the archive entries back out, for tests that want to assert on
/// the exact path/contents written rather than just the byte length.
#[cfg(test)]
fn read_entries(tar_bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = tar::Archive::new(std::io::Cursor::new(tar_bytes));
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let path = entry.path().unwrap().to_string_lossy().into_owned();
            let mut contents = Vec::new();
            std::io::copy(&mut entry, &mut contents).unwrap();
            (path, contents)
        })
        .collect()
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
    fn tar_contains_single_entry_at_expected_path() {
        let bytes = b"hello clipboard";
        let tar = build_paste_tar(bytes, "txt", 1_700_000_000_000).unwrap();
        let entries = read_entries(&tar);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, ".claude/input/paste-1700000000000.txt");
        assert_eq!(entries[0].1, bytes);
    }

    #[test]
    fn image_paste_uses_png_extension() {
        let tar = build_paste_tar(b"\x89PNG", "png", 42).unwrap();
        let entries = read_entries(&tar);
        assert!(entries[0].0.ends_with(".png"));
    }

    #[test]
    fn push_payload_falls_back_to_default_workdir_with_no_inspect_data() {
        let engine = MockEngine::new();
        let id = engine.container_create(&spec()).unwrap();
        push_payload(&engine, &id, b"text", "txt", 1).unwrap();
        let log = engine.copy_log();
        assert_eq!(log[0].1, "/ccbox");
    }
}
