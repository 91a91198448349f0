//! Spawning a detached terminal window running one command (§4.H: "n"
//! opens another container in a new terminal window; `Enter` attaches a
//! new shell the same way). Grounded in `autostart`'s per-host launch
//! table in the engine crate, generalised from a fixed program to an
//! arbitrary command line.

use crate::HostKind;
use ccbox_core::error::{CcboxError, Result};
use std::process::Command;

fn argv_for(kind: HostKind, command_line: &str) -> (&'static str, Vec<String>) {
    match kind {
        HostKind::MacOS => (
            "osascript",
            vec![
                "-e".to_string(),
                format!("tell application \"Terminal\" to do script \"{command_line}\""),
            ],
        ),
        HostKind::WindowsNative => (
            "wt.exe",
            vec!["cmd".to_string(), "/k".to_string(), command_line.to_string()],
        ),
        HostKind::Linux | HostKind::WindowsWsl => (
            "x-terminal-emulator",
            vec!["-e".to_string(), command_line.to_string()],
        ),
    }
}

/// Launches `command_line` in a new, detached terminal window. Best
/// effort: a missing terminal emulator surfaces as
/// [`CcboxError::InputUnavailable`] rather than aborting the caller.
pub fn spawn_in_new_terminal(kind: HostKind, command_line: &str) -> Result<()> {
    let (program, args) = argv_for(kind, command_line);
    Command::new(program)
        .args(&args)
        .spawn()
        .map(|_| ())
        .map_err(|e| CcboxError::InputUnavailable(format!("no terminal emulator available ({program}): {e}")))
}
