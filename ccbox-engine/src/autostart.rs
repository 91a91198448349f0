//! Auto-start (§4.E): if `ping` fails, launch the platform's desktop
//! engine and poll until it answers or a deadline passes.

use crate::engine::ContainerEngine;
use ccbox_core::error::{CcboxError, Result};
use ccbox_platform::HostKind;
use std::thread::sleep;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

fn launch_command(kind: HostKind) -> Option<(&'static str, &'static [&'static str])> {
    match kind {
        HostKind::MacOS => Some(("open", &["-a", "Docker"])),
        HostKind::WindowsNative => Some((
            r"C:\Program Files\Docker\Docker\Docker Desktop.exe",
            &[],
        )),
        HostKind::WindowsWsl | HostKind::Linux => None,
    }
}

/// Ensures the engine's daemon is reachable, attempting a platform-
/// specific launch first when it isn't. Returns an error if the daemon
/// still doesn't answer within `deadline`.
pub fn ensure_running(
    engine: &dyn ContainerEngine,
    host_kind: HostKind,
    deadline: Duration,
) -> Result<()> {
    if engine.ping().is_ok() {
        return Ok(());
    }

    if let Some((program, args)) = launch_command(host_kind) {
        let _ = std::process::Command::new(program).args(args).spawn();
    }

    let start = Instant::now();
    while start.elapsed() < deadline {
        if engine.ping().is_ok() {
            return Ok(());
        }
        sleep(POLL_INTERVAL);
    }

    Err(CcboxError::DaemonTimeout {
        command: "ping".to_string(),
        seconds: deadline.as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEngine;

    #[test]
    fn reachable_engine_returns_immediately() {
        let engine = MockEngine::new();
        let start = Instant::now();
        ensure_running(&engine, HostKind::Linux, Duration::from_secs(5)).unwrap();
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn linux_has_no_launch_command() {
        assert!(launch_command(HostKind::Linux).is_none());
        assert!(launch_command(HostKind::MacOS).is_some());
    }
}
