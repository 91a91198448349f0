//! Host platform facts: the single place that knows which of
//! Linux / macOS / Windows-native / Windows-under-WSL ccbox is running on,
//! and what that implies for FUSE, privilege, and path translation, as
//! well as which concrete clipboard/audio commands apply.

mod clipboard;
mod detect;
pub mod input;
pub mod terminal_spawn;

pub use clipboard::ClipboardCommands;
pub use detect::detect_host_kind;
pub use terminal_spawn::spawn_in_new_terminal;

use std::sync::OnceLock;

/// The host OS variant, in the order the detector checks for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostKind {
    Linux,
    MacOS,
    WindowsNative,
    WindowsWsl,
}

impl HostKind {
    pub fn is_windows_like(self) -> bool {
        matches!(self, HostKind::WindowsNative | HostKind::WindowsWsl)
    }
}

/// How the container engine's daemon is reached on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerEndpoint {
    UnixSocket(String),
    NamedPipe(String),
}

/// All platform-conditional facts, derived once and memoised for the
/// lifetime of the process.
#[derive(Debug, Clone)]
pub struct PlatformFacts {
    pub kind: HostKind,
    pub needs_fuse: bool,
    pub needs_privileged_for_fuse: bool,
    pub needs_path_translation: bool,
    pub docker_endpoint: DockerEndpoint,
    pub clipboard: ClipboardCommands,
    /// ffmpeg `-f` input format for microphone capture.
    pub audio_input_format: &'static str,
}

impl PlatformFacts {
    fn derive(kind: HostKind) -> Self {
        let needs_fuse = kind.is_windows_like();
        let needs_privileged_for_fuse = matches!(kind, HostKind::WindowsNative);
        let needs_path_translation = needs_fuse;

        let docker_endpoint = match kind {
            HostKind::WindowsNative => {
                DockerEndpoint::NamedPipe(r"\\.\pipe\docker_engine".to_string())
            }
            _ => DockerEndpoint::UnixSocket("/var/run/docker.sock".to_string()),
        };

        let clipboard = ClipboardCommands::for_host(kind);

        let audio_input_format = match kind {
            HostKind::MacOS => "avfoundation",
            HostKind::WindowsNative => "dshow",
            HostKind::Linux | HostKind::WindowsWsl => {
                if std::env::var_os("WAYLAND_DISPLAY").is_some() {
                    "pulse"
                } else {
                    "alsa"
                }
            }
        };

        PlatformFacts {
            kind,
            needs_fuse,
            needs_privileged_for_fuse,
            needs_path_translation,
            docker_endpoint,
            clipboard,
            audio_input_format,
        }
    }
}

static FACTS: OnceLock<PlatformFacts> = OnceLock::new();

/// The memoised platform facts for this process. The first call performs
/// detection (including a `/proc/version` read on Linux); every
/// subsequent call is free.
pub fn facts() -> &'static PlatformFacts {
    FACTS.get_or_init(|| PlatformFacts::derive(detect_host_kind()))
}
