use crate::HostKind;

/// Detect the host OS variant.
///
/// Rules, in order: the runtime reports Windows → `WindowsNative`; macOS →
/// `MacOS`; Linux, then if `/proc/version` mentions "microsoft"
/// (case-insensitive) or either `WSL_DISTRO_NAME`/`WSLENV` is set →
/// `WindowsWsl`, else `Linux`. Anything else falls back to `Linux`.
pub fn detect_host_kind() -> HostKind {
    match std::env::consts::OS {
        "windows" => HostKind::WindowsNative,
        "macos" => HostKind::MacOS,
        "linux" => {
            if is_wsl() {
                HostKind::WindowsWsl
            } else {
                HostKind::Linux
            }
        }
        _ => HostKind::Linux,
    }
}

fn is_wsl() -> bool {
    if std::env::var_os("WSL_DISTRO_NAME").is_some() || std::env::var_os("WSLENV").is_some() {
        return true;
    }
    std::fs::read_to_string("/proc/version")
        .map(|s| s.to_lowercase().contains("microsoft"))
        .unwrap_or(false)
}
