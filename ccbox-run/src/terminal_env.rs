//! Terminal-emulator passthrough (§4.F): a fixed list of env vars whose
//! presence lets tools running inside the container report the right
//! terminal, collected from the invoking process's own environment.

/// The fixed set forwarded verbatim when present on the host.
const TERMINAL_ENV_VARS: &[&str] = &[
    "TERM",
    "COLORTERM",
    "TERM_PROGRAM",
    "WT_SESSION",
    "KITTY_WINDOW_ID",
    "WEZTERM_PANE",
    "GHOSTTY_RESOURCES_DIR",
    "ALACRITTY_SOCKET",
    "TMUX",
];

/// Reads [`TERMINAL_ENV_VARS`] from the current process environment,
/// keeping only the ones actually set.
pub fn terminal_passthrough_env() -> Vec<(String, String)> {
    TERMINAL_ENV_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok().map(|v| (name.to_string(), v)))
        .collect()
}
