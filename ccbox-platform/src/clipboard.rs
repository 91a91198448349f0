use crate::HostKind;

/// Argv for reading the clipboard, split as `program, args…`.
///
/// Built once at platform-detection time; Wayland vs. X11 on Linux/WSL is
/// decided by whether `WAYLAND_DISPLAY` is set in the environment at that
/// point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardCommands {
    pub read_image: Vec<String>,
    pub read_text: Vec<String>,
}

impl ClipboardCommands {
    pub fn for_host(kind: HostKind) -> Self {
        match kind {
            HostKind::WindowsNative => ClipboardCommands {
                read_image: vec![
                    "powershell".into(),
                    "-NoProfile".into(),
                    "-Command".into(),
                    "[System.Windows.Forms.Clipboard]::GetImage()".into(),
                ],
                read_text: vec![
                    "powershell".into(),
                    "-NoProfile".into(),
                    "-Command".into(),
                    "Get-Clipboard".into(),
                ],
            },
            HostKind::MacOS => ClipboardCommands {
                read_image: vec![
                    "osascript".into(),
                    "-e".into(),
                    "the clipboard as «class PNGf»".into(),
                ],
                read_text: vec!["pbpaste".into()],
            },
            HostKind::Linux | HostKind::WindowsWsl => {
                if std::env::var_os("WAYLAND_DISPLAY").is_some() {
                    ClipboardCommands {
                        read_image: vec![
                            "wl-paste".into(),
                            "--type".into(),
                            "image/png".into(),
                        ],
                        read_text: vec!["wl-paste".into()],
                    }
                } else {
                    ClipboardCommands {
                        read_image: vec![
                            "xclip".into(),
                            "-selection".into(),
                            "clipboard".into(),
                            "-t".into(),
                            "image/png".into(),
                            "-o".into(),
                        ],
                        read_text: vec![
                            "xclip".into(),
                            "-selection".into(),
                            "clipboard".into(),
                            "-o".into(),
                        ],
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macos_uses_pbpaste_and_osascript() {
        let cmds = ClipboardCommands::for_host(HostKind::MacOS);
        assert_eq!(cmds.read_text, vec!["pbpaste".to_string()]);
        assert_eq!(cmds.read_image[0], "osascript");
    }

    #[test]
    fn windows_native_uses_powershell() {
        let cmds = ClipboardCommands::for_host(HostKind::WindowsNative);
        assert_eq!(cmds.read_text[0], "powershell");
        assert!(cmds.read_image.iter().any(|a| a.contains("Clipboard")));
    }
}
