//! Pure host↔container path form detection, canonicalisation, and
//! transformation.

use ccbox_core::error::{CcboxError, Result};

/// Which recognised raw path form a string is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathForm {
    /// `D:\GitHub\x` or `D:/GitHub/x`.
    WindowsDrive,
    /// `\\host\share\x` or `//host/share/x`.
    Unc,
    /// `/mnt/d/x` (WSL's view of a Windows drive).
    WslMount,
    /// Anything else — treated as already in its native form.
    Other,
}

/// Detects which of the recognised raw forms `raw` is in.
pub fn detect_form(raw: &str) -> PathForm {
    if is_windows_drive(raw) {
        PathForm::WindowsDrive
    } else if is_unc(raw) {
        PathForm::Unc
    } else if let Some(_drive) = wsl_mount_drive(raw) {
        PathForm::WslMount
    } else {
        PathForm::Other
    }
}

fn is_windows_drive(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'/' || bytes[2] == b'\\')
}

fn is_unc(raw: &str) -> bool {
    let slashified = raw.starts_with("\\\\") || raw.starts_with("//");
    if !slashified {
        return false;
    }
    let rest = &raw[2..];
    let sep = rest.find(['/', '\\']);
    match sep {
        Some(idx) => idx > 0 && rest.len() > idx + 1,
        None => false,
    }
}

fn wsl_mount_drive(raw: &str) -> Option<char> {
    let rest = raw.strip_prefix("/mnt/")?;
    let mut chars = rest.chars();
    let drive = chars.next()?;
    if !drive.is_ascii_lowercase() {
        return None;
    }
    match chars.next() {
        None => Some(drive),
        Some('/') => Some(drive),
        _ => None,
    }
}

/// Converts backslashes to forward slashes, collapses runs of `/`, and
/// strips a trailing `/` (unless the result would be just `/`).
pub fn canonicalize(raw: &str) -> String {
    let slashified: String = raw.chars().map(|c| if c == '\\' { '/' } else { c }).collect();

    let mut collapsed = String::with_capacity(slashified.len());
    let mut last_was_slash = false;
    for c in slashified.chars() {
        if c == '/' {
            if last_was_slash {
                continue;
            }
            last_was_slash = true;
        } else {
            last_was_slash = false;
        }
        collapsed.push(c);
    }

    if collapsed.len() > 1 && collapsed.ends_with('/') {
        collapsed.truncate(collapsed.len() - 1);
    }
    collapsed
}

/// Rejects a path containing `..` traversal or a NUL byte, reporting the
/// byte offset of the offending content.
pub fn validate_path(raw: &str) -> Result<()> {
    if let Some(pos) = raw.find('\0') {
        return Err(CcboxError::PathInvalid(format!(
            "NUL byte at offset {pos} in {raw:?}"
        )));
    }

    let normalized = canonicalize(raw);
    for (idx, segment) in normalized.split('/').enumerate() {
        if segment == ".." {
            return Err(CcboxError::PathInvalid(format!(
                "path traversal segment \"..\" at component {idx} in {raw:?}"
            )));
        }
    }
    Ok(())
}

/// Host path → Docker's bind-mount "source" form (§4.B step 1): the
/// argument that actually goes on the `-v` flag's host side. Windows-drive
/// paths become forward-slashed; WSL mount paths become an
/// uppercase-drive-letter POSIX path; UNC and anything else pass through
/// canonicalised but otherwise unchanged.
pub fn host_to_docker_mount_form(raw: &str) -> String {
    let canon = canonicalize(raw);
    match detect_form(raw) {
        PathForm::WindowsDrive => canon,
        PathForm::WslMount => {
            let drive = wsl_mount_drive(raw).expect("form checked above");
            let rest = canon
                .strip_prefix(&format!("/mnt/{drive}"))
                .unwrap_or("");
            format!("/{}{}", drive.to_ascii_uppercase(), rest)
        }
        PathForm::Unc | PathForm::Other => canon,
    }
}

/// Docker mount form → container-internal POSIX form (§4.B step 2,
/// drive-letter style): `D:/GitHub/x` → `/D/GitHub/x`, preserving the
/// drive letter's case.
fn docker_mount_to_container_form(docker_form: &str) -> String {
    if is_windows_drive(docker_form) {
        let drive = docker_form.chars().next().unwrap();
        let rest = &docker_form[2..]; // skip "D:"
        format!("/{drive}{rest}")
    } else {
        docker_form.to_string()
    }
}

/// Host path → container-internal POSIX form, applying both steps of
/// §4.B: host → Docker mount form, then Docker mount form → container
/// POSIX form.
pub fn host_to_container(raw: &str) -> String {
    docker_mount_to_container_form(&host_to_docker_mount_form(raw))
}

/// Container POSIX form → Docker mount form (reverse of step 2):
/// `/D/GitHub/x` → `D:/GitHub/x`.
fn container_to_docker_mount_form(container_form: &str) -> String {
    let bytes = container_form.as_bytes();
    let is_drive_style = bytes.len() >= 2
        && bytes[0] == b'/'
        && bytes[1].is_ascii_alphabetic()
        && (bytes.len() == 2 || bytes[2] == b'/');
    if is_drive_style {
        let drive = container_form.chars().nth(1).unwrap();
        let rest = &container_form[2..];
        format!("{drive}:{rest}")
    } else {
        container_form.to_string()
    }
}

/// Which native host path form to reconstruct when reversing
/// [`host_to_container`]'s drive-letter mapping. Undecidable from the
/// container string alone: a native-Windows host and a WSL host produce
/// the same container form (`/D/...`) for "drive D", so the caller must
/// say which one it's reversing back into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPathOrigin {
    WindowsDrive,
    WslMount,
}

/// Reverses [`host_to_container`]: container POSIX form → host-native
/// canonical form. Property (§8): for `p` detected as `origin`,
/// `container_to_host(host_to_container(p), origin) == canonicalize(p)`.
pub fn container_to_host(container_form: &str, origin: HostPathOrigin) -> String {
    let docker_form = container_to_docker_mount_form(container_form);
    match origin {
        HostPathOrigin::WindowsDrive => docker_form,
        HostPathOrigin::WslMount => {
            if is_windows_drive(&docker_form) {
                let drive = docker_form.chars().next().unwrap().to_ascii_lowercase();
                let rest = &docker_form[2..];
                format!("/mnt/{drive}{rest}")
            } else {
                docker_form
            }
        }
    }
}
