//! Directory-name normalisation and container/image identifier
//! sanitisation.

use unicode_normalization::UnicodeNormalization;

/// Normalises a directory name for use as a cross-filesystem-safe
/// identifier: NFC-normalise, strip NUL and C0/C1 control characters, trim
/// whitespace, strip trailing `.`/space (Windows-reserved), truncate to
/// 255 bytes respecting UTF-8 boundaries. Empty result falls back to
/// `"project"`.
pub fn normalize_directory_name(raw: &str) -> String {
    let nfc: String = raw.nfc().collect();

    let stripped: String = nfc
        .chars()
        .filter(|c| !is_control(*c))
        .collect();

    let trimmed = stripped.trim();
    let trimmed = trimmed.trim_end_matches(['.', ' ']);

    let truncated = truncate_utf8(trimmed, 255);

    if truncated.is_empty() {
        "project".to_string()
    } else {
        truncated.to_string()
    }
}

fn is_control(c: char) -> bool {
    let code = c as u32;
    code == 0 || (0x01..=0x1F).contains(&code) || (0x7F..=0x9F).contains(&code)
}

fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Sanitises an identifier for use as a container/image name component:
/// lowercase, replace any char outside `[a-z0-9._-]` with `-`, collapse
/// runs of `-` to one, trim leading/trailing `-._`, truncate to `max_len`
/// bytes. Empty result falls back to `"project"`.
pub fn sanitize_identifier(raw: &str, max_len: usize) -> String {
    let lowered = raw.to_lowercase();

    let mut replaced = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-') {
            replaced.push(c);
        } else {
            replaced.push('-');
        }
    }

    let mut collapsed = String::with_capacity(replaced.len());
    let mut last_dash = false;
    for c in replaced.chars() {
        if c == '-' {
            if last_dash {
                continue;
            }
            last_dash = true;
        } else {
            last_dash = false;
        }
        collapsed.push(c);
    }

    let trimmed = collapsed.trim_matches(|c: char| matches!(c, '-' | '.' | '_'));
    let truncated = truncate_utf8(trimmed, max_len);
    let truncated = truncated.trim_matches(|c: char| matches!(c, '-' | '.' | '_'));

    if truncated.is_empty() {
        "project".to_string()
    } else {
        truncated.to_string()
    }
}
