//! Executes the platform's clipboard read commands and produces a payload.

use crate::ClipboardCommands;
use ccbox_core::error::{CcboxError, Result};
use std::process::Command;

/// The result of reading the clipboard: raw PNG bytes, or plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardPayload {
    Image(Vec<u8>),
    Text(String),
}

fn run(argv: &[String]) -> Result<Vec<u8>> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| CcboxError::InputUnavailable("no clipboard command configured".into()))?;
    let output = Command::new(program).args(args).output().map_err(|e| {
        CcboxError::InputUnavailable(format!("failed to run `{program}`: {e}"))
    })?;
    if !output.status.success() {
        return Err(CcboxError::InputUnavailable(format!(
            "`{program}` exited with {}",
            output.status
        )));
    }
    Ok(output.stdout)
}

/// Reads an image from the clipboard as PNG bytes. Errors if the clipboard
/// is empty or holds no image.
pub fn read_clipboard_image(commands: &ClipboardCommands) -> Result<ClipboardPayload> {
    let bytes = run(&commands.read_image)?;
    if bytes.is_empty() {
        return Err(CcboxError::InputUnavailable(
            "clipboard has no image".into(),
        ));
    }
    Ok(ClipboardPayload::Image(bytes))
}

/// Reads text from the clipboard. Errors if the clipboard is empty.
pub fn read_clipboard_text(commands: &ClipboardCommands) -> Result<ClipboardPayload> {
    let bytes = run(&commands.read_text)?;
    let text = String::from_utf8_lossy(&bytes).trim_end_matches('\n').to_string();
    if text.is_empty() {
        return Err(CcboxError::InputUnavailable("clipboard is empty".into()));
    }
    Ok(ClipboardPayload::Text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_rejects_empty_argv() {
        let err = run(&[]).unwrap_err();
        assert!(err.to_string().contains("no clipboard command"));
    }

    #[test]
    fn run_surfaces_missing_program() {
        let err = run(&["ccbox-definitely-not-a-real-binary".to_string()]).unwrap_err();
        assert!(err.to_string().contains("failed to run"));
    }
}
