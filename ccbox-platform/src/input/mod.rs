//! Input channels: clipboard and voice capture, wrapped as side-effecting
//! host utilities producing a bytes-or-text payload for the bridge to push
//! into a running container.

mod clipboard_exec;
mod voice;

pub use clipboard_exec::{read_clipboard_image, read_clipboard_text, ClipboardPayload};
pub use voice::{record, transcribe, Pipeline, PipelineOptions, VoiceTranscript};
