//! Microphone capture and local speech-to-text transcription.

use ccbox_core::error::{CcboxError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

const WHISPER_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Output of the full capture → transcribe pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceTranscript {
    pub text: String,
}

fn temp_wav_path() -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("ccbox-voice-{millis}.wav"))
}

/// Records `duration` seconds of audio to a 16kHz mono 16-bit PCM WAV file
/// in the system temp dir, trying `ffmpeg`, then `arecord` (Linux), then
/// `sox rec`, in that order.
pub fn record(duration_secs: u32, audio_input_format: &str) -> Result<PathBuf> {
    let out = temp_wav_path();

    let ffmpeg_device = match audio_input_format {
        "avfoundation" => ":0",
        "dshow" => "audio=default",
        _ => "default",
    };

    let attempts: Vec<(&str, Vec<String>)> = vec![
        (
            "ffmpeg",
            vec![
                "-y".into(),
                "-f".into(),
                audio_input_format.into(),
                "-i".into(),
                ffmpeg_device.into(),
                "-t".into(),
                duration_secs.to_string(),
                "-ar".into(),
                "16000".into(),
                "-ac".into(),
                "1".into(),
                "-sample_fmt".into(),
                "s16".into(),
                out.to_string_lossy().into_owned(),
            ],
        ),
        (
            "arecord",
            vec![
                "-d".into(),
                duration_secs.to_string(),
                "-f".into(),
                "S16_LE".into(),
                "-r".into(),
                "16000".into(),
                "-c".into(),
                "1".into(),
                out.to_string_lossy().into_owned(),
            ],
        ),
        (
            "sox",
            vec![
                "-d".into(),
                "-r".into(),
                "16000".into(),
                "-c".into(),
                "1".into(),
                "-b".into(),
                "16".into(),
                out.to_string_lossy().into_owned(),
                "trim".into(),
                "0".into(),
                duration_secs.to_string(),
            ],
        ),
    ];

    for (program, args) in &attempts {
        if which::which(program).is_err() {
            continue;
        }
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(s) if s.success() && out.exists() => return Ok(out),
            _ => continue,
        }
    }

    Err(CcboxError::InputUnavailable(
        "no audio capture tool found (tried ffmpeg, arecord, sox)".into(),
    ))
}

fn candidate_model_paths(model: &str) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(cache) = dirs::cache_dir() {
        candidates.push(cache.join("whisper").join(format!("ggml-{model}.bin")));
    }
    if let Some(data) = dirs::data_dir() {
        candidates.push(data.join("whisper").join(format!("ggml-{model}.bin")));
    }
    candidates.push(PathBuf::from("models").join(format!("ggml-{model}.bin")));
    candidates.push(PathBuf::from(model));
    candidates
}

/// Resolves a model name to a path on disk, downloading it if none of the
/// well-known locations has it yet.
pub fn resolve_model(model: &str) -> Result<PathBuf> {
    for candidate in candidate_model_paths(model) {
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    download_model(model)
}

fn download_model(model: &str) -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| CcboxError::InputUnavailable("no cache directory available".into()))?
        .join("whisper");
    std::fs::create_dir_all(&cache_dir)?;

    let dest = cache_dir.join(format!("ggml-{model}.bin"));
    let tmp = cache_dir.join(format!("ggml-{model}.bin.tmp"));
    let url = format!("{WHISPER_BASE_URL}/ggml-{model}.bin");

    let mut response = reqwest::blocking::get(&url)
        .map_err(|e| CcboxError::InputUnavailable(format!("failed to download model: {e}")))?;
    if !response.status().is_success() {
        return Err(CcboxError::InputUnavailable(format!(
            "model download returned {}",
            response.status()
        )));
    }

    let mut file = std::fs::File::create(&tmp)?;
    response
        .copy_to(&mut file)
        .map_err(|e| CcboxError::InputUnavailable(format!("failed to write model: {e}")))?;
    file.flush()?;
    drop(file);
    std::fs::rename(&tmp, &dest)?;
    Ok(dest)
}

/// Runs `whisper-cli` (falling back to `whisper`) against a WAV file and
/// returns the transcribed text.
pub fn transcribe(wav_path: &Path, model_path: &Path) -> Result<String> {
    let binary = if which::which("whisper-cli").is_ok() {
        "whisper-cli"
    } else if which::which("whisper").is_ok() {
        "whisper"
    } else {
        return Err(CcboxError::InputUnavailable(
            "no whisper binary found (tried whisper-cli, whisper)".into(),
        ));
    };

    let output = Command::new(binary)
        .arg("--no-timestamps")
        .arg("-m")
        .arg(model_path)
        .arg("-f")
        .arg(wav_path)
        .output()
        .map_err(|e| CcboxError::InputUnavailable(format!("failed to run {binary}: {e}")))?;

    if !output.status.success() {
        return Err(CcboxError::InputUnavailable(format!(
            "{binary} exited with {}",
            output.status
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Options controlling a full record → transcribe pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub duration_secs: u32,
    pub model: String,
    pub audio_input_format: &'static str,
}

/// `ensure model → record → transcribe → trim`; the temp WAV is removed on
/// every exit path, success or failure.
pub struct Pipeline;

impl Pipeline {
    pub fn run(opts: &PipelineOptions) -> Result<VoiceTranscript> {
        let model_path = resolve_model(&opts.model)?;
        let wav_path = record(opts.duration_secs, opts.audio_input_format)?;

        let result = transcribe(&wav_path, &model_path);
        let _ = std::fs::remove_file(&wav_path);

        result.map(|text| VoiceTranscript {
            text: text.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_paths_include_local_models_dir_and_raw_arg() {
        let candidates = candidate_model_paths("base.en");
        assert!(candidates
            .iter()
            .any(|p| p == &PathBuf::from("models").join("ggml-base.en.bin")));
        assert!(candidates.iter().any(|p| p == &PathBuf::from("base.en")));
    }

    #[test]
    fn temp_wav_path_is_unique_across_calls() {
        let a = temp_wav_path();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = temp_wav_path();
        assert_ne!(a, b);
    }
}
