//! Owns the bridge controller's refresh/dispatch closures (§4.H): lists
//! managed containers and their sessions on each tick, and turns the
//! controller's `Command`s into detached engine/platform calls whose
//! outcome is posted back as a `Msg`.

use std::time::{SystemTime, UNIX_EPOCH};

use ccbox_bridge::{run_bridge, BridgeState, Command, ContainerInfo, HeaderInfo, Msg};
use ccbox_core::error::Result;
use ccbox_engine::engine::ContainerEngine;
use ccbox_platform::{facts, input};
use tokio::sync::mpsc::UnboundedSender;

use crate::pipeline;

const LABEL_FILTER: &str = "ccbox.managed=true";

fn now_secs() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
}

fn header() -> HeaderInfo {
    let repo_branch = std::process::Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "no-branch".to_string());

    HeaderInfo {
        repo_branch,
        release_tag: None,
        alert_count: 0,
        username: std::env::var("USER").unwrap_or_else(|_| "user".to_string()),
        assistant_version: env!("CARGO_PKG_VERSION").to_string(),
        model: "default".to_string(),
        context_usage_pct: 0,
    }
}

fn refresh(engine: &dyn ContainerEngine) -> Vec<ContainerInfo> {
    let summaries = engine.container_list(false, LABEL_FILTER).unwrap_or_default();
    let now = now_secs();
    summaries
        .into_iter()
        .map(|summary| {
            let healthy = ccbox_session::is_healthy(engine, &summary.id).unwrap_or(false);
            let sessions = ccbox_session::discover_sessions(engine, &summary.id, now).unwrap_or_default();
            ContainerInfo {
                id: summary.id,
                name: summary.name,
                project: summary.labels.get("ccbox.project").cloned().unwrap_or_default(),
                stack: summary.labels.get("ccbox.stack").cloned().unwrap_or_default(),
                status: summary.status,
                healthy,
                sessions,
            }
        })
        .collect()
}

fn dispatch(command: Command, tx: UnboundedSender<Msg>) {
    let engine = pipeline::engine_handle();
    tokio::spawn(async move {
        let msg = tokio::task::spawn_blocking(move || run_command(engine.as_ref(), command))
            .await
            .unwrap_or_else(|e| Msg::StatusMsg(format!("action panicked: {e}")));
        let _ = tx.send(msg);
    });
}

fn run_command(engine: &dyn ContainerEngine, command: Command) -> Msg {
    match command {
        Command::SpawnNewContainer { ccbox_args } => match pipeline::spawn_new_container(&ccbox_args) {
            Ok(()) => Msg::StatusMsg("Opened new container in a new terminal".to_string()),
            Err(e) => Msg::StatusMsg(format!("Spawn failed: {e}")),
        },
        Command::StopContainer { container_id } => {
            match engine.container_stop(&container_id, 10).and_then(|_| engine.container_remove(&container_id, false)) {
                Ok(()) => Msg::ContainerStopped(container_id),
                Err(e) => Msg::StatusMsg(format!("Stop failed: {e}")),
            }
        }
        Command::RecordAndPasteVoice { container_id } => match record_and_push(engine, &container_id) {
            Ok(()) => Msg::StatusMsg("Pushed voice transcript".to_string()),
            Err(e) => Msg::StatusMsg(format!("Voice failed: {e}")),
        },
        Command::PasteClipboard { container_id } => match paste_clipboard(engine, &container_id) {
            Ok(()) => Msg::StatusMsg("Pasted clipboard".to_string()),
            Err(e) => Msg::StatusMsg(format!("Paste failed: {e}")),
        },
        Command::AttachShell { container_id } => match pipeline::attach_shell(&container_id) {
            Ok(()) => Msg::StatusMsg("Opened shell in a new terminal".to_string()),
            Err(e) => Msg::StatusMsg(format!("Attach failed: {e}")),
        },
    }
}

fn record_and_push(engine: &dyn ContainerEngine, container_id: &str) -> Result<()> {
    let opts = input::PipelineOptions {
        duration_secs: 10,
        model: "base.en".to_string(),
        audio_input_format: facts().audio_input_format,
    };
    let transcript = input::Pipeline::run(&opts)?;
    ccbox_bridge::push_payload(engine, container_id, transcript.text.as_bytes(), "txt", pipeline::now_unix_millis())
}

fn paste_clipboard(engine: &dyn ContainerEngine, container_id: &str) -> Result<()> {
    let commands = &facts().clipboard;
    let payload = input::read_clipboard_image(commands).or_else(|_| input::read_clipboard_text(commands))?;
    let (bytes, ext) = match payload {
        input::ClipboardPayload::Image(bytes) => (bytes, pipeline::push_ext(true)),
        input::ClipboardPayload::Text(text) => (text.into_bytes(), pipeline::push_ext(false)),
    };
    ccbox_bridge::push_payload(engine, container_id, &bytes, ext, pipeline::now_unix_millis())
}

/// Drives the bridge until the user quits.
pub async fn enter(project_path: String, ccbox_args: Vec<String>) -> Result<()> {
    let (width, height) = crossterm::terminal::size().unwrap_or((80, 24));
    let state = BridgeState::new(project_path, ccbox_args, width, height);
    let engine = pipeline::engine_handle();
    let refresh_engine = engine.clone();
    run_bridge(state, header(), move || refresh(refresh_engine.as_ref()), dispatch).await
}
