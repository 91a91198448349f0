//! The bridge's cooperative UI loop (§4.H/§5): one task owns the
//! terminal and all state; a 5 s ticker and a stdin-reader task post
//! `Msg`s over a channel, and detached per-action tasks do the same once
//! their IO completes. Grounded in the pack's `observe` binary's
//! raw-mode/alt-screen setup and `crossterm::event::poll` loop, but
//! generalised so every result — tick, keypress, or action outcome —
//! flows through the same `update(state, msg)` function instead of
//! mutating the app directly from the key match (§9 REDESIGN FLAGS).

use crate::message::{Key, Msg};
use crate::render::{draw, FrameCache, HeaderInfo};
use crate::state::BridgeState;
use crate::update::{update, Command};
use ccbox_core::error::{CcboxError, Result};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

const TICK_INTERVAL: Duration = Duration::from_secs(5);
const STDIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Up | KeyCode::Char('k') => Some(Key::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(Key::Down),
        KeyCode::Char('q') => Some(Key::Quit),
        KeyCode::Char('n') => Some(Key::New),
        KeyCode::Char('s') => Some(Key::Stop),
        KeyCode::Char('v') => Some(Key::Record),
        KeyCode::Char('p') => Some(Key::Paste),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Char(c) => Some(Key::Other(c)),
        _ => None,
    }
}

fn is_ctrl_c(key: &crossterm::event::KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(crossterm::event::KeyModifiers::CONTROL)
}

/// Polls stdin on a blocking task and forwards key/resize events.
fn spawn_stdin_reader(tx: mpsc::UnboundedSender<Msg>) {
    tokio::task::spawn_blocking(move || loop {
        match event::poll(STDIN_POLL_INTERVAL) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    let msg = if is_ctrl_c(&key) {
                        Msg::Key(Key::Quit)
                    } else if let Some(mapped) = map_key(key.code) {
                        Msg::Key(mapped)
                    } else {
                        continue;
                    };
                    if tx.send(msg).is_err() {
                        return;
                    }
                }
                Ok(Event::Resize(w, h)) => {
                    if tx.send(Msg::Resize(w, h)).is_err() {
                        return;
                    }
                }
                _ => {}
            },
            Ok(false) => {}
            Err(_) => return,
        }
    });
}

fn spawn_ticker(tx: mpsc::UnboundedSender<Msg>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            interval.tick().await;
            if tx.send(Msg::Tick).is_err() {
                return;
            }
        }
    });
}

/// Runs the bridge until the user quits. The caller provides `refresh`
/// (lists containers + runs health/session discovery), `header` (static
/// per-run header fields), and `dispatch` (spawns an action command on
/// its own task and posts the result back as a `Msg`, per update.rs's
/// "the UI never blocks on them"); all three are invoked from the
/// current task, matching §5's "single cooperative UI task".
pub async fn run_bridge<F, D>(
    mut state: BridgeState,
    header: HeaderInfo,
    mut refresh: F,
    dispatch: D,
) -> Result<()>
where
    F: FnMut() -> Vec<crate::state::ContainerInfo>,
    D: Fn(Command, mpsc::UnboundedSender<Msg>) + Send + Sync + 'static,
{
    enable_raw_mode().map_err(|e| CcboxError::Internal(e.to_string()))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .map_err(|e| CcboxError::Internal(e.to_string()))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| CcboxError::Internal(e.to_string()))?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_ticker(tx.clone());
    spawn_stdin_reader(tx.clone());

    update(&mut state, Msg::Refresh(refresh()));

    let mut cache = FrameCache::new();
    let result = async {
        loop {
            terminal
                .draw(|frame| {
                    draw(frame, &state, &header);
                    let _ = cache.changed(frame.buffer_mut());
                })
                .map_err(|e| CcboxError::Internal(e.to_string()))?;

            let Some(msg) = rx.recv().await else {
                break;
            };

            let is_tick = matches!(msg, Msg::Tick);
            let commands = update(&mut state, msg);

            if is_tick && !state.is_recording && !state.is_pasting {
                update(&mut state, Msg::Refresh(refresh()));
            }

            for command in commands {
                if command == Command::Quit {
                    state.quitting = true;
                } else {
                    dispatch(command, tx.clone());
                }
            }

            if state.quitting {
                break;
            }
        }
        Ok::<(), CcboxError>(())
    }
    .await;

    disable_raw_mode().map_err(|e| CcboxError::Internal(e.to_string()))?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)
        .map_err(|e| CcboxError::Internal(e.to_string()))?;
    terminal.show_cursor().map_err(|e| CcboxError::Internal(e.to_string()))?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_vim_style_and_arrow_keys_to_the_same_action() {
        assert_eq!(map_key(KeyCode::Char('k')), Some(Key::Up));
        assert_eq!(map_key(KeyCode::Up), Some(Key::Up));
        assert_eq!(map_key(KeyCode::Char('j')), Some(Key::Down));
        assert_eq!(map_key(KeyCode::Down), Some(Key::Down));
    }

    #[test]
    fn maps_action_keys() {
        assert_eq!(map_key(KeyCode::Char('n')), Some(Key::New));
        assert_eq!(map_key(KeyCode::Char('s')), Some(Key::Stop));
        assert_eq!(map_key(KeyCode::Char('v')), Some(Key::Record));
        assert_eq!(map_key(KeyCode::Char('p')), Some(Key::Paste));
        assert_eq!(map_key(KeyCode::Enter), Some(Key::Enter));
    }
}
