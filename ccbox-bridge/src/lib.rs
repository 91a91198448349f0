//! Bridge controller (§4.H): an Elm-style reactive loop on the host that
//! lists running sandboxes, lets the user navigate their sessions, and
//! dispatches voice/clipboard/attach/stop actions against the selected
//! one.

pub mod controller;
pub mod message;
pub mod push;
pub mod render;
pub mod state;
pub mod update;

pub use controller::run_bridge;
pub use message::{Key, Msg};
pub use push::{build_paste_tar, push_payload};
pub use render::{draw, FrameCache, HeaderInfo};
pub use state::{flatten, BridgeState, ContainerInfo, FlatItem};
pub use update::{update, Command};
