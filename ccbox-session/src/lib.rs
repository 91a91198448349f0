//! Session discovery, shadow-directory reconciliation, and health
//! probing (§4.G): everything the bridge controller needs to rebuild its
//! per-container view on each refresh tick.

pub mod discover;
pub mod health;
pub mod shadow;

pub use discover::{discover_sessions, Session};
pub use health::is_healthy;
pub use shadow::{apply_dir_map, parse_dir_map, plan_merge, DirMapPair, ShadowAction};
