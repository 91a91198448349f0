//! The container engine client (§4.E): an interface, not an implementation.
//! [`ContainerEngine`] is the seam the rest of the system talks to; the
//! production implementation shells out to the `docker` CLI the way the
//! teacher's provider layer shells out to `docker`/`vagrant`/`tart`, and
//! [`MockEngine`] stands in for it in tests that don't want a real daemon.
//!
//! Also carries component J (cleanup & pruning) and the auto-start /
//! exit-code-interpretation helpers that sit right at the engine seam.

pub mod autostart;
pub mod cleanup;
pub mod docker;
pub mod engine;
pub mod exit_code;
pub mod mock;
pub mod progress;
pub mod types;

pub use cleanup::{prune_stale, remove_all, CleanupReport};
pub use docker::DockerEngine;
pub use engine::{ContainerEngine, ExecOutput};
pub use exit_code::{interpret_exit_code, ExitOutcome};
pub use mock::MockEngine;
pub use progress::DockerProgressParser;
pub use types::{
    BindMount, ContainerSpec, ContainerSummary, ImageRef, LogDriver, LogOptions, NetworkMode,
    ResourceLimits, TmpfsMount,
};
