//! Foundational building blocks shared across the `ccbox` workspace:
//! error taxonomy, themed user-output macros, tracing setup, a small
//! command-streaming helper, and filesystem probes used by the detector
//! and path translator.

pub mod command_stream;
pub mod error;
pub mod file_system;
pub mod output_macros;
pub mod tracing_init;
