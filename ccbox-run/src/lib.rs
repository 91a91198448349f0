//! Run assembly (§4.F): lowers platform facts, detected stack, merged
//! config, and resolved credentials into a [`ContainerSpec`] the engine
//! seam can act on directly, plus the side-channel lookups (git
//! credentials, terminal env) that feed it.

pub mod assemble;
pub mod credentials;
pub mod terminal_env;

pub use assemble::{build_container_spec, RunContext};
pub use credentials::{resolve_git_credentials, GitCredentials};
pub use terminal_env::terminal_passthrough_env;

/// A short random suffix for container names when more than one sandbox
/// for a project may run concurrently (§5); kept out of [`assemble`] so
/// that module stays free of any source of non-determinism.
pub fn generate_unique_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..6].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_suffix_is_six_hex_chars() {
        let suffix = generate_unique_suffix();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
