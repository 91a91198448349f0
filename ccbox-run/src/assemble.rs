//! Pure run-spec assembly (§4.F). Builds a [`ContainerSpec`] directly —
//! the spec's `RunSpec` and the engine's create-time config are the same
//! data, so no separate type sits between them (§9). Everything here is
//! a function of its inputs: no env reads, no subprocess calls, no
//! filesystem access, so a fixed `(platform, stack, config)` triple
//! always produces the same spec (§8's "pure RunSpec" property).

use ccbox_config::{CcboxConfig, NetworkPolicy};
use ccbox_detector::{ProjectIdentity, Stack};
use ccbox_engine::types::{
    BindMount, ContainerSpec, LogOptions, NetworkMode, ResourceLimits, TmpfsMount,
};
use ccbox_pathmap::{canonicalize, host_to_docker_mount_form, PathMap};
use ccbox_platform::PlatformFacts;
use std::collections::HashMap;

use crate::credentials::GitCredentials;

const DEFAULT_PIDS_LIMIT: u32 = 2048;
const DEFAULT_MEMORY: &str = "4g";
const DEFAULT_CPUS: &str = "2.0";

/// Everything the assembler needs to produce a [`ContainerSpec`]; every
/// field is a value already resolved elsewhere (detection, config merge,
/// credential lookup), so this function itself touches nothing external.
pub struct RunContext<'a> {
    pub image: &'a str,
    pub platform: &'a PlatformFacts,
    pub stack: Stack,
    pub identity: &'a ProjectIdentity,
    pub claude_home: &'a str,
    pub temp_root: &'a str,
    pub config: &'a CcboxConfig,
    pub credentials: &'a GitCredentials,
    pub terminal_env: &'a [(String, String)],
    pub uid: u32,
    pub gid: u32,
    /// Appended to the container name when more than one sandbox for the
    /// same project may run concurrently (§5).
    pub unique_suffix: Option<&'a str>,
}

fn container_name(ctx: &RunContext) -> String {
    match ctx.unique_suffix {
        Some(suffix) => format!("ccbox_{}_{}", ctx.identity.sanitized_name, suffix),
        None => format!("ccbox_{}", ctx.identity.sanitized_name),
    }
}

fn project_container_path(ctx: &RunContext) -> String {
    format!("/ccbox/{}", ctx.identity.sanitized_name)
}

fn base_binds(ctx: &RunContext, working_dir: &str) -> Vec<BindMount> {
    vec![
        BindMount {
            host_path: host_to_docker_mount_form(&ctx.identity.absolute_host_path),
            container_path: working_dir.to_string(),
            read_only: ctx.config.read_only.unwrap_or(false),
        },
        BindMount {
            host_path: host_to_docker_mount_form(ctx.claude_home),
            container_path: "/ccbox/.claude".to_string(),
            read_only: false,
        },
        BindMount {
            host_path: host_to_docker_mount_form(ctx.temp_root),
            container_path: "/tmp/ccbox".to_string(),
            read_only: false,
        },
    ]
}

/// The four fixed tmpfs mounts (§4.F), sizes and modes independent of
/// any config.
fn tmpfs_mounts() -> Vec<TmpfsMount> {
    vec![
        TmpfsMount {
            container_path: "/tmp",
            size_bytes: 512 * 1024 * 1024,
            mode: 0o1777,
        },
        TmpfsMount {
            container_path: "/var/tmp",
            size_bytes: 256 * 1024 * 1024,
            mode: 0o1777,
        },
        TmpfsMount {
            container_path: "/run",
            size_bytes: 64 * 1024 * 1024,
            mode: 0o755,
        },
        TmpfsMount {
            container_path: "/dev/shm",
            size_bytes: 256 * 1024 * 1024,
            mode: 0o1777,
        },
    ]
}

fn resource_limits(config: &CcboxConfig) -> ResourceLimits {
    if config.unrestricted.unwrap_or(false) {
        return ResourceLimits::default();
    }
    ResourceLimits {
        pids: Some(DEFAULT_PIDS_LIMIT),
        memory: Some(config.memory.clone().unwrap_or_else(|| DEFAULT_MEMORY.to_string())),
        cpus: Some(config.cpus.clone().unwrap_or_else(|| DEFAULT_CPUS.to_string())),
    }
}

fn network_mode(config: &CcboxConfig) -> NetworkMode {
    match &config.network_policy {
        None | Some(NetworkPolicy::Full) => NetworkMode::Full,
        Some(NetworkPolicy::Isolated) => NetworkMode::Isolated,
        Some(NetworkPolicy::Path(path)) => NetworkMode::IsolatedWithRuleset(path.clone()),
    }
}

fn network_policy_env_value(mode: &NetworkMode) -> String {
    match mode {
        NetworkMode::Full => "full".to_string(),
        NetworkMode::Isolated => "isolated".to_string(),
        NetworkMode::IsolatedWithRuleset(path) => path.clone(),
    }
}

/// `--cap-drop=ALL` plus a narrow add-set; `SYS_ADMIN` only joins the
/// add-set when FUSE is needed and the host doesn't already require
/// `--privileged` to get it (§4.F).
fn capability_policy(platform: &PlatformFacts) -> (Vec<String>, Vec<String>, bool) {
    let cap_drop = vec!["ALL".to_string()];
    let mut cap_add = vec!["SETUID".to_string(), "SETGID".to_string(), "CHOWN".to_string()];
    if platform.needs_fuse && !platform.needs_privileged_for_fuse {
        cap_add.push("SYS_ADMIN".to_string());
    }
    (cap_drop, cap_add, platform.needs_privileged_for_fuse)
}

/// Entries pair the canonicalised raw host path with the fixed
/// container-internal destination it's actually bound to (e.g.
/// `/ccbox/myproj`), not with `ccbox_pathmap::host_to_container`'s
/// drive-letter-mirrored form (e.g. `/D/GitHub/myproj`). §3's PathMap
/// example shows the latter, but the FUSE overlay rewrites path strings
/// found in file *contents* so they resolve inside the container — and
/// nothing inside the container lives at the drive-mirrored path, only at
/// the real bind destination. `host_to_container`/`host_to_docker_mount_form`
/// are the §4.B translator's standalone pure transforms; this pairing is
/// the one the running container's mounts and `CCBOX_PATH_MAP` actually
/// need (§9 open question, resolved here).
fn path_map(ctx: &RunContext, working_dir: &str) -> PathMap {
    if !ctx.platform.needs_path_translation {
        return PathMap::from_pairs(std::iter::empty());
    }
    PathMap::from_pairs([
        (canonicalize(&ctx.identity.absolute_host_path), working_dir.to_string()),
        (canonicalize(ctx.claude_home), "/ccbox/.claude".to_string()),
        (canonicalize(ctx.temp_root), "/tmp/ccbox".to_string()),
    ])
}

fn bool_flag(v: Option<bool>) -> String {
    if v.unwrap_or(false) {
        "1".to_string()
    } else {
        "0".to_string()
    }
}

/// Assembles the full container invocation for a run (§4.F). Pure: the
/// same `ctx` always yields the same [`ContainerSpec`].
pub fn build_container_spec(ctx: &RunContext) -> ContainerSpec {
    let working_dir = project_container_path(ctx);
    let name = container_name(ctx);
    let binds = base_binds(ctx, &working_dir);
    let tmpfs = tmpfs_mounts();
    let limits = resource_limits(ctx.config);
    let mode = network_mode(ctx.config);
    let (cap_drop, cap_add, privileged) = capability_policy(ctx.platform);
    let pmap = path_map(ctx, &working_dir);

    let mut env: Vec<(String, String)> = vec![
        ("CCBOX_UID".to_string(), ctx.uid.to_string()),
        ("CCBOX_GID".to_string(), ctx.gid.to_string()),
        ("CCBOX_DEBUG".to_string(), bool_flag(ctx.config.debug)),
        ("CCBOX_UNRESTRICTED".to_string(), bool_flag(ctx.config.unrestricted)),
        ("CCBOX_ZERO_RESIDUE".to_string(), bool_flag(ctx.config.zero_residue)),
    ];
    if let Some(pids) = limits.pids {
        env.push(("CCBOX_PIDS_LIMIT".to_string(), pids.to_string()));
    }
    env.push(("CCBOX_TMP_SIZE".to_string(), (512 * 1024 * 1024u64).to_string()));
    env.push(("CCBOX_SHM_SIZE".to_string(), (256 * 1024 * 1024u64).to_string()));
    if let Some(memory) = &limits.memory {
        env.push(("CCBOX_MEMORY_LIMIT".to_string(), memory.clone()));
    }
    if let Some(cpus) = &limits.cpus {
        env.push(("CCBOX_CPU_LIMIT".to_string(), cpus.clone()));
    }
    env.push(("CCBOX_NETWORK_POLICY".to_string(), network_policy_env_value(&mode)));

    if !pmap.is_empty() {
        env.push(("CCBOX_PATH_MAP".to_string(), pmap.to_env_string()));
        env.push(("CCBOX_DIR_MAP".to_string(), pmap.to_dir_map_string()));
        if ctx.platform.kind.is_windows_like() {
            env.push((
                "CCBOX_WIN_ORIGINAL_PATH".to_string(),
                ctx.identity.absolute_host_path.clone(),
            ));
        }
    }

    if let Some(token) = &ctx.credentials.token {
        env.push(("GITHUB_TOKEN".to_string(), token.clone()));
    }
    if let Some(name) = &ctx.credentials.user_name {
        env.push(("GIT_AUTHOR_NAME".to_string(), name.clone()));
        env.push(("GIT_COMMITTER_NAME".to_string(), name.clone()));
    }
    if let Some(email) = &ctx.credentials.user_email {
        env.push(("GIT_AUTHOR_EMAIL".to_string(), email.clone()));
        env.push(("GIT_COMMITTER_EMAIL".to_string(), email.clone()));
    }

    env.extend(ctx.terminal_env.iter().cloned());
    env.extend(ctx.config.env.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut labels = HashMap::new();
    labels.insert("ccbox.managed".to_string(), "true".to_string());
    labels.insert("ccbox.project".to_string(), ctx.identity.sanitized_name.clone());
    labels.insert("ccbox.stack".to_string(), ctx.stack.as_str().to_string());

    ContainerSpec {
        image: ctx.image.to_string(),
        name,
        binds,
        tmpfs,
        env,
        labels,
        cap_drop,
        cap_add,
        privileged,
        security_opts: vec!["no-new-privileges".to_string()],
        limits,
        network_mode: mode,
        log_options: LogOptions::default(),
        working_dir,
        tty: true,
        stdin_open: true,
        entrypoint_args: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccbox_platform::{ClipboardCommands, DockerEndpoint, HostKind};

    fn linux_platform() -> PlatformFacts {
        PlatformFacts {
            kind: HostKind::Linux,
            needs_fuse: false,
            needs_privileged_for_fuse: false,
            needs_path_translation: false,
            docker_endpoint: DockerEndpoint::UnixSocket("/var/run/docker.sock".to_string()),
            clipboard: ClipboardCommands::for_host(HostKind::Linux),
            audio_input_format: "alsa",
        }
    }

    fn wsl_platform() -> PlatformFacts {
        PlatformFacts {
            kind: HostKind::WindowsWsl,
            needs_fuse: true,
            needs_privileged_for_fuse: false,
            needs_path_translation: true,
            docker_endpoint: DockerEndpoint::UnixSocket("/var/run/docker.sock".to_string()),
            clipboard: ClipboardCommands::for_host(HostKind::WindowsWsl),
            audio_input_format: "alsa",
        }
    }

    fn identity() -> ProjectIdentity {
        ProjectIdentity {
            absolute_host_path: "/home/user/myproj".to_string(),
            display_name: "myproj".to_string(),
            sanitized_name: "myproj".to_string(),
        }
    }

    #[test]
    fn linux_run_has_no_path_translation_env() {
        let platform = linux_platform();
        let identity = identity();
        let config = CcboxConfig::default();
        let creds = GitCredentials::default();
        let ctx = RunContext {
            image: "ccbox_myproj_python_abc123:latest",
            platform: &platform,
            stack: Stack::Python,
            identity: &identity,
            claude_home: "/home/user/.claude",
            temp_root: "/home/user/.ccbox/tmp",
            config: &config,
            credentials: &creds,
            terminal_env: &[],
            uid: 1000,
            gid: 1000,
            unique_suffix: None,
        };

        let spec = build_container_spec(&ctx);
        assert_eq!(spec.name, "ccbox_myproj");
        assert_eq!(spec.working_dir, "/ccbox/myproj");
        assert!(!spec.env.iter().any(|(k, _)| k == "CCBOX_PATH_MAP"));
        assert!(!spec.privileged);
        assert_eq!(spec.cap_add, vec!["SETUID", "SETGID", "CHOWN"]);
        assert_eq!(spec.limits.pids, Some(2048));
        assert_eq!(spec.limits.memory.as_deref(), Some("4g"));
        assert!(matches!(spec.network_mode, NetworkMode::Full));
    }

    #[test]
    fn wsl_run_populates_path_and_dir_maps() {
        let platform = wsl_platform();
        let identity = identity();
        let config = CcboxConfig::default();
        let creds = GitCredentials::default();
        let ctx = RunContext {
            image: "ccbox_myproj_python_abc123:latest",
            platform: &platform,
            stack: Stack::Python,
            identity: &identity,
            claude_home: "/home/user/.claude",
            temp_root: "/home/user/.ccbox/tmp",
            config: &config,
            credentials: &creds,
            terminal_env: &[],
            uid: 1000,
            gid: 1000,
            unique_suffix: None,
        };

        let spec = build_container_spec(&ctx);
        assert!(spec.env.iter().any(|(k, _)| k == "CCBOX_PATH_MAP"));
        assert!(spec.env.iter().any(|(k, _)| k == "CCBOX_DIR_MAP"));
        assert!(spec.cap_add.contains(&"SYS_ADMIN".to_string()));
    }

    #[test]
    fn unrestricted_drops_all_limits() {
        let platform = linux_platform();
        let identity = identity();
        let mut config = CcboxConfig::default();
        config.unrestricted = Some(true);
        let creds = GitCredentials::default();
        let ctx = RunContext {
            image: "ccbox_myproj_python_abc123:latest",
            platform: &platform,
            stack: Stack::Python,
            identity: &identity,
            claude_home: "/home/user/.claude",
            temp_root: "/home/user/.ccbox/tmp",
            config: &config,
            credentials: &creds,
            terminal_env: &[],
            uid: 1000,
            gid: 1000,
            unique_suffix: None,
        };

        let spec = build_container_spec(&ctx);
        assert_eq!(spec.limits, ResourceLimits::default());
        assert!(!spec.env.iter().any(|(k, _)| k == "CCBOX_PIDS_LIMIT"));
    }

    #[test]
    fn credentials_populate_git_identity_env() {
        let platform = linux_platform();
        let identity = identity();
        let config = CcboxConfig::default();
        let creds = GitCredentials {
            token: Some("tok".to_string()),
            user_name: Some("Ada".to_string()),
            user_email: Some("ada@example.com".to_string()),
        };
        let ctx = RunContext {
            image: "ccbox_myproj_python_abc123:latest",
            platform: &platform,
            stack: Stack::Python,
            identity: &identity,
            claude_home: "/home/user/.claude",
            temp_root: "/home/user/.ccbox/tmp",
            config: &config,
            credentials: &creds,
            terminal_env: &[],
            uid: 1000,
            gid: 1000,
            unique_suffix: None,
        };

        let spec = build_container_spec(&ctx);
        assert!(spec
            .env
            .contains(&("GITHUB_TOKEN".to_string(), "tok".to_string())));
        assert!(spec
            .env
            .contains(&("GIT_AUTHOR_NAME".to_string(), "Ada".to_string())));
    }

    #[test]
    fn no_new_privileges_is_always_applied() {
        let platform = linux_platform();
        let identity = identity();
        let config = CcboxConfig::default();
        let creds = GitCredentials::default();
        let ctx = RunContext {
            image: "ccbox_myproj_python_abc123:latest",
            platform: &platform,
            stack: Stack::Python,
            identity: &identity,
            claude_home: "/home/user/.claude",
            temp_root: "/home/user/.ccbox/tmp",
            config: &config,
            credentials: &creds,
            terminal_env: &[],
            uid: 1000,
            gid: 1000,
            unique_suffix: None,
        };

        let spec = build_container_spec(&ctx);
        assert_eq!(spec.security_opts, vec!["no-new-privileges".to_string()]);
    }

    #[test]
    fn unique_suffix_appends_to_container_name() {
        let platform = linux_platform();
        let identity = identity();
        let config = CcboxConfig::default();
        let creds = GitCredentials::default();
        let ctx = RunContext {
            image: "ccbox_myproj_python_abc123:latest",
            platform: &platform,
            stack: Stack::Python,
            identity: &identity,
            claude_home: "/home/user/.claude",
            temp_root: "/home/user/.ccbox/tmp",
            config: &config,
            credentials: &creds,
            terminal_env: &[],
            uid: 1000,
            gid: 1000,
            unique_suffix: Some("a1b2c3"),
        };

        let spec = build_container_spec(&ctx);
        assert_eq!(spec.name, "ccbox_myproj_a1b2c3");
    }
}
