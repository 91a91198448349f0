//! Wires detect → build → run-or-bridge per the control-flow summary
//! (§2): CLI flags become a config-overrides layer, that layer merges
//! with the global/project YAML, the merged config drives detection and
//! the build orchestrator, and the resulting image feeds the pure run
//! assembler. The assembled spec either runs attached in this terminal
//! or backs a container the bridge controller manages.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ccbox_build::BuildOrchestrator;
use ccbox_config::{CcboxConfig, ConfigLoader, DepsMode, NetworkPolicy};
use ccbox_core::error::{CcboxError, Result};
use ccbox_core::{ccbox_error, ccbox_progress, ccbox_success, ccbox_warning};
use ccbox_detector::{detect_dependencies, detect_stack, ProjectIdentity};
use ccbox_engine::cleanup::{prune_stale, remove_all, CleanupReport};
use ccbox_engine::docker::DockerEngine;
use ccbox_engine::engine::ContainerEngine;
use ccbox_engine::exit_code::{interpret_exit_code, ExitOutcome};
use ccbox_engine::{autostart, ImageRef};
use ccbox_pathmap::validate_project_path;
use ccbox_platform::{facts, spawn_in_new_terminal};
use ccbox_run::{build_container_spec, resolve_git_credentials, terminal_passthrough_env, RunContext};
use ccbox_session::{apply_dir_map, discover_sessions, is_healthy};
use tracing::{debug, info};

use crate::cli::{Args, Command};

const LABEL_FILTER: &str = "ccbox.managed=true";
const DAEMON_STARTUP_DEADLINE: Duration = Duration::from_secs(30);
const STOP_GRACE_SECS: u32 = 10;

/// Runs the CLI end to end, returning the process exit code.
pub async fn run(args: Args) -> Result<i32> {
    match args.command.clone().unwrap_or(Command::Run) {
        Command::Run => run_sandbox(&args).await,
        Command::Build => build_only(&args),
        Command::Stop { container } => stop(&args, container),
        Command::Clean { deep } => clean(deep),
        Command::Status => status(),
    }
}

fn project_dir(args: &Args) -> Result<PathBuf> {
    let dir = match &args.path {
        Some(p) => p.clone(),
        None => std::env::current_dir()?,
    };
    validate_project_path(&dir.to_string_lossy())?;
    Ok(dir.canonicalize()?)
}

/// Collapses every CLI flag into the merge layer, including the §9
/// open-question resolution: any of `--attach-mode | --no-bridge |
/// --build | --headless` disables the bridge.
fn cli_overrides(args: &Args) -> Result<CcboxConfig> {
    let mut cfg = CcboxConfig::default();

    if args.fresh {
        cfg.fresh = Some(true);
    }
    if args.unrestricted {
        cfg.unrestricted = Some(true);
    }
    if args.read_only {
        cfg.read_only = Some(true);
    }
    if args.zero_residue {
        cfg.zero_residue = Some(true);
    }
    if args.debug {
        cfg.debug = Some(true);
    }
    if args.attach_mode || args.no_bridge || args.build || args.headless {
        cfg.headless = Some(true);
    }
    if let Some(memory) = &args.memory {
        cfg.memory = Some(memory.clone());
    }
    if let Some(cpus) = &args.cpus {
        cfg.cpus = Some(cpus.clone());
    }
    if let Some(deps) = &args.deps {
        cfg.deps = Some(match deps.as_str() {
            "all" => DepsMode::All,
            "prod" => DepsMode::Prod,
            "skip" => DepsMode::Skip,
            other => {
                return Err(CcboxError::Config(format!(
                    "--deps must be one of all|prod|skip, got {other}"
                )))
            }
        });
    }
    if let Some(network) = &args.network {
        cfg.network_policy = Some(match network.as_str() {
            "full" => NetworkPolicy::Full,
            "isolated" => NetworkPolicy::Isolated,
            path => NetworkPolicy::Path(path.to_string()),
        });
    }

    Ok(cfg)
}

fn merged_config(args: &Args, dir: &std::path::Path) -> Result<CcboxConfig> {
    ConfigLoader::load(dir, cli_overrides(args)?)
}

/// Resolves the stack/deps and runs base→stack→project image assembly.
/// `DepsMode::Skip` passes an empty dependency-file set into the
/// orchestrator rather than a separate code path — the project layer
/// still exists (so its cache key/parent chain stay uniform) but its
/// Dockerfile has nothing to install.
fn ensure_image(
    engine: &dyn ContainerEngine,
    config: &CcboxConfig,
    identity: &ProjectIdentity,
    dir: &std::path::Path,
) -> Result<(ImageRef, ccbox_detector::Stack)> {
    let detection = detect_stack(dir);
    let stack = config.stack.unwrap_or(detection.recommended_stack);

    let deps_mode = config.deps.unwrap_or(DepsMode::All);
    let deps = if deps_mode == DepsMode::Skip {
        Vec::new()
    } else {
        detect_dependencies(dir)
    };
    let install_all = deps_mode == DepsMode::All;

    let build_root = ccbox_config::paths::temp_root().join("build");
    let orchestrator = BuildOrchestrator::new(engine, build_root);
    ccbox_progress!("Building image for stack {}", stack.as_str());
    let image = orchestrator.prepare(
        stack,
        identity,
        dir,
        &deps,
        install_all,
        config.fresh.unwrap_or(false),
    )?;
    Ok((image, stack))
}

fn unix_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

async fn run_sandbox(args: &Args) -> Result<i32> {
    let dir = project_dir(args)?;
    let identity = ProjectIdentity::from_path(&dir);
    let config = merged_config(args, &dir)?;
    info!(project = %identity.sanitized_name, "preparing sandbox run");

    let engine = DockerEngine::new();
    autostart::ensure_running(&engine, facts().kind, DAEMON_STARTUP_DEADLINE)?;

    let (image, stack) = ensure_image(&engine, &config, &identity, &dir)?;
    debug!(image = %image.name, stack = stack.as_str(), "image ready");

    let credentials = resolve_git_credentials();
    let terminal_env = terminal_passthrough_env();
    let claude_home = ccbox_config::paths::claude_home()
        .ok_or_else(|| CcboxError::Config("could not resolve a home directory".into()))?
        .to_string_lossy()
        .into_owned();
    let temp_root = ccbox_config::paths::temp_root().to_string_lossy().into_owned();

    let ctx = RunContext {
        image: &image.name,
        platform: facts(),
        stack,
        identity: &identity,
        claude_home: &claude_home,
        temp_root: &temp_root,
        config: &config,
        credentials: &credentials,
        terminal_env: &terminal_env,
        uid: u32::from(nix::unistd::getuid()),
        gid: u32::from(nix::unistd::getgid()),
        unique_suffix: None,
    };
    let spec = build_container_spec(&ctx);

    if config.bridge_disabled() {
        let code = engine.run_attached(&spec)?;
        return Ok(exit_code_for(interpret_exit_code(code)));
    }

    let container_id = engine.container_create(&spec)?;
    engine.container_start(&container_id)?;
    ccbox_success!("Started {} ({})", spec.name, container_id);

    if let Some((_, dir_map)) = spec.env.iter().find(|(k, _)| k == "CCBOX_DIR_MAP") {
        for error in apply_dir_map(&engine, &container_id, dir_map) {
            ccbox_warning!("shadow-session merge failed: {}", error);
        }
    }

    crate::bridge_run::enter(dir.to_string_lossy().into_owned(), forwarded_args(args)).await?;
    Ok(0)
}

/// The flags a bridge-spawned new container should reuse, per §4.H's
/// "using the same ccbox args". Only the stable, repeatable subset is
/// forwarded — `--path` is re-derived by the spawned process itself.
fn forwarded_args(args: &Args) -> Vec<String> {
    let mut out = Vec::new();
    if args.fresh {
        out.push("--fresh".to_string());
    }
    if args.unrestricted {
        out.push("--unrestricted".to_string());
    }
    if args.read_only {
        out.push("--read-only".to_string());
    }
    if let Some(network) = &args.network {
        out.push("--network".to_string());
        out.push(network.clone());
    }
    if let Some(memory) = &args.memory {
        out.push("--memory".to_string());
        out.push(memory.clone());
    }
    if let Some(cpus) = &args.cpus {
        out.push("--cpus".to_string());
        out.push(cpus.clone());
    }
    out
}

fn exit_code_for(outcome: ExitOutcome) -> i32 {
    match outcome {
        ExitOutcome::Exited(0) => 0,
        ExitOutcome::Exited(code) => code,
        ExitOutcome::UserInterrupt => 0,
        ExitOutcome::KilledOomOrExternal => 137,
        ExitOutcome::SegmentationFault => 139,
        ExitOutcome::TerminatedBySignal => 143,
    }
}

fn build_only(args: &Args) -> Result<i32> {
    let dir = project_dir(args)?;
    let identity = ProjectIdentity::from_path(&dir);
    let config = merged_config(args, &dir)?;

    let engine = DockerEngine::new();
    autostart::ensure_running(&engine, facts().kind, DAEMON_STARTUP_DEADLINE)?;
    let (image, _stack) = ensure_image(&engine, &config, &identity, &dir)?;
    ccbox_success!("Built {}", image.name);
    Ok(0)
}

fn stop(args: &Args, container: Option<String>) -> Result<i32> {
    let engine = DockerEngine::new();
    let target = match container {
        Some(c) => c,
        None => {
            let dir = project_dir(args)?;
            let identity = ProjectIdentity::from_path(&dir);
            format!("ccbox_{}", identity.sanitized_name)
        }
    };
    engine.container_stop(&target, STOP_GRACE_SECS)?;
    engine.container_remove(&target, false)?;
    ccbox_success!("Stopped {}", target);
    Ok(0)
}

fn report_cleanup(report: &CleanupReport) {
    for error in &report.errors {
        ccbox_warning!("{}", error);
    }
    if report.is_clean() {
        ccbox_success!("Cleanup complete");
    } else {
        ccbox_error!("Cleanup finished with {} error(s)", report.errors.len());
    }
}

fn clean(deep: bool) -> Result<i32> {
    let engine = DockerEngine::new();
    let report = if deep {
        remove_all(&engine, LABEL_FILTER, true)
    } else {
        prune_stale(&engine, LABEL_FILTER)
    };
    report_cleanup(&report);
    Ok(if report.is_clean() { 0 } else { 1 })
}

fn status() -> Result<i32> {
    let engine = DockerEngine::new();
    let containers = engine.container_list(false, LABEL_FILTER)?;
    if containers.is_empty() {
        ccbox_progress!("No sandboxes running");
        return Ok(0);
    }
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64;
    for summary in &containers {
        let healthy = is_healthy(&engine, &summary.id).unwrap_or(false);
        let sessions = discover_sessions(&engine, &summary.id, now).unwrap_or_default();
        let project = summary.labels.get("ccbox.project").cloned().unwrap_or_default();
        let stack = summary.labels.get("ccbox.stack").cloned().unwrap_or_default();
        ccbox_progress!(
            "{}  {}  project={} stack={} healthy={} sessions={}",
            summary.name,
            summary.status,
            project,
            stack,
            healthy,
            sessions.len()
        );
    }
    Ok(0)
}

/// Spawns `ccbox_args` attached in a new terminal window (§4.H "n").
pub fn spawn_new_container(ccbox_args: &[String]) -> Result<()> {
    let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("ccbox"));
    let command_line = std::iter::once(exe.to_string_lossy().into_owned())
        .chain(ccbox_args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");
    spawn_in_new_terminal(facts().kind, &command_line)
}

/// Opens an interactive shell onto `container_id` in a new terminal
/// window (§4.H "Enter").
pub fn attach_shell(container_id: &str) -> Result<()> {
    let command_line = format!("docker exec -it {container_id} bash");
    spawn_in_new_terminal(facts().kind, &command_line)
}

pub fn engine_handle() -> Arc<dyn ContainerEngine> {
    Arc::new(DockerEngine::new())
}

pub fn push_ext(is_image: bool) -> &'static str {
    if is_image {
        "png"
    } else {
        "txt"
    }
}

pub fn now_unix_millis() -> u128 {
    unix_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("ccbox").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn attach_mode_no_bridge_build_and_headless_all_collapse_to_headless() {
        for flag in ["--attach-mode", "--no-bridge", "--build", "--headless"] {
            let cfg = cli_overrides(&parse(&[flag])).unwrap();
            assert_eq!(cfg.headless, Some(true), "flag {flag} should set headless");
        }
        let cfg = cli_overrides(&parse(&["--fresh"])).unwrap();
        assert_eq!(cfg.headless, None);
    }

    #[test]
    fn deps_mode_strings_map_to_the_enum() {
        assert_eq!(cli_overrides(&parse(&["--deps", "all"])).unwrap().deps, Some(DepsMode::All));
        assert_eq!(cli_overrides(&parse(&["--deps", "prod"])).unwrap().deps, Some(DepsMode::Prod));
        assert_eq!(cli_overrides(&parse(&["--deps", "skip"])).unwrap().deps, Some(DepsMode::Skip));
        assert!(cli_overrides(&parse(&["--deps", "nonsense"])).is_err());
    }

    #[test]
    fn network_policy_accepts_keywords_and_falls_back_to_a_path() {
        let cfg = cli_overrides(&parse(&["--network", "full"])).unwrap();
        assert_eq!(cfg.network_policy, Some(NetworkPolicy::Full));
        let cfg = cli_overrides(&parse(&["--network", "isolated"])).unwrap();
        assert_eq!(cfg.network_policy, Some(NetworkPolicy::Isolated));
        let cfg = cli_overrides(&parse(&["--network", "./rules.json"])).unwrap();
        assert_eq!(cfg.network_policy, Some(NetworkPolicy::Path("./rules.json".to_string())));
    }

    #[test]
    fn exit_code_for_passes_through_known_codes_and_clamps_user_interrupt() {
        assert_eq!(exit_code_for(ExitOutcome::Exited(0)), 0);
        assert_eq!(exit_code_for(ExitOutcome::Exited(42)), 42);
        assert_eq!(exit_code_for(ExitOutcome::UserInterrupt), 0);
        assert_eq!(exit_code_for(ExitOutcome::KilledOomOrExternal), 137);
        assert_eq!(exit_code_for(ExitOutcome::SegmentationFault), 139);
        assert_eq!(exit_code_for(ExitOutcome::TerminatedBySignal), 143);
    }

    #[test]
    fn forwarded_args_round_trips_the_stable_subset_but_not_path_or_debug() {
        let args = parse(&["--fresh", "--network", "isolated", "--path", "/tmp/proj", "--debug"]);
        let forwarded = forwarded_args(&args);
        assert_eq!(forwarded, vec!["--fresh", "--network", "isolated"]);
    }
}
