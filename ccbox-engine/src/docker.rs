//! CLI-shelling `ContainerEngine` implementation, grounded in the
//! teacher's `DockerProvider` (build via `tera`+`stream_docker_build`,
//! everything else via plain argv-building and `duct`) but retargeted at
//! the `docker` binary directly instead of a `VmConfig`-driven provider.

use crate::engine::{ContainerEngine, ExecOutput};
use crate::progress::DockerProgressParser;
use crate::types::{ContainerSpec, ContainerSummary, LogDriver, NetworkMode};
use ccbox_core::command_stream::{stream_command_with_progress, ProgressParser};
use ccbox_core::error::{CcboxError, Result};
use duct::cmd;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

pub struct DockerEngine;

impl DockerEngine {
    pub fn new() -> Self {
        Self
    }

    fn run_capture(&self, args: &[String]) -> Result<String> {
        debug!(?args, "docker");
        let output = cmd("docker", args)
            .stderr_to_stdout()
            .unchecked()
            .stdout_capture()
            .run()?;
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() {
            return Err(CcboxError::DaemonCommandFailed {
                command: format!("docker {}", args.join(" ")),
                stderr: text,
            });
        }
        Ok(text)
    }

    fn run_capture_allow_empty(&self, args: &[String]) -> Result<Option<String>> {
        match self.run_capture(args) {
            Ok(text) => Ok(Some(text)),
            Err(CcboxError::DaemonCommandFailed { stderr, .. })
                if stderr.contains("No such") || stderr.contains("no such") =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn spec_args(spec: &ContainerSpec) -> Vec<String> {
        let mut args = vec!["--name".to_string(), spec.name.clone()];

        for bind in &spec.binds {
            let ro = if bind.read_only { ":ro" } else { "" };
            args.push("-v".to_string());
            args.push(format!("{}:{}{}", bind.host_path, bind.container_path, ro));
        }
        for tmp in &spec.tmpfs {
            args.push("--tmpfs".to_string());
            args.push(format!(
                "{}:size={}m,mode={:o}",
                tmp.container_path,
                tmp.size_bytes / (1024 * 1024),
                tmp.mode
            ));
        }
        for (k, v) in &spec.env {
            args.push("-e".to_string());
            args.push(format!("{k}={v}"));
        }
        for (k, v) in &spec.labels {
            args.push("--label".to_string());
            args.push(format!("{k}={v}"));
        }
        for cap in &spec.cap_drop {
            args.push("--cap-drop".to_string());
            args.push(cap.clone());
        }
        for cap in &spec.cap_add {
            args.push("--cap-add".to_string());
            args.push(cap.clone());
        }
        if spec.privileged {
            args.push("--privileged".to_string());
        }
        for opt in &spec.security_opts {
            args.push("--security-opt".to_string());
            args.push(opt.clone());
        }
        if let Some(pids) = spec.limits.pids {
            args.push("--pids-limit".to_string());
            args.push(pids.to_string());
        }
        if let Some(mem) = &spec.limits.memory {
            args.push("--memory".to_string());
            args.push(mem.clone());
        }
        if let Some(cpus) = &spec.limits.cpus {
            args.push("--cpus".to_string());
            args.push(cpus.clone());
        }
        match &spec.network_mode {
            NetworkMode::Full => {}
            NetworkMode::Isolated | NetworkMode::IsolatedWithRuleset(_) => {
                // Egress restriction is applied by the entrypoint inside
                // the container (§4.F); the daemon still sees a normal
                // bridge network.
            }
        }
        match spec.log_options.driver {
            LogDriver::JsonFile => {
                args.push("--log-driver".to_string());
                args.push("json-file".to_string());
                args.push("--log-opt".to_string());
                args.push(format!("max-size={}m", spec.log_options.max_size_mb));
                args.push("--log-opt".to_string());
                args.push(format!("max-file={}", spec.log_options.max_files));
            }
            LogDriver::Tmpfs => {
                args.push("--log-driver".to_string());
                args.push("none".to_string());
            }
        }
        args.push("-w".to_string());
        args.push(spec.working_dir.clone());
        if spec.tty {
            args.push("-t".to_string());
        }
        if spec.stdin_open {
            args.push("-i".to_string());
        }
        args.push(spec.image.clone());
        args.extend(spec.entrypoint_args.clone());
        args
    }
}

impl Default for DockerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerEngine for DockerEngine {
    fn ping(&self) -> Result<()> {
        cmd("docker", ["info"])
            .stdout_capture()
            .stderr_capture()
            .run()
            .map(|_| ())
            .map_err(|e| CcboxError::DaemonUnavailable(e.to_string()))
    }

    fn image_build(
        &self,
        context_dir: &Path,
        dockerfile_path: &str,
        tags: &[String],
        build_args: &[(String, String)],
        labels: &[(String, String)],
        target: Option<&str>,
        no_cache: bool,
        parser: Option<Box<dyn ProgressParser>>,
    ) -> Result<()> {
        let mut args = vec![
            "build".to_string(),
            "-f".to_string(),
            dockerfile_path.to_string(),
        ];
        for tag in tags {
            args.push("-t".to_string());
            args.push(tag.clone());
        }
        for (k, v) in build_args {
            args.push("--build-arg".to_string());
            args.push(format!("{k}={v}"));
        }
        for (k, v) in labels {
            args.push("--label".to_string());
            args.push(format!("{k}={v}"));
        }
        if let Some(target) = target {
            args.push("--target".to_string());
            args.push(target.to_string());
        }
        if no_cache {
            args.push("--no-cache".to_string());
        }
        args.push(context_dir.display().to_string());

        let parser = parser.or_else(|| Some(Box::new(DockerProgressParser::new()) as Box<dyn ProgressParser>));
        stream_command_with_progress("docker", &args, parser, &[("DOCKER_BUILDKIT", "1")]).map_err(|e| {
            CcboxError::BuildFailed {
                stage: dockerfile_path.to_string(),
                reason: e.to_string(),
            }
        })
    }

    fn image_pull(&self, reference: &str) -> Result<()> {
        self.run_capture(&["pull".to_string(), reference.to_string()]).map(|_| ())
    }

    fn image_tag(&self, src: &str, dst: &str) -> Result<()> {
        self.run_capture(&["tag".to_string(), src.to_string(), dst.to_string()]).map(|_| ())
    }

    fn image_list(&self, name_filter: &str) -> Result<Vec<String>> {
        let out = self.run_capture(&[
            "images".to_string(),
            "--format".to_string(),
            "{{.Repository}}:{{.Tag}}".to_string(),
            "--filter".to_string(),
            format!("reference={name_filter}"),
        ])?;
        Ok(out.lines().filter(|l| !l.is_empty()).map(str::to_string).collect())
    }

    fn image_inspect(&self, reference: &str) -> Result<Option<serde_json::Value>> {
        let Some(out) = self.run_capture_allow_empty(&[
            "image".to_string(),
            "inspect".to_string(),
            reference.to_string(),
        ])?
        else {
            return Ok(None);
        };
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap_or_default();
        Ok(parsed.into_iter().next())
    }

    fn image_remove(&self, reference: &str, force: bool, prune_children: bool) -> Result<()> {
        let mut args = vec!["rmi".to_string()];
        if force {
            args.push("-f".to_string());
        }
        if !prune_children {
            args.push("--no-prune".to_string());
        }
        args.push(reference.to_string());
        self.run_capture(&args).map(|_| ())
    }

    fn container_create(&self, spec: &ContainerSpec) -> Result<String> {
        let mut args = vec!["create".to_string()];
        args.extend(Self::spec_args(spec));
        self.run_capture(&args)
    }

    fn container_start(&self, id: &str) -> Result<()> {
        self.run_capture(&["start".to_string(), id.to_string()]).map(|_| ())
    }

    fn container_wait(&self, id: &str) -> Result<i32> {
        let out = self.run_capture(&["wait".to_string(), id.to_string()])?;
        out.trim()
            .parse()
            .map_err(|_| CcboxError::Internal(format!("non-numeric exit status from `docker wait`: {out}")))
    }

    fn container_stop(&self, id: &str, grace_secs: u32) -> Result<()> {
        self.run_capture(&["stop".to_string(), "-t".to_string(), grace_secs.to_string(), id.to_string()]).map(|_| ())
    }

    fn container_remove(&self, id: &str, force: bool) -> Result<()> {
        let mut args = vec!["rm".to_string()];
        if force {
            args.push("-f".to_string());
        }
        args.push(id.to_string());
        self.run_capture(&args).map(|_| ())
    }

    fn container_list(&self, all: bool, label_filter: &str) -> Result<Vec<ContainerSummary>> {
        let mut args = vec![
            "ps".to_string(),
            "--format".to_string(),
            "{{.ID}}|{{.Names}}|{{.Image}}|{{.Status}}|{{.Labels}}".to_string(),
        ];
        if all {
            args.push("-a".to_string());
        }
        if !label_filter.is_empty() {
            args.push("--filter".to_string());
            args.push(format!("label={label_filter}"));
        }
        let out = self.run_capture(&args)?;
        Ok(out.lines().filter(|l| !l.is_empty()).map(parse_ps_line).collect())
    }

    fn container_inspect(&self, id: &str) -> Result<Option<serde_json::Value>> {
        let Some(out) = self.run_capture_allow_empty(&["inspect".to_string(), id.to_string()])? else {
            return Ok(None);
        };
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap_or_default();
        Ok(parsed.into_iter().next())
    }

    fn run_attached(&self, spec: &ContainerSpec) -> Result<i32> {
        let mut args = vec!["run".to_string(), "--rm".to_string()];
        args.extend(Self::spec_args(spec));
        debug!(?args, "docker run (attached)");
        let output = cmd("docker", args).unchecked().run()?;
        Ok(output.status.code().unwrap_or(-1))
    }

    fn exec(&self, id: &str, cmd_args: &[String]) -> Result<ExecOutput> {
        let mut args = vec!["exec".to_string(), id.to_string()];
        args.extend(cmd_args.iter().cloned());
        let output = cmd("docker", &args).stderr_to_stdout().unchecked().stdout_capture().run()?;
        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    fn copy_to_container(&self, id: &str, dest_path: &str, tar_bytes: &[u8]) -> Result<()> {
        let output = cmd(
            "docker",
            ["cp".to_string(), "-".to_string(), format!("{id}:{dest_path}")],
        )
            .stdin_bytes(tar_bytes.to_vec())
            .stderr_to_stdout()
            .unchecked()
            .stdout_capture()
            .run()?;
        if !output.status.success() {
            return Err(CcboxError::DaemonCommandFailed {
                command: format!("docker cp - {id}:{dest_path}"),
                stderr: String::from_utf8_lossy(&output.stdout).to_string(),
            });
        }
        Ok(())
    }

    fn volumes_prune(&self) -> Result<()> {
        self.run_capture(&["volume".to_string(), "prune".to_string(), "-f".to_string()]).map(|_| ())
    }

    fn build_cache_prune(&self) -> Result<()> {
        self.run_capture(&["builder".to_string(), "prune".to_string(), "-f".to_string(), "-a".to_string()]).map(|_| ())
    }
}

fn parse_ps_line(line: &str) -> ContainerSummary {
    let mut parts = line.splitn(5, '|');
    let id = parts.next().unwrap_or_default().to_string();
    let name = parts.next().unwrap_or_default().to_string();
    let image = parts.next().unwrap_or_default().to_string();
    let status = parts.next().unwrap_or_default().to_string();
    let labels_raw = parts.next().unwrap_or_default();
    let mut labels = HashMap::new();
    for kv in labels_raw.split(',') {
        if let Some((k, v)) = kv.split_once('=') {
            labels.insert(k.to_string(), v.to_string());
        }
    }
    if name.is_empty() {
        warn!(%id, "docker ps row had no container name");
    }
    ContainerSummary { id, name, image, status, labels }
}
