//! Dockerfile generation (§4.D), grounded in the teacher's
//! `tera`-templated resource rendering (`prepare_build_context`) but
//! retargeted at the three-layer base/stack/project image graph.

use ccbox_detector::{DepsInfo, Stack};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tera::{Context, Tera};

const BASE_TEMPLATE: &str = include_str!("templates/base.Dockerfile.tera");
const STACK_TEMPLATE: &str = include_str!("templates/stack.Dockerfile.tera");
const PROJECT_TEMPLATE: &str = include_str!("templates/project.Dockerfile.tera");

/// Primary binaries whose absence is tolerated at build time: a
/// dependency file for a language not actually present in this stack
/// degrades to a no-op rather than failing the whole build (§4.D).
const OPTIONAL_RUNTIME_BINS: &[&str] = &[
    "python3", "pip", "poetry", "pdm", "uv", "npm", "npx", "pnpm", "bun", "yarn", "go", "cargo",
    "dotnet", "mvn", "gradle",
];

/// apt packages each stack's image layers in on top of the base image.
/// Not spelled out in SPEC_FULL.md beyond "install the stack's
/// toolchain"; this table is this crate's own judgment call, grounded on
/// each stack's documented `description`/`image_name` in
/// `ccbox-detector::STACK_TABLE`.
static STACK_PACKAGES: Lazy<HashMap<Stack, &'static [&'static str]>> = Lazy::new(|| {
    use Stack::*;
    let mut m: HashMap<Stack, &'static [&'static str]> = HashMap::new();
    m.insert(Python, &["python3", "python3-pip", "python3-venv", "pipx"]);
    m.insert(Web, &["nodejs", "npm"]);
    m.insert(Go, &["golang-go"]);
    m.insert(Rust, &["rustc", "cargo"]);
    m.insert(Java, &["openjdk-21-jdk", "maven"]);
    m.insert(Jvm, &["openjdk-21-jdk", "maven", "gradle"]);
    m.insert(Cpp, &["build-essential", "cmake", "gdb"]);
    m.insert(Dotnet, &["dotnet-sdk-8.0"]);
    m.insert(Swift, &["swift"]);
    m.insert(Dart, &["dart"]);
    m.insert(Lua, &["lua5.4", "luarocks"]);
    m.insert(Functional, &["ghc", "cabal-install"]);
    m.insert(Scripting, &["ruby-full"]);
    m.insert(Systems, &["build-essential", "clang"]);
    m.insert(Data, &["r-base"]);
    m.insert(Ai, &["python3", "python3-pip"]);
    m.insert(Mobile, &["openjdk-21-jdk"]);
    m.insert(Game, &["build-essential"]);
    m
});

fn tera() -> Tera {
    let mut tera = Tera::default();
    tera.add_raw_template("base", BASE_TEMPLATE).expect("valid base template");
    tera.add_raw_template("stack", STACK_TEMPLATE).expect("valid stack template");
    tera.add_raw_template("project", PROJECT_TEMPLATE).expect("valid project template");
    tera
}

pub fn render_base_dockerfile() -> String {
    tera().render("base", &Context::new()).expect("base template has no unbound variables")
}

/// `parent_image` is either the base image's tag or an externally
/// declared parent per the stack→parent table.
pub fn render_stack_dockerfile(stack: Stack, parent_image: &str) -> String {
    let packages = STACK_PACKAGES.get(&stack).copied().unwrap_or(&[]);
    let install_lines: Vec<String> = if packages.is_empty() {
        Vec::new()
    } else {
        vec![format!(
            "RUN --mount=type=cache,target=/var/cache/apt,sharing=locked \\\n    --mount=type=cache,target=/var/lib/apt,sharing=locked \\\n    apt-get update && apt-get install -y --no-install-recommends {}",
            packages.join(" ")
        )]
    };

    let mut ctx = Context::new();
    ctx.insert("parent_image", parent_image);
    ctx.insert("install_lines", &install_lines);
    tera().render("stack", &ctx).expect("stack template has no unbound variables")
}

/// If `command`'s primary binary is in the optional-runtime set, wraps
/// it so a missing tool degrades to a skip message instead of failing
/// the build.
pub fn wrap_optional_command(command: &str) -> String {
    let primary = command.split_whitespace().next().unwrap_or("");
    if OPTIONAL_RUNTIME_BINS.contains(&primary) {
        format!(
            "which {primary} >/dev/null 2>&1 && {command} || echo \"Skipping {primary} (not in stack)\""
        )
    } else {
        command.to_string()
    }
}

/// The on-disk package cache directory each dependency manager reuses
/// across installs, so the generated `RUN` line can mount it with
/// `--mount=type=cache` instead of re-downloading every build.
fn cache_mount_target(primary_bin: &str) -> Option<&'static str> {
    match primary_bin {
        "pip" | "pip3" => Some("/root/.cache/pip"),
        "poetry" => Some("/root/.cache/pypoetry"),
        "pdm" => Some("/root/.cache/pdm"),
        "uv" => Some("/root/.cache/uv"),
        "npm" => Some("/root/.npm"),
        "pnpm" => Some("/root/.local/share/pnpm/store"),
        "yarn" => Some("/usr/local/share/.cache/yarn"),
        "bun" => Some("/root/.bun/install/cache"),
        "go" => Some("/root/go/pkg/mod"),
        "cargo" => Some("/root/.cargo/registry"),
        "mvn" => Some("/root/.m2"),
        "gradle" => Some("/root/.gradle"),
        _ => None,
    }
}

/// Renders a full `RUN` line for one install command, adding a
/// `--mount=type=cache` for the dependency manager's cache directory
/// when one is known (§6).
fn render_install_line(command: &str) -> String {
    let primary = command.split_whitespace().next().unwrap_or("");
    let wrapped = wrap_optional_command(command);
    match cache_mount_target(primary) {
        Some(target) => format!("RUN --mount=type=cache,target={target},sharing=locked {wrapped}"),
        None => format!("RUN {wrapped}"),
    }
}

/// Renders the project layer's Dockerfile: `COPY` every dependency file
/// that actually exists on disk, then one `RUN` per install command
/// (deduplicated, in detected-manager order), each wrapped per
/// [`wrap_optional_command`] and cache-mounted per [`cache_mount_target`].
pub fn render_project_dockerfile(stack_image: &str, deps: &[DepsInfo], install_all: bool) -> String {
    let mut dependency_files: Vec<String> = Vec::new();
    let mut install_lines: Vec<String> = Vec::new();

    for dep in deps {
        for file in &dep.files {
            if !dependency_files.contains(file) {
                dependency_files.push(file.clone());
            }
        }
        let cmd = if install_all { &dep.install_all } else { &dep.install_prod };
        install_lines.push(render_install_line(cmd));
    }

    let mut ctx = Context::new();
    ctx.insert("stack_image", stack_image);
    ctx.insert("dependency_files", &dependency_files);
    ctx.insert("install_lines", &install_lines);
    tera().render("project", &ctx).expect("project template has no unbound variables")
}
