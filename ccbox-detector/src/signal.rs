//! The scored-signal stack detection pipeline (§4.C).
//!
//! Signal and validator tables are plain data, not control flow: a
//! `SignalDef` is `(language, trigger filename pattern, base confidence,
//! optional content validator)`, and the pipeline walks the table rather
//! than branching per language.

use crate::stack::Stack;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Confidence tiers from §4.C, as named constants so the signal table
/// reads as data rather than magic numbers.
pub mod tier {
    pub const LOCK_FILE: i32 = 95;
    pub const MANIFEST_FIELD: i32 = 95;
    pub const PRIMARY_CONFIG: i32 = 90;
    pub const SECONDARY_CONFIG: i32 = 80;
    pub const AMBIGUOUS_CONFIG: i32 = 50;
    pub const GENERAL_TOOL: i32 = 40;
    pub const SOURCE_EXT_MULTI: i32 = 30;
    pub const SOURCE_EXT_SINGLE: i32 = 15;
    pub const REJECTED: i32 = 0;
}

/// One `(language, confidence, trigger filename)` triple produced by the
/// detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSignal {
    pub language: String,
    pub confidence: i32,
    pub trigger: String,
    pub stack: Stack,
}

/// The outcome of the whole detection pipeline for one project directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub recommended_stack: Stack,
    /// Highest confidence first.
    pub languages: Vec<LanguageSignal>,
}

/// What a content validator decides about a signal it was registered for.
pub enum ValidatorOutcome {
    Keep,
    Reject,
    Remap(i32),
}

type Validator = fn(&Path) -> ValidatorOutcome;

/// One entry in the non-extension signal table: a language, the filename
/// it looks for directly in the project root, its base confidence tier,
/// and an optional content validator keyed by `(language, filename)`.
struct SignalDef {
    language: &'static str,
    filename: &'static str,
    base_confidence: i32,
    validator: Option<Validator>,
}

fn pyproject_validator(dir: &Path) -> ValidatorOutcome {
    let markers = [
        "[project]",
        "[tool.poetry]",
        "[tool.pdm]",
        "[tool.setuptools]",
        "[tool.hatch]",
        "[tool.flit",
        "[build-system]",
    ];
    match fs::read_to_string(dir.join("pyproject.toml")) {
        Ok(content) if markers.iter().any(|m| content.contains(m)) => ValidatorOutcome::Keep,
        Ok(_) => ValidatorOutcome::Reject,
        Err(_) => ValidatorOutcome::Reject,
    }
}

fn r_description_validator(dir: &Path) -> ValidatorOutcome {
    let markers = ["Package:", "Type:", "Imports:", "Depends:", "License:"];
    match fs::read_to_string(dir.join("DESCRIPTION")) {
        Ok(content) => {
            let hits = markers.iter().filter(|m| content.contains(**m)).count();
            if hits >= 2 {
                ValidatorOutcome::Keep
            } else {
                ValidatorOutcome::Reject
            }
        }
        Err(_) => ValidatorOutcome::Reject,
    }
}

fn julia_project_validator(dir: &Path) -> ValidatorOutcome {
    let markers = ["uuid", "[deps]", "[compat]", "julia ="];
    match fs::read_to_string(dir.join("Project.toml")) {
        Ok(content) if markers.iter().any(|m| content.contains(m)) => ValidatorOutcome::Keep,
        Ok(_) => ValidatorOutcome::Reject,
        Err(_) => ValidatorOutcome::Reject,
    }
}

fn gleam_manifest_validator(dir: &Path) -> ValidatorOutcome {
    match fs::read_to_string(dir.join("manifest.toml")) {
        Ok(content) if content.contains("[packages]") => ValidatorOutcome::Keep,
        Ok(_) => ValidatorOutcome::Reject,
        Err(_) => ValidatorOutcome::Reject,
    }
}

static CXX_COMPILER_RE: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"\bg\+\+\b|\bgcc\b|\$\(CXX\)").unwrap());

fn makefile_validator(dir: &Path) -> ValidatorOutcome {
    match fs::read_to_string(dir.join("Makefile")) {
        Ok(content) if CXX_COMPILER_RE.is_match(&content) => {
            ValidatorOutcome::Remap(tier::SECONDARY_CONFIG)
        }
        _ => ValidatorOutcome::Keep,
    }
}

/// The non-extension signal table: one highest-confidence pattern per
/// language is selected from here before source-extension counting runs.
static SIGNAL_TABLE: Lazy<Vec<SignalDef>> = Lazy::new(|| {
    vec![
        SignalDef { language: "rust", filename: "Cargo.lock", base_confidence: tier::LOCK_FILE, validator: None },
        SignalDef { language: "rust", filename: "Cargo.toml", base_confidence: tier::PRIMARY_CONFIG, validator: None },
        SignalDef { language: "go", filename: "go.sum", base_confidence: tier::LOCK_FILE, validator: None },
        SignalDef { language: "go", filename: "go.mod", base_confidence: tier::PRIMARY_CONFIG, validator: None },
        SignalDef { language: "node", filename: "package-lock.json", base_confidence: tier::LOCK_FILE, validator: None },
        SignalDef { language: "node", filename: "package.json", base_confidence: tier::PRIMARY_CONFIG, validator: None },
        SignalDef { language: "yarn", filename: "yarn.lock", base_confidence: tier::LOCK_FILE, validator: None },
        SignalDef { language: "pnpm", filename: "pnpm-lock.yaml", base_confidence: tier::LOCK_FILE, validator: None },
        SignalDef { language: "typescript", filename: "tsconfig.json", base_confidence: tier::PRIMARY_CONFIG, validator: None },
        SignalDef { language: "bun", filename: "bunfig.toml", base_confidence: tier::PRIMARY_CONFIG, validator: None },
        SignalDef { language: "deno", filename: "deno.json", base_confidence: tier::PRIMARY_CONFIG, validator: None },
        SignalDef { language: "deno", filename: "deno.jsonc", base_confidence: tier::PRIMARY_CONFIG, validator: None },
        SignalDef { language: "python", filename: "pyproject.toml", base_confidence: tier::PRIMARY_CONFIG, validator: Some(pyproject_validator) },
        SignalDef { language: "python", filename: "setup.py", base_confidence: tier::SECONDARY_CONFIG, validator: None },
        SignalDef { language: "python", filename: "requirements.txt", base_confidence: tier::SECONDARY_CONFIG, validator: None },
        SignalDef { language: "python", filename: "Pipfile", base_confidence: tier::SECONDARY_CONFIG, validator: None },
        SignalDef { language: "java", filename: "pom.xml", base_confidence: tier::PRIMARY_CONFIG, validator: None },
        SignalDef { language: "java", filename: "build.gradle", base_confidence: tier::PRIMARY_CONFIG, validator: None },
        SignalDef { language: "kotlin", filename: "build.gradle.kts", base_confidence: tier::AMBIGUOUS_CONFIG, validator: None },
        SignalDef { language: "scala", filename: "build.sbt", base_confidence: tier::PRIMARY_CONFIG, validator: None },
        SignalDef { language: "clojure", filename: "project.clj", base_confidence: tier::PRIMARY_CONFIG, validator: None },
        SignalDef { language: "clojure", filename: "deps.edn", base_confidence: tier::SECONDARY_CONFIG, validator: None },
        SignalDef { language: "cpp", filename: "CMakeLists.txt", base_confidence: tier::PRIMARY_CONFIG, validator: None },
        SignalDef { language: "cpp", filename: "Makefile", base_confidence: tier::GENERAL_TOOL, validator: Some(makefile_validator) },
        SignalDef { language: "dotnet", filename: "*.csproj", base_confidence: tier::PRIMARY_CONFIG, validator: None },
        SignalDef { language: "dotnet", filename: "*.sln", base_confidence: tier::SECONDARY_CONFIG, validator: None },
        SignalDef { language: "swift", filename: "Package.swift", base_confidence: tier::PRIMARY_CONFIG, validator: None },
        SignalDef { language: "dart", filename: "pubspec.yaml", base_confidence: tier::PRIMARY_CONFIG, validator: None },
        SignalDef { language: "r", filename: "DESCRIPTION", base_confidence: tier::PRIMARY_CONFIG, validator: Some(r_description_validator) },
        SignalDef { language: "julia", filename: "Project.toml", base_confidence: tier::PRIMARY_CONFIG, validator: Some(julia_project_validator) },
        SignalDef { language: "gleam", filename: "gleam.toml", base_confidence: tier::PRIMARY_CONFIG, validator: None },
        SignalDef { language: "gleam", filename: "manifest.toml", base_confidence: tier::LOCK_FILE, validator: Some(gleam_manifest_validator) },
    ]
});

/// Source-extension signals: counted separately (exactly 1 match → 15,
/// 2+ → 30, 0 → not a signal) after the config/lock-file pass.
static SOURCE_EXTENSIONS: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("rust", "rs"),
        ("go", "go"),
        ("python", "py"),
        ("node", "js"),
        ("typescript", "ts"),
        ("java", "java"),
        ("kotlin", "kt"),
        ("scala", "scala"),
        ("clojure", "clj"),
        ("cpp", "cpp"),
        ("cpp", "cc"),
        ("cpp", "hpp"),
        ("dotnet", "cs"),
        ("swift", "swift"),
        ("dart", "dart"),
        ("lua", "lua"),
        ("r", "R"),
        ("julia", "jl"),
        ("gleam", "gleam"),
    ]
});

/// Fixed language → stack table (§4.C step 8).
fn stack_for_language(language: &str) -> Stack {
    match language {
        "python" => Stack::Python,
        "node" | "typescript" | "bun" | "deno" | "yarn" | "pnpm" => Stack::Web,
        "go" => Stack::Go,
        "rust" => Stack::Rust,
        "java" => Stack::Java,
        "kotlin" => Stack::Jvm,
        "scala" | "clojure" | "gleam" => Stack::Functional,
        "cpp" => Stack::Cpp,
        "dotnet" => Stack::Dotnet,
        "swift" => Stack::Swift,
        "dart" => Stack::Dart,
        "lua" => Stack::Lua,
        "r" | "julia" => Stack::Data,
        _ => Stack::Base,
    }
}

fn matches_glob_suffix(filename: &str, pattern: &str) -> bool {
    match pattern.strip_prefix('*') {
        Some(suffix) => filename.ends_with(suffix),
        None => filename == pattern,
    }
}

fn find_matching_dir_entry(dir: &Path, pattern: &str) -> Option<std::path::PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let file_type = entry.file_type().ok()?;
        if !file_type.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if matches_glob_suffix(&name, pattern) {
            return Some(entry.path());
        }
    }
    None
}

/// Step 1: seed signals from `package.json`'s `packageManager` field.
fn seed_package_manager_field(dir: &Path) -> Option<LanguageSignal> {
    let content = fs::read_to_string(dir.join("package.json")).ok()?;
    let json: serde_json::Value = serde_json::from_str(&content).ok()?;
    let pm = json.get("packageManager")?.as_str()?;

    if let Some(rest) = pm.strip_prefix("bun@") {
        let _ = rest;
        return Some(LanguageSignal {
            language: "bun".to_string(),
            confidence: tier::MANIFEST_FIELD,
            trigger: "package.json#packageManager=bun".to_string(),
            stack: Stack::Web,
        });
    }
    for prefix in ["pnpm@", "yarn@", "npm@"] {
        if pm.starts_with(prefix) {
            return Some(LanguageSignal {
                language: "node".to_string(),
                confidence: tier::MANIFEST_FIELD,
                trigger: "packageManager field".to_string(),
                stack: Stack::Web,
            });
        }
    }
    None
}

/// Runs the full detection pipeline (§4.C) over `dir`, returning the
/// recommended stack and the ordered list of surviving language signals.
///
/// Deterministic and read-only: two consecutive calls over an unchanged
/// directory return identical results, and no filesystem writes occur.
pub fn detect_stack(dir: &Path) -> DetectionResult {
    if !dir.is_dir() {
        return DetectionResult {
            recommended_stack: Stack::Base,
            languages: Vec::new(),
        };
    }

    let mut best_per_language: HashMap<String, LanguageSignal> = HashMap::new();

    if let Some(seed) = seed_package_manager_field(dir) {
        best_per_language.insert(seed.language.clone(), seed);
    }

    // Step 2-3: pick the single highest-confidence pattern per language,
    // running content validators where registered.
    for def in SIGNAL_TABLE.iter() {
        let matched_path = find_matching_dir_entry(dir, def.filename);
        let Some(path) = matched_path else { continue };

        let mut confidence = def.base_confidence;
        if let Some(validator) = def.validator {
            match validator(dir) {
                ValidatorOutcome::Keep => {}
                ValidatorOutcome::Reject => confidence = tier::REJECTED,
                ValidatorOutcome::Remap(new_score) => confidence = new_score,
            }
        }
        if confidence == tier::REJECTED {
            continue;
        }

        let trigger = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| def.filename.to_string());

        let candidate = LanguageSignal {
            language: def.language.to_string(),
            confidence,
            trigger,
            stack: stack_for_language(def.language),
        };

        best_per_language
            .entry(def.language.to_string())
            .and_modify(|existing| {
                if candidate.confidence > existing.confidence {
                    *existing = candidate.clone();
                }
            })
            .or_insert(candidate);
    }

    // Step 4: source-extension counting, only for languages with no
    // stronger signal yet.
    for (language, ext) in SOURCE_EXTENSIONS.iter() {
        if best_per_language.contains_key(*language) {
            continue;
        }
        let count = count_files_with_extension(dir, ext);
        let confidence = match count {
            0 => continue,
            1 => tier::SOURCE_EXT_SINGLE,
            _ => tier::SOURCE_EXT_MULTI,
        };
        best_per_language.insert(
            language.to_string(),
            LanguageSignal {
                language: language.to_string(),
                confidence,
                trigger: format!("*.{ext}"),
                stack: stack_for_language(language),
            },
        );
    }

    // Step 5: Makefile demotion.
    if let Some(cpp) = best_per_language.get("cpp").cloned() {
        if cpp.trigger == "Makefile" {
            let other_is_strong = best_per_language
                .iter()
                .any(|(lang, sig)| lang != "cpp" && sig.confidence >= 80);
            if other_is_strong {
                best_per_language.insert(
                    "cpp".to_string(),
                    LanguageSignal {
                        confidence: 20,
                        ..cpp
                    },
                );
            }
        }
    }

    // Step 6: mutual exclusion.
    if best_per_language.contains_key("typescript") {
        best_per_language.remove("node");
    }
    if best_per_language.contains_key("bun") {
        best_per_language.remove("node");
    }
    if best_per_language.contains_key("deno") {
        best_per_language.remove("node");
    }
    for suppressor in ["scala", "kotlin", "clojure"] {
        if best_per_language.contains_key(suppressor) {
            best_per_language.remove("java");
        }
    }

    // Step 7: sort descending by confidence; ties keep signal-table
    // insertion order by breaking ties on the table's declared order.
    let table_order: Vec<&str> = SIGNAL_TABLE.iter().map(|d| d.language).collect();
    let rank = |language: &str| -> usize {
        table_order
            .iter()
            .position(|l| *l == language)
            .unwrap_or(usize::MAX)
    };

    let mut languages: Vec<LanguageSignal> = best_per_language.into_values().collect();
    languages.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then_with(|| rank(&a.language).cmp(&rank(&b.language)))
    });

    if languages.is_empty() {
        return DetectionResult {
            recommended_stack: Stack::Base,
            languages,
        };
    }

    // Step 8 already applied per-signal (stack_for_language). Step 9:
    // web + python promotion overrides the top score.
    let has_web_family = languages
        .iter()
        .any(|s| matches!(s.language.as_str(), "typescript" | "node" | "bun" | "deno"));
    let has_python = languages.iter().any(|s| s.language == "python");

    let recommended_stack = if has_web_family && has_python {
        Stack::Fullstack
    } else {
        languages[0].stack
    };

    DetectionResult {
        recommended_stack,
        languages,
    }
}

fn count_files_with_extension(dir: &Path, ext: &str) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|e| {
            e.path()
                .extension()
                .map(|e| e.to_string_lossy() == ext)
                .unwrap_or(false)
        })
        .count()
}
