//! The `Stack` enum and its static metadata table (§3 Data model).

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// An immutable, process-wide stack identifier. Each stack names a
/// pre-built container image variant matching a language ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stack {
    Base,
    Python,
    Web,
    Go,
    Rust,
    Java,
    Cpp,
    Dotnet,
    Swift,
    Dart,
    Lua,
    Jvm,
    Functional,
    Scripting,
    Systems,
    Data,
    Ai,
    Mobile,
    Game,
    Fullstack,
}

impl Stack {
    pub fn as_str(self) -> &'static str {
        match self {
            Stack::Base => "base",
            Stack::Python => "python",
            Stack::Web => "web",
            Stack::Go => "go",
            Stack::Rust => "rust",
            Stack::Java => "java",
            Stack::Cpp => "cpp",
            Stack::Dotnet => "dotnet",
            Stack::Swift => "swift",
            Stack::Dart => "dart",
            Stack::Lua => "lua",
            Stack::Jvm => "jvm",
            Stack::Functional => "functional",
            Stack::Scripting => "scripting",
            Stack::Systems => "systems",
            Stack::Data => "data",
            Stack::Ai => "ai",
            Stack::Mobile => "mobile",
            Stack::Game => "game",
            Stack::Fullstack => "fullstack",
        }
    }

    /// The image tag for this stack's standalone stack-layer image.
    pub fn image_name(self) -> String {
        format!("ccbox_{}:latest", self.as_str())
    }
}

/// Static metadata describing one stack.
#[derive(Debug, Clone)]
pub struct StackInfo {
    pub description: &'static str,
    /// Approximate built-image size, for display purposes only.
    pub approx_size_mb: u32,
    /// The stack this one is built `FROM`, if any. `None` means this
    /// stack is built directly from the base image (or, in the `Base`
    /// case, has no parent at all).
    pub parent: Option<Stack>,
}

pub static STACK_TABLE: Lazy<HashMap<Stack, StackInfo>> = Lazy::new(|| {
    use Stack::*;
    HashMap::from([
        (
            Base,
            StackInfo {
                description: "Minimal base image with the assistant and core tooling",
                approx_size_mb: 400,
                parent: None,
            },
        ),
        (
            Python,
            StackInfo {
                description: "Python with pip/poetry/pdm/uv tooling",
                approx_size_mb: 650,
                parent: Some(Base),
            },
        ),
        (
            Web,
            StackInfo {
                description: "Node.js, TypeScript, and the common JS package managers",
                approx_size_mb: 700,
                parent: Some(Base),
            },
        ),
        (
            Go,
            StackInfo {
                description: "Go toolchain",
                approx_size_mb: 600,
                parent: Some(Base),
            },
        ),
        (
            Rust,
            StackInfo {
                description: "Rust toolchain via rustup",
                approx_size_mb: 900,
                parent: Some(Base),
            },
        ),
        (
            Java,
            StackInfo {
                description: "JDK with Maven and Gradle",
                approx_size_mb: 800,
                parent: Some(Jvm),
            },
        ),
        (
            Cpp,
            StackInfo {
                description: "GCC/Clang, CMake, and Make",
                approx_size_mb: 750,
                parent: Some(Systems),
            },
        ),
        (
            Dotnet,
            StackInfo {
                description: ".NET SDK",
                approx_size_mb: 850,
                parent: Some(Base),
            },
        ),
        (
            Swift,
            StackInfo {
                description: "Swift toolchain",
                approx_size_mb: 950,
                parent: Some(Base),
            },
        ),
        (
            Dart,
            StackInfo {
                description: "Dart/Flutter SDK",
                approx_size_mb: 900,
                parent: Some(Mobile),
            },
        ),
        (
            Lua,
            StackInfo {
                description: "Lua interpreter and LuaRocks",
                approx_size_mb: 450,
                parent: Some(Scripting),
            },
        ),
        (
            Jvm,
            StackInfo {
                description: "Shared JVM base for Java/Kotlin/Scala/Clojure",
                approx_size_mb: 700,
                parent: Some(Base),
            },
        ),
        (
            Functional,
            StackInfo {
                description: "Scala, Clojure, and Gleam on the BEAM/JVM",
                approx_size_mb: 800,
                parent: Some(Jvm),
            },
        ),
        (
            Scripting,
            StackInfo {
                description: "Lightweight scripting language runtimes",
                approx_size_mb: 400,
                parent: Some(Base),
            },
        ),
        (
            Systems,
            StackInfo {
                description: "Shared systems-programming base (compilers, build tools)",
                approx_size_mb: 600,
                parent: Some(Base),
            },
        ),
        (
            Data,
            StackInfo {
                description: "R, Julia, and scientific computing tooling",
                approx_size_mb: 1100,
                parent: Some(Base),
            },
        ),
        (
            Ai,
            StackInfo {
                description: "Python with common ML/AI frameworks preinstalled",
                approx_size_mb: 3500,
                parent: Some(Python),
            },
        ),
        (
            Mobile,
            StackInfo {
                description: "Shared mobile-development base",
                approx_size_mb: 700,
                parent: Some(Base),
            },
        ),
        (
            Game,
            StackInfo {
                description: "Game-engine scripting toolchains",
                approx_size_mb: 900,
                parent: Some(Systems),
            },
        ),
        (
            Fullstack,
            StackInfo {
                description: "Web + Python combined, for projects that mix both",
                approx_size_mb: 1300,
                parent: Some(Base),
            },
        ),
    ])
});

/// Walks a stack's parent chain up to (and including) `Base`, or to an
/// externally supplied parent (there are none in this table — every
/// entry terminates at `Base`).
pub fn parent_chain(stack: Stack) -> Vec<Stack> {
    let mut chain = vec![stack];
    let mut current = stack;
    while let Some(info) = STACK_TABLE.get(&current) {
        match info.parent {
            Some(parent) if parent != current => {
                chain.push(parent);
                current = parent;
            }
            _ => break,
        }
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_stack_has_metadata() {
        for stack in [
            Stack::Base,
            Stack::Python,
            Stack::Web,
            Stack::Go,
            Stack::Rust,
            Stack::Java,
            Stack::Cpp,
            Stack::Dotnet,
            Stack::Swift,
            Stack::Dart,
            Stack::Lua,
            Stack::Jvm,
            Stack::Functional,
            Stack::Scripting,
            Stack::Systems,
            Stack::Data,
            Stack::Ai,
            Stack::Mobile,
            Stack::Game,
            Stack::Fullstack,
        ] {
            assert!(STACK_TABLE.contains_key(&stack), "{stack:?} missing metadata");
        }
    }

    #[test]
    fn parent_chains_terminate_at_base() {
        let chain = parent_chain(Stack::Ai);
        assert_eq!(*chain.last().unwrap(), Stack::Base);
        assert_eq!(chain, vec![Stack::Ai, Stack::Python, Stack::Base]);
    }

    #[test]
    fn base_chain_is_itself() {
        assert_eq!(parent_chain(Stack::Base), vec![Stack::Base]);
    }

    #[test]
    fn image_name_follows_naming_convention() {
        assert_eq!(Stack::Python.image_name(), "ccbox_python:latest");
    }
}
