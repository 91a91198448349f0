//! Git credential resolution (§4.F): queried once per run, outside the
//! pure assembler, so `build_container_spec` stays a function of its
//! inputs rather than a process-shelling one. Grounded on the teacher's
//! subprocess-then-parse-stdout pattern in `ccbox-platform::input`
//! (`which` gate, `Command::output`, trim and check exit status).

use std::io::Write;
use std::process::{Command, Stdio};

/// Credentials and identity resolved from the host's `gh`/`git`
/// configuration, ready to inject as container env vars.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitCredentials {
    pub token: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// Strips CR/LF/NUL and trims, per §4.F's "sanitise values" instruction.
fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '\r' | '\n' | '\0'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn run_stdout(program: &str, args: &[&str]) -> Option<String> {
    if which::which(program).is_err() {
        return None;
    }
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn gh_auth_token() -> Option<String> {
    run_stdout("gh", &["auth", "token"]).map(|s| sanitize(&s))
}

fn git_credential_fill() -> Option<String> {
    if which::which("git").is_err() {
        return None;
    }
    let mut child = Command::new("git")
        .args(["credential", "fill"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;
    child
        .stdin
        .as_mut()?
        .write_all(b"protocol=https\nhost=github.com\n\n")
        .ok()?;
    let output = child.wait_with_output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .find_map(|line| line.strip_prefix("password="))
        .map(sanitize)
}

fn gh_api_identity() -> Option<(String, String)> {
    let out = run_stdout("gh", &["api", "user", "--jq", ".name,.email"])?;
    let mut lines = out.lines();
    let name = sanitize(lines.next()?);
    let email = sanitize(lines.next().unwrap_or(""));
    Some((name, email))
}

fn git_config_identity() -> (Option<String>, Option<String>) {
    let name = run_stdout("git", &["config", "--global", "user.name"]).map(|s| sanitize(&s));
    let email = run_stdout("git", &["config", "--global", "user.email"]).map(|s| sanitize(&s));
    (name, email)
}

/// Resolves a token in priority order — `GITHUB_TOKEN`/`GH_TOKEN` env,
/// then `gh auth token`, then `git credential fill` — and an identity
/// from `gh api user`, falling back to `git config --global`. Every step
/// is best-effort; absence just means fewer env vars get injected.
pub fn resolve_git_credentials() -> GitCredentials {
    let token = std::env::var("GITHUB_TOKEN")
        .ok()
        .or_else(|| std::env::var("GH_TOKEN").ok())
        .map(|s| sanitize(&s))
        .filter(|s| !s.is_empty())
        .or_else(gh_auth_token)
        .or_else(git_credential_fill);

    let (user_name, user_email) = match gh_api_identity() {
        Some((name, email)) => (
            Some(name).filter(|s| !s.is_empty()),
            Some(email).filter(|s| !s.is_empty()),
        ),
        None => git_config_identity(),
    };

    GitCredentials {
        token,
        user_name,
        user_email,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_control_characters_and_trims() {
        assert_eq!(sanitize("  tok\r\nen\0  "), "token");
    }

    #[test]
    fn env_token_takes_priority_over_subprocess_lookups() {
        std::env::set_var("GITHUB_TOKEN", "env-token-value");
        let creds = resolve_git_credentials();
        assert_eq!(creds.token.as_deref(), Some("env-token-value"));
        std::env::remove_var("GITHUB_TOKEN");
    }

    #[test]
    fn gh_token_env_var_is_also_accepted() {
        std::env::remove_var("GITHUB_TOKEN");
        std::env::set_var("GH_TOKEN", "gh-token-value");
        let creds = resolve_git_credentials();
        assert_eq!(creds.token.as_deref(), Some("gh-token-value"));
        std::env::remove_var("GH_TOKEN");
    }

    #[test]
    fn resolution_never_panics_with_no_env_set() {
        std::env::remove_var("GITHUB_TOKEN");
        std::env::remove_var("GH_TOKEN");
        let _ = resolve_git_credentials();
    }
}
