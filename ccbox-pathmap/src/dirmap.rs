//! Session-directory name encoding (§4.F/§4.G): the assistant persists
//! sessions under a directory named by replacing every path separator in
//! an absolute project path with `-`. `CCBOX_DIR_MAP` pairs this encoding
//! computed from two different path forms (the literal string the
//! assistant saw pre-translation, and the container-native form) so the
//! entrypoint can reconcile the resulting sibling directories.

/// Encodes an absolute path the way the assistant names its per-project
/// session directory: every `/` or `\` becomes `-`.
pub fn encode_project_dir(absolute_path: &str) -> String {
    absolute_path
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_every_separator() {
        assert_eq!(encode_project_dir("/home/user/project"), "-home-user-project");
    }

    #[test]
    fn handles_backslashes_too() {
        assert_eq!(encode_project_dir(r"D:\GitHub\proj"), "D--GitHub-proj");
    }

    #[test]
    fn leaves_separator_free_strings_alone() {
        assert_eq!(encode_project_dir("myproj"), "myproj");
    }
}
