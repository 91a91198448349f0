//! Ordered host↔container path translation table.
//!
//! Represented as an immutable slice of pairs sorted by host-length
//! descending — not a hash map — so that lookup is always
//! longest-host-prefix-first, per the data model's invariant that no
//! entry may shadow another in the wrong direction.

/// One `{host, container}` mount pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapEntry {
    pub host: String,
    pub container: String,
}

/// An ordered collection of [`PathMapEntry`] pairs, always kept sorted by
/// descending host-path length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMap {
    entries: Vec<PathMapEntry>,
}

impl PathMap {
    pub fn new() -> Self {
        PathMap { entries: Vec::new() }
    }

    /// Builds a map from `(host, container)` pairs, sorting them
    /// longest-host-prefix-first.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut entries: Vec<PathMapEntry> = pairs
            .into_iter()
            .map(|(host, container)| PathMapEntry { host, container })
            .collect();
        entries.sort_by(|a, b| b.host.len().cmp(&a.host.len()));
        PathMap { entries }
    }

    pub fn entries(&self) -> &[PathMapEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrites a host-absolute path to its container-absolute form using
    /// the longest matching host prefix. Returns the input unchanged if no
    /// entry matches.
    pub fn host_to_container(&self, path: &str) -> String {
        for entry in &self.entries {
            if let Some(rewritten) = rewrite(path, &entry.host, &entry.container) {
                return rewritten;
            }
        }
        path.to_string()
    }

    /// Rewrites a container-absolute path to its host-absolute form using
    /// the longest matching container prefix.
    pub fn container_to_host(&self, path: &str) -> String {
        let mut by_container = self.entries.clone();
        by_container.sort_by(|a, b| b.container.len().cmp(&a.container.len()));
        for entry in &by_container {
            if let Some(rewritten) = rewrite(path, &entry.container, &entry.host) {
                return rewritten;
            }
        }
        path.to_string()
    }

    /// Serialises as `CCBOX_PATH_MAP`'s wire format:
    /// `host1=container1;host2=container2;...`.
    pub fn to_env_string(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}={}", e.host, e.container))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Serialises as `CCBOX_DIR_MAP`'s wire format: for every entry, the
    /// session-directory encoding of its container form paired with the
    /// encoding of its host form, `<container-encoded>:<native-encoded>`,
    /// joined by `;`.
    pub fn to_dir_map_string(&self) -> String {
        self.entries
            .iter()
            .map(|e| {
                format!(
                    "{}:{}",
                    crate::dirmap::encode_project_dir(&e.container),
                    crate::dirmap::encode_project_dir(&e.host)
                )
            })
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Parses the `CCBOX_PATH_MAP` wire format back into a `PathMap`.
    pub fn from_env_string(raw: &str) -> Self {
        let pairs = raw
            .split(';')
            .filter(|s| !s.is_empty())
            .filter_map(|pair| {
                let (host, container) = pair.split_once('=')?;
                Some((host.to_string(), container.to_string()))
            });
        Self::from_pairs(pairs)
    }
}

fn rewrite(path: &str, from_prefix: &str, to_prefix: &str) -> Option<String> {
    if path == from_prefix {
        return Some(to_prefix.to_string());
    }
    let stripped = path.strip_prefix(from_prefix)?;
    if stripped.starts_with('/') {
        Some(format!("{to_prefix}{stripped}"))
    } else {
        None
    }
}
