//! Global → project → CLI-override merge (§6): later layers override
//! earlier ones field-by-field; `None` means "inherit from the layer
//! below".

use crate::config::CcboxConfig;

fn merge_two(base: CcboxConfig, overlay: CcboxConfig) -> CcboxConfig {
    CcboxConfig {
        stack: overlay.stack.or(base.stack),
        deps: overlay.deps.or(base.deps),
        zero_residue: overlay.zero_residue.or(base.zero_residue),
        network_policy: overlay.network_policy.or(base.network_policy),
        memory: overlay.memory.or(base.memory),
        cpus: overlay.cpus.or(base.cpus),
        progress: overlay.progress.or(base.progress),
        cache: overlay.cache.or(base.cache),
        prune: overlay.prune.or(base.prune),
        fresh: overlay.fresh.or(base.fresh),
        headless: overlay.headless.or(base.headless),
        unrestricted: overlay.unrestricted.or(base.unrestricted),
        read_only: overlay.read_only.or(base.read_only),
        debug: overlay.debug.or(base.debug),
        env: {
            // Overlay keys win on conflict; keys unique to either side
            // are kept.
            let mut merged = base.env;
            merged.extend(overlay.env);
            merged
        },
        extra: {
            let mut merged = base.extra;
            merged.extend(overlay.extra);
            merged
        },
    }
}

/// Merges `global`, `project`, and `cli_overrides` in that order, later
/// layers winning field-by-field. `env` maps are merged key-by-key
/// instead of wholesale-replaced.
pub fn merge(
    global: CcboxConfig,
    project: CcboxConfig,
    cli_overrides: CcboxConfig,
) -> CcboxConfig {
    merge_two(merge_two(global, project), cli_overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DepsMode;

    #[test]
    fn later_layer_wins_on_conflicting_field() {
        let global = CcboxConfig {
            deps: Some(DepsMode::All),
            ..Default::default()
        };
        let project = CcboxConfig {
            deps: Some(DepsMode::Prod),
            ..Default::default()
        };
        let merged = merge(global, project, CcboxConfig::default());
        assert_eq!(merged.deps, Some(DepsMode::Prod));
    }

    #[test]
    fn absent_field_inherits_from_lower_layer() {
        let global = CcboxConfig {
            memory: Some("4g".to_string()),
            ..Default::default()
        };
        let merged = merge(global, CcboxConfig::default(), CcboxConfig::default());
        assert_eq!(merged.memory, Some("4g".to_string()));
    }

    #[test]
    fn cli_overrides_beat_both_file_layers() {
        let global = CcboxConfig {
            memory: Some("4g".to_string()),
            ..Default::default()
        };
        let project = CcboxConfig {
            memory: Some("8g".to_string()),
            ..Default::default()
        };
        let cli = CcboxConfig {
            memory: Some("16g".to_string()),
            ..Default::default()
        };
        let merged = merge(global, project, cli);
        assert_eq!(merged.memory, Some("16g".to_string()));
    }

    #[test]
    fn env_maps_merge_key_by_key() {
        let mut global = CcboxConfig::default();
        global.env.insert("A".to_string(), "1".to_string());
        let mut project = CcboxConfig::default();
        project.env.insert("B".to_string(), "2".to_string());

        let merged = merge(global, project, CcboxConfig::default());
        assert_eq!(merged.env.get("A"), Some(&"1".to_string()));
        assert_eq!(merged.env.get("B"), Some(&"2".to_string()));
    }
}
