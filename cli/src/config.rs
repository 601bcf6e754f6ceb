//! CLI configuration loading

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use vcr_sync::SyncConfig;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "vcr-sync.json";

/// Resolve the configuration file path.
pub fn resolve_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load and validate the sync configuration.
///
/// `.yaml`/`.yml` files are read as YAML with the same field names; anything
/// else is parsed as a JSON document.
pub fn load(path: Option<&Path>) -> Result<SyncConfig> {
    let path = resolve_path(path);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = if path.extension().map_or(false, |e| e == "yaml" || e == "yml") {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {:?}", path))?
    } else {
        SyncConfig::parse(&content).with_context(|| format!("Invalid configuration in {:?}", path))?
    };

    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOCUMENT: &str = r#"{
        "clusterConfigFields": {
            "maxOfflineInstancesAllowed": 4,
            "numOfflineInstancesForAutoExit": 2,
            "allowAutoJoin": true
        },
        "idealStateConfigFields": {
            "numReplicas": 2,
            "stateModelDefRef": "OnlineOffline",
            "rebalanceStrategy": "org.apache.helix.controller.rebalancer.strategy.CrushEdRebalanceStrategy"
        }
    }"#;

    #[test]
    fn test_load_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(DOCUMENT.as_bytes()).unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.ideal_state.replica_count, 2);
        assert_eq!(config.cluster.allow_auto_join, Some(true));
    }

    #[test]
    fn test_load_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(
            b"idealStateConfigFields:\n  numReplicas: 3\n  stateModelDefRef: OnlineOffline\n  rebalanceStrategy: CrushEd\n",
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.ideal_state.replica_count, 3);
    }

    #[test]
    fn test_load_reports_invalid_document() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"{"idealStateConfigFields": {"stateModelDefRef": "OnlineOffline"}}"#)
            .unwrap();

        let err = load(Some(file.path())).unwrap_err();
        assert!(format!("{:#}", err).contains("numReplicas"));
    }

    #[test]
    fn test_missing_file() {
        assert!(load(Some(Path::new("/nonexistent/vcr-sync.json"))).is_err());
    }
}
