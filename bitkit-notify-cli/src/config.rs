//! Config file loading.

use std::path::Path;

use anyhow::{Context, Result};
use bitkit_notify::NotifyConfig;

/// Load a JSON [`NotifyConfig`], or the defaults if no path is given.
///
/// Missing fields take their defaults. The result is validated.
pub fn load(path: Option<&Path>) -> Result<NotifyConfig> {
    let config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        }
        None => NotifyConfig::default(),
    };

    config.validate().context("Invalid configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = load(None).unwrap();
        assert_eq!(config, NotifyConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"wake": {"deadline_secs": 90}}"#).unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.wake.deadline_secs, 90);
        assert_eq!(config.wake.node_start_timeout_secs, 60);
        assert_eq!(config.domain_label, "bitkit-notifications");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"wake": {"deadline_secs": 10, "node_start_timeout_secs": 20}}"#,
        )
        .unwrap();

        let err = load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("exceeds the job deadline"));
    }

    #[test]
    fn test_oversized_deadline_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"wake": {"deadline_secs": 18446744073709551615}}"#).unwrap();

        let err = load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("deadline_secs must be at most"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&temp_dir.path().join("absent.json"))).is_err());
    }
}
