use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use daletou_sync::config::SyncConfig;

use crate::analysis::trend::TrendConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sync: SyncConfig,
    pub trend: TrendConfig,
}

pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire la configuration {:?}", path))?;
    let config = serde_json::from_str(&json)
        .with_context(|| format!("Configuration invalide : {:?}", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_without_file() {
        assert_eq!(load_config(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"trend": {{"window": 50}}, "sync": {{"timeout_secs": 5}}}}"#).unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.trend.window, 50);
        assert_eq!(config.trend.default_sum, 90);
        assert_eq!(config.sync.timeout_secs, 5);
        assert_eq!(config.sync.limits, vec![2000, 1000, 500, 100]);
    }

    #[test]
    fn test_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ pas du json").unwrap();
        assert!(load_config(Some(file.path())).is_err());
    }
}
