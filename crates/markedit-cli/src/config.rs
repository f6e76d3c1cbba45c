use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "markedit.config.json";

/// Project settings read from `markedit.config.json`. Command-line flags
/// take precedence over every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Spaces per level for `format`; negative minifies.
    pub indent: i32,

    /// Spaces per level for `convert`; negative renders compact JSON.
    pub object_indent: i32,

    /// Report every validation error instead of stopping at the first.
    pub collect_all: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indent: 4,
            object_indent: 2,
            collect_all: true,
        }
    }
}

impl Config {
    /// Load the config in `cwd`, or the defaults when there is none.
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("cannot read {}", config_path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("invalid config in {}", config_path.display()))?;
        tracing::debug!(?config, path = %config_path.display(), "loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_config() {
        let json = r#"{ "indent": 2, "objectIndent": -1, "collectAll": false }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(
            config,
            Config {
                indent: 2,
                object_indent: -1,
                collect_all: false,
            }
        );
    }

    #[test]
    fn test_missing_fields_default() {
        let config: Config = serde_json::from_str(r#"{ "indent": 8 }"#).unwrap();
        assert_eq!(config.indent, 8);
        assert_eq!(config.object_indent, 2);
        assert!(config.collect_all);
    }

    #[test]
    fn test_load_without_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "indent": 0 }"#).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap().indent, 0);
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "{ indent: ").unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("invalid config"));
    }
}
