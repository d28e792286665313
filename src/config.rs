use serde::Deserialize;
use soundwatch_engine::WatchConfig;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "soundwatch.toml";

/// Settings read from `soundwatch.toml`. Everything is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub watch: WatchConfig,
    pub json: bool,
}

impl AppConfig {
    /// An explicit `path` must exist; the default file may be missing.
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        Self::parse(&text).map_err(|e| format!("{}: {e}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundwatch_engine::BackendKind;

    #[test]
    fn parses_watch_table() {
        let config = AppConfig::parse(
            r#"
json = true

[watch]
backend = "dummy"
watch_dir = "/tmp/snd"
"#,
        )
        .expect("valid config");
        assert!(config.json);
        assert_eq!(config.watch.backend, BackendKind::Dummy);
        assert_eq!(config.watch.watch_dir, PathBuf::from("/tmp/snd"));
        assert_eq!(config.watch.preferred_sample_rate, 48_000);
    }

    #[test]
    fn empty_file_is_default() {
        let config = AppConfig::parse("").expect("empty config");
        assert!(!config.json);
        assert_eq!(config.watch, WatchConfig::default());
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(AppConfig::parse("[watch]\nbackend = \"jack\"\n").is_err());
    }
}
