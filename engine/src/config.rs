use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const BACKEND_ENV: &str = "SOUNDWATCH_BACKEND";
pub const WATCH_DIR_ENV: &str = "SOUNDWATCH_WATCH_DIR";
pub const SAMPLE_RATE_ENV: &str = "SOUNDWATCH_SAMPLE_RATE";
pub const DEBUG_ENV: &str = "SOUNDWATCH_DEBUG";

pub const DEFAULT_WATCH_DIR: &str = "/dev/snd";
pub const PREFERRED_SAMPLE_RATE: u32 = 48_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Alsa,
    Dummy,
}

impl Default for BackendKind {
    fn default() -> Self {
        if cfg!(target_os = "linux") {
            BackendKind::Alsa
        } else {
            BackendKind::Dummy
        }
    }
}

impl BackendKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "alsa" => Some(BackendKind::Alsa),
            "dummy" => Some(BackendKind::Dummy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub backend: BackendKind,
    pub watch_dir: PathBuf,
    pub preferred_sample_rate: u32,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            watch_dir: PathBuf::from(DEFAULT_WATCH_DIR),
            preferred_sample_rate: PREFERRED_SAMPLE_RATE,
        }
    }
}

impl WatchConfig {
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(kind) = env_value(BACKEND_ENV).and_then(|v| BackendKind::parse(&v)) {
            self.backend = kind;
        }
        if let Some(dir) = env_value(WATCH_DIR_ENV) {
            self.watch_dir = PathBuf::from(dir);
        }
        if let Some(rate) = env_value(SAMPLE_RATE_ENV).and_then(|v| v.trim().parse().ok()) {
            self.preferred_sample_rate = rate;
        }
        self
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| {
            let s = v.trim().to_ascii_lowercase();
            s == "1" || s == "true" || s == "yes" || s == "on"
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_names() {
        assert_eq!(BackendKind::parse(" ALSA "), Some(BackendKind::Alsa));
        assert_eq!(BackendKind::parse("dummy"), Some(BackendKind::Dummy));
        assert_eq!(BackendKind::parse("jack"), None);
    }

    #[test]
    fn defaults_watch_dev_snd() {
        let config = WatchConfig::default();
        assert_eq!(config.watch_dir, PathBuf::from("/dev/snd"));
        assert_eq!(config.preferred_sample_rate, 48_000);
    }
}
