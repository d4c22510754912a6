use std::path::PathBuf;
use std::time::Duration;

/// Daemon configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Simulated processing delay for the echo swap processor.
    pub process_delay_ms: u64,
    /// Extra random delay added on top of `process_delay_ms`.
    pub process_jitter_ms: u64,
    /// Upper bound on one processing run before it is reported as failed.
    pub process_timeout_secs: u64,
    /// Upper bound on one search call.
    pub search_timeout_secs: u64,
    /// Catalog TOML overriding the embedded demo catalog.
    pub catalog_path: Option<PathBuf>,
    /// Directory used by `Download` when the caller passes none.
    pub download_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            process_delay_ms: 3000,
            process_jitter_ms: 0,
            process_timeout_secs: 30,
            search_timeout_secs: 10,
            catalog_path: None,
            download_dir: default_download_dir(),
        }
    }
}

impl Config {
    /// Load configuration from `FACEGIF_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            process_delay_ms: env_u64("FACEGIF_PROCESS_DELAY_MS", defaults.process_delay_ms),
            process_jitter_ms: env_u64("FACEGIF_PROCESS_JITTER_MS", defaults.process_jitter_ms),
            process_timeout_secs: env_u64(
                "FACEGIF_PROCESS_TIMEOUT_SECS",
                defaults.process_timeout_secs,
            ),
            search_timeout_secs: env_u64(
                "FACEGIF_SEARCH_TIMEOUT_SECS",
                defaults.search_timeout_secs,
            ),
            catalog_path: std::env::var("FACEGIF_CATALOG_PATH").ok().map(PathBuf::from),
            download_dir: std::env::var("FACEGIF_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
        }
    }

    pub fn process_delay(&self) -> Duration {
        Duration::from_millis(self.process_delay_ms)
    }

    pub fn process_jitter(&self) -> Duration {
        Duration::from_millis(self.process_jitter_ms)
    }
}

fn default_download_dir() -> PathBuf {
    std::env::var("XDG_DOWNLOAD_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join("Downloads")
        })
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
