//! TOML configuration for runwatch.
//!
//! Every section has compiled-in defaults, so an empty or missing file is a
//! valid configuration.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Environment variable naming the config file to load.
pub const CONFIG_ENV: &str = "RUNWATCH_CONFIG";

/// Config file looked up in the working directory when the env var is unset.
pub const LOCAL_CONFIG: &str = "runwatch.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Try, in order: the file named by `RUNWATCH_CONFIG`, `./runwatch.toml`,
    /// then compiled-in defaults.
    pub fn load_or_default() -> Self {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "RUNWATCH_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let local = Path::new(LOCAL_CONFIG);
        if local.exists() {
            match Self::load(local) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %local.display(),
                        error = %e,
                        "local config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP API listens on.
    pub bind: String,
    /// Allow cross-origin requests from any origin.
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:9080".to_string(),
            cors: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Multiplier applied to every simulated test duration. `0.0` runs instantly.
    pub time_scale: f64,
    /// Duration reported for single tests that are not in the catalog.
    pub single_test_duration_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            single_test_duration_ms: 87,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_is_all_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.server.bind, "0.0.0.0:9080");
        assert_eq!(cfg.runner.single_test_duration_ms, 87);
        assert!(!cfg.logging.json);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [runner]
            time_scale = 0.0

            [logging]
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.runner.time_scale, 0.0);
        assert_eq!(cfg.runner.single_test_duration_ms, 87);
        assert!(cfg.logging.json);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.server.cors);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind = \"127.0.0.1:7000\"\ncors = false").unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:7000");
        assert!(!cfg.server.cors);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nbind = 1").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
