//! Search configuration files
//!
//! ```toml
//! fuzzy_threshold = 0.75
//! use_fuzzy = true
//!
//! [weights]
//! title_exact = 120
//! recent_days = 3
//! ```
//!
//! Every key is optional. Thresholds are clamped into `[0, 1]` on load.

use std::path::{Path, PathBuf};

use crate::error::{MemoriaError, Result};
use crate::search::SearchConfig;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "MEMORIA_CONFIG";

/// Where a config file was found and whether it has to exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPath {
    pub path: PathBuf,
    /// False only for the per-user default location
    pub required: bool,
}

/// Pick the config file: `explicit`, then `$MEMORIA_CONFIG`, then
/// `<config dir>/memoria/config.toml`
pub fn resolve_config_path(explicit: Option<&str>) -> Option<ConfigPath> {
    let from_env = std::env::var(CONFIG_ENV).ok();
    resolve_from(explicit, from_env.as_deref(), dirs::config_dir())
}

fn resolve_from(
    explicit: Option<&str>,
    from_env: Option<&str>,
    config_dir: Option<PathBuf>,
) -> Option<ConfigPath> {
    if let Some(path) = explicit.or(from_env).filter(|p| !p.trim().is_empty()) {
        return Some(ConfigPath {
            path: PathBuf::from(shellexpand::tilde(path).as_ref()),
            required: true,
        });
    }
    config_dir.map(|dir| ConfigPath {
        path: dir.join("memoria").join("config.toml"),
        required: false,
    })
}

/// Read a TOML config file
pub fn load_config(path: &Path) -> Result<SearchConfig> {
    let text = std::fs::read_to_string(path)?;
    parse_config(&text)
}

pub fn parse_config(text: &str) -> Result<SearchConfig> {
    let config: SearchConfig = toml::from_str(text)?;
    let w = &config.weights;
    if w.recent_days < 0 || w.month_days < 0 {
        return Err(MemoriaError::Config(
            "recency windows must not be negative".into(),
        ));
    }
    Ok(config.normalized())
}

/// Resolve and load, falling back to defaults when the optional per-user
/// file does not exist
pub fn load_resolved(explicit: Option<&str>) -> Result<SearchConfig> {
    match resolve_config_path(explicit) {
        Some(ConfigPath { path, required }) => {
            if !required && !path.exists() {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(SearchConfig::default());
            }
            tracing::debug!(path = %path.display(), "loading config");
            load_config(&path).map_err(|e| match e {
                MemoriaError::Io(io) => {
                    MemoriaError::Config(format!("cannot read {}: {}", path.display(), io))
                }
                other => other,
            })
        }
        None => Ok(SearchConfig::default()),
    }
}
