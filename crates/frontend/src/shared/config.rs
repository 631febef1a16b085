use serde::Deserialize;
use thiserror::Error;
use web_sys::window;

use crate::shared::wizard::state::{AdvancePolicy, JumpPolicy};

/// localStorage key holding an optional TOML override
const CONFIG_STORAGE_KEY: &str = "dalil_config";

/// Default configuration embedded in the bundle
const DEFAULT_CONFIG: &str = r#"
[modals]
cleanup_delay_ms = 300

[wizard]
advance = "require_valid_step"
jump = "within_bounds"
"#;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub modals: ModalStackConfig,
    pub wizard: WizardConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ModalStackConfig {
    /// Grace period, per close, before a closed modal is purged
    pub cleanup_delay_ms: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WizardConfig {
    pub advance: AdvancePolicy,
    pub jump: JumpPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            modals: ModalStackConfig::default(),
            wizard: WizardConfig::default(),
        }
    }
}

impl Default for ModalStackConfig {
    fn default() -> Self {
        Self {
            cleanup_delay_ms: 300,
        }
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            advance: AdvancePolicy::RequireValidStep,
            jump: JumpPolicy::WithinBounds,
        }
    }
}

pub fn parse_config(source: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(source)?)
}

fn get_local_storage() -> Option<web_sys::Storage> {
    window()?.local_storage().ok()?
}

/// Load configuration
///
/// Search order:
/// 1. TOML document in localStorage (`dalil_config`)
/// 2. Embedded default config
pub fn load_config() -> AppConfig {
    let stored = get_local_storage().and_then(|s| s.get_item(CONFIG_STORAGE_KEY).ok().flatten());

    if let Some(contents) = stored {
        match parse_config(&contents) {
            Ok(config) => {
                log::info!("Loading config from localStorage ({CONFIG_STORAGE_KEY})");
                return config;
            }
            Err(e) => log::warn!("Ignoring stored config: {e}"),
        }
    }

    parse_config(DEFAULT_CONFIG).unwrap_or_else(|e| {
        log::warn!("Embedded config rejected, using defaults: {e}");
        AppConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config = parse_config(DEFAULT_CONFIG);
        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.modals.cleanup_delay_ms, 300);
    }

    #[test]
    fn test_partial_override() {
        let config = parse_config("[wizard]\nadvance = \"free\"\n").unwrap();
        assert_eq!(config.wizard.advance, AdvancePolicy::Free);
        assert_eq!(config.wizard.jump, JumpPolicy::WithinBounds);
        assert_eq!(config.modals.cleanup_delay_ms, 300);
    }

    #[test]
    fn test_bad_override_is_an_error() {
        assert!(parse_config("[modals]\ncleanup_delay_ms = \"soon\"\n").is_err());
    }
}
