//! Settings for the analysis pipeline
//!
//! Stored as JSON next to the binary. Values are passed explicitly to the
//! dispatcher on each submission; nothing reads them from global state.

use crate::error::HabitError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "habit_config.json";

pub const ENV_CREDENTIALS: &str = "HABIT_GIGA_CREDENTIALS";
pub const ENV_VERIFY_SSL: &str = "HABIT_VERIFY_SSL_CERTS";
pub const ENV_SCOPE: &str = "HABIT_GIGA_SCOPE";

/// GigaChat API scope
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    #[serde(rename = "GIGACHAT_API_PERS")]
    Personal,
    #[serde(rename = "GIGACHAT_API_B2B")]
    Business,
    #[serde(rename = "GIGACHAT_API_CORP")]
    Corporate,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Personal, Scope::Business, Scope::Corporate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Personal => "GIGACHAT_API_PERS",
            Scope::Business => "GIGACHAT_API_B2B",
            Scope::Corporate => "GIGACHAT_API_CORP",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Scope {
    type Err = HabitError;

    fn from_str(s: &str) -> Result<Self> {
        Scope::ALL
            .into_iter()
            .find(|scope| scope.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| HabitError::ConfigError(format!("Unknown API scope: {}", s)))
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub giga_credentials: String,
    #[serde(default = "default_verify")]
    pub verify_ssl_certs: bool,
    #[serde(default)]
    pub scope: Scope,
}

fn default_verify() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            giga_credentials: String::new(),
            verify_ssl_certs: true,
            scope: Scope::default(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("giga_credentials", &self.masked_credentials())
            .field("verify_ssl_certs", &self.verify_ssl_certs)
            .field("scope", &self.scope)
            .finish()
    }
}

impl Settings {
    /// Load settings, writing defaults when the file is missing or unreadable
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            match fs::read_to_string(path)
                .map_err(HabitError::from)
                .and_then(|text| serde_json::from_str::<Settings>(&text).map_err(HabitError::from))
            {
                Ok(settings) => {
                    info!(path = %path.display(), "Loaded settings");
                    return Ok(settings);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Settings unreadable, restoring defaults");
                }
            }
        }

        let settings = Settings::default();
        settings.save(path)?;
        info!(path = %path.display(), "Wrote default settings");
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Apply `HABIT_*` environment variables on top of the file values
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(credentials) = env::var(ENV_CREDENTIALS) {
            self.giga_credentials = credentials.trim().to_string();
        }

        if let Ok(verify) = env::var(ENV_VERIFY_SSL) {
            self.verify_ssl_certs = match verify.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(HabitError::ConfigError(format!(
                        "{} must be a boolean, got {:?}",
                        ENV_VERIFY_SSL, other
                    )))
                }
            };
        }

        if let Ok(scope) = env::var(ENV_SCOPE) {
            self.scope = scope.parse()?;
        }

        Ok(self)
    }

    /// Analysis is only possible with credentials configured
    pub fn has_credentials(&self) -> bool {
        !self.giga_credentials.trim().is_empty()
    }

    pub fn masked_credentials(&self) -> String {
        if self.has_credentials() {
            "********".to_string()
        } else {
            String::new()
        }
    }
}
