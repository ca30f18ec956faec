//! Runtime settings and session preferences.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const PAGE_SIZE_VAR: &str = "UPI_DESK_PAGE_SIZE";
pub const LATENCY_VAR: &str = "UPI_DESK_LATENCY_MS";
pub const LANG_VAR: &str = "UPI_DESK_LANG";

/// Key under which the language preference is stored for the session.
pub const LANGUAGE_KEY: &str = "upi-desk.language";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("unsupported language '{0}'")]
    UnknownLanguage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Hi,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "hi" => Ok(Language::Hi),
            _ => Err(ConfigError::UnknownLanguage(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub page_size: usize,
    /// Delay applied by every simulated network call.
    pub latency: Duration,
    pub language: Language,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: 10,
            latency: Duration::from_millis(800),
            language: Language::En,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable lookup; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(value) = lookup(PAGE_SIZE_VAR) {
            config.page_size = match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: PAGE_SIZE_VAR,
                        expected: "a positive integer",
                        value,
                    });
                }
            };
        }

        if let Some(value) = lookup(LATENCY_VAR) {
            let ms = value.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: LATENCY_VAR,
                expected: "a number of milliseconds",
                value: value.clone(),
            })?;
            config.latency = Duration::from_millis(ms);
        }

        if let Some(value) = lookup(LANG_VAR) {
            config.language = value.parse()?;
        }

        Ok(config)
    }
}

/// Session-scoped key/value store; contents are lost when the session ends.
#[derive(Debug, Default)]
pub struct Preferences {
    values: HashMap<String, String>,
}

impl Preferences {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Stored language, falling back to English when unset or unreadable.
    pub fn language(&self) -> Language {
        self.get(LANGUAGE_KEY)
            .and_then(|code| code.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_language(&mut self, code: &str) -> Result<Language, ConfigError> {
        let language: Language = code.parse()?;
        self.set(LANGUAGE_KEY, language.code());
        Ok(language)
    }
}
