//! Configuration shared by a set and its tables.

use serde::{Deserialize, Serialize};
use std::env;

/// Prefixes and suffixes used to derive provider object names from a table
/// name. The engine never creates these objects; it only names them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamingConvention {
    pub tracking_tables_prefix: String,
    pub tracking_tables_suffix: String,
    pub triggers_prefix: String,
    pub triggers_suffix: String,
    pub stored_procedures_prefix: String,
    pub stored_procedures_suffix: String,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self {
            tracking_tables_prefix: String::new(),
            tracking_tables_suffix: "_tracking".to_string(),
            triggers_prefix: String::new(),
            triggers_suffix: "_trigger".to_string(),
            stored_procedures_prefix: String::new(),
            stored_procedures_suffix: String::new(),
        }
    }
}

impl NamingConvention {
    pub fn tracking_table_name(&self, table: &str) -> String {
        format!(
            "{}{}{}",
            self.tracking_tables_prefix, table, self.tracking_tables_suffix
        )
    }

    /// Name of the trigger fired by `action` (for example "insert").
    pub fn trigger_name(&self, table: &str, action: &str) -> String {
        format!(
            "{}{}_{}{}",
            self.triggers_prefix, table, action, self.triggers_suffix
        )
    }

    /// Name of the stored procedure performing `action` (for example "update").
    pub fn stored_procedure_name(&self, table: &str, action: &str) -> String {
        format!(
            "{}{}_{}{}",
            self.stored_procedures_prefix, table, action, self.stored_procedures_suffix
        )
    }
}

/// Engine configuration, usually loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Locale name carried as metadata for text comparison
    pub locale: String,
    /// Whether text comparisons and name lookups are case sensitive
    pub case_sensitive: bool,
    /// Provider object naming
    pub naming: NamingConvention,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            case_sensitive: false,
            naming: NamingConvention::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup. Unset
    /// variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let locale = lookup("TABLESYNC_LOCALE").unwrap_or(defaults.locale);

        let case_sensitive = match lookup("TABLESYNC_CASE_SENSITIVE") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidCaseSensitive(raw))?,
            None => defaults.case_sensitive,
        };

        let naming = defaults.naming;
        let naming = NamingConvention {
            tracking_tables_prefix: lookup("TABLESYNC_TRACKING_TABLES_PREFIX")
                .unwrap_or(naming.tracking_tables_prefix),
            tracking_tables_suffix: lookup("TABLESYNC_TRACKING_TABLES_SUFFIX")
                .unwrap_or(naming.tracking_tables_suffix),
            triggers_prefix: lookup("TABLESYNC_TRIGGERS_PREFIX").unwrap_or(naming.triggers_prefix),
            triggers_suffix: lookup("TABLESYNC_TRIGGERS_SUFFIX").unwrap_or(naming.triggers_suffix),
            stored_procedures_prefix: lookup("TABLESYNC_STORED_PROCEDURES_PREFIX")
                .unwrap_or(naming.stored_procedures_prefix),
            stored_procedures_suffix: lookup("TABLESYNC_STORED_PROCEDURES_SUFFIX")
                .unwrap_or(naming.stored_procedures_suffix),
        };

        Ok(Self {
            locale,
            case_sensitive,
            naming,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TABLESYNC_CASE_SENSITIVE value: {0}")]
    InvalidCaseSensitive(String),
}
