//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Academic calendar rules
    #[serde(default)]
    pub calendar: RawCalendarConfig,

    /// Matriculation parser settings
    #[serde(default)]
    pub matric: RawMatricConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the store (default: XDG data dir)
    pub data_dir: Option<PathBuf>,
}

/// Academic calendar rules
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCalendarConfig {
    /// Month (1-12) in which a new academic session begins (default: 10)
    pub cutover_month: Option<u32>,

    /// Years of standing credit for transfer students (default: 1)
    pub transfer_credit_years: Option<i32>,
}

/// Matriculation parser settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawMatricConfig {
    /// Department code table, e.g. `CSC = "Computer Science"`.
    /// When empty, the built-in table is used.
    #[serde(default)]
    pub codes: HashMap<String, String>,
}
