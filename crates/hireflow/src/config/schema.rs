use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::AutomationRule;
use crate::error::ConfigError;
use crate::tracker::TrackerSettings;

/// Stage names treated as automation-only unless configured otherwise.
pub const DEFAULT_AUTOMATED_STAGE_PATTERN: &str = r"(?i)\bai\b.*screen";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub invitations: InvitationConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            database: DatabaseConfig::default(),
            invitations: InvitationConfig::default(),
            relay: RelayConfig::default(),
            automation: AutomationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Tracker settings derived from the invitation and automation sections.
    pub fn tracker_settings(&self) -> Result<TrackerSettings, ConfigError> {
        Ok(TrackerSettings {
            invitation_ttl: chrono::Duration::days(i64::from(self.invitations.ttl_days)),
            link_base: self.invitations.link_base.clone(),
            pass_threshold: self.automation.pass_threshold,
            scoring_attempts: self.automation.scoring_attempts,
            automation: self.automation.rule()?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// SQLite file; `~/.hireflow/data/hireflow.db` when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl DatabaseConfig {
    pub fn resolved_path(&self) -> Option<PathBuf> {
        match &self.path {
            Some(path) => Some(PathBuf::from(path)),
            None => crate::db::default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationConfig {
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u32,
    /// Base URL candidates open with their token appended.
    #[serde(default)]
    pub link_base: Option<String>,
}

fn default_ttl_days() -> u32 {
    7
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            ttl_days: default_ttl_days(),
            link_base: None,
        }
    }
}

/// Longest live indicator window, in seconds.
pub const MAX_LIVE_WINDOW_SECS: u64 = 3600;
/// Largest change feed buffer.
pub const MAX_CHANNEL_CAPACITY: usize = 65_536;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    #[serde(default = "default_live_window_secs")]
    pub live_window_secs: u64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_live_window_secs() -> u64 {
    5
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            live_window_secs: default_live_window_secs(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl RelayConfig {
    pub fn live_window(&self) -> Duration {
        Duration::from_secs(self.live_window_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationConfig {
    /// Stage names matching this pattern are automation-only. `null` disables
    /// name matching; the per-stage flag still applies.
    #[serde(default = "default_automated_stage_pattern")]
    pub automated_stage_pattern: Option<String>,
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
    #[serde(default = "default_scoring_attempts")]
    pub scoring_attempts: u32,
}

fn default_automated_stage_pattern() -> Option<String> {
    Some(DEFAULT_AUTOMATED_STAGE_PATTERN.to_string())
}

fn default_pass_threshold() -> f64 {
    70.0
}

fn default_scoring_attempts() -> u32 {
    3
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            automated_stage_pattern: default_automated_stage_pattern(),
            pass_threshold: default_pass_threshold(),
            scoring_attempts: default_scoring_attempts(),
        }
    }
}

impl AutomationConfig {
    pub fn rule(&self) -> Result<AutomationRule, ConfigError> {
        let pattern = match &self.automated_stage_pattern {
            Some(p) => Some(Regex::new(p).map_err(|e| ConfigError::InvalidPattern {
                name: "automatedStagePattern".to_string(),
                reason: e.to_string(),
            })?),
            None => None,
        };
        Ok(AutomationRule::new(pattern))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}
