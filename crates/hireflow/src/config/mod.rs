pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str};
pub use schema::{
    AutomationConfig, Config, DatabaseConfig, InvitationConfig, LogFormat, LoggingConfig,
    RelayConfig, DEFAULT_AUTOMATED_STAGE_PATTERN,
};
