pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, ExportSection, LoggingConfig, ServerConfig, DEFAULT_TIMEOUT_SECONDS, LOG_LEVELS};
pub use credentials::{CredentialStore, TAUTULLI_API_KEY};
pub use paths::{config_base_override, PathManager};
