//! Process-level plumbing shared by the ReviewHub crates: layered configuration,
//! logging initialization and home directory resolution.

pub mod config;
pub mod home_dir;
pub mod logging;

pub use config::{
    default_logging_config, AppConfig, AppConfigProvider, CliArgs, ClientConfig, ConfigProvider,
    LoggingConfig, Section,
};
pub use home_dir::resolve_home_dir;
