//! Process bootstrap shared by the `restkit` tools: layered configuration,
//! the declarative environment schema and logging.

pub mod config;
pub mod env;
pub mod logging;

pub use config::{
    default_logging_config, AppConfig, CliArgs, DocsConfig, InfoConfig, LoggingConfig,
    Section, ServerEntry,
};
pub use env::{load_env_fields, EnvError, EnvField, EnvKind, EnvValue, Environment, ENV_FIELDS};
pub use logging::init_logging_from_config;
