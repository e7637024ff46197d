use anyhow::{Context, Result};
use query_core::TranslatorConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::env::Environment;

/// Application configuration: logging plus the query and docs sections.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Logging configuration (optional, derived from the environment if None).
    pub logging: Option<LoggingConfig>,
    /// Query translation settings.
    #[serde(default)]
    pub query: TranslatorConfig,
    /// OpenAPI generation settings.
    #[serde(default)]
    pub docs: DocsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocsConfig {
    pub openapi_version: String,
    /// Document to write (`.json`, `.yaml` or `.yml`).
    pub output: Option<PathBuf>,
    /// Route table to read.
    pub routes: Option<PathBuf>,
    /// `Cargo.toml` whose package section fills `info`.
    pub manifest: Option<PathBuf>,
    pub info: Option<InfoConfig>,
    pub servers: Vec<ServerEntry>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            openapi_version: "3.0.3".to_string(),
            output: None,
            routes: None,
            manifest: None,
            info: None,
            servers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InfoConfig {
    pub title: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerEntry {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Logging configuration - maps target prefixes to their logging settings.
/// Key "default" is the catch-all for logs that don't match explicit targets.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    #[serde(default)]
    pub file: String, // "logs/restkit.log"; empty disables the file sink
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

/// Console-only logging: `debug` while developing, `warn` everywhere else.
pub fn default_logging_config(env: &Environment) -> LoggingConfig {
    let level = if env.is_development() { "debug" } else { "warn" };
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: level.to_string(),
            file: String::new(),
            file_level: String::new(),
            max_backups: None,
            max_size_mb: None,
        },
    );
    logging
}

impl AppConfig {
    /// Load configuration with layered loading: defaults → YAML file → environment variables.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let config_path = config_path.as_ref();
        if !config_path.is_file() {
            anyhow::bail!("config file not found: {}", config_path.display());
        }

        let figment = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(config_path))
            // Example: APP__QUERY__DEFAULT_PAGE_SIZE=50 maps to query.default_page_size
            .merge(Env::prefixed("APP__").split("__"));

        figment
            .extract()
            .with_context(|| format!("Failed to extract config from {}", config_path.display()))
    }

    /// Load configuration from file or fall back to default values.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => Ok(Self::default()),
        }
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Logging sections, or the environment-derived default.
    pub fn logging_or_default(&self, env: &Environment) -> LoggingConfig {
        self.logging
            .clone()
            .unwrap_or_else(|| default_logging_config(env))
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs, env: &Environment) {
        if args.verbose == 0 {
            return;
        }
        let logging = self
            .logging
            .get_or_insert_with(|| default_logging_config(env));
        if let Some(default_section) = logging.get_mut("default") {
            default_section.console_level = match args.verbose {
                1 => "debug".to_string(),
                _ => "trace".to_string(),
            };
        }
    }
}

/// Command line arguments relevant to configuration.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub print_config: bool,
    pub verbose: u8,
}
