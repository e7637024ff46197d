//! Process environment schema.
//!
//! Every variable the tools read is declared once in [`ENV_FIELDS`]; a single
//! loader validates and converts them. `.env.<env>` (or `.env`) is read first
//! and never overrides variables already set in the process.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvKind {
    String,
    Port,
    Bool,
}

/// One declared environment variable.
#[derive(Clone, Copy, Debug)]
pub struct EnvField {
    pub name: &'static str,
    pub env_var: &'static str,
    pub kind: EnvKind,
    pub default: &'static str,
}

pub const ENV_FIELDS: &[EnvField] = &[
    EnvField {
        name: "env",
        env_var: "APP_ENV",
        kind: EnvKind::String,
        default: "development",
    },
    EnvField {
        name: "port",
        env_var: "PORT",
        kind: EnvKind::Port,
        default: "3000",
    },
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnvValue {
    String(String),
    Port(u16),
    Bool(bool),
}

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: String,
        value: String,
        reason: String,
    },

    #[error("failed to read {path}: {source}")]
    Dotenv {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
}

fn convert(field: &EnvField, raw: &str) -> Result<EnvValue, EnvError> {
    let invalid = |reason: &str| EnvError::Invalid {
        var: field.env_var.to_owned(),
        value: raw.to_owned(),
        reason: reason.to_owned(),
    };

    Ok(match field.kind {
        EnvKind::String => EnvValue::String(raw.to_owned()),
        EnvKind::Port => EnvValue::Port(
            raw.trim()
                .parse::<u16>()
                .map_err(|_| invalid("expected a port number"))?,
        ),
        EnvKind::Bool => EnvValue::Bool(match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => return Err(invalid("expected a boolean")),
        }),
    })
}

/// Resolve every field through `lookup`, falling back to its default.
pub fn load_env_fields<F>(
    fields: &[EnvField],
    lookup: F,
) -> Result<BTreeMap<&'static str, EnvValue>, EnvError>
where
    F: Fn(&str) -> Option<String>,
{
    fields
        .iter()
        .map(|field| {
            let raw = lookup(field.env_var).unwrap_or_else(|| field.default.to_owned());
            Ok((field.name, convert(field, &raw)?))
        })
        .collect()
}

/// Typed view over [`ENV_FIELDS`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Environment {
    pub env: String,
    pub port: u16,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            env: "development".to_owned(),
            port: 3000,
        }
    }
}

impl Environment {
    /// Read `.env.<env>` or `.env` from `dir`, then the process environment.
    pub fn load(dir: &Path) -> Result<Self, EnvError> {
        load_dotenv(dir)?;
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, EnvError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = load_env_fields(ENV_FIELDS, lookup)?;
        let mut env = Self::default();
        if let Some(EnvValue::String(v)) = values.remove("env") {
            env.env = v;
        }
        if let Some(EnvValue::Port(p)) = values.remove("port") {
            env.port = p;
        }
        Ok(env)
    }

    pub fn is_development(&self) -> bool {
        self.env == "development"
    }

    pub fn is_production(&self) -> bool {
        self.env == "production"
    }

    pub fn is_testing(&self) -> bool {
        matches!(self.env.as_str(), "test" | "testing")
    }
}

fn load_dotenv(dir: &Path) -> Result<(), EnvError> {
    let env_name = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_owned());
    let specific = dir.join(format!(".env.{env_name}"));
    let path = if specific.is_file() {
        specific
    } else {
        dir.join(".env")
    };

    match dotenvy::from_path(&path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "loaded dotenv file");
            Ok(())
        }
        Err(dotenvy::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(EnvError::Dotenv {
            path: path.to_string_lossy().into_owned(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let env = Environment::from_lookup(lookup(&[])).unwrap();
        assert_eq!(env, Environment::default());
        assert!(env.is_development());
        assert!(!env.is_production());
    }

    #[test]
    fn testing_accepts_both_spellings() {
        for name in ["test", "testing"] {
            let env = Environment::from_lookup(lookup(&[("APP_ENV", name)])).unwrap();
            assert!(env.is_testing(), "{name}");
            assert!(!env.is_development());
        }
    }

    #[test]
    fn port_is_parsed() {
        let env = Environment::from_lookup(lookup(&[("PORT", "8081")])).unwrap();
        assert_eq!(env.port, 8081);
    }

    #[test]
    fn bad_port_names_the_variable() {
        let err = Environment::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("PORT"), "{msg}");
        assert!(msg.contains("eighty"), "{msg}");
    }

    #[test]
    fn bool_fields_convert() {
        const FIELDS: &[EnvField] = &[EnvField {
            name: "debug",
            env_var: "APP_DEBUG",
            kind: EnvKind::Bool,
            default: "false",
        }];
        let vals = load_env_fields(FIELDS, lookup(&[("APP_DEBUG", "Yes")])).unwrap();
        assert_eq!(vals["debug"], EnvValue::Bool(true));
        assert!(load_env_fields(FIELDS, lookup(&[("APP_DEBUG", "maybe")])).is_err());
    }

    #[test]
    fn missing_dotenv_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_dotenv(tmp.path()).is_ok());
    }
}
