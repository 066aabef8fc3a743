use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

pub const MODEL_PATH_VAR: &str = "MODELPATH";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_JSON_LIMIT: usize = 1024 * 1024;

/// When the model artifact is read from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadPolicy {
    /// Deserialize the artifact for every scoring request.
    PerRequest,
    /// Keep the engine in memory; reload when the file's metadata changes.
    Cached,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Process configuration, read once at startup and handed to the service.
#[derive(Debug, Clone)]
pub struct Config {
    pub model_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub load_policy: LoadPolicy,
    pub json_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model_path = lookup(MODEL_PATH_VAR)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing(MODEL_PATH_VAR))?;

        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let workers = parse_or(&lookup, "WORKERS", num_cpus::get())?;
        if workers == 0 {
            return Err(ConfigError::Invalid {
                key: "WORKERS",
                value: "0".to_string(),
                reason: "at least one worker is required".to_string(),
            });
        }
        let json_limit = parse_or(&lookup, "JSON_LIMIT", DEFAULT_JSON_LIMIT)?;

        let load_policy = match lookup("MODEL_CACHE") {
            None => LoadPolicy::PerRequest,
            Some(flag) => match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => LoadPolicy::Cached,
                "" | "0" | "false" | "no" | "off" => LoadPolicy::PerRequest,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "MODEL_CACHE",
                        value: flag,
                        reason: "expected a boolean".to_string(),
                    })
                }
            },
        };

        Ok(Config {
            model_path,
            host,
            port,
            workers,
            load_policy,
            json_limit,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}
