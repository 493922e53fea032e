use padic_kernel::{KernelError, Prime};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "padic.toml";
const DEFAULT_PRIME: u64 = 2;
const DEFAULT_PRECISION: u32 = 8;
const DEFAULT_WORKING_PRECISION: u32 = 32;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {label} at {path}: {source}")]
    Read {
        label: &'static str,
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Config {
        path: String,
        source: toml::de::Error,
    },

    #[error("failed to parse {label} JSON at {path}: {source}")]
    Json {
        label: &'static str,
        path: String,
        source: serde_json::Error,
    },

    #[error("precision {precision} exceeds working precision {working}")]
    Precision { precision: u32, working: u32 },

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

/// `padic.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub prime: u64,
    pub precision: u32,
    pub working_precision: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prime: DEFAULT_PRIME,
            precision: DEFAULT_PRECISION,
            working_precision: DEFAULT_WORKING_PRECISION,
        }
    }
}

/// Config after flag overrides, with the prime validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub prime: Prime,
    pub precision: u32,
    pub working_precision: u32,
}

impl Config {
    pub fn resolve(
        &self,
        prime: Option<Prime>,
        precision: Option<u32>,
    ) -> Result<Settings, CliError> {
        let prime = match prime {
            Some(p) => p,
            None => Prime::new(self.prime)?,
        };
        let precision = precision.unwrap_or(self.precision);
        if precision > self.working_precision {
            return Err(CliError::Precision {
                precision,
                working: self.working_precision,
            });
        }
        Ok(Settings {
            prime,
            precision,
            working_precision: self.working_precision,
        })
    }
}

/// Load the config named by `--config`, or `padic.toml` when present.
///
/// A missing default file means defaults; a missing explicit file is an
/// error.
pub fn load_config(explicit: Option<&str>) -> Result<Config, CliError> {
    let path = match explicit {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => DEFAULT_CONFIG_PATH,
        None => return Ok(Config::default()),
    };
    let text = fs::read_to_string(path).map_err(|source| CliError::Read {
        label: "config",
        path: path.to_string(),
        source,
    })?;
    parse_config(&text).map_err(|source| CliError::Config {
        path: path.to_string(),
        source,
    })
}

fn parse_config(text: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(text)
}

pub fn read_json_file<T>(path: &str, label: &'static str) -> Result<T, CliError>
where
    T: serde::de::DeserializeOwned,
{
    let bytes = fs::read(path).map_err(|source| CliError::Read {
        label,
        path: path.to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| CliError::Json {
        label,
        path: path.to_string(),
        source,
    })
}

pub fn print_json(payload: &serde_json::Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(payload)?);
    Ok(())
}

pub fn join_digits(digits: &[u64]) -> String {
    digits
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
