use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Config {
    /// Loads server settings from an optional `configuration.*` file and the
    /// process environment (`PORT`), after applying any `.env` file.
    pub fn load() -> Result<Self, AppError> {
        Self::from_source(&layered_source()?)
    }

    pub fn from_source(source: &Cfg) -> Result<Self, AppError> {
        Ok(source.clone().try_deserialize()?)
    }
}

/// `.env`, then `configuration.{toml,yaml,json}`, then the environment.
///
/// Keys are case-insensitive: `GEMINI_API_KEY` and `gemini_api_key` name the
/// same setting.
pub fn layered_source() -> Result<Cfg, AppError> {
    dotenvy::dotenv().ok();

    Ok(Cfg::builder()
        .add_source(File::with_name("configuration").required(false))
        .add_source(Environment::default().ignore_empty(true))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn port_defaults_when_absent() {
        let source = Cfg::builder().build().unwrap();
        assert_eq!(Config::from_source(&source).unwrap().port, 3000);
    }

    #[test]
    fn port_is_read_from_a_file_source() {
        let source = Cfg::builder()
            .add_source(File::from_str("port = 8080", FileFormat::Toml))
            .build()
            .unwrap();
        assert_eq!(Config::from_source(&source).unwrap().port, 8080);
    }
}
