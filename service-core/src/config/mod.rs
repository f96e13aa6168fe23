use crate::error::AppError;
use config::{Config as Cfg, Environment, File, Map};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Config {
    /// Load from the process environment (after `.env`, if any).
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::load_from(None)
    }

    /// Load from an explicit variable map instead of the process environment.
    ///
    /// `None` reads the real environment. Empty values are treated as unset,
    /// so `PORT=""` falls back to the default.
    pub fn load_from(vars: Option<Map<String, String>>) -> Result<Self, AppError> {
        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(environment(vars))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

fn environment(vars: Option<Map<String, String>>) -> Environment {
    Environment::default()
        .ignore_empty(true)
        .try_parsing(true)
        .source(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn port_defaults_to_8080_when_unset() {
        let config = Config::load_from(vars(&[])).expect("config should load");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn port_is_taken_from_port_variable() {
        let config = Config::load_from(vars(&[("PORT", "9090")])).expect("config should load");
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn empty_port_falls_back_to_default() {
        let config = Config::load_from(vars(&[("PORT", "")])).expect("config should load");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn unrelated_variables_are_ignored() {
        let config = Config::load_from(vars(&[("HOME", "/root"), ("GENAI_MODEL", "x")]))
            .expect("config should load");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn non_numeric_port_is_a_config_error() {
        let err = Config::load_from(vars(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
