//! Configuration — layered figment stack: config file < `AKVIO_` env
//! vars; CLI flags are applied on top by `main`.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the Akvio platform, e.g. `https://api.akvio.io`.
    pub platform_url: String,
    /// API key sent as `X-API-KEY` on every request.
    pub api_key: SecretString,
    /// Tracing filter for the log file.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "info".into()
}

/// Platform-conventional config file location.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "akvio", "akvio-tui")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from an explicit path, or the default location.
pub fn load(path: Option<&Path>) -> Result<Config, figment::Error> {
    let mut figment = Figment::new();
    match path {
        Some(path) => figment = figment.merge(Toml::file(path)),
        None => {
            if let Some(path) = default_config_path() {
                figment = figment.merge(Toml::file(path));
            }
        }
    }
    figment.merge(Env::prefixed("AKVIO_")).extract()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn loads_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "platform_url = \"https://api.example.com\"\napi_key = \"k-123\""
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.platform_url, "https://api.example.com");
        assert_eq!(config.api_key.expose_secret(), "k-123");
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn log_filter_can_be_overridden_in_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "platform_url = \"https://api.example.com\"\napi_key = \"k\"\nlog_filter = \"akvio_core=debug\""
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.log_filter, "akvio_core=debug");
    }

    #[test]
    fn missing_required_fields_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "platform_url = \"https://api.example.com\"").unwrap();

        assert!(load(Some(file.path())).is_err());
    }
}
