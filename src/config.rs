//! Environment driven configuration.
//!
//! Every option has a default so the service starts with an empty environment,
//! except `API_KEY`: without it the protected routes answer 500 until one is set.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_RATE_LIMIT_WINDOW_MS: u64 = 15 * 60 * 1000;
const DEFAULT_RATE_LIMIT_MAX: u32 = 100;
const DEFAULT_UPLOAD_MAX_SIZE: usize = 5 * 1024 * 1024;
const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BROWSER_EXECUTABLE: &str = "chromium";
const DEFAULT_BROWSER_ARGS: [&str; 3] = [
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {name} has invalid value '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

/// Launch settings for the headless browser used by the PDF exporter.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub executable: String,
    pub args: Vec<String>,
    pub headless: bool,
    pub timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: DEFAULT_BROWSER_EXECUTABLE.to_string(),
            args: default_browser_args(),
            headless: true,
            timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub database_path: String,
    pub rate_limit_window: Duration,
    pub rate_limit_max: u32,
    pub upload_dir: PathBuf,
    pub upload_max_size: usize,
    pub browser: BrowserConfig,
    pub domain: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            database_path: "database/invoices.db".to_string(),
            rate_limit_window: Duration::from_millis(DEFAULT_RATE_LIMIT_WINDOW_MS),
            rate_limit_max: DEFAULT_RATE_LIMIT_MAX,
            upload_dir: PathBuf::from("public/uploads/logos"),
            upload_max_size: DEFAULT_UPLOAD_MAX_SIZE,
            browser: BrowserConfig::default(),
            domain: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let browser = BrowserConfig {
            executable: non_empty_var("BROWSER_EXECUTABLE_PATH")
                .unwrap_or(defaults.browser.executable),
            args: non_empty_var("BROWSER_ARGS")
                .map(|raw| parse_browser_args(&raw))
                .unwrap_or(defaults.browser.args),
            headless: non_empty_var("BROWSER_HEADLESS")
                .map(|raw| raw != "false")
                .unwrap_or(true),
            timeout: Duration::from_secs(parse_var(
                "RENDER_TIMEOUT_SECS",
                DEFAULT_RENDER_TIMEOUT_SECS,
            )?),
        };

        Ok(Self {
            host: non_empty_var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", DEFAULT_PORT)?,
            api_key: non_empty_var("API_KEY"),
            database_path: non_empty_var("DATABASE_PATH").unwrap_or(defaults.database_path),
            rate_limit_window: Duration::from_millis(parse_var(
                "RATE_LIMIT_WINDOW_MS",
                DEFAULT_RATE_LIMIT_WINDOW_MS,
            )?),
            rate_limit_max: parse_var("RATE_LIMIT_MAX", DEFAULT_RATE_LIMIT_MAX)?,
            upload_dir: non_empty_var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            upload_max_size: parse_var("UPLOAD_MAX_SIZE", DEFAULT_UPLOAD_MAX_SIZE)?,
            browser,
            domain: non_empty_var("DOMAIN"),
        })
    }

    /// Base URL used when handing out links to uploaded logos.
    pub fn public_base_url(&self) -> String {
        match &self.domain {
            Some(domain) => format!("https://{}", domain),
            None => format!("http://localhost:{}", self.port),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

fn parse_browser_args(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|arg| !arg.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_browser_args() -> Vec<String> {
    if cfg!(windows) {
        Vec::new()
    } else {
        DEFAULT_BROWSER_ARGS.iter().map(|arg| arg.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_args_are_split_and_trimmed() {
        let args = parse_browser_args("--no-sandbox, --font-render-hinting=none,,");
        assert_eq!(args, vec!["--no-sandbox", "--font-render-hinting=none"]);
    }

    #[test]
    fn test_public_base_url_prefers_domain() {
        let mut config = AppConfig::default();
        assert_eq!(config.public_base_url(), "http://localhost:3000");

        config.domain = Some("pdf.example.com".to_string());
        assert_eq!(config.public_base_url(), "https://pdf.example.com");
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.rate_limit_window, Duration::from_secs(900));
        assert_eq!(config.rate_limit_max, 100);
        assert_eq!(config.upload_max_size, 5 * 1024 * 1024);
        assert_eq!(config.browser.timeout, Duration::from_secs(30));
        assert!(config.browser.headless);
        assert!(config.api_key.is_none());
    }
}
