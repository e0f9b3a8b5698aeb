use crate::config::model::{Config, HttpConfig, OutputConfig, ScraperConfig};
use reqwest::Url;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str =
    "https://veranstaltungen.muenchen.de/ferienangebote-familienpass/familienpassangebote/";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; FamilienpassScraper/1.0; Educational Purpose)";
pub const DEFAULT_CONTINUATION_MARKER: &str = "↗";

const DEFAULT_TOTAL_PAGES: u32 = 4;
const DEFAULT_PAGE_DELAY_MS: u64 = 1000;
const DEFAULT_EVENT_DELAY_MS: u64 = 500;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_INITIAL_BACKOFF_SECS: u64 = 2;
const DEFAULT_OUTPUT_DIR: &str = "output";
const MAX_INITIAL_BACKOFF_SECS: u64 = 3600;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid config '{name}': '{value}' is not a valid {expected}")]
    InvalidValue {
        name: String,
        value: String,
        expected: &'static str,
    },
    #[error("Invalid config '{0}': must be greater than zero")]
    Zero(String),
    #[error("Invalid config '{name}': must be at most {max}")]
    TooLarge { name: String, max: u64 },
}

pub fn load_config() -> Result<Config, ConfigError> {
    let base_url = load_url_config("FAMILIENPASS_BASE_URL", DEFAULT_BASE_URL)?;
    let total_pages = load_number_config("FAMILIENPASS_TOTAL_PAGES", DEFAULT_TOTAL_PAGES)?;
    let max_attempts = load_number_config("FAMILIENPASS_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;

    if total_pages == 0 {
        return Err(ConfigError::Zero("FAMILIENPASS_TOTAL_PAGES".to_string()));
    }
    if max_attempts == 0 {
        return Err(ConfigError::Zero("FAMILIENPASS_MAX_ATTEMPTS".to_string()));
    }

    Ok(Config {
        scraper: ScraperConfig {
            base_url,
            total_pages,
            delay_between_pages: Duration::from_millis(load_number_config(
                "FAMILIENPASS_PAGE_DELAY_MS",
                DEFAULT_PAGE_DELAY_MS,
            )?),
            delay_between_events: Duration::from_millis(load_number_config(
                "FAMILIENPASS_EVENT_DELAY_MS",
                DEFAULT_EVENT_DELAY_MS,
            )?),
        },
        http: HttpConfig {
            user_agent: load_string_config("FAMILIENPASS_USER_AGENT", DEFAULT_USER_AGENT),
            request_timeout: Duration::from_secs(load_number_config(
                "FAMILIENPASS_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            max_attempts,
            initial_backoff: initial_backoff(load_number_config(
                "FAMILIENPASS_INITIAL_BACKOFF_SECS",
                DEFAULT_INITIAL_BACKOFF_SECS,
            )?)?,
        },
        output: OutputConfig {
            directory: PathBuf::from(load_string_config(
                "FAMILIENPASS_OUTPUT_DIR",
                DEFAULT_OUTPUT_DIR,
            )),
            continuation_marker: load_string_config(
                "FAMILIENPASS_CONTINUATION_MARKER",
                DEFAULT_CONTINUATION_MARKER,
            ),
        },
    })
}

fn initial_backoff(secs: u64) -> Result<Duration, ConfigError> {
    if secs > MAX_INITIAL_BACKOFF_SECS {
        return Err(ConfigError::TooLarge {
            name: "FAMILIENPASS_INITIAL_BACKOFF_SECS".to_string(),
            max: MAX_INITIAL_BACKOFF_SECS,
        });
    }

    Ok(Duration::from_secs(secs))
}

fn load_string_config(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn load_url_config(name: &str, default: &str) -> Result<Url, ConfigError> {
    let value = load_string_config(name, default);

    value.parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        value,
        expected: "URL",
    })
}

fn load_number_config<T: FromStr + ToString>(name: &str, default: T) -> Result<T, ConfigError> {
    let value = load_string_config(name, &default.to_string());

    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        value,
        expected: "non-negative integer",
    })
}
