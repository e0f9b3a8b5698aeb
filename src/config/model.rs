use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

const EVENTS_FILE_NAME: &str = "familienpass_events.xlsx";
const CALENDAR_FILE_NAME: &str = "familienpass_calendar.ics";
const REMINDERS_FILE_NAME: &str = "familienpass_reminders.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub scraper: ScraperConfig,
    pub http: HttpConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// First listing page; later pages append `?pno=<n>`
    pub base_url: Url,
    pub total_pages: u32,
    pub delay_between_pages: Duration,
    pub delay_between_events: Duration,
}

impl ScraperConfig {
    /// Root used to resolve relative event links
    pub fn site_root(&self) -> Url {
        let mut root = self.base_url.clone();
        root.set_path("/");
        root.set_query(None);
        root.set_fragment(None);
        root
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub user_agent: String,
    pub request_timeout: Duration,
    /// Total attempts per request, including the first one
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Shown in the name column of continuation rows
    pub continuation_marker: String,
}

impl OutputConfig {
    pub fn events_path(&self) -> PathBuf {
        self.directory.join(EVENTS_FILE_NAME)
    }

    pub fn calendar_path(&self) -> PathBuf {
        self.directory.join(CALENDAR_FILE_NAME)
    }

    pub fn reminders_path(&self) -> PathBuf {
        self.directory.join(REMINDERS_FILE_NAME)
    }
}
