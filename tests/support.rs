#![allow(dead_code)]

use familienpass::config::model::{Config, HttpConfig, OutputConfig, ScraperConfig};
use familienpass::fetcher::{Fetch, FetchError};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

pub const MARKER: &str = "↗";

pub fn test_config(base_url: &str, total_pages: u32, output_dir: &Path) -> Config {
    Config {
        scraper: ScraperConfig {
            base_url: base_url.parse().unwrap(),
            total_pages,
            delay_between_pages: Duration::ZERO,
            delay_between_events: Duration::ZERO,
        },
        http: HttpConfig {
            user_agent: "FamilienpassScraper/test".to_string(),
            request_timeout: Duration::from_secs(2),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
        },
        output: OutputConfig {
            directory: output_dir.to_path_buf(),
            continuation_marker: MARKER.to_string(),
        },
    }
}

/// Serves canned pages; unknown URLs answer with HTTP 500
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl Fetch for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());

        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: StatusCode::INTERNAL_SERVER_ERROR,
            })
    }
}

pub fn listing_page(rows: &[(&str, &str)]) -> String {
    let rows = rows
        .iter()
        .map(|(date, href)| format!(r#"<tr><td>{date}</td><td><a href="{href}">Event</a></td></tr>"#))
        .collect::<String>();

    format!(
        r#"<html><body><table class="events-table"><tr><th>Datum</th><th>Veranstaltung</th></tr>{rows}</table></body></html>"#
    )
}

pub fn detail_page(name: &str, date: &str, sign_up: &str) -> String {
    format!(
        r#"<html><body><main>
            <h2>{name}</h2>
            <p>Ein ganz besonderes Erlebnis fuer Kinder und Familien in den Muenchner Ferien.</p>
            <h3>Alter</h3><p>6-10</p>
            <h3>Treffpunkt</h3><p>Marienplatz</p>
            <h3>Datum</h3><p>{date}</p>
            <h3>Uhrzeit</h3><p>10:00 Uhr</p>
            <h3>Anmeldebeginn</h3><p>{sign_up}</p>
        </main></body></html>"#
    )
}
