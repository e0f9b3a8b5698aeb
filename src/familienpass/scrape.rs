use crate::config::model::{Config, ScraperConfig};
use crate::export::spreadsheet::{load_selections, write_events, SheetError};
use crate::familienpass::detail::parse_detail;
use crate::familienpass::grouping::group;
use crate::familienpass::listing::{page_url, parse_listing};
use crate::familienpass::model::{EventOccurrence, ListingEntry};
use crate::fetcher::Fetch;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{error, info, instrument};

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("No events found on any listing page")]
    NoEventsFound,
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

#[derive(Debug)]
pub struct ScrapeSummary {
    pub occurrences: usize,
    pub unique_events: usize,
    pub carried_selections: usize,
    pub output_path: PathBuf,
}

/// Walks every listing page; a page that can't be fetched is skipped.
#[instrument(skip_all, fields(total_pages = config.total_pages))]
pub async fn collect_event_urls<F: Fetch>(fetcher: &F, config: &ScraperConfig) -> Vec<ListingEntry> {
    let site_root = config.site_root();
    let mut entries = Vec::new();

    for page in 1..=config.total_pages {
        let url = page_url(&config.base_url, page);

        info!("Scraping page {}/{}", page, config.total_pages);

        match fetcher.fetch(&url).await {
            Ok(html) => {
                let page_entries = parse_listing(&html, &site_root);

                info!("Found {} events on page {}", page_entries.len(), page);

                entries.extend(page_entries);
            }
            Err(err) => {
                error!("Failed to scrape page {}: {}", page, err);
            }
        }

        if page < config.total_pages {
            tokio::time::sleep(config.delay_between_pages).await;
        }
    }

    entries
}

/// Never fails: a page that can't be fetched yields a placeholder marked as an error.
#[instrument(skip(fetcher), fields(url = %entry.detail_url))]
pub async fn scrape_event_details<F: Fetch>(fetcher: &F, entry: &ListingEntry) -> EventOccurrence {
    match fetcher.fetch(&entry.detail_url).await {
        Ok(html) => {
            let mut event = parse_detail(&html, &entry.detail_url);

            if event.date.is_empty() {
                event.date = entry.listing_date.clone();
            }

            event
        }
        Err(err) => {
            error!("Failed scraping event: {}", err);

            EventOccurrence::failed(entry, &err.to_string())
        }
    }
}

/// Scrapes every listed event, in listing order.
pub async fn scrape_events<F: Fetch>(
    fetcher: &F,
    config: &ScraperConfig,
) -> Result<Vec<EventOccurrence>, ScrapeError> {
    let entries = collect_event_urls(fetcher, config).await;

    info!("Found {} events total", entries.len());

    if entries.is_empty() {
        return Err(ScrapeError::NoEventsFound);
    }

    let mut events = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        info!("Event {}/{}", index + 1, entries.len());

        events.push(scrape_event_details(fetcher, entry).await);

        if index + 1 < entries.len() {
            tokio::time::sleep(config.delay_between_events).await;
        }
    }

    Ok(events)
}

/// Scrapes the site and rewrites the events sheet, keeping the selections of the previous one.
pub async fn run_scraper<F: Fetch>(config: &Config, fetcher: &F) -> Result<ScrapeSummary, ScrapeError> {
    let events = scrape_events(fetcher, &config.scraper).await?;

    let output_path = config.output.events_path();
    let selections = load_selections(&output_path);

    if !selections.is_empty() {
        info!("Loaded {} existing selections", selections.len());
    }

    let occurrences = events.len();
    let unique_events = events
        .iter()
        .map(|event| event.name.as_str())
        .collect::<HashSet<_>>()
        .len();

    let rows = group(events, &selections);
    let carried_selections = selections
        .keys()
        .filter(|name| rows.iter().any(|row| row.name() == name.as_str()))
        .count();

    write_events(&rows, &output_path, &config.output.continuation_marker)?;

    Ok(ScrapeSummary {
        occurrences,
        unique_events,
        carried_selections,
        output_path,
    })
}
