use crate::familienpass::model::ListingEntry;
use crate::familienpass::text::clean_text;
use lazy_static::lazy_static;
use reqwest::Url;
use scraper::{Html, Selector};
use tracing::{debug, warn};

const PAGE_QUERY_PARAM: &str = "pno";

lazy_static! {
    static ref EVENTS_TABLE: Selector =
        Selector::parse("table.events-table").expect("Failed to create table selector");
    static ref ROW: Selector = Selector::parse("tr").expect("Failed to create row selector");
    static ref CELL: Selector = Selector::parse("td").expect("Failed to create cell selector");
    static ref LINK: Selector = Selector::parse("a[href]").expect("Failed to create link selector");
}

/// URL of a listing page, counting from 1
pub fn page_url(base_url: &Url, page: u32) -> String {
    if page <= 1 {
        base_url.to_string()
    } else {
        format!("{}?{}={}", base_url, PAGE_QUERY_PARAM, page)
    }
}

/**
Collects the event links of a listing page, in page order.

A page holds one events table per month. The first row of each table is its header, the
first column is the date label and the second one links to the event.
*/
pub fn parse_listing(html: &str, site_root: &Url) -> Vec<ListingEntry> {
    let document = Html::parse_document(html);
    let tables = document.select(&EVENTS_TABLE).collect::<Vec<_>>();

    if tables.is_empty() {
        warn!("No events table found on page");
        return Vec::new();
    }

    let mut entries = Vec::new();

    for table in tables {
        for row in table.select(&ROW).skip(1) {
            let cells = row.select(&CELL).collect::<Vec<_>>();
            if cells.len() < 2 {
                continue;
            }

            let date = clean_text(&cells[0].text().collect::<String>());
            let href = cells[1]
                .select(&LINK)
                .next()
                .and_then(|link| link.value().attr("href"))
                .map(str::trim)
                .filter(|href| !href.is_empty());

            let Some(href) = href else {
                debug!("Skipping row without link (date '{}')", date);
                continue;
            };

            match resolve_url(href, site_root) {
                Some(url) => entries.push(ListingEntry::new(url, date)),
                None => warn!("Skipping invalid event link '{}'", href),
            }
        }
    }

    entries
}

fn resolve_url(href: &str, site_root: &Url) -> Option<String> {
    if href.starts_with("http") {
        return Some(href.to_string());
    }

    site_root.join(href).ok().map(String::from)
}
