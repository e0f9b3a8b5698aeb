use crate::export::spreadsheet::{read_rows, selected_occurrences, SelectedOccurrence};
use crate::export::{sign_up_title, ExportError};
use crate::familienpass::model::SignUpWindow;
use crate::familienpass::sign_up::parse_window;
use chrono::{Duration, NaiveDate};
use icalendar::{Alarm, Calendar, Component, EventLike, Trigger};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

const PRODID: &str = "-//Familienpass Events//muenchen.de//";
const UID_DOMAIN: &str = "familienpass";
const UID_HASH_CHARS: usize = 32;

#[derive(Debug)]
pub struct CalendarExport {
    pub ics: String,
    pub created: usize,
    /// Selected occurrences without a usable sign-up window
    pub skipped: usize,
}

#[derive(Debug)]
pub struct CalendarSummary {
    pub created: usize,
    pub skipped: usize,
    /// `None` when there was nothing to write
    pub output_path: Option<PathBuf>,
}

/// One all-day entry per selected occurrence, spanning its sign-up window.
pub fn build_calendar(occurrences: &[SelectedOccurrence]) -> CalendarExport {
    let mut calendar = Calendar::new();
    let mut created = 0;
    let mut skipped = 0;

    for occurrence in occurrences {
        let Some(window) = parse_window(&occurrence.sign_up_raw) else {
            if !occurrence.is_continuation {
                warn!("Skipping '{}': No valid sign-up date", occurrence.event_name);
            }
            skipped += 1;
            continue;
        };

        calendar.push(sign_up_event(occurrence, window));
        created += 1;

        info!(
            "Created: {} ({} - {})",
            sign_up_title(&occurrence.event_name),
            window.start.format("%d.%m.%Y"),
            window.end.format("%d.%m.%Y")
        );
    }

    CalendarExport {
        ics: set_prodid(&calendar.done().to_string()),
        created,
        skipped,
    }
}

fn sign_up_event(occurrence: &SelectedOccurrence, window: SignUpWindow) -> icalendar::Event {
    let title = sign_up_title(&occurrence.event_name);
    let mut event = icalendar::Event::new();

    event
        .uid(&event_uid(&occurrence.event_name, window))
        .summary(&title)
        .starts(window.start)
        // DTEND is exclusive
        .ends(window.end + Duration::days(1))
        .alarm(Alarm::display(&title, Trigger::before_start(Duration::zero())));

    if let Some(url) = &occurrence.url {
        event.add_property("URL", url);
    }

    event.done()
}

/// Stable across runs, so re-importing the calendar updates entries instead of duplicating them
pub fn event_uid(event_name: &str, window: SignUpWindow) -> String {
    let source = format!(
        "{}-{}-{}",
        event_name,
        midnight(window.start),
        midnight(window.end)
    );
    let hash = format!("{:x}", Sha256::digest(source.as_bytes()));

    format!("{}@{}", &hash[..UID_HASH_CHARS], UID_DOMAIN)
}

fn midnight(date: NaiveDate) -> String {
    format!("{}T00:00:00", date.format("%Y-%m-%d"))
}

/// The icalendar crate always writes its own PRODID
fn set_prodid(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODID);
        } else {
            result.push_str(line);
        }
        result.push_str("\r\n");
    }

    result
}

/// Reads the events sheet and writes the calendar when at least one entry was created.
#[instrument]
pub fn create_calendar(
    sheet_path: &Path,
    continuation_marker: &str,
    output_path: &Path,
) -> Result<CalendarSummary, ExportError> {
    let rows = read_rows(sheet_path, continuation_marker)?;
    let export = build_calendar(&selected_occurrences(&rows));

    if export.created == 0 {
        return Ok(CalendarSummary {
            created: 0,
            skipped: export.skipped,
            output_path: None,
        });
    }

    if let Some(parent) = output_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, &export.ics)?;

    info!("Calendar file created: {}", output_path.display());

    Ok(CalendarSummary {
        created: export.created,
        skipped: export.skipped,
        output_path: Some(output_path.to_path_buf()),
    })
}
