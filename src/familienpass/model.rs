use crate::familienpass::sign_up::{parse_window, DIRECT_REGISTRATION_PHRASE};
use chrono::NaiveDate;

/// Raw sign-up text when the organizer handles registration
pub const DIRECT_REGISTRATION_TEXT: &str = "Die Anmeldung erfolgt direkt beim Veranstalter.";
/// Raw sign-up text when the page didn't announce any registration
pub const NOT_SPECIFIED_TEXT: &str = "Not specified";
pub const NO_DESCRIPTION_TEXT: &str = "No description available";
/// Sheet label of an event whose page has no title
pub const UNTITLED_EVENT_TEXT: &str = "(ohne Titel)";

/// A link found on a listing page together with the date label of its row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub detail_url: String,
    pub listing_date: String,
}

impl ListingEntry {
    pub fn new(detail_url: String, listing_date: String) -> Self {
        Self {
            detail_url,
            listing_date,
        }
    }
}

/// One scraped appearance of an event on one date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOccurrence {
    pub name: String,
    pub age: String,
    pub place: String,
    pub date: String,
    pub time: String,
    pub sign_up_raw: String,
    pub sign_up: SignUp,
    pub detail_url: String,
    pub description: String,
}

impl EventOccurrence {
    /// Stand-in for an event whose page couldn't be scraped, so curators can spot it
    pub fn failed(entry: &ListingEntry, reason: &str) -> Self {
        Self {
            name: format!("ERROR: {}", entry.detail_url),
            age: String::new(),
            place: String::new(),
            date: entry.listing_date.clone(),
            time: String::new(),
            sign_up_raw: String::new(),
            sign_up: SignUp::Unspecified,
            detail_url: entry.detail_url.clone(),
            description: format!("Scraping failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUp {
    Window(SignUpWindow),
    /// Registration happens with the organizer, there is no lottery period
    DirectRegistration,
    Unspecified,
}

impl SignUp {
    pub fn from_raw(raw: &str) -> Self {
        if raw.contains(DIRECT_REGISTRATION_PHRASE) {
            return SignUp::DirectRegistration;
        }

        parse_window(raw)
            .map(SignUp::Window)
            .unwrap_or(SignUp::Unspecified)
    }

    pub fn window(&self) -> Option<SignUpWindow> {
        match self {
            SignUp::Window(window) => Some(*window),
            _ => None,
        }
    }
}

/// Inclusive range of days in which sign-up is possible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignUpWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SignUpWindow {
    /// `None` when `end` precedes `start`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }
}

/// A row of the exported sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputRow {
    Primary(PrimaryRow),
    Continuation(ContinuationRow),
}

impl OutputRow {
    pub fn name(&self) -> &str {
        match self {
            OutputRow::Primary(row) => &row.occurrence.name,
            OutputRow::Continuation(row) => &row.name,
        }
    }

    pub fn date(&self) -> &str {
        match self {
            OutputRow::Primary(row) => &row.occurrence.date,
            OutputRow::Continuation(row) => &row.date,
        }
    }

    pub fn detail_url(&self) -> &str {
        match self {
            OutputRow::Primary(row) => &row.occurrence.detail_url,
            OutputRow::Continuation(row) => &row.detail_url,
        }
    }
}

/// Earliest occurrence of an event, carrying every field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryRow {
    pub occurrence: EventOccurrence,
    pub selected: String,
}

impl PrimaryRow {
    /// Name shown in the sheet, never blank so the row can't pass for a continuation
    pub fn label(&self) -> &str {
        match self.occurrence.name.trim() {
            "" => UNTITLED_EVENT_TEXT,
            _ => &self.occurrence.name,
        }
    }
}

/// Further occurrence of an event, only with its own schedule and link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationRow {
    /// Index of the owning primary row within the same output
    pub primary_row: usize,
    pub name: String,
    pub detail_url: String,
    pub date: String,
    pub time: String,
    pub sign_up_raw: String,
}
