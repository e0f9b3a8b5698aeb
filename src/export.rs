use crate::export::spreadsheet::SheetError;

pub mod calendar;
pub mod reminder;
pub mod spreadsheet;

/// Prefix of calendar entries and reminders
pub const SIGN_UP_TITLE_PREFIX: &str = "Anmeldung Familienpass";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error("Couldn't write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("Couldn't serialize reminders: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn sign_up_title(event_name: &str) -> String {
    format!("{}: {}", SIGN_UP_TITLE_PREFIX, event_name)
}
