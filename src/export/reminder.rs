use crate::export::spreadsheet::{read_rows, selected_occurrences, SelectedOccurrence};
use crate::export::{sign_up_title, ExportError};
use crate::familienpass::sign_up::parse_window;
use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Reminder list the entries are meant for
pub const REMINDER_LIST_NAME: &str = "Familienpass";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reminder {
    pub title: String,
    pub due_date: NaiveDate,
    pub url: Option<String>,
    pub notes: String,
}

#[derive(Debug, Serialize)]
pub struct ReminderList<'a> {
    pub list: &'a str,
    pub reminders: &'a [Reminder],
}

/// One reminder per selected occurrence, due when its sign-up window opens.
pub fn build_reminders(occurrences: &[SelectedOccurrence]) -> Vec<Reminder> {
    occurrences
        .iter()
        .filter_map(|occurrence| {
            let Some(window) = parse_window(&occurrence.sign_up_raw) else {
                if !occurrence.is_continuation {
                    warn!("Skipping '{}': No valid sign-up date", occurrence.event_name);
                }
                return None;
            };

            Some(Reminder {
                title: sign_up_title(&occurrence.event_name),
                due_date: window.start,
                url: occurrence.url.clone(),
                notes: build_notes(occurrence),
            })
        })
        .collect()
}

fn build_notes(occurrence: &SelectedOccurrence) -> String {
    let mut lines = Vec::new();

    if let Some(url) = &occurrence.url {
        lines.push(url.clone());
    }

    lines.push(format!("Anmeldezeitraum: {}", occurrence.sign_up_raw));

    if !occurrence.date.is_empty() {
        if occurrence.time.is_empty() {
            lines.push(format!("Datum: {}", occurrence.date));
        } else {
            lines.push(format!("Datum: {}, {}", occurrence.date, occurrence.time));
        }
    }

    lines.iter().join("\n")
}

/// Logs what would be created without writing anything
pub fn log_dry_run(reminders: &[Reminder]) {
    info!("Dry run - {} reminder(s) would be created", reminders.len());

    for (index, reminder) in reminders.iter().enumerate() {
        info!(
            "Reminder {}: '{}' due {} ({}) notes: {}",
            index + 1,
            reminder.title,
            reminder.due_date.format("%d.%m.%Y"),
            reminder.url.as_deref().unwrap_or("(none)"),
            reminder.notes.replace('\n', " | ")
        );
    }
}

pub fn read_reminders(sheet_path: &Path, continuation_marker: &str) -> Result<Vec<Reminder>, ExportError> {
    let rows = read_rows(sheet_path, continuation_marker)?;

    Ok(build_reminders(&selected_occurrences(&rows)))
}

#[instrument(skip(reminders), fields(reminders = reminders.len()))]
pub fn write_reminders(reminders: &[Reminder], output_path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(&ReminderList {
        list: REMINDER_LIST_NAME,
        reminders,
    })?;

    if let Some(parent) = output_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, json)?;

    info!(
        "{} reminder(s) written for list '{}': {}",
        reminders.len(),
        REMINDER_LIST_NAME,
        output_path.display()
    );

    Ok(())
}
