use crate::familienpass::model::{ContinuationRow, EventOccurrence, OutputRow, PrimaryRow};
use std::collections::HashMap;

const UNKNOWN_DATE_KEY: (&str, &str, &str) = ("9999", "99", "99");

/**
Merges occurrences of the same event into one primary row followed by its continuation rows.

Events keep the order in which they were first seen. Within an event, occurrences are sorted
by date, the earliest one becoming the primary row. Prior selections are carried over by
the event's sheet label.
*/
pub fn group(
    occurrences: Vec<EventOccurrence>,
    prior_selections: &HashMap<String, String>,
) -> Vec<OutputRow> {
    let mut groups: Vec<(String, Vec<EventOccurrence>)> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();

    for occurrence in occurrences {
        let index = *group_index
            .entry(occurrence.name.clone())
            .or_insert_with(|| {
                groups.push((occurrence.name.clone(), Vec::new()));
                groups.len() - 1
            });

        groups[index].1.push(occurrence);
    }

    let mut rows = Vec::new();

    for (name, mut occurrences) in groups {
        occurrences.sort_by_key(|occurrence| date_sort_key(&occurrence.date));

        let primary_row = rows.len();
        let mut occurrences = occurrences.into_iter();

        if let Some(first) = occurrences.next() {
            let mut primary = PrimaryRow {
                occurrence: first,
                selected: String::new(),
            };
            primary.selected = prior_selections
                .get(primary.label())
                .cloned()
                .unwrap_or_default();
            rows.push(OutputRow::Primary(primary));
        }

        rows.extend(occurrences.map(|occurrence| {
            OutputRow::Continuation(ContinuationRow {
                primary_row,
                name: name.clone(),
                detail_url: occurrence.detail_url,
                date: occurrence.date,
                time: occurrence.time,
                sign_up_raw: occurrence.sign_up_raw,
            })
        }));
    }

    rows
}

/// `DD.MM.YYYY` as `(YYYY, MM, DD)`; anything else sorts last
fn date_sort_key(date: &str) -> (String, String, String) {
    let parts = date.trim().split('.').collect::<Vec<_>>();

    let (year, month, day) = match parts.as_slice() {
        [day, month, year] => (*year, *month, *day),
        _ => UNKNOWN_DATE_KEY,
    };

    (year.to_string(), month.to_string(), day.to_string())
}
