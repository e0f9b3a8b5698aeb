use crate::familienpass::model::SignUpWindow;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

pub const DIRECT_REGISTRATION_PHRASE: &str = "direkt beim Veranstalter";

const RANGE_SEPARATOR: &str = " - ";
const NOT_SPECIFIED: &str = "not specified";
const DATE_FORMAT: &str = "%d.%m.%Y";

lazy_static! {
    static ref LEADING_DATE: Regex =
        Regex::new(r"^\d{2}\.\d{2}\.\d{4}").expect("Failed to create date regex");
}

/**
Parses a sign-up period such as `01.05.2024 - 10.05.2024` or `01.05.2024`.

Text after a date is ignored. Returns `None` when there is no window to register in,
or when any date of it is not a real calendar day.
*/
pub fn parse_window(text: &str) -> Option<SignUpWindow> {
    let text = text.trim();

    if text.is_empty() || text.eq_ignore_ascii_case(NOT_SPECIFIED) {
        return None;
    }

    if text.contains(DIRECT_REGISTRATION_PHRASE) {
        return None;
    }

    match text.split_once(RANGE_SEPARATOR) {
        Some((start, end)) => SignUpWindow::new(parse_leading_date(start)?, parse_leading_date(end)?),
        None => parse_leading_date(text).map(SignUpWindow::single_day),
    }
}

fn parse_leading_date(text: &str) -> Option<NaiveDate> {
    let date = LEADING_DATE.find(text.trim())?;

    NaiveDate::parse_from_str(date.as_str(), DATE_FORMAT).ok()
}
