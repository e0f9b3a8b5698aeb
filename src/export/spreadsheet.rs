use crate::familienpass::model::OutputRow;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use tracing::{debug, info, instrument, warn};
use umya_spreadsheet::{
    HorizontalAlignmentValues, Pane, PaneStateValues, PaneValues, Style, VerticalAlignmentValues,
    Worksheet,
};

const SHEET_TITLE: &str = "Familienpass Events";
const HEADER_ROW: u32 = 1;
const FIRST_DATA_ROW: u32 = 2;

const HEADER_FILL: &str = "FF366092";
const HEADER_FONT_COLOR: &str = "FFFFFFFF";
const HEADER_FONT_SIZE: f64 = 12.0;
const LINK_FONT_COLOR: &str = "FF0563C1";
const ZOOM_PERCENT: u32 = 150;

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Spreadsheet not found: {0}")]
    NotFound(PathBuf),
    #[error("Couldn't read spreadsheet {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("Couldn't write spreadsheet {path}: {message}")]
    Write { path: PathBuf, message: String },
    #[error("Spreadsheet {0} has no worksheet")]
    MissingWorksheet(PathBuf),
    #[error("Couldn't create output directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Columns of the events sheet, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter, strum::IntoStaticStr)]
pub enum SheetColumn {
    Selected,
    #[strum(serialize = "Event Name")]
    EventName,
    Description,
    #[strum(serialize = "Age (Alter)")]
    Age,
    #[strum(serialize = "Place (Treffpunkt)")]
    Place,
    Date,
    Time,
    #[strum(serialize = "Sign-Up Period (Verlosungszeitraum)")]
    SignUpPeriod,
}

impl SheetColumn {
    /// 1-based column index
    pub fn index(self) -> u32 {
        self as u32 + 1
    }

    fn letter(self) -> String {
        char::from(b'A' + self as u8).to_string()
    }

    fn width(self) -> f64 {
        match self {
            SheetColumn::Selected => 10.0,
            SheetColumn::EventName => 37.33203125,
            SheetColumn::Description => 56.33203125,
            SheetColumn::Age => 12.5,
            SheetColumn::Place => 21.83203125,
            SheetColumn::Date => 10.1640625,
            SheetColumn::Time => 14.0,
            SheetColumn::SignUpPeriod => 22.33203125,
        }
    }
}

/// A row read back from the events sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetRow {
    Primary(SheetPrimaryRow),
    Continuation(SheetContinuationRow),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetPrimaryRow {
    pub selected: String,
    pub name: String,
    pub url: Option<String>,
    pub date: String,
    pub time: String,
    pub sign_up_raw: String,
}

impl SheetPrimaryRow {
    pub fn is_selected(&self) -> bool {
        !self.selected.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetContinuationRow {
    /// Index of the owning primary row in the rows read
    pub primary_row: usize,
    pub url: Option<String>,
    pub date: String,
    pub time: String,
    pub sign_up_raw: String,
}

/// One dated occurrence of an event the curator selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedOccurrence {
    pub event_name: String,
    pub url: Option<String>,
    pub date: String,
    pub time: String,
    pub sign_up_raw: String,
    pub is_continuation: bool,
}

#[instrument(skip(rows), fields(rows = rows.len()))]
pub fn write_events(rows: &[OutputRow], path: &Path, continuation_marker: &str) -> Result<(), SheetError> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| SheetError::MissingWorksheet(path.to_path_buf()))?;

    sheet.set_name(SHEET_TITLE);
    write_header(sheet);
    freeze_header(sheet);

    for (row, output_row) in (FIRST_DATA_ROW..).zip(rows) {
        write_row(sheet, row, output_row, continuation_marker);
    }

    for column in SheetColumn::iter() {
        sheet
            .get_column_dimension_mut(&column.letter())
            .set_width(column.width());
    }

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    umya_spreadsheet::writer::xlsx::write(&book, path).map_err(|err| SheetError::Write {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    info!("Spreadsheet saved: {}", path.display());

    Ok(())
}

fn write_header(sheet: &mut Worksheet) {
    for column in SheetColumn::iter() {
        let header: &'static str = column.into();
        let cell = sheet.get_cell_mut((column.index(), HEADER_ROW));
        cell.set_value(header);

        let style = cell.get_style_mut();
        let font = style.get_font_mut();
        font.set_bold(true);
        font.set_size(HEADER_FONT_SIZE);
        font.get_color_mut().set_argb(HEADER_FONT_COLOR);
        style.set_background_color(HEADER_FILL);

        let alignment = style.get_alignment_mut();
        alignment.set_horizontal(HorizontalAlignmentValues::Center);
        alignment.set_vertical(VerticalAlignmentValues::Top);
        alignment.set_wrap_text(true);
    }
}

/// Keeps the header visible while scrolling, zoomed in for reading
fn freeze_header(sheet: &mut Worksheet) {
    let mut pane = Pane::default();
    pane.set_vertical_split(f64::from(HEADER_ROW));
    pane.get_top_left_cell_mut().set_coordinate(format!("A{FIRST_DATA_ROW}"));
    pane.set_active_pane(PaneValues::BottomLeft);
    pane.set_state(PaneStateValues::Frozen);

    if let Some(view) = sheet.get_sheet_views_mut().get_sheet_view_list_mut().first_mut() {
        view.set_pane(pane);
        view.set_zoom_scale(ZOOM_PERCENT);
    }
}

fn write_row(sheet: &mut Worksheet, row: u32, output_row: &OutputRow, continuation_marker: &str) {
    let (date, time, sign_up) = match output_row {
        OutputRow::Primary(primary) => {
            let event = &primary.occurrence;

            write_cell(sheet, SheetColumn::Selected, row, &primary.selected);
            write_link(sheet, row, primary.label(), &event.detail_url);
            write_cell(sheet, SheetColumn::Description, row, &event.description);
            write_cell(sheet, SheetColumn::Age, row, &event.age);
            write_cell(sheet, SheetColumn::Place, row, &event.place);

            (&event.date, &event.time, &event.sign_up_raw)
        }
        OutputRow::Continuation(continuation) => {
            write_cell(sheet, SheetColumn::Selected, row, "");
            write_link(sheet, row, continuation_marker, &continuation.detail_url);
            write_cell(sheet, SheetColumn::Description, row, "");
            write_cell(sheet, SheetColumn::Age, row, "");
            write_cell(sheet, SheetColumn::Place, row, "");

            (&continuation.date, &continuation.time, &continuation.sign_up_raw)
        }
    };

    write_cell(sheet, SheetColumn::Date, row, date);
    write_cell(sheet, SheetColumn::Time, row, time);
    write_cell(sheet, SheetColumn::SignUpPeriod, row, sign_up);
}

fn write_cell(sheet: &mut Worksheet, column: SheetColumn, row: u32, value: &str) {
    let cell = sheet.get_cell_mut((column.index(), row));

    if !value.is_empty() {
        cell.set_value_string(value);
    }

    wrap_top(cell.get_style_mut());
}

fn write_link(sheet: &mut Worksheet, row: u32, label: &str, url: &str) {
    let cell = sheet.get_cell_mut((SheetColumn::EventName.index(), row));
    cell.set_value_string(label);
    cell.get_hyperlink_mut().set_url(url);

    let style = cell.get_style_mut();
    let font = style.get_font_mut();
    font.get_color_mut().set_argb(LINK_FONT_COLOR);
    font.set_underline("single");
    wrap_top(style);
}

fn wrap_top(style: &mut Style) {
    let alignment = style.get_alignment_mut();
    alignment.set_vertical(VerticalAlignmentValues::Top);
    alignment.set_wrap_text(true);
}

/**
Maps event names to the selection made in an existing sheet.

A missing sheet has no selections. An unreadable one is reported and treated the same, so a
broken previous output doesn't block a new scrape.
*/
pub fn load_selections(path: &Path) -> HashMap<String, String> {
    if !path.exists() {
        debug!("No previous spreadsheet at {}", path.display());
        return HashMap::new();
    }

    let book = match umya_spreadsheet::reader::xlsx::read(path) {
        Ok(book) => book,
        Err(err) => {
            warn!("Could not load existing selections: {}", err);
            return HashMap::new();
        }
    };

    let Some(sheet) = book.get_sheet(&0) else {
        warn!("Could not load existing selections: {} has no worksheet", path.display());
        return HashMap::new();
    };

    (FIRST_DATA_ROW..=sheet.get_highest_row())
        .filter_map(|row| {
            let selected = sheet.get_value((SheetColumn::Selected.index(), row));
            let name = sheet.get_value((SheetColumn::EventName.index(), row));

            (!name.is_empty() && !selected.trim().is_empty()).then_some((name, selected))
        })
        .collect()
}

/// Reads the events sheet, resolving every continuation row to the primary row above it.
#[instrument]
pub fn read_rows(path: &Path, continuation_marker: &str) -> Result<Vec<SheetRow>, SheetError> {
    if !path.exists() {
        return Err(SheetError::NotFound(path.to_path_buf()));
    }

    let book = umya_spreadsheet::reader::xlsx::read(path).map_err(|err| SheetError::Read {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let sheet = book
        .get_sheet(&0)
        .ok_or_else(|| SheetError::MissingWorksheet(path.to_path_buf()))?;

    let mut rows = Vec::new();
    let mut primary_row = None;

    for row in FIRST_DATA_ROW..=sheet.get_highest_row() {
        let value = |column: SheetColumn| sheet.get_value((column.index(), row));
        let name = value(SheetColumn::EventName);
        let url = sheet
            .get_cell((SheetColumn::EventName.index(), row))
            .and_then(|cell| cell.get_hyperlink())
            .map(|link| link.get_url().to_string())
            .filter(|url| !url.is_empty());

        let trimmed_name = name.trim();
        if !trimmed_name.is_empty() && trimmed_name != continuation_marker {
            primary_row = Some(rows.len());
            rows.push(SheetRow::Primary(SheetPrimaryRow {
                selected: value(SheetColumn::Selected),
                name,
                url,
                date: value(SheetColumn::Date),
                time: value(SheetColumn::Time),
                sign_up_raw: value(SheetColumn::SignUpPeriod),
            }));
            continue;
        }

        let date = value(SheetColumn::Date);
        let sign_up_raw = value(SheetColumn::SignUpPeriod);
        if url.is_none() && date.is_empty() && sign_up_raw.is_empty() {
            continue;
        }

        match primary_row {
            Some(primary_row) => rows.push(SheetRow::Continuation(SheetContinuationRow {
                primary_row,
                url,
                date,
                time: value(SheetColumn::Time),
                sign_up_raw,
            })),
            None => warn!("Row {} continues an event but no event precedes it", row),
        }
    }

    Ok(rows)
}

/// Occurrences of every selected event: its primary row followed by its continuation rows.
pub fn selected_occurrences(rows: &[SheetRow]) -> Vec<SelectedOccurrence> {
    rows.iter()
        .filter_map(|row| match row {
            SheetRow::Primary(primary) if primary.is_selected() => Some(SelectedOccurrence {
                event_name: primary.name.clone(),
                url: primary.url.clone(),
                date: primary.date.trim().to_string(),
                time: primary.time.trim().to_string(),
                sign_up_raw: primary.sign_up_raw.clone(),
                is_continuation: false,
            }),
            SheetRow::Primary(_) => None,
            SheetRow::Continuation(continuation) => match &rows[continuation.primary_row] {
                SheetRow::Primary(primary) if primary.is_selected() => Some(SelectedOccurrence {
                    event_name: primary.name.clone(),
                    url: continuation.url.clone().or_else(|| primary.url.clone()),
                    date: continuation.date.trim().to_string(),
                    time: continuation.time.trim().to_string(),
                    sign_up_raw: continuation.sign_up_raw.clone(),
                    is_continuation: true,
                }),
                _ => None,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::familienpass::model::{ContinuationRow, EventOccurrence, PrimaryRow, SignUp};

    const MARKER: &str = "↗";

    fn primary(name: &str, selected: &str, id: u32) -> OutputRow {
        OutputRow::Primary(PrimaryRow {
            occurrence: EventOccurrence {
                name: name.to_string(),
                age: "6-10".to_string(),
                place: "Tierpark".to_string(),
                date: "01.06.2024".to_string(),
                time: "10:00".to_string(),
                sign_up_raw: "01.05.2024 - 10.05.2024".to_string(),
                sign_up: SignUp::from_raw("01.05.2024 - 10.05.2024"),
                detail_url: format!("https://veranstaltungen.muenchen.de/event/{id}"),
                description: "Ein Tag im Tierpark".to_string(),
            },
            selected: selected.to_string(),
        })
    }

    fn continuation(name: &str, primary_row: usize, id: u32) -> OutputRow {
        OutputRow::Continuation(ContinuationRow {
            primary_row,
            name: name.to_string(),
            detail_url: format!("https://veranstaltungen.muenchen.de/event/{id}"),
            date: "15.06.2024".to_string(),
            time: "11:00".to_string(),
            sign_up_raw: "12.05.2024".to_string(),
        })
    }

    #[test_log::test]
    fn columns_should_keep_their_order() {
        let headers = SheetColumn::iter()
            .map(|column| column.into())
            .collect::<Vec<&'static str>>();

        assert_eq!(headers[0], "Selected");
        assert_eq!(headers[1], "Event Name");
        assert_eq!(headers[7], "Sign-Up Period (Verlosungszeitraum)");
        assert_eq!(SheetColumn::SignUpPeriod.index(), 8);
        assert_eq!(SheetColumn::SignUpPeriod.letter(), "H");
    }

    #[test_log::test]
    fn when_sheet_is_missing_should_have_no_selections() {
        let dir = tempfile::tempdir().unwrap();

        assert!(load_selections(&dir.path().join("missing.xlsx")).is_empty());
    }

    #[test_log::test]
    fn when_sheet_is_missing_reading_rows_should_fail() {
        let dir = tempfile::tempdir().unwrap();

        let result = read_rows(&dir.path().join("missing.xlsx"), MARKER);

        assert!(matches!(result, Err(SheetError::NotFound(_))), "{:?}", result);
    }

    #[test_log::test]
    fn written_sheet_should_read_back_with_selections_and_links() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("events.xlsx");
        let rows = vec![
            primary("Zoo Besuch", "X", 1),
            continuation("Zoo Besuch", 0, 2),
            primary("Kino", "", 3),
        ];

        write_events(&rows, &path, MARKER).unwrap();

        let selections = load_selections(&path);
        assert_eq!(selections.len(), 1);
        assert_eq!(selections["Zoo Besuch"], "X");

        let read = read_rows(&path, MARKER).unwrap();
        assert_eq!(read.len(), 3);

        let SheetRow::Continuation(read_continuation) = &read[1] else {
            panic!("Expected continuation row, got {:?}", read[1]);
        };
        assert_eq!(read_continuation.primary_row, 0);
        assert_eq!(
            read_continuation.url.as_deref(),
            Some("https://veranstaltungen.muenchen.de/event/2")
        );
        assert_eq!(read_continuation.sign_up_raw, "12.05.2024");

        let occurrences = selected_occurrences(&read);
        assert_eq!(occurrences.len(), 2);
        assert!(occurrences.iter().all(|occurrence| occurrence.event_name == "Zoo Besuch"));
        assert_eq!(
            occurrences[0].url.as_deref(),
            Some("https://veranstaltungen.muenchen.de/event/1")
        );
        assert!(occurrences[1].is_continuation);
    }

    #[test_log::test]
    fn written_sheet_should_freeze_the_header_and_zoom_in() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.xlsx");

        write_events(&[primary("Kino", "", 1)], &path, MARKER).unwrap();

        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        let view = &book.get_sheet(&0).unwrap().get_sheets_views().get_sheet_view_list()[0];
        let pane = view.get_pane().expect("header pane");
        assert_eq!(*view.get_zoom_scale(), 150);
        assert_eq!(*pane.get_vertical_split(), 1.0);
        assert_eq!(pane.get_top_left_cell().get_coordinate(), "A2");
        assert!(matches!(pane.get_state(), PaneStateValues::Frozen));
    }

    #[test_log::test]
    fn untitled_event_after_a_selected_one_should_stay_its_own_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.xlsx");
        let rows = vec![primary("Zoo", "X", 1), primary("", "", 2)];

        write_events(&rows, &path, MARKER).unwrap();
        let read = read_rows(&path, MARKER).unwrap();

        let SheetRow::Primary(untitled) = &read[1] else {
            panic!("Expected primary row, got {:?}", read[1]);
        };
        assert_eq!(untitled.name, "(ohne Titel)");
        assert_eq!(
            untitled.url.as_deref(),
            Some("https://veranstaltungen.muenchen.de/event/2")
        );

        let occurrences = selected_occurrences(&read);
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].event_name, "Zoo");
    }

    #[test_log::test]
    fn continuation_before_any_event_should_be_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.xlsx");
        let rows = vec![continuation("Zoo", 0, 1), primary("Kino", "X", 2)];

        write_events(&rows, &path, MARKER).unwrap();
        let read = read_rows(&path, MARKER).unwrap();

        assert_eq!(read.len(), 1);
        assert!(
            matches!(&read[0], SheetRow::Primary(primary) if primary.name == "Kino"),
            "{:?}",
            read
        );
    }

    #[test_log::test]
    fn continuation_of_an_unselected_event_should_not_be_selected() {
        let rows = vec![
            SheetRow::Primary(SheetPrimaryRow {
                selected: "  ".to_string(),
                name: "Kino".to_string(),
                url: None,
                date: "01.06.2024".to_string(),
                time: String::new(),
                sign_up_raw: "01.05.2024".to_string(),
            }),
            SheetRow::Continuation(SheetContinuationRow {
                primary_row: 0,
                url: None,
                date: "02.06.2024".to_string(),
                time: String::new(),
                sign_up_raw: "02.05.2024".to_string(),
            }),
        ];

        assert!(selected_occurrences(&rows).is_empty());
    }
}
