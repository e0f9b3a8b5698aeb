use crate::familienpass::model::{
    EventOccurrence, SignUp, DIRECT_REGISTRATION_TEXT, NOT_SPECIFIED_TEXT, NO_DESCRIPTION_TEXT,
};
use crate::familienpass::sign_up::DIRECT_REGISTRATION_PHRASE;
use crate::familienpass::text::{clean_text, section_text};
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

const AGE_LABEL: &str = "Alter";
const PLACE_LABEL: &str = "Treffpunkt";
const DATE_LABEL: &str = "Datum";
const TIME_LABEL: &str = "Uhrzeit";
const SIGN_UP_START_LABEL: &str = "Anmeldebeginn";
const SIGN_UP_LABEL: &str = "Anmeldung";
const LOTTERY_PERIOD_MARKER: &str = "Verlosungszeitraum";

const MIN_DESCRIPTION_CHARS: usize = 50;

lazy_static! {
    static ref TITLE: Selector = Selector::parse("h2").expect("Failed to create title selector");
    static ref SECTION_HEADING: Selector =
        Selector::parse("h3").expect("Failed to create heading selector");
    static ref PARAGRAPH: Selector =
        Selector::parse("p").expect("Failed to create paragraph selector");
}

/// Extracts an event from its detail page. Missing parts become empty strings or placeholders.
pub fn parse_detail(html: &str, url: &str) -> EventOccurrence {
    let document = Html::parse_document(html);
    let title = document.select(&TITLE).next();
    let section = |label: &str| section_text(document.select(&SECTION_HEADING), label);

    let sign_up_raw = sign_up_text(&section(SIGN_UP_START_LABEL), &section(SIGN_UP_LABEL));

    EventOccurrence {
        name: title.map(element_text).unwrap_or_default(),
        age: section(AGE_LABEL),
        place: section(PLACE_LABEL),
        date: section(DATE_LABEL),
        time: section(TIME_LABEL),
        sign_up: SignUp::from_raw(&sign_up_raw),
        sign_up_raw,
        detail_url: url.to_string(),
        description: description(&document, title),
    }
}

/// Prefers the lottery period; otherwise checks whether registration goes through the organizer.
fn sign_up_text(sign_up_start: &str, sign_up: &str) -> String {
    let mut lottery_period = String::new();

    if sign_up_start.contains(LOTTERY_PERIOD_MARKER) {
        let period = sign_up_start
            .split_once(':')
            .map(|(_, period)| period)
            .unwrap_or(sign_up_start);

        lottery_period = clean_text(period).replace(" bis ", " - ");
    }

    if !lottery_period.is_empty() {
        lottery_period
    } else if sign_up.contains(DIRECT_REGISTRATION_PHRASE) {
        DIRECT_REGISTRATION_TEXT.to_string()
    } else {
        NOT_SPECIFIED_TEXT.to_string()
    }
}

/// First substantial paragraph between the title and the first section, else anywhere.
fn description(document: &Html, title: Option<ElementRef>) -> String {
    let intro = title.and_then(|title| {
        title
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .take_while(|element| element.value().name() != "h3")
            .filter(|element| element.value().name() == "p")
            .map(element_text)
            .find(|text| is_substantial(text))
    });

    intro
        .or_else(|| {
            document
                .select(&PARAGRAPH)
                .map(element_text)
                .find(|text| is_substantial(text))
        })
        .unwrap_or_else(|| NO_DESCRIPTION_TEXT.to_string())
}

fn is_substantial(text: &str) -> bool {
    text.chars().count() > MIN_DESCRIPTION_CHARS
}

fn element_text(element: ElementRef) -> String {
    clean_text(&element.text().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const URL: &str = "https://veranstaltungen.muenchen.de/event/42";

    const FULL_PAGE: &str = r#"
        <html><body><article>
          <h2>  Ferienlager
                am See </h2>
          <p>Kurz.</p>
          <p>Eine Woche Zelten, Schwimmen und Lagerfeuer am Starnberger See fuer alle Kinder.</p>
          <h3>Alter</h3>
          <p>6-10</p>
          <h3>Treffpunkt</h3>
          <p>Bahnhof Starnberg</p>
          <h3>Datum</h3>
          <p>15.06.2024</p>
          <h3>Uhrzeit</h3>
          <p>09:00 Uhr</p>
          <h3>Anmeldebeginn</h3>
          <p>Verlosungszeitraum: 01.05.2024 bis 10.05.2024</p>
          <p>Ein weiterer Absatz, der ebenfalls lang genug ist, um eine Beschreibung zu sein.</p>
        </article></body></html>"#;

    #[test_log::test]
    fn should_extract_every_field() {
        let event = parse_detail(FULL_PAGE, URL);

        assert_eq!(event.name, "Ferienlager am See");
        assert_eq!(event.age, "6-10");
        assert_eq!(event.place, "Bahnhof Starnberg");
        assert_eq!(event.date, "15.06.2024");
        assert_eq!(event.time, "09:00 Uhr");
        assert_eq!(event.sign_up_raw, "01.05.2024 - 10.05.2024");
        assert_eq!(event.detail_url, URL);
        assert_eq!(
            event.description,
            "Eine Woche Zelten, Schwimmen und Lagerfeuer am Starnberger See fuer alle Kinder."
        );

        let window = event.sign_up.window().unwrap();
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(window.end, NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
    }

    #[test_log::test]
    fn when_registering_with_organizer_should_mark_direct_registration() {
        let html = r#"
            <h2>Kletterkurs</h2>
            <h3>Anmeldung</h3>
            <p>Die Anmeldung erfolgt direkt beim Veranstalter unter 089 123456.</p>"#;

        let event = parse_detail(html, URL);

        assert_eq!(event.sign_up_raw, DIRECT_REGISTRATION_TEXT);
        assert_eq!(event.sign_up, SignUp::DirectRegistration);
    }

    #[test_log::test]
    fn when_sign_up_start_has_no_lottery_should_fall_back_to_registration() {
        let html = r#"
            <h2>Kletterkurs</h2>
            <h3>Anmeldebeginn</h3>
            <p>ab sofort</p>
            <h3>Anmeldung</h3>
            <p>direkt beim Veranstalter</p>"#;

        let event = parse_detail(html, URL);

        assert_eq!(event.sign_up, SignUp::DirectRegistration);
    }

    #[test_log::test]
    fn when_nothing_about_sign_up_should_be_unspecified() {
        let event = parse_detail("<h2>Kino</h2><h3>Alter</h3><p>ab 6</p>", URL);

        assert_eq!(event.sign_up_raw, NOT_SPECIFIED_TEXT);
        assert_eq!(event.sign_up, SignUp::Unspecified);
    }

    #[test_log::test]
    fn when_no_intro_paragraph_should_use_any_long_paragraph() {
        let html = r#"
            <h2>Kino</h2>
            <h3>Alter</h3>
            <div><p>Ein Nachmittag im Kino mit Popcorn, Limo und einem Film fuer die ganze Familie.</p></div>"#;

        let event = parse_detail(html, URL);

        assert!(event.description.starts_with("Ein Nachmittag im Kino"));
    }

    #[test_log::test]
    fn when_page_is_empty_should_return_placeholders() {
        let event = parse_detail("", URL);

        assert_eq!(event.name, "");
        assert_eq!(event.age, "");
        assert_eq!(event.date, "");
        assert_eq!(event.description, NO_DESCRIPTION_TEXT);
        assert_eq!(event.detail_url, URL);
    }

    #[test_log::test]
    fn lottery_period_without_colon_should_keep_the_text() {
        assert_eq!(
            sign_up_text("Verlosungszeitraum 01.05.2024 bis 10.05.2024", ""),
            "Verlosungszeitraum 01.05.2024 - 10.05.2024"
        );
    }
}
