use std::fmt;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::domain::booking::StayDates;
use crate::errors::BookingError;
use crate::speech::ordinal::normalize_ordinals;

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

static DATE_RANGE: Lazy<Regex> = Lazy::new(|| {
    let months = MONTH_NAMES.join("|");
    Regex::new(&format!(
        r"\b(?:from\s+)?(?P<start_month>{months})\s+(?P<start_day>\d{{1,2}})\b(?:(?:\s*-\s*|\s+(?:to|through|thru|until|till)\s+)(?:the\s+)?(?:(?P<end_month>{months})\s+)?(?P<end_day>\d{{1,2}})\b)?"
    ))
    .expect("valid regex")
});

/// A month and day as spoken, not yet tied to a year. The day is not range checked here;
/// `resolve_month_day` rejects days that do not exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    pub fn new(month: u32, day: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { month, day })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    fn following_month(&self, day: u32) -> Self {
        Self { month: self.month % 12 + 1, day }
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month_name(), self.day)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDateRange {
    pub start: MonthDay,
    pub end: Option<MonthDay>,
}

impl ParsedDateRange {
    pub fn end_or_start(&self) -> MonthDay {
        self.end.unwrap_or(self.start)
    }

    /// `["august 10", "august 12"]`, or a single element for a one-day range.
    pub fn to_strings(&self) -> Vec<String> {
        let mut values = vec![self.start.to_string()];
        if let Some(end) = self.end {
            values.push(end.to_string());
        }
        values
    }
}

impl fmt::Display for ParsedDateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{} to {}", self.start, end),
            None => write!(f, "{}", self.start),
        }
    }
}

fn month_index(name: &str) -> u32 {
    MONTH_NAMES.iter().position(|month| *month == name).map(|index| index as u32 + 1).unwrap_or(1)
}

fn capture_month_day(caps: &Captures<'_>, month: &str, day: &str) -> Option<MonthDay> {
    let month = month_index(caps.name(month)?.as_str());
    let day = caps.name(day)?.as_str().parse().ok()?;
    MonthDay::new(month, day)
}

/// Extracts the first `<Month> <Day> [connector [the] [<Month>] <Day>]` in `text`.
///
/// Returns `None` when no month and day appear at all. When the end month is omitted and
/// the end day is earlier than the start day the end rolls into the following month.
pub fn parse_date_range(text: &str) -> Option<ParsedDateRange> {
    let normalized = normalize_ordinals(text);
    let caps = DATE_RANGE.captures(&normalized)?;

    let start = capture_month_day(&caps, "start_month", "start_day")?;
    let end = match (caps.name("end_month"), caps.name("end_day")) {
        (Some(_), Some(_)) => capture_month_day(&caps, "end_month", "end_day"),
        (None, Some(day)) => {
            let day: u32 = day.as_str().parse().ok()?;
            if day < start.day {
                Some(start.following_month(day))
            } else {
                Some(MonthDay { month: start.month, day })
            }
        }
        _ => None,
    };

    Some(ParsedDateRange { start, end })
}

/// Places a month and day on the calendar: this year, unless that day has already passed,
/// in which case next year.
pub fn resolve_month_day(value: MonthDay, today: NaiveDate) -> Result<NaiveDate, BookingError> {
    let year = if (value.month, value.day) < (today.month(), today.day()) {
        today.year() + 1
    } else {
        today.year()
    };

    NaiveDate::from_ymd_opt(year, value.month, value.day)
        .ok_or_else(|| BookingError::InvalidDate { month_day: value.to_string() })
}

/// Resolves both ends of a range. The end lands in the following year only when its month
/// comes before the start month; an end day before the start day within the same month is
/// an invalid range.
pub fn resolve_range(range: &ParsedDateRange, today: NaiveDate) -> Result<StayDates, BookingError> {
    let check_in = resolve_month_day(range.start, today)?;
    let end = range.end_or_start();
    let invalid = || BookingError::InvalidDate { month_day: end.to_string() };

    let year = if end.month < range.start.month { check_in.year() + 1 } else { check_in.year() };
    let check_out = NaiveDate::from_ymd_opt(year, end.month, end.day).ok_or_else(invalid)?;

    StayDates::new(check_in, check_out)
        .map_err(|_| BookingError::InvalidDate { month_day: range.to_string() })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{parse_date_range, resolve_month_day, resolve_range, MonthDay};
    use crate::errors::BookingError;

    fn strings(text: &str) -> Option<Vec<String>> {
        parse_date_range(text).map(|range| range.to_strings())
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn parses_connector_forms() {
        let expected = Some(vec!["august 10".to_owned(), "august 12".to_owned()]);

        assert_eq!(strings("august 10th through the 12th"), expected);
        assert_eq!(strings("august 10 to august 12"), expected);
        assert_eq!(strings("from august 10th until the 12th"), expected);
        assert_eq!(strings("August 10th - 12th"), expected);
        assert_eq!(strings("we want august 10 thru 12 please"), expected);
        assert_eq!(strings("August 10 till the 12th."), expected);
    }

    #[test]
    fn ordinal_words_and_cross_month_ranges() {
        assert_eq!(
            strings("july 30th through august first"),
            Some(vec!["july 30".to_owned(), "august 1".to_owned()])
        );
        assert_eq!(
            strings("march twenty-first to the twenty fifth"),
            Some(vec!["march 21".to_owned(), "march 25".to_owned()])
        );
    }

    #[test]
    fn omitted_end_month_rolls_forward_when_day_goes_backwards() {
        assert_eq!(
            strings("july 30th through the 2nd"),
            Some(vec!["july 30".to_owned(), "august 2".to_owned()])
        );
        assert_eq!(
            strings("december 30 to the 2nd"),
            Some(vec!["december 30".to_owned(), "january 2".to_owned()])
        );
    }

    #[test]
    fn single_day_without_connector() {
        let range = parse_date_range("august 10").expect("single day");
        assert_eq!(range.to_strings(), vec!["august 10".to_owned()]);
        assert_eq!(range.end_or_start(), range.start);
    }

    #[test]
    fn rendered_output_parses_back_to_the_same_range() {
        for text in ["august 10", "august 10th through the 12th", "july 30th through august first"] {
            let range = parse_date_range(text).expect("parsable");
            assert_eq!(parse_date_range(&range.to_string()), Some(range), "{text}");
        }
    }

    #[test]
    fn no_month_and_day_is_not_a_range() {
        assert_eq!(parse_date_range("next weekend"), None);
        assert_eq!(parse_date_range("august"), None);
        assert_eq!(parse_date_range("may i book something"), None);
        assert_eq!(parse_date_range(""), None);
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(
            strings("june 3 to june 5 or maybe july 1 to july 4"),
            Some(vec!["june 3".to_owned(), "june 5".to_owned()])
        );
    }

    #[test]
    fn resolves_to_next_occurrence() {
        let today = date(2024, 6, 1);
        let august = MonthDay::new(8, 10).unwrap();
        let june_first = MonthDay::new(6, 1).unwrap();
        let march = MonthDay::new(3, 5).unwrap();

        assert_eq!(resolve_month_day(august, today), Ok(date(2024, 8, 10)));
        assert_eq!(resolve_month_day(june_first, today), Ok(date(2024, 6, 1)));
        assert_eq!(resolve_month_day(march, today), Ok(date(2025, 3, 5)));
    }

    #[test]
    fn impossible_days_are_invalid_dates() {
        let today = date(2024, 1, 15);

        assert_eq!(
            resolve_month_day(MonthDay::new(2, 30).unwrap(), today),
            Err(BookingError::InvalidDate { month_day: "february 30".to_owned() })
        );
        assert!(resolve_month_day(MonthDay::new(4, 0).unwrap(), today).is_err());
        assert!(resolve_month_day(MonthDay::new(2, 29).unwrap(), date(2025, 1, 15)).is_err());
        assert_eq!(resolve_month_day(MonthDay::new(2, 29).unwrap(), today), Ok(date(2024, 2, 29)));
    }

    #[test]
    fn range_end_follows_start_across_new_year() {
        let today = date(2024, 12, 1);
        let range = parse_date_range("december 30 through january 2").unwrap();

        let stay = resolve_range(&range, today).expect("valid range");
        assert_eq!(stay.check_in(), date(2024, 12, 30));
        assert_eq!(stay.check_out(), date(2025, 1, 2));
    }

    #[test]
    fn backwards_range_within_a_month_is_invalid() {
        let range = parse_date_range("august 12 to august 10").unwrap();

        assert_eq!(
            resolve_range(&range, date(2024, 6, 1)),
            Err(BookingError::InvalidDate { month_day: "august 12 to august 10".to_owned() })
        );
    }

    #[test]
    fn range_that_started_earlier_this_year_moves_to_next_year_whole() {
        let range = parse_date_range("march 3 to march 5").unwrap();

        let stay = resolve_range(&range, date(2024, 6, 1)).expect("valid range");
        assert_eq!(stay.check_in(), date(2025, 3, 3));
        assert_eq!(stay.check_out(), date(2025, 3, 5));
    }

    #[test]
    fn range_with_invalid_end_is_rejected() {
        let range = parse_date_range("february 27 to february 30").unwrap();
        assert_eq!(
            resolve_range(&range, date(2024, 1, 1)),
            Err(BookingError::InvalidDate { month_day: "february 30".to_owned() })
        );
    }
}
