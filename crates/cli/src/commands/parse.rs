use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::{json, Value};
use stayline_core::config::{AppConfig, LoadOptions};
use stayline_core::speech::{
    interpret_yes_no, parse_date_range, parse_guest_count, parse_spoken_email, parse_spoken_name,
    resolve_range, spell_out, YesNo,
};

use stayline_core::{Clock, DialogueSettings, SystemClock};

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ParseKind {
    Dates,
    Guests,
    Name,
    Email,
    YesNo,
}

impl ParseKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Dates => "dates",
            Self::Guests => "guests",
            Self::Name => "name",
            Self::Email => "email",
            Self::YesNo => "yes_no",
        }
    }
}

#[derive(Debug, Serialize)]
struct ParseOutcome<'a> {
    kind: &'static str,
    input: &'a str,
    recognized: bool,
    result: Value,
}

/// Today at the business, the same day the call handler resolves dates against. Falls back
/// to the default time zone when the config does not load.
pub fn business_today() -> NaiveDate {
    let time_zone = AppConfig::load(LoadOptions::default())
        .map(|config| config.dialogue.time_zone)
        .unwrap_or_else(|_| DialogueSettings::default().time_zone);
    today_at(time_zone, &SystemClock)
}

fn today_at(time_zone: Tz, clock: &dyn Clock) -> NaiveDate {
    clock.today_in(time_zone)
}

/// Runs one spoken-input parser. Exit code 1 means the text was not recognized.
pub fn run(kind: ParseKind, text: &str, today: NaiveDate) -> CommandResult {
    let result = match kind {
        ParseKind::Dates => parse_date_range(text).map(|range| {
            match resolve_range(&range, today) {
                Ok(stay) => json!({
                    "spoken": range.to_strings(),
                    "check_in": stay.check_in(),
                    "check_out": stay.check_out(),
                }),
                Err(error) => json!({ "spoken": range.to_strings(), "error": error.to_string() }),
            }
        }),
        ParseKind::Guests => parse_guest_count(text).map(|count| json!(count)),
        ParseKind::Name => parse_spoken_name(text)
            .map(|name| json!({ "name": name, "spelled": spell_out(&name) })),
        ParseKind::Email => parse_spoken_email(text).map(|email| json!(email)),
        ParseKind::YesNo => match interpret_yes_no(text) {
            YesNo::Unrecognized => None,
            answer => Some(json!(answer)),
        },
    };

    let recognized = result.is_some();
    let outcome = ParseOutcome {
        kind: kind.as_str(),
        input: text,
        recognized,
        result: result.unwrap_or(Value::Null),
    };
    let output = serde_json::to_string(&outcome)
        .unwrap_or_else(|error| format!("parse result serialization failed: {error}"));

    CommandResult { exit_code: if recognized { 0 } else { 1 }, output }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::Value;

    use chrono::{TimeZone, Utc};
    use stayline_core::ManualClock;

    use super::{run, today_at, ParseKind};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("date")
    }

    fn payload(kind: ParseKind, text: &str) -> (u8, Value) {
        let result = run(kind, text, today());
        (result.exit_code, serde_json::from_str(&result.output).expect("json"))
    }

    #[test]
    fn dates_resolve_against_today() {
        let (code, value) = payload(ParseKind::Dates, "august 10th through the 12th");

        assert_eq!(code, 0);
        assert_eq!(value["result"]["check_in"], "2024-08-10");
        assert_eq!(value["result"]["check_out"], "2024-08-12");
    }

    #[test]
    fn impossible_dates_report_the_error() {
        let (code, value) = payload(ParseKind::Dates, "february 30th");

        assert_eq!(code, 0);
        assert!(value["result"]["error"].as_str().is_some());
    }

    #[test]
    fn names_come_back_with_their_spelling() {
        let (_, value) = payload(ParseKind::Name, "bee cee");

        assert_eq!(value["result"]["name"], "Bc");
        assert_eq!(value["result"]["spelled"], "B, C");
    }

    #[test]
    fn unrecognized_input_exits_with_one() {
        let (code, value) = payload(ParseKind::Guests, "a bunch of us");

        assert_eq!(code, 1);
        assert_eq!(value["recognized"], false);
        assert_eq!(value["result"], Value::Null);
    }

    #[test]
    fn today_follows_the_business_time_zone() {
        let late_evening_in_chicago =
            ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 2, 3, 0, 0).unwrap());

        assert_eq!(today_at(chrono_tz::America::Chicago, &late_evening_in_chicago), today());
        assert_eq!(
            today_at(chrono_tz::UTC, &late_evening_in_chicago),
            NaiveDate::from_ymd_opt(2024, 6, 2).expect("date")
        );
    }

    #[test]
    fn yes_no_answers_are_classified() {
        let (_, value) = payload(ParseKind::YesNo, "yeah that's right");

        assert_eq!(value["result"], "Yes");
    }
}
