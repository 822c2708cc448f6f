//! Rewrites spoken ordinals to digits ahead of date matching.
//!
//! Speech recognizers return day numbers in several shapes: `10th`, `tenth`,
//! `twenty-first`, `twenty first`. Everything is reduced to bare digits so the
//! date grammar only has to know about `\d{1,2}`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const ORDINAL_UNITS: &[(&str, u32)] = &[
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
];

const ORDINAL_WORDS: &[(&str, u32)] = &[
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
    ("tenth", 10),
    ("eleventh", 11),
    ("twelfth", 12),
    ("thirteenth", 13),
    ("fourteenth", 14),
    ("fifteenth", 15),
    ("sixteenth", 16),
    ("seventeenth", 17),
    ("eighteenth", 18),
    ("nineteenth", 19),
    ("twentieth", 20),
    ("thirtieth", 30),
];

static COMPOUND_ORDINAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(twenty|thirty)[\s-]+(first|second|third|fourth|fifth|sixth|seventh|eighth|ninth)\b",
    )
    .expect("valid regex")
});

static ORDINAL_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(first|second|third|fourth|fifth|sixth|seventh|eighth|ninth|tenth|eleventh|twelfth|thirteenth|fourteenth|fifteenth|sixteenth|seventeenth|eighteenth|nineteenth|twentieth|thirtieth)\b",
    )
    .expect("valid regex")
});

static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})(?:st|nd|rd|th)\b").expect("valid regex"));

fn lookup(table: &[(&str, u32)], word: &str) -> u32 {
    table.iter().find(|(name, _)| *name == word).map(|(_, value)| *value).unwrap_or_default()
}

/// Lowercases `text` and replaces ordinal words and ordinal suffixes with digits.
pub fn normalize_ordinals(text: &str) -> String {
    let lowered = text.to_lowercase();

    let compounds = COMPOUND_ORDINAL.replace_all(&lowered, |caps: &Captures<'_>| {
        let tens = if &caps[1] == "twenty" { 20 } else { 30 };
        (tens + lookup(ORDINAL_UNITS, &caps[2])).to_string()
    });
    let words = ORDINAL_WORD
        .replace_all(&compounds, |caps: &Captures<'_>| lookup(ORDINAL_WORDS, &caps[1]).to_string());

    ORDINAL_SUFFIX.replace_all(&words, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::normalize_ordinals;

    #[test]
    fn strips_numeric_suffixes() {
        assert_eq!(normalize_ordinals("August 10th through the 12th"), "august 10 through the 12");
        assert_eq!(normalize_ordinals("the 1st to the 3rd"), "the 1 to the 3");
    }

    #[test]
    fn rewrites_simple_and_compound_ordinal_words() {
        assert_eq!(normalize_ordinals("july thirtieth"), "july 30");
        assert_eq!(normalize_ordinals("march twenty-first"), "march 21");
        assert_eq!(normalize_ordinals("march twenty first"), "march 21");
        assert_eq!(normalize_ordinals("august first"), "august 1");
        assert_eq!(normalize_ordinals("the thirty first"), "the 31");
    }

    #[test]
    fn leaves_cardinals_and_other_words_alone() {
        assert_eq!(normalize_ordinals("two guests"), "two guests");
        assert_eq!(normalize_ordinals("twenty guests"), "twenty guests");
        assert_eq!(normalize_ordinals("firstly"), "firstly");
    }
}
