use once_cell::sync::Lazy;
use regex::Regex;

const NUMBER_WORDS: &[(&str, u32)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
];

static GUEST_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d+|one|two|three|four|five|six|seven|eight|nine|ten)\b")
        .expect("valid regex")
});

/// First digit run or number word ("one".."ten") in the utterance. Zero is not a guest count.
pub fn parse_guest_count(text: &str) -> Option<u32> {
    let token = GUEST_COUNT.captures(text)?.get(1)?.as_str().to_ascii_lowercase();

    let count = match token.parse::<u32>() {
        Ok(value) => value,
        Err(_) => NUMBER_WORDS.iter().find(|(word, _)| *word == token).map(|(_, value)| *value)?,
    };

    (count > 0).then_some(count)
}

#[cfg(test)]
mod tests {
    use super::parse_guest_count;

    #[test]
    fn parses_digits_and_number_words() {
        assert_eq!(parse_guest_count("two guests"), Some(2));
        assert_eq!(parse_guest_count("Four of us"), Some(4));
        assert_eq!(parse_guest_count("there will be 6"), Some(6));
        assert_eq!(parse_guest_count("TEN"), Some(10));
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(parse_guest_count("3 adults and two kids"), Some(3));
        assert_eq!(parse_guest_count("five, no wait, 4"), Some(5));
    }

    #[test]
    fn rejects_missing_or_zero_counts() {
        assert_eq!(parse_guest_count("just me and my partner"), None);
        assert_eq!(parse_guest_count("someone"), None);
        assert_eq!(parse_guest_count("0 guests"), None);
        assert_eq!(parse_guest_count("eleven"), None);
        assert_eq!(parse_guest_count("99999999999 people"), None);
    }
}
