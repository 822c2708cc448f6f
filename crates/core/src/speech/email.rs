use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::speech::spelling::{is_non_answer, tokenize, SpellingMode, Token};

static WELL_FORMED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9._%+-]*@[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,}$")
        .expect("valid regex")
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpokenEmail {
    pub address: String,
    pub well_formed: bool,
}

/// One stretch of an address between symbols. A word followed by its own spelling
/// ("doe d o e") contributes the word once.
fn render_segment(tokens: &[&Token]) -> String {
    let mut in_order = String::new();
    let mut words = String::new();
    let mut letters = String::new();

    for token in tokens {
        match token {
            Token::Word(word) => {
                in_order.push_str(word);
                words.push_str(word);
            }
            Token::Letter(letter) => {
                in_order.push(*letter);
                letters.push(*letter);
            }
            Token::Symbol(_) => {}
        }
    }

    if !words.is_empty() && words == letters {
        words
    } else {
        in_order
    }
}

/// Builds an address from spoken symbol words, spelled letters and plain words.
///
/// Returns `None` for acknowledgements or when nothing address-like remains. Addresses that
/// do not look like `local@domain.tld` are still returned, flagged as not well formed.
pub fn parse_spoken_email(text: &str) -> Option<SpokenEmail> {
    if is_non_answer(text) {
        return None;
    }

    let tokens = tokenize(text, SpellingMode::Email);
    let mut address = String::new();
    let mut segment: Vec<&Token> = Vec::new();

    for token in &tokens {
        if let Token::Symbol(symbol) = token {
            address.push_str(&render_segment(&segment));
            segment.clear();
            address.push(*symbol);
        } else {
            segment.push(token);
        }
    }
    address.push_str(&render_segment(&segment));

    let address = address.trim_matches('.').to_lowercase();
    if address.is_empty() {
        return None;
    }

    let well_formed = WELL_FORMED.is_match(&address);
    Some(SpokenEmail { address, well_formed })
}

/// Reads an address back with its symbols as words: "john.doe@gmail.com" becomes
/// "john dot doe at gmail dot com".
pub fn speak_email(address: &str) -> String {
    let mut spoken = Vec::new();
    let mut current = String::new();

    for ch in address.chars() {
        let word = match ch {
            '@' => "at",
            '.' => "dot",
            '-' => "dash",
            '_' => "underscore",
            '+' => "plus",
            _ => {
                current.push(ch);
                continue;
            }
        };
        if !current.is_empty() {
            spoken.push(std::mem::take(&mut current));
        }
        spoken.push(word.to_owned());
    }
    if !current.is_empty() {
        spoken.push(current);
    }

    spoken.join(" ")
}

#[cfg(test)]
mod tests {
    use super::{parse_spoken_email, speak_email, SpokenEmail};

    fn address(text: &str) -> Option<String> {
        parse_spoken_email(text).map(|email| email.address)
    }

    #[test]
    fn symbol_words_become_symbols() {
        assert_eq!(address("john dot doe at gmail dot com").as_deref(), Some("john.doe@gmail.com"));
        assert_eq!(address("jane at example dot com").as_deref(), Some("jane@example.com"));
        assert_eq!(
            address("my email is mary underscore lee at mail dash box dot org").as_deref(),
            Some("mary_lee@mail-box.org")
        );
    }

    #[test]
    fn double_you_is_a_single_w() {
        assert_eq!(address("double you at test dot com").as_deref(), Some("w@test.com"));
        assert_eq!(address("double u at example dot com").as_deref(), Some("w@example.com"));
    }

    #[test]
    fn words_in_a_segment_are_concatenated() {
        assert_eq!(
            address("kurt wayne wilson at gmail dot com").as_deref(),
            Some("kurtwaynewilson@gmail.com")
        );
    }

    #[test]
    fn spelled_letters_and_digit_words_keep_their_order() {
        assert_eq!(address("j s m i t h four two at yahoo dot com").as_deref(), Some("jsmith42@yahoo.com"));
        assert_eq!(address("doe d o e at gmail dot com").as_deref(), Some("doe@gmail.com"));
    }

    #[test]
    fn literal_addresses_survive() {
        assert_eq!(
            parse_spoken_email("John.Doe@Gmail.com."),
            Some(SpokenEmail { address: "john.doe@gmail.com".to_owned(), well_formed: true })
        );
    }

    #[test]
    fn malformed_addresses_are_flagged() {
        let email = parse_spoken_email("jane example dot com").expect("best effort");
        assert_eq!(email.address, "janeexample.com");
        assert!(!email.well_formed);
    }

    #[test]
    fn acknowledgements_are_not_addresses() {
        assert_eq!(parse_spoken_email("yes"), None);
        assert_eq!(parse_spoken_email("I don't know"), None);
        assert_eq!(parse_spoken_email("my email is"), None);
    }

    #[test]
    fn reads_symbols_back_as_words() {
        assert_eq!(speak_email("john.doe@gmail.com"), "john dot doe at gmail dot com");
        assert_eq!(speak_email("mary_lee@mail-box.org"), "mary underscore lee at mail dash box dot org");
    }
}
