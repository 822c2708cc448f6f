//! Token classification shared by the name and email parsers.
//!
//! Callers mix whole words with letter-by-letter spelling, and recognizers turn spoken
//! letters into homophones ("bee", "why", "double you"). Input is reduced to word, letter
//! and symbol tokens; letters are later collapsed into spelled runs.

use once_cell::sync::Lazy;
use regex::Regex;

const LETTER_HOMOPHONES: &[(&str, char)] = &[
    ("ay", 'a'),
    ("bee", 'b'),
    ("be", 'b'),
    ("bea", 'b'),
    ("see", 'c'),
    ("sea", 'c'),
    ("cee", 'c'),
    ("dee", 'd'),
    ("ee", 'e'),
    ("ef", 'f'),
    ("eff", 'f'),
    ("gee", 'g'),
    ("jee", 'g'),
    ("aitch", 'h'),
    ("haitch", 'h'),
    ("eye", 'i'),
    ("aye", 'i'),
    ("jay", 'j'),
    ("kay", 'k'),
    ("cay", 'k'),
    ("kaye", 'k'),
    ("el", 'l'),
    ("ell", 'l'),
    ("em", 'm'),
    ("en", 'n'),
    ("oh", 'o'),
    ("owe", 'o'),
    ("pee", 'p'),
    ("pea", 'p'),
    ("cue", 'q'),
    ("queue", 'q'),
    ("are", 'r'),
    ("ar", 'r'),
    ("es", 's'),
    ("ess", 's'),
    ("tee", 't'),
    ("tea", 't'),
    ("you", 'u'),
    ("yu", 'u'),
    ("ewe", 'u'),
    ("vee", 'v'),
    ("doubleyou", 'w'),
    ("doubleu", 'w'),
    ("ex", 'x'),
    ("why", 'y'),
    ("wye", 'y'),
    ("zee", 'z'),
    ("zed", 'z'),
];

const DIGIT_WORDS: &[(&str, char)] = &[
    ("zero", '0'),
    ("oh", '0'),
    ("one", '1'),
    ("two", '2'),
    ("three", '3'),
    ("four", '4'),
    ("five", '5'),
    ("six", '6'),
    ("seven", '7'),
    ("eight", '8'),
    ("nine", '9'),
];

/// Whole utterances that answer nothing.
const NON_ANSWERS: &[&str] = &[
    "yes",
    "yeah",
    "yep",
    "no",
    "nope",
    "nah",
    "ok",
    "okay",
    "sure",
    "correct",
    "right",
    "hello",
    "hi",
    "hey",
    "what",
    "sorry",
    "pardon",
    "um",
    "uh",
    "hmm",
    "excuse me",
    "can you repeat that",
    "say that again",
];

/// Phrases that mark an utterance as uncertainty rather than content.
const UNCERTAIN_PHRASES: &[&str] = &["don't know", "dont know", "not sure", "no idea"];

static NAME_FILLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:you can put it under the name of|you can put it under|put it under the name of|put it under|under the name of|under the name|and my last name is|and the last name is|my first name is|my last name is|the first name is|the last name is|my name is|my name's|the name is|the name's|name is|first name is|last name is|first name|last name|it is spelled|it's spelled|that's spelled|spelled|spelt|spelling|it is|it's|this is|that is|that's|i am|i'm|call me|thank you|thanks|please|yes|yeah|okay|ok|well|so|um|uh|hmm)\b",
    )
    .expect("valid regex")
});

static EMAIL_FILLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:my email address is|the email address is|email address is|my email is|the email is|email is|my email|my address is|the address is|my e-mail is|the e-mail is|it is spelled|it's spelled|spelled|spelt|it is|it's|that is|that's|thank you|thanks|please|yes|yeah|okay|ok|well|so|um|uh|hmm)\b",
    )
    .expect("valid regex")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SpellingMode {
    Name,
    Email,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Token {
    Word(String),
    Letter(char),
    Symbol(char),
}

pub(crate) fn homophone_letter(word: &str) -> Option<char> {
    LETTER_HOMOPHONES.iter().find(|(spoken, _)| *spoken == word).map(|(_, letter)| *letter)
}

fn single_letter(word: &str) -> Option<char> {
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if ch.is_ascii_alphabetic() => Some(ch),
        _ => None,
    }
}

fn letter_for(word: &str) -> Option<char> {
    single_letter(word).or_else(|| homophone_letter(word))
}

fn email_symbol(word: &str) -> Option<char> {
    match word {
        "at" => Some('@'),
        "dot" | "period" | "point" => Some('.'),
        "dash" | "hyphen" | "minus" => Some('-'),
        "underscore" => Some('_'),
        _ => None,
    }
}

/// True for acknowledgements and "I don't know" style answers.
pub(crate) fn is_non_answer(text: &str) -> bool {
    let lowered = text.to_lowercase().replace('\u{2019}', "'");
    let normalized = lowered
        .split(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '\''))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    normalized.is_empty()
        || NON_ANSWERS.contains(&normalized.as_str())
        || UNCERTAIN_PHRASES.iter().any(|phrase| normalized.contains(phrase))
}

fn split_raw_words(text: &str, mode: SpellingMode) -> Vec<String> {
    let mut lowered = text.to_lowercase().replace('\u{2019}', "'");

    if mode == SpellingMode::Email {
        // Literal addresses ("john.doe@gmail.com") are respelled as symbol words.
        lowered = lowered.replace('@', " at ").replace('_', " underscore ").replace('.', " dot ");
    }

    let filler = match mode {
        SpellingMode::Name => &NAME_FILLER,
        SpellingMode::Email => &EMAIL_FILLER,
    };
    let stripped = filler.replace_all(&lowered, " ");

    let cleaned = stripped
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '\'' || ch == '-' { ch } else { ' ' })
        .collect::<String>();

    cleaned
        .split_whitespace()
        .map(|word| word.trim_matches(|ch| ch == '\'' || ch == '-').to_owned())
        .filter(|word| !word.is_empty())
        .collect()
}

/// Expands hyphenated spelling ("c-a-r-r-i-e") into single letters. Other hyphenated words
/// stay joined by a dash symbol in email mode and split into words for names.
fn expand_hyphens(words: Vec<String>, mode: SpellingMode) -> Vec<String> {
    let mut expanded = Vec::with_capacity(words.len());
    for word in words {
        if !word.contains('-') {
            expanded.push(word);
            continue;
        }

        let parts = word.split('-').filter(|part| !part.is_empty()).collect::<Vec<_>>();
        let spelled = parts.iter().all(|part| letter_for(part).is_some());
        for (index, part) in parts.iter().enumerate() {
            if index > 0 && !spelled && mode == SpellingMode::Email {
                expanded.push("dash".to_owned());
            }
            expanded.push((*part).to_owned());
        }
    }
    expanded
}

pub(crate) fn tokenize(text: &str, mode: SpellingMode) -> Vec<Token> {
    let words = expand_hyphens(split_raw_words(text, mode), mode);
    let mut tokens = Vec::with_capacity(words.len());
    let mut index = 0;

    while index < words.len() {
        let word = words[index].as_str();
        let next = words.get(index + 1).map(String::as_str);

        if mode == SpellingMode::Email {
            if let Some(symbol) = email_symbol(word) {
                tokens.push(Token::Symbol(symbol));
                index += 1;
                continue;
            }
            if word == "under" && next == Some("score") {
                tokens.push(Token::Symbol('_'));
                index += 2;
                continue;
            }
        }

        let repeat = match word {
            "double" => 2,
            "triple" => 3,
            _ => 0,
        };
        if repeat > 0 {
            if repeat == 2 && matches!(next, Some("you" | "u" | "yu")) {
                tokens.push(Token::Letter('w'));
                index += 2;
                continue;
            }
            if let Some(letter) = next.and_then(letter_for) {
                tokens.extend(std::iter::repeat(Token::Letter(letter)).take(repeat));
                index += 2;
                continue;
            }
        }

        if let Some(letter) = letter_for(word) {
            tokens.push(Token::Letter(letter));
        } else if mode == SpellingMode::Email {
            match DIGIT_WORDS.iter().find(|(spoken, _)| *spoken == word) {
                Some((_, digit)) => tokens.push(Token::Letter(*digit)),
                None => tokens.push(Token::Word(word.to_owned())),
            }
        } else if word.chars().any(|ch| ch.is_ascii_alphabetic()) {
            tokens.push(Token::Word(word.to_owned()));
        }
        index += 1;
    }

    tokens
}

/// Contiguous letter tokens joined into spelled runs, alongside the plain words.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Runs {
    pub words: Vec<String>,
    pub spelled: Vec<String>,
}

pub(crate) fn collect_runs(tokens: &[Token]) -> Runs {
    let mut runs = Runs::default();
    let mut current = String::new();

    for token in tokens {
        match token {
            Token::Letter(letter) => current.push(*letter),
            Token::Word(word) => {
                if !current.is_empty() {
                    runs.spelled.push(std::mem::take(&mut current));
                }
                runs.words.push(word.clone());
            }
            Token::Symbol(_) => {
                if !current.is_empty() {
                    runs.spelled.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.spelled.push(current);
    }
    runs
}

/// A spelled run that itself spells a letter's name ("k a y") stands for that letter.
fn collapse_spelled_homophone(run: String) -> String {
    if run.len() < 3 {
        return run;
    }
    match homophone_letter(&run) {
        Some(letter) => letter.to_string(),
        None => run,
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Recovers a caller's name from words, spelling, or both.
///
/// When the spelled letters repeat the spoken words ("carrigan c-a-r-r-i-g-a-n") only the
/// word form is kept; otherwise the spelled form is appended after the words.
pub fn parse_spoken_name(text: &str) -> Option<String> {
    if is_non_answer(text) {
        return None;
    }

    let runs = collect_runs(&tokenize(text, SpellingMode::Name));
    let word_form = runs.words.join(" ");
    let spelled_form = runs
        .spelled
        .into_iter()
        .map(collapse_spelled_homophone)
        .collect::<Vec<_>>()
        .join(" ");

    let name = match (word_form.is_empty(), spelled_form.is_empty()) {
        (true, true) => return None,
        (false, true) => word_form,
        (true, false) => spelled_form,
        (false, false) => {
            if spelled_form.replace(' ', "") == word_form.replace(' ', "") {
                word_form
            } else {
                format!("{word_form} {spelled_form}")
            }
        }
    };

    Some(title_case(&name))
}

/// Letter-by-letter read-back: "Carrigan" → "C, A, R, R, I, G, A, N".
pub fn spell_out(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|ch| ch.is_alphanumeric())
                .map(|ch| ch.to_uppercase().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|spelled| !spelled.is_empty())
        .collect::<Vec<_>>()
        .join(", space, ")
}
