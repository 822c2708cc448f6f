use serde::{Deserialize, Serialize};

const NEGATIVE: &[&str] = &[
    "no",
    "nope",
    "nah",
    "not",
    "incorrect",
    "wrong",
    "negative",
    "isn't",
    "wasn't",
];

const AFFIRMATIVE: &[&str] = &[
    "yes",
    "yeah",
    "yep",
    "yup",
    "yea",
    "ya",
    "correct",
    "right",
    "sure",
    "affirmative",
    "absolutely",
    "exactly",
    "perfect",
    "ok",
    "okay",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
    Unrecognized,
}

/// Classifies a confirmation answer. Negative words win over affirmative ones.
pub fn interpret_yes_no(text: &str) -> YesNo {
    let lowered = text.to_lowercase().replace('\u{2019}', "'");
    let words = lowered
        .split(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '\''))
        .map(|word| word.trim_matches('\''))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>();

    if words.iter().any(|word| NEGATIVE.contains(word)) {
        YesNo::No
    } else if words.iter().any(|word| AFFIRMATIVE.contains(word)) {
        YesNo::Yes
    } else {
        YesNo::Unrecognized
    }
}
