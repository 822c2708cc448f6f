use chrono::NaiveDate;

use crate::dialogue::states::{DialogueStep, Prompt};
use crate::domain::booking::StayDates;
use crate::speech::{speak_email, spell_out};

const DATES_QUESTION: &str = "What are your check-in and check-out dates?";
const GUESTS_QUESTION: &str = "How many guests will be staying?";
const NAME_QUESTION: &str = "Can I have a name for the reservation?";
const EMAIL_QUESTION: &str = "What email address should we send your confirmation to?";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptContext {
    pub business_name: String,
}

impl Default for PromptContext {
    fn default() -> Self {
        Self { business_name: "Stayline Vacation Rentals".to_owned() }
    }
}

/// "August 10"
pub fn speak_date(date: NaiveDate) -> String {
    date.format("%B %-d").to_string()
}

/// "August 10 to August 12", or a single day.
pub fn speak_stay(dates: &StayDates) -> String {
    if dates.check_in() == dates.check_out() {
        speak_date(dates.check_in())
    } else {
        format!("{} to {}", speak_date(dates.check_in()), speak_date(dates.check_out()))
    }
}

/// "from August 10 to August 11": check-in through the day after the last booked night.
pub fn speak_booked_stay(dates: &StayDates) -> String {
    format!(
        "from {} to {}",
        speak_date(dates.check_in()),
        speak_date(dates.occupied().end_exclusive)
    )
}

/// "1 guest", "3 guests"
pub fn guests_phrase(guests: u32) -> String {
    if guests == 1 {
        "1 guest".to_owned()
    } else {
        format!("{guests} guests")
    }
}

pub fn render(prompt: &Prompt, context: &PromptContext) -> String {
    match prompt {
        Prompt::Greeting => format!(
            "Hello, welcome to {}. I can help you book a stay. {DATES_QUESTION}",
            context.business_name
        ),
        Prompt::AskDates => DATES_QUESTION.to_owned(),
        Prompt::RetryDates => format!(
            "Sorry, I didn't catch the dates. You can say something like August 10th through the 12th. {DATES_QUESTION}"
        ),
        Prompt::InvalidDates => {
            "That doesn't look like a real calendar date. What dates would you like to stay?"
                .to_owned()
        }
        Prompt::DatesTaken => {
            "I'm sorry, those dates are already booked. Are there other dates that would work for you?"
                .to_owned()
        }
        Prompt::AskGuests { dates: Some(dates) } => {
            format!("Great, {} is open. {GUESTS_QUESTION}", speak_stay(dates))
        }
        Prompt::AskGuests { dates: None } => GUESTS_QUESTION.to_owned(),
        Prompt::RetryGuests => {
            format!("Sorry, I didn't catch the number of guests. {GUESTS_QUESTION}")
        }
        Prompt::AskName { guests: Some(guests) } => {
            format!("Got it, {}. {NAME_QUESTION}", guests_phrase(*guests))
        }
        Prompt::AskName { guests: None } => NAME_QUESTION.to_owned(),
        Prompt::ConfirmName { name } => {
            format!("I have {name}, spelled {}. Is that correct?", spell_out(name))
        }
        Prompt::AskNameSpelled => {
            "Could you please spell the name for the reservation, one letter at a time?".to_owned()
        }
        Prompt::RetryNameSpelled => {
            "Sorry, I still didn't catch that. Please spell the name one letter at a time."
                .to_owned()
        }
        Prompt::ConfirmSpelledName { name } => {
            format!("Thank you. I have {}. Is that correct?", spell_out(name))
        }
        Prompt::AskEmail => EMAIL_QUESTION.to_owned(),
        Prompt::RetryEmail => format!("Sorry, I didn't catch that. {EMAIL_QUESTION}"),
        Prompt::ConfirmEmail { address } => {
            format!("I have {}. Is that correct?", speak_email(address))
        }
        Prompt::AskEmailSpelled => {
            "Please spell the email address for me, saying at and dot where they belong."
                .to_owned()
        }
        Prompt::RepeatConfirmation { step, value } => {
            let readback = match step {
                DialogueStep::AwaitEmailConfirm => speak_email(value),
                _ => spell_out(value),
            };
            format!("Sorry, please answer yes or no. I have {readback}. Is that correct?")
        }
        Prompt::Finalizing => "One moment while I check the calendar.".to_owned(),
        Prompt::Booked { name, guests, dates } => format!(
            "Thank you, {name}. Your reservation for {} {} is confirmed. Goodbye!",
            guests_phrase(*guests),
            speak_booked_stay(dates)
        ),
        Prompt::Apology => {
            "I'm sorry, there was an issue saving your booking. Please call back and try again."
                .to_owned()
        }
    }
}
