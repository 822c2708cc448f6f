//! Deterministic parsers for transcribed caller speech.

pub mod answer;
pub mod dates;
pub mod email;
pub mod guests;
pub mod ordinal;
pub(crate) mod spelling;

pub use answer::{interpret_yes_no, YesNo};
pub use dates::{parse_date_range, resolve_month_day, resolve_range, MonthDay, ParsedDateRange};
pub use email::{parse_spoken_email, speak_email, SpokenEmail};
pub use guests::parse_guest_count;
pub use ordinal::normalize_ordinals;
pub use spelling::{parse_spoken_name, spell_out};
