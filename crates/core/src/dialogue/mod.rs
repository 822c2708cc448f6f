pub mod engine;
pub mod prompts;
pub mod service;
pub mod states;

pub use engine::{replay_prompt, transition, DialogueEngine};
pub use prompts::{render, speak_date, speak_stay, PromptContext};
pub use service::{DialogueService, DialogueSettings, TurnRequest, TurnResponse};
pub use states::{DialogueAction, DialogueOptions, DialogueStep, Prompt, Transition, TurnEvent};
