use tera::{Context, Tera};

const GATHER_TEMPLATE: &str = include_str!("../templates/gather.xml");
const HANGUP_TEMPLATE: &str = include_str!("../templates/hangup.xml");

/// Returned when a template cannot be rendered; keeps the caller from hearing silence.
pub const FALLBACK_TWIML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n  <Say>We're sorry, something went wrong. Please call back in a few minutes.</Say>\n  <Hangup/>\n</Response>\n";

/// TwiML documents for the voice webhook. Template names end in `.xml`, so every inserted
/// value is escaped.
pub struct TwimlRenderer {
    tera: Tera,
    voice: String,
    language: String,
    action: String,
}

impl TwimlRenderer {
    pub fn new(
        voice: impl Into<String>,
        language: impl Into<String>,
        action: impl Into<String>,
    ) -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![("gather.xml", GATHER_TEMPLATE), ("hangup.xml", HANGUP_TEMPLATE)])?;
        Ok(Self { tera, voice: voice.into(), language: language.into(), action: action.into() })
    }

    /// Speaks `prompt` and listens for the next utterance.
    pub fn gather(&self, prompt: &str) -> Result<String, tera::Error> {
        self.render("gather.xml", prompt)
    }

    /// Speaks `prompt` and ends the call.
    pub fn hangup(&self, prompt: &str) -> Result<String, tera::Error> {
        self.render("hangup.xml", prompt)
    }

    fn render(&self, template: &str, prompt: &str) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("prompt", prompt);
        context.insert("voice", &self.voice);
        context.insert("language", &self.language);
        context.insert("action", &self.action);
        self.tera.render(template, &context)
    }
}
