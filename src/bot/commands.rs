//! Slash-command parsing.

/// A recognised bot command and its argument text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    SetVoice,
    SetRole,
    SetSpeed,
    SetFormat,
    SetDialect,
    Settings,
    Reset,
    /// Raw legacy markup following the command, possibly empty
    SpeakSsml(String),
    ToggleFormat,
    DemoMarkup,
    Unknown(String),
}

impl Command {
    /// Parse a message text. `None` when the text is not a command.
    ///
    /// `/cmd@botname args` is accepted; the mention is dropped.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim_start();
        let rest = text.strip_prefix('/')?;

        let (head, args) = match rest.find(char::is_whitespace) {
            Some(idx) => (&rest[..idx], rest[idx..].trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or(head).to_lowercase();

        let command = match name.as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "set_voice" => Self::SetVoice,
            "set_role" => Self::SetRole,
            "set_speed" => Self::SetSpeed,
            "set_format" => Self::SetFormat,
            "set_dialect" => Self::SetDialect,
            "settings" => Self::Settings,
            "reset" => Self::Reset,
            "speak_ssml" => Self::SpeakSsml(args.to_string()),
            "toggle_format" => Self::ToggleFormat,
            "demo_markup" => Self::DemoMarkup,
            _ => Self::Unknown(name),
        };
        Some(command)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::SetVoice => "set_voice",
            Self::SetRole => "set_role",
            Self::SetSpeed => "set_speed",
            Self::SetFormat => "set_format",
            Self::SetDialect => "set_dialect",
            Self::Settings => "settings",
            Self::Reset => "reset",
            Self::SpeakSsml(_) => "speak_ssml",
            Self::ToggleFormat => "toggle_format",
            Self::DemoMarkup => "demo_markup",
            Self::Unknown(name) => name,
        }
    }
}
