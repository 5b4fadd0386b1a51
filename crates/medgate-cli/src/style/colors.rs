//! Semantic color palette for terminal output.

use owo_colors::{OwoColorize, Style};

/// Named styles used across commands.
#[derive(Clone, Copy, Debug)]
pub enum Tone {
    /// ALLOW, successful checks.
    Allow,
    /// DENY, failures.
    Deny,
    Warning,
    Muted,
    Header,
    /// Policy text and attribute names.
    Code,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Tone::Allow => Style::new().green().bold(),
            Tone::Deny => Style::new().red().bold(),
            Tone::Warning => Style::new().yellow(),
            Tone::Muted => Style::new().dimmed(),
            Tone::Header => Style::new().bold(),
            Tone::Code => Style::new().cyan(),
        }
    }
}

/// Applies a [`Tone`] unless colors are disabled.
pub trait SemanticStyle: Sized {
    fn tone(&self, tone: Tone) -> String;

    fn allow(&self) -> String {
        self.tone(Tone::Allow)
    }

    fn deny(&self) -> String {
        self.tone(Tone::Deny)
    }

    fn warning(&self) -> String {
        self.tone(Tone::Warning)
    }

    fn muted(&self) -> String {
        self.tone(Tone::Muted)
    }

    fn header(&self) -> String {
        self.tone(Tone::Header)
    }

    fn code(&self) -> String {
        self.tone(Tone::Code)
    }
}

impl<T: std::fmt::Display> SemanticStyle for T {
    fn tone(&self, tone: Tone) -> String {
        if super::no_color() {
            self.to_string()
        } else {
            self.style(tone.style()).to_string()
        }
    }
}
