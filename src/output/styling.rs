use std::fmt::Display;

use console::{style, StyledObject};

/// Text roles used across the terminal output.
///
/// Renderers pick a role rather than a color, so every table and summary
/// uses the same palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Field names and secondary details
    Label,
    /// Branch names and other identifiers
    Value,
    /// Counts and things still pending
    Highlight,
    Success,
    Failure,
    /// Section titles
    Heading,
    Brand,
}

pub fn paint(tone: Tone, text: impl Display) -> StyledObject<String> {
    let styled = style(text.to_string());
    match tone {
        Tone::Label => styled.dim(),
        Tone::Value => styled.cyan(),
        Tone::Highlight => styled.bright().yellow(),
        Tone::Success => styled.bright().green(),
        Tone::Failure => styled.bright().red(),
        Tone::Heading => styled.bright().underlined(),
        Tone::Brand => styled.blue().bold(),
    }
}
