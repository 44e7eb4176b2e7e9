//! Console styles for the robopedia CLI.
//!
//! Rendering code asks for a semantic style (a title, a muted timestamp, a
//! warning) and never picks colors itself. Changing the palette happens here.

use console::Style;

pub fn title() -> Style {
    Style::new().bold()
}

pub fn muted() -> Style {
    Style::new().color256(245)
}

pub fn faint() -> Style {
    Style::new().color256(240)
}

pub fn accent() -> Style {
    Style::new().yellow()
}

pub fn info() -> Style {
    Style::new().cyan()
}

pub fn success() -> Style {
    Style::new().green()
}

pub fn warning() -> Style {
    Style::new().yellow().bold()
}

pub fn error() -> Style {
    Style::new().red().bold()
}
