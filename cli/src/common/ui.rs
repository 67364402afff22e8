//! # plumrs Terminal Output (`common::ui`)
//!
//! File: cli/src/common/ui.rs
//!
//! ## Overview
//!
//! User-facing results go to stdout through these helpers; diagnostics go
//! through `tracing` to stderr. Each helper maps a logical role to a `colored`
//! color:
//!
//! | Role        | Color  | Used for                                   |
//! |-------------|--------|--------------------------------------------|
//! | `Highlight` | yellow | matching repositories                      |
//! | `Success`   | green  | finished transfers, reachable hosts        |
//! | `Failure`   | red    | command output of a failed step, details   |
//! | `Plain`     | none   | everything else                            |
//!
//! Coloring is decided once per call by `color_enabled`: off when `NO_COLOR`
//! is set or stdout is not a terminal, so piped output stays clean.
//!
use colored::{Color, Colorize};
use std::io::IsTerminal;

/// Logical output role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Highlight,
    Success,
    Failure,
}

impl Style {
    pub fn color(self) -> Option<Color> {
        match self {
            Style::Plain => None,
            Style::Highlight => Some(Color::Yellow),
            Style::Success => Some(Color::Green),
            Style::Failure => Some(Color::Red),
        }
    }

    /// Renders `text` in this role's color when `enabled`.
    pub fn paint(self, text: &str, enabled: bool) -> String {
        match self.color() {
            Some(color) if enabled => text.color(color).to_string(),
            _ => text.to_string(),
        }
    }
}

/// Whether stdout should receive ANSI colors.
pub fn color_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

pub fn print_styled(style: Style, text: &str) {
    println!("{}", style.paint(text, color_enabled()));
}

pub fn print_plain(text: &str) {
    print_styled(Style::Plain, text);
}

pub fn print_highlight(text: &str) {
    print_styled(Style::Highlight, text);
}

pub fn print_success(text: &str) {
    print_styled(Style::Success, text);
}

pub fn print_failure(text: &str) {
    print_styled(Style::Failure, text);
}

/// Prints `Error: <message>` to stderr, red when stderr is a terminal.
pub fn print_error(err: &anyhow::Error) {
    let enabled = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
    eprintln!("{}", Style::Failure.paint(&format_error(err), enabled));
}

/// `Error: <message>` with the context chain joined by `: `.
pub fn format_error(err: &anyhow::Error) -> String {
    format!("Error: {:#}", err)
}
