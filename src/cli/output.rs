//! CLI output formatting utilities.
//!
//! Operator logging goes through `tracing`; these helpers format what a
//! person running the tool is meant to read.

use console::{style, StyledObject};

/// Styled terminal output for the CLI commands.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{}", Self::prefixed(style(">>").cyan().bold(), msg));
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{}", Self::prefixed(style(">>").green().bold(), msg));
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{}", Self::prefixed(style(">>").yellow().bold(), msg));
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{}", Self::prefixed(style(">>").red().bold(), msg));
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    fn prefixed(prefix: StyledObject<&str>, msg: &str) -> String {
        format!("{} {}", prefix, msg)
    }
}

/// Format a duration in whole minutes for display.
pub fn format_minutes(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;

    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}
