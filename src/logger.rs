//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - [`Status`] levels and the [`Sink`] trait the publish flows report through
//! - [`Console`], the terminal implementation of [`Sink`]
//!
//! # Example
//!
//! ```ignore
//! // Simple logging
//! log!("git"; "pushing to {}", url);
//!
//! // Status reporting through an injected sink
//! sink.success("Published to GitHub Pages");
//! sink.status(Status::Error, "push failed", Some(&stderr));
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    fmt,
    io::{Write, stdout},
    sync::OnceLock,
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Length of brackets around module name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[module] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;
/// Indentation of detail lines below a status headline
const DETAIL_INDENT: &str = "    ";

/// Calculate total prefix length for a module name.
///
/// Returns: `module.len() + 3` (for `[`, `]`, and trailing space)
#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a message with a colored module prefix.
///
/// Single-line messages are truncated to the terminal width; multiline
/// messages are printed as-is.
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);
    let width = get_terminal_width() as usize;

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();

    if message.contains('\n') {
        writeln!(stdout, "{prefix} {message}").ok();
    } else {
        let max_msg_len = width.saturating_sub(calc_prefix_len(module.len()));
        writeln!(stdout, "{prefix} {}", truncate_str(message, max_msg_len)).ok();
    }

    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "success" => prefix.bright_green().bold(),
        "info" => prefix.bright_blue().bold(),
        "warning" => prefix.bright_yellow().bold(),
        "error" => prefix.bright_red().bold(),
        "exec" => prefix.bright_black().bold(),
        _ => prefix.bright_cyan().bold(),
    }
}

/// Truncate a string to fit within `max_len` bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Indent every line of `details` for display below a headline.
fn indent_details(details: &str) -> String {
    details
        .lines()
        .map(|line| format!("{DETAIL_INDENT}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Status Sink
// ============================================================================

/// Severity of a status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Info,
    Warning,
    Error,
}

impl Status {
    /// Module label used as the colored prefix.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Destination for user-facing status reports.
///
/// The publish flows never print directly; they report through a sink so
/// they can run against a recording sink in tests.
pub trait Sink {
    /// Report a message at the given level, with optional detail text.
    fn status(&self, level: Status, message: &str, details: Option<&str>);

    fn success(&self, message: &str) {
        self.status(Status::Success, message, None);
    }

    fn info(&self, message: &str) {
        self.status(Status::Info, message, None);
    }

    fn warn(&self, message: &str) {
        self.status(Status::Warning, message, None);
    }

    fn error(&self, message: &str) {
        self.status(Status::Error, message, None);
    }
}

/// Terminal sink writing through [`log`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Console;

impl Sink for Console {
    fn status(&self, level: Status, message: &str, details: Option<&str>) {
        log(level.label(), message);

        if let Some(details) = details.map(str::trim).filter(|d| !d.is_empty()) {
            let mut stdout = stdout().lock();
            writeln!(stdout, "{}", indent_details(details).dimmed()).ok();
            stdout.flush().ok();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
