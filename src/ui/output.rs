//! ui::output
//!
//! Everything the binary prints.
//!
//! Human-oriented lines are suppressed by `-q`; machine-readable lines
//! ([`plain`]) and errors are always printed. Errors go to stderr.

use std::fmt::Display;

/// How chatty the binary is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// `-q`: only machine-readable output
    Quiet,
    #[default]
    Normal,
    /// `--debug`: normal output; debug logs are enabled separately
    Debug,
}

impl Verbosity {
    /// `-q` wins over `--debug`.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        match (quiet, debug) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Debug,
            (false, false) => Verbosity::Normal,
        }
    }

    pub fn is_quiet(self) -> bool {
        self == Verbosity::Quiet
    }
}

/// Print a human-oriented line unless quiet.
pub fn print(message: impl Display, verbosity: Verbosity) {
    if !verbosity.is_quiet() {
        println!("{}", message);
    }
}

/// Print a machine-readable line.
pub fn plain(message: impl Display) {
    println!("{}", message);
}

/// Print an error to stderr.
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Lay `rows` out in left-aligned columns separated by two spaces.
///
/// Trailing whitespace is trimmed from every line.
pub fn format_rows(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|col| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    rows.iter()
        .map(|row| {
            let line: String = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}  ", cell, width = width))
                .collect();
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
