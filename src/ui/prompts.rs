//! ui::prompts
//!
//! Interactive prompts.
//!
//! # Design
//!
//! Prompts are only shown in interactive mode. In non-interactive mode,
//! commands needing input must take it from flags or stdin, or fail with a
//! clear error message.

use std::io::{self, BufRead, Write};

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("not in interactive mode")]
    NotInteractive,

    #[error("no input on stdin")]
    NoInput,

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<io::Error> for PromptError {
    fn from(err: io::Error) -> Self {
        PromptError::IoError(err.to_string())
    }
}

/// Prompt for a line of text.
///
/// The trailing newline is removed.
pub fn input(message: &str, interactive: bool) -> Result<String, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }
    print!("{}: ", message);
    io::stdout().flush()?;
    read_line(io::stdin().lock())
}

/// Prompt for masked input (passwords).
///
/// The input is not echoed to the terminal.
pub fn password(message: &str, interactive: bool) -> Result<String, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }
    Ok(rpassword::prompt_password(format!("{}: ", message))?)
}

/// Read one line from stdin, for `--password-stdin`.
pub fn stdin_line() -> Result<String, PromptError> {
    read_line(io::stdin().lock())
}

fn read_line(mut reader: impl BufRead) -> Result<String, PromptError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(PromptError::NoInput);
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_prompts_fail() {
        assert!(matches!(input("Login", false), Err(PromptError::NotInteractive)));
        assert!(matches!(password("Password", false), Err(PromptError::NotInteractive)));
    }

    #[test]
    fn read_line_strips_newline_only() {
        let line = read_line(&b" secret1 \r\nnext\n"[..]).expect("line");
        assert_eq!(line, " secret1 ");
    }

    #[test]
    fn read_line_on_empty_input() {
        assert!(matches!(read_line(&b""[..]), Err(PromptError::NoInput)));
    }
}
