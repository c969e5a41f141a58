//! ui
//!
//! User interaction utilities for the `foodcare` binary.
//!
//! # Modules
//!
//! - [`prompts`] - Interactive text and password prompts
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All command output and prompts go through this module so that quiet
//! and non-interactive modes are handled in one place. Diagnostics go
//! through `tracing`, not through here.

pub mod output;
pub mod prompts;
