//! Shared output layer for human/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: readable text for humans, stable JSON for scripts and
//! agents.

use anyhow::Result;
use serde::Serialize;

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Machine-readable error envelope for `--json` consumers.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl CliError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            hint: Some(hint.into()),
        }
    }
}

/// Print a value as pretty JSON on stdout.
pub fn render_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print an error in the requested mode; human errors go to stderr.
pub fn render_error(mode: OutputMode, error: &CliError) -> Result<()> {
    if mode.is_json() {
        render_json(error)?;
    } else {
        eprintln!("error: {}", error.error);
        if let Some(hint) = &error.hint {
            eprintln!("  hint: {hint}");
        }
    }
    Ok(())
}
