//! Publish error taxonomy and exit codes.

use crate::github::classify::Hint;
use std::{path::PathBuf, process::ExitCode};
use thiserror::Error;

/// Exit code for unrecoverable failures.
pub const EXIT_FAILURE: u8 = 1;
/// Exit code after a user interrupt (128 + SIGINT).
pub const EXIT_INTERRUPTED: u8 = 130;

/// Failures the publish flows know how to describe.
///
/// Anything else reaching `main` is an unexpected error and is reported with
/// its full cause chain.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("`{tool}` is not installed")]
    ToolMissing { tool: String, instructions: String },

    #[error("GitHub CLI is not authenticated")]
    AuthRequired,

    #[error("`{}` is not a git repository", .0.display())]
    NoRepository(PathBuf),

    #[error("no remote repository is configured")]
    NoRemote,

    #[error("missing required web files: {}", .0.join(", "))]
    MissingWebFiles(Vec<String>),

    #[error("`gh {0}` is not supported by the installed GitHub CLI")]
    SubcommandUnsupported(String),

    #[error("{operation} failed")]
    GitOperationFailed {
        operation: String,
        stderr: String,
        hint: Option<Hint>,
    },

    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("cancelled by user")]
    Interrupted,
}

impl PublishError {
    /// Shorthand for a failed external operation.
    pub fn failed(operation: impl Into<String>, stderr: impl Into<String>, hint: Option<Hint>) -> Self {
        Self::GitOperationFailed {
            operation: operation.into(),
            stderr: stderr.into(),
            hint,
        }
    }

    /// Supporting text shown below the headline.
    pub fn details(&self) -> Option<String> {
        match self {
            Self::ToolMissing { instructions, .. } => {
                Some(format!("Installation instructions:\n{instructions}"))
            }
            Self::GitOperationFailed { stderr, hint, .. } => {
                let mut text = stderr.trim().to_owned();
                if let Some(hint) = hint {
                    if !text.is_empty() {
                        text.push_str("\n\n");
                    }
                    text.push_str(&hint.to_string());
                }
                Some(text).filter(|t| !t.is_empty())
            }
            _ => None,
        }
    }

    pub const fn exit_status(&self) -> u8 {
        match self {
            Self::Interrupted => EXIT_INTERRUPTED,
            _ => EXIT_FAILURE,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}
