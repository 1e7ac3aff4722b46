//! User prompts.
//!
//! The publish flow asks through a [`Prompter`] so it can run unattended
//! (`--yes`) or against scripted answers in tests.

use crate::error::PublishError;
use anyhow::{Result, bail};
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use std::io;

pub trait Prompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;

    /// Pick one of `items`; returns its index.
    fn select(&self, prompt: &str, items: &[&str], default: usize) -> Result<usize>;

    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String>;
}

/// Terminal prompts via dialoguer.
#[derive(Default)]
pub struct Interactive {
    theme: ColorfulTheme,
}

/// Map Ctrl+C at a prompt to [`PublishError::Interrupted`].
///
/// The terminal reports it as an `Interrupted` I/O error while the signal
/// handler is still exiting, so both paths end with the same status.
fn answered<T>(answer: dialoguer::Result<T>) -> Result<T> {
    match answer {
        Ok(value) => Ok(value),
        Err(dialoguer::Error::IO(err)) if err.kind() == io::ErrorKind::Interrupted => {
            Err(PublishError::Interrupted.into())
        }
        Err(err) => Err(err.into()),
    }
}

impl Prompter for Interactive {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        answered(
            Confirm::with_theme(&self.theme)
                .with_prompt(prompt)
                .default(default)
                .interact(),
        )
    }

    fn select(&self, prompt: &str, items: &[&str], default: usize) -> Result<usize> {
        answered(
            Select::with_theme(&self.theme)
                .with_prompt(prompt)
                .items(items)
                .default(default)
                .interact(),
        )
    }

    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::with_theme(&self.theme).with_prompt(prompt);
        if let Some(default) = default {
            input = input.default(default.to_owned());
        }
        answered(input.interact_text())
    }
}

/// Accepts every default without asking (`--yes`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeDefaults;

impl Prompter for AssumeDefaults {
    fn confirm(&self, _prompt: &str, default: bool) -> Result<bool> {
        Ok(default)
    }

    fn select(&self, _prompt: &str, _items: &[&str], default: usize) -> Result<usize> {
        Ok(default)
    }

    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        match default {
            Some(default) => Ok(default.to_owned()),
            None => bail!("`{prompt}` needs an answer; run without --yes"),
        }
    }
}
