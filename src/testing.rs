//! Test doubles shared by the unit tests: scripted command results, a
//! recording sink, scripted prompt answers and a lock for tests that move the
//! process working directory.

use crate::{
    config::PublishConfig,
    logger::{Sink, Status},
    prompt::Prompter,
    utils::exec::{CommandResult, Runner, display_command},
};
use anyhow::{Result, bail};
use parking_lot::{Mutex, MutexGuard};
use std::{
    cell::RefCell,
    collections::VecDeque,
    ffi::OsString,
    path::{Path, PathBuf},
};

/// Serialises tests that change the current directory or register deploy
/// workspaces.
static CWD: Mutex<()> = Mutex::new(());

pub fn cwd_lock() -> MutexGuard<'static, ()> {
    CWD.lock()
}

/// Default config rooted at `root`.
pub fn config_at(root: &Path) -> PublishConfig {
    let mut config = PublishConfig::default();
    config.root = root.to_path_buf();
    config
}

// ============================================================================
// Scripted Runner
// ============================================================================

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct Call {
    pub root: Option<PathBuf>,
    pub line: String,
    pub interactive: bool,
}

struct Rule {
    prefix: String,
    results: RefCell<VecDeque<CommandResult>>,
}

/// [`Runner`] answering from rules keyed by command-line prefix.
///
/// The first rule whose prefix matches `program arg...` answers. A rule with
/// several results hands them out in order and repeats the last one.
/// Unmatched commands succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    calls: RefCell<Vec<Call>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, prefix: &str, result: CommandResult) -> Self {
        match self.rules.iter().find(|r| r.prefix == prefix) {
            Some(rule) => rule.results.borrow_mut().push_back(result),
            None => self.rules.push(Rule {
                prefix: prefix.to_owned(),
                results: RefCell::new(VecDeque::from([result])),
            }),
        }
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn find(&self, prefix: &str) -> Option<Call> {
        self.calls
            .borrow()
            .iter()
            .find(|c| c.line.starts_with(prefix))
            .cloned()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.find(prefix).is_some()
    }

    fn answer(&self, root: Option<&Path>, line: String, interactive: bool) -> CommandResult {
        let result = self
            .rules
            .iter()
            .find(|r| line.starts_with(&r.prefix))
            .map(|rule| {
                let mut results = rule.results.borrow_mut();
                if results.len() > 1 {
                    results.pop_front().unwrap_or_default()
                } else {
                    results.front().cloned().unwrap_or_default()
                }
            })
            .unwrap_or_default();

        self.calls.borrow_mut().push(Call {
            root: root.map(Path::to_path_buf),
            line,
            interactive,
        });
        result
    }
}

impl Runner for ScriptedRunner {
    fn run(
        &self,
        root: Option<&Path>,
        cmd: &[OsString],
        args: &[OsString],
    ) -> Result<CommandResult> {
        Ok(self.answer(root, display_command(cmd, args), false))
    }

    fn run_interactive(
        &self,
        root: Option<&Path>,
        cmd: &[OsString],
        args: &[OsString],
    ) -> Result<CommandResult> {
        Ok(self.answer(root, display_command(cmd, args), true))
    }
}

// ============================================================================
// Recording Sink
// ============================================================================

#[derive(Debug, Clone)]
pub struct Entry {
    pub level: Status,
    pub message: String,
    pub details: Option<String>,
}

/// [`Sink`] that keeps every report.
#[derive(Default)]
pub struct Recorder {
    entries: RefCell<Vec<Entry>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.entries.borrow().clone()
    }

    /// Whether a report at `level` mentions `needle` in message or details.
    pub fn has(&self, level: Status, needle: &str) -> bool {
        self.entries.borrow().iter().any(|e| {
            e.level == level
                && (e.message.contains(needle)
                    || e.details.as_deref().is_some_and(|d| d.contains(needle)))
        })
    }
}

impl Sink for Recorder {
    fn status(&self, level: Status, message: &str, details: Option<&str>) {
        self.entries.borrow_mut().push(Entry {
            level,
            message: message.to_owned(),
            details: details.map(str::to_owned),
        });
    }
}

// ============================================================================
// Scripted Prompter
// ============================================================================

#[derive(Debug, Clone)]
pub enum Answer {
    Yes,
    No,
    Pick(usize),
    Text(&'static str),
}

/// [`Prompter`] replaying queued answers; falls back to defaults once the
/// queue is empty.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<Answer>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: RefCell::new(answers.into_iter().collect()),
            asked: RefCell::default(),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }

    fn next(&self, prompt: &str) -> Option<Answer> {
        self.asked.borrow_mut().push(prompt.to_owned());
        self.answers.borrow_mut().pop_front()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        match self.next(prompt) {
            None => Ok(default),
            Some(Answer::Yes) => Ok(true),
            Some(Answer::No) => Ok(false),
            Some(other) => bail!("expected a yes/no answer for `{prompt}`, got {other:?}"),
        }
    }

    fn select(&self, prompt: &str, items: &[&str], default: usize) -> Result<usize> {
        match self.next(prompt) {
            None => Ok(default),
            Some(Answer::Pick(i)) if i < items.len() => Ok(i),
            Some(other) => bail!("expected a selection for `{prompt}`, got {other:?}"),
        }
    }

    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        match self.next(prompt) {
            Some(Answer::Text(text)) => Ok(text.to_owned()),
            None => match default {
                Some(d) => Ok(d.to_owned()),
                None => bail!("no answer scripted for `{prompt}`"),
            },
            Some(other) => bail!("expected text for `{prompt}`, got {other:?}"),
        }
    }
}
