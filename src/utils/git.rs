//! Git operations used by the publish flows.
//!
//! Thin wrappers over `git` invocations in one directory. Expected failures
//! ("nothing to commit", a missing config key) are answered as values; other
//! failures become [`PublishError::GitOperationFailed`].

use crate::{
    config::PublishConfig,
    error::PublishError,
    github::classify::{Classification, Hint, Operation, classify},
    logger::Sink,
    run,
    utils::exec::{CommandResult, Runner},
};
use anyhow::Result;
use std::path::Path;

/// Branch assumed when git cannot name the current one.
pub const DEFAULT_BRANCH: &str = "main";

/// Branches tried when pushing the current branch fails.
const COMMON_BRANCHES: &[&str] = &["main", "master"];

/// `git` bound to a working directory.
#[derive(Clone, Copy)]
pub struct Git<'a> {
    runner: &'a dyn Runner,
    program: &'a [String],
    dir: &'a Path,
}

impl<'a> Git<'a> {
    pub fn new(config: &'a PublishConfig, runner: &'a dyn Runner, dir: &'a Path) -> Self {
        Self {
            runner,
            program: &config.tools.git,
            dir,
        }
    }

    /// Fail with stderr unless `result` succeeded.
    fn check(result: CommandResult, operation: &str) -> Result<CommandResult> {
        if result.success() {
            return Ok(result);
        }
        Err(PublishError::failed(operation, result.diagnostics(), None).into())
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Name of the checked-out branch.
    ///
    /// Falls back to `rev-parse` for git versions without `--show-current`,
    /// then to [`DEFAULT_BRANCH`] (e.g. on a detached HEAD).
    pub fn current_branch(&self) -> Result<String> {
        let shown = run!(self.runner; self.dir; self.program; "branch", "--show-current")?;
        if let Some(branch) = shown.value() {
            return Ok(branch.to_owned());
        }

        let parsed = run!(self.runner; self.dir; self.program; "rev-parse", "--abbrev-ref", "HEAD")?;
        Ok(match parsed.value() {
            Some(branch) if branch != "HEAD" => branch.to_owned(),
            _ => DEFAULT_BRANCH.to_owned(),
        })
    }

    /// URL of `origin`, if configured.
    pub fn origin_url(&self) -> Result<Option<String>> {
        let result = run!(self.runner; self.dir; self.program; "remote", "get-url", "origin")?;
        Ok(result.value().map(str::to_owned))
    }

    /// Whether the working tree has uncommitted changes.
    pub fn is_dirty(&self) -> Result<bool> {
        let result = run!(self.runner; self.dir; self.program; "status", "--porcelain")?;
        let result = Self::check(result, "git status")?;
        Ok(!result.stdout.is_empty())
    }

    /// Value of a config key, `None` when unset.
    pub fn config_value(&self, key: &str) -> Result<Option<String>> {
        let result = run!(self.runner; self.dir; self.program; "config", key)?;
        Ok(result.value().map(str::to_owned))
    }

    /// Whether `origin` has a branch named `branch`.
    pub fn remote_has_branch(&self, branch: &str) -> Result<bool> {
        let result =
            run!(self.runner; self.dir; self.program; "ls-remote", "--heads", "origin", branch)?;
        let result = Self::check(result, "git ls-remote")?;
        Ok(!result.stdout.is_empty())
    }

    // ------------------------------------------------------------------------
    // Repository Setup
    // ------------------------------------------------------------------------

    pub fn init(&self) -> Result<()> {
        let result = run!(self.runner; self.dir; self.program; "init")?;
        Self::check(result, "git init")?;
        Ok(())
    }

    /// Shallow clone of a single branch into the directory.
    ///
    /// Returns false when the clone fails.
    pub fn clone_branch(&self, url: &str, branch: &str) -> Result<bool> {
        let result = run!(self.runner; self.dir; self.program;
            "clone", "--depth", "1", "--single-branch", "--branch", branch, url, "."
        )?;
        Ok(result.success())
    }

    /// Point HEAD at a branch that has no commits yet.
    pub fn set_head(&self, branch: &str) -> Result<()> {
        let target = format!("refs/heads/{branch}");
        let result = run!(self.runner; self.dir; self.program; "symbolic-ref", "HEAD", target)?;
        Self::check(result, "git symbolic-ref")?;
        Ok(())
    }

    pub fn add_remote(&self, url: &str) -> Result<()> {
        let result = run!(self.runner; self.dir; self.program; "remote", "add", "origin", url)?;
        Self::check(result, "git remote add")?;
        Ok(())
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        let result = run!(self.runner; self.dir; self.program; "config", key, value)?;
        Self::check(result, "git config")?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Commit & Push
    // ------------------------------------------------------------------------

    /// Stage everything and commit.
    ///
    /// Returns false when there was nothing to commit.
    pub fn commit_all(&self, message: &str) -> Result<bool> {
        let added = run!(self.runner; self.dir; self.program; "add", "-A")?;
        Self::check(added, "git add")?;

        let result = run!(self.runner; self.dir; self.program; "commit", "-m", message)?;
        if result.success() {
            return Ok(true);
        }

        match classify(&result.diagnostics(), Operation::Commit) {
            Classification::KnownRecoverable(Hint::NothingToCommit) => Ok(false),
            _ => Err(PublishError::failed("git commit", result.diagnostics(), None).into()),
        }
    }

    /// Push `HEAD` to `branch` on `origin`.
    pub fn push_head(&self, branch: &str, force: bool) -> Result<()> {
        let refspec = format!("HEAD:refs/heads/{branch}");
        let force = if force { "--force" } else { "" };
        let result = run!(self.runner; self.dir; self.program; "push", force, "origin", refspec)?;
        if result.success() {
            return Ok(());
        }

        let hint = match classify(&result.diagnostics(), Operation::Push) {
            Classification::KnownRecoverable(hint) => Some(hint),
            _ => None,
        };
        Err(PublishError::failed("git push", result.diagnostics(), hint).into())
    }

    /// Push the source branch, setting its upstream.
    ///
    /// A branch missing on the remote is retried with `--set-upstream`;
    /// otherwise the common default branches are tried before giving up.
    pub fn push_upstream(&self, branch: &str, sink: &dyn Sink) -> Result<()> {
        let result = run!(self.runner; self.dir; self.program; "push", "-u", "origin", branch)?;
        if result.success() {
            return Ok(());
        }

        let hint = classify(&result.diagnostics(), Operation::Push);
        if hint == Classification::KnownRecoverable(Hint::RemoteRefMissing) {
            sink.info(&format!("Branch '{branch}' doesn't exist on remote yet"));
            let retried = run!(self.runner; self.dir; self.program;
                "push", "--set-upstream", "origin", branch
            )?;
            return Self::check(retried, "git push").map(drop);
        }

        for common in COMMON_BRANCHES.iter().filter(|b| **b != branch) {
            sink.info(&format!("Trying to push to '{common}' branch instead"));
            let retried = run!(self.runner; self.dir; self.program; "push", "-u", "origin", *common)?;
            if retried.success() {
                return Ok(());
            }
        }

        let hint = match hint {
            Classification::KnownRecoverable(hint) => Some(hint),
            _ => None,
        };
        Err(PublishError::failed("git push", result.diagnostics(), hint).into())
    }
}
