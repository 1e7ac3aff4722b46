//! Capability probe for the installed GitHub CLI.
//!
//! Older `gh` releases lack some subcommands (notably `pages deploy`); the
//! probe asks each one for `--help` and treats an "unknown command" answer
//! as unsupported.

use super::classify::{Classification, Operation, classify};
use crate::{
    config::PublishConfig,
    logger::Sink,
    utils::exec::{Runner, internal::to_cmd_vec},
};
use anyhow::Result;
use std::{ffi::OsString, fmt};

/// Subcommands supported by the installed `gh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub auth: bool,
    pub repo_create: bool,
    pub pages_deploy: bool,
    pub api: bool,
}

impl Capabilities {
    /// Assume everything is available (used when probing is skipped).
    pub const ALL: Self = Self {
        auth: true,
        repo_create: true,
        pages_deploy: true,
        api: true,
    };

    /// Names of the unsupported subcommands.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("auth", self.auth),
            ("repo create", self.repo_create),
            ("pages deploy", self.pages_deploy),
            ("api", self.api),
        ]
        .into_iter()
        .filter_map(|(name, supported)| (!supported).then_some(name))
        .collect()
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |supported: bool| if supported { "yes" } else { "no" };
        write!(
            f,
            "auth: {}, repo create: {}, pages deploy: {}, api: {}",
            mark(self.auth),
            mark(self.repo_create),
            mark(self.pages_deploy),
            mark(self.api)
        )
    }
}

/// Probe which subcommands the installed `gh` supports.
pub fn probe(config: &PublishConfig, runner: &dyn Runner, sink: &dyn Sink) -> Result<Capabilities> {
    let capabilities = Capabilities {
        auth: supports(config, runner, "auth")?,
        repo_create: supports(config, runner, "repo create")?,
        pages_deploy: supports(config, runner, "pages deploy")?,
        api: supports(config, runner, "api")?,
    };
    sink.info(&format!("GitHub CLI capabilities: {capabilities}"));
    Ok(capabilities)
}

/// Whether `gh <subcommand> --help` is understood.
///
/// A failure that does not name an unknown command still counts as
/// supported: the subcommand exists but refused for another reason.
fn supports(config: &PublishConfig, runner: &dyn Runner, subcommand: &str) -> Result<bool> {
    let mut args: Vec<OsString> = subcommand.split_whitespace().map(OsString::from).collect();
    args.push(OsString::from("--help"));

    let cmd = to_cmd_vec(&config.tools.gh);
    let result = runner.run(Some(config.get_root()), &cmd, &args)?;
    if result.success() {
        return Ok(true);
    }

    Ok(!matches!(
        classify(&result.diagnostics(), Operation::Probe(subcommand)),
        Classification::UnsupportedSubcommand(_)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        logger::Status,
        testing::{Recorder, ScriptedRunner, config_at},
        utils::exec::CommandResult,
    };
    use tempfile::TempDir;

    #[test]
    fn test_probe_all_supported() {
        let dir = TempDir::new().unwrap();
        let config = config_at(dir.path());
        let runner = ScriptedRunner::new();

        let sink = Recorder::new();

        let caps = probe(&config, &runner, &sink).unwrap();

        assert_eq!(caps, Capabilities::ALL);
        assert!(sink.has(Status::Info, "pages deploy: yes"));
        assert!(caps.missing().is_empty());
        assert!(runner.ran("gh auth --help"));
        assert!(runner.ran("gh repo create --help"));
        assert!(runner.ran("gh pages deploy --help"));
        assert!(runner.ran("gh api --help"));
    }

    #[test]
    fn test_probe_missing_pages() {
        let dir = TempDir::new().unwrap();
        let config = config_at(dir.path());
        let runner = ScriptedRunner::new().on(
            "gh pages",
            CommandResult::failed(1, "unknown command \"pages\" for \"gh\""),
        );

        let caps = probe(&config, &runner, &Recorder::new()).unwrap();

        assert!(!caps.pages_deploy);
        assert!(caps.auth && caps.repo_create && caps.api);
        assert_eq!(caps.missing(), vec!["pages deploy"]);
    }

    #[test]
    fn test_probe_other_failure_counts_as_supported() {
        let dir = TempDir::new().unwrap();
        let config = config_at(dir.path());
        let runner = ScriptedRunner::new()
            .on("gh api", CommandResult::failed(4, "HTTP 401: Bad credentials"));

        assert!(probe(&config, &runner, &Recorder::new()).unwrap().api);
    }

    #[test]
    fn test_display() {
        let caps = Capabilities {
            pages_deploy: false,
            ..Capabilities::ALL
        };
        assert_eq!(
            caps.to_string(),
            "auth: yes, repo create: yes, pages deploy: no, api: yes"
        );
    }
}
