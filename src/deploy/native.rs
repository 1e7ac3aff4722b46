//! `gh pages deploy`.

use crate::{
    config::PublishConfig,
    error::PublishError,
    github::classify::{Classification, Operation, classify},
    run,
    utils::exec::Runner,
};
use anyhow::Result;

#[derive(Debug)]
pub enum NativeOutcome {
    /// Deployed; carries the command's stdout
    Deployed(String),
    /// The installed `gh` does not know the named subcommand
    Unsupported(String),
    Failed(PublishError),
}

/// Attempt `gh pages deploy --branch <source_branch> [--force]`.
pub fn deploy(
    config: &PublishConfig,
    runner: &dyn Runner,
    source_branch: &str,
    force: bool,
) -> Result<NativeOutcome> {
    let force = if force { "--force" } else { "" };
    let result = run!(runner; config.get_root(); &config.tools.gh;
        "pages", "deploy", "--branch", source_branch, force
    )?;

    if result.success() {
        return Ok(NativeOutcome::Deployed(result.stdout));
    }

    let diagnostics = result.diagnostics();
    Ok(match classify(&diagnostics, Operation::PagesDeploy) {
        Classification::UnsupportedSubcommand(name) => NativeOutcome::Unsupported(name),
        Classification::KnownRecoverable(hint) => NativeOutcome::Failed(PublishError::failed(
            "gh pages deploy",
            diagnostics,
            Some(hint),
        )),
        Classification::UnknownFailure => {
            NativeOutcome::Failed(PublishError::failed("gh pages deploy", diagnostics, None))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        github::classify::Hint,
        testing::{ScriptedRunner, config_at},
        utils::exec::CommandResult,
    };
    use tempfile::TempDir;

    #[test]
    fn test_deployed() {
        let dir = TempDir::new().unwrap();
        let config = config_at(dir.path());
        let runner = ScriptedRunner::new()
            .on("gh pages deploy", CommandResult::ok("Deployed to https://alice.github.io/site"));

        let outcome = deploy(&config, &runner, "main", false).unwrap();

        assert!(matches!(outcome, NativeOutcome::Deployed(ref out) if out.contains("Deployed")));
        let call = runner.find("gh pages deploy").unwrap();
        assert_eq!(call.line, "gh pages deploy --branch main");
        assert_eq!(call.root.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_force_flag() {
        let dir = TempDir::new().unwrap();
        let config = config_at(dir.path());
        let runner = ScriptedRunner::new();

        deploy(&config, &runner, "main", true).unwrap();
        assert!(runner.ran("gh pages deploy --branch main --force"));
    }

    #[test]
    fn test_unknown_pages_command_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let config = config_at(dir.path());
        let runner = ScriptedRunner::new().on(
            "gh pages deploy",
            CommandResult::failed(1, "unknown command \"pages\" for \"gh\""),
        );

        let outcome = deploy(&config, &runner, "main", false).unwrap();
        assert!(matches!(outcome, NativeOutcome::Unsupported(ref name) if name == "pages"));
    }

    #[test]
    fn test_failure_with_hint() {
        let dir = TempDir::new().unwrap();
        let config = config_at(dir.path());
        let runner = ScriptedRunner::new().on(
            "gh pages deploy",
            CommandResult::failed(1, "error: failed to push some refs"),
        );

        match deploy(&config, &runner, "main", false).unwrap() {
            NativeOutcome::Failed(PublishError::GitOperationFailed { hint, .. }) => {
                assert_eq!(hint, Some(Hint::PullThenRetry));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_generic_failure() {
        let dir = TempDir::new().unwrap();
        let config = config_at(dir.path());
        let runner = ScriptedRunner::new()
            .on("gh pages deploy", CommandResult::failed(1, "HTTP 502"));

        match deploy(&config, &runner, "main", false).unwrap() {
            NativeOutcome::Failed(PublishError::GitOperationFailed { hint, stderr, .. }) => {
                assert_eq!(hint, None);
                assert_eq!(stderr, "HTTP 502");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
