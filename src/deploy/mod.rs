//! Site deployment.
//!
//! Tries `gh pages deploy` first and falls back to a manual git deployment
//! when the installed `gh` does not support it.

pub mod fallback;
pub mod native;
pub mod stage;
pub mod workspace;

use crate::{
    config::PublishConfig,
    github::probe::Capabilities,
    logger::{Sink, Status},
    utils::{exec::Runner, git::Git},
};
use anyhow::Result;
use native::NativeOutcome;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Native,
    Manual,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Native => "gh pages deploy",
            Self::Manual => "manual git deployment",
        })
    }
}

#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub method: Method,
    /// Branch the site was published to
    pub branch: String,
    pub detail: String,
}

/// Deploy the project to GitHub Pages.
///
/// `force` overwrites the published site on the native path; the manual
/// path always replaces the branch contents with the staged site.
pub fn deploy(
    config: &PublishConfig,
    runner: &dyn Runner,
    sink: &dyn Sink,
    capabilities: &Capabilities,
    force: bool,
) -> Result<DeployOutcome> {
    if !config.deploy.native {
        sink.info("Native deployment disabled; deploying manually");
    } else if !capabilities.pages_deploy {
        sink.info("Installed GitHub CLI lacks `pages deploy`; deploying manually");
    } else {
        let source_branch = Git::new(config, runner, config.get_root()).current_branch()?;
        sink.info("Publishing with `gh pages deploy`");

        match native::deploy(config, runner, &source_branch, force || config.deploy.force)? {
            NativeOutcome::Deployed(stdout) => {
                return Ok(DeployOutcome {
                    method: Method::Native,
                    branch: source_branch,
                    detail: stdout,
                });
            }
            NativeOutcome::Unsupported(name) => sink.status(
                Status::Warning,
                &format!("`gh {name}` is not supported by the installed GitHub CLI"),
                Some("Falling back to manual deployment through git."),
            ),
            NativeOutcome::Failed(err) => return Err(err.into()),
        }
    }

    let report = fallback::deploy(config, runner, sink)?;
    let branch = &config.deploy.branch;
    let detail = match (report.committed, report.branch_created) {
        (false, _) => format!("`{branch}` already matches the site"),
        (true, true) => format!("created `{branch}` with {} files", report.staged),
        (true, false) => format!("updated `{branch}` with {} files", report.staged),
    };

    Ok(DeployOutcome {
        method: Method::Manual,
        branch: branch.clone(),
        detail,
    })
}
