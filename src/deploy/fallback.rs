//! Manual deployment through a git workspace.
//!
//! Used when `gh` cannot deploy by itself. The Pages branch is cloned (or
//! created) in a temporary workspace, the site is staged and committed there,
//! and the commit is pushed back to `origin`.
//!
//! ```text
//! Init -> CloneOrInit -> StageFiles -> SynthesizeIndex -> Commit -> Push -> Cleanup
//! ```
//!
//! Cleanup always runs: the working directory is restored and the workspace
//! removed whether the stages succeed, fail or panic.

use super::{
    stage::{IndexSource, stage_files, synthesize_index},
    workspace::{DirGuard, Workspace},
};
use crate::{
    config::PublishConfig,
    error::PublishError,
    logger::{Sink, Status},
    utils::{exec::Runner, fs::clear_dir_except, git::Git},
};
use anyhow::Result;
use std::{fmt, path::Path};

/// Git identity keys copied into the workspace.
const IDENTITY_KEYS: &[&str] = &["user.name", "user.email"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    CloneOrInit,
    StageFiles,
    SynthesizeIndex,
    Commit,
    Push,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "init",
            Self::CloneOrInit => "clone",
            Self::StageFiles => "stage",
            Self::SynthesizeIndex => "index",
            Self::Commit => "commit",
            Self::Push => "push",
            Self::Cleanup => "cleanup",
        })
    }
}

#[derive(Debug, Clone)]
pub struct FallbackReport {
    /// The Pages branch did not exist on the remote before
    pub branch_created: bool,
    /// A new commit was made (false when the site was unchanged)
    pub committed: bool,
    pub staged: usize,
    pub index: IndexSource,
}

/// Deploy the project to the configured Pages branch by hand.
pub fn deploy(config: &PublishConfig, runner: &dyn Runner, sink: &dyn Sink) -> Result<FallbackReport> {
    let source = Git::new(config, runner, config.get_root());
    let source_branch = source.current_branch()?;

    let workspace = Workspace::create()?;
    sink.info(&format!(
        "Deploying `{source_branch}` to `{}` through {}",
        config.deploy.branch,
        workspace.path().display()
    ));
    let guard = DirGuard::enter(workspace.path())?;

    let mut stage = Stage::Init;
    let result = run_stages(config, runner, sink, workspace.path(), &mut stage);

    // leave the directory before removing it
    if let Err(err) = guard.leave() {
        sink.status(
            Status::Warning,
            "Could not restore the working directory",
            Some(&format!("{err:#}")),
        );
    }
    if let Err(err) = workspace.close() {
        sink.status(
            Status::Warning,
            "Could not remove the deploy workspace",
            Some(&format!("{err:#}")),
        );
    }

    if result.is_err() {
        sink.warn(&format!("Manual deployment aborted at the {stage} stage"));
    }
    result
}

fn run_stages(
    config: &PublishConfig,
    runner: &dyn Runner,
    sink: &dyn Sink,
    workspace: &Path,
    stage: &mut Stage,
) -> Result<FallbackReport> {
    let branch = config.deploy.branch.as_str();
    let source = Git::new(config, runner, config.get_root());
    let target = Git::new(config, runner, workspace);

    *stage = Stage::CloneOrInit;
    let origin = source.origin_url()?.ok_or(PublishError::NoRemote)?;
    let exists = source.remote_has_branch(branch)?;
    let cloned = exists && target.clone_branch(&origin, branch)?;

    if !cloned {
        if exists {
            sink.warn(&format!("Could not clone `{branch}`; starting it from scratch"));
        }
        clear_dir_except(workspace, &[])?;
        target.init()?;
        target.set_head(branch)?;
        target.add_remote(&origin)?;
    }
    let branch_created = !cloned;

    *stage = Stage::StageFiles;
    let staged = stage_files(config, sink, workspace)?;

    *stage = Stage::SynthesizeIndex;
    let index = synthesize_index(config, workspace)?;
    match index {
        IndexSource::Readme => sink.info("Generated index.html from README.md"),
        IndexSource::Placeholder => sink.info("Generated a placeholder index.html"),
        IndexSource::Existing => {}
    }

    *stage = Stage::Commit;
    for key in IDENTITY_KEYS {
        if let Some(value) = source.config_value(key)? {
            target.set_config(key, &value)?;
        }
    }
    let committed = target.commit_all(&config.deploy.message)?;

    *stage = Stage::Push;
    if committed {
        target.push_head(branch, branch_created)?;
    } else {
        sink.info(&format!("`{branch}` is already up to date"));
    }

    *stage = Stage::Cleanup;
    Ok(FallbackReport {
        branch_created,
        committed,
        staged: staged.files.len(),
        index,
    })
}
