//! The end-to-end publish flows behind the `publish`, `deploy` and `probe`
//! commands.
//!
//! Every step reports through the session's [`Sink`] and asks through its
//! [`Prompter`]; declining a required remediation ends the flow with the
//! matching [`PublishError`].

use crate::{
    config::PublishConfig,
    deploy::{self, DeployOutcome, stage::PLACEHOLDER_INDEX},
    error::PublishError,
    github::{
        pages,
        probe::{self, Capabilities},
        remote::{self, RemoteDescriptor},
    },
    log,
    logger::{Sink, Status},
    prompt::Prompter,
    run,
    utils::{exec::Runner, git::Git},
};
use anyhow::{Context, Result, bail};
use std::fs;

/// Everything a flow talks to.
#[derive(Clone, Copy)]
pub struct Session<'a> {
    pub config: &'a PublishConfig,
    pub runner: &'a dyn Runner,
    pub sink: &'a dyn Sink,
    pub prompter: &'a dyn Prompter,
}

/// How a flow ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Completed,
    /// The user chose not to publish
    Cancelled,
}

// ============================================================================
// Tool Checks
// ============================================================================

/// Platform-specific installation instructions.
fn install_instructions(tool: &str) -> &'static str {
    match tool {
        "gh" if cfg!(target_os = "windows") => {
            "Install with winget: winget install GitHub.cli\nOr download from: https://cli.github.com/"
        }
        "gh" if cfg!(target_os = "macos") => {
            "Install with Homebrew: brew install gh\nOr download from: https://cli.github.com/"
        }
        "gh" if cfg!(target_os = "linux") => {
            "For Debian/Ubuntu: apt install gh\nFor Fedora: dnf install gh\n\
             For other distributions, see: https://cli.github.com/"
        }
        "gh" => "Download from: https://cli.github.com/",
        _ if cfg!(target_os = "windows") => {
            "Install with winget: winget install Git.Git\nOr download from: https://git-scm.com/downloads"
        }
        _ if cfg!(target_os = "macos") => {
            "Install with Homebrew: brew install git\nOr download from: https://git-scm.com/downloads"
        }
        _ => "Install git with your package manager, or download from: https://git-scm.com/downloads",
    }
}

/// Make sure `gh` and `git` can be found.
pub fn check_tools(config: &PublishConfig, sink: &dyn Sink) -> Result<()> {
    for (tool, command) in [("gh", &config.tools.gh), ("git", &config.tools.git)] {
        let program = command.first().map_or(tool, String::as_str);
        match which::which(program) {
            Ok(path) if config.verbose => log!("check"; "{tool}: {}", path.display()),
            Ok(_) => {}
            Err(_) => bail!(PublishError::ToolMissing {
                tool: program.to_owned(),
                instructions: install_instructions(tool).to_owned(),
            }),
        }
    }
    sink.success("GitHub CLI is installed");
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

/// `publish`: the interactive flow.
pub fn publish(session: &Session) -> Result<Flow> {
    let Session { config, sink, .. } = *session;

    report_version(session)?;
    let capabilities = probe::probe(config, session.runner, sink)?;

    ensure_authenticated(session, &capabilities)?;
    ensure_repository(session)?;
    let remote = ensure_remote(session, &capabilities)?;
    ensure_web_files(session)?;
    commit_changes(session)?;

    if session.prompter.confirm("Push changes to remote?", true)? {
        let git = Git::new(config, session.runner, config.get_root());
        git.push_upstream(&git.current_branch()?, sink)?;
        sink.success("Changes pushed to remote");
    }

    let published = pages::is_published(config, &remote, sink);
    let Some(force) = choose_action(session, published)? else {
        sink.info("Publishing cancelled");
        return Ok(Flow::Cancelled);
    };

    finish(session, &capabilities, &remote, force)?;
    Ok(Flow::Completed)
}

/// `deploy`: publish without the interactive checks.
pub fn deploy_only(session: &Session) -> Result<Flow> {
    let Session { config, sink, .. } = *session;
    let capabilities = probe::probe(config, session.runner, sink)?;

    if !config.get_root().join(".git").is_dir() {
        bail!(PublishError::NoRepository(config.get_root().to_path_buf()));
    }
    let remote = remote::detect(config, session.runner)?;
    if !remote.has_remote {
        bail!(PublishError::NoRemote);
    }

    finish(session, &capabilities, &remote, config.deploy.force)?;
    Ok(Flow::Completed)
}

/// `probe`: report capabilities and the detected remote.
pub fn report(session: &Session) -> Result<Flow> {
    let Session { config, runner, sink, .. } = *session;

    report_version(session)?;
    let capabilities = probe::probe(config, runner, sink)?;
    let missing = capabilities.missing();
    if missing.is_empty() {
        sink.success("All required gh subcommands are available");
    } else {
        sink.status(
            Status::Warning,
            "Some gh subcommands are unavailable",
            Some(&missing.join(", ")),
        );
    }

    let remote = remote::detect(config, runner)?;
    match remote.slug() {
        Some(slug) => sink.status(
            Status::Info,
            &format!("Remote: {slug}"),
            Some(&format!(
                "url: {}\npages: {}",
                remote.url,
                remote.pages_url().unwrap_or_default()
            )),
        ),
        None if remote.has_remote => sink.warn("`origin` is not a GitHub repository"),
        None => sink.warn("No remote repository found"),
    }

    Ok(Flow::Completed)
}

// ============================================================================
// Steps
// ============================================================================

/// Report the `gh` version and whether an update is available.
///
/// The update check is skipped on Windows, where `gh` is updated through the
/// package manager.
fn report_version(session: &Session) -> Result<()> {
    let Session { config, runner, sink, .. } = *session;

    let result = run!(runner; &config.tools.gh; "--version")?;
    let Some(version) = result.value().and_then(|v| v.lines().next()) else {
        return Ok(());
    };
    sink.info(&format!("Using {version}"));

    if cfg!(target_os = "windows") {
        return Ok(());
    }
    let update = run!(runner; &config.tools.gh; "update", "--check")?;
    if update.success() && update.stdout.to_lowercase().contains("new version") {
        sink.status(
            Status::Info,
            "A new version of GitHub CLI is available",
            Some("Consider updating with 'gh update'"),
        );
    }
    Ok(())
}

fn ensure_authenticated(session: &Session, capabilities: &Capabilities) -> Result<()> {
    let Session { config, runner, sink, prompter } = *session;

    if !capabilities.auth {
        sink.warn("Installed GitHub CLI lacks `auth`; skipping the authentication check");
        return Ok(());
    }

    if run!(runner; &config.tools.gh; "auth", "status")?.success() {
        sink.success("GitHub CLI is authenticated");
        return Ok(());
    }

    sink.warn("GitHub CLI is not authenticated");
    if !prompter.confirm("Log in to GitHub now?", true)? {
        bail!(PublishError::AuthRequired);
    }

    sink.status(
        Status::Info,
        "GitHub CLI needs authentication",
        Some("You'll be guided through the authentication process."),
    );
    if !run!(tty; runner; &config.tools.gh; "auth", "login")?.success() {
        bail!(PublishError::AuthRequired);
    }

    sink.success("GitHub CLI is authenticated");
    Ok(())
}

fn ensure_repository(session: &Session) -> Result<()> {
    let Session { config, runner, sink, prompter } = *session;
    let root = config.get_root();

    if root.join(".git").is_dir() {
        return Ok(());
    }

    sink.warn("Not a git repository");
    if !prompter.confirm("Initialize git repository?", true)? {
        bail!(PublishError::NoRepository(root.to_path_buf()));
    }

    Git::new(config, runner, root).init()?;
    sink.success("Git repository initialized");
    Ok(())
}

fn ensure_remote(session: &Session, capabilities: &Capabilities) -> Result<RemoteDescriptor> {
    let Session { config, runner, sink, .. } = *session;

    let mut remote = remote::detect(config, runner)?;
    if !remote.has_remote {
        setup_remote(session, capabilities)?;
        remote = remote::detect(config, runner)?;
    }

    if remote.is_github() {
        sink.success(&format!("Connected to remote: {}", remote.url));
    } else {
        sink.status(
            Status::Warning,
            "`origin` is not a GitHub repository",
            Some("The site URL cannot be determined."),
        );
    }
    Ok(remote)
}

fn setup_remote(session: &Session, capabilities: &Capabilities) -> Result<()> {
    let Session { config, runner, sink, prompter } = *session;
    let root = config.get_root();

    sink.status(
        Status::Info,
        "No remote repository found",
        Some("You need to link this project to a GitHub repository."),
    );

    match prompter.select("Choose an option", &["create", "link", "cancel"], 0)? {
        0 => {
            if !capabilities.repo_create {
                bail!(PublishError::SubcommandUnsupported("repo create".into()));
            }
            let default_name = root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
            let name = prompter.input("Enter new repository name", default_name.as_deref())?;
            let description = prompter.input("Enter repository description", Some(""))?;
            let visibility = ["public", "private"]
                [prompter.select("Choose visibility", &["public", "private"], 0)?];

            let described = if description.is_empty() { "" } else { "--description" };
            let result = run!(runner; root; &config.tools.gh;
                "repo", "create", name.as_str(), format!("--{visibility}"),
                described, description.as_str(), "--source=."
            )?;
            if !result.success() {
                bail!(PublishError::failed("gh repo create", result.diagnostics(), None));
            }
            sink.success(&format!("Created repository {name}"));
        }
        1 => {
            let input = prompter.input("Enter the GitHub repository URL", None)?;
            let url = remote::normalize_url(&input);
            Git::new(config, runner, root).add_remote(&url)?;
            sink.success(&format!("Linked remote {url}"));
        }
        _ => bail!(PublishError::NoRemote),
    }
    Ok(())
}

fn ensure_web_files(session: &Session) -> Result<()> {
    let Session { config, sink, prompter, .. } = *session;
    let root = config.get_root();

    if root.join(&config.deploy.manifest).is_file() {
        sink.info(&format!(
            "Found {}; the build output will be deployed",
            config.deploy.manifest
        ));
        return Ok(());
    }
    if root.join("index.html").is_file() {
        return Ok(());
    }
    if let Some(alt) = ["index.md", "README.md"].iter().find(|alt| root.join(alt).is_file()) {
        sink.status(
            Status::Info,
            &format!("Found {alt} instead of index.html"),
            Some("This file will be used as the main page by GitHub Pages."),
        );
        return Ok(());
    }

    sink.status(
        Status::Warning,
        "Missing required web files",
        Some("Missing files: index.html"),
    );
    if !prompter.confirm("Create basic web files?", true)? {
        bail!(PublishError::MissingWebFiles(vec!["index.html".into()]));
    }

    let index = root.join("index.html");
    fs::write(&index, PLACEHOLDER_INDEX)
        .with_context(|| format!("Failed to write {}", index.display()))?;
    sink.success("Basic web files created");
    Ok(())
}

fn commit_changes(session: &Session) -> Result<()> {
    let Session { config, runner, sink, prompter } = *session;
    let git = Git::new(config, runner, config.get_root());

    if !git.is_dirty()? {
        return Ok(());
    }

    sink.info("Uncommitted changes detected");
    if !prompter.confirm("Would you like to commit these changes?", true)? {
        return Ok(());
    }
    let message = prompter.input("Enter commit message", Some("Update web files"))?;

    let identity = [
        ("user.name", "Enter your name for git commits"),
        ("user.email", "Enter your email for git commits"),
    ];
    let mut announced = false;
    for (key, prompt) in identity {
        if git.config_value(key)?.is_some() {
            continue;
        }
        if !announced {
            sink.status(
                Status::Info,
                "Git user configuration is required",
                Some("Git needs to know who you are before committing."),
            );
            announced = true;
        }
        let value = prompter.input(prompt, None)?;
        git.set_config(key, &value)?;
    }

    if git.commit_all(&message)? {
        sink.success("Changes committed successfully");
    }
    Ok(())
}

/// Ask how to proceed given the site state.
///
/// Returns `None` to cancel, otherwise whether to force the deployment.
fn choose_action(session: &Session, published: bool) -> Result<Option<bool>> {
    let Session { sink, prompter, .. } = *session;

    if published {
        sink.info("GitHub Pages already exists for this repository");
        let choice = prompter.select(
            "How would you like to proceed?",
            &["update", "replace", "cancel"],
            0,
        )?;
        return Ok(match choice {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        });
    }

    sink.info("No existing GitHub Pages found");
    Ok(prompter
        .confirm("Publish to GitHub Pages?", true)?
        .then_some(false))
}

/// Deploy, configure the Pages source and point at the site.
fn finish(
    session: &Session,
    capabilities: &Capabilities,
    remote: &RemoteDescriptor,
    force: bool,
) -> Result<DeployOutcome> {
    let Session { config, runner, sink, .. } = *session;

    let outcome = deploy::deploy(config, runner, sink, capabilities, force)?;
    sink.status(
        Status::Success,
        &format!("Deployed with {}", outcome.method),
        Some(&outcome.detail),
    );

    if capabilities.api {
        pages::configure_source(config, runner, sink, &outcome.branch)?;
    } else {
        sink.warn("Installed GitHub CLI lacks `api`; configure the Pages source manually");
    }

    if let Some(url) = remote.pages_url() {
        sink.status(
            Status::Success,
            "Process completed successfully!",
            Some(&format!(
                "Your GitHub Pages site should be available at:\n{url}\n\
                 Note that it may take a few minutes for changes to appear."
            )),
        );
    }
    Ok(outcome)
}
