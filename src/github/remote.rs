//! Remote repository detection.

use crate::{config::PublishConfig, run, utils::exec::Runner};
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

/// What `git remote -v` says about the `origin` remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteDescriptor {
    /// Any remote is configured
    pub has_remote: bool,
    /// URL of `origin` when it points at GitHub
    pub url: String,
    pub owner: String,
    pub repo: String,
}

impl RemoteDescriptor {
    /// Parse the output of `git remote -v`.
    pub fn parse(remote_output: &str) -> Self {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(
                r"(?m)^origin\s+((?:https://(?:[^@/\s]+@)?github\.com/|git@github\.com:|ssh://git@github\.com/)([^/\s]+)/([^/\s]+?)(?:\.git)?/?)\s",
            )
            .unwrap()
        });

        let has_remote = !remote_output.trim().is_empty();
        // `git remote -v` ends lines with "(fetch)"/"(push)"; append whitespace
        // so a bare URL line still terminates the match.
        let text = format!("{remote_output}\n");

        match re.captures(&text) {
            Some(caps) => Self {
                has_remote,
                url: caps[1].to_owned(),
                owner: caps[2].to_owned(),
                repo: caps[3].to_owned(),
            },
            None => Self {
                has_remote,
                ..Self::default()
            },
        }
    }

    /// Whether owner and repository were recognized.
    pub fn is_github(&self) -> bool {
        !self.owner.is_empty() && !self.repo.is_empty()
    }

    /// Address the site is served from.
    ///
    /// A repository named `<owner>.github.io` is a user site served at the
    /// root; every other repository is served under its name.
    pub fn pages_url(&self) -> Option<String> {
        if !self.is_github() {
            return None;
        }
        let host = format!("{}.github.io", self.owner.to_lowercase());
        if self.repo.eq_ignore_ascii_case(&host) {
            Some(format!("https://{host}/"))
        } else {
            Some(format!("https://{host}/{}", self.repo))
        }
    }

    /// `owner/repo`, as accepted by `gh --repo`.
    pub fn slug(&self) -> Option<String> {
        self.is_github()
            .then(|| format!("{}/{}", self.owner, self.repo))
    }
}

/// Read the remote descriptor of the project repository.
pub fn detect(config: &PublishConfig, runner: &dyn Runner) -> Result<RemoteDescriptor> {
    let result = run!(runner; config.get_root(); &config.tools.git; "remote", "-v")?;
    if !result.success() {
        return Ok(RemoteDescriptor::default());
    }
    Ok(RemoteDescriptor::parse(&result.stdout))
}

/// Turn user input into a clonable GitHub URL.
///
/// Accepts full URLs, browser URLs without `.git`, `github.com/owner/repo`
/// and `owner/repo`.
pub fn normalize_url(input: &str) -> String {
    let input = input.trim().trim_end_matches('/');

    if input.starts_with("git@") || input.starts_with("ssh://") {
        return input.to_owned();
    }

    let mut url = if input.contains("://") {
        input.to_owned()
    } else if input.starts_with("github.com/") {
        format!("https://{input}")
    } else {
        format!("https://github.com/{input}")
    };

    if url.contains("github.com") && !url.ends_with(".git") {
        url.push_str(".git");
    }
    url
}
