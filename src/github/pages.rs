//! GitHub Pages site state: existence check and source configuration.

use super::{
    classify::{Classification, Hint, Operation, classify},
    remote::RemoteDescriptor,
};
use crate::{
    config::{NetworkConfig, PublishConfig},
    error::PublishError,
    logger::{Sink, Status},
    run,
    utils::exec::Runner,
};
use anyhow::Result;
use serde::Deserialize;
use std::{
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

/// What a HEAD request says about the site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteStatus {
    Published,
    NotPublished,
    /// Neither 2xx nor 404; treated as not published
    Inconclusive(String),
}

impl SiteStatus {
    pub fn from_status_code(code: u16) -> Self {
        match code {
            200..=299 => Self::Published,
            404 => Self::NotPublished,
            _ => Self::Inconclusive(format!("HTTP {code}")),
        }
    }
}

/// Check the reachability probe target accepts TCP connections.
pub fn check_network(network: &NetworkConfig) -> Result<(), PublishError> {
    let target = (network.probe_host.as_str(), network.probe_port);
    let addrs = target
        .to_socket_addrs()
        .map_err(|err| PublishError::NetworkUnavailable(format!("{}: {err}", network.probe_host)))?;

    let mut last_error = format!("{} did not resolve", network.probe_host);
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, network.timeout()) {
            Ok(_) => return Ok(()),
            Err(err) => last_error = format!("{addr}: {err}"),
        }
    }
    Err(PublishError::NetworkUnavailable(last_error))
}

/// HEAD the site URL.
pub fn site_status(url: &str, timeout: Duration) -> SiteStatus {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build();

    match client.and_then(|client| client.head(url).send()) {
        Ok(response) => SiteStatus::from_status_code(response.status().as_u16()),
        Err(err) => SiteStatus::Inconclusive(err.to_string()),
    }
}

/// Whether a site is already published for the remote.
///
/// Network trouble degrades to "not published" with a warning.
pub fn is_published(config: &PublishConfig, remote: &RemoteDescriptor, sink: &dyn Sink) -> bool {
    let Some(url) = remote.pages_url() else {
        return false;
    };

    sink.info(&format!("Checking for existing GitHub Pages at {url}"));

    if let Err(err) = check_network(&config.network) {
        sink.status(
            Status::Warning,
            "Unable to check for existing GitHub Pages",
            Some(&format!("No internet connection detected ({err})")),
        );
        return false;
    }

    match site_status(&url, config.network.timeout()) {
        SiteStatus::Published => true,
        SiteStatus::NotPublished => false,
        SiteStatus::Inconclusive(reason) => {
            sink.status(
                Status::Warning,
                "Unable to check GitHub Pages status",
                Some(&reason),
            );
            false
        }
    }
}

// ============================================================================
// Pages Source Configuration
// ============================================================================

/// Subset of `GET /repos/{owner}/{repo}/pages`.
#[derive(Debug, Clone, Deserialize)]
pub struct PagesInfo {
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub source: Option<PagesSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagesSource {
    pub branch: String,
    #[serde(default)]
    pub path: String,
}

/// Make sure Pages serves from `branch`, enabling it when needed.
///
/// Returns whether Pages ends up configured. Failures only warn.
pub fn configure_source(
    config: &PublishConfig,
    runner: &dyn Runner,
    sink: &dyn Sink,
    branch: &str,
) -> Result<bool> {
    let root = config.get_root();
    let current = run!(runner; root; &config.tools.gh; "api", "repos/:owner/:repo/pages")?;

    if current.success() {
        if let Ok(info) = serde_json::from_str::<PagesInfo>(&current.stdout) {
            match info.source {
                Some(source) if source.branch != branch => sink.status(
                    Status::Warning,
                    &format!("GitHub Pages serves from `{}`, not `{branch}`", source.branch),
                    Some("Change the source in the repository's Pages settings."),
                ),
                _ => {
                    if let Some(url) = info.html_url {
                        sink.info(&format!("GitHub Pages is enabled at {url}"));
                    }
                }
            }
        }
        return Ok(true);
    }

    sink.status(
        Status::Info,
        "Configuring GitHub Pages in repository settings",
        Some(&format!("Setting source to branch: {branch}")),
    );

    let created = run!(runner; root; &config.tools.gh;
        "api", "--method", "POST", "repos/:owner/:repo/pages",
        "-f", format!("source[branch]={branch}"),
        "-f", "source[path]=/"
    )?;

    let already = classify(&created.diagnostics(), Operation::PagesConfigure)
        == Classification::KnownRecoverable(Hint::PagesAlreadyConfigured);
    if created.success() || already {
        return Ok(true);
    }

    sink.status(
        Status::Warning,
        "Failed to configure GitHub Pages",
        Some("You may need to configure it manually in repository settings."),
    );
    Ok(false)
}
