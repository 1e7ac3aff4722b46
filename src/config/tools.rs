//! `[tools]` and `[network]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `[tools]` section - how to invoke the external CLIs.
///
/// # Example
/// ```toml
/// [tools]
/// git = ["git"]
/// gh = ["~/.local/bin/gh"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Git command (program followed by fixed leading arguments).
    #[serde(default = "defaults::tools::git")]
    #[educe(Default = defaults::tools::git())]
    pub git: Vec<String>,

    /// GitHub CLI command.
    #[serde(default = "defaults::tools::gh")]
    #[educe(Default = defaults::tools::gh())]
    pub gh: Vec<String>,
}

/// `[network]` section - reachability probe and HTTP check limits.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    #[serde(default = "defaults::network::probe_host")]
    #[educe(Default = defaults::network::probe_host())]
    pub probe_host: String,

    #[serde(default = "defaults::network::probe_port")]
    #[educe(Default = defaults::network::probe_port())]
    pub probe_port: u16,

    /// Seconds allowed for the reachability probe and the HEAD request.
    #[serde(default = "defaults::network::timeout")]
    #[educe(Default = defaults::network::timeout())]
    pub timeout: u64,
}

impl NetworkConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
