//! `[deploy]` section configuration.
//!
//! Controls the target branch, the commit made by the manual fallback, and
//! which files are staged into the deploy workspace.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[deploy]` section in gh-publish.toml.
///
/// # Example
/// ```toml
/// [deploy]
/// branch = "gh-pages"
/// native = true
/// build_dirs = ["dist", "build"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct DeployConfig {
    /// Branch GitHub Pages serves from.
    #[serde(default = "defaults::deploy::branch")]
    #[educe(Default = defaults::deploy::branch())]
    pub branch: String,

    /// Commit message used by the manual fallback.
    #[serde(default = "defaults::deploy::message")]
    #[educe(Default = defaults::deploy::message())]
    pub message: String,

    /// Try `gh pages deploy` before falling back to the manual path.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = defaults::r#true())]
    pub native: bool,

    /// Overwrite the published site (`--force` on the native path).
    #[serde(default = "defaults::r#false")]
    #[educe(Default = defaults::r#false())]
    pub force: bool,

    /// Package manifest marking a project with a build step.
    #[serde(default = "defaults::deploy::manifest")]
    #[educe(Default = defaults::deploy::manifest())]
    pub manifest: String,

    /// Build output directories, searched in order.
    #[serde(default = "defaults::deploy::build_dirs")]
    #[educe(Default = defaults::deploy::build_dirs())]
    pub build_dirs: Vec<String>,

    /// Extensions of root-level files copied when there is no build output.
    #[serde(default = "defaults::deploy::asset_extensions")]
    #[educe(Default = defaults::deploy::asset_extensions())]
    pub asset_extensions: Vec<String>,

    /// Directories copied recursively when there is no build output.
    #[serde(default = "defaults::deploy::asset_dirs")]
    #[educe(Default = defaults::deploy::asset_dirs())]
    pub asset_dirs: Vec<String>,

    /// Root-level files always carried over when present (e.g. `CNAME`).
    #[serde(default = "defaults::deploy::extra_files")]
    #[educe(Default = defaults::deploy::extra_files())]
    pub extra_files: Vec<String>,
}

impl DeployConfig {
    /// Whether `name` has one of the allow-listed web extensions.
    pub fn is_web_asset(&self, name: &str) -> bool {
        name.rsplit_once('.').is_some_and(|(stem, ext)| {
            !stem.is_empty()
                && self
                    .asset_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
    }
}
