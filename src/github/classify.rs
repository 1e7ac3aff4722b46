//! Error-text classification for `gh` and `git` output.
//!
//! The external tools only report failures as prose, so this module is the
//! one place that knows their wording. Matching is case-insensitive and
//! ignores ANSI color codes. If upstream wording changes, a failure degrades
//! to [`Classification::UnknownFailure`] rather than being misreported.

use crate::utils::exec::strip_ansi;
use regex::Regex;
use std::{fmt, sync::OnceLock};

/// `gh` subcommand words the probe and the publish paths ask about.
pub const KNOWN_SUBCOMMANDS: &[&str] = &["auth", "repo", "create", "pages", "deploy", "api"];

/// Operation whose output is being classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation<'a> {
    /// `gh <subcommand> --help` during the capability probe
    Probe(&'a str),
    /// `gh pages deploy`
    PagesDeploy,
    /// `gh api repos/:owner/:repo/pages`
    PagesConfigure,
    /// `git push`
    Push,
    /// `git commit`
    Commit,
}

impl Operation<'_> {
    /// The subcommand this operation would name in an "unknown command" error.
    const fn subcommand(self) -> Option<&'static str> {
        match self {
            Self::Probe(_) | Self::Push | Self::Commit => None,
            Self::PagesDeploy => Some("pages"),
            Self::PagesConfigure => Some("api"),
        }
    }
}

/// Known recoverable situations and their remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    /// The Pages branch could not be checked out
    OrphanBranch,
    /// The remote has commits the local branch lacks
    PullThenRetry,
    /// Pages is already enabled for the repository
    PagesAlreadyConfigured,
    /// The branch has no counterpart on the remote yet
    RemoteRefMissing,
    /// The working tree matches the last commit
    NothingToCommit,
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrphanBranch => f.write_str(
                "Try creating an empty gh-pages branch first:\n\
                 git checkout --orphan gh-pages\n\
                 git reset --hard\n\
                 git commit --allow-empty -m 'Initial gh-pages commit'\n\
                 git push origin gh-pages\n\
                 git checkout main  # or your original branch",
            ),
            Self::PullThenRetry => f.write_str(
                "Try pulling latest changes first:\n\
                 git pull origin main  # or your branch name",
            ),
            Self::PagesAlreadyConfigured => {
                f.write_str("GitHub Pages is already configured for this repository.")
            }
            Self::RemoteRefMissing => f.write_str(
                "The branch does not exist on the remote yet; push it with --set-upstream.",
            ),
            Self::NothingToCommit => f.write_str("Nothing changed since the last deployment."),
        }
    }
}

/// Outcome of classifying a failure's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The tool does not know the named subcommand
    UnsupportedSubcommand(String),
    /// A known failure with a remediation
    KnownRecoverable(Hint),
    UnknownFailure,
}

/// Catalogue of recoverable phrasings, checked in order.
const CATALOGUE: &[(&str, Hint)] = &[
    (r"git checkout gh-pages", Hint::OrphanBranch),
    (r"failed to push", Hint::PullThenRetry),
    (r"already exists?", Hint::PagesAlreadyConfigured),
    (r"remote ref does not exist|has no upstream branch", Hint::RemoteRefMissing),
    (r"nothing to commit", Hint::NothingToCommit),
];

fn unknown_command_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)unknown (?:sub)?command\s*["'`]?([\w-]+)?"#).unwrap())
}

fn catalogue() -> &'static [(Regex, Hint)] {
    static RES: OnceLock<Vec<(Regex, Hint)>> = OnceLock::new();
    RES.get_or_init(|| {
        CATALOGUE
            .iter()
            .map(|(pattern, hint)| (Regex::new(&format!("(?i){pattern}")).unwrap(), *hint))
            .collect()
    })
}

/// Classify the diagnostic text of a failed operation.
pub fn classify(text: &str, operation: Operation<'_>) -> Classification {
    let text = strip_ansi(text);

    if let Some(name) = unsupported_subcommand(&text, operation) {
        return Classification::UnsupportedSubcommand(name);
    }

    catalogue()
        .iter()
        .filter(|(_, hint)| applies(*hint, operation))
        .find(|(re, _)| re.is_match(&text))
        .map_or(Classification::UnknownFailure, |(_, hint)| {
            Classification::KnownRecoverable(*hint)
        })
}

/// Whether `text` reports an unknown command naming a known subcommand.
///
/// The named word is taken from the quoted token after "unknown command";
/// otherwise any known subcommand word in the text (preferring the probed
/// one) is used.
fn unsupported_subcommand(text: &str, operation: Operation<'_>) -> Option<String> {
    let captures = unknown_command_re().captures(text)?;
    let lower = text.to_lowercase();

    if let Some(named) = captures.get(1).map(|m| m.as_str().to_lowercase())
        && KNOWN_SUBCOMMANDS.contains(&named.as_str())
    {
        return Some(named);
    }

    let probed = match operation {
        Operation::Probe(name) => Some(name),
        _ => operation.subcommand(),
    };

    probed
        .into_iter()
        .flat_map(str::split_whitespace)
        .chain(KNOWN_SUBCOMMANDS.iter().copied())
        .find(|word| contains_word(&lower, word))
        .map(str::to_owned)
}

/// Whole-word containment check.
fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + word.len()..].chars().next();
        !before.is_some_and(|c| c.is_alphanumeric() || c == '-')
            && !after.is_some_and(|c| c.is_alphanumeric() || c == '-')
    })
}

/// Restrict hints to the operations where their wording is meaningful.
const fn applies(hint: Hint, operation: Operation<'_>) -> bool {
    match hint {
        Hint::OrphanBranch => matches!(operation, Operation::PagesDeploy),
        Hint::PullThenRetry => matches!(operation, Operation::PagesDeploy | Operation::Push),
        Hint::PagesAlreadyConfigured => matches!(operation, Operation::PagesConfigure),
        Hint::RemoteRefMissing => matches!(operation, Operation::Push),
        Hint::NothingToCommit => matches!(operation, Operation::Commit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_pages_command() {
        let stderr = "unknown command \"pages\" for \"gh\"\n\nDid you mean this?\n\tgpg-key";
        assert_eq!(
            classify(stderr, Operation::PagesDeploy),
            Classification::UnsupportedSubcommand("pages".into())
        );
    }

    #[test]
    fn test_unknown_command_with_any_known_name_is_unsupported() {
        let operations = [
            Operation::Probe("auth"),
            Operation::Probe("repo create"),
            Operation::PagesDeploy,
            Operation::PagesConfigure,
            Operation::Push,
            Operation::Commit,
        ];
        for name in KNOWN_SUBCOMMANDS {
            for phrasing in [
                format!("unknown command \"{name}\" for \"gh\""),
                format!("Error: UNKNOWN COMMAND '{name}'"),
                format!("gh: unknown command {name}"),
                format!("unknown command for gh: the {name} subcommand is missing"),
            ] {
                for operation in operations {
                    assert!(
                        matches!(
                            classify(&phrasing, operation),
                            Classification::UnsupportedSubcommand(_)
                        ),
                        "`{phrasing}` under {operation:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_probe_reports_probed_subcommand() {
        let stderr = "unknown command \"create\" for \"gh repo\"";
        assert_eq!(
            classify(stderr, Operation::Probe("repo create")),
            Classification::UnsupportedSubcommand("create".into())
        );
    }

    #[test]
    fn test_unknown_command_for_other_word_is_not_unsupported() {
        let stderr = "unknown command \"frobnicate\" for \"gh\"";
        assert_eq!(classify(stderr, Operation::Push), Classification::UnknownFailure);
    }

    #[test]
    fn test_ansi_is_ignored() {
        let stderr = "\x1b[31munknown command\x1b[0m \"pages\" for \"gh\"";
        assert_eq!(
            classify(stderr, Operation::PagesDeploy),
            Classification::UnsupportedSubcommand("pages".into())
        );
    }

    #[test]
    fn test_deploy_hints() {
        assert_eq!(
            classify(
                "error: pathspec did not match; run git checkout gh-pages",
                Operation::PagesDeploy
            ),
            Classification::KnownRecoverable(Hint::OrphanBranch)
        );
        assert_eq!(
            classify("error: Failed to push some refs", Operation::PagesDeploy),
            Classification::KnownRecoverable(Hint::PullThenRetry)
        );
        assert_eq!(
            classify("HTTP 500: server error", Operation::PagesDeploy),
            Classification::UnknownFailure
        );
    }

    #[test]
    fn test_push_hints() {
        assert_eq!(
            classify("error: src refspec main does not match any\nremote ref does not exist", Operation::Push),
            Classification::KnownRecoverable(Hint::RemoteRefMissing)
        );
        assert_eq!(
            classify(
                "fatal: The current branch main has no upstream branch.",
                Operation::Push
            ),
            Classification::KnownRecoverable(Hint::RemoteRefMissing)
        );
    }

    #[test]
    fn test_hints_scoped_to_operation() {
        // "already exists" only means something to the Pages API
        assert_eq!(
            classify("remote origin already exists.", Operation::Push),
            Classification::UnknownFailure
        );
        assert_eq!(
            classify("GitHub Pages already exists for this repository", Operation::PagesConfigure),
            Classification::KnownRecoverable(Hint::PagesAlreadyConfigured)
        );
        assert_eq!(
            classify("On branch gh-pages\nnothing to commit, working tree clean", Operation::Commit),
            Classification::KnownRecoverable(Hint::NothingToCommit)
        );
    }

    #[test]
    fn test_contains_word() {
        assert!(contains_word("unknown command api", "api"));
        assert!(!contains_word("unknown command rapid", "api"));
        assert!(!contains_word("gh-pages-deploy", "pages"));
        assert!(contains_word("\"pages\"", "pages"));
    }

    #[test]
    fn test_hint_text() {
        assert!(Hint::OrphanBranch.to_string().contains("git checkout --orphan gh-pages"));
        assert!(Hint::PullThenRetry.to_string().contains("git pull origin"));
    }
}
