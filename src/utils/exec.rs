//! External command execution utilities.
//!
//! Every `git` and `gh` invocation goes through a [`Runner`], which captures
//! exit code, stdout and stderr into a [`CommandResult`] without treating a
//! non-zero exit as an error: callers decide what a failure means.

use crate::log;
use anyhow::{Context, Result};
use regex::Regex;
use std::{
    borrow::Cow,
    ffi::OsString,
    io::ErrorKind,
    path::Path,
    process::{Command, ExitStatus, Output, Stdio},
    sync::OnceLock,
};

/// Exit code reported when the program could not be found.
pub const NOT_FOUND_EXIT_CODE: i32 = 127;

// ============================================================================
// Macros
// ============================================================================

/// Run an external command through a [`Runner`].
///
/// Prefix with `tty;` to hand the terminal to the child (for interactive
/// commands such as `gh auth login`).
///
/// # Examples
/// ```ignore
/// // Without working directory
/// run!(runner; &config.tools.gh; "auth", "status")?;
///
/// // With working directory
/// run!(runner; root; &config.tools.git; "remote", "-v")?;
///
/// // Interactive
/// run!(tty; runner; &config.tools.gh; "auth", "login")?;
/// ```
#[macro_export]
macro_rules! run {
    (tty; $runner:expr; $cmd:expr; $($arg:expr),* $(,)?) => {
        $runner.run_interactive(
            None,
            &$crate::utils::exec::internal::to_cmd_vec($cmd),
            &$crate::utils::exec::internal::filter_args(&[$($crate::utils::exec::internal::to_os($arg)),*]),
        )
    };
    (tty; $runner:expr; $root:expr; $cmd:expr; $($arg:expr),* $(,)?) => {
        $runner.run_interactive(
            Some($root),
            &$crate::utils::exec::internal::to_cmd_vec($cmd),
            &$crate::utils::exec::internal::filter_args(&[$($crate::utils::exec::internal::to_os($arg)),*]),
        )
    };
    ($runner:expr; $cmd:expr; $($arg:expr),* $(,)?) => {
        $runner.run(
            None,
            &$crate::utils::exec::internal::to_cmd_vec($cmd),
            &$crate::utils::exec::internal::filter_args(&[$($crate::utils::exec::internal::to_os($arg)),*]),
        )
    };
    ($runner:expr; $root:expr; $cmd:expr; $($arg:expr),* $(,)?) => {
        $runner.run(
            Some($root),
            &$crate::utils::exec::internal::to_cmd_vec($cmd),
            &$crate::utils::exec::internal::filter_args(&[$($crate::utils::exec::internal::to_os($arg)),*]),
        )
    };
}

// ============================================================================
// Argument Conversion
// ============================================================================

#[doc(hidden)]
pub mod internal {
    use std::ffi::OsString;

    /// Convert to `OsString`.
    #[inline]
    pub fn to_os<S: Into<OsString>>(s: S) -> OsString {
        s.into()
    }

    /// Trait for converting to command vector.
    pub trait ToCmd {
        fn to_cmd(self) -> Vec<OsString>;
    }

    impl<const N: usize> ToCmd for [&str; N] {
        #[inline]
        fn to_cmd(self) -> Vec<OsString> {
            self.into_iter().map(OsString::from).collect()
        }
    }

    impl ToCmd for &[String] {
        #[inline]
        fn to_cmd(self) -> Vec<OsString> {
            self.iter().map(OsString::from).collect()
        }
    }

    impl ToCmd for &Vec<String> {
        #[inline]
        fn to_cmd(self) -> Vec<OsString> {
            self.iter().map(OsString::from).collect()
        }
    }

    /// Convert command to `Vec<OsString>`.
    #[inline]
    pub fn to_cmd_vec<C: ToCmd>(cmd: C) -> Vec<OsString> {
        cmd.to_cmd()
    }

    /// Filter out empty args.
    #[inline]
    pub fn filter_args(args: &[OsString]) -> Vec<OsString> {
        args.iter().filter(|a| !a.is_empty()).cloned().collect()
    }
}

// ============================================================================
// Command Result
// ============================================================================

/// Captured outcome of one external process invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    /// A successful run with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and stderr.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Result for a program that is not installed.
    pub fn not_found(name: &str) -> Self {
        Self::failed(NOT_FOUND_EXIT_CODE, format!("command not found: {name}"))
    }

    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout if non-empty, for commands that answer with a single value.
    pub fn value(&self) -> Option<&str> {
        Some(self.stdout.trim()).filter(|s| self.success() && !s.is_empty())
    }

    /// Stderr and stdout joined, for error classification.
    ///
    /// Some tools print failures on stdout (`git commit` reports
    /// "nothing to commit" there).
    pub fn diagnostics(&self) -> String {
        match (self.stderr.is_empty(), self.stdout.is_empty()) {
            (false, false) => format!("{}\n{}", self.stderr, self.stdout),
            (false, true) => self.stderr.clone(),
            _ => self.stdout.clone(),
        }
    }

    fn from_parts(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            exit_code: status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(stdout).trim().to_owned(),
            stderr: String::from_utf8_lossy(stderr).trim().to_owned(),
        }
    }
}

impl From<&Output> for CommandResult {
    fn from(output: &Output) -> Self {
        Self::from_parts(output.status, &output.stdout, &output.stderr)
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Executes external commands.
///
/// The publish flows take a `&dyn Runner` so they can be driven by scripted
/// results in tests.
pub trait Runner {
    /// Run to completion, capturing stdout and stderr.
    fn run(&self, root: Option<&Path>, cmd: &[OsString], args: &[OsString])
    -> Result<CommandResult>;

    /// Run with the terminal attached; only the exit code is captured.
    fn run_interactive(
        &self,
        root: Option<&Path>,
        cmd: &[OsString],
        args: &[OsString],
    ) -> Result<CommandResult>;
}

/// [`Runner`] backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner {
    verbose: bool,
}

impl SystemRunner {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn trace(&self, cmd: &[OsString], args: &[OsString]) {
        if self.verbose {
            log!("exec"; "{}", display_command(cmd, args));
        }
    }
}

impl Runner for SystemRunner {
    fn run(
        &self,
        root: Option<&Path>,
        cmd: &[OsString],
        args: &[OsString],
    ) -> Result<CommandResult> {
        let (name, mut command) = prepare(root, cmd, args)?;
        self.trace(cmd, args);

        match command.output() {
            Ok(output) => {
                let result = CommandResult::from(&output);
                if self.verbose && !result.success() {
                    log!("exec"; "`{name}` exited with {}\n{}", result.exit_code, strip_ansi(&result.stderr));
                }
                Ok(result)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(CommandResult::not_found(&name)),
            Err(err) => Err(err).with_context(|| format!("Failed to execute `{name}`")),
        }
    }

    fn run_interactive(
        &self,
        root: Option<&Path>,
        cmd: &[OsString],
        args: &[OsString],
    ) -> Result<CommandResult> {
        let (name, mut command) = prepare(root, cmd, args)?;
        self.trace(cmd, args);

        command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        match command.status() {
            Ok(status) => Ok(CommandResult::from_parts(status, &[], &[])),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(CommandResult::not_found(&name)),
            Err(err) => Err(err).with_context(|| format!("Failed to execute `{name}`")),
        }
    }
}

/// Prepare a Command from components.
fn prepare(root: Option<&Path>, cmd: &[OsString], args: &[OsString]) -> Result<(String, Command)> {
    let name = cmd
        .first()
        .and_then(|s| s.to_str())
        .context("Empty command")?
        .to_owned();

    let mut command = Command::new(&cmd[0]);
    command.args(&cmd[1..]).args(args);

    if let Some(dir) = root {
        command.current_dir(dir);
    }

    Ok((name, command))
}

/// Render a command line for logs.
pub fn display_command(cmd: &[OsString], args: &[OsString]) -> String {
    cmd.iter()
        .chain(args)
        .map(|s| s.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Output Filtering
// ============================================================================

/// Remove ANSI color sequences from tool output.
pub fn strip_ansi(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
    re.replace_all(s, "")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::internal::*;
    use super::*;

    #[test]
    fn test_to_os() {
        assert_eq!(to_os("hello"), OsString::from("hello"));
        assert_eq!(to_os(String::from("world")), OsString::from("world"));
    }

    #[test]
    fn test_to_cmd_vec_array() {
        let cmd = to_cmd_vec(["git", "status"]);
        assert_eq!(cmd, vec![OsString::from("git"), OsString::from("status")]);
    }

    #[test]
    fn test_to_cmd_vec_vec() {
        let v = vec!["gh".to_string(), "--hostname".to_string()];
        let cmd = to_cmd_vec(&v);
        assert_eq!(cmd.len(), 2);
        assert_eq!(cmd[0], OsString::from("gh"));
    }

    #[test]
    fn test_filter_args() {
        let args = [OsString::from("a"), OsString::from(""), OsString::from("b")];
        assert_eq!(filter_args(&args), vec![OsString::from("a"), OsString::from("b")]);
    }

    #[test]
    fn test_prepare_empty() {
        assert!(prepare(None, &[], &[]).is_err());
    }

    #[test]
    fn test_prepare_valid() {
        let cmd = to_cmd_vec(["echo"]);
        let (name, _) = prepare(None, &cmd, &[OsString::from("hello")]).unwrap();
        assert_eq!(name, "echo");
    }

    #[test]
    fn test_display_command() {
        let cmd = to_cmd_vec(["git"]);
        let args = [OsString::from("push"), OsString::from("origin")];
        assert_eq!(display_command(&cmd, &args), "git push origin");
    }

    #[test]
    fn test_command_result_value() {
        assert_eq!(CommandResult::ok("main\n").value(), Some("main"));
        assert_eq!(CommandResult::ok("").value(), None);
        assert_eq!(CommandResult::failed(1, "boom").value(), None);
    }

    #[test]
    fn test_command_result_diagnostics() {
        let both = CommandResult {
            exit_code: 1,
            stdout: "out".into(),
            stderr: "err".into(),
        };
        assert_eq!(both.diagnostics(), "err\nout");
        assert_eq!(CommandResult::failed(1, "err").diagnostics(), "err");
        assert_eq!(CommandResult::ok("out").diagnostics(), "out");
    }

    #[test]
    fn test_system_runner_missing_program() {
        let runner = SystemRunner::default();
        let cmd = to_cmd_vec(["gh-publish-definitely-not-installed"]);
        let result = runner.run(None, &cmd, &[]).unwrap();
        assert_eq!(result.exit_code, NOT_FOUND_EXIT_CODE);
        assert!(result.stderr.contains("command not found"));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_failure() {
        let runner = SystemRunner::default();
        let cmd = to_cmd_vec(["sh"]);
        let args = [OsString::from("-c"), OsString::from("echo out; echo err >&2; exit 3")];
        let result = runner.run(None, &cmd, &args).unwrap();
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stdout, "out");
        assert_eq!(result.stderr, "err");
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[31mRed\x1b[0m"), "Red");
        assert_eq!(strip_ansi("\x1b[1;32mGreen Bold\x1b[0m"), "Green Bold");
        assert_eq!(strip_ansi("Plain text"), "Plain text");
    }
}
