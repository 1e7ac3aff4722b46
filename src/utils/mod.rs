//! Utility modules for process execution, git and the filesystem.

pub mod exec;
pub mod fs;
pub mod git;
