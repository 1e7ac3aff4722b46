//! GitHub-facing pieces: remote detection, `gh` capabilities, error-text
//! classification and the Pages site state.

pub mod classify;
pub mod pages;
pub mod probe;
pub mod remote;
