//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

pub fn root() -> std::path::PathBuf {
    "./".into()
}

// ============================================================================
// [deploy] Section Defaults
// ============================================================================

pub mod deploy {
    pub fn branch() -> String {
        "gh-pages".into()
    }

    pub fn message() -> String {
        "Deploy to GitHub Pages".into()
    }

    pub fn manifest() -> String {
        "package.json".into()
    }

    pub fn build_dirs() -> Vec<String> {
        ["dist", "build", "public", "out", "_site"]
            .map(String::from)
            .to_vec()
    }

    pub fn asset_extensions() -> Vec<String> {
        [
            "html", "htm", "css", "js", "mjs", "ico", "png", "jpg", "jpeg", "gif", "svg", "webp",
            "avif",
        ]
        .map(String::from)
        .to_vec()
    }

    pub fn asset_dirs() -> Vec<String> {
        ["assets", "css", "js", "images", "img", "fonts", "static", "media"]
            .map(String::from)
            .to_vec()
    }

    pub fn extra_files() -> Vec<String> {
        vec!["CNAME".into()]
    }
}

// ============================================================================
// [tools] Section Defaults
// ============================================================================

pub mod tools {
    pub fn git() -> Vec<String> {
        vec!["git".into()]
    }

    pub fn gh() -> Vec<String> {
        vec!["gh".into()]
    }
}

// ============================================================================
// [network] Section Defaults
// ============================================================================

pub mod network {
    pub fn probe_host() -> String {
        "github.com".into()
    }

    pub fn probe_port() -> u16 {
        443
    }

    pub fn timeout() -> u64 {
        5
    }
}
