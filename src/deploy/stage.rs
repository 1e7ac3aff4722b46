//! Staging the site into the deploy workspace.
//!
//! A project with a package manifest deploys its build output; anything else
//! deploys its web assets as they sit in the project root. When no
//! `index.html` ends up staged one is synthesized.

use crate::{
    config::PublishConfig,
    logger::{Sink, Status},
    utils::fs::{clear_dir_except, copy_dir_recursive, copy_file},
};
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Page written when a project has neither `index.html` nor `README.md`.
pub const PLACEHOLDER_INDEX: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>GitHub Pages Project</title>
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; max-width: 800px; margin: 0 auto; padding: 20px; }
        h1 { color: #0366d6; }
    </style>
</head>
<body>
    <h1>Welcome to my GitHub Pages site!</h1>
    <p>This is a basic page created by the GitHub Pages Publisher script.</p>
    <p>Edit this file to customize your site.</p>
</body>
</html>"#;

/// Where the staged files came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageSource {
    /// Contents of a build output directory
    BuildOutput(PathBuf),
    /// Allow-listed files from the project root
    WebAssets,
}

#[derive(Debug, Clone)]
pub struct StageReport {
    pub source: StageSource,
    /// Paths relative to the workspace root
    pub files: Vec<PathBuf>,
}

/// What index synthesis wrote, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSource {
    Existing,
    Readme,
    Placeholder,
}

/// Replace the workspace contents (except `.git`) with the project's site.
pub fn stage_files(config: &PublishConfig, sink: &dyn Sink, workspace: &Path) -> Result<StageReport> {
    clear_dir_except(workspace, &[".git"])?;

    let root = config.get_root();
    let deploy = &config.deploy;
    let has_manifest = root.join(&deploy.manifest).is_file();

    let mut report = match has_manifest.then(|| find_build_output(config)).flatten() {
        Some(dir) => {
            sink.info(&format!("Deploying build output from `{}`", dir.display()));
            StageReport {
                files: copy_dir_recursive(&root.join(&dir), workspace)?,
                source: StageSource::BuildOutput(dir),
            }
        }
        None => {
            if has_manifest {
                sink.status(
                    Status::Warning,
                    &format!("Found {} but no build output", deploy.manifest),
                    Some(&format!(
                        "A build step may be required first. Searched: {}",
                        deploy.build_dirs.join(", ")
                    )),
                );
            }
            StageReport {
                files: copy_web_assets(config, workspace)?,
                source: StageSource::WebAssets,
            }
        }
    };

    for name in &deploy.extra_files {
        let (src, dst) = (root.join(name), workspace.join(name));
        if src.is_file() && !dst.exists() {
            copy_file(&src, &dst)?;
            report.files.push(PathBuf::from(name));
        }
    }

    Ok(report)
}

/// First configured build directory present in the project.
fn find_build_output(config: &PublishConfig) -> Option<PathBuf> {
    config
        .deploy
        .build_dirs
        .iter()
        .map(PathBuf::from)
        .find(|dir| config.get_root().join(dir).is_dir())
}

/// Copy root-level web files and the asset directories.
fn copy_web_assets(config: &PublishConfig, workspace: &Path) -> Result<Vec<PathBuf>> {
    let root = config.get_root();
    let mut files = Vec::new();

    let entries = fs::read_dir(root)
        .with_context(|| format!("Failed to read directory: {}", root.display()))?;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };

        if entry.file_type()?.is_file() && config.deploy.is_web_asset(name) {
            copy_file(&entry.path(), &workspace.join(name))?;
            files.push(PathBuf::from(name));
        }
    }

    for dir in &config.deploy.asset_dirs {
        let src = root.join(dir);
        if !src.is_dir() {
            continue;
        }
        let copied = copy_dir_recursive(&src, &workspace.join(dir))?;
        files.extend(copied.into_iter().map(|file| Path::new(dir).join(file)));
    }

    Ok(files)
}

/// Ensure the workspace has an `index.html` and a `.nojekyll` marker.
///
/// A missing index is built from the project's `README.md` when present,
/// otherwise the placeholder page is written.
pub fn synthesize_index(config: &PublishConfig, workspace: &Path) -> Result<IndexSource> {
    let index = workspace.join("index.html");

    let source = if index.exists() {
        IndexSource::Existing
    } else {
        let readme = config.get_root().join("README.md");
        let (source, html) = match fs::read_to_string(&readme) {
            Ok(text) => (IndexSource::Readme, readme_page(&text)),
            Err(_) => (IndexSource::Placeholder, PLACEHOLDER_INDEX.to_owned()),
        };
        fs::write(&index, html)
            .with_context(|| format!("Failed to write {}", index.display()))?;
        source
    };

    let marker = workspace.join(".nojekyll");
    fs::write(&marker, "").with_context(|| format!("Failed to write {}", marker.display()))?;

    Ok(source)
}

/// Minimal page showing the README text verbatim.
fn readme_page(text: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n    \
             <meta charset=\"UTF-8\">\n    \
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n    \
             <title>README</title>\n\
         </head>\n\
         <body>\n\
         <pre>{}</pre>\n\
         </body>\n\
         </html>\n",
        escape_html(text)
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Recorder, config_at};
    use tempfile::TempDir;

    fn touch(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = crate::utils::fs::collect_all_files(dir)
            .into_iter()
            .map(|p| p.strip_prefix(dir).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_bare_project_gets_placeholder() {
        let project = TempDir::new().unwrap();
        let workspace = TempDir::new().unwrap();
        touch(&project.path().join("notes.md"), "# notes");
        let config = config_at(project.path());
        let sink = Recorder::new();

        let report = stage_files(&config, &sink, workspace.path()).unwrap();
        assert!(report.files.is_empty());
        assert_eq!(report.source, StageSource::WebAssets);

        let source = synthesize_index(&config, workspace.path()).unwrap();
        assert_eq!(source, IndexSource::Placeholder);
        assert_eq!(
            fs::read_to_string(workspace.path().join("index.html")).unwrap(),
            PLACEHOLDER_INDEX
        );
        assert_eq!(fs::read_to_string(workspace.path().join(".nojekyll")).unwrap(), "");
    }

    #[test]
    fn test_build_output_is_staged() {
        let project = TempDir::new().unwrap();
        let workspace = TempDir::new().unwrap();
        touch(&project.path().join("package.json"), "{}");
        touch(&project.path().join("build/index.html"), "<h1>app</h1>");
        touch(&project.path().join("build/app.js"), "run()");
        touch(&project.path().join("src/main.js"), "source");
        let config = config_at(project.path());
        let sink = Recorder::new();

        let report = stage_files(&config, &sink, workspace.path()).unwrap();
        assert_eq!(report.source, StageSource::BuildOutput(PathBuf::from("build")));
        assert_eq!(listing(workspace.path()), vec!["app.js", "index.html"]);

        assert_eq!(synthesize_index(&config, workspace.path()).unwrap(), IndexSource::Existing);
        assert_eq!(
            fs::read_to_string(workspace.path().join("index.html")).unwrap(),
            "<h1>app</h1>"
        );
        assert!(workspace.path().join(".nojekyll").exists());
    }

    #[test]
    fn test_build_dirs_searched_in_order() {
        let project = TempDir::new().unwrap();
        let workspace = TempDir::new().unwrap();
        touch(&project.path().join("package.json"), "{}");
        touch(&project.path().join("public/favicon.ico"), "");
        touch(&project.path().join("dist/index.html"), "");
        let config = config_at(project.path());

        let report = stage_files(&config, &Recorder::new(), workspace.path()).unwrap();
        assert_eq!(report.source, StageSource::BuildOutput(PathBuf::from("dist")));
    }

    #[test]
    fn test_manifest_without_build_output_warns() {
        let project = TempDir::new().unwrap();
        let workspace = TempDir::new().unwrap();
        touch(&project.path().join("package.json"), "{}");
        touch(&project.path().join("index.html"), "<h1>hi</h1>");
        let config = config_at(project.path());
        let sink = Recorder::new();

        let report = stage_files(&config, &sink, workspace.path()).unwrap();

        assert_eq!(report.source, StageSource::WebAssets);
        assert!(sink.has(Status::Warning, "build step may be required"));
        assert_eq!(listing(workspace.path()), vec!["index.html"]);
    }

    #[test]
    fn test_private_root_files_are_not_staged() {
        let project = TempDir::new().unwrap();
        let workspace = TempDir::new().unwrap();
        touch(&project.path().join("index.html"), "");
        touch(&project.path().join("secrets.json"), "{\"token\": \"x\"}");
        touch(&project.path().join("package-lock.json"), "{}");
        touch(&project.path().join("notes.txt"), "todo");
        touch(&project.path().join("pom.xml"), "<project/>");
        touch(&project.path().join("assets/data.json"), "[]");
        let config = config_at(project.path());

        stage_files(&config, &Recorder::new(), workspace.path()).unwrap();

        assert_eq!(listing(workspace.path()), vec!["assets/data.json", "index.html"]);
        assert!(!workspace.path().join("secrets.json").exists());
    }

    #[test]
    fn test_web_assets_allow_list() {
        let project = TempDir::new().unwrap();
        let workspace = TempDir::new().unwrap();
        touch(&project.path().join("index.html"), "");
        touch(&project.path().join("style.CSS"), "");
        touch(&project.path().join("deploy.sh"), "");
        touch(&project.path().join(".env"), "");
        touch(&project.path().join("images/logo.png"), "");
        touch(&project.path().join("scripts/build.py"), "");
        touch(&project.path().join("CNAME"), "example.com");
        let config = config_at(project.path());

        let report = stage_files(&config, &Recorder::new(), workspace.path()).unwrap();

        assert_eq!(report.files.len(), 4);
        assert_eq!(
            listing(workspace.path()),
            vec!["CNAME", "images/logo.png", "index.html", "style.CSS"]
        );
    }

    #[test]
    fn test_stage_clears_previous_content() {
        let project = TempDir::new().unwrap();
        let workspace = TempDir::new().unwrap();
        touch(&project.path().join("index.html"), "new");
        touch(&workspace.path().join(".git/HEAD"), "ref: refs/heads/gh-pages");
        touch(&workspace.path().join("stale.html"), "old");
        let config = config_at(project.path());

        stage_files(&config, &Recorder::new(), workspace.path()).unwrap();

        assert!(!workspace.path().join("stale.html").exists());
        assert!(workspace.path().join(".git/HEAD").exists());
    }

    #[test]
    fn test_readme_wrapped_and_escaped() {
        let project = TempDir::new().unwrap();
        let workspace = TempDir::new().unwrap();
        touch(&project.path().join("README.md"), "# Site\n<script>alert('x')</script> & more");
        let config = config_at(project.path());

        let source = synthesize_index(&config, workspace.path()).unwrap();
        let html = fs::read_to_string(workspace.path().join("index.html")).unwrap();

        assert_eq!(source, IndexSource::Readme);
        assert!(html.contains(
            "<pre># Site\n&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; more</pre>"
        ));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b && c > \"d\""), "a &lt; b &amp;&amp; c &gt; &quot;d&quot;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
