use std::path::Path;

use brief_core::taxonomy::{classify, ClassifiedError, ErrorCode};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};

/// Directory names never descended into. Matched case-sensitively.
pub const SKIP_DIRS: &[&str] = &[
    // version control
    ".git",
    ".hg",
    ".svn",
    // dependency caches
    "node_modules",
    "bower_components",
    "vendor",
    ".venv",
    "venv",
    "__pycache__",
    // build output
    "target",
    "build",
    "dist",
    "out",
    "coverage",
    ".next",
    ".nuxt",
    ".cache",
    // editor state
    ".idea",
    ".vscode",
];

/// Ignore rules for one scan root: the static skip list plus the patterns of
/// the root's ignore file, loaded once.
#[derive(Debug, Clone)]
pub struct PathFilter {
    rules: Gitignore,
    /// The root-level ignore file, which is never itself summarized.
    ignore_file: Option<String>,
}

impl PathFilter {
    /// A filter with no ignore patterns.
    pub fn empty() -> Self {
        Self {
            rules: Gitignore::empty(),
            ignore_file: None,
        }
    }

    /// Load `<root>/<ignore_file>`. A missing or unreadable file yields a
    /// filter that ignores nothing.
    pub fn load(root: &Path, ignore_file: &str) -> Self {
        let path = root.join(ignore_file);
        if !path.is_file() {
            debug!(path = %path.display(), "no ignore file");
            return Self::empty();
        }

        let mut builder = GitignoreBuilder::new(root);
        if let Some(err) = builder.add(&path) {
            let classified =
                classify_ignore_error(&err).with_context("path", path.display().to_string());
            warn!(
                path = %path.display(),
                code = %classified.code,
                error = %classified.message,
                "ignore file partially loaded"
            );
        }
        Self {
            ignore_file: Some(ignore_file.to_string()),
            ..Self::finish(builder)
        }
    }

    /// Build from in-memory pattern lines.
    pub fn from_patterns<'a>(root: &Path, lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut builder = GitignoreBuilder::new(root);
        for line in lines {
            if let Err(err) = builder.add_line(None, line) {
                let classified = classify_ignore_error(&err);
                warn!(
                    pattern = line,
                    code = %classified.code,
                    error = %classified.message,
                    "skipping invalid ignore pattern"
                );
            }
        }
        Self::finish(builder)
    }

    fn finish(builder: GitignoreBuilder) -> Self {
        match builder.build() {
            Ok(rules) => {
                debug!(patterns = rules.num_ignores(), "ignore rules loaded");
                Self {
                    rules,
                    ignore_file: None,
                }
            }
            Err(err) => {
                let classified = classify_ignore_error(&err);
                warn!(
                    code = %classified.code,
                    error = %classified.message,
                    "ignore rules unusable, nothing will be ignored"
                );
                Self::empty()
            }
        }
    }

    pub fn should_skip_directory(&self, name: &str) -> bool {
        SKIP_DIRS.contains(&name)
    }

    /// Whether a file, given relative to the scan root, matches the ignore
    /// rules directly or through one of its parent directories.
    pub fn is_ignored(&self, relative_path: &str) -> bool {
        if self.ignore_file.as_deref() == Some(relative_path) {
            return true;
        }
        if self.rules.is_empty() {
            return false;
        }
        self.rules
            .matched_path_or_any_parents(relative_path, false)
            .is_ignore()
    }
}

/// An unreadable ignore file is a filesystem failure; a bad pattern is a
/// configuration failure.
fn classify_ignore_error(err: &ignore::Error) -> ClassifiedError {
    match err.io_error() {
        Some(io) => classify(io),
        None => ClassifiedError::new(ErrorCode::ConfigError, err.to_string())
            .with_context("setting", "ignoreFile"),
    }
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::empty()
    }
}
