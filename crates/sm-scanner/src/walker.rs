//! Directory traversal.
//!
//! [`FileWalker`] uses the `ignore` crate to walk a project while respecting
//! `.gitignore` patterns, and returns every regular file as a path relative to
//! the project root. Classification into config, source, CI and manifest
//! lists happens afterwards in [`FileClassifier`](crate::FileClassifier).
//!
//! Hidden entries are walked: `.percy.yml`, `.github/workflows` and
//! `.storybook` are all signals the detector needs.
//!
//! # Examples
//!
//! ```ignore
//! use sm_scanner::FileWalker;
//! use camino::Utf8Path;
//!
//! let walker = FileWalker::new(Utf8Path::new("/path/to/project"))?;
//! for path in walker.collect_paths()? {
//!     println!("Found: {path}");
//! }
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;

use crate::error::ScanError;

/// Directories never walked: version control, build output and dependency
/// caches, plus the checkpoint store.
pub const SKIP_DIRECTORIES: &[&str] = &[
    ".git",
    "node_modules",
    "dist",
    "build",
    "target",
    "out",
    "coverage",
    ".venv",
    "venv",
    "__pycache__",
    ".gradle",
    ".idea",
    ".next",
    ".smartui-migrate",
];

/// A file walker that discovers every file in a project tree.
///
/// # Design
///
/// The walker uses a "collect-then-parallelize" pattern:
/// 1. Walker collects all paths first (single-threaded, I/O bound)
/// 2. Paths are then processed in parallel with rayon
#[derive(Debug)]
pub struct FileWalker {
    /// The root directory to walk.
    root: Utf8PathBuf,
    /// Additional directories to skip (beyond the built-in list).
    skip_dirs: Vec<String>,
    /// Whether to follow symbolic links.
    follow_links: bool,
}

impl FileWalker {
    /// Creates a new file walker for the given root directory.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the root path doesn't exist or
    /// isn't a directory.
    pub fn new(root: &Utf8Path) -> Result<Self, ScanError> {
        if !root.exists() {
            return Err(ScanError::config(format!(
                "root path does not exist: {root}"
            )));
        }
        if !root.is_dir() {
            return Err(ScanError::config(format!(
                "root path is not a directory: {root}"
            )));
        }

        Ok(Self {
            root: root.to_owned(),
            skip_dirs: Vec::new(),
            follow_links: false,
        })
    }

    /// Adds directory names to skip during traversal.
    #[must_use]
    pub fn with_skip_dirs<S: AsRef<str>>(mut self, dirs: &[S]) -> Self {
        self.skip_dirs
            .extend(dirs.iter().map(|d| d.as_ref().to_owned()));
        self
    }

    /// Configures whether to follow symbolic links.
    ///
    /// By default, symbolic links are not followed.
    #[must_use]
    pub const fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Collects every file path under the root, relative to it and sorted.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Walk`] if directory traversal fails.
    /// Returns [`ScanError::NonUtf8Path`] if a non-UTF-8 path is encountered.
    pub fn collect_paths(&self) -> Result<Vec<Utf8PathBuf>, ScanError> {
        let mut paths = Vec::new();

        for result in self.build_walker() {
            let entry = result?;

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let utf8_path =
                Utf8Path::from_path(path).ok_or_else(|| ScanError::NonUtf8Path(path.to_owned()))?;
            let relative = utf8_path.strip_prefix(&self.root).unwrap_or(utf8_path);

            if self.should_skip_path(relative) {
                continue;
            }

            paths.push(relative.to_owned());
        }

        paths.sort();
        Ok(paths)
    }

    fn build_walker(&self) -> ignore::Walk {
        let skip: Vec<String> = SKIP_DIRECTORIES
            .iter()
            .map(|d| (*d).to_owned())
            .chain(self.skip_dirs.iter().cloned())
            .collect();

        WalkBuilder::new(&self.root)
            .standard_filters(true)
            // Hidden config and CI files are detection signals
            .hidden(false)
            .follow_links(self.follow_links)
            .threads(1)
            .require_git(false)
            // Prune skipped directories instead of walking into them
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                let skipped = entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| skip.iter().any(|s| s == name));
                !(is_dir && entry.depth() > 0 && skipped)
            })
            .build()
    }

    /// Checks if a path should be skipped based on directory name.
    fn should_skip_path(&self, path: &Utf8Path) -> bool {
        let Some(parent) = path.parent() else {
            return false;
        };
        parent.components().any(|component| {
            let name = component.as_str();
            SKIP_DIRECTORIES.contains(&name) || self.skip_dirs.iter().any(|d| d == name)
        })
    }

    /// Returns the root directory being walked.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn walker(skip_dirs: &[&str]) -> FileWalker {
        FileWalker {
            root: Utf8PathBuf::from("."),
            skip_dirs: skip_dirs.iter().map(|d| (*d).to_owned()).collect(),
            follow_links: false,
        }
    }

    #[test]
    fn test_should_skip_path() {
        let walker = walker(&["custom_skip"]);

        assert!(walker.should_skip_path(Utf8Path::new("node_modules/@percy/cli/package.json")));
        assert!(walker.should_skip_path(Utf8Path::new("app/node_modules/x.js")));
        assert!(walker.should_skip_path(Utf8Path::new(".venv/lib/site.py")));
        assert!(walker.should_skip_path(Utf8Path::new(".smartui-migrate/checkpoints/a.json")));
        assert!(walker.should_skip_path(Utf8Path::new("custom_skip/foo.js")));

        assert!(!walker.should_skip_path(Utf8Path::new("tests/home.spec.js")));
        // A file that happens to share a skipped directory's name
        assert!(!walker.should_skip_path(Utf8Path::new("build")));
    }

    #[test]
    fn test_with_skip_dirs_and_links() {
        let walker = walker(&[]).with_skip_dirs(&["vendor"]).with_follow_links(true);
        assert!(walker.skip_dirs.contains(&"vendor".to_owned()));
        assert!(walker.follow_links);
    }

    #[test]
    fn test_new_rejects_missing_root() {
        let err = FileWalker::new(Utf8Path::new("/definitely/not/here"));
        assert!(matches!(err, Err(ScanError::Config(_))));
    }

    #[test]
    fn test_collect_paths_relative_and_hidden() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = Utf8Path::from_path(dir.path()).expect("utf8 tempdir");
        fs::create_dir_all(root.join(".github/workflows")).expect("mkdir");
        fs::create_dir_all(root.join("node_modules/@percy/cli")).expect("mkdir");
        fs::create_dir_all(root.join("tests")).expect("mkdir");
        fs::write(root.join(".percy.yml"), "version: 2\n").expect("write");
        fs::write(root.join(".github/workflows/ci.yml"), "on: push\n").expect("write");
        fs::write(root.join("node_modules/@percy/cli/package.json"), "{}").expect("write");
        fs::write(root.join("tests/home.spec.js"), "").expect("write");

        let paths = FileWalker::new(root)
            .expect("walker")
            .collect_paths()
            .expect("walk");
        let paths: Vec<&str> = paths.iter().map(|p| p.as_str()).collect();
        assert_eq!(
            paths,
            vec![".github/workflows/ci.yml", ".percy.yml", "tests/home.spec.js"]
        );
    }
}
