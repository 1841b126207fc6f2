//! Sorting walked paths into the four [`ProjectFiles`] categories.

use camino::Utf8PathBuf;
use globset::{Glob, GlobSet, GlobSetBuilder};
use sm_core::mapping::files::{CI_GLOBS, config_globs, manifest_globs, source_globs};
use sm_core::{Language, Platform, ProjectFiles};

use crate::error::ScanError;

/// Builds a [`GlobSet`] from root-relative patterns.
pub(crate) fn glob_set<I, S>(patterns: I) -> Result<GlobSet, ScanError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern.as_ref())?);
    }
    Ok(builder.build()?)
}

/// Classifies paths for one platform and ecosystem.
///
/// Categories are disjoint; a path matching several goes to the first of
/// manifest, config, CI, source. `.percy.js` is therefore config, not source.
#[derive(Debug)]
pub struct FileClassifier {
    manifests: GlobSet,
    config: GlobSet,
    ci: GlobSet,
    source: GlobSet,
}

impl FileClassifier {
    /// Compiles the pattern sets.
    ///
    /// # Errors
    ///
    /// [`ScanError::Glob`] if a mapping-table pattern fails to compile.
    pub fn new(platform: Platform, language: Language) -> Result<Self, ScanError> {
        Ok(Self {
            manifests: glob_set(manifest_globs(language))?,
            config: glob_set(config_globs(platform))?,
            ci: glob_set(CI_GLOBS)?,
            source: glob_set(source_globs(language))?,
        })
    }

    /// Sorts root-relative `paths` into categories.
    #[must_use]
    pub fn classify(&self, paths: &[Utf8PathBuf]) -> ProjectFiles {
        let mut files = ProjectFiles::default();
        for path in paths {
            let list = if self.manifests.is_match(path) {
                &mut files.manifests
            } else if self.config.is_match(path) {
                &mut files.config
            } else if self.ci.is_match(path) {
                &mut files.ci
            } else if self.source.is_match(path) {
                &mut files.source
            } else {
                continue;
            };
            list.push(path.clone());
        }
        files.sort();
        files
    }
}
