//! Platform, framework and language detection.
//!
//! Detection runs in two tiers and stops at the first that evidences
//! anything:
//!
//! 1. **Manifests.** Every dependency manifest of every ecosystem is read and
//!    its dependency names are looked up in the mapping tables.
//! 2. **Configuration files.** Platform configuration file names are globbed.
//!
//! Within a tier, evidence for more than one platform is an error carrying
//! every candidate; the caller resolves it and calls
//! [`Detector::detect_with_choice`].
//!
//! # Examples
//!
//! ```ignore
//! use sm_core::Config;
//! use sm_scanner::Detector;
//!
//! let detection = Detector::new(&Config::default()).detect("/path/to/project".into())?;
//! println!("{} on {}", detection.platform, detection.framework);
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use globset::Glob;
use sm_core::mapping::dependencies::{framework_from_dependencies, platform_dependency};
use sm_core::mapping::files::{FRAMEWORK_MARKERS, StructureMarker, config_globs, manifest_names};
use sm_core::{
    Candidate, Config, Confidence, DetectionResult, Evidence, EvidenceSource, Framework, Language,
    Platform,
};
use tracing::{debug, info, warn};

use crate::error::{DetectError, ScanError};
use crate::files::{FileClassifier, glob_set};
use crate::manifest::{Manifest, ManifestKind};
use crate::walker::FileWalker;

/// Resolves the platform, framework and language of a project.
#[derive(Debug, Clone, Default)]
pub struct Detector {
    skip_dirs: Vec<String>,
    follow_links: bool,
}

/// One walk of a project, shared by both tiers.
struct ProjectScan {
    root: Utf8PathBuf,
    paths: Vec<Utf8PathBuf>,
    manifests: Vec<Manifest>,
}

impl ProjectScan {
    fn manifests_of(&self, language: Language) -> impl Iterator<Item = &Manifest> {
        self.manifests.iter().filter(move |m| m.language() == language)
    }

    fn dependencies_of(&self, language: Language) -> Vec<&str> {
        self.manifests_of(language)
            .flat_map(|m| m.dependencies.iter().map(String::as_str))
            .collect()
    }
}

impl Detector {
    /// Creates a detector using the scan settings in `config`.
    ///
    /// The checkpoint store directory is always skipped.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let mut skip_dirs = config.scan.extra_skip_dirs.clone();
        if let Some(store) = config.checkpoint.store_dir.components().next() {
            skip_dirs.push(store.as_str().to_owned());
        }
        Self {
            skip_dirs,
            follow_links: config.scan.follow_links,
        }
    }

    /// Detects the single platform a project uses.
    ///
    /// # Errors
    ///
    /// - [`DetectError::MultiplePlatformsDetected`] when one tier evidences
    ///   more than one platform
    /// - [`DetectError::PlatformNotDetected`] when neither tier finds anything
    /// - [`DetectError::Scan`] when the project cannot be walked
    pub fn detect(&self, root: &Utf8Path) -> Result<DetectionResult, DetectError> {
        let scan = self.scan(root)?;

        for (tier, candidates) in [
            ("manifest", manifest_candidates(&scan)),
            ("config", config_candidates(&scan)?),
        ] {
            match candidates.len() {
                0 => debug!(tier, "no platform evidence"),
                1 => {
                    if let Some(candidate) = candidates.into_iter().next() {
                        return Ok(finish(scan, candidate, Vec::new())?);
                    }
                }
                _ => {
                    warn!(tier, count = candidates.len(), "multiple platforms detected");
                    return Err(DetectError::MultiplePlatformsDetected { candidates });
                }
            }
        }

        Err(DetectError::PlatformNotDetected {
            root: root.to_owned(),
        })
    }

    /// Every platform evidenced by either tier, strongest first.
    ///
    /// Evidence for a platform found by both tiers is merged into one
    /// candidate.
    ///
    /// # Errors
    ///
    /// [`DetectError::Scan`] when the project cannot be walked.
    pub fn candidates(&self, root: &Utf8Path) -> Result<Vec<Candidate>, DetectError> {
        let scan = self.scan(root)?;
        let mut candidates = manifest_candidates(&scan);
        for extra in config_candidates(&scan)? {
            match candidates.iter_mut().find(|c| c.platform == extra.platform) {
                Some(existing) => existing.evidence.extend(extra.evidence),
                None => candidates.push(extra),
            }
        }
        candidates.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        Ok(candidates)
    }

    /// Builds a detection result from an externally chosen candidate.
    ///
    /// # Errors
    ///
    /// [`DetectError::Scan`] when the project cannot be walked.
    pub fn detect_with_choice(
        &self,
        root: &Utf8Path,
        candidate: &Candidate,
    ) -> Result<DetectionResult, DetectError> {
        let scan = self.scan(root)?;
        let choice = Evidence::new(
            EvidenceSource::UserChoice,
            candidate.platform.label(),
            Confidence::High,
        );
        Ok(finish(scan, candidate.clone(), vec![choice])?)
    }

    fn scan(&self, root: &Utf8Path) -> Result<ProjectScan, ScanError> {
        let paths = FileWalker::new(root)?
            .with_skip_dirs(&self.skip_dirs)
            .with_follow_links(self.follow_links)
            .collect_paths()?;

        let mut manifests = Vec::new();
        for path in paths.iter().filter(|p| ManifestKind::from_path(p).is_some()) {
            match Manifest::read(root, path) {
                Ok(manifest) => manifests.push(manifest),
                Err(err) => warn!(path = %path, error = %err, "skipping unreadable manifest"),
            }
        }

        debug!(root = %root, files = paths.len(), manifests = manifests.len(), "project walked");
        Ok(ProjectScan {
            root: root.to_owned(),
            paths,
            manifests,
        })
    }
}

/// Tier 1: platform dependencies declared in any manifest.
fn manifest_candidates(scan: &ProjectScan) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = Vec::new();

    for language in Language::ALL {
        for manifest in scan.manifests_of(language) {
            for (name, dep) in manifest.platform_dependencies() {
                let evidence = Evidence::new(EvidenceSource::Manifest, name, Confidence::High)
                    .with_file(&manifest.path);
                match candidates.iter_mut().find(|c| c.platform == dep.platform) {
                    Some(candidate) => candidate.evidence.push(evidence),
                    None => candidates.push(Candidate {
                        platform: dep.platform,
                        framework: Framework::default_for(language),
                        language,
                        confidence: Confidence::High,
                        evidence: vec![evidence],
                    }),
                }
            }
        }
    }

    for candidate in &mut candidates {
        let flavour = candidate
            .evidence
            .iter()
            .filter_map(|e| platform_dependency(candidate.language, &e.matched))
            .find_map(|d| d.framework);
        let (framework, evidence) = match flavour {
            Some(framework) => (framework, None),
            None => infer_framework(scan, candidate.language),
        };
        candidate.framework = framework;
        candidate.evidence.extend(evidence);
    }

    candidates
}

/// Tier 2: platform configuration files.
fn config_candidates(scan: &ProjectScan) -> Result<Vec<Candidate>, ScanError> {
    let mut candidates = Vec::new();

    for platform in Platform::ALL {
        let set = glob_set(config_globs(platform))?;
        let evidence: Vec<Evidence> = scan
            .paths
            .iter()
            .filter(|p| set.is_match(p))
            .map(|p| {
                Evidence::new(
                    EvidenceSource::ConfigFile,
                    p.file_name().unwrap_or(p.as_str()),
                    Confidence::Medium,
                )
                .with_file(p)
            })
            .collect();
        if evidence.is_empty() {
            continue;
        }

        let language = infer_language(scan);
        let (framework, framework_evidence) = infer_framework(scan, language);
        candidates.push(Candidate {
            platform,
            framework,
            language,
            confidence: Confidence::Medium,
            evidence: evidence.into_iter().chain(framework_evidence).collect(),
        });
    }

    Ok(candidates)
}

/// Ecosystem with a manifest at the root, else the most common source
/// extension, else JavaScript.
fn infer_language(scan: &ProjectScan) -> Language {
    let at_root = Language::ALL.into_iter().find(|language| {
        manifest_names(*language)
            .iter()
            .any(|name| scan.paths.iter().any(|p| p.as_str() == *name))
    });
    if let Some(language) = at_root {
        return language;
    }

    let mut counts = [0_usize; Language::ALL.len()];
    for language in scan.paths.iter().filter_map(|p| p.extension()).filter_map(Language::from_extension) {
        if let Some(i) = Language::ALL.iter().position(|l| *l == language) {
            counts[i] += 1;
        }
    }
    // Ties go to the earlier ecosystem
    Language::ALL
        .into_iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .fold(None, |best: Option<(Language, usize)>, (language, count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((language, count)),
        })
        .map_or(Language::JavaScript, |(language, _)| language)
}

/// Framework from manifest dependencies, then structure, then the
/// ecosystem default. Returns the evidence behind the choice.
fn infer_framework(scan: &ProjectScan, language: Language) -> (Framework, Option<Evidence>) {
    let dependencies = scan.dependencies_of(language);
    if let Some(framework) = framework_from_dependencies(language, &dependencies) {
        let evidence = Evidence::new(EvidenceSource::Manifest, framework.label(), Confidence::Medium);
        return (framework, Some(evidence));
    }

    if language == Language::JavaScript {
        if let Some((framework, marker)) = structural_framework(scan) {
            let evidence =
                Evidence::new(EvidenceSource::Heuristic, marker, Confidence::Low).with_file(marker);
            return (framework, Some(evidence));
        }
    }

    let framework = Framework::default_for(language);
    let evidence = Evidence::new(
        EvidenceSource::Heuristic,
        format!("default for {language}"),
        Confidence::Low,
    );
    (framework, Some(evidence))
}

fn structural_framework(scan: &ProjectScan) -> Option<(Framework, &'static str)> {
    FRAMEWORK_MARKERS.iter().find_map(|entry| {
        let found = match entry.marker {
            StructureMarker::Dir(dir) => scan.root.join(dir).is_dir(),
            StructureMarker::File(glob) => match Glob::new(glob) {
                Ok(glob) => {
                    let matcher = glob.compile_matcher();
                    scan.paths.iter().any(|p| matcher.is_match(p))
                }
                Err(err) => {
                    warn!(glob, error = %err, "invalid framework marker");
                    false
                }
            },
        };
        let marker = match entry.marker {
            StructureMarker::Dir(m) | StructureMarker::File(m) => m,
        };
        found.then_some((entry.framework, marker))
    })
}

fn finish(
    scan: ProjectScan,
    candidate: Candidate,
    extra: Vec<Evidence>,
) -> Result<DetectionResult, ScanError> {
    let files = FileClassifier::new(candidate.platform, candidate.language)?.classify(&scan.paths);

    let mut evidence = candidate.evidence;
    evidence.extend(extra);
    evidence.sort_by(|a, b| b.confidence.cmp(&a.confidence));

    info!(
        root = %scan.root,
        platform = %candidate.platform,
        framework = %candidate.framework,
        language = %candidate.language,
        files = files.len(),
        "platform detected"
    );

    Ok(DetectionResult::new(scan.root, candidate.platform, candidate.framework, candidate.language)
        .with_files(files)
        .with_evidence(evidence))
}
