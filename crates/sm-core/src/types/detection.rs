//! Detection results and the evidence behind them.
//!
//! A [`DetectionResult`] is produced once per run and is read-only afterwards;
//! every downstream stage borrows it.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use super::platform::{Confidence, Framework, Language, Platform, TestType};

/// Where a detection decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    /// A dependency manifest (`package.json`, `pom.xml`, ...).
    Manifest,
    /// A platform configuration file (`.percy.yml`, ...).
    ConfigFile,
    /// Project structure or a language default.
    Heuristic,
    /// An explicit choice made outside the detector.
    UserChoice,
}

/// One piece of evidence supporting a detection decision.
///
/// # Examples
///
/// ```
/// use sm_core::{Confidence, Evidence, EvidenceSource};
///
/// let evidence = Evidence::new(EvidenceSource::Manifest, "@percy/cypress", Confidence::High)
///     .with_file("package.json");
/// assert_eq!(evidence.file.as_deref().map(|p| p.as_str()), Some("package.json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// How the decision was reached.
    pub source: EvidenceSource,
    /// The dependency name, file name or rule that matched.
    pub matched: String,
    /// The file that carried the evidence, relative to the project root.
    pub file: Option<Utf8PathBuf>,
    /// How much the decision can be trusted.
    pub confidence: Confidence,
}

impl Evidence {
    /// Creates evidence without an associated file.
    #[must_use]
    pub fn new(source: EvidenceSource, matched: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            source,
            matched: matched.into(),
            file: None,
            confidence,
        }
    }

    /// Attaches the file that carried this evidence.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<Utf8PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// Project files grouped into four disjoint categories.
///
/// Paths are relative to the project root. A path appears in at most one
/// list; the walker assigns categories in the order manifest, config, CI,
/// source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectFiles {
    /// Platform configuration files.
    pub config: Vec<Utf8PathBuf>,
    /// Test source files in the detected language.
    pub source: Vec<Utf8PathBuf>,
    /// CI pipeline definitions.
    pub ci: Vec<Utf8PathBuf>,
    /// Dependency manifests.
    pub manifests: Vec<Utf8PathBuf>,
}

impl ProjectFiles {
    /// Total number of files across all categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.config.len() + self.source.len() + self.ci.len() + self.manifests.len()
    }

    /// Returns `true` if no files were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over every collected path.
    pub fn iter(&self) -> impl Iterator<Item = &Utf8PathBuf> {
        self.manifests
            .iter()
            .chain(&self.config)
            .chain(&self.ci)
            .chain(&self.source)
    }

    /// Returns `true` if `path` is in any category.
    #[must_use]
    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.iter().any(|p| p == path)
    }

    /// Sorts every category so results are stable across runs.
    pub fn sort(&mut self) {
        self.config.sort();
        self.source.sort();
        self.ci.sort();
        self.manifests.sort();
    }
}

/// The outcome of detection for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Absolute project root.
    pub root: Utf8PathBuf,
    /// The single source platform being migrated.
    pub platform: Platform,
    /// The test framework.
    pub framework: Framework,
    /// The language ecosystem.
    pub language: Language,
    /// Derived from `framework`.
    pub test_type: TestType,
    /// Categorized project files.
    pub files: ProjectFiles,
    /// Evidence for the platform decision, strongest first.
    pub evidence: Vec<Evidence>,
}

impl DetectionResult {
    /// Creates a result, deriving the test type from the framework.
    #[must_use]
    pub fn new(
        root: impl Into<Utf8PathBuf>,
        platform: Platform,
        framework: Framework,
        language: Language,
    ) -> Self {
        Self {
            root: root.into(),
            platform,
            framework,
            language,
            test_type: framework.test_type(),
            files: ProjectFiles::default(),
            evidence: Vec::new(),
        }
    }

    /// Sets the categorized files.
    #[must_use]
    pub fn with_files(mut self, files: ProjectFiles) -> Self {
        self.files = files;
        self
    }

    /// Sets the evidence list.
    #[must_use]
    pub fn with_evidence(mut self, evidence: Vec<Evidence>) -> Self {
        self.evidence = evidence;
        self
    }

    /// The confidence of the strongest evidence, or `Low` if there is none.
    #[must_use]
    pub fn confidence(&self) -> Confidence {
        self.evidence
            .iter()
            .map(|e| e.confidence)
            .max()
            .unwrap_or(Confidence::Low)
    }

    /// Resolves a project-relative path against the root.
    #[must_use]
    pub fn absolute(&self, relative: &Utf8Path) -> Utf8PathBuf {
        self.root.join(relative)
    }
}

/// One platform candidate found by the broad evidence-preserving scan.
///
/// Candidates carry enough context for an external selector to choose one
/// without re-scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// The evidenced platform.
    pub platform: Platform,
    /// The framework inferred alongside it.
    pub framework: Framework,
    /// The ecosystem that evidenced it.
    pub language: Language,
    /// Strongest confidence across `evidence`.
    pub confidence: Confidence,
    /// Every piece of evidence for this candidate.
    pub evidence: Vec<Evidence>,
}

impl Candidate {
    /// Files that evidenced this candidate, deduplicated in first-seen order.
    #[must_use]
    pub fn files(&self) -> Vec<&Utf8Path> {
        let mut files: Vec<&Utf8Path> = Vec::new();
        for file in self.evidence.iter().filter_map(|e| e.file.as_deref()) {
            if !files.contains(&file) {
                files.push(file);
            }
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_result_derives_test_type() {
        let result = DetectionResult::new(
            "/project",
            Platform::Percy,
            Framework::Storybook,
            Language::JavaScript,
        );
        assert_eq!(result.test_type, TestType::Storybook);
        assert_eq!(result.confidence(), Confidence::Low);
    }

    #[test]
    fn test_confidence_is_strongest_evidence() {
        let result = DetectionResult::new(
            "/project",
            Platform::Applitools,
            Framework::Selenium,
            Language::Java,
        )
        .with_evidence(vec![
            Evidence::new(EvidenceSource::Heuristic, "default", Confidence::Low),
            Evidence::new(EvidenceSource::Manifest, "com.applitools:eyes-selenium-java5", Confidence::High),
        ]);
        assert_eq!(result.confidence(), Confidence::High);
    }

    #[test]
    fn test_project_files_iteration() {
        let files = ProjectFiles {
            config: vec![".percy.yml".into()],
            source: vec!["tests/a.spec.js".into(), "tests/b.spec.js".into()],
            ci: vec![".github/workflows/ci.yml".into()],
            manifests: vec!["package.json".into()],
        };
        assert_eq!(files.len(), 5);
        assert!(files.contains(Utf8Path::new("tests/b.spec.js")));
        assert!(!files.contains(Utf8Path::new("README.md")));
        assert_eq!(
            files.iter().next().map(|p| p.as_str()),
            Some("package.json")
        );
    }

    #[test]
    fn test_candidate_files_deduplicated() {
        let candidate = Candidate {
            platform: Platform::Percy,
            framework: Framework::Cypress,
            language: Language::JavaScript,
            confidence: Confidence::High,
            evidence: vec![
                Evidence::new(EvidenceSource::Manifest, "@percy/cli", Confidence::High)
                    .with_file("package.json"),
                Evidence::new(EvidenceSource::Manifest, "@percy/cypress", Confidence::High)
                    .with_file("package.json"),
                Evidence::new(EvidenceSource::ConfigFile, ".percy.yml", Confidence::Medium)
                    .with_file(".percy.yml"),
            ],
        };
        let files: Vec<&str> = candidate.files().iter().map(|p| p.as_str()).collect();
        assert_eq!(files, vec!["package.json", ".percy.yml"]);
    }
}
