//! Read-only migration analysis.
//!
//! [`DryRunAnalyzer`] runs the transform engine over every detected file and
//! reports what a real run would do, without writing anything.
//!
//! # Design
//!
//! 1. Jobs are listed from [`ProjectFiles`](sm_core::ProjectFiles): manifests,
//!    CI files, then sources, each list already sorted
//! 2. Jobs run on a bounded rayon pool; each worker thread owns a
//!    [`Transformer`] via `for_each_init()`
//! 3. Each job's [`FileOutcome`] goes through a bounded channel to one reducer
//!    thread, the only writer of the aggregates
//! 4. The reducer folds outcomes strictly in job order, buffering early
//!    arrivals, so repeated runs produce identical reports

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use crossbeam_channel::{Receiver, bounded};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sm_core::mapping::dependencies::PlatformDependency;
use sm_core::mapping::target::{TARGET_CONFIG_FILE, ci_substitutions};
use sm_core::{
    ChangeKind, CodeChangeKind, DetectionResult, FxHashMap, ProposedChange, ScanConfig,
    TransformationWarning, WarningLog, fx_hash_map,
};
use sm_syntax::{SourceLanguage, Transformer};
use tracing::{debug, info, warn};

use crate::error::ScanError;
use crate::manifest::{Manifest, ManifestKind};
use crate::stats::AnalysisStats;

/// Outcomes buffered between workers and the reducer.
const CHANNEL_CAPACITY: usize = 64;

/// What a real migration run would do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Files the run would generate.
    pub files_to_create: Vec<Utf8PathBuf>,
    /// Existing files the run would rewrite.
    pub files_to_modify: Vec<Utf8PathBuf>,
    /// Snapshot constructs that would be migrated.
    pub snapshot_count: usize,
    /// Every warning, in file order then line order.
    pub warnings: WarningLog,
    /// Structural changes followed by one `INFO` change per warning.
    pub changes: Vec<ProposedChange>,
    /// Run statistics.
    pub stats: AnalysisStats,
}

impl AnalysisReport {
    /// Every path a real run would write, creations first.
    pub fn planned_paths(&self) -> impl Iterator<Item = &Utf8PathBuf> {
        self.files_to_create.iter().chain(&self.files_to_modify)
    }

    /// Returns `true` if the run would change nothing on disk.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files_to_create.is_empty() && self.files_to_modify.is_empty()
    }
}

/// One unit of per-file work.
#[derive(Debug)]
enum Job<'a> {
    Manifest(&'a Utf8Path),
    Ci(&'a Utf8Path),
    Source(&'a Utf8Path, SourceLanguage),
}

impl Job<'_> {
    fn path(&self) -> &Utf8Path {
        match self {
            Self::Manifest(path) | Self::Ci(path) | Self::Source(path, _) => path,
        }
    }
}

/// The result of examining one file.
#[derive(Debug, Default)]
struct FileOutcome {
    path: Utf8PathBuf,
    /// Description of the rewrite, when the file would change.
    modify: Option<String>,
    snapshots: usize,
    warnings: Vec<TransformationWarning>,
    parse_failed: bool,
    removed: u64,
}

/// Aggregates owned by the reducer.
#[derive(Debug, Default)]
struct Aggregate {
    files_to_modify: Vec<Utf8PathBuf>,
    changes: Vec<ProposedChange>,
    snapshot_count: usize,
    warnings: WarningLog,
    stats: AnalysisStats,
}

impl Aggregate {
    fn fold(&mut self, outcome: FileOutcome) {
        self.stats.files_scanned += 1;
        self.stats.removed_calls += outcome.removed;
        if outcome.parse_failed {
            self.stats.parse_failures += 1;
        }
        if let Some(description) = outcome.modify {
            self.stats.files_with_changes += 1;
            self.files_to_modify.push(outcome.path.clone());
            self.changes
                .push(ProposedChange::new(&outcome.path, ChangeKind::Modify, description));
        }
        self.snapshot_count += outcome.snapshots;
        self.warnings.extend_for_file(&outcome.path, outcome.warnings);
    }
}

/// Folds outcomes in job order; early arrivals wait in `pending`.
fn reduce(rx: &Receiver<(usize, FileOutcome)>) -> Aggregate {
    let mut aggregate = Aggregate::default();
    let mut pending: FxHashMap<usize, FileOutcome> = fx_hash_map();
    let mut next = 0;

    for (index, outcome) in rx {
        pending.insert(index, outcome);
        while let Some(outcome) = pending.remove(&next) {
            aggregate.fold(outcome);
            next += 1;
        }
    }

    if !pending.is_empty() {
        warn!(missing = next, buffered = pending.len(), "analysis outcomes out of sequence");
        let mut rest: Vec<(usize, FileOutcome)> = pending.into_iter().collect();
        rest.sort_by_key(|(index, _)| *index);
        for (_, outcome) in rest {
            aggregate.fold(outcome);
        }
    }

    aggregate
}

/// Computes the changes a migration would make, without writing.
#[derive(Debug, Clone, Default)]
pub struct DryRunAnalyzer {
    max_parallel_jobs: Option<usize>,
}

impl DryRunAnalyzer {
    /// Creates an analyzer using the scan settings.
    #[must_use]
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            max_parallel_jobs: config.max_parallel_jobs,
        }
    }

    /// Analyzes every file in `detection`.
    ///
    /// Per-file failures become warnings; the only errors are failures to
    /// start the worker pool or reducer.
    pub fn analyze(&self, detection: &DetectionResult) -> Result<AnalysisReport, ScanError> {
        let jobs = plan_jobs(detection);
        debug!(jobs = jobs.len(), "analysis planned");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_parallel_jobs.unwrap_or(0))
            .thread_name(|i| format!("sm-analyze-{i}"))
            .build()
            .map_err(|e| ScanError::config(format!("cannot start analysis workers: {e}")))?;

        let (tx, rx) = bounded::<(usize, FileOutcome)>(CHANNEL_CAPACITY);

        let aggregate = std::thread::scope(|scope| {
            let reducer = scope.spawn(move || reduce(&rx));

            pool.install(|| {
                jobs.par_iter().enumerate().for_each_init(
                    || (Transformer::new(), tx.clone()),
                    |(transformer, tx), (index, job)| {
                        let outcome = examine(detection, transformer, job);
                        if tx.send((index, outcome)).is_err() {
                            warn!(path = %job.path(), "analysis reducer stopped early");
                        }
                    },
                );
            });
            drop(tx);

            reducer.join()
        })
        .map_err(|_| ScanError::config("analysis reducer stopped unexpectedly"))?;

        let report = assemble(detection, aggregate);
        info!(
            platform = %detection.platform,
            create = report.files_to_create.len(),
            modify = report.files_to_modify.len(),
            snapshots = report.snapshot_count,
            warnings = report.warnings.len(),
            "dry run complete"
        );
        Ok(report)
    }
}

fn plan_jobs(detection: &DetectionResult) -> Vec<Job<'_>> {
    let files = &detection.files;
    let mut jobs: Vec<Job<'_>> = Vec::with_capacity(files.len());
    jobs.extend(files.manifests.iter().map(|p| Job::Manifest(p)));
    jobs.extend(files.ci.iter().map(|p| Job::Ci(p)));
    for path in &files.source {
        match SourceLanguage::from_path(path) {
            Some(language) => jobs.push(Job::Source(path, language)),
            None => debug!(path = %path, "no grammar for source file"),
        }
    }
    jobs
}

fn examine(detection: &DetectionResult, transformer: &mut Transformer, job: &Job<'_>) -> FileOutcome {
    let path = job.path();
    let mut outcome = FileOutcome {
        path: path.to_owned(),
        ..FileOutcome::default()
    };

    let text = match fs::read_to_string(detection.absolute(path)) {
        Ok(text) => text,
        Err(err) => {
            warn!(path = %path, error = %err, "cannot read file");
            outcome.warnings.push(
                TransformationWarning::new("file could not be read; left unchanged")
                    .with_details(err.to_string()),
            );
            return outcome;
        }
    };

    match job {
        Job::Source(_, language) => {
            let out = transformer.transform(*language, &text, detection.platform, detection.framework);
            if out.is_modified() || (!out.warnings.is_empty() && !out.parse_failed) {
                outcome.modify = Some(describe_source(out.snapshot_count, out.changes.len()));
            }
            outcome.snapshots = out.snapshot_count;
            outcome.parse_failed = out.parse_failed;
            outcome.removed = out
                .changes
                .iter()
                .filter(|c| c.kind == CodeChangeKind::Removal)
                .count() as u64;
            outcome.warnings = out.warnings;
        }
        Job::Ci(_) => {
            // Applied in table order so a shorter pattern is not reported
            // inside a longer one already replaced
            let mut rest = text.clone();
            let mut found = Vec::new();
            for s in ci_substitutions(detection.platform) {
                if rest.contains(s.from) {
                    rest = rest.replace(s.from, s.to);
                    found.push(format!("`{}`", s.from));
                }
            }
            if !found.is_empty() {
                outcome.modify = Some(format!("replace {}", found.join(", ")));
            }
        }
        Job::Manifest(_) => match manifest_replacements(detection, path, &text) {
            Ok(replacements) if !replacements.is_empty() => {
                let list: Vec<String> = replacements
                    .iter()
                    .map(|(name, dep)| format!("`{name}` with `{}`", dep.target))
                    .collect();
                outcome.modify = Some(format!("replace {}", list.join(", ")));
            }
            Ok(_) => {}
            Err(err) => outcome.warnings.push(
                TransformationWarning::new("manifest could not be parsed; dependencies left unchanged")
                    .with_details(err.to_string()),
            ),
        },
    }

    outcome
}

/// Dependencies of the detected platform declared in a manifest.
fn manifest_replacements(
    detection: &DetectionResult,
    path: &Utf8Path,
    text: &str,
) -> Result<Vec<(String, &'static PlatformDependency)>, ScanError> {
    let kind = ManifestKind::from_path(path)
        .ok_or_else(|| ScanError::config(format!("not a dependency manifest: {path}")))?;
    let manifest = Manifest::parse(path, kind, text)?;
    Ok(manifest
        .platform_dependencies()
        .filter(|(_, dep)| dep.platform == detection.platform)
        .map(|(name, dep)| (name.to_owned(), dep))
        .collect())
}

fn describe_source(snapshots: usize, edits: usize) -> String {
    let plural = |n: usize, word: &str| {
        if n == 1 {
            format!("{n} {word}")
        } else {
            format!("{n} {word}s")
        }
    };
    format!(
        "migrate {} ({})",
        plural(snapshots, "snapshot call"),
        plural(edits, "edit")
    )
}

fn assemble(detection: &DetectionResult, aggregate: Aggregate) -> AnalysisReport {
    let mut changes = Vec::with_capacity(aggregate.changes.len() + aggregate.warnings.len() + 1);
    let mut files_to_create = Vec::new();

    if !detection.files.config.is_empty() {
        let target = Utf8PathBuf::from(TARGET_CONFIG_FILE);
        let sources: Vec<String> = detection
            .files
            .config
            .iter()
            .map(|p| format!("`{p}`"))
            .collect();
        if detection.absolute(&target).exists() {
            changes.push(ProposedChange::new(
                &target,
                ChangeKind::Info,
                format!("`{target}` already exists; left unchanged"),
            ));
        } else {
            changes.push(ProposedChange::new(
                &target,
                ChangeKind::Create,
                format!("generate SmartUI configuration from {}", sources.join(", ")),
            ));
            files_to_create.push(target);
        }
    }

    changes.extend(aggregate.changes);
    changes.extend(aggregate.warnings.iter().map(|w| {
        let mut description = match w.line {
            Some(line) => format!("line {line}: {}", w.message),
            None => w.message.clone(),
        };
        if let Some(details) = &w.details {
            description.push_str(&format!(" ({details})"));
        }
        ProposedChange::new(w.file.clone().unwrap_or_default(), ChangeKind::Info, description)
    }));

    AnalysisReport {
        files_to_create,
        files_to_modify: aggregate.files_to_modify,
        snapshot_count: aggregate.snapshot_count,
        warnings: aggregate.warnings,
        changes,
        stats: aggregate.stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    use sm_core::{Config, Platform};
    use tempfile::TempDir;

    use crate::Detector;

    fn project(files: &[(&str, &str)]) -> (TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).expect("utf8 tempdir");
        for (path, content) in files {
            let path = root.join(path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("mkdir");
            }
            fs::write(path, content).expect("write");
        }
        (dir, root)
    }

    fn analyze(root: &Utf8Path) -> (DetectionResult, AnalysisReport) {
        let config = Config::default();
        let detection = Detector::new(&config).detect(root).expect("detect");
        let report = DryRunAnalyzer::new(&config.scan)
            .analyze(&detection)
            .expect("analyze");
        (detection, report)
    }

    const PACKAGE_JSON: &str = r#"{
  "devDependencies": {
    "@percy/cli": "^1.28.0",
    "@percy/playwright": "^1.0.4",
    "@playwright/test": "^1.40.0"
  }
}
"#;

    fn scenario() -> (TempDir, Utf8PathBuf) {
        project(&[
            ("package.json", PACKAGE_JSON),
            (
                "tests/home.spec.js",
                "const percySnapshot = require('@percy/playwright');\n\
                 test('home', async ({ page }) => {\n  await percySnapshot(page, 'Home');\n});\n",
            ),
            (
                "tests/cart.spec.js",
                "const percySnapshot = require('@percy/playwright');\n\
                 test('cart', async ({ page }) => {\n  await percySnapshot(page, 'Cart', { widths: [375, 1280] });\n});\n",
            ),
            ("tests/util.js", "module.exports = { wait: () => {} };\n"),
        ])
    }

    #[test]
    fn test_example_scenario() {
        let (_dir, root) = scenario();
        let (detection, report) = analyze(&root);

        assert_eq!(detection.platform, Platform::Percy);
        assert_eq!(
            report.files_to_modify,
            vec![
                Utf8PathBuf::from("package.json"),
                Utf8PathBuf::from("tests/cart.spec.js"),
                Utf8PathBuf::from("tests/home.spec.js"),
            ]
        );
        assert!(report.files_to_create.is_empty());
        assert_eq!(report.snapshot_count, 2);
        assert_eq!(report.warnings.len(), 1);
        let warning = &report.warnings.as_slice()[0];
        assert!(warning.message.contains("widths"));
        assert_eq!(warning.file.as_deref(), Some(Utf8Path::new("tests/cart.spec.js")));
        assert_eq!(report.stats.files_scanned, 4);
        assert_eq!(report.stats.files_with_changes, 3);

        let info: Vec<&ProposedChange> = report
            .changes
            .iter()
            .filter(|c| c.kind == ChangeKind::Info)
            .collect();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].path, Utf8PathBuf::from("tests/cart.spec.js"));
    }

    #[test]
    fn test_manifest_change_description() {
        let (_dir, root) = scenario();
        let (_, report) = analyze(&root);
        let change = report
            .changes
            .iter()
            .find(|c| c.path == Utf8PathBuf::from("package.json"))
            .expect("manifest change");
        insta::assert_snapshot!(change.description, @"replace `@percy/cli` with `@lambdatest/smartui-cli`, `@percy/playwright` with `@lambdatest/playwright-driver`");
    }

    #[test]
    fn test_dry_run_is_pure_and_deterministic() {
        let (_dir, root) = scenario();
        let stamp = |p: &str| -> SystemTime {
            fs::metadata(root.join(p))
                .and_then(|m| m.modified())
                .expect("mtime")
        };
        let before = (stamp("package.json"), stamp("tests/home.spec.js"));
        let content_before = fs::read_to_string(root.join("tests/home.spec.js")).expect("read");

        let (_, first) = analyze(&root);
        let (_, second) = analyze(&root);

        assert_eq!(first.changes, second.changes);
        assert_eq!(first, second);
        assert_eq!(before, (stamp("package.json"), stamp("tests/home.spec.js")));
        assert_eq!(
            content_before,
            fs::read_to_string(root.join("tests/home.spec.js")).expect("read")
        );
        assert!(!root.join(TARGET_CONFIG_FILE).exists());
    }

    #[test]
    fn test_config_and_ci_changes() {
        let (_dir, root) = project(&[
            ("package.json", r#"{"devDependencies":{"@percy/cli":"1","@percy/cypress":"3","cypress":"13"}}"#),
            (".percy.yml", "version: 2\nsnapshot:\n  widths: [375, 1280]\n"),
            (".github/workflows/visual.yml", "steps:\n  - run: npx percy exec -- cypress run\n    env:\n      PERCY_TOKEN: ${{ secrets.PERCY_TOKEN }}\n"),
            (".github/workflows/lint.yml", "steps:\n  - run: npm run lint\n"),
        ]);
        let (_, report) = analyze(&root);

        assert_eq!(report.files_to_create, vec![Utf8PathBuf::from(".smartui.json")]);
        assert_eq!(report.changes[0].kind, ChangeKind::Create);
        assert!(report.changes[0].description.contains(".percy.yml"));

        let ci = report
            .changes
            .iter()
            .find(|c| c.path == Utf8PathBuf::from(".github/workflows/visual.yml"))
            .expect("ci change");
        insta::assert_snapshot!(ci.description, @"replace `npx percy exec --`, `PERCY_TOKEN`");
        assert!(!report
            .files_to_modify
            .contains(&Utf8PathBuf::from(".github/workflows/lint.yml")));
    }

    #[test]
    fn test_existing_target_config_is_info() {
        let (_dir, root) = project(&[
            (".percy.yml", "version: 2\n"),
            (".smartui.json", "{}\n"),
        ]);
        let (_, report) = analyze(&root);
        assert!(report.files_to_create.is_empty());
        assert_eq!(report.changes[0].kind, ChangeKind::Info);
    }

    #[test]
    fn test_parse_failure_reported_not_modified() {
        let (_dir, root) = project(&[
            ("package.json", r#"{"devDependencies":{"@percy/cli":"1"}}"#),
            ("tests/broken.spec.js", "await percySnapshot(page, 'Home'\n"),
        ]);
        let (_, report) = analyze(&root);
        assert_eq!(report.stats.parse_failures, 1);
        assert!(!report
            .files_to_modify
            .contains(&Utf8PathBuf::from("tests/broken.spec.js")));
        assert!(report
            .changes
            .iter()
            .any(|c| c.kind == ChangeKind::Info && c.path == Utf8PathBuf::from("tests/broken.spec.js")));
    }

    #[test]
    fn test_single_worker_matches_default_pool() {
        let (_dir, root) = scenario();
        let config = Config::default();
        let detection = Detector::new(&config).detect(&root).expect("detect");
        let serial = DryRunAnalyzer::new(&ScanConfig {
            max_parallel_jobs: Some(1),
            ..ScanConfig::default()
        })
        .analyze(&detection)
        .expect("analyze");
        let parallel = DryRunAnalyzer::new(&config.scan)
            .analyze(&detection)
            .expect("analyze");
        assert_eq!(serial, parallel);
    }
}
