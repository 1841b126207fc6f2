//! Text and JSON rendering of command results.

use std::fmt::Write;

use clap::ValueEnum;
use serde::Serialize;
use sm_apply::{ApplyOutcome, Checkpoint, CheckpointSummary, CleanupResult, RollbackResult};
use sm_core::{Candidate, Confidence, DetectionResult, EvidenceSource, TransformationWarning};
use sm_scanner::AnalysisReport;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Renders `value` as JSON, or as text with `text`.
pub fn render<T: Serialize + ?Sized>(
    format: Format,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> color_eyre::Result<String> {
    match format {
        Format::Text => Ok(text(value)),
        Format::Json => {
            let mut json = serde_json::to_string_pretty(value)
                .map_err(|e| color_eyre::eyre::eyre!("Failed to serialize JSON: {}", e))?;
            json.push('\n');
            Ok(json)
        }
    }
}

const fn confidence_label(confidence: Confidence) -> &'static str {
    match confidence {
        Confidence::Low => "low",
        Confidence::Medium => "medium",
        Confidence::High => "high",
    }
}

const fn source_label(source: EvidenceSource) -> &'static str {
    match source {
        EvidenceSource::Manifest => "manifest",
        EvidenceSource::ConfigFile => "config file",
        EvidenceSource::Heuristic => "heuristic",
        EvidenceSource::UserChoice => "user choice",
    }
}

fn warning_line(out: &mut String, warning: &TransformationWarning) {
    let location = match (&warning.file, warning.line) {
        (Some(file), Some(line)) => format!("{file}:{line}: "),
        (Some(file), None) => format!("{file}: "),
        _ => String::new(),
    };
    let _ = write!(out, "  ! {location}{}", warning.message);
    if let Some(details) = &warning.details {
        let _ = write!(out, " ({details})");
    }
    out.push('\n');
}

/// Detection summary with its evidence.
pub fn detection(result: &DetectionResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Platform:   {}", result.platform);
    let _ = writeln!(out, "Framework:  {}", result.framework);
    let _ = writeln!(out, "Language:   {}", result.language);
    let _ = writeln!(out, "Confidence: {}", confidence_label(result.confidence()));
    let _ = writeln!(out);
    let _ = writeln!(out, "Evidence:");
    for evidence in &result.evidence {
        let _ = write!(out, "  [{}] {}", source_label(evidence.source), evidence.matched);
        if let Some(file) = &evidence.file {
            let _ = write!(out, " in {file}");
        }
        out.push('\n');
    }
    let files = &result.files;
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Files: {} source, {} config, {} CI, {} manifest",
        files.source.len(),
        files.config.len(),
        files.ci.len(),
        files.manifests.len()
    );
    out
}

/// Numbered candidate list for choosing a platform.
pub fn candidates(candidates: &[Candidate]) -> String {
    if candidates.is_empty() {
        return "No visual testing platform found.\n".to_owned();
    }
    let mut out = String::new();
    for (index, candidate) in candidates.iter().enumerate() {
        let files: Vec<&str> = candidate.files().iter().map(|f| f.as_str()).collect();
        let _ = writeln!(
            out,
            "{}. {} ({} / {}), {} confidence: {}",
            index + 1,
            candidate.platform,
            candidate.framework,
            candidate.language,
            confidence_label(candidate.confidence),
            files.join(", ")
        );
    }
    out
}

/// Dry-run preview.
pub fn report(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Migration Preview");
    let _ = writeln!(out, "=================");
    let _ = writeln!(out);
    for change in &report.changes {
        let _ = writeln!(out, "{:<6} {}: {}", change.kind.to_string(), change.path, change.description);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Files to create:  {}", report.files_to_create.len());
    let _ = writeln!(out, "Files to modify:  {}", report.files_to_modify.len());
    let _ = writeln!(out, "Snapshots:        {}", report.snapshot_count);
    let _ = writeln!(out, "Warnings:         {}", report.warnings.len());
    let _ = writeln!(
        out,
        "Files scanned:    {} ({} parse failures)",
        report.stats.files_scanned, report.stats.parse_failures
    );
    out
}

pub fn outcome(outcome: &ApplyOutcome) -> String {
    if let Some(preview) = &outcome.preview {
        return report(preview);
    }
    let mut out = String::new();
    let status = if outcome.success { "Migration applied" } else { "Migration failed" };
    let _ = writeln!(out, "{status}");
    for path in &outcome.files_created {
        let _ = writeln!(out, "  + {path}");
    }
    for path in &outcome.files_modified {
        let _ = writeln!(out, "  ~ {path}");
    }
    for path in &outcome.skipped {
        let _ = writeln!(out, "  - {path} (skipped)");
    }
    if !outcome.warnings.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Warnings ({}):", outcome.warnings.len());
        for warning in outcome.warnings.iter() {
            warning_line(&mut out, warning);
        }
    }
    if let Some(error) = &outcome.error {
        let _ = writeln!(out);
        let _ = writeln!(out, "Error: {error}");
    }
    if let Some(result) = &outcome.rollback {
        out.push_str(&rollback(result));
    }
    if let Some(id) = outcome.checkpoint_id.filter(|_| outcome.success) {
        let _ = writeln!(out);
        let _ = writeln!(out, "Checkpoint {id} kept; undo with `smartui-migrate checkpoints rollback {id}`");
    }
    out
}

pub fn rollback(result: &RollbackResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Rollback: {} restored, {} verified, {} failed",
        result.restored.len(),
        result.verified.len(),
        result.failed.len()
    );
    for failure in &result.failed {
        let _ = writeln!(out, "  x {}: {}", failure.path, failure.reason);
    }
    out
}

pub fn cleanup(result: &CleanupResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Removed {} artifact(s)", result.removed.len());
    for path in &result.removed {
        let _ = writeln!(out, "  - {path}");
    }
    for failure in &result.failed {
        let _ = writeln!(out, "  x {}: {}", failure.path, failure.reason);
    }
    out
}

pub fn checkpoint_list(summaries: &[CheckpointSummary]) -> String {
    if summaries.is_empty() {
        return "No checkpoints.\n".to_owned();
    }
    let mut out = String::new();
    for summary in summaries {
        let _ = writeln!(
            out,
            "{}  {}  {:<11}  {} file(s), {} bytes  {}",
            summary.id,
            summary.timestamp.format("%Y-%m-%d %H:%M:%S"),
            summary.state.to_string(),
            summary.file_count,
            summary.total_size,
            summary.description
        );
    }
    out
}

pub fn checkpoint(checkpoint: &Checkpoint) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Checkpoint {}", checkpoint.id);
    let _ = writeln!(out, "  State:       {}", checkpoint.state);
    let _ = writeln!(out, "  Created:     {}", checkpoint.timestamp.to_rfc3339());
    let _ = writeln!(out, "  Description: {}", checkpoint.description);
    if let Some(platform) = checkpoint.metadata.platform {
        let _ = writeln!(out, "  Platform:    {platform}");
    }
    let _ = writeln!(out, "  Mappings:    {}", checkpoint.metadata.mapping_version);
    for backup in checkpoint.backups() {
        let short = backup.checksum.get(..12).unwrap_or(&backup.checksum);
        let _ = writeln!(out, "  = {} ({} bytes, sha256 {short})", backup.path, backup.size);
    }
    for artifact in &checkpoint.artifacts {
        let _ = writeln!(out, "  + {artifact} (created by the run)");
    }
    out
}
