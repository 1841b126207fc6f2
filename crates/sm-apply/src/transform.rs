//! Seams for the non-source transformers used while applying a migration.
//!
//! Each trait has a built-in default; callers can inject their own through
//! [`ApplyManagerBuilder`](crate::ApplyManagerBuilder).

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::json;
use sm_core::mapping::target::substitute_ci;
use sm_core::{DetectionResult, Platform, TestType, TransformationWarning};
use sm_scanner::{Manifest, ManifestKind};

use crate::error::ApplyError;

/// Viewport widths used when no platform configuration declares any.
pub const DEFAULT_VIEWPORTS: [u32; 3] = [1920, 1366, 1028];

/// Browsers SmartUI renders web snapshots in.
const BROWSERS: [&str; 4] = ["chrome", "firefox", "safari", "edge"];

/// Decides whether a planned file is written.
pub trait FileConfirmation: Send + Sync {
    /// Returns `true` to write `path`.
    fn confirm(&self, path: &Utf8Path, description: &str) -> bool;
}

/// Confirms every file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmAll;

impl FileConfirmation for ConfirmAll {
    fn confirm(&self, _path: &Utf8Path, _description: &str) -> bool {
        true
    }
}

/// Produces the SmartUI project configuration.
pub trait ConfigTransformer: Send + Sync {
    /// Generates `.smartui.json` from the platform configuration files,
    /// given as `(path, content)` pairs.
    fn generate(
        &self,
        detection: &DetectionResult,
        sources: &[(Utf8PathBuf, String)],
    ) -> Result<String, ApplyError>;
}

/// Rewrites CI pipeline definitions.
pub trait CiTransformer: Send + Sync {
    /// Returns the new text, or `None` when nothing applies.
    fn transform(&self, platform: Platform, text: &str) -> Option<String>;
}

/// Replaces platform dependencies in a manifest.
pub trait ManifestTransformer: Send + Sync {
    /// Returns the rewritten manifest with any warnings.
    fn transform(
        &self,
        detection: &DetectionResult,
        path: &Utf8Path,
        text: &str,
    ) -> Result<ManifestEdit, ApplyError>;
}

/// Result of a manifest rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestEdit {
    /// New manifest text.
    pub content: String,
    /// Dependencies left in place.
    pub warnings: Vec<TransformationWarning>,
}

/// Builds `.smartui.json` with `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartUiConfig;

impl ConfigTransformer for SmartUiConfig {
    fn generate(
        &self,
        detection: &DetectionResult,
        sources: &[(Utf8PathBuf, String)],
    ) -> Result<String, ApplyError> {
        let mut widths: Vec<u32> = Vec::new();
        for (_, text) in sources {
            for width in declared_widths(text) {
                if !widths.contains(&width) {
                    widths.push(width);
                }
            }
        }
        if widths.is_empty() {
            widths.extend(DEFAULT_VIEWPORTS);
        }
        let viewports: Vec<[u32; 1]> = widths.iter().map(|w| [*w]).collect();

        let mut config = json!({
            "web": {
                "browsers": BROWSERS,
                "viewports": viewports,
            },
            "waitForPageRender": 50_000,
            "waitForTimeout": 1_000,
        });
        if detection.test_type == TestType::Appium {
            config["mobile"] = json!({
                "devices": ["iPhone 14", "Galaxy S23"],
                "fullPage": true,
                "orientation": "portrait",
            });
        }

        let mut text = serde_json::to_string_pretty(&config)
            .map_err(|e| ApplyError::transform(sm_core::mapping::target::TARGET_CONFIG_FILE, e))?;
        text.push('\n');
        Ok(text)
    }
}

/// Integers listed under a `widths` key, in YAML flow or block style or as
/// a JSON/JS array.
fn declared_widths(text: &str) -> Vec<u32> {
    let mut widths = Vec::new();
    let mut rest = text;
    while let Some(at) = rest.find("widths") {
        rest = &rest[at + "widths".len()..];
        let value = rest.trim_start_matches(|c: char| c == '"' || c == '\'' || c == ':' || c == '=' || c == ' ');
        if let Some(list) = value.strip_prefix('[') {
            let end = list.find(']').unwrap_or(list.len());
            widths.extend(list[..end].split(',').filter_map(|n| n.trim().parse::<u32>().ok()));
        } else {
            for line in value.lines().skip(1) {
                let Some(item) = line.trim().strip_prefix('-') else {
                    break;
                };
                match item.trim().parse::<u32>() {
                    Ok(n) => widths.push(n),
                    Err(_) => break,
                }
            }
        }
    }
    widths
}

/// Applies the keyed CI substitutions from the mapping table.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyedCiSubstitution;

impl CiTransformer for KeyedCiSubstitution {
    fn transform(&self, platform: Platform, text: &str) -> Option<String> {
        substitute_ci(platform, text)
    }
}

/// Renames platform dependencies to their SmartUI replacements in place,
/// keeping version constraints and formatting.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyRenamer;

impl ManifestTransformer for DependencyRenamer {
    fn transform(
        &self,
        detection: &DetectionResult,
        path: &Utf8Path,
        text: &str,
    ) -> Result<ManifestEdit, ApplyError> {
        let kind = ManifestKind::from_path(path)
            .ok_or_else(|| ApplyError::transform(path, "not a dependency manifest"))?;
        let manifest = Manifest::parse(path, kind, text).map_err(|e| ApplyError::transform(path, e))?;

        let mut declared: Vec<&str> = manifest.dependencies.iter().map(String::as_str).collect();
        let mut edit = ManifestEdit {
            content: text.to_owned(),
            warnings: Vec::new(),
        };

        let replacements: Vec<(&str, &'static str)> = manifest
            .platform_dependencies()
            .filter(|(_, dep)| dep.platform == detection.platform)
            .map(|(name, dep)| (name, dep.target))
            .collect();

        for (name, target) in replacements {
            if declared.contains(&target) {
                edit.warnings.push(
                    TransformationWarning::new(format!("`{name}` left in place; `{target}` is already declared"))
                        .with_details("remove it by hand once no test imports it"),
                );
                continue;
            }
            let renamed = match kind {
                ManifestKind::MavenPom => rename_pom_dependency(&edit.content, name, target),
                ManifestKind::PackageJson => {
                    let quoted = format!("\"{name}\"");
                    edit.content
                        .contains(&quoted)
                        .then(|| edit.content.replace(&quoted, &format!("\"{target}\"")))
                }
                ManifestKind::Requirements | ManifestKind::Pyproject | ManifestKind::Gradle => {
                    replace_token(&edit.content, name, target)
                }
            };
            match renamed {
                Some(content) => {
                    edit.content = content;
                    declared.push(target);
                }
                None => edit.warnings.push(TransformationWarning::new(format!(
                    "`{name}` could not be located for renaming; left unchanged"
                ))),
            }
        }
        Ok(edit)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/' | '@')
}

/// Replaces every whole-token occurrence of `name`.
fn replace_token(text: &str, name: &str, target: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut replaced = false;
    for (at, _) in text.match_indices(name) {
        let before = text[..at].chars().next_back();
        let after = text[at + name.len()..].chars().next();
        let bounded = !before.is_some_and(|c| is_name_char(c) || c == ':')
            && !after.is_some_and(is_name_char);
        if bounded && at >= last {
            out.push_str(&text[last..at]);
            out.push_str(target);
            last = at + name.len();
            replaced = true;
        }
    }
    out.push_str(&text[last..]);
    replaced.then_some(out)
}

/// Rewrites the `<dependency>` block declaring `group:artifact`.
fn rename_pom_dependency(text: &str, name: &str, target: &str) -> Option<String> {
    let (group, artifact) = name.split_once(':')?;
    let (new_group, new_artifact) = target.split_once(':')?;
    let artifact_tag = format!("<artifactId>{artifact}</artifactId>");
    let group_tag = format!("<groupId>{group}</groupId>");

    let mut search = 0;
    while let Some(found) = text[search..].find(&artifact_tag) {
        let at = search + found;
        let start = text[..at].rfind("<dependency>")?;
        let end = text[at..].find("</dependency>").map_or(text.len(), |e| at + e);
        let block = &text[start..end];
        if block.contains(&group_tag) {
            let rewritten = block
                .replacen(&group_tag, &format!("<groupId>{new_group}</groupId>"), 1)
                .replacen(&artifact_tag, &format!("<artifactId>{new_artifact}</artifactId>"), 1);
            return Some(format!("{}{rewritten}{}", &text[..start], &text[end..]));
        }
        search = at + artifact_tag.len();
    }
    None
}
