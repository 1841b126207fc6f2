//! Dependency manifest readers, one per ecosystem file format.
//!
//! Each reader returns dependency names exactly as declared. Java names are
//! `groupId:artifactId`. Versions, extras and markers are dropped.

use camino::{Utf8Path, Utf8PathBuf};
use quick_xml::Reader;
use quick_xml::events::Event;
use sm_core::Language;
use sm_core::mapping::dependencies::{PlatformDependency, platform_dependency};
use sm_core::mapping::files::manifest_names;

use crate::error::ScanError;

/// Manifest file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestKind {
    /// npm `package.json`.
    PackageJson,
    /// pip requirements file.
    Requirements,
    /// `pyproject.toml` (PEP 621 or Poetry).
    Pyproject,
    /// Maven `pom.xml`.
    MavenPom,
    /// Gradle build script, Groovy or Kotlin.
    Gradle,
}

impl ManifestKind {
    /// Recognizes a manifest by file name.
    #[must_use]
    pub fn from_path(path: &Utf8Path) -> Option<Self> {
        match path.file_name()? {
            "package.json" => Some(Self::PackageJson),
            "pyproject.toml" => Some(Self::Pyproject),
            "pom.xml" => Some(Self::MavenPom),
            "build.gradle" | "build.gradle.kts" => Some(Self::Gradle),
            name if manifest_names(Language::Python).contains(&name) => Some(Self::Requirements),
            _ => None,
        }
    }

    /// Ecosystem the format belongs to.
    #[must_use]
    pub const fn language(self) -> Language {
        match self {
            Self::PackageJson => Language::JavaScript,
            Self::Requirements | Self::Pyproject => Language::Python,
            Self::MavenPom | Self::Gradle => Language::Java,
        }
    }
}

/// A parsed dependency manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Path relative to the project root.
    pub path: Utf8PathBuf,
    /// File format.
    pub kind: ManifestKind,
    /// Declared dependency names, in declaration order, without duplicates.
    pub dependencies: Vec<String>,
}

impl Manifest {
    /// Reads and parses `root/relative`.
    ///
    /// # Errors
    ///
    /// [`ScanError::Config`] if the file name is not a known manifest,
    /// [`ScanError::Read`] if it cannot be read and [`ScanError::Manifest`]
    /// if it does not parse.
    pub fn read(root: &Utf8Path, relative: &Utf8Path) -> Result<Self, ScanError> {
        let kind = ManifestKind::from_path(relative)
            .ok_or_else(|| ScanError::config(format!("not a dependency manifest: {relative}")))?;
        let text = std::fs::read_to_string(root.join(relative))
            .map_err(|e| ScanError::read(relative, e))?;
        Self::parse(relative, kind, &text)
    }

    /// Parses manifest text.
    ///
    /// # Errors
    ///
    /// [`ScanError::Manifest`] if the text is not valid for `kind`.
    pub fn parse(path: &Utf8Path, kind: ManifestKind, text: &str) -> Result<Self, ScanError> {
        let names = match kind {
            ManifestKind::PackageJson => parse_package_json(text),
            ManifestKind::Requirements => Ok(parse_requirements(text)),
            ManifestKind::Pyproject => parse_pyproject(text),
            ManifestKind::MavenPom => parse_pom(text),
            ManifestKind::Gradle => Ok(parse_gradle(text)),
        }
        .map_err(|reason| ScanError::manifest(path, reason))?;

        let mut dependencies: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            if !dependencies.contains(&name) {
                dependencies.push(name);
            }
        }

        Ok(Self {
            path: path.to_owned(),
            kind,
            dependencies,
        })
    }

    /// Ecosystem of the manifest.
    #[must_use]
    pub const fn language(&self) -> Language {
        self.kind.language()
    }

    /// Declared dependencies that identify a source platform.
    pub fn platform_dependencies(
        &self,
    ) -> impl Iterator<Item = (&str, &'static PlatformDependency)> + '_ {
        let language = self.language();
        self.dependencies
            .iter()
            .filter_map(move |name| platform_dependency(language, name).map(|d| (name.as_str(), d)))
    }
}

const NPM_SECTIONS: [&str; 4] = [
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

fn parse_package_json(text: &str) -> Result<Vec<String>, String> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    Ok(NPM_SECTIONS
        .iter()
        .filter_map(|section| value.get(section).and_then(serde_json::Value::as_object))
        .flat_map(|deps| deps.keys().cloned())
        .collect())
}

/// Extracts the distribution name from a PEP 508 requirement.
fn requirement_name(spec: &str) -> Option<&str> {
    let spec = spec.split('#').next()?.trim();
    if spec.is_empty() || spec.starts_with('-') {
        return None;
    }
    let end = spec
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        .unwrap_or(spec.len());
    let name = &spec[..end];
    // Bare URLs and paths carry no name
    if name.is_empty() || spec[end..].starts_with("://") || spec[end..].starts_with('/') {
        return None;
    }
    Some(name)
}

fn parse_requirements(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(requirement_name)
        .map(ToOwned::to_owned)
        .collect()
}

fn parse_pyproject(text: &str) -> Result<Vec<String>, String> {
    let table: toml::Table = text.parse().map_err(|e: toml::de::Error| e.to_string())?;
    let mut names = Vec::new();

    let pep508 = |value: &toml::Value, names: &mut Vec<String>| {
        for spec in value.as_array().into_iter().flatten().filter_map(toml::Value::as_str) {
            if let Some(name) = requirement_name(spec) {
                names.push(name.to_owned());
            }
        }
    };

    if let Some(project) = table.get("project").and_then(toml::Value::as_table) {
        if let Some(deps) = project.get("dependencies") {
            pep508(deps, &mut names);
        }
        if let Some(extras) = project.get("optional-dependencies").and_then(toml::Value::as_table) {
            for deps in extras.values() {
                pep508(deps, &mut names);
            }
        }
    }

    let poetry = table
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .and_then(toml::Value::as_table);
    if let Some(poetry) = poetry {
        let mut sections: Vec<&toml::Table> = ["dependencies", "dev-dependencies"]
            .iter()
            .filter_map(|key| poetry.get(*key).and_then(toml::Value::as_table))
            .collect();
        if let Some(groups) = poetry.get("group").and_then(toml::Value::as_table) {
            sections.extend(
                groups
                    .values()
                    .filter_map(|g| g.get("dependencies").and_then(toml::Value::as_table)),
            );
        }
        names.extend(
            sections
                .into_iter()
                .flat_map(toml::Table::keys)
                .filter(|name| *name != "python")
                .cloned(),
        );
    }

    Ok(names)
}

fn parse_pom(text: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut group: Option<String> = None;
    let mut artifact: Option<String> = None;
    let mut names = Vec::new();

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                if name == b"dependency" {
                    group = None;
                    artifact = None;
                }
                stack.push(name);
            }
            Event::End(e) => {
                stack.pop();
                if e.name().as_ref() == b"dependency" {
                    if let (Some(g), Some(a)) = (group.take(), artifact.take()) {
                        names.push(format!("{g}:{a}"));
                    }
                }
            }
            Event::Text(t) => {
                let in_dependency = stack.iter().rev().nth(1).is_some_and(|p| p == b"dependency");
                if !in_dependency {
                    continue;
                }
                let value = t.unescape().map_err(|e| e.to_string())?.trim().to_owned();
                match stack.last().map(Vec::as_slice) {
                    Some(b"groupId") => group = Some(value),
                    Some(b"artifactId") => artifact = Some(value),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(names)
}

/// Quoted string literals on one line.
fn quoted(line: &str) -> impl Iterator<Item = &str> {
    let mut rest = line;
    std::iter::from_fn(move || {
        let open = rest.find(['\'', '"'])?;
        let quote = rest[open..].chars().next()?;
        let body = &rest[open + 1..];
        let close = body.find(quote)?;
        rest = &body[close + 1..];
        Some(&body[..close])
    })
}

fn is_coordinate_part(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

fn parse_gradle(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("//"))
        .flat_map(quoted)
        .filter_map(|literal| {
            let mut parts = literal.split(':');
            let group = parts.next()?;
            let artifact = parts.next()?;
            (is_coordinate_part(group) && is_coordinate_part(artifact))
                .then(|| format!("{group}:{artifact}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sm_core::Platform;

    fn parse(name: &str, text: &str) -> Manifest {
        let path = Utf8Path::new(name);
        let kind = ManifestKind::from_path(path).expect("manifest kind");
        Manifest::parse(path, kind, text).expect("parse")
    }

    #[test]
    fn test_kind_from_path() {
        assert_eq!(
            ManifestKind::from_path(Utf8Path::new("web/package.json")),
            Some(ManifestKind::PackageJson)
        );
        assert_eq!(
            ManifestKind::from_path(Utf8Path::new("requirements-dev.txt")),
            Some(ManifestKind::Requirements)
        );
        assert_eq!(
            ManifestKind::from_path(Utf8Path::new("build.gradle.kts")),
            Some(ManifestKind::Gradle)
        );
        assert_eq!(ManifestKind::from_path(Utf8Path::new("Cargo.toml")), None);
    }

    #[test]
    fn test_package_json_sections() {
        let manifest = parse(
            "package.json",
            r#"{
  "name": "shop",
  "dependencies": { "react": "^18.0.0" },
  "devDependencies": { "@percy/cli": "^1.28.0", "@percy/cypress": "^3.1.0", "cypress": "^13.0.0" },
  "peerDependencies": { "react": "^18.0.0" }
}"#,
        );
        assert_eq!(
            manifest.dependencies,
            vec!["react", "@percy/cli", "@percy/cypress", "cypress"]
        );
        let platforms: Vec<Platform> = manifest
            .platform_dependencies()
            .map(|(_, dep)| dep.platform)
            .collect();
        assert_eq!(platforms, vec![Platform::Percy, Platform::Percy]);
    }

    #[test]
    fn test_package_json_invalid() {
        let err = Manifest::parse(Utf8Path::new("package.json"), ManifestKind::PackageJson, "{ nope");
        assert!(matches!(err, Err(ScanError::Manifest { .. })));
    }

    #[test]
    fn test_requirements_lines() {
        let manifest = parse(
            "requirements.txt",
            "# visual tests\n-r base.txt\nselenium>=4.10\npercy-selenium[extra]==2.0.1 ; python_version>'3.8'\n\
             eyes_selenium ~= 5.0  # pinned\n--index-url https://pypi.org/simple\nhttps://example.com/pkg.whl\n",
        );
        assert_eq!(
            manifest.dependencies,
            vec!["selenium", "percy-selenium", "eyes_selenium"]
        );
        assert_eq!(manifest.platform_dependencies().count(), 2);
    }

    #[test]
    fn test_pyproject_pep621_and_poetry() {
        let manifest = parse(
            "pyproject.toml",
            r#"
[project]
name = "shop-tests"
dependencies = ["playwright>=1.40", "percy-playwright==1.0"]

[project.optional-dependencies]
dev = ["pytest"]

[tool.poetry.dependencies]
python = "^3.11"
requests = "*"

[tool.poetry.group.test.dependencies]
pytest-playwright = "*"
"#,
        );
        assert_eq!(
            manifest.dependencies,
            vec![
                "playwright",
                "percy-playwright",
                "pytest",
                "requests",
                "pytest-playwright"
            ]
        );
    }

    #[test]
    fn test_pom_dependencies() {
        let manifest = parse(
            "pom.xml",
            r"<project>
  <groupId>com.shop</groupId>
  <artifactId>shop-tests</artifactId>
  <dependencies>
    <dependency>
      <groupId>org.seleniumhq.selenium</groupId>
      <artifactId>selenium-java</artifactId>
      <version>4.18.1</version>
    </dependency>
    <dependency>
      <groupId>com.applitools</groupId>
      <artifactId>eyes-selenium-java5</artifactId>
    </dependency>
  </dependencies>
</project>",
        );
        assert_eq!(
            manifest.dependencies,
            vec![
                "org.seleniumhq.selenium:selenium-java",
                "com.applitools:eyes-selenium-java5"
            ]
        );
    }

    #[test]
    fn test_gradle_coordinates() {
        let manifest = parse(
            "build.gradle",
            "dependencies {\n    // testImplementation 'io.percy:percy-appium-app:1.0'\n    \
             testImplementation 'io.percy:percy-java-selenium:2.0.0'\n    \
             implementation(\"org.seleniumhq.selenium:selenium-java:4.18.1\")\n    \
             println \"done: ok\"\n}\n",
        );
        assert_eq!(
            manifest.dependencies,
            vec![
                "io.percy:percy-java-selenium",
                "org.seleniumhq.selenium:selenium-java"
            ]
        );
    }
}
