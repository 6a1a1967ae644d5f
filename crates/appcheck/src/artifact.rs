//! Application artifact introspection.
//!
//! Adapters decide whether they can drive an artifact by looking at what it
//! contains: the jar manifest's `Main-Class` and the presence of classes that
//! only exist in one framework family.

use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Location of the jar manifest.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Index of the entries and manifest of an application jar.
#[derive(Debug, Clone)]
pub struct ArtifactIndex {
    path: PathBuf,
    entries: BTreeSet<String>,
    manifest: BTreeMap<String, String>,
}

impl ArtifactIndex {
    /// Read the entry list and main manifest section of a jar.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut archive =
            zip::ZipArchive::new(file).map_err(|e| Error::artifact(path, e.to_string()))?;

        let entries: BTreeSet<String> = archive.file_names().map(str::to_string).collect();

        let manifest = if entries.contains(MANIFEST_PATH) {
            let mut text = String::new();
            archive
                .by_name(MANIFEST_PATH)
                .map_err(|e| Error::artifact(path, e.to_string()))?
                .read_to_string(&mut text)
                .map_err(|e| Error::artifact(path, format!("unreadable manifest: {e}")))?;
            parse_manifest(&text)
        } else {
            BTreeMap::new()
        };

        log::debug!(
            "Indexed {} ({} entries, main class {:?})",
            path.display(),
            entries.len(),
            manifest.get("Main-Class")
        );

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            manifest,
        })
    }

    /// Path of the indexed jar.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the jar contains `entry` (e.g. `io/dropwizard/cli/CheckCommand.class`).
    #[must_use]
    pub fn contains(&self, entry: &str) -> bool {
        self.entries.contains(entry)
    }

    /// Value of a main-section manifest attribute.
    #[must_use]
    pub fn manifest_attribute(&self, name: &str) -> Option<&str> {
        self.manifest.get(name).map(String::as_str)
    }

    /// The `Main-Class` manifest attribute.
    #[must_use]
    pub fn main_class(&self) -> Option<&str> {
        self.manifest_attribute("Main-Class")
    }
}

/// Parse the main section of a jar manifest.
///
/// Lines starting with a single space continue the previous value; the
/// main section ends at the first blank line.
pub fn parse_manifest(text: &str) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    let mut current: Option<(String, String)> = None;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            break;
        }
        if let Some(rest) = line.strip_prefix(' ') {
            if let Some((_, value)) = current.as_mut() {
                value.push_str(rest);
            }
            continue;
        }
        if let Some((name, value)) = current.take() {
            attributes.insert(name, value);
        }
        if let Some((name, value)) = line.split_once(':') {
            current = Some((name.trim().to_string(), value.trim_start().to_string()));
        }
    }
    if let Some((name, value)) = current {
        attributes.insert(name, value);
    }

    attributes
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Write a jar with the given main class and (empty) entries.
    pub(crate) fn write_jar(path: &Path, main_class: Option<&str>, entries: &[&str]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        if let Some(main) = main_class {
            zip.start_file(MANIFEST_PATH, options).unwrap();
            write!(zip, "Manifest-Version: 1.0\r\nMain-Class: {main}\r\n\r\n").unwrap();
        }
        for entry in entries {
            zip.start_file(*entry, options).unwrap();
            zip.write_all(b"\xca\xfe\xba\xbe").unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_parse_manifest_main_section() {
        let text = "Manifest-Version: 1.0\r\nMain-Class: com.example.App\r\n\r\nName: other\r\nMain-Class: ignored\r\n";
        let attrs = parse_manifest(text);
        assert_eq!(attrs.get("Main-Class").map(String::as_str), Some("com.example.App"));
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn test_parse_manifest_continuation_lines() {
        let text = "Main-Class: com.example.very.long.pack\n age.App\nCreated-By: maven\n";
        let attrs = parse_manifest(text);
        assert_eq!(
            attrs.get("Main-Class").map(String::as_str),
            Some("com.example.very.long.package.App")
        );
        assert_eq!(attrs.get("Created-By").map(String::as_str), Some("maven"));
    }

    #[test]
    fn test_open_indexes_entries_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("app.jar");
        write_jar(
            &jar,
            Some("com.example.App"),
            &["io/dropwizard/cli/CheckCommand.class", "com/example/App.class"],
        );

        let index = ArtifactIndex::open(&jar).unwrap();
        assert_eq!(index.main_class(), Some("com.example.App"));
        assert!(index.contains("io/dropwizard/cli/CheckCommand.class"));
        assert!(!index.contains("com/yammer/dropwizard/cli/CheckCommand.class"));
        assert_eq!(index.path(), jar.as_path());
    }

    #[test]
    fn test_open_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("thin.jar");
        write_jar(&jar, None, &["com/example/App.class"]);

        let index = ArtifactIndex::open(&jar).unwrap();
        assert_eq!(index.main_class(), None);
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.jar");
        std::fs::write(&path, b"not a jar").unwrap();

        let result = ArtifactIndex::open(&path);
        assert!(matches!(result, Err(Error::Artifact { .. })));
    }

    #[test]
    fn test_open_missing_file() {
        let result = ArtifactIndex::open(Path::new("/nonexistent/app.jar"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
