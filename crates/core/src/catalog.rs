use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::settings::DEFAULT_CATALOG_FILE_NAME;

pub const CATALOG_HEADER: &str = "\
# This is an Asset Catalog Definition file for Blender.
#
# Empty lines and lines starting with `#` will be ignored.
# The first non-ignored line should be the version indicator.
# Other lines are of the format \"UUID:catalog/path/for/assets:simple catalog name\"

VERSION 1

";

const SUPPORTED_VERSION: &str = "1";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse catalog line {line_number}: {line:?}")]
    Parse { line_number: usize, line: String },
    #[error("catalog entries appear before the VERSION line")]
    MissingVersion,
    #[error("unsupported catalog version {0:?}")]
    UnsupportedVersion(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCatalog {
    pub id: String,
    pub path: String,
    pub name: String,
}

impl fmt::Display for AssetCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.id, self.path, self.name)
    }
}

enum Line<'a> {
    Ignored,
    Version(&'a str),
    Entry(&'a str),
}

/// Entry lines always hold a `:`, so a version line never does.
fn classify_line(line: &str) -> Line<'_> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() || line.starts_with('#') {
        return Line::Ignored;
    }
    match line.strip_prefix("VERSION") {
        Some(version)
            if !line.contains(':')
                && (version.is_empty() || version.starts_with(char::is_whitespace)) =>
        {
            Line::Version(version.trim())
        }
        _ => Line::Entry(line),
    }
}

/// Folds every colon between the first and the last into `;`.
fn repair_line(line: &str) -> Option<String> {
    let parts: Vec<&str> = line.split(':').collect();
    if parts.len() <= 3 {
        return None;
    }
    let last = parts.len() - 1;
    Some(format!("{}:{}:{}", parts[0], parts[1..last].join(";"), parts[last]))
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .map(|c| if c == ':' { ';' } else { c })
        .collect()
}

/// Ids lose any leading `#` so the written line is not read back as a
/// comment.
fn sanitize_id(value: &str) -> Option<String> {
    let id = sanitize(value);
    let id = id.trim_start_matches('#');
    (!id.trim().is_empty()).then(|| id.to_string())
}

/// Checks the version line against entry lines. Files with neither are
/// treated as empty.
fn check_version(text: &str) -> Result<(), CatalogError> {
    for line in text.lines() {
        match classify_line(line) {
            Line::Ignored => continue,
            Line::Version(version) if version == SUPPORTED_VERSION => return Ok(()),
            Line::Version(version) => {
                return Err(CatalogError::UnsupportedVersion(version.to_string()))
            }
            Line::Entry(_) => return Err(CatalogError::MissingVersion),
        }
    }
    Ok(())
}

fn parse_entries(text: &str) -> Result<Vec<AssetCatalog>, CatalogError> {
    check_version(text)?;
    let mut entries: Vec<AssetCatalog> = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let Line::Entry(line) = classify_line(raw) else {
            continue;
        };
        let mut parts = line.splitn(3, ':');
        let (Some(id), Some(path), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CatalogError::Parse {
                line_number: index + 1,
                line: line.to_string(),
            });
        };
        let entry = AssetCatalog {
            id: id.to_string(),
            path: path.to_string(),
            name: name.to_string(),
        };
        match entries.iter_mut().find(|existing| existing.path == entry.path) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }
    Ok(entries)
}

/// An asset library's catalog definition file, keyed by catalog path.
#[derive(Debug, Clone)]
pub struct AssetCatalogFile {
    path: PathBuf,
    entries: Vec<AssetCatalog>,
}

impl AssetCatalogFile {
    pub fn open(library_dir: &Path) -> Result<Self, CatalogError> {
        Self::open_with_name(library_dir, DEFAULT_CATALOG_FILE_NAME)
    }

    /// Opens `file_name` in `library_dir`, creating it with just the header
    /// when missing and repairing malformed lines before loading.
    pub fn open_with_name(library_dir: &Path, file_name: &str) -> Result<Self, CatalogError> {
        let file_name = if file_name.is_empty() {
            DEFAULT_CATALOG_FILE_NAME
        } else {
            file_name
        };
        let mut catalog = Self {
            path: library_dir.join(file_name),
            entries: Vec::new(),
        };
        catalog.ensure_exists()?;
        catalog.validate_and_repair()?;
        catalog.entries = parse_entries(&catalog.read()?)?;
        tracing::debug!(
            "loaded {} catalogs from {}",
            catalog.entries.len(),
            catalog.path.display()
        );
        Ok(catalog)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CatalogError {
        CatalogError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read(&self) -> Result<String, CatalogError> {
        std::fs::read_to_string(&self.path).map_err(|source| self.io_error(source))
    }

    fn write_text(&self, text: &str) -> Result<(), CatalogError> {
        std::fs::write(&self.path, text).map_err(|source| self.io_error(source))
    }

    /// Creates the file with only the header. Returns whether it was created.
    pub fn ensure_exists(&self) -> Result<bool, CatalogError> {
        if self.path.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        self.write_text(CATALOG_HEADER)?;
        Ok(true)
    }

    /// Rewrites entry lines carrying extra colons. The file is only touched
    /// when a line needed repair; returns whether it was rewritten.
    pub fn validate_and_repair(&self) -> Result<bool, CatalogError> {
        let text = self.read()?;
        check_version(&text)?;

        let mut repaired = false;
        let mut lines = Vec::new();
        for raw in text.lines() {
            let Line::Entry(line) = classify_line(raw) else {
                continue;
            };
            match repair_line(line) {
                Some(fixed) => {
                    tracing::warn!("repaired catalog line {line:?} -> {fixed:?}");
                    repaired = true;
                    lines.push(fixed);
                }
                None => lines.push(line.to_string()),
            }
        }

        if repaired {
            let mut out = CATALOG_HEADER.to_string();
            for line in lines {
                out.push_str(&line);
                out.push('\n');
            }
            self.write_text(&out)?;
        }
        Ok(repaired)
    }

    pub fn entries(&self) -> &[AssetCatalog] {
        &self.entries
    }

    pub fn get(&self, path: &str) -> Option<&AssetCatalog> {
        let key = sanitize(path);
        self.entries.iter().find(|entry| entry.path == key)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&AssetCatalog> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Adds a catalog; `path` defaults to `name` and `id` to a new UUID. An
    /// entry already at the same path is replaced where it stands.
    pub fn add(&mut self, name: &str, path: Option<&str>, id: Option<&str>) -> &AssetCatalog {
        let path = path.filter(|path| !path.is_empty()).unwrap_or(name);
        let id = id
            .and_then(sanitize_id)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let entry = AssetCatalog {
            id,
            path: sanitize(path),
            name: sanitize(name),
        };
        let index = match self.entries.iter().position(|existing| existing.path == entry.path) {
            Some(index) => {
                self.entries[index] = entry;
                index
            }
            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        };
        &self.entries[index]
    }

    pub fn remove(&mut self, path: &str) -> Option<AssetCatalog> {
        let key = sanitize(path);
        let index = self.entries.iter().position(|entry| entry.path == key)?;
        Some(self.entries.remove(index))
    }

    /// Returns the catalog at `path` (default `name`), adding it if missing.
    /// An existing entry keeps its id and name.
    pub fn ensure(&mut self, name: &str, path: Option<&str>) -> &AssetCatalog {
        let key = sanitize(path.filter(|path| !path.is_empty()).unwrap_or(name));
        match self.entries.iter().position(|entry| entry.path == key) {
            Some(index) => &self.entries[index],
            None => self.add(name, Some(key.as_str()), None),
        }
    }

    pub fn merge(&mut self, other: &AssetCatalogFile) {
        for entry in &other.entries {
            match self.entries.iter_mut().find(|existing| existing.path == entry.path) {
                Some(existing) => *existing = entry.clone(),
                None => self.entries.push(entry.clone()),
            }
        }
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn to_text(&self) -> String {
        let mut out = CATALOG_HEADER.to_string();
        for entry in &self.entries {
            out.push_str(&entry.to_string());
            out.push('\n');
        }
        out
    }

    /// Replaces the file with the header and the current entries.
    pub fn write(&self) -> Result<String, CatalogError> {
        let text = self.to_text();
        self.write_text(&text)?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_path(dir: &Path) -> PathBuf {
        dir.join(DEFAULT_CATALOG_FILE_NAME)
    }

    #[test]
    fn missing_file_is_created_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = AssetCatalogFile::open(dir.path()).unwrap();
        assert!(catalog.entries().is_empty());
        let text = std::fs::read_to_string(catalog_path(dir.path())).unwrap();
        assert_eq!(text, CATALOG_HEADER);
    }

    #[test]
    fn custom_file_name_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = AssetCatalogFile::open_with_name(dir.path(), "props.cats.txt").unwrap();
        assert_eq!(catalog.path(), dir.path().join("props.cats.txt"));
        assert!(catalog.path().exists());
    }

    #[test]
    fn written_catalogs_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = AssetCatalogFile::open(dir.path()).unwrap();
        catalog.add("Rocks", None, Some("11111111-1111-1111-1111-111111111111"));
        catalog.add("Rocks-Models", Some("Rocks/Models"), None);
        catalog.add("Temp", None, None);
        catalog.add("Odd: name", Some("Odd/with:colon"), None);
        assert!(catalog.remove("Temp").is_some());

        let dir_b = tempfile::tempdir().unwrap();
        let mut other = AssetCatalogFile::open(dir_b.path()).unwrap();
        other.add("Renamed", Some("Rocks"), Some("22222222-2222-2222-2222-222222222222"));
        other.add("Trees", None, None);
        catalog.merge(&other);

        let text = catalog.write().unwrap();
        assert!(text.starts_with(CATALOG_HEADER));

        let loaded = AssetCatalogFile::open(dir.path()).unwrap();
        assert_eq!(loaded.entries(), catalog.entries());
        let paths: Vec<_> = loaded.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["Rocks", "Rocks/Models", "Odd/with;colon", "Trees"]);
        assert_eq!(loaded.get("Rocks").unwrap().name, "Renamed");
        assert_eq!(loaded.find_by_name("Odd; name").unwrap().path, "Odd/with;colon");
    }

    #[test]
    fn awkward_ids_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = AssetCatalogFile::open(dir.path()).unwrap();
        catalog.add("A", None, Some("#hash"));
        catalog.add("B", None, Some("VERSION2"));
        catalog.add("C", None, Some("VERSION 3"));
        catalog.add("D", None, Some("##"));
        assert_eq!(catalog.get("A").unwrap().id, "hash");
        assert!(Uuid::parse_str(&catalog.get("D").unwrap().id).is_ok());
        catalog.write().unwrap();

        let loaded = AssetCatalogFile::open(dir.path()).unwrap();
        assert_eq!(loaded.entries(), catalog.entries());
        assert_eq!(loaded.get("B").unwrap().id, "VERSION2");
        assert_eq!(loaded.get("C").unwrap().id, "VERSION 3");
    }

    #[test]
    fn lookups_use_the_stored_path_form() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = AssetCatalogFile::open(dir.path()).unwrap();
        catalog.add("Odd", Some("a:b"), None);
        assert_eq!(catalog.get("a:b").unwrap().path, "a;b");
        assert!(catalog.remove("a:b").is_some());
        assert!(catalog.entries().is_empty());
    }

    #[test]
    fn add_replaces_same_path_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = AssetCatalogFile::open(dir.path()).unwrap();
        catalog.add("A", None, None);
        catalog.add("B", None, None);
        catalog.add("A2", Some("A"), Some("fixed"));
        let names: Vec<_> = catalog.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["A2", "B"]);
        assert_eq!(catalog.get("A").unwrap().id, "fixed");
    }

    #[test]
    fn ensure_keeps_existing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = AssetCatalogFile::open(dir.path()).unwrap();
        let first = catalog.ensure("Rocks-Models", Some("Rocks/Models")).id.clone();
        let second = catalog.ensure("Rocks-Models", Some("Rocks/Models")).id.clone();
        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
        assert_eq!(catalog.entries().len(), 1);
    }

    #[test]
    fn reset_clears_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = AssetCatalogFile::open(dir.path()).unwrap();
        catalog.add("A", None, None);
        catalog.reset();
        assert!(catalog.entries().is_empty());
    }

    #[test]
    fn extra_colons_are_repaired_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = catalog_path(dir.path());
        std::fs::write(&path, format!("{CATALOG_HEADER}abc:foo:bar:baz\nid2:ok:Fine\n")).unwrap();

        let catalog = AssetCatalogFile::open(dir.path()).unwrap();
        let entry = &catalog.entries()[0];
        assert_eq!(entry.id, "abc");
        assert_eq!(entry.path, "foo;bar");
        assert_eq!(entry.name, "baz");
        assert_eq!(catalog.entries()[1].path, "ok");

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, format!("{CATALOG_HEADER}abc:foo;bar:baz\nid2:ok:Fine\n"));
    }

    #[test]
    fn clean_file_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = catalog_path(dir.path());
        let original = "# comment\nVERSION 1\n\nid:Rocks:Rocks\n";
        std::fs::write(&path, original).unwrap();

        let catalog = AssetCatalogFile::open(dir.path()).unwrap();
        assert!(!catalog.validate_and_repair().unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn short_line_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            catalog_path(dir.path()),
            "VERSION 1\n\nid:path:name\nbroken-line\n",
        )
        .unwrap();
        match AssetCatalogFile::open(dir.path()) {
            Err(CatalogError::Parse { line_number, line }) => {
                assert_eq!(line_number, 4);
                assert_eq!(line, "broken-line");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn version_line_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        let path = catalog_path(dir.path());

        std::fs::write(&path, "VERSION 2\nid:a:b\n").unwrap();
        assert!(matches!(
            AssetCatalogFile::open(dir.path()),
            Err(CatalogError::UnsupportedVersion(version)) if version == "2"
        ));

        std::fs::write(&path, "# no version\nid:a:b\nVERSION 1\n").unwrap();
        assert!(matches!(
            AssetCatalogFile::open(dir.path()),
            Err(CatalogError::MissingVersion)
        ));
    }
}
