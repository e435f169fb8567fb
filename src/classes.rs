//! Class names and class count.
//!
//! Names come from a newline-delimited names file, either given directly or
//! referenced from a `key = value` dataset file (`classes`, `names` keys).
//! Without names, class ids are displayed as numbers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ClassError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: expected 'key = value', got '{content}'")]
    InvalidDataLine { line: usize, content: String },

    #[error("Invalid class count '{0}'")]
    InvalidClassCount(String),
}

impl ClassError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Class count plus optional display names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCatalog {
    count: u32,
    names: Vec<String>,
}

impl ClassCatalog {
    /// Classes `0..count` shown by number.
    pub fn numeric(count: u32) -> Self {
        Self {
            count: count.max(1),
            names: Vec::new(),
        }
    }

    /// One class per name.
    pub fn from_names(names: Vec<String>) -> Self {
        let count = u32::try_from(names.len()).unwrap_or(u32::MAX).max(1);
        Self { count, names }
    }

    /// Override the number of classes cycled through, keeping the names.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count.max(1);
        self
    }

    /// Number of classes the active class cycles through (at least 1).
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Display label for a class id: its name, or the id itself.
    pub fn label(&self, class_id: u32) -> String {
        usize::try_from(class_id)
            .ok()
            .and_then(|idx| self.names.get(idx))
            .cloned()
            .unwrap_or_else(|| class_id.to_string())
    }

    /// Build the catalog from the command-line sources.
    ///
    /// A names file wins over a dataset file; a dataset file wins over
    /// `default_count`. Unreadable sources are logged and skipped.
    pub fn resolve(names_file: Option<&Path>, data_file: Option<&Path>, default_count: u32) -> Self {
        if let Some(path) = names_file {
            match read_names(path) {
                Ok(names) => {
                    log::info!("Loaded {} class names from {:?}", names.len(), path);
                    return Self::from_names(names);
                }
                Err(e) => log::warn!("{}", e),
            }
        }

        if let Some(path) = data_file {
            match DataFile::read(path) {
                Ok(data) => {
                    if let Some(catalog) = data.catalog() {
                        return catalog;
                    }
                    log::warn!("Dataset file {:?} names no classes", path);
                }
                Err(e) => log::warn!("Error reading dataset file: {}", e),
            }
        }

        Self::numeric(default_count)
    }
}

/// Read a names file: one name per line, trailing whitespace trimmed.
///
/// Blank lines at the end of the file are dropped; blank lines in between
/// keep their slot so later names stay aligned with their ids.
pub fn read_names(path: &Path) -> Result<Vec<String>, ClassError> {
    let content = std::fs::read_to_string(path).map_err(|e| ClassError::io(path, e))?;
    Ok(parse_names(&content))
}

pub fn parse_names(content: &str) -> Vec<String> {
    let mut names: Vec<String> = content.lines().map(|l| l.trim_end().to_string()).collect();
    while names.last().is_some_and(|name| name.is_empty()) {
        names.pop();
    }
    names
}

// ============================================================================
// Dataset file
// ============================================================================

/// Parsed `key = value` dataset description.
#[derive(Debug, Clone, Default)]
pub struct DataFile {
    entries: HashMap<String, String>,
    /// Directory relative `names` paths are also looked up in
    base_dir: Option<PathBuf>,
}

impl DataFile {
    pub fn read(path: &Path) -> Result<Self, ClassError> {
        let content = std::fs::read_to_string(path).map_err(|e| ClassError::io(path, e))?;
        let mut data = Self::parse(&content)?;
        data.base_dir = path.parent().map(Path::to_path_buf);
        Ok(data)
    }

    /// Parse dataset content. Blank lines and `#` comments are skipped.
    pub fn parse(content: &str) -> Result<Self, ClassError> {
        let mut entries = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ClassError::InvalidDataLine {
                    line: idx + 1,
                    content: trimmed.to_string(),
                });
            };
            entries.insert(key.trim().to_string(), value.trim().to_string());
        }
        Ok(Self {
            entries,
            base_dir: None,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// The `classes` entry as a count.
    pub fn class_count(&self) -> Result<Option<u32>, ClassError> {
        self.get("classes")
            .map(|v| {
                v.parse::<u32>()
                    .map_err(|_| ClassError::InvalidClassCount(v.to_string()))
            })
            .transpose()
    }

    /// The `names` entry as a path.
    ///
    /// A relative path that does not exist from the working directory is
    /// looked up next to the dataset file.
    pub fn names_path(&self) -> Option<PathBuf> {
        let raw = PathBuf::from(self.get("names")?);
        if raw.is_relative() && !raw.exists() {
            if let Some(base) = &self.base_dir {
                let beside = base.join(&raw);
                if beside.exists() {
                    return Some(beside);
                }
            }
        }
        Some(raw)
    }

    /// Combine `names` and `classes` into a catalog, if either is usable.
    pub fn catalog(&self) -> Option<ClassCatalog> {
        let count = match self.class_count() {
            Ok(count) => count,
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        };

        let names = self.names_path().and_then(|path| match read_names(&path) {
            Ok(names) => Some(names),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        });

        match (names, count) {
            (Some(names), Some(count)) => Some(ClassCatalog::from_names(names).with_count(count)),
            (Some(names), None) => Some(ClassCatalog::from_names(names)),
            (None, Some(count)) => Some(ClassCatalog::numeric(count)),
            (None, None) => None,
        }
    }
}
