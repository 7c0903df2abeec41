//! Lookup of raw metadata rows by video key.

use std::collections::HashMap;
use std::path::Path;

use crate::foundation::error::{AnnotateError, AnnotateResult};

/// Row lookup by video key. `Ok(None)` means no row is filed under the key.
pub trait MetadataStore: Sync {
    /// Return the raw text fields of the row for `key`.
    fn lookup(&self, key: &str) -> AnnotateResult<Option<Vec<String>>>;
}

/// Rows held in memory, first row per key wins.
#[derive(Clone, Debug, Default)]
pub struct InMemoryMetadataStore {
    rows: HashMap<String, Vec<String>>,
}

impl InMemoryMetadataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `rows` by their first field. Rows without fields are ignored.
    pub fn from_rows(rows: impl IntoIterator<Item = Vec<String>>) -> Self {
        let mut store = Self::new();
        for row in rows {
            store.insert(row);
        }
        store
    }

    /// Add a row unless a row with the same key is already present.
    pub fn insert(&mut self, row: Vec<String>) {
        let Some(key) = row.first().map(|k| k.trim().to_owned()) else {
            return;
        };
        self.rows.entry(key).or_insert(row);
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the store has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn lookup(&self, key: &str) -> AnnotateResult<Option<Vec<String>>> {
        Ok(self.rows.get(key).cloned())
    }
}

/// CSV file with a header row; each subsequent record is one metadata row.
#[derive(Clone, Debug)]
pub struct CsvMetadataStore {
    inner: InMemoryMetadataStore,
}

impl CsvMetadataStore {
    /// Load every row of the CSV at `path`.
    pub fn from_path(path: &Path) -> AnnotateResult<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            AnnotateError::validation(format!(
                "failed to open metadata csv '{}': {e}",
                path.display()
            ))
        })?;
        let store = Self::from_reader(std::io::BufReader::new(file))?;
        tracing::info!(path = %path.display(), rows = store.len(), "loaded metadata");
        Ok(store)
    }

    /// Load every row from CSV text; the first line is the header and is skipped.
    pub fn from_reader(reader: impl std::io::Read) -> AnnotateResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let mut inner = InMemoryMetadataStore::new();
        for (line, record) in csv_reader.records().enumerate() {
            let record = record.map_err(|e| {
                AnnotateError::validation(format!("invalid metadata csv row {}: {e}", line + 2))
            })?;
            inner.insert(record.iter().map(str::to_owned).collect());
        }
        Ok(Self { inner })
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the file held no data rows.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl MetadataStore for CsvMetadataStore {
    fn lookup(&self, key: &str) -> AnnotateResult<Option<Vec<String>>> {
        self.inner.lookup(key)
    }
}

#[cfg(test)]
#[path = "../tests/unit/metadata.rs"]
mod tests;
