//! Read-through cache for normalized tables and export bundles.
//!
//! Entries are keyed by the SHA-256 of the input bytes, so a changed file is
//! a new entry and an unchanged one is never reparsed. Nothing expires.

use crate::data::{load_bytes, load_path, LoadOutcome};
use crate::export::{build_export, ExportBundle};
use crate::filter::{FilteredDataset, Filters};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Identity of an input source
pub type InputKey = String;

/// Key used for the built-in sample data
pub const SAMPLE_KEY: &str = "sample";

pub fn content_key(bytes: &[u8]) -> InputKey {
    format!("{:x}", Sha256::digest(bytes))
}

#[derive(Debug, Default)]
pub struct DatasetCache {
    tables: HashMap<InputKey, Arc<LoadOutcome>>,
    exports: HashMap<(InputKey, String), Arc<ExportBundle>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `bytes`, reusing the normalized table when the content was seen before
    pub fn load_bytes(&mut self, bytes: &[u8]) -> (InputKey, Arc<LoadOutcome>) {
        let key = content_key(bytes);
        let outcome = self
            .tables
            .entry(key.clone())
            .or_insert_with(|| Arc::new(load_bytes(bytes)))
            .clone();
        (key, outcome)
    }

    /// Load the file at `path`; a missing or unreadable file resolves to the sample entry
    pub fn load_path(&mut self, path: &Path) -> (InputKey, Arc<LoadOutcome>) {
        match std::fs::read(path) {
            Ok(bytes) => self.load_bytes(&bytes),
            Err(_) => {
                let outcome = Arc::new(load_path(path));
                self.tables.insert(SAMPLE_KEY.to_string(), outcome.clone());
                (SAMPLE_KEY.to_string(), outcome)
            }
        }
    }

    /// Export bundle for `dataset`, memoized per input, filter selection and
    /// new-product set
    pub fn export(
        &mut self,
        input: &InputKey,
        filters: &Filters,
        dataset: &FilteredDataset,
    ) -> crate::Result<Arc<ExportBundle>> {
        let selection = format!(
            "{}|n={}",
            filters.fingerprint(),
            dataset.new_product_set.codes().join("\u{1f}")
        );
        let key = (input.clone(), selection);
        if let Some(bundle) = self.exports.get(&key) {
            log::debug!("export cache hit for {}", input);
            return Ok(bundle.clone());
        }
        let bundle = Arc::new(build_export(dataset)?);
        self.exports.insert(key, bundle.clone());
        Ok(bundle)
    }

    pub fn cached_tables(&self) -> usize {
        self.tables.len()
    }

    pub fn cached_exports(&self) -> usize {
        self.exports.len()
    }
}
