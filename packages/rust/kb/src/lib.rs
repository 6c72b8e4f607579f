//! Knowledge-base loader and query surface.
//!
//! A knowledge base is a directory of JSON documents, one standard
//! operation per file. Each document carries a `def` object with the
//! operation's canonical fields. Individual malformed files are skipped
//! with a warning; a directory yielding zero usable documents is a
//! configuration error.

mod context;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use opsplit_shared::{OperationRecord, OpsplitError, Result, Step};

// ---------------------------------------------------------------------------
// Source document shape
// ---------------------------------------------------------------------------

/// Top-level shape of one knowledge-base file. Only the `def` block is
/// required; top-level `id`/`operation` are legacy fallbacks.
#[derive(Debug, Deserialize)]
struct KbDocument {
    def: Option<serde_json::Value>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    operation: Option<String>,
}

/// The recognized definition-block schema.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KbDef {
    id: Option<String>,
    operation: Option<String>,
    context: String,
    scene: String,
    feature: String,
    substep: Vec<Step>,
    current_main_step: Option<Step>,
}

// ---------------------------------------------------------------------------
// KnowledgeBase
// ---------------------------------------------------------------------------

/// In-memory index over a loaded knowledge-base directory.
///
/// Immutable after load. The id index is a `BTreeMap`, so iteration order
/// is deterministic (sorted by operation id).
#[derive(Debug)]
pub struct KnowledgeBase {
    /// operation_id → record. Duplicate ids overwrite silently (last
    /// file in name order wins).
    by_id: BTreeMap<String, OperationRecord>,
    /// operation_name → operation_id. Many-to-one; last loaded wins.
    by_name: HashMap<String, String>,
    /// Number of files skipped during load.
    skipped: usize,
}

impl KnowledgeBase {
    /// Load every `*.json` file directly inside `dir` (non-recursive).
    ///
    /// Files are processed in file-name order so duplicate-id resolution
    /// does not depend on OS directory-listing order. Fails with a config
    /// error when the directory is missing, is not a directory, contains
    /// no JSON files, or no file passes validation.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        if !dir.exists() {
            return Err(OpsplitError::config(format!(
                "knowledge base path does not exist: {}",
                dir.display()
            )));
        }
        if !dir.is_dir() {
            return Err(OpsplitError::config(format!(
                "knowledge base path is not a directory: {}",
                dir.display()
            )));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| OpsplitError::io(dir, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();

        if files.is_empty() {
            return Err(OpsplitError::config(format!(
                "no JSON files found in knowledge base directory: {}",
                dir.display()
            )));
        }

        files.sort();

        let mut kb = Self {
            by_id: BTreeMap::new(),
            by_name: HashMap::new(),
            skipped: 0,
        };

        for path in &files {
            match load_document(path) {
                Ok(record) => kb.insert(record),
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "skipping knowledge base file");
                    kb.skipped += 1;
                }
            }
        }

        if kb.by_id.is_empty() {
            return Err(OpsplitError::config(format!(
                "no usable operation documents in knowledge base directory: {} \
                 ({} file(s) skipped)",
                dir.display(),
                kb.skipped
            )));
        }

        info!(
            operations = kb.by_id.len(),
            skipped = kb.skipped,
            "knowledge base loaded"
        );

        Ok(kb)
    }

    fn insert(&mut self, record: OperationRecord) {
        if self.by_id.contains_key(&record.operation_id) {
            debug!(
                id = %record.operation_id,
                file = %record.source_filename,
                "duplicate operation id, overwriting earlier entry"
            );
        }
        self.by_name
            .insert(record.operation_name.clone(), record.operation_id.clone());
        self.by_id.insert(record.operation_id.clone(), record);
    }

    // -- Query surface ------------------------------------------------------

    /// Fetch a record by operation id.
    pub fn get(&self, operation_id: &str) -> Option<&OperationRecord> {
        self.by_id.get(operation_id)
    }

    /// Fetch a record by operation name, falling back to id lookup.
    pub fn get_by_name(&self, name_or_id: &str) -> Option<&OperationRecord> {
        match self.by_name.get(name_or_id) {
            Some(id) => self.by_id.get(id),
            None => self.by_id.get(name_or_id),
        }
    }

    /// Ordered sub-steps of an operation, by name or id.
    pub fn steps(&self, name_or_id: &str) -> Option<&[Step]> {
        self.get_by_name(name_or_id).map(|r| r.substeps.as_slice())
    }

    /// The documented main step of an operation, by name or id.
    pub fn main_step(&self, name_or_id: &str) -> Option<&Step> {
        self.get_by_name(name_or_id)
            .and_then(|r| r.current_main_step.as_ref())
    }

    /// All operation names, de-duplicated. Order is not part of the contract.
    pub fn operation_names(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .by_id
            .values()
            .map(|r| r.operation_name.as_str())
            .collect();
        names.into_iter().map(String::from).collect()
    }

    /// All operation ids.
    pub fn operation_ids(&self) -> Vec<String> {
        self.by_id.keys().cloned().collect()
    }

    /// Case-insensitive substring search over name, context, and scene.
    pub fn search(&self, keyword: &str) -> Vec<&OperationRecord> {
        let needle = keyword.to_lowercase();
        self.by_id
            .values()
            .filter(|r| {
                r.operation_name.to_lowercase().contains(&needle)
                    || r.context.to_lowercase().contains(&needle)
                    || r.scene.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Case-insensitive substring filter over feature and scene.
    pub fn by_category(&self, keyword: &str) -> Vec<&OperationRecord> {
        let needle = keyword.to_lowercase();
        self.by_id
            .values()
            .filter(|r| {
                r.feature.to_lowercase().contains(&needle)
                    || r.scene.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Iterate records in id order.
    pub fn records(&self) -> impl Iterator<Item = &OperationRecord> {
        self.by_id.values()
    }

    /// Number of loaded operations.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Number of files skipped during load.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

// ---------------------------------------------------------------------------
// Per-file loading
// ---------------------------------------------------------------------------

/// Decode one knowledge-base file into an [`OperationRecord`].
fn load_document(path: &Path) -> Result<OperationRecord> {
    let content = std::fs::read_to_string(path).map_err(|e| OpsplitError::io(path, e))?;

    let doc: KbDocument = serde_json::from_str(&content)
        .map_err(|e| OpsplitError::parse(format!("invalid JSON: {e}")))?;

    let def_value = doc
        .def
        .ok_or_else(|| OpsplitError::validation("missing 'def' block"))?;
    if !def_value.is_object() {
        return Err(OpsplitError::validation("'def' is not an object"));
    }

    let def: KbDef = serde_json::from_value(def_value)
        .map_err(|e| OpsplitError::validation(format!("unrecognized 'def' shape: {e}")))?;

    let file_stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    // Empty strings count as absent, like every other fallback here.
    let operation_id = [def.id, doc.id]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or(file_stem);
    let operation_name = [def.operation, doc.operation]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| operation_id.clone());

    Ok(OperationRecord {
        operation_id,
        operation_name,
        context: def.context,
        scene: def.scene,
        feature: def.feature,
        substeps: def.substep,
        current_main_step: def.current_main_step,
        source_filename: path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default(),
        source_filepath: path.to_string_lossy().to_string(),
    })
}
