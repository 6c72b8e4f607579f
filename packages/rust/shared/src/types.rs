//! Core domain types for opsplit: steps, knowledge-base operations,
//! and the persisted split-record shape.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// A single atomic instruction, either inside a knowledge-base operation
/// or produced by the response parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Identifier, unique within the owning sequence (`step_001`, ...).
    #[serde(default)]
    pub id: String,
    /// Classification tag (`operation` for sub-steps, `main_operation` for
    /// the coarse step being decomposed).
    #[serde(rename = "type", default)]
    pub step_type: String,
    /// Secondary tag (`action` / `main`).
    #[serde(default)]
    pub subtype: String,
    /// Free-text instruction.
    #[serde(default)]
    pub description: String,
}

impl Step {
    /// An atomic action sub-step.
    pub fn action(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            step_type: "operation".into(),
            subtype: "action".into(),
            description: description.into(),
        }
    }

    /// The main step describing the coarse operation being decomposed.
    pub fn main(description: impl Into<String>) -> Self {
        Self {
            id: "main_step_001".into(),
            step_type: "main_operation".into(),
            subtype: "main".into(),
            description: description.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// OperationRecord
// ---------------------------------------------------------------------------

/// One loaded knowledge-base entry, with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Unique within the loaded set; from the definition block, a top-level
    /// field, or the source file's base name.
    pub operation_id: String,
    /// Human-readable name; may collide across records.
    pub operation_name: String,
    /// Free-text classification fields, empty when absent from the source.
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub scene: String,
    #[serde(default)]
    pub feature: String,
    /// Ordered sub-steps; insertion order is execution order.
    #[serde(default)]
    pub substeps: Vec<Step>,
    /// The coarse operation this entry decomposes, when documented.
    #[serde(default)]
    pub current_main_step: Option<Step>,
    /// Provenance, set at load time.
    pub source_filename: String,
    pub source_filepath: String,
}

// ---------------------------------------------------------------------------
// Persisted split record
// ---------------------------------------------------------------------------

/// The persisted output of one split: UTF-8 JSON, 2-space indent,
/// non-ASCII left unescaped. Field order mirrors the on-disk layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitRecord {
    /// Clock-derived chunk identifier (`chunk_YYYYmmddHHMMSS`).
    pub chunk_id: String,
    /// The definition block holding the decomposition itself.
    pub def: DefBlock,
    /// Output file name (`.json` suffix enforced).
    pub filename: String,
    /// Fixed literal identifying the producer.
    #[serde(rename = "from")]
    pub producer: String,
    #[serde(default)]
    pub item_info_id: String,
    #[serde(default)]
    pub kba_id: String,
    pub meta_data: RecordMeta,
    #[serde(default)]
    pub text: Vec<serde_json::Value>,
    /// File-scheme URI built from the filename.
    pub uri: String,
}

/// Definition block of a split record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefBlock {
    pub path: PathInfo,
    /// Ordered atomic sub-steps in execution order.
    pub substep: Vec<Step>,
    #[serde(default)]
    pub feature: String,
    #[serde(default)]
    pub product_morphology: String,
    /// The original input operation text.
    #[serde(default)]
    pub context: String,
    pub product_info: ProductInfo,
    pub current_main_step: Step,
    /// Source file name (same as the record's `filename`).
    pub source: String,
    /// Clock-derived operation identifier (`operation_YYYYmmddHHMMSS`).
    pub id: String,
    #[serde(default)]
    pub corpus_source: String,
    pub operation: String,
    #[serde(default)]
    pub scene: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathInfo {
    #[serde(default)]
    pub textual_path: String,
    #[serde(default)]
    pub path_uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductInfo {
    #[serde(default)]
    pub product_line_name: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
}

/// Record metadata; `mtime` is a local `YYYY-MM-DDTHH:MM:SS` timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMeta {
    #[serde(default)]
    pub org_embedding: Vec<serde_json::Value>,
    #[serde(default)]
    pub data_filter_map: Vec<serde_json::Value>,
    pub source: String,
    pub mtime: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_type_key_is_renamed() {
        let step = Step::action("step_001", "点击登录按钮");
        let json = serde_json::to_string(&step).expect("serialize");
        assert!(json.contains(r#""type":"operation""#));
        assert!(json.contains(r#""subtype":"action""#));
        assert!(!json.contains("step_type"));
    }

    #[test]
    fn main_step_tags() {
        let step = Step::main("登录系统并查看用户信息");
        assert_eq!(step.id, "main_step_001");
        assert_eq!(step.step_type, "main_operation");
        assert_eq!(step.subtype, "main");
    }

    #[test]
    fn step_tolerates_missing_fields() {
        let step: Step = serde_json::from_str(r#"{"description": "输入密码"}"#).expect("parse");
        assert_eq!(step.description, "输入密码");
        assert!(step.id.is_empty());
        assert!(step.step_type.is_empty());
    }

    #[test]
    fn record_producer_serializes_as_from() {
        let record = SplitRecord {
            chunk_id: "chunk_20250101000000".into(),
            def: DefBlock {
                path: PathInfo::default(),
                substep: vec![Step::action("step_001", "点击登录按钮")],
                feature: String::new(),
                product_morphology: String::new(),
                context: "登录系统".into(),
                product_info: ProductInfo::default(),
                current_main_step: Step::main("登录系统"),
                source: "out.json".into(),
                id: "operation_20250101000000".into(),
                corpus_source: String::new(),
                operation: "登录系统".into(),
                scene: String::new(),
            },
            filename: "out.json".into(),
            producer: "splitter".into(),
            item_info_id: String::new(),
            kba_id: String::new(),
            meta_data: RecordMeta {
                org_embedding: vec![],
                data_filter_map: vec![],
                source: "out.json".into(),
                mtime: "2025-01-01T00:00:00".into(),
            },
            text: vec![],
            uri: "file:///out.json".into(),
        };

        let json = serde_json::to_string(&record).expect("serialize");
        assert!(json.contains(r#""from":"splitter""#));
        assert!(!json.contains("producer"));

        let parsed: SplitRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.producer, "splitter");
        assert_eq!(parsed.def.substep.len(), 1);
    }

    #[test]
    fn non_ascii_survives_pretty_serialization() {
        let step = Step::action("step_001", "验证登录成功");
        let json = serde_json::to_string_pretty(&step).expect("serialize");
        assert!(json.contains("验证登录成功"));
        assert!(!json.contains("\\u"));
    }
}
