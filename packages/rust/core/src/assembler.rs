//! Record assembler: parsed steps + source operation → persisted record.
//!
//! Generated identifiers embed the wall-clock second at assembly time.
//! Records produced within the same second may share identifiers; callers
//! needing strict uniqueness supply their own output filename.

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;

use opsplit_shared::{
    DefBlock, OpsplitError, PathInfo, ProductInfo, RecordMeta, Result, SplitRecord, Step,
};

/// Placeholder used when the input operation text is empty.
const FALLBACK_OPERATION: &str = "操作序列";

/// Fixed producer tag written into every record.
const PRODUCER: &str = "splitter";

/// Assemble the persisted record for one split.
///
/// `output_filename` gets a `.json` suffix when missing; with no filename
/// at all, a time-derived default is generated.
pub fn assemble(steps: Vec<Step>, operation: &str, output_filename: Option<&str>) -> SplitRecord {
    let now = Local::now();
    let stamp = now.format("%Y%m%d%H%M%S").to_string();

    let filename = match output_filename {
        Some(name) if name.ends_with(".json") => name.to_string(),
        Some(name) => format!("{name}.json"),
        None => format!("output_{}.json", now.format("%Y%m%d_%H%M%S")),
    };

    let operation_label = if operation.is_empty() {
        FALLBACK_OPERATION
    } else {
        operation
    };

    SplitRecord {
        chunk_id: format!("chunk_{stamp}"),
        def: DefBlock {
            path: PathInfo::default(),
            substep: steps,
            feature: String::new(),
            product_morphology: String::new(),
            context: operation.to_string(),
            product_info: ProductInfo::default(),
            current_main_step: Step::main(operation_label),
            source: filename.clone(),
            id: format!("operation_{stamp}"),
            corpus_source: String::new(),
            operation: operation_label.to_string(),
            scene: String::new(),
        },
        filename: filename.clone(),
        producer: PRODUCER.into(),
        item_info_id: String::new(),
        kba_id: String::new(),
        meta_data: RecordMeta {
            org_embedding: vec![],
            data_filter_map: vec![],
            source: filename.clone(),
            mtime: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
        },
        text: vec![],
        uri: format!("file:///{filename}"),
    }
}

/// Write a record as UTF-8 JSON (2-space indent, non-ASCII unescaped),
/// creating parent directories as needed.
pub fn write_record(record: &SplitRecord, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| OpsplitError::io(parent, e))?;
        }
    }

    let json = serde_json::to_string_pretty(record)
        .map_err(|e| OpsplitError::validation(format!("JSON serialization failed: {e}")))?;
    std::fs::write(path, json).map_err(|e| OpsplitError::io(path, e))?;

    debug!(path = %path.display(), "wrote split record");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("opsplit-asm-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_steps() -> Vec<Step> {
        vec![
            Step::action("step_001", "点击登录按钮"),
            Step::action("step_002", "输入用户名和密码"),
            Step::action("step_003", "验证登录成功"),
        ]
    }

    #[test]
    fn record_shape() {
        let record = assemble(sample_steps(), "登录系统并查看用户信息", Some("测试数据1.json"));

        assert_eq!(record.filename, "测试数据1.json");
        assert_eq!(record.def.source, "测试数据1.json");
        assert_eq!(record.meta_data.source, "测试数据1.json");
        assert_eq!(record.uri, "file:///测试数据1.json");
        assert_eq!(record.producer, "splitter");
        assert_eq!(record.def.substep.len(), 3);
        assert_eq!(record.def.context, "登录系统并查看用户信息");
        assert_eq!(record.def.operation, "登录系统并查看用户信息");
        assert_eq!(record.def.current_main_step.description, "登录系统并查看用户信息");
        assert_eq!(record.def.current_main_step.id, "main_step_001");
        assert!(record.text.is_empty());
        assert!(record.meta_data.org_embedding.is_empty());
    }

    #[test]
    fn identifiers_are_clock_derived() {
        let record = assemble(sample_steps(), "登录系统", None);

        assert!(record.chunk_id.starts_with("chunk_"));
        assert_eq!(record.chunk_id.len(), "chunk_".len() + 14);
        assert!(record.def.id.starts_with("operation_"));
        // mtime looks like YYYY-MM-DDTHH:MM:SS
        assert_eq!(record.meta_data.mtime.len(), 19);
        assert_eq!(&record.meta_data.mtime[10..11], "T");
    }

    #[test]
    fn json_suffix_is_enforced() {
        let record = assemble(vec![], "登录系统", Some("测试数据1"));
        assert_eq!(record.filename, "测试数据1.json");
    }

    #[test]
    fn default_filename_is_time_derived() {
        let record = assemble(vec![], "登录系统", None);
        assert!(record.filename.starts_with("output_"));
        assert!(record.filename.ends_with(".json"));
    }

    #[test]
    fn empty_operation_uses_placeholder() {
        let record = assemble(sample_steps(), "", None);
        assert_eq!(record.def.operation, "操作序列");
        assert_eq!(record.def.current_main_step.description, "操作序列");
        // context keeps the literal (empty) input
        assert_eq!(record.def.context, "");
    }

    #[test]
    fn round_trip_through_disk() {
        let dir = temp_dir();
        let path = dir.join("nested").join("out.json");

        let record = assemble(sample_steps(), "登录系统并查看用户信息", Some("out.json"));
        write_record(&record, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        // Non-ASCII stays unescaped, 2-space indent
        assert!(content.contains("点击登录按钮"));
        assert!(content.contains("\n  \"def\""));

        let parsed: SplitRecord = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.def.substep.len(), record.def.substep.len());
        for (a, b) in parsed.def.substep.iter().zip(record.def.substep.iter()) {
            assert_eq!(a.description, b.description);
        }
        assert_eq!(
            parsed.def.current_main_step.description,
            record.def.current_main_step.description
        );

        let _ = std::fs::remove_dir_all(&dir);
    }
}
