//! Deterministic offline backend for tests and dry runs.

use async_trait::async_trait;

use opsplit_shared::Result;

use crate::{GenerationBackend, GenerationParams};

/// Marker emitted by the prompt builder ahead of the operation text.
const TARGET_HEADER: &str = "【待拆分的操作序列】";

/// Offline backend returning a fixed four-phase decomposition of the
/// operation found in the prompt. Identical prompts yield identical output.
pub struct MockBackend;

impl MockBackend {
    /// The operation text is the first non-empty line after the target
    /// header block.
    fn operation_text(prompt: &str) -> Option<String> {
        let mut in_target = false;
        for line in prompt.lines() {
            let trimmed = line.trim();
            if in_target && !trimmed.is_empty() && !trimmed.starts_with('【') {
                return Some(trimmed.to_string());
            }
            if trimmed.contains(TARGET_HEADER) {
                in_target = true;
            }
        }
        None
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate(&self, prompt: &str, _params: &GenerationParams) -> Result<String> {
        let text = match Self::operation_text(prompt) {
            Some(operation) => format!(
                "步骤1: 准备阶段，检查执行前置条件\n\
                 步骤2: 执行阶段，{operation}\n\
                 步骤3: 验证阶段，确认操作完成\n\
                 步骤4: 清理阶段，整理相关资源"
            ),
            None => "无法解析操作序列，请提供更详细的信息。".to_string(),
        };
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
