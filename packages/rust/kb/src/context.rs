//! Bounded textual digest of a loaded knowledge base.
//!
//! The digest grounds generation prompts: a short per-operation block of
//! name, context, and a preview of the first few step descriptions.

use crate::KnowledgeBase;

/// Operations included in the digest, in id-index order.
const MAX_DIGEST_OPERATIONS: usize = 10;

/// Step descriptions previewed per operation.
const STEP_PREVIEW_COUNT: usize = 3;

impl KnowledgeBase {
    /// Build the digest, hard-truncated to `max_chars` characters.
    ///
    /// Truncation counts characters, not bytes — the digest is dominated
    /// by multi-byte CJK text and must never split a code point. The cut
    /// may land mid-word; an ellipsis marker is appended when it does.
    pub fn digest(&self, max_chars: usize) -> String {
        let mut blocks: Vec<String> = Vec::new();

        for record in self.records().take(MAX_DIGEST_OPERATIONS) {
            let mut block = format!("操作: {}", record.operation_name);

            if !record.context.is_empty() {
                block.push_str("\n描述: ");
                block.push_str(&record.context);
            }

            if !record.substeps.is_empty() {
                block.push_str("\n步骤预览:");
                for step in record.substeps.iter().take(STEP_PREVIEW_COUNT) {
                    block.push_str("\n  - ");
                    block.push_str(&step.description);
                }
            }

            blocks.push(block);
        }

        let digest = blocks.join("\n\n");

        if digest.chars().count() > max_chars {
            let truncated: String = digest.chars().take(max_chars).collect();
            format!("{truncated}...")
        } else {
            digest
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE_KB: &str = "../../../fixtures/kb";

    #[test]
    fn digest_contains_names_and_previews() {
        let kb = KnowledgeBase::load(FIXTURE_KB).unwrap();
        let digest = kb.digest(10_000);

        assert!(digest.contains("操作: 登录系统"));
        assert!(digest.contains("操作: 创建新任务"));
        assert!(digest.contains("步骤预览:"));
        assert!(digest.contains("  - 打开登录页面"));
    }

    #[test]
    fn digest_previews_at_most_three_steps() {
        let kb = KnowledgeBase::load(FIXTURE_KB).unwrap();
        let digest = kb.digest(10_000);

        // The login fixture has 4 steps; the 4th must not be previewed.
        assert!(digest.contains("  - 输入密码"));
        assert!(!digest.contains("点击登录按钮并等待跳转"));
    }

    #[test]
    fn digest_truncates_at_character_boundary() {
        let kb = KnowledgeBase::load(FIXTURE_KB).unwrap();
        let digest = kb.digest(20);

        assert!(digest.ends_with("..."));
        // 20 chars + the 3-char marker; must not panic on CJK input.
        assert_eq!(digest.chars().count(), 23);
    }

    #[test]
    fn digest_under_budget_has_no_marker() {
        let kb = KnowledgeBase::load(FIXTURE_KB).unwrap();
        let digest = kb.digest(100_000);
        assert!(!digest.ends_with("..."));
    }
}
