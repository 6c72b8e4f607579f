//! Prompt construction for the split request.
//!
//! The prompt is a deterministic concatenation of fixed instruction
//! blocks, the optional knowledge-base digest, and the literal operation
//! text. Identical inputs always yield an identical prompt string.

/// Fixed task-instruction block: what a good decomposition looks like.
const TASK_INSTRUCTIONS: &str = "你是一个专业的操作步骤拆分助手。你的任务是根据用户操作手册，将粗粒度的操作序列拆分为详细的、agent可以直接执行的子步骤序列。

要求：
1. 每个子步骤应该是原子性的、可独立执行的操作
2. 子步骤之间应该有清晰的逻辑顺序
3. 每个子步骤应该包含具体的操作指令，而不是抽象的描述
4. 子步骤应该足够详细，使得agent能够直接执行
5. 参考操作手册中的标准步骤格式和术语";

/// Fixed output-format block: the numbered `步骤N:` shape the response
/// parser expects.
const OUTPUT_FORMAT: &str = "【输出要求】
请将上述操作序列拆分为详细的子步骤，按照以下格式输出：

步骤1: [具体操作描述]
步骤2: [具体操作描述]
步骤3: [具体操作描述]
...

每个步骤应该：
- 使用明确的动作动词（如：点击、输入、选择、验证等）
- 包含具体的操作对象和参数
- 说明预期的结果或验证条件（如适用）

如果操作序列中包含多个独立的任务，请分别列出每个任务的子步骤。";

/// Build the full prompt for one operation. The knowledge-base digest is
/// included only when the caller opted in and it is non-empty.
pub fn build_prompt(operation: &str, context: Option<&str>) -> String {
    let mut parts: Vec<String> = vec![TASK_INSTRUCTIONS.to_string()];

    if let Some(digest) = context {
        if !digest.is_empty() {
            parts.push(format!("\n\n【操作手册参考内容】\n{digest}"));
        }
    }

    parts.push(format!("\n\n【待拆分的操作序列】\n{operation}"));
    parts.push(format!("\n\n{OUTPUT_FORMAT}"));

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_is_deterministic() {
        let a = build_prompt("登录系统并查看用户信息", Some("操作: 登录系统"));
        let b = build_prompt("登录系统并查看用户信息", Some("操作: 登录系统"));
        assert_eq!(a, b);
    }

    #[test]
    fn prompt_block_order() {
        let prompt = build_prompt("创建新任务", Some("操作: 创建新任务"));

        let instructions = prompt.find("操作步骤拆分助手").unwrap();
        let context = prompt.find("【操作手册参考内容】").unwrap();
        let target = prompt.find("【待拆分的操作序列】").unwrap();
        let format = prompt.find("【输出要求】").unwrap();

        assert!(instructions < context);
        assert!(context < target);
        assert!(target < format);
        assert!(prompt.contains("\n创建新任务\n"));
    }

    #[test]
    fn context_omitted_when_not_supplied() {
        let prompt = build_prompt("登录系统", None);
        assert!(!prompt.contains("【操作手册参考内容】"));
        assert!(prompt.contains("【待拆分的操作序列】"));
    }

    #[test]
    fn empty_context_is_omitted() {
        let prompt = build_prompt("登录系统", Some(""));
        assert!(!prompt.contains("【操作手册参考内容】"));
    }
}
