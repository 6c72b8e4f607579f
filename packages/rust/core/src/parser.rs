//! Response parser: free-form numbered-list text → ordered step records.
//!
//! The input is whatever the generation backend returned. The parser is a
//! single forward pass over lines with a textual step-start heuristic, not
//! a grammar; it tolerates `步骤1:`, `Step 2:`, and `3. do X` markers
//! alike. It is intentionally lossy: continuation lines are space-joined
//! onto the current step with no further normalization.

use std::sync::LazyLock;

use regex::Regex;

use opsplit_shared::Step;

/// A line starts a new step when it opens with a step keyword in either
/// supported language, or with a decimal digit.
static STEP_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:步骤|Step|\d)").expect("step marker regex"));

/// Parse a backend response into ordered steps.
///
/// Ids are assigned sequentially (`step_001`, ...) in emission order and
/// never taken from the marker text. If nothing parseable is found, a
/// single step is emitted carrying the trimmed response, or `fallback`
/// when the response was empty.
pub fn parse_steps(response: &str, fallback: &str) -> Vec<Step> {
    let mut steps: Vec<Step> = Vec::new();
    // Accumulated description parts of the step currently being built.
    let mut parts: Vec<String> = Vec::new();

    for raw in response.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if STEP_START_RE.is_match(line) {
            if !parts.is_empty() {
                finalize(&mut steps, &parts);
            }
            // Everything before the first colon is marker text; drop it.
            parts = match line.split_once(':') {
                Some((_, rest)) => vec![rest.trim().to_string()],
                None => vec![line.to_string()],
            };
        } else if !parts.is_empty() {
            parts.push(line.to_string());
        } else if steps.is_empty() {
            // No marker seen yet: open a step from the raw line.
            parts.push(line.to_string());
        }
    }

    if !parts.is_empty() {
        finalize(&mut steps, &parts);
    }

    if steps.is_empty() {
        let trimmed = response.trim();
        let description = if trimmed.is_empty() { fallback } else { trimmed };
        steps.push(Step::action("step_001", description));
    }

    steps
}

fn finalize(steps: &mut Vec<Step>, parts: &[String]) {
    let description = parts.join(" ").trim().to_string();
    let id = format!("step_{:03}", steps.len() + 1);
    steps.push(Step::action(id, description));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_marked_steps() {
        let text = "步骤1: 点击登录按钮\n步骤2: 输入用户名和密码\n步骤3: 验证登录成功";
        let steps = parse_steps(text, "");

        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].id, "step_001");
        assert_eq!(steps[1].id, "step_002");
        assert_eq!(steps[2].id, "step_003");
        assert_eq!(steps[0].description, "点击登录按钮");
        assert_eq!(steps[1].description, "输入用户名和密码");
        assert_eq!(steps[2].description, "验证登录成功");
        for step in &steps {
            assert_eq!(step.step_type, "operation");
            assert_eq!(step.subtype, "action");
        }
    }

    #[test]
    fn continuation_lines_are_space_joined() {
        let steps = parse_steps("步骤1: 点击登录\n需要先检查网络", "");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].description, "点击登录 需要先检查网络");
    }

    #[test]
    fn english_and_digit_markers() {
        let text = "Step 1: open the login page\n2. enter the password";
        let steps = parse_steps(text, "");

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].description, "open the login page");
        // A digit-marked line without a colon keeps its marker text.
        assert_eq!(steps[1].description, "2. enter the password");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let text = "步骤1: 打开页面\n\n\n步骤2: 点击按钮\n";
        let steps = parse_steps(text, "");
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn unmarked_preamble_becomes_first_step() {
        let text = "以下是拆分结果：\n步骤1: 打开页面";
        let steps = parse_steps(text, "");

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].description, "以下是拆分结果：");
        assert_eq!(steps[1].description, "打开页面");
    }

    #[test]
    fn unmarked_only_text_is_one_step() {
        let steps = parse_steps("根据手册执行该操作即可", "");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].description, "根据手册执行该操作即可");
    }

    #[test]
    fn empty_response_falls_back_to_operation() {
        let steps = parse_steps("", "登录系统并查看用户信息");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].id, "step_001");
        assert_eq!(steps[0].description, "登录系统并查看用户信息");
    }

    #[test]
    fn whitespace_only_response_falls_back() {
        let steps = parse_steps("  \n\n   \n", "创建新任务");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].description, "创建新任务");
    }

    #[test]
    fn marker_without_description_yields_empty_step() {
        // "步骤1:" with nothing after the colon still opens (and closes) a
        // step; the description is empty, matching the reference behavior.
        let steps = parse_steps("步骤1:\n步骤2: 输入密码", "");
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].description, "");
        assert_eq!(steps[1].description, "输入密码");
    }

    #[test]
    fn only_first_colon_splits() {
        let steps = parse_steps("步骤1: 访问 http://example.com:8080/login", "");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].description, "访问 http://example.com:8080/login");
    }

    #[test]
    fn parsing_is_idempotent() {
        let text = "步骤1: 打开页面\n补充说明一行\n步骤2: 点击按钮";
        let first = parse_steps(text, "fallback");
        let second = parse_steps(text, "fallback");
        assert_eq!(first, second);
    }

    #[test]
    fn fullwidth_digit_marker_is_recognized() {
        // Unicode decimal digits count as step starts, like the reference.
        let steps = parse_steps("１. 打开页面", "");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].description, "１. 打开页面");
    }
}
