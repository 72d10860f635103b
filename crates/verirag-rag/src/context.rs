//! 上下文与提示模板

use verirag_core::{Result, VeriRagError};
use verirag_tools::ToolCallResult;

const CONTEXT_SLOT: &str = "{context}";
const QUESTION_SLOT: &str = "{question}";

/// 传给生成器的上下文, 构造后不再修改, 只在两次尝试之间整体替换
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextBundle {
    passages: Vec<String>,
}

impl ContextBundle {
    pub fn empty() -> Self {
        Self::default()
    }

    /// 检索得到的段落, 保持相关度顺序
    pub fn from_passages(passages: Vec<String>) -> Self {
        Self { passages }
    }

    /// 按请求顺序直接拼接工具输出
    pub fn from_tool_results(results: &[ToolCallResult]) -> Self {
        let text: String = results.iter().map(|r| r.content.as_str()).collect();
        if text.is_empty() {
            Self::empty()
        } else {
            Self {
                passages: vec![text],
            }
        }
    }

    pub fn passages(&self) -> &[String] {
        &self.passages
    }

    pub fn is_empty(&self) -> bool {
        self.passages.iter().all(|p| p.is_empty())
    }

    pub fn render(&self) -> String {
        self.passages.join("\n\n")
    }
}

/// 含 `{context}` 与 `{question}` 两个槽位的提示模板
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for slot in [CONTEXT_SLOT, QUESTION_SLOT] {
            if !template.contains(slot) {
                return Err(VeriRagError::Config(format!("提示模板缺少槽位 {}", slot)));
            }
        }
        Ok(Self { template })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// 单遍替换, 填入的文本中出现的槽位字样不会被再次展开
    pub fn render(&self, context: &ContextBundle, question: &str) -> String {
        let context = context.render();
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();

        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix(CONTEXT_SLOT) {
                out.push_str(&context);
                rest = tail;
            } else if let Some(tail) = rest.strip_prefix(QUESTION_SLOT) {
                out.push_str(question);
                rest = tail;
            } else {
                let mut chars = rest.chars();
                if let Some(c) = chars.next() {
                    out.push(c);
                }
                rest = chars.as_str();
            }
        }

        out
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: verirag_core::DEFAULT_TEMPLATE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_requires_both_slots() {
        assert!(PromptTemplate::new("{context}").is_err());
        assert!(PromptTemplate::new("{question}").is_err());
        assert!(PromptTemplate::new("{context} / {question}").is_ok());
    }

    #[test]
    fn test_render_default_template() {
        let context = ContextBundle::from_passages(vec!["a".to_string(), "b".to_string()]);
        let prompt = PromptTemplate::default().render(&context, "why?");
        assert_eq!(
            prompt,
            "Answer the question based only on the following context:\na\n\nb\nQuestion: why?\n"
        );
    }

    #[test]
    fn test_render_empty_context_keeps_structure() {
        let prompt = PromptTemplate::new("C:[{context}] Q:[{question}]")
            .unwrap()
            .render(&ContextBundle::empty(), "q");
        assert_eq!(prompt, "C:[] Q:[q]");
    }

    #[test]
    fn test_render_does_not_expand_slots_inside_values() {
        let context = ContextBundle::from_passages(vec!["see {question}".to_string()]);
        let prompt = PromptTemplate::new("{context}|{question}")
            .unwrap()
            .render(&context, "{context}");
        assert_eq!(prompt, "see {question}|{context}");
    }

    #[test]
    fn test_tool_results_concatenate_in_order() {
        let results = vec![
            ToolCallResult::ok("corpus_search", "A".to_string()),
            ToolCallResult::unknown("pdf_search"),
            ToolCallResult::ok("internet_search", "C".to_string()),
        ];
        let context = ContextBundle::from_tool_results(&results);
        assert_eq!(context.render(), "AC");
    }

    #[test]
    fn test_all_failed_tool_results_give_empty_bundle() {
        let results = vec![ToolCallResult::failed("internet_search", "down".to_string())];
        assert!(ContextBundle::from_tool_results(&results).is_empty());
    }
}
