//! 接地性校验

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use verirag_ai::{AIProvider, ChatRequest};
use verirag_core::{Message, Result, VeriRagError};

use crate::context::ContextBundle;

/// 校验结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Grounded,
    NotGrounded,
    NotSure,
}

impl Verdict {
    /// 不区分大小写的精确匹配; 其他回复视为无法解析
    pub fn parse(reply: &str) -> Option<Self> {
        let normalized: String = reply
            .trim()
            .trim_end_matches('.')
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect();

        match normalized.as_str() {
            "grounded" => Some(Verdict::Grounded),
            "notgrounded" => Some(Verdict::NotGrounded),
            "notsure" => Some(Verdict::NotSure),
            _ => None,
        }
    }

    /// 只有 `Grounded` 算接地
    pub fn is_grounded(&self) -> bool {
        matches!(self, Verdict::Grounded)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Grounded => "grounded",
            Verdict::NotGrounded => "notGrounded",
            Verdict::NotSure => "notSure",
        };
        f.write_str(s)
    }
}

/// 结论只有一个短语
const VERDICT_MAX_TOKENS: usize = 8;

#[async_trait]
pub trait GroundednessVerifier: Send + Sync {
    async fn is_grounded(&self, context: &ContextBundle, answer: &str) -> Result<Verdict>;
}

/// 由聊天模型判定答案是否被上下文支撑
pub struct LlmGroundednessVerifier {
    llm: Arc<dyn AIProvider>,
    model: String,
}

impl LlmGroundednessVerifier {
    pub fn new(llm: Arc<dyn AIProvider>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }
}

#[async_trait]
impl GroundednessVerifier for LlmGroundednessVerifier {
    async fn is_grounded(&self, context: &ContextBundle, answer: &str) -> Result<Verdict> {
        // 上下文作为 user 轮, 答案作为 assistant 轮
        let request = ChatRequest::new(
            self.model.clone(),
            vec![Message::user(context.render()), Message::assistant(answer)],
        )
        .with_temperature(Some(0.0))
        .with_max_tokens(VERDICT_MAX_TOKENS);

        let response = self.llm.chat(request).await?;
        let reply = response.message.text_content().unwrap_or("");

        Verdict::parse(reply)
            .ok_or_else(|| VeriRagError::Parse(format!("无法识别的校验结果: {:?}", reply)))
    }
}
