//! 答案生成器

use async_trait::async_trait;
use std::sync::Arc;

use verirag_ai::{AIProvider, ChatRequest, ToolDefinition};
use verirag_core::{Message, Result, VeriRagError};
use verirag_tools::ToolCallRequest;

use crate::context::{ContextBundle, PromptTemplate};

/// 生成器: 普通模式返回答案文本, 工具模式返回工具调用请求
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        template: &PromptTemplate,
        context: &ContextBundle,
        question: &str,
    ) -> Result<String>;

    /// 只提交原始问题与工具定义, 不带失败的首轮答案
    async fn generate_tool_calls(&self, question: &str) -> Result<Vec<ToolCallRequest>>;
}

/// 基于聊天模型的生成器
pub struct LlmGenerator {
    llm: Arc<dyn AIProvider>,
    model: String,
    temperature: Option<f32>,
    system_prompt: String,
    tools: Vec<ToolDefinition>,
}

impl LlmGenerator {
    pub fn new(llm: Arc<dyn AIProvider>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            temperature: None,
            system_prompt: "You are a helpful assistant.".to_string(),
            tools: Vec::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// 工具模式下提供给模型的函数定义
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    fn request(&self, user_text: String) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if !self.system_prompt.is_empty() {
            messages.push(Message::system(self.system_prompt.clone()));
        }
        messages.push(Message::user(user_text));

        ChatRequest::new(self.model.clone(), messages).with_temperature(self.temperature)
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(
        &self,
        template: &PromptTemplate,
        context: &ContextBundle,
        question: &str,
    ) -> Result<String> {
        let prompt = template.render(context, question);
        let response = self
            .llm
            .chat(self.request(prompt))
            .await
            .map_err(|e| VeriRagError::Generation(e.to_string()))?;

        match response.message.text_content().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Err(VeriRagError::Generation(format!(
                "模型未返回答案文本 (finish_reason: {:?})",
                response.finish_reason
            ))),
        }
    }

    async fn generate_tool_calls(&self, question: &str) -> Result<Vec<ToolCallRequest>> {
        let request = self.request(question.to_string()).with_tools(self.tools.clone());
        let response = self
            .llm
            .chat(request)
            .await
            .map_err(|e| VeriRagError::Generation(e.to_string()))?;

        let calls: Vec<ToolCallRequest> = response
            .message
            .tool_calls()
            .into_iter()
            .map(|(name, arguments)| ToolCallRequest::new(name, arguments.clone()))
            .collect();

        tracing::debug!("Model requested {} tool calls", calls.len());
        Ok(calls)
    }
}
