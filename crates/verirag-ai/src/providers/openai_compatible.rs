//! OpenAI 兼容提供商通用实现
//!
//! 适用于所有兼容 `/chat/completions` 格式的服务, 支持函数调用 (tools)。

use async_trait::async_trait;
use std::time::Duration;
use verirag_core::{Content, Message, Result, Role, VeriRagError};

use crate::providers::{AIProvider, ProviderConfig};
use crate::types::{ChatRequest, ChatResponse, FinishReason, TokenUsage, ToolDefinition};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenAI 兼容提供商
pub struct OpenAICompatibleProvider {
    config: ProviderConfig,
    client: reqwest::Client,
    health_timeout: Duration,
}

impl OpenAICompatibleProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let client = reqwest::Client::new();
        Self {
            config,
            client,
            health_timeout: HEALTH_CHECK_TIMEOUT,
        }
    }

    /// 健康检查的超时, 超时视为不可用
    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    /// 获取基础 URL
    fn get_base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.config.api_key.as_deref().unwrap_or(""))
    }

    /// 转换消息格式
    fn convert_messages(messages: &[Message]) -> Vec<serde_json::Value> {
        messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };

                serde_json::json!({
                    "role": role,
                    "content": m.text_content().unwrap_or("")
                })
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Vec<serde_json::Value> {
        tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters
                    }
                })
            })
            .collect()
    }

    /// 构造请求体
    pub fn build_body(&self, request: &ChatRequest) -> serde_json::Value {
        let model = if request.model.is_empty() {
            self.config.default_model.as_str()
        } else {
            request.model.as_str()
        };

        let mut body = serde_json::json!({
            "model": model,
            "messages": Self::convert_messages(&request.messages),
            "stream": false
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if !request.tools.is_empty() {
            body["tools"] = serde_json::Value::Array(Self::convert_tools(&request.tools));
        }

        body
    }

    /// 解析非流式响应
    pub fn parse_chat_response(json: &serde_json::Value) -> Result<ChatResponse> {
        let choice = json["choices"]
            .get(0)
            .ok_or_else(|| VeriRagError::AIProvider("响应中缺少 choices".to_string()))?;
        let message = &choice["message"];

        let mut content = Vec::new();
        if let Some(text) = message["content"].as_str() {
            content.push(Content::Text {
                text: text.to_string(),
            });
        }

        if let Some(calls) = message["tool_calls"].as_array() {
            for (i, call) in calls.iter().enumerate() {
                let function = &call["function"];
                let Some(name) = function["name"].as_str() else {
                    tracing::warn!("Skipping tool call #{} without a function name", i);
                    continue;
                };

                // arguments 是 JSON 编码的字符串
                let arguments = match &function["arguments"] {
                    serde_json::Value::String(raw) if raw.trim().is_empty() => {
                        serde_json::json!({})
                    }
                    serde_json::Value::String(raw) => serde_json::from_str(raw)
                        .unwrap_or_else(|_| serde_json::Value::String(raw.clone())),
                    serde_json::Value::Null => serde_json::json!({}),
                    other => other.clone(),
                };

                content.push(Content::ToolCall {
                    id: call["id"].as_str().unwrap_or_default().to_string(),
                    name: name.to_string(),
                    arguments,
                });
            }
        }

        let usage = TokenUsage::new(
            json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as usize,
            json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as usize,
        );

        Ok(ChatResponse {
            id: json["id"].as_str().unwrap_or("").to_string(),
            model: json["model"].as_str().unwrap_or("").to_string(),
            message: Message::new(Role::Assistant, content),
            usage,
            finish_reason: FinishReason::parse(choice["finish_reason"].as_str()),
        })
    }
}

#[async_trait]
impl AIProvider for OpenAICompatibleProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.get_base_url());
        let body = self.build_body(&request);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.bearer())
            .json(&body)
            .send()
            .await
            .map_err(|e| VeriRagError::Http(format!("{} API 请求失败: {}", self.name(), e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VeriRagError::AIProvider(format!(
                "{} API 错误 ({}): {}",
                self.name(),
                status,
                error_text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| VeriRagError::AIProvider(format!("解析响应失败: {}", e)))?;

        Self::parse_chat_response(&json)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.get_base_url());

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.bearer())
            .timeout(self.health_timeout)
            .send()
            .await;

        Ok(response.map(|r| r.status().is_success()).unwrap_or(false))
    }
}
