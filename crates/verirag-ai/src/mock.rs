//! 测试用的脚本化提供商

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use verirag_core::{Content, Message, Result, Role, VeriRagError};

use crate::providers::AIProvider;
use crate::types::{ChatRequest, ChatResponse, FinishReason, TokenUsage};

/// 单次调用的预设回复
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    ToolCalls(Vec<(String, serde_json::Value)>),
    Fail(String),
}

/// 按顺序返回预设回复的提供商, 回复用尽后返回错误
#[derive(Clone, Default)]
pub struct MockAiProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(self, replies: Vec<MockReply>) -> Self {
        *self.replies.lock().unwrap() = replies.into();
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AIProvider for MockAiProvider {
    fn name(&self) -> &str {
        "mock-ai-provider"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(request);

        let reply = self.replies.lock().unwrap().pop_front();
        let (content, finish_reason) = match reply {
            Some(MockReply::Text(text)) => (vec![Content::Text { text }], FinishReason::Stop),
            Some(MockReply::ToolCalls(calls)) => (
                calls
                    .into_iter()
                    .enumerate()
                    .map(|(i, (name, arguments))| Content::ToolCall {
                        id: format!("call_{}", i),
                        name,
                        arguments,
                    })
                    .collect(),
                FinishReason::ToolCalls,
            ),
            Some(MockReply::Fail(msg)) => return Err(VeriRagError::AIProvider(msg)),
            None => {
                return Err(VeriRagError::AIProvider(
                    "Mock provider has no scripted reply left".to_string(),
                ));
            }
        };

        Ok(ChatResponse {
            id: "mock-chat".to_string(),
            model: "mock-model".to_string(),
            message: Message::new(Role::Assistant, content),
            usage: TokenUsage::new(10, 20),
            finish_reason,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
