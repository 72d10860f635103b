//! AI 提供商实现

mod openai_compatible;

pub use openai_compatible::*;

use async_trait::async_trait;
use verirag_core::Result;

use crate::types::{ChatRequest, ChatResponse};

/// AI 提供商 Trait
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// 提供商名称
    fn name(&self) -> &str;

    /// 发送聊天请求
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// 检查健康状态
    async fn health_check(&self) -> Result<bool>;
}

/// 提供商配置
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub default_model: String,
}
