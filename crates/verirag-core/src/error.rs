//! 统一错误处理

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VeriRagError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("AI 提供商错误: {0}")]
    AIProvider(String),

    #[error("检索错误: {0}")]
    Retrieval(String),

    #[error("生成错误: {0}")]
    Generation(String),

    #[error("工具错误: {0}")]
    Tool(String),

    #[error("语料库错误: {0}")]
    Corpus(String),

    #[error("超时: {0}")]
    Timeout(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP 请求错误: {0}")]
    Http(String),

    #[error("解析错误: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, VeriRagError>;
