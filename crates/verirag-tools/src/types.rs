//! 工具类型定义

use serde::{Deserialize, Serialize};
use std::fmt;

pub const CORPUS_SEARCH: &str = "corpus_search";
pub const INTERNET_SEARCH: &str = "internet_search";

/// 已知工具的封闭集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    CorpusSearch,
    InternetSearch,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::CorpusSearch, ToolKind::InternetSearch];

    /// 名称匹配不区分大小写, 首尾空白忽略
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            CORPUS_SEARCH => Some(ToolKind::CorpusSearch),
            INTERNET_SEARCH => Some(ToolKind::InternetSearch),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::CorpusSearch => CORPUS_SEARCH,
            ToolKind::InternetSearch => INTERNET_SEARCH,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 生成器在工具调用模式下给出的请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        let name = name.into();
        let arguments = match arguments {
            serde_json::Value::Object(map) => map,
            other => {
                tracing::warn!("Tool call '{}' has non-object arguments: {}", name, other);
                serde_json::Map::new()
            }
        };
        Self { name, arguments }
    }
}

/// 单个工具调用的执行结果
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallResult {
    pub tool: String,
    pub content: String,
    pub status: ToolCallStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolCallStatus {
    Ok,
    UnknownTool,
    Failed(String),
}

impl ToolCallResult {
    pub fn ok(tool: impl Into<String>, content: String) -> Self {
        Self {
            tool: tool.into(),
            content,
            status: ToolCallStatus::Ok,
        }
    }

    pub fn unknown(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            content: String::new(),
            status: ToolCallStatus::UnknownTool,
        }
    }

    pub fn failed(tool: impl Into<String>, error: String) -> Self {
        Self {
            tool: tool.into(),
            content: String::new(),
            status: ToolCallStatus::Failed(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ToolCallStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_kind_from_name_is_case_insensitive() {
        assert_eq!(ToolKind::from_name("Internet_Search"), Some(ToolKind::InternetSearch));
        assert_eq!(ToolKind::from_name(" CORPUS_SEARCH "), Some(ToolKind::CorpusSearch));
        assert_eq!(ToolKind::from_name("pdf_search"), None);
        assert_eq!(ToolKind::from_name(""), None);
    }

    #[test]
    fn test_request_with_non_object_arguments_is_empty() {
        let request = ToolCallRequest::new("internet_search", serde_json::json!("raw text"));
        assert!(request.arguments.is_empty());
        assert!(request.arguments.get("query").is_none());
    }

    #[test]
    fn test_request_keeps_object_arguments() {
        let request =
            ToolCallRequest::new("corpus_search", serde_json::json!({"query": "rust", "n": 3}));
        assert_eq!(request.arguments.len(), 2);
        assert_eq!(request.arguments["query"], "rust");
    }

    #[test]
    fn test_failed_result_contributes_nothing() {
        let result = ToolCallResult::failed("internet_search", "timeout".to_string());
        assert!(!result.is_ok());
        assert!(result.content.is_empty());
    }
}
