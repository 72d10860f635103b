//! 消息模型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 消息角色
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// 消息内容
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Text {
        text: String,
    },
    ToolCall {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },
}

/// 消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: Vec<Content>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: Vec<Content>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Content::Text { text: text.into() }])
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![Content::Text { text: text.into() }])
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![Content::Text { text: text.into() }])
    }

    /// 获取文本内容
    pub fn text_content(&self) -> Option<&str> {
        self.content.iter().find_map(|c| {
            if let Content::Text { text } = c {
                Some(text.as_str())
            } else {
                None
            }
        })
    }

    /// 按出现顺序返回所有工具调用 (name, arguments)
    pub fn tool_calls(&self) -> Vec<(&str, &serde_json::Value)> {
        self.content
            .iter()
            .filter_map(|c| match c {
                Content::ToolCall { name, arguments, .. } => Some((name.as_str(), arguments)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_content_skips_tool_calls() {
        let message = Message::new(
            Role::Assistant,
            vec![
                Content::ToolCall {
                    id: "call_1".to_string(),
                    name: "internet_search".to_string(),
                    arguments: serde_json::json!({"query": "seoul"}),
                },
                Content::Text {
                    text: "searching".to_string(),
                },
            ],
        );

        assert_eq!(message.text_content(), Some("searching"));
    }

    #[test]
    fn test_tool_calls_keep_order() {
        let message = Message::new(
            Role::Assistant,
            vec![
                Content::ToolCall {
                    id: "a".to_string(),
                    name: "corpus_search".to_string(),
                    arguments: serde_json::json!({"query": "a"}),
                },
                Content::ToolCall {
                    id: "b".to_string(),
                    name: "internet_search".to_string(),
                    arguments: serde_json::json!({"query": "b"}),
                },
            ],
        );

        let calls = message.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "corpus_search");
        assert_eq!(calls[1].0, "internet_search");
    }

    #[test]
    fn test_plain_message_has_no_tool_calls() {
        let message = Message::user("hello");
        assert_eq!(message.role, Role::User);
        assert!(message.tool_calls().is_empty());
    }
}
