//! 网络搜索工具 (Tavily 兼容 API)

use async_trait::async_trait;

use verirag_core::{Result, VeriRagError};

use crate::tool_registry::Tool;

#[derive(Debug, Clone)]
pub struct InternetSearchConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_results: usize,
    pub search_depth: String,
}

pub struct InternetSearchTool {
    config: InternetSearchConfig,
    client: reqwest::Client,
}

impl InternetSearchTool {
    pub fn new(config: InternetSearchConfig) -> Self {
        let client = reqwest::Client::new();
        Self { config, client }
    }

    fn build_body(&self, query: &str, api_key: &str) -> serde_json::Value {
        serde_json::json!({
            "api_key": api_key,
            "query": query,
            "max_results": self.config.max_results,
            "search_depth": self.config.search_depth,
            "include_answer": false
        })
    }

    /// 把搜索响应整理为上下文文本: 每条结果取标题与正文
    pub fn format_results(body: &serde_json::Value) -> String {
        let mut sections = Vec::new();

        if let Some(answer) = body["answer"].as_str().filter(|a| !a.trim().is_empty()) {
            sections.push(answer.trim().to_string());
        }

        if let Some(results) = body["results"].as_array() {
            for r in results {
                let title = r["title"].as_str().unwrap_or("").trim();
                let content = r["content"].as_str().unwrap_or("").trim();

                if content.is_empty() && title.is_empty() {
                    continue;
                }

                let mut section = String::new();
                if !title.is_empty() {
                    section.push_str(title);
                    section.push('\n');
                }
                section.push_str(content);
                sections.push(section.trim().to_string());
            }
        }

        sections.join("\n\n")
    }
}

#[async_trait]
impl Tool for InternetSearchTool {
    fn description(&self) -> &str {
        "Search the internet with a web search engine. \
         Use this for general questions the document corpus cannot answer."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, args: &serde_json::Map<String, serde_json::Value>) -> Result<String> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| VeriRagError::Tool("Missing 'query' parameter".to_string()))?;

        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            VeriRagError::Config("网络搜索 API Key 未配置".to_string())
        })?;

        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&self.build_body(query, api_key))
            .send()
            .await
            .map_err(|e| VeriRagError::Http(format!("Search API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VeriRagError::Tool(format!(
                "Search API error ({}): {}",
                status, body
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| VeriRagError::Parse(format!("Failed to parse search results: {}", e)))?;

        Ok(Self::format_results(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(api_key: Option<&str>) -> InternetSearchTool {
        InternetSearchTool::new(InternetSearchConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: api_key.map(String::from),
            max_results: 3,
            search_depth: "basic".to_string(),
        })
    }

    #[test]
    fn test_format_results_keeps_title_and_content_only() {
        let body = serde_json::json!({
            "query": "capital of Korea",
            "results": [
                {"title": "Seoul", "url": "https://example.org/seoul",
                 "content": "Seoul is the capital of South Korea."},
                {"title": "", "url": "", "content": ""},
                {"title": "Busan", "url": "", "content": "Second largest city."}
            ]
        });

        let text = InternetSearchTool::format_results(&body);
        assert_eq!(
            text,
            "Seoul\nSeoul is the capital of South Korea.\n\nBusan\nSecond largest city."
        );
    }

    #[test]
    fn test_format_results_with_answer_and_no_results() {
        let body = serde_json::json!({"answer": " Seoul. ", "results": []});
        assert_eq!(InternetSearchTool::format_results(&body), "Seoul.");
        assert_eq!(InternetSearchTool::format_results(&serde_json::json!({})), "");
    }

    #[test]
    fn test_build_body() {
        let body = tool(Some("k")).build_body("seoul", "k");
        assert_eq!(body["query"], "seoul");
        assert_eq!(body["max_results"], 3);
        assert_eq!(body["search_depth"], "basic");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_request() {
        let args = serde_json::json!({"query": "seoul"});
        let err = tool(None)
            .invoke(args.as_object().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, VeriRagError::Config(_)));
    }
}
