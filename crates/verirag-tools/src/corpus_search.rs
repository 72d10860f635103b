//! 语料库搜索工具

use async_trait::async_trait;
use std::sync::Arc;

use verirag_core::{Result, VeriRagError};

use crate::tool_registry::Tool;

/// 只读的语料库查询能力, 由加载语料的组件实现并注入
pub trait CorpusLookup: Send + Sync {
    fn lookup(&self, query: &str, limit: usize) -> Result<Vec<String>>;
}

pub struct CorpusSearchTool {
    corpus: Arc<dyn CorpusLookup>,
    limit: usize,
}

impl CorpusSearchTool {
    pub fn new(corpus: Arc<dyn CorpusLookup>, limit: usize) -> Self {
        Self {
            corpus,
            limit: limit.max(1),
        }
    }
}

#[async_trait]
impl Tool for CorpusSearchTool {
    fn description(&self) -> &str {
        "Search the loaded document corpus for passages relevant to the query. \
         Use this first when the question is about the user's documents."
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

        // 同步查询放到阻塞线程池, 注册表的超时才能生效
        let corpus = self.corpus.clone();
        let query = query.to_string();
        let limit = self.limit;
        let passages = tokio::task::spawn_blocking(move || corpus.lookup(&query, limit))
            .await
            .map_err(|e| VeriRagError::Tool(format!("corpus_search task failed: {}", e)))??;

        Ok(passages.join("\n\n"))
    }
}
