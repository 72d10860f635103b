//! 检索器

use async_trait::async_trait;
use std::sync::Arc;

use verirag_core::{Result, VeriRagError};

use crate::context::ContextBundle;
use crate::corpus::CorpusIndex;

/// 问题 → 按相关度排序的上下文; 空结果不是错误
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, question: &str) -> Result<ContextBundle>;
}

/// 基于本地语料索引的检索器
pub struct CorpusRetriever {
    index: Arc<CorpusIndex>,
    top_k: usize,
}

impl CorpusRetriever {
    pub fn new(index: Arc<CorpusIndex>, top_k: usize) -> Self {
        Self {
            index,
            top_k: top_k.max(1),
        }
    }
}

#[async_trait]
impl Retriever for CorpusRetriever {
    async fn retrieve(&self, question: &str) -> Result<ContextBundle> {
        // 索引查询是同步的, 放到阻塞线程池里, 外层超时才能生效
        let index = self.index.clone();
        let query = question.to_string();
        let top_k = self.top_k;
        let hits = tokio::task::spawn_blocking(move || index.search(&query, top_k))
            .await
            .map_err(|e| VeriRagError::Retrieval(format!("检索任务异常退出: {}", e)))??;

        for hit in &hits {
            tracing::debug!("Hit {} from {} (score {:.3})", hit.id, hit.source, hit.score);
        }
        tracing::debug!("Retrieved {} passages", hits.len());

        Ok(ContextBundle::from_passages(
            hits.into_iter().map(|hit| hit.content).collect(),
        ))
    }
}
