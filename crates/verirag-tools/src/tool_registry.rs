use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use verirag_ai::ToolDefinition;
use verirag_core::{Result, VeriRagError};

use crate::types::{ToolCallRequest, ToolCallResult, ToolKind};

/// 无状态的工具能力: 参数进, 结果文本出
#[async_trait]
pub trait Tool: Send + Sync {
    fn description(&self) -> &str;
    fn parameters(&self) -> serde_json::Value;
    async fn invoke(&self, args: &serde_json::Map<String, serde_json::Value>) -> Result<String>;
}

/// 封闭的工具注册表, 构建后不可变
#[derive(Clone)]
pub struct ToolRegistry {
    tools: HashMap<ToolKind, Arc<dyn Tool>>,
    call_timeout: Option<Duration>,
}

#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: HashMap<ToolKind, Arc<dyn Tool>>,
    call_timeout: Option<Duration>,
}

impl ToolRegistryBuilder {
    pub fn register(mut self, kind: ToolKind, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(kind, tool);
        self
    }

    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            tools: self.tools,
            call_timeout: self.call_timeout,
        }
    }
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    pub fn list_tools(&self) -> Vec<ToolKind> {
        ToolKind::ALL
            .into_iter()
            .filter(|kind| self.tools.contains_key(kind))
            .collect()
    }

    /// 提供给生成器的函数调用定义
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.list_tools()
            .into_iter()
            .filter_map(|kind| {
                self.tools.get(&kind).map(|tool| ToolDefinition {
                    name: kind.as_str().to_string(),
                    description: tool.description().to_string(),
                    parameters: tool.parameters(),
                })
            })
            .collect()
    }

    /// 执行单个工具调用; 未知工具与执行失败都只产生空内容
    pub async fn resolve(&self, request: &ToolCallRequest) -> ToolCallResult {
        let Some(kind) = ToolKind::from_name(&request.name) else {
            tracing::warn!("Tool not found: {}", request.name);
            return ToolCallResult::unknown(&request.name);
        };

        let Some(tool) = self.tools.get(&kind) else {
            tracing::warn!("Tool not registered: {}", kind);
            return ToolCallResult::unknown(&request.name);
        };

        let invocation = tool.invoke(&request.arguments);
        let outcome = match self.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, invocation).await {
                Ok(result) => result,
                Err(_) => Err(VeriRagError::Timeout(format!(
                    "{} 超过 {}ms 未返回",
                    kind,
                    limit.as_millis()
                ))),
            },
            None => invocation.await,
        };

        match outcome {
            Ok(content) => {
                tracing::debug!("Tool {} returned {} bytes", kind, content.len());
                ToolCallResult::ok(kind.as_str(), content)
            }
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", kind, e);
                ToolCallResult::failed(kind.as_str(), e.to_string())
            }
        }
    }

    /// 执行一轮工具调用, 结果顺序与请求顺序一致
    pub async fn resolve_all(
        &self,
        requests: &[ToolCallRequest],
        parallel: bool,
    ) -> Vec<ToolCallResult> {
        if parallel {
            futures::future::join_all(requests.iter().map(|request| self.resolve(request))).await
        } else {
            let mut results = Vec::with_capacity(requests.len());
            for request in requests {
                results.push(self.resolve(request).await);
            }
            results
        }
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::types::ToolCallStatus;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestTool {
        output: String,
        delay: Duration,
        fail: bool,
        execute_count: AtomicUsize,
        completed: Arc<Mutex<Vec<String>>>,
    }

    impl TestTool {
        fn new(output: &str) -> Self {
            Self {
                output: output.to_string(),
                delay: Duration::ZERO,
                fail: false,
                execute_count: AtomicUsize::new(0),
                completed: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new("")
            }
        }

        fn delayed(output: &str, delay: Duration, completed: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                delay,
                completed,
                ..Self::new(output)
            }
        }
    }

    #[async_trait]
    impl Tool for TestTool {
        fn description(&self) -> &str {
            "test tool"
        }

        fn parameters(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }

        async fn invoke(
            &self,
            args: &serde_json::Map<String, serde_json::Value>,
        ) -> Result<String> {
            self.execute_count.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(VeriRagError::Tool("Tool exploded".to_string()));
            }
            let query = args.get("query").and_then(|v| v.as_str()).unwrap_or("");
            let output = format!("{}{}", self.output, query);
            self.completed.lock().unwrap().push(output.clone());
            Ok(output)
        }
    }

    fn request(name: &str, query: &str) -> ToolCallRequest {
        ToolCallRequest::new(name, serde_json::json!({"query": query}))
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::builder().build();
        assert!(registry.list_tools().is_empty());
        assert!(registry.definitions().is_empty());
    }

    #[test]
    fn test_definitions_follow_fixed_order() {
        let registry = ToolRegistry::builder()
            .register(ToolKind::InternetSearch, Arc::new(TestTool::new("w")))
            .register(ToolKind::CorpusSearch, Arc::new(TestTool::new("c")))
            .build();

        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["corpus_search", "internet_search"]);
        assert_eq!(
            registry.list_tools(),
            vec![ToolKind::CorpusSearch, ToolKind::InternetSearch]
        );
    }

    #[tokio::test]
    async fn test_resolve_matches_name_case_insensitively() {
        let tool = Arc::new(TestTool::new("web:"));
        let registry = ToolRegistry::builder()
            .register(ToolKind::InternetSearch, tool.clone())
            .build();

        let result = registry.resolve(&request("Internet_Search", "korea")).await;
        assert!(result.is_ok());
        assert_eq!(result.content, "web:korea");
        assert_eq!(result.tool, "internet_search");
        assert_eq!(tool.execute_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_invoked() {
        let tool = Arc::new(TestTool::new("c:"));
        let registry = ToolRegistry::builder()
            .register(ToolKind::CorpusSearch, tool.clone())
            .build();

        let result = registry.resolve(&request("pdf_search", "x")).await;
        assert_eq!(result.status, ToolCallStatus::UnknownTool);
        assert!(result.content.is_empty());
        assert_eq!(tool.execute_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_known_but_unregistered_tool_is_unknown() {
        let registry = ToolRegistry::builder()
            .register(ToolKind::CorpusSearch, Arc::new(TestTool::new("c:")))
            .build();

        let result = registry.resolve(&request("internet_search", "x")).await;
        assert_eq!(result.status, ToolCallStatus::UnknownTool);
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_round() {
        let registry = ToolRegistry::builder()
            .register(ToolKind::CorpusSearch, Arc::new(TestTool::new("c:")))
            .register(ToolKind::InternetSearch, Arc::new(TestTool::failing()))
            .build();

        let results = registry
            .resolve_all(
                &[
                    request("internet_search", "a"),
                    request("nope", "b"),
                    request("corpus_search", "c"),
                ],
                false,
            )
            .await;

        assert_eq!(results.len(), 3);
        assert!(matches!(results[0].status, ToolCallStatus::Failed(_)));
        assert_eq!(results[1].status, ToolCallStatus::UnknownTool);
        assert_eq!(results[2].content, "c:c");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let completed = Arc::new(Mutex::new(Vec::new()));
        let registry = ToolRegistry::builder()
            .register(
                ToolKind::InternetSearch,
                Arc::new(TestTool::delayed("w:", Duration::from_secs(60), completed)),
            )
            .call_timeout(Duration::from_secs(1))
            .build();

        let result = registry.resolve(&request("internet_search", "slow")).await;
        assert!(matches!(result.status, ToolCallStatus::Failed(_)));
        assert!(result.content.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_parallel_results_keep_request_order() {
        let completed = Arc::new(Mutex::new(Vec::new()));
        let registry = ToolRegistry::builder()
            .register(
                ToolKind::CorpusSearch,
                Arc::new(TestTool::delayed("c:", Duration::from_millis(500), completed.clone())),
            )
            .register(
                ToolKind::InternetSearch,
                Arc::new(TestTool::delayed("w:", Duration::from_millis(10), completed.clone())),
            )
            .build();

        let results = registry
            .resolve_all(
                &[request("corpus_search", "A"), request("internet_search", "B")],
                true,
            )
            .await;

        // internet_search 先完成, 但结果仍按请求顺序排列
        assert_eq!(*completed.lock().unwrap(), vec!["w:B", "c:A"]);
        let contents: Vec<&str> = results.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["c:A", "w:B"]);
    }
}
