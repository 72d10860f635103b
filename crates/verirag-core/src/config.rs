//! 配置管理

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 默认提示模板, `{context}` 与 `{question}` 两个槽位都必须存在
pub const DEFAULT_TEMPLATE: &str =
    "Answer the question based only on the following context:\n{context}\nQuestion: {question}\n";

/// 主配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// AI 提供商配置
    #[serde(default)]
    pub ai: AiConfig,
    /// 网络搜索配置
    #[serde(default)]
    pub search: SearchConfig,
    /// 语料库配置
    #[serde(default)]
    pub corpus: CorpusConfig,
    /// 编排器配置
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// AI 提供商配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub name: String,
    pub base_url: String,
    /// 保存 API Key 的环境变量名
    pub api_key_env: String,
    pub chat_model: String,
    pub groundedness_model: String,
    pub temperature: Option<f32>,
    pub system_prompt: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            name: "openai_compatible".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "LLM_API_KEY".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            groundedness_model: "gpt-4o-mini".to_string(),
            temperature: None,
            system_prompt: "You are a helpful assistant.".to_string(),
        }
    }
}

/// 网络搜索配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub max_results: usize,
    pub search_depth: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tavily.com".to_string(),
            api_key_env: "TAVILY_API_KEY".to_string(),
            max_results: 5,
            search_depth: "basic".to_string(),
        }
    }
}

/// 语料库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub data_dir: PathBuf,
    /// 检索返回的段落数
    pub top_k: usize,
    /// 单个段落的最大字符数
    pub chunk_size: usize,
    pub extensions: Vec<String>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            top_k: 4,
            chunk_size: 1200,
            extensions: vec!["txt".to_string(), "md".to_string()],
        }
    }
}

/// 编排器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub template: String,
    /// 每次外部调用的超时 (毫秒)
    pub call_timeout_ms: u64,
    /// 回退轮次中是否并行执行工具调用
    pub parallel_tools: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            call_timeout_ms: 30000,
            parallel_tools: false,
        }
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::VeriRagError::Config(format!("读取配置文件失败: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| crate::VeriRagError::Config(format!("解析配置文件失败: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| crate::VeriRagError::Config(format!("序列化配置失败: {}", e)))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content)
            .map_err(|e| crate::VeriRagError::Config(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }

    /// 校验配置
    pub fn validate(&self) -> crate::Result<()> {
        for slot in ["{context}", "{question}"] {
            if !self.orchestrator.template.contains(slot) {
                return Err(crate::VeriRagError::Config(format!(
                    "提示模板缺少槽位 {}",
                    slot
                )));
            }
        }
        if self.orchestrator.call_timeout_ms == 0 {
            return Err(crate::VeriRagError::Config(
                "call_timeout_ms 必须大于 0".to_string(),
            ));
        }
        if self.corpus.top_k == 0 || self.corpus.chunk_size == 0 {
            return Err(crate::VeriRagError::Config(
                "top_k 与 chunk_size 必须大于 0".to_string(),
            ));
        }
        if self.search.max_results == 0 {
            return Err(crate::VeriRagError::Config(
                "search.max_results 必须大于 0".to_string(),
            ));
        }
        Ok(())
    }

    /// 读取配置中指定环境变量的 API Key
    pub fn api_key(env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.trim().is_empty())
    }
}
