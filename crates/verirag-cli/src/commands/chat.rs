//! Chat / Ask 命令: 组装编排器并回答问题

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use verirag_ai::{AIProvider, OpenAICompatibleProvider, ProviderConfig};
use verirag_core::Config;
use verirag_rag::{
    CorpusIndex, CorpusRetriever, LlmGenerator, LlmGroundednessVerifier, Orchestrator,
    OrchestratorSettings, PromptTemplate,
};
use verirag_tools::{
    CorpusSearchTool, InternetSearchConfig, InternetSearchTool, ToolKind, ToolRegistry,
};

use crate::session;

/// 读取配置; 文件不存在时使用默认配置
pub fn load_config(path: &Path, data_dir: Option<PathBuf>) -> Result<Config> {
    let mut config = if path.exists() {
        Config::from_file(path).with_context(|| format!("failed to load {}", path.display()))?
    } else {
        tracing::info!("{} not found, using default configuration", path.display());
        Config::default()
    };

    if let Some(dir) = data_dir {
        config.corpus.data_dir = dir;
    }
    Ok(config)
}

pub async fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let api_key = Config::api_key(&config.ai.api_key_env)
        .with_context(|| format!("{} is not set", config.ai.api_key_env))?;

    let llm: Arc<dyn AIProvider> = Arc::new(OpenAICompatibleProvider::new(ProviderConfig {
        name: config.ai.name.clone(),
        api_key: Some(api_key),
        base_url: Some(config.ai.base_url.clone()),
        default_model: config.ai.chat_model.clone(),
    }));

    match llm.health_check().await {
        Ok(true) => tracing::debug!("Provider {} is reachable", llm.name()),
        _ => tracing::warn!(
            "Provider {} did not answer the health check, continuing anyway",
            llm.name()
        ),
    }

    let index = Arc::new(
        CorpusIndex::from_dir(
            &config.corpus.data_dir,
            &config.corpus.extensions,
            config.corpus.chunk_size,
        )
        .with_context(|| {
            format!(
                "failed to load corpus from {}",
                config.corpus.data_dir.display()
            )
        })?,
    );
    if index.is_empty() {
        tracing::warn!(
            "Corpus at {} is empty, every answer will need the fallback",
            config.corpus.data_dir.display()
        );
    }

    let search_key = Config::api_key(&config.search.api_key_env);
    if search_key.is_none() {
        tracing::warn!(
            "{} is not set, internet_search will return nothing",
            config.search.api_key_env
        );
    }

    let registry = ToolRegistry::builder()
        .register(
            ToolKind::CorpusSearch,
            Arc::new(CorpusSearchTool::new(index.clone(), config.corpus.top_k)),
        )
        .register(
            ToolKind::InternetSearch,
            Arc::new(InternetSearchTool::new(InternetSearchConfig {
                base_url: config.search.base_url.clone(),
                api_key: search_key,
                max_results: config.search.max_results,
                search_depth: config.search.search_depth.clone(),
            })),
        )
        .call_timeout(Duration::from_millis(config.orchestrator.call_timeout_ms))
        .build();

    let generator = LlmGenerator::new(llm.clone(), config.ai.chat_model.clone())
        .with_temperature(config.ai.temperature)
        .with_system_prompt(config.ai.system_prompt.clone())
        .with_tools(registry.definitions());
    let verifier = LlmGroundednessVerifier::new(llm, config.ai.groundedness_model.clone());
    let template = PromptTemplate::new(config.orchestrator.template.clone())?;

    Ok(Orchestrator::new(
        Arc::new(CorpusRetriever::new(index, config.corpus.top_k)),
        Arc::new(generator),
        Arc::new(verifier),
        Arc::new(registry),
        template,
    )
    .with_settings(OrchestratorSettings::from(&config.orchestrator)))
}

pub async fn run(config_path: &Path, data_dir: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path, data_dir)?;
    let orchestrator = build_orchestrator(&config).await?;

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let answered = session::run_session(&orchestrator, input, tokio::io::stdout()).await?;
    tracing::info!("Session ended after {} questions", answered);
    Ok(())
}

pub async fn ask(config_path: &Path, data_dir: Option<PathBuf>, question: &str) -> Result<()> {
    let config = load_config(config_path, data_dir)?;
    let orchestrator = build_orchestrator(&config).await?;

    println!("{}", session::render_reply(orchestrator.answer(question).await));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("none.json"), None).unwrap();
        assert_eq!(config.ai.api_key_env, "LLM_API_KEY");
    }

    #[test]
    fn test_data_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verirag.json");
        std::fs::write(&path, r#"{"corpus": {"data_dir": "docs"}}"#).unwrap();

        let config = load_config(&path, Some(PathBuf::from("/srv/corpus"))).unwrap();
        assert_eq!(config.corpus.data_dir, PathBuf::from("/srv/corpus"));

        let config = load_config(&path, None).unwrap();
        assert_eq!(config.corpus.data_dir, PathBuf::from("docs"));
    }

    #[test]
    fn test_invalid_config_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verirag.json");
        std::fs::write(&path, r#"{"orchestrator": {"template": "no slots"}}"#).unwrap();

        assert!(load_config(&path, None).is_err());
    }
}
