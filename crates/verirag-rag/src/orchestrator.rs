//! 编排器 - 回答、校验、回退
//!
//! 每个问题按固定顺序推进:
//! 检索 → 首轮生成 → 接地性校验 → (未接地) 工具调用探测 → 执行工具 → 重新生成。
//! 重新生成的答案不再校验。

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use verirag_core::{OrchestratorConfig, Result, VeriRagError};
use verirag_tools::{ToolCallRequest, ToolCallResult, ToolRegistry};

use crate::context::{ContextBundle, PromptTemplate};
use crate::generator::Generator;
use crate::retriever::Retriever;
use crate::verifier::GroundednessVerifier;

/// 回退时最多请求工具调用的次数
pub const MAX_TOOL_PROBES: usize = 3;

/// 单个问题的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Retrieving,
    GeneratingPrimary,
    Verifying,
    FallbackGeneratingTools,
    ResolvingTools,
    Regenerating,
    Done,
    DoneFallback,
    Exhausted,
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrchestratorState::Retrieving => "retrieving",
            OrchestratorState::GeneratingPrimary => "generating_primary",
            OrchestratorState::Verifying => "verifying",
            OrchestratorState::FallbackGeneratingTools => "fallback_generating_tools",
            OrchestratorState::ResolvingTools => "resolving_tools",
            OrchestratorState::Regenerating => "regenerating",
            OrchestratorState::Done => "done",
            OrchestratorState::DoneFallback => "done_fallback",
            OrchestratorState::Exhausted => "exhausted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptMode {
    Primary,
    Fallback,
}

/// 一次生成尝试; 回退答案不校验, `grounded` 为 `None`
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestrationAttempt {
    pub mode: AttemptMode,
    pub context: ContextBundle,
    pub answer: String,
    pub grounded: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Answered { answer: String, mode: AttemptMode },
    NoAnswer,
}

/// 单个问题的处理结果
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub outcome: Outcome,
    pub attempts: Vec<OrchestrationAttempt>,
    /// 实际发起的工具调用探测次数
    pub tool_probes: usize,
    pub tool_calls: Vec<ToolCallResult>,
    pub states: Vec<OrchestratorState>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            outcome: Outcome::NoAnswer,
            attempts: Vec::new(),
            tool_probes: 0,
            tool_calls: Vec::new(),
            states: Vec::new(),
        }
    }

    fn enter(&mut self, state: OrchestratorState) {
        debug!("Orchestrator state -> {}", state);
        self.states.push(state);
    }

    pub fn answer(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Answered { answer, .. } => Some(answer),
            Outcome::NoAnswer => None,
        }
    }
}

/// 工具调用探测的结果
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Obtained {
        requests: Vec<ToolCallRequest>,
        probes: usize,
    },
    Exhausted {
        probes: usize,
    },
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// 检索、生成、校验每次调用的超时
    pub call_timeout: Option<Duration>,
    /// 回退轮次中并行执行工具调用
    pub parallel_tools: bool,
}

impl From<&OrchestratorConfig> for OrchestratorSettings {
    fn from(config: &OrchestratorConfig) -> Self {
        Self {
            call_timeout: Some(Duration::from_millis(config.call_timeout_ms)),
            parallel_tools: config.parallel_tools,
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&OrchestratorConfig::default())
    }
}

fn as_retrieval(e: VeriRagError) -> VeriRagError {
    match e {
        VeriRagError::Retrieval(_) => e,
        other => VeriRagError::Retrieval(other.to_string()),
    }
}

fn as_generation(e: VeriRagError) -> VeriRagError {
    match e {
        VeriRagError::Generation(_) => e,
        other => VeriRagError::Generation(other.to_string()),
    }
}

pub struct Orchestrator {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    verifier: Arc<dyn GroundednessVerifier>,
    tools: Arc<ToolRegistry>,
    template: PromptTemplate,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        verifier: Arc<dyn GroundednessVerifier>,
        tools: Arc<ToolRegistry>,
        template: PromptTemplate,
    ) -> Self {
        Self {
            retriever,
            generator,
            verifier,
            tools,
            template,
            settings: OrchestratorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    async fn bounded<T>(&self, what: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        match self.settings.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                VeriRagError::Timeout(format!("{} 超过 {}ms 未返回", what, limit.as_millis()))
            })?,
            None => call.await,
        }
    }

    /// 回答一个问题
    ///
    /// 检索或生成失败时返回错误, 只影响当前问题; 回退耗尽不是错误, 结果为 [`Outcome::NoAnswer`]。
    pub async fn answer(&self, question: &str) -> Result<RunReport> {
        let mut report = RunReport::new();

        report.enter(OrchestratorState::Retrieving);
        let context = self
            .bounded("retriever", self.retriever.retrieve(question))
            .await
            .map_err(as_retrieval)?;
        if context.is_empty() {
            debug!("Retriever returned no passages");
        }

        report.enter(OrchestratorState::GeneratingPrimary);
        let answer = self
            .bounded(
                "generator",
                self.generator.generate(&self.template, &context, question),
            )
            .await
            .map_err(as_generation)?;

        report.enter(OrchestratorState::Verifying);
        let grounded = match self
            .bounded("verifier", self.verifier.is_grounded(&context, &answer))
            .await
        {
            Ok(verdict) => {
                debug!("Groundedness verdict: {}", verdict);
                verdict.is_grounded()
            }
            Err(e) => {
                warn!("Groundedness check failed, treating answer as not grounded: {}", e);
                false
            }
        };

        report.attempts.push(OrchestrationAttempt {
            mode: AttemptMode::Primary,
            context,
            answer: answer.clone(),
            grounded: Some(grounded),
        });

        if grounded {
            report.enter(OrchestratorState::Done);
            report.outcome = Outcome::Answered {
                answer,
                mode: AttemptMode::Primary,
            };
            info!("Answered from retrieved context");
            return Ok(report);
        }

        report.enter(OrchestratorState::FallbackGeneratingTools);
        let requests = match self.probe_tool_calls(question).await? {
            ProbeOutcome::Obtained { requests, probes } => {
                report.tool_probes = probes;
                requests
            }
            ProbeOutcome::Exhausted { probes } => {
                report.tool_probes = probes;
                report.enter(OrchestratorState::Exhausted);
                info!("No tool calls after {} probes, giving up", probes);
                return Ok(report);
            }
        };

        report.enter(OrchestratorState::ResolvingTools);
        let results = self
            .tools
            .resolve_all(&requests, self.settings.parallel_tools)
            .await;
        let fallback_context = ContextBundle::from_tool_results(&results);
        report.tool_calls = results;

        report.enter(OrchestratorState::Regenerating);
        let answer = self
            .bounded(
                "generator",
                self.generator
                    .generate(&self.template, &fallback_context, question),
            )
            .await
            .map_err(as_generation)?;

        report.attempts.push(OrchestrationAttempt {
            mode: AttemptMode::Fallback,
            context: fallback_context,
            answer: answer.clone(),
            grounded: None,
        });

        report.enter(OrchestratorState::DoneFallback);
        report.outcome = Outcome::Answered {
            answer,
            mode: AttemptMode::Fallback,
        };
        info!(
            "Answered from {} tool calls after {} probes",
            report.tool_calls.len(),
            report.tool_probes
        );
        Ok(report)
    }

    /// 最多 [`MAX_TOOL_PROBES`] 次, 拿到第一个非空的调用列表即停止
    pub async fn probe_tool_calls(&self, question: &str) -> Result<ProbeOutcome> {
        for probe in 1..=MAX_TOOL_PROBES {
            let requests = self
                .bounded("generator", self.generator.generate_tool_calls(question))
                .await
                .map_err(as_generation)?;

            if !requests.is_empty() {
                debug!("Probe {} produced {} tool calls", probe, requests.len());
                return Ok(ProbeOutcome::Obtained {
                    requests,
                    probes: probe,
                });
            }
            debug!("Probe {} produced no tool calls", probe);
        }

        Ok(ProbeOutcome::Exhausted {
            probes: MAX_TOOL_PROBES,
        })
    }
}
