//! 工具 Agent
//!
//! 降级链第三阶段的协作者：接收 (query, step_budget)，内部做有界的多步工具调用，返回文本或失败。
//! `ReactToolAgent` 以 Planner / ToolExecutor / RecoveryEngine 跑 ReAct 循环；
//! 它只注册 search 与 clock，拿不到 RecordStore。

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::core::{AgentError, RecoveryEngine};
use crate::llm::LlmClient;
use crate::react::{react_loop, Planner, ReactSession};
use crate::tools::{ClockTool, SearchTool, ToolExecutor, Toolbox};

/// 未配置 agent.system_prompt 时使用的基础 prompt
pub const DEFAULT_AGENT_PROMPT: &str = "You are a helpful assistant embedded in a user-management app. \
The request you receive was not a user-management command. \
Use the available tools when the answer needs live information (web pages, the current time); \
otherwise answer directly. Keep answers short and in the user's language.";

/// 单次工具 Agent 调用
#[derive(Debug, Clone)]
pub struct AgentQuery {
    pub text: String,
    /// Planner 调用次数上限（>= 1）
    pub step_budget: u32,
    pub cancel_token: CancellationToken,
}

impl AgentQuery {
    pub fn new(text: impl Into<String>, step_budget: u32) -> Self {
        Self {
            text: text.into(),
            step_budget,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }
}

/// 工具 Agent 抽象：降级链只依赖此 trait，测试中可替换为桩实现
#[async_trait]
pub trait ToolAgent: Send + Sync {
    async fn run(&self, query: &AgentQuery) -> Result<String, AgentError>;
}

/// 基于 ReAct 循环的工具 Agent
pub struct ReactToolAgent {
    planner: Planner,
    executor: ToolExecutor,
    recovery: RecoveryEngine,
}

impl ReactToolAgent {
    pub fn new(planner: Planner, executor: ToolExecutor) -> Self {
        Self {
            planner,
            executor,
            recovery: RecoveryEngine::new(),
        }
    }

    /// 按配置注册 search / clock，并设置工具超时与基础 prompt
    pub fn from_config(llm: Arc<dyn LlmClient>, cfg: &AppConfig) -> Self {
        let tools = Toolbox::new()
            .with(SearchTool::new(
                cfg.tools.search.allowed_domains.clone(),
                cfg.tools.search.timeout_secs,
                cfg.tools.search.max_result_chars,
            ))
            .with(ClockTool);

        let prompt = cfg
            .agent
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_AGENT_PROMPT.to_string());

        Self::new(
            Planner::new(llm, prompt),
            ToolExecutor::new(tools, cfg.agent.tool_timeout_secs),
        )
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.executor.tool_names()
    }
}

#[async_trait]
impl ToolAgent for ReactToolAgent {
    async fn run(&self, query: &AgentQuery) -> Result<String, AgentError> {
        let session = ReactSession::new(
            &self.planner,
            &self.executor,
            &self.recovery,
            query.cancel_token.clone(),
        );
        let result = react_loop(&session, &query.text, query.step_budget).await?;
        tracing::info!(steps = result.steps, budget = query.step_budget, "tool agent answered");
        if result.response.trim().is_empty() {
            return Err(AgentError::EmptyAnswer);
        }
        Ok(result.response)
    }
}
