//! 服务构建器：从 AppConfig 装配降级链
//!
//! CLI 与 HTTP 入口共用同一套装配逻辑；测试可注入脚本化 LLM 或桩工具 Agent。

use std::sync::Arc;

use crate::agent::{ReactToolAgent, ToolAgent};
use crate::config::AppConfig;
use crate::core::{ChatResponder, FallbackChain};
use crate::crud::ActionExecutor;
use crate::intent::IntentParser;
use crate::llm::{create_llm_from_config, LlmClient, LlmError};
use crate::store::RecordStore;

pub struct ServiceBuilder {
    config: AppConfig,
    llm: Option<Arc<dyn LlmClient>>,
    agent: Option<Arc<dyn ToolAgent>>,
}

impl ServiceBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            llm: None,
            agent: None,
        }
    }

    /// 替换 oracle（默认按 [llm] 段创建）
    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// 替换工具 Agent（默认为共享同一 oracle 的 ReactToolAgent）
    pub fn with_tool_agent(mut self, agent: Arc<dyn ToolAgent>) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 未注入 oracle 且配置无法创建后端时返回 LlmError::NotConfigured
    pub fn build(self) -> Result<FallbackChain, LlmError> {
        let llm = match self.llm {
            Some(llm) => llm,
            None => create_llm_from_config(&self.config)?,
        };
        let agent = self
            .agent
            .unwrap_or_else(|| Arc::new(ReactToolAgent::from_config(llm.clone(), &self.config)));

        let store = Arc::new(RecordStore::new(&self.config.store.path));
        tracing::info!(
            store = %store.path().display(),
            model = llm.model_name(),
            "fallback chain ready"
        );

        Ok(FallbackChain::new(
            IntentParser::new(llm.clone()),
            ActionExecutor::new(store).with_max_bulk(self.config.crud.max_bulk_count),
            agent,
            ChatResponder::new(llm),
        )
        .with_step_limits(
            self.config.agent.default_max_steps,
            self.config.agent.max_steps_cap,
        ))
    }
}
