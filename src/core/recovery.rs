//! 错误恢复引擎
//!
//! 根据 AgentError 类型返回 RecoveryAction，供 ReAct 循环决定是注入提示重试还是终止。
//! 重试同样消耗步数预算，因此不会无限循环。

use crate::core::{AgentError, RecoveryAction};

/// 语义化错误恢复：将错误映射为可执行动作
#[derive(Debug, Default)]
pub struct RecoveryEngine;

impl RecoveryEngine {
    pub fn new() -> Self {
        Self
    }

    /// tool_names 用于在编造工具名时提示可用工具
    pub fn handle(&self, err: &AgentError, tool_names: &[String]) -> RecoveryAction {
        match err {
            AgentError::JsonParseError(raw) => RecoveryAction::RetryWithPrompt(format!(
                "Your previous output was not valid JSON: {raw}. \
                To call a tool, output exactly one JSON object and nothing else, \
                in the form {{\"tool\": \"<name>\", \"args\": {{...}}}}. \
                To answer the user, reply with plain text only."
            )),
            AgentError::HallucinatedTool(name) => RecoveryAction::RetryWithPrompt(format!(
                "Tool '{name}' does not exist. Only use these tools: {}. \
                If none of them helps, answer the user directly in plain text.",
                tool_names.join(", ")
            )),
            AgentError::LlmError(_)
            | AgentError::ToolExecutionFailed(_)
            | AgentError::ToolTimeout(_)
            | AgentError::StepBudgetExhausted(_)
            | AgentError::EmptyAnswer
            | AgentError::Cancelled => RecoveryAction::Abort,
        }
    }
}
