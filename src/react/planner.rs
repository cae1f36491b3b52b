//! Planner：调用 LLM 规划下一步，并把输出解析为 Tool Call 或最终回复
//!
//! 解析规则：能提取出含非空 "tool" 的 JSON 即为 ToolCall；看起来是 JSON 却解析失败为 JsonParseError
//! （交给 RecoveryEngine 重试）；其余文本为最终回复。

use std::sync::Arc;

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::core::AgentError;
use crate::llm::{LlmClient, Message};

/// LLM 返回的 Tool Call：{"tool": "search", "args": {"url": "..."}}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolCall {
    /// 工具名，如 search、clock
    pub tool: String,
    /// 工具参数，依工具不同而不同
    #[serde(default)]
    #[schemars(with = "std::collections::HashMap<String, String>")]
    pub args: serde_json::Value,
}

/// Planner 输出
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerOutput {
    /// 直接回复用户
    Response(String),
    /// 需要执行工具
    ToolCall(ToolCall),
}

/// 工具调用的 JSON Schema 字符串，拼入 system prompt
pub fn tool_call_schema_json() -> String {
    serde_json::to_string_pretty(&schema_for!(ToolCall)).unwrap_or_default()
}

pub fn parse_llm_output(output: &str) -> Result<PlannerOutput, AgentError> {
    let trimmed = output.trim();

    let fenced = trimmed.find("```json").map(|start| {
        let rest = &trimmed[start + 7..];
        rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim())
    });
    let json_str = match fenced {
        Some(block) => block,
        None => match (trimmed.find('{'), trimmed.rfind('}')) {
            (Some(start), Some(end)) if end > start => &trimmed[start..=end],
            _ => return Ok(PlannerOutput::Response(trimmed.to_string())),
        },
    };

    match serde_json::from_str::<ToolCall>(json_str) {
        Ok(tc) if !tc.tool.trim().is_empty() => Ok(PlannerOutput::ToolCall(tc)),
        Ok(_) => Ok(PlannerOutput::Response(trimmed.to_string())),
        // 整段输出就是 JSON（或 ```json 块）却不合法：模型想调用工具但格式错了
        Err(e) if fenced.is_some() || trimmed.starts_with('{') => {
            Err(AgentError::JsonParseError(format!("{}: {}", e, json_str)))
        }
        Err(_) => Ok(PlannerOutput::Response(trimmed.to_string())),
    }
}

/// Planner：持有 LLM 与基础 system prompt
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn base_system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// 以给定 system 拼接对话后调用 LLM
    pub async fn plan_with_system(
        &self,
        messages: &[Message],
        system: &str,
    ) -> Result<String, AgentError> {
        let mut full_messages = vec![Message::system(system.to_string())];
        full_messages.extend(messages.iter().cloned());
        Ok(self.llm.complete(&full_messages).await?)
    }
}
