//! 工具执行器
//!
//! 持有 Toolbox 与全局超时，execute(tool_name, args) 在超时内调用对应工具，
//! 超时或失败时转为 AgentError（ToolTimeout / ToolExecutionFailed）；每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::core::AgentError;
use crate::tools::Toolbox;

/// 工具执行器：对每次调用施加超时，并将结果映射为 AgentError
pub struct ToolExecutor {
    tools: Toolbox,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(tools: Toolbox, timeout_secs: u64) -> Self {
        Self {
            tools,
            timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }

    pub async fn execute(&self, tool_name: &str, args: serde_json::Value) -> Result<String, AgentError> {
        let start = Instant::now();
        let args_preview = args_preview(&args);
        let tool = self
            .tools
            .find(tool_name)
            .ok_or_else(|| AgentError::ToolExecutionFailed(format!("Unknown tool: {tool_name}")))?;
        let result = timeout(self.timeout, tool.call(args)).await;

        let (ok, outcome): (bool, &str) = match &result {
            Ok(Ok(_)) => (true, "ok"),
            Ok(Err(_)) => (false, "error"),
            Err(_) => (false, "timeout"),
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": ok,
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit, "tool");

        match result {
            Ok(Ok(content)) => Ok(content),
            Ok(Err(e)) => Err(AgentError::ToolExecutionFailed(e)),
            Err(_) => Err(AgentError::ToolTimeout(tool_name.to_string())),
        }
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.find(name).is_some()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.names()
    }

    pub fn tools_schema_json(&self) -> String {
        self.tools.catalog()
    }
}

fn args_preview(args: &serde_json::Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Tool, ToolSpec};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec::no_args("slow", "sleeps")
        }

        async fn call(&self, _args: Value) -> Result<String, String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".into())
        }
    }

    #[tokio::test]
    async fn test_timeout_maps_to_tool_timeout() {
        let exec = ToolExecutor::new(Toolbox::new().with(SlowTool), 1);
        let err = exec.execute("slow", json!({})).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolTimeout(name) if name == "slow"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_execution_failure() {
        let exec = ToolExecutor::new(Toolbox::new(), 1);
        let err = exec.execute("nope", json!({})).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolExecutionFailed(m) if m.contains("Unknown tool")));
    }
}
