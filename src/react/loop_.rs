//! ReAct 主循环
//!
//! Plan -> Act (Tool) -> Observe -> 下一轮 Plan；每次调用 Planner 消耗一步，
//! 步数预算耗尽、LLM 失败或取消均返回错误。工具失败写回为 Observation，由模型自行调整。

use tokio_util::sync::CancellationToken;

use crate::core::{AgentError, RecoveryAction, RecoveryEngine};
use crate::llm::Message;
use crate::react::{parse_llm_output, Planner, PlannerOutput};
use crate::tools::ToolExecutor;

/// Observation 预览最大字符数（日志用）
const OBSERVATION_PREVIEW_CHARS: usize = 200;

/// ReAct 循环执行结果：最终回复与实际消耗的步数
#[derive(Debug, Clone, PartialEq)]
pub struct ReactResult {
    pub response: String,
    pub steps: u32,
}

/// 单次 ReAct 运行所需组件
pub struct ReactSession<'a> {
    pub planner: &'a Planner,
    pub executor: &'a ToolExecutor,
    pub recovery: &'a RecoveryEngine,
    pub cancel_token: CancellationToken,
}

impl<'a> ReactSession<'a> {
    pub fn new(
        planner: &'a Planner,
        executor: &'a ToolExecutor,
        recovery: &'a RecoveryEngine,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            planner,
            executor,
            recovery,
            cancel_token,
        }
    }

    /// 基础 prompt + 可用工具 + 调用格式
    fn system_prompt(&self) -> String {
        format!(
            "{}\n\n## Available tools\n{}\n\n## Tool call format\nTo call a tool, output ONLY one JSON object matching this schema:\n{}\nWhen you have the final answer, reply in plain text without JSON.",
            self.planner.base_system_prompt(),
            self.executor.tools_schema_json(),
            crate::react::tool_call_schema_json(),
        )
    }
}

fn preview(s: &str) -> String {
    if s.chars().count() > OBSERVATION_PREVIEW_CHARS {
        format!("{}...", s.chars().take(OBSERVATION_PREVIEW_CHARS).collect::<String>())
    } else {
        s.to_string()
    }
}

/// 执行 ReAct 循环，最多调用 Planner step_budget 次
pub async fn react_loop(
    session: &ReactSession<'_>,
    user_input: &str,
    step_budget: u32,
) -> Result<ReactResult, AgentError> {
    let system = session.system_prompt();
    let tool_names = session.executor.tool_names();
    let mut messages = vec![Message::user(user_input.to_string())];

    for step in 1..=step_budget {
        if session.cancel_token.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        let planned = tokio::select! {
            biased;
            _ = session.cancel_token.cancelled() => return Err(AgentError::Cancelled),
            r = session.planner.plan_with_system(&messages, &system) => r,
        };
        let output = match planned {
            Ok(o) => o,
            Err(e) => {
                tracing::warn!(step, error = %e, "planner failed");
                return Err(e);
            }
        };

        let parsed = match parse_llm_output(&output) {
            Ok(PlannerOutput::ToolCall(tc)) if !session.executor.has_tool(&tc.tool) => {
                Err(AgentError::HallucinatedTool(tc.tool))
            }
            other => other,
        };

        match parsed {
            Ok(PlannerOutput::Response(resp)) => {
                tracing::info!(step, "react loop finished");
                return Ok(ReactResult {
                    response: resp,
                    steps: step,
                });
            }
            Ok(PlannerOutput::ToolCall(tc)) => {
                let observation = match session.executor.execute(&tc.tool, tc.args.clone()).await {
                    Ok(r) => r,
                    Err(e) => format!("Error: {}", e),
                };
                tracing::debug!(step, tool = %tc.tool, observation = %preview(&observation), "observation");
                messages.push(Message::assistant(output));
                messages.push(Message::user(format!(
                    "Observation from {}: {}",
                    tc.tool, observation
                )));
            }
            Err(e) => match session.recovery.handle(&e, &tool_names) {
                RecoveryAction::RetryWithPrompt(prompt) => {
                    tracing::warn!(step, error = %e, "retrying with corrective prompt");
                    messages.push(Message::assistant(output));
                    messages.push(Message::user(prompt));
                }
                RecoveryAction::Abort => return Err(e),
            },
        }
    }

    Err(AgentError::StepBudgetExhausted(step_budget))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::llm::{LlmError, MockLlmClient};
    use crate::tools::{ClockTool, Toolbox};

    fn components(mock: Arc<MockLlmClient>) -> (Planner, ToolExecutor, RecoveryEngine) {
        (
            Planner::new(mock, "You are a helpful assistant."),
            ToolExecutor::new(Toolbox::new().with(ClockTool), 5),
            RecoveryEngine::new(),
        )
    }

    #[tokio::test]
    async fn test_tool_then_answer() {
        let mock = Arc::new(MockLlmClient::scripted([
            r#"{"tool": "clock", "args": {}}"#,
            "Today is a fine day.",
        ]));
        let (planner, executor, recovery) = components(mock.clone());
        let session = ReactSession::new(&planner, &executor, &recovery, CancellationToken::new());

        let result = react_loop(&session, "what day is it?", 5).await.unwrap();
        assert_eq!(result.response, "Today is a fine day.");
        assert_eq!(result.steps, 2);

        let second = &mock.requests()[1];
        assert!(second[0].content.contains("clock"));
        assert!(second.last().unwrap().content.starts_with("Observation from clock: UTC:"));
    }

    #[tokio::test]
    async fn test_hallucinated_tool_gets_corrective_prompt() {
        let mock = Arc::new(MockLlmClient::scripted([
            r#"{"tool": "browser", "args": {"url": "x"}}"#,
            "Fine, answering directly.",
        ]));
        let (planner, executor, recovery) = components(mock.clone());
        let session = ReactSession::new(&planner, &executor, &recovery, CancellationToken::new());

        let result = react_loop(&session, "open the site", 3).await.unwrap();
        assert_eq!(result.response, "Fine, answering directly.");
        assert!(mock.requests()[1].last().unwrap().content.contains("does not exist"));
    }

    #[tokio::test]
    async fn test_budget_exhausted() {
        let mock = Arc::new(MockLlmClient::scripted([
            r#"{"tool": "clock"}"#,
            r#"{"tool": "clock"}"#,
            r#"{"tool": "clock"}"#,
        ]));
        let (planner, executor, recovery) = components(mock.clone());
        let session = ReactSession::new(&planner, &executor, &recovery, CancellationToken::new());

        let err = react_loop(&session, "loop forever", 2).await.unwrap_err();
        assert!(matches!(err, AgentError::StepBudgetExhausted(2)));
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_llm_failure_aborts() {
        let mock = Arc::new(MockLlmClient::new());
        mock.push_error(LlmError::Request("503".into()));
        let (planner, executor, recovery) = components(mock);
        let session = ReactSession::new(&planner, &executor, &recovery, CancellationToken::new());

        let err = react_loop(&session, "hi", 5).await.unwrap_err();
        assert!(matches!(err, AgentError::LlmError(_)));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let mock = Arc::new(MockLlmClient::new());
        let (planner, executor, recovery) = components(mock.clone());
        let token = CancellationToken::new();
        token.cancel();
        let session = ReactSession::new(&planner, &executor, &recovery, token);

        let err = react_loop(&session, "hi", 5).await.unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
        assert_eq!(mock.calls(), 0);
    }
}
