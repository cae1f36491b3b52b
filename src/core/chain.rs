//! 降级链：意图解析 -> CRUD 执行 -> 工具 Agent -> 开放式回复
//!
//! 每个阶段只尝试一次。CRUD 形态的请求一旦被识别，其错误（参数、冲突、不存在、存储）即为最终结果；
//! 只有「不是 CRUD 请求」（None、解析失败、oracle 不可用）才会落到工具阶段。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::agent::{AgentQuery, ToolAgent};
use crate::core::{AgentError, ChatResponder, ServiceError};
use crate::crud::{ActionExecutor, ExecutionResult};
use crate::intent::{Action, ActionKind, IntentParser, ParseError};
use crate::store::{RecordStore, UserRecord};

/// 请求未指定 max_steps 时的步数
pub const DEFAULT_MAX_STEPS: u32 = 30;
/// 请求 max_steps 的上限
pub const MAX_STEPS_CAP: u32 = 100;

/// 单次请求：{"query": "...", "max_steps": 30}
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Request {
    pub query: String,
    /// 仅供工具 Agent 使用；有符号以便把负数识别为参数错误
    #[serde(default)]
    pub max_steps: Option<i64>,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_steps: None,
        }
    }

    pub fn with_max_steps(mut self, steps: i64) -> Self {
        self.max_steps = Some(steps);
        self
    }
}

/// 成功回复，按 mode 打标签序列化
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Reply {
    Crud {
        action: ActionKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        count: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        user: Option<UserRecord>,
        #[serde(skip_serializing_if = "Option::is_none")]
        users: Option<Vec<UserRecord>>,
    },
    Tool {
        result: String,
    },
    Chat {
        result: String,
    },
}

impl Reply {
    pub fn mode(&self) -> &'static str {
        match self {
            Reply::Crud { .. } => "crud",
            Reply::Tool { .. } => "tool",
            Reply::Chat { .. } => "chat",
        }
    }
}

impl From<ExecutionResult> for Reply {
    fn from(result: ExecutionResult) -> Self {
        let action = result.kind();
        let (count, user, users) = match result {
            ExecutionResult::Listed(users) => (None, None, Some(users)),
            ExecutionResult::Created(u) | ExecutionResult::Updated(u) | ExecutionResult::Deleted(u) => {
                (None, Some(u), None)
            }
            ExecutionResult::BulkCreated(users) => (Some(users.len()), None, Some(users)),
        };
        Reply::Crud {
            action,
            count,
            user,
            users,
        }
    }
}

/// 降级链
pub struct FallbackChain {
    parser: IntentParser,
    executor: ActionExecutor,
    agent: Arc<dyn ToolAgent>,
    responder: ChatResponder,
    default_steps: u32,
    steps_cap: u32,
}

impl FallbackChain {
    pub fn new(
        parser: IntentParser,
        executor: ActionExecutor,
        agent: Arc<dyn ToolAgent>,
        responder: ChatResponder,
    ) -> Self {
        Self {
            parser,
            executor,
            agent,
            responder,
            default_steps: DEFAULT_MAX_STEPS,
            steps_cap: MAX_STEPS_CAP,
        }
    }

    /// 设置默认步数与上限；两者至少为 1，默认值不超过上限
    pub fn with_step_limits(mut self, default_steps: u32, steps_cap: u32) -> Self {
        self.steps_cap = steps_cap.max(1);
        self.default_steps = default_steps.clamp(1, self.steps_cap);
        self
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        self.executor.store()
    }

    pub async fn handle(&self, request: &Request) -> Result<Reply, ServiceError> {
        self.handle_with_cancel(request, CancellationToken::new()).await
    }

    /// token 被取消时立即返回 Cancelled；进行中的阶段随 future 一起被丢弃，store guard 随之释放
    pub async fn handle_with_cancel(
        &self,
        request: &Request,
        cancel_token: CancellationToken,
    ) -> Result<Reply, ServiceError> {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                tracing::warn!("request cancelled");
                Err(ServiceError::Cancelled)
            }
            r = self.run(request, &cancel_token) => r,
        }
    }

    async fn run(
        &self,
        request: &Request,
        cancel_token: &CancellationToken,
    ) -> Result<Reply, ServiceError> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(ServiceError::InvalidArgument("query is required".to_string()));
        }

        match self.parser.parse(query).await {
            Ok(action) if action.is_actionable() => {
                tracing::info!(stage = "crud", action = action.kind().as_str(), "intent recognised");
                let result = self.executor.execute(&action).await?;
                return Ok(Reply::from(result));
            }
            Ok(Action::None { reason }) => {
                tracing::info!(stage = "intent", reason = reason.as_deref().unwrap_or(""), "not a user-management request");
            }
            Ok(_) => {}
            Err(ParseError::InvalidArgument(msg)) => {
                tracing::warn!(stage = "intent", error = %msg, "invalid arguments for recognised action");
                return Err(ServiceError::InvalidArgument(msg));
            }
            Err(e) => {
                tracing::warn!(stage = "intent", error = %e, "intent parsing failed, falling through");
            }
        }

        // max_steps 只约束工具 Agent，CRUD 请求不校验
        let step_budget = self.step_budget(request.max_steps)?;
        let agent_query = AgentQuery::new(query, step_budget).with_cancel_token(cancel_token.child_token());
        match self.agent.run(&agent_query).await {
            Ok(text) if !text.trim().is_empty() => {
                tracing::info!(stage = "tool", "tool agent answered");
                return Ok(Reply::Tool { result: text });
            }
            Ok(_) => tracing::warn!(stage = "tool", "tool agent returned an empty answer, falling through"),
            Err(AgentError::Cancelled) if cancel_token.is_cancelled() => {
                return Err(ServiceError::Cancelled);
            }
            Err(e) => tracing::warn!(stage = "tool", error = %e, "tool agent failed, falling through"),
        }

        let result = self.responder.respond(query).await?;
        tracing::info!(stage = "chat", "open response produced");
        Ok(Reply::Chat { result })
    }

    fn step_budget(&self, requested: Option<i64>) -> Result<u32, ServiceError> {
        match requested {
            None => Ok(self.default_steps),
            Some(n) if n < 1 => Err(ServiceError::InvalidArgument(format!(
                "max_steps must be >= 1, got {n}"
            ))),
            Some(n) => Ok(n.min(self.steps_cap as i64) as u32),
        }
    }
}
