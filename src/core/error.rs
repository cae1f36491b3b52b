//! 错误类型
//!
//! ServiceError：单次请求对外暴露的错误（kind 为机器可读字符串，Display 为人类可读信息）。
//! AgentError：工具 Agent（ReAct 循环）内部错误，与 RecoveryEngine 配合决定重试或终止；
//! 在降级链中任何 AgentError 都只意味着「工具阶段没有可用结果」。

use thiserror::Error;

use crate::llm::LlmError;
use crate::store::StoreError;

/// 请求级错误
#[derive(Error, Debug)]
pub enum ServiceError {
    /// 缺少或格式错误的必填字段
    #[error("{0}")]
    InvalidArgument(String),

    /// 唯一性冲突（email 已被占用）
    #[error("{0}")]
    Conflict(String),

    /// id 不存在
    #[error("{0}")]
    NotFound(String),

    /// oracle 输出无法解析为 Action
    #[error("could not parse intent: {0}")]
    IntentParse(String),

    /// 持久化文件不可读（损坏），绝不当作空集合
    #[error("user store is corrupt: {0}")]
    StoreCorrupt(String),

    /// 持久化文件 I/O 失败（权限、磁盘等）
    #[error("user store unavailable: {0}")]
    Storage(String),

    /// oracle 或工具 Agent 不可用
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("request cancelled")]
    Cancelled,
}

impl ServiceError {
    /// 机器可读的错误类别
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::InvalidArgument(_) => "invalid_argument",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::IntentParse(_) => "intent_parse_error",
            ServiceError::StoreCorrupt(_) => "store_corrupt",
            ServiceError::Storage(_) => "storage",
            ServiceError::UpstreamUnavailable(_) => "upstream_unavailable",
            ServiceError::Cancelled => "cancelled",
        }
    }

    /// HTTP 接口使用的状态码；499 沿用 nginx 的「客户端关闭请求」
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::InvalidArgument(_) => 400,
            ServiceError::Conflict(_) => 409,
            ServiceError::NotFound(_) => 404,
            ServiceError::IntentParse(_) => 422,
            ServiceError::StoreCorrupt(_) | ServiceError::Storage(_) => 500,
            ServiceError::UpstreamUnavailable(_) => 502,
            ServiceError::Cancelled => 499,
        }
    }

    /// 对外返回的错误体：{"error": {"kind": "...", "message": "..."}}
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        })
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Corrupt { .. } => ServiceError::StoreCorrupt(e.to_string()),
            StoreError::Io { .. } | StoreError::IdSpaceExhausted { .. } => {
                ServiceError::Storage(e.to_string())
            }
        }
    }
}

/// 工具 Agent 运行过程中可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    #[error("Hallucinated tool: {0}")]
    HallucinatedTool(String),

    #[error("LLM error: {0}")]
    LlmError(#[from] LlmError),

    #[error("Step budget of {0} exhausted without a final answer")]
    StepBudgetExhausted(u32),

    #[error("Agent produced an empty answer")]
    EmptyAnswer,

    #[error("Cancelled")]
    Cancelled,
}

/// 恢复引擎根据错误类型给出的建议动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// 将提示注入下一轮，让 LLM 重试（如 JSON 格式错误、编造工具名）
    RetryWithPrompt(String),
    /// 终止当前任务
    Abort,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(ServiceError::Conflict("x".into()).kind(), "conflict");
        assert_eq!(ServiceError::Cancelled.kind(), "cancelled");
        let body = ServiceError::NotFound("User not found".into()).to_json();
        assert_eq!(body["error"]["kind"], "not_found");
        assert_eq!(body["error"]["message"], "User not found");
    }

    #[test]
    fn test_store_error_mapping() {
        let corrupt = StoreError::Corrupt {
            path: PathBuf::from("users.json"),
            reason: "eof".into(),
        };
        assert!(matches!(ServiceError::from(corrupt), ServiceError::StoreCorrupt(_)));
        let io = StoreError::Io {
            path: PathBuf::from("users.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(ServiceError::from(io).kind(), "storage");
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ServiceError::InvalidArgument("x".into()).http_status(), 400);
        assert_eq!(ServiceError::IntentParse("x".into()).http_status(), 422);
        assert_eq!(ServiceError::Storage("x".into()).http_status(), 500);
        assert_eq!(ServiceError::UpstreamUnavailable("x".into()).http_status(), 502);
        assert_eq!(ServiceError::Cancelled.http_status(), 499);
    }
}
