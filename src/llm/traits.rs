//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock）实现 LlmClient：complete 返回整段文本。
//! 意图解析与开放式回复都把它当作黑盒 oracle，延迟与可用性由实现自己负责。

use async_trait::async_trait;
use thiserror::Error;

/// 对话中的发言方
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

/// 发给 oracle 的一条消息
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }
}

/// LLM 调用失败的原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM request timed out after {0}s")]
    Timeout(u64),

    #[error("LLM request rejected: {0}")]
    InvalidRequest(String),

    /// 后端无法按配置创建（缺少 API Key、未知 provider）
    #[error("LLM backend not configured: {0}")]
    NotConfigured(String),
}

/// LLM 客户端 trait：非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成，返回首个 choice 的文本
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// 模型名（用于启动日志）
    fn model_name(&self) -> &str {
        "unknown"
    }
}
