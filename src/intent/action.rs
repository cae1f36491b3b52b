//! 结构化 Action：由 IntentParser 构造、由 ActionExecutor 消费的封闭意图集合
//!
//! oracle 输出先反序列化为宽松的 Command（所有字段可选），再按 action 标签逐项校验必填字段，
//! 校验通过才得到 Action。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::llm::LlmError;

/// 意图解析失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// oracle 本身不可用
    #[error("intent oracle unavailable: {0}")]
    Oracle(#[from] LlmError),

    /// oracle 输出不是合法的 Action JSON
    #[error("malformed command: {0}")]
    Malformed(String),

    /// 是 CRUD 形状的请求，但参数不合法（如 count < 1、缺少 id）
    #[error("{0}")]
    InvalidArgument(String),
}

/// Action 标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
    List,
    BulkCreateRandom,
    None,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
            ActionKind::List => "list",
            ActionKind::BulkCreateRandom => "bulk_create_random",
            ActionKind::None => "none",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "create" => Some(ActionKind::Create),
            "update" => Some(ActionKind::Update),
            "delete" => Some(ActionKind::Delete),
            "list" => Some(ActionKind::List),
            "bulk_create_random" => Some(ActionKind::BulkCreateRandom),
            "none" => Some(ActionKind::None),
            _ => None,
        }
    }
}

/// 结构化意图
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create {
        name: String,
        email: String,
    },
    /// 省略的字段（或空字符串）表示「不修改」
    Update {
        id: u64,
        name: Option<String>,
        email: Option<String>,
    },
    Delete {
        id: u64,
    },
    List,
    BulkCreateRandom {
        count: u64,
    },
    /// 不是用户管理请求
    None {
        reason: Option<String>,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Create { .. } => ActionKind::Create,
            Action::Update { .. } => ActionKind::Update,
            Action::Delete { .. } => ActionKind::Delete,
            Action::List => ActionKind::List,
            Action::BulkCreateRandom { .. } => ActionKind::BulkCreateRandom,
            Action::None { .. } => ActionKind::None,
        }
    }

    /// None 以外的 Action 才进入执行阶段
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Action::None { .. })
    }

    /// 按标签校验 Command 并构造 Action
    pub fn from_command(cmd: Command) -> Result<Self, ParseError> {
        let kind = ActionKind::from_tag(&cmd.action)
            .ok_or_else(|| ParseError::Malformed(format!("unknown action '{}'", cmd.action)))?;

        let action = match kind {
            ActionKind::Create => Action::Create {
                name: cmd.name.unwrap_or_default(),
                email: cmd.email.unwrap_or_default(),
            },
            ActionKind::Update => Action::Update {
                id: positive_int(cmd.id.as_ref(), "update requires id", "id")?,
                name: non_blank(cmd.name),
                email: non_blank(cmd.email),
            },
            ActionKind::Delete => Action::Delete {
                id: positive_int(cmd.id.as_ref(), "delete requires id", "id")?,
            },
            ActionKind::List => Action::List,
            ActionKind::BulkCreateRandom => Action::BulkCreateRandom {
                count: positive_int(
                    cmd.count.as_ref(),
                    "bulk_create_random requires positive integer count",
                    "count",
                )?,
            },
            ActionKind::None => Action::None {
                reason: non_blank(cmd.reason),
            },
        };
        Ok(action)
    }
}

/// oracle 输出的原始命令：{"action": "...", "id": int?, "name": str?, "email": str?, "count": int?, "reason": str?}
#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct Command {
    /// create | update | delete | list | bulk_create_random | none
    pub action: String,
    /// 目标用户 id（update / delete 必填）
    #[serde(default)]
    #[schemars(with = "Option<u64>")]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// 随机创建的数量（bulk_create_random 必填，>= 1）
    #[serde(default)]
    #[schemars(with = "Option<u64>")]
    pub count: Option<Value>,
    /// action 为 none 时的说明
    #[serde(default)]
    pub reason: Option<String>,
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn positive_int(v: Option<&Value>, missing: &str, field: &str) -> Result<u64, ParseError> {
    match v {
        None | Some(Value::Null) => Err(ParseError::InvalidArgument(missing.to_string())),
        Some(value) => value
            .as_u64()
            .filter(|n| *n >= 1)
            .ok_or_else(|| {
                ParseError::InvalidArgument(format!("{field} must be a positive integer, got {value}"))
            }),
    }
}
