//! 工具箱：Agent 可见的工具集合
//!
//! 每个工具在注册时给出一次 `ToolSpec`（名称、说明、参数 schema），
//! 工具箱按名称排序保存，prompt 中的工具目录由这些 spec 直接序列化而来。

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// 写进 prompt 的工具说明
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

impl ToolSpec {
    /// 无参数工具
    pub fn no_args(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, serde_json::json!({ "type": "object", "properties": {} }))
    }

    pub fn new(name: &'static str, description: &'static str, parameters: Value) -> Self {
        Self {
            name,
            description,
            parameters,
        }
    }
}

/// Agent 可调用的工具；失败以纯文本返回，由执行器转成 AgentError
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;

    async fn call(&self, args: Value) -> Result<String, String>;
}

#[derive(Default)]
pub struct Toolbox {
    entries: Vec<(ToolSpec, Arc<dyn Tool>)>,
}

impl Toolbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同名工具后注册者覆盖先注册者
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        let spec = tool.spec();
        self.entries.retain(|(s, _)| s.name != spec.name);
        let at = self
            .entries
            .partition_point(|(s, _)| s.name < spec.name);
        self.entries.insert(at, (spec, Arc::new(tool)));
        self
    }

    pub fn find(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.entries
            .binary_search_by(|(s, _)| s.name.cmp(name))
            .ok()
            .map(|i| self.entries[i].1.clone())
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(s, _)| s.name.to_string()).collect()
    }

    /// prompt 用工具目录（JSON 数组，按名称排序）
    pub fn catalog(&self) -> String {
        let specs: Vec<&ToolSpec> = self.entries.iter().map(|(s, _)| s).collect();
        serde_json::to_string_pretty(&specs).unwrap_or_else(|_| "[]".to_string())
    }
}
