//! user-nl - 自然语言用户管理
//!
//! 一条自由文本请求依次经过：意图解析 -> CRUD 执行 -> 工具 Agent -> 开放式回复。
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **observability**: tracing 初始化
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **store**: 用户记录与 JSON 文件存储（独占 guard）
//! - **intent**: Action 定义与 IntentParser
//! - **crud**: ActionExecutor 与随机身份生成
//! - **tools**: 工具箱（search、clock）与执行器
//! - **react**: Planner 与 ReAct 主循环
//! - **agent**: ToolAgent 抽象与 ReAct 实现
//! - **core**: 错误分类、恢复、降级链
//! - **http**: axum 路由（feature `web`）

pub mod agent;
pub mod config;
pub mod core;
pub mod crud;
#[cfg(feature = "web")]
pub mod http;
pub mod intent;
pub mod llm;
pub mod observability;
pub mod react;
pub mod store;
pub mod tools;

pub use crate::core::{FallbackChain, Reply, Request, ServiceBuilder, ServiceError};
