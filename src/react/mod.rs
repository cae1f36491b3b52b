//! 认知层：Planner 与 ReAct 主循环（工具 Agent 的内部实现）

pub mod loop_;
pub mod planner;

pub use loop_::{react_loop, ReactResult, ReactSession};
pub use planner::{parse_llm_output, tool_call_schema_json, Planner, PlannerOutput, ToolCall};
