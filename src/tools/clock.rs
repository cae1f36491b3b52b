//! Clock 工具：返回当前 UTC 与本地时间（回答「今天几号」一类问题）

use async_trait::async_trait;
use chrono::{Local, Utc};
use serde_json::Value;

use crate::tools::{Tool, ToolSpec};

pub struct ClockTool;

#[async_trait]
impl Tool for ClockTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::no_args("clock", "Current date and time (UTC and server local time). Args: {}")
    }

    async fn call(&self, _args: Value) -> Result<String, String> {
        let utc = Utc::now();
        let local = Local::now();
        Ok(format!(
            "UTC: {}\nLocal: {} ({})",
            utc.to_rfc3339(),
            local.format("%Y-%m-%d %H:%M:%S"),
            local.format("%A")
        ))
    }
}
