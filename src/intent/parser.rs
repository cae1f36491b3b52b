//! IntentParser：自由文本 -> Action
//!
//! 调用 oracle（LlmClient）并以固定指令要求输出 JSON；从回复中提取 JSON（```json 块或首个 `{` 到最后一个 `}`），
//! 反序列化为 Command 后按标签校验。oracle 的判断是权威的，本地不做关键词猜测。

use std::sync::Arc;

use crate::intent::{intent_system_prompt, Action, Command, ParseError};
use crate::llm::{LlmClient, Message};

/// 意图解析器：持有 oracle 与 system prompt
pub struct IntentParser {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl IntentParser {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            system_prompt: intent_system_prompt(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// 解析用户输入为 Action；oracle 失败、输出不合法或参数不合法时返回 ParseError
    pub async fn parse(&self, text: &str) -> Result<Action, ParseError> {
        let messages = vec![
            Message::system(self.system_prompt.clone()),
            Message::user(text.to_string()),
        ];
        let raw = self.llm.complete(&messages).await?;
        tracing::debug!(raw = %raw, "intent oracle output");
        parse_command(&raw)
    }
}

/// 从 oracle 输出中提取并校验命令
pub fn parse_command(output: &str) -> Result<Action, ParseError> {
    let json_str = extract_json(output)
        .ok_or_else(|| ParseError::Malformed(format!("no JSON object in output: {}", preview(output))))?;
    let cmd: Command = serde_json::from_str(json_str)
        .map_err(|e| ParseError::Malformed(format!("{}: {}", e, preview(json_str))))?;
    Action::from_command(cmd)
}

/// 提取 JSON 块（```json ... ``` 或首个 `{` 到最后一个 `}`）
fn extract_json(output: &str) -> Option<&str> {
    let trimmed = output.trim();
    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        let block = rest.find("```").map(|end| &rest[..end]).unwrap_or(rest);
        return Some(block.trim());
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (end > start).then(|| &trimmed[start..=end])
}

fn preview(s: &str) -> String {
    const MAX: usize = 200;
    if s.chars().count() > MAX {
        format!("{}...", s.chars().take(MAX).collect::<String>())
    } else {
        s.to_string()
    }
}
