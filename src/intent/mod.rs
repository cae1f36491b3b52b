//! 意图层：Action 定义、解析指令与 IntentParser

pub mod action;
pub mod parser;
pub mod prompt;

pub use action::{Action, ActionKind, Command, ParseError};
pub use parser::{parse_command, IntentParser};
pub use prompt::{intent_system_prompt, INTENT_INSTRUCTION};
