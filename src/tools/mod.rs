//! 工具箱：供工具 Agent 使用（search、clock）与执行器
//!
//! 工具 Agent 不持有 RecordStore，任何工具都无法读写用户记录。

pub mod clock;
pub mod executor;
pub mod search;
pub mod toolbox;

pub use clock::ClockTool;
pub use executor::ToolExecutor;
pub use search::SearchTool;
pub use toolbox::{Tool, ToolSpec, Toolbox};
