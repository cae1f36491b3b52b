//! CRUD 层：在 RecordStore 上校验并执行结构化 Action

pub mod executor;
pub mod random;

pub use executor::{ActionExecutor, ExecutionResult};
