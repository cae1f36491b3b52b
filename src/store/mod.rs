//! 存储层：用户记录、记录集合与带独占 guard 的 JSON 文件存储

pub mod json_store;
pub mod record;

pub use json_store::{RecordStore, StoreError, StoreGuard};
pub use record::{RecordCollection, UserRecord};
