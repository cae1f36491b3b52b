//! 核心层：错误分类与恢复、开放式回复、降级链与其构建器

pub mod builder;
pub mod chain;
pub mod error;
pub mod recovery;
pub mod responder;

pub use builder::ServiceBuilder;
pub use chain::{FallbackChain, Reply, Request, DEFAULT_MAX_STEPS, MAX_STEPS_CAP};
pub use error::{AgentError, RecoveryAction, ServiceError};
pub use recovery::RecoveryEngine;
pub use responder::ChatResponder;
