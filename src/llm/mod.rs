//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Mock）

pub mod mock;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use crate::config::AppConfig;

pub use mock::MockLlmClient;
pub use openai::OpenAiClient;
pub use traits::{LlmClient, LlmError, Message, Role};

/// 按配置创建 oracle；API Key 取自 OPENAI_API_KEY
pub fn create_llm_from_config(cfg: &AppConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    select_llm(cfg, std::env::var("OPENAI_API_KEY").ok())
}

/// provider=mock 才使用 Mock；provider=openai 缺少 Key 时拒绝启动，不静默降级
fn select_llm(cfg: &AppConfig, api_key: Option<String>) -> Result<Arc<dyn LlmClient>, LlmError> {
    match cfg.llm.provider.trim().to_lowercase().as_str() {
        "openai" => {
            let key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
                LlmError::NotConfigured("provider is openai but OPENAI_API_KEY is not set".to_string())
            })?;
            tracing::info!("Using OpenAI LLM ({})", cfg.llm.model);
            Ok(Arc::new(
                OpenAiClient::new(cfg.llm.base_url.as_deref(), &cfg.llm.model, &key)
                    .with_request_timeout(cfg.llm.request_timeout_secs),
            ))
        }
        "mock" => {
            tracing::warn!("Using Mock LLM; replies are scripted or echoed");
            Ok(Arc::new(MockLlmClient::new()))
        }
        other => Err(LlmError::NotConfigured(format!("unknown llm provider '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_without_key_is_rejected() {
        let cfg = AppConfig::default();
        let err = select_llm(&cfg, None).err().unwrap();
        assert!(matches!(err, LlmError::NotConfigured(m) if m.contains("OPENAI_API_KEY")));
        assert!(select_llm(&cfg, Some("  ".into())).is_err());
    }

    #[test]
    fn test_provider_selection() {
        let mut cfg = AppConfig::default();
        assert_eq!(select_llm(&cfg, Some("sk-test".into())).unwrap().model_name(), "gpt-4o-mini");

        cfg.llm.provider = "Mock".into();
        assert_eq!(select_llm(&cfg, None).unwrap().model_name(), "mock");

        cfg.llm.provider = "anthropic".into();
        assert!(matches!(select_llm(&cfg, Some("k".into())), Err(LlmError::NotConfigured(_))));
    }
}
