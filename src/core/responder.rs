//! 开放式回复：降级链最后一阶段，直接把用户原文交给 LLM

use std::sync::Arc;

use crate::core::ServiceError;
use crate::llm::{LlmClient, Message};

pub struct ChatResponder {
    llm: Arc<dyn LlmClient>,
}

impl ChatResponder {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// LLM 失败或返回空白文本均为 UpstreamUnavailable
    pub async fn respond(&self, text: &str) -> Result<String, ServiceError> {
        let answer = self
            .llm
            .complete(&[Message::user(text.to_string())])
            .await
            .map_err(|e| ServiceError::UpstreamUnavailable(e.to_string()))?;
        if answer.trim().is_empty() {
            return Err(ServiceError::UpstreamUnavailable(
                "chat model returned an empty answer".to_string(),
            ));
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockLlmClient};

    #[tokio::test]
    async fn test_respond_sends_only_user_text() {
        let mock = Arc::new(MockLlmClient::scripted(["Sunny."]));
        let responder = ChatResponder::new(mock.clone());
        assert_eq!(responder.respond("weather?").await.unwrap(), "Sunny.");
        let req = &mock.requests()[0];
        assert_eq!(req.len(), 1);
        assert_eq!(req[0].content, "weather?");
    }

    #[tokio::test]
    async fn test_failures_are_upstream_unavailable() {
        let mock = Arc::new(MockLlmClient::new());
        mock.push_error(LlmError::Timeout(60));
        mock.push_reply("");
        let responder = ChatResponder::new(mock);
        let e1 = responder.respond("a").await.unwrap_err();
        let e2 = responder.respond("b").await.unwrap_err();
        assert_eq!(e1.kind(), "upstream_unavailable");
        assert_eq!(e2.kind(), "upstream_unavailable");
    }
}
