//! HTTP 接口测试：oneshot 请求直达路由，不绑定端口

#![cfg(feature = "web")]

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use tower::ServiceExt;

    use user_nl::agent::{AgentQuery, ToolAgent};
    use user_nl::config::AppConfig;
    use user_nl::core::{AgentError, ServiceBuilder};
    use user_nl::http::{router, AppState};
    use user_nl::llm::MockLlmClient;

    struct NoAgent;

    #[async_trait::async_trait]
    impl ToolAgent for NoAgent {
        async fn run(&self, _query: &AgentQuery) -> Result<String, AgentError> {
            Err(AgentError::EmptyAnswer)
        }
    }

    fn app(dir: &tempfile::TempDir, oracle: Arc<MockLlmClient>) -> Router {
        let mut config = AppConfig::default();
        config.store.path = dir.path().join("users.json");
        let chain = ServiceBuilder::new(config.clone())
            .with_llm(oracle)
            .with_tool_agent(Arc::new(NoAgent))
            .build()
            .unwrap();
        router(Arc::new(AppState { config, chain }))
    }

    fn post_nl(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/users/nl")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_body_without_query_is_json_400() {
        let dir = tempfile::tempdir().unwrap();
        let oracle = Arc::new(MockLlmClient::new());
        let app = app(&dir, oracle.clone());

        for body in ["{}", "not json", r#"{"query": 7}"#] {
            let resp = app.clone().oneshot(post_nl(body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
            let v = json_body(resp).await;
            assert_eq!(v["error"]["kind"], "invalid_argument", "body: {body}");
            assert!(v["error"]["message"].as_str().is_some());
        }
        assert_eq!(oracle.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_json_400() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, Arc::new(MockLlmClient::new()));
        let req = Request::builder()
            .method("POST")
            .uri("/api/users/nl")
            .body(Body::from(r#"{"query": "list users"}"#))
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"]["kind"], "invalid_argument");
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let dir = tempfile::tempdir().unwrap();
        let oracle = Arc::new(MockLlmClient::scripted([
            r#"{"action": "create", "name": "Bob", "email": "bob@x.com"}"#,
        ]));
        let app = app(&dir, oracle);

        let resp = app
            .clone()
            .oneshot(post_nl(r#"{"query": "add Bob bob@x.com"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = json_body(resp).await;
        assert_eq!(v["mode"], "crud");
        assert_eq!(v["user"]["id"], 1);

        let req = Request::builder().uri("/api/users").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["users"][0]["email"], "bob@x.com");
    }

    #[tokio::test]
    async fn test_service_error_status_and_body() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, Arc::new(MockLlmClient::new()));

        let resp = app
            .oneshot(post_nl(r#"{"query": "   "}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"]["kind"], "invalid_argument");
    }
}
