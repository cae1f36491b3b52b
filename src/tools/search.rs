//! Search/Web 工具：域名白名单、超时、结果大小限制
//!
//! 仅允许配置中的域名；GET 请求带超时与 User-Agent；HTML 响应用 html2text 提取可读文本，
//! 超过 max_result_chars 时截断并追加 ...[truncated]。

use std::collections::HashSet;

use async_trait::async_trait;
use html2text::from_read;
use reqwest::Client;
use serde_json::Value;

use crate::tools::{Tool, ToolSpec};

/// Search 工具：抓取 URL 内容，仅允许白名单域名
pub struct SearchTool {
    client: Client,
    allowed_domains: HashSet<String>,
    max_result_chars: usize,
}

/// 判断内容是否像 HTML（需提取可读文本）
fn looks_like_html(s: &str) -> bool {
    let s = s.trim_start();
    s.starts_with("<!")
        || s.starts_with("<html")
        || s.starts_with("<HTML")
        || (s.contains('<') && (s.contains("</") || s.contains("<head") || s.contains("<title")))
}

/// 从 URL 中提取 host（去掉协议、端口与路径）
fn extract_domain(url: &str) -> Option<String> {
    let url = url.trim();
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let host = url.split(['/', '?', '#']).next()?;
    let host = host.rsplit('@').next()?;
    let host = host.split(':').next()?;
    (!host.is_empty()).then(|| host.to_lowercase())
}

fn truncate_chars(body: String, max: usize) -> String {
    if body.chars().count() > max {
        body.chars().take(max).collect::<String>() + "\n...[truncated]"
    } else {
        body
    }
}

impl SearchTool {
    pub fn new(allowed_domains: Vec<String>, timeout_secs: u64, max_result_chars: usize) -> Self {
        let allowed_domains = allowed_domains.into_iter().map(|s| s.to_lowercase()).collect();
        const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs.max(1)))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            allowed_domains,
            max_result_chars,
        }
    }

    fn is_allowed(&self, url: &str) -> Result<(), String> {
        let domain = extract_domain(url).ok_or_else(|| "Invalid or missing URL".to_string())?;
        if self.allowed_domains.contains(&domain) {
            return Ok(());
        }
        Err(format!("Domain not in allowlist: {}", domain))
    }

    async fn fetch(&self, url: &str) -> Result<String, String> {
        self.is_allowed(url)?;
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }
        let body = resp.text().await.map_err(|e| format!("Read body: {}", e))?;
        let body = body.trim_start_matches('\u{FEFF}');

        let text = if looks_like_html(body) {
            match from_read(body.as_bytes(), 120) {
                Ok(text) if !text.trim().is_empty() => text,
                _ => body.to_string(),
            }
        } else {
            body.to_string()
        };
        Ok(truncate_chars(text, self.max_result_chars))
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "search",
            "Fetch the readable text of a web page on an allow-listed domain (Wikipedia, GitHub, docs.rs, weather sites, news). Args: {\"url\": \"https://...\"}.",
            serde_json::json!({
                "type": "object",
                "properties": { "url": { "type": "string", "description": "absolute http(s) URL" } },
                "required": ["url"]
            }),
        )
    }

    async fn call(&self, args: Value) -> Result<String, String> {
        let url = args.get("url").and_then(|v| v.as_str()).unwrap_or("").trim();
        if url.is_empty() {
            return Err("Missing url".to_string());
        }
        tracing::info!(url = %url, "search tool fetch");
        self.fetch(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://Docs.rs/tokio"), Some("docs.rs".into()));
        assert_eq!(extract_domain("http://wttr.in:80?format=3"), Some("wttr.in".into()));
        assert_eq!(extract_domain("ftp://example.com"), None);
        assert_eq!(extract_domain("https://"), None);
    }

    #[tokio::test]
    async fn test_rejects_unlisted_domain_without_network() {
        let tool = SearchTool::new(vec!["docs.rs".into()], 1, 100);
        let err = tool
            .call(serde_json::json!({"url": "https://evil.example/x"}))
            .await
            .unwrap_err();
        assert!(err.contains("allowlist"));
        let err = tool.call(serde_json::json!({})).await.unwrap_err();
        assert_eq!(err, "Missing url");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate_chars("abcdef".into(), 3), "abc\n...[truncated]");
        assert_eq!(truncate_chars("ab".into(), 3), "ab");
    }
}
