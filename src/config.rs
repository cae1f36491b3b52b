//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `USERNL__*` 覆盖（双下划线表示嵌套，如 `USERNL__LLM__MODEL=gpt-4o`），
//! 最后兼容旧部署的变量：`OPENAI_MODEL`、`USERS_JSON`、`FRONTEND_ORIGIN`。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub store: StoreSection,
    pub crud: CrudSection,
    pub llm: LlmSection,
    pub agent: AgentSection,
    pub tools: ToolsSection,
    pub server: ServerSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [store] 段：用户记录 JSON 文件路径
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/users.json")
}

/// [crud] 段：批量随机创建的上限
#[derive(Debug, Clone, Deserialize)]
pub struct CrudSection {
    #[serde(default = "default_max_bulk_count")]
    pub max_bulk_count: u64,
}

impl Default for CrudSection {
    fn default() -> Self {
        Self {
            max_bulk_count: default_max_bulk_count(),
        }
    }
}

fn default_max_bulk_count() -> u64 {
    1000
}

/// [llm] 段：后端选择、模型与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：openai / mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

/// [agent] 段：工具 Agent 的步数预算与工具超时
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    /// 请求未携带 max_steps 时的默认步数
    #[serde(default = "default_max_steps")]
    pub default_max_steps: u32,
    /// 请求 max_steps 的上限（超出则截断）
    #[serde(default = "default_max_steps_cap")]
    pub max_steps_cap: u32,
    /// 单次工具调用超时（秒）
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    /// 覆盖工具 Agent 的基础 system prompt
    pub system_prompt: Option<String>,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            default_max_steps: default_max_steps(),
            max_steps_cap: default_max_steps_cap(),
            tool_timeout_secs: default_tool_timeout_secs(),
            system_prompt: None,
        }
    }
}

fn default_max_steps() -> u32 {
    30
}

fn default_max_steps_cap() -> u32 {
    100
}

fn default_tool_timeout_secs() -> u64 {
    30
}

/// [tools] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ToolsSection {
    #[serde(default)]
    pub search: SearchSection,
}

/// [tools.search] 段：抓取 URL 的超时、最大字符数、允许的域名白名单
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSection {
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_result_chars")]
    pub max_result_chars: usize,
    #[serde(default = "default_allowed_domains")]
    pub allowed_domains: Vec<String>,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_search_timeout_secs(),
            max_result_chars: default_max_result_chars(),
            allowed_domains: default_allowed_domains(),
        }
    }
}

fn default_search_timeout_secs() -> u64 {
    15
}

fn default_max_result_chars() -> usize {
    8000
}

fn default_allowed_domains() -> Vec<String> {
    vec![
        "en.wikipedia.org".into(),
        "vi.wikipedia.org".into(),
        "github.com".into(),
        "raw.githubusercontent.com".into(),
        "stackoverflow.com".into(),
        "docs.rs".into(),
        "doc.rust-lang.org".into(),
        "developer.mozilla.org".into(),
        "news.ycombinator.com".into(),
        "www.reddit.com".into(),
        "wttr.in".into(),
        "www.weather.com".into(),
        "openweathermap.org".into(),
        "vnexpress.net".into(),
    ]
}

/// [server] 段：HTTP 监听地址与允许跨域的前端 Origin
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_frontend_origin")]
    pub frontend_origin: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            frontend_origin: default_frontend_origin(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_frontend_origin() -> String {
    "http://localhost:5173".to_string()
}

/// 从 config 目录加载配置，环境变量可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 叠加环境变量 USERNL__*（双下划线表示嵌套键）
/// 4. 旧变量 OPENAI_MODEL / USERS_JSON / FRONTEND_ORIGIN 最后覆盖
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("USERNL")
            .separator("__")
            .try_parsing(true),
    );

    builder = builder
        .set_override_option("llm.model", std::env::var("OPENAI_MODEL").ok())?
        .set_override_option("store.path", std::env::var("USERS_JSON").ok())?
        .set_override_option("server.frontend_origin", std::env::var("FRONTEND_ORIGIN").ok())?;

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.store.path, PathBuf::from("data/users.json"));
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert_eq!(cfg.agent.default_max_steps, 30);
        assert_eq!(cfg.crud.max_bulk_count, 1000);
        assert_eq!(cfg.server.frontend_origin, "http://localhost:5173");
        assert!(cfg.tools.search.allowed_domains.iter().any(|d| d == "docs.rs"));
    }

    #[test]
    fn test_load_from_file_with_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[store]\npath = \"/tmp/other.json\"\n[agent]\nmax_steps_cap = 7\n",
        )
        .unwrap();

        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.store.path, PathBuf::from("/tmp/other.json"));
        assert_eq!(cfg.agent.max_steps_cap, 7);
        assert_eq!(cfg.agent.default_max_steps, 30);
        assert_eq!(cfg.llm.provider, "openai");
    }

    /// 测试结束（含 panic）时清掉设置过的环境变量
    struct EnvVars(Vec<&'static str>);

    impl EnvVars {
        fn set(vars: &[(&'static str, &str)]) -> Self {
            for (k, v) in vars {
                std::env::set_var(k, v);
            }
            Self(vars.iter().map(|(k, _)| *k).collect())
        }
    }

    impl Drop for EnvVars {
        fn drop(&mut self) {
            for k in &self.0 {
                std::env::remove_var(k);
            }
        }
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[llm]
model = "file-model"

[store]
path = "/tmp/from-file.json"

[crud]
max_bulk_count = 50

[agent]
max_steps_cap = 7

[server]
frontend_origin = "http://file.example"
"#,
        )
        .unwrap();

        let _env = EnvVars::set(&[
            ("USERNL__AGENT__MAX_STEPS_CAP", "9"),
            ("USERNL__LLM__MODEL", "nested-model"),
            ("OPENAI_MODEL", "legacy-model"),
            ("USERS_JSON", "/tmp/from-env.json"),
            ("FRONTEND_ORIGIN", "http://env.example"),
        ]);

        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.agent.max_steps_cap, 9);
        // 旧变量名优先于 USERNL__ 嵌套键
        assert_eq!(cfg.llm.model, "legacy-model");
        assert_eq!(cfg.store.path, PathBuf::from("/tmp/from-env.json"));
        assert_eq!(cfg.server.frontend_origin, "http://env.example");
        assert_eq!(cfg.crud.max_bulk_count, 50);
    }
}
