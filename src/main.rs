//! user-nl CLI
//!
//! 一次性：`user-nl 'tạo user tên Bob, email bob@x.com'`
//! 交互：不带参数启动，逐行读取 stdin，每行输出一条 JSON 回复。
//! Ctrl-C 取消进行中的请求；空闲时直接退出（退出码 130）。

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use user_nl::config::load_config;
use user_nl::core::{FallbackChain, Request, ServiceBuilder, ServiceError};
use user_nl::observability;

#[derive(Parser, Debug)]
#[command(name = "user-nl", about = "Manage users with natural-language requests")]
struct Cli {
    /// 额外的 TOML 配置文件（叠加在 config/default.toml 之上）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 覆盖工具 Agent 步数
    #[arg(long)]
    max_steps: Option<i64>,

    /// 一次性请求；缺省进入交互模式
    query: Vec<String>,
}

fn render(result: Result<user_nl::Reply, ServiceError>) -> anyhow::Result<(String, bool)> {
    match result {
        Ok(reply) => Ok((serde_json::to_string(&reply)?, true)),
        Err(e) => Ok((e.to_json().to_string(), false)),
    }
}

/// 进行中请求的取消 token；空闲时为 None
#[derive(Clone, Default)]
struct InFlight(Arc<Mutex<Option<CancellationToken>>>);

impl InFlight {
    fn slot(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.slot() = Some(token.clone());
        token
    }

    fn finish(&self) {
        self.slot().take();
    }

    /// 有请求在跑则取消它并返回 true；空闲返回 false
    fn interrupt(&self) -> bool {
        match self.slot().take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

/// 整个进程只注册一次 SIGINT 处理：忙时取消当前请求，空闲时退出
fn spawn_interrupt_listener(in_flight: InFlight) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if in_flight.interrupt() {
                tracing::info!("interrupt: cancelling in-flight request");
            } else {
                std::process::exit(130);
            }
        }
    });
}

async fn handle_line(
    chain: &FallbackChain,
    in_flight: &InFlight,
    query: String,
    max_steps: Option<i64>,
) -> anyhow::Result<bool> {
    let request = Request { query, max_steps };
    let token = in_flight.begin();
    let result = chain.handle_with_cancel(&request, token).await;
    in_flight.finish();

    let (line, ok) = render(result)?;
    println!("{line}");
    Ok(ok)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();
    let cli = Cli::parse();

    let cfg = load_config(cli.config.clone()).context("Failed to load configuration")?;
    let chain = ServiceBuilder::new(cfg)
        .build()
        .context("Failed to create LLM backend")?;
    let in_flight = InFlight::default();
    spawn_interrupt_listener(in_flight.clone());

    if !cli.query.is_empty() {
        let ok = handle_line(&chain, &in_flight, cli.query.join(" "), cli.max_steps).await?;
        if !ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        handle_line(&chain, &in_flight, line, cli.max_steps).await?;
    }
    Ok(())
}
