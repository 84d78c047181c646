//! # Transcript CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 事件渲染预览
//! - 将事件写入转录并投递到 pickup 目录
//! - 可选：把本次命令自身的日志也作为转录投递

mod cli;
mod commands;
mod error;
mod logging;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_render, run_transcript, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let run_log = logging::init(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Transcript CLI starting");

    let result = match &cli.command {
        Commands::Run(args) => run_transcript(args).await,
        Commands::Render(args) => run_render(args),
        Commands::Validate(args) => run_validate(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    // The global subscriber holds the sink forever, so it is never dropped
    if let Some(sink) = run_log {
        tokio::task::spawn_blocking(move || sink.close()).await?;
    }

    result
}
