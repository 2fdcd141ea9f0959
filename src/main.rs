// 该文件是 Renlian （人脸） 项目的一部分。
// src/main.rs - 人脸检测 Web 服务
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

mod args;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use renlian::{
  model::{ModelArtifacts, ResSsdBuilder},
  task::DetectTask,
  web::{AppState, router},
};

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("网络结构文件: {}", args.architecture.display());
  info!("权重文件: {}", args.weights.display());
  info!("结果目录: {}", args.output_dir.display());

  info!("正在加载模型...");
  let now = std::time::Instant::now();
  let model = ResSsdBuilder::new(ModelArtifacts::new(&args.architecture, &args.weights))
    .intra_threads(args.threads)
    .build()?;
  info!("模型加载完成，耗时: {:.2?}", now.elapsed());

  tokio::fs::create_dir_all(&args.output_dir)
    .await
    .with_context(|| format!("无法创建结果目录 {}", args.output_dir.display()))?;

  let state = Arc::new(AppState::new(
    DetectTask::new(Arc::new(model)),
    args.output_dir,
  ));

  let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port))
    .await
    .with_context(|| format!("无法监听 {}:{}", args.host, args.port))?;
  info!("服务已启动: http://{}", listener.local_addr()?);

  axum::serve(listener, router(state))
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  info!("服务已停止");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(err) = tokio::signal::ctrl_c().await {
    tracing::error!("无法监听退出信号: {}", err);
    std::future::pending::<()>().await;
  }
  info!("收到退出信号，正在关闭...");
}
