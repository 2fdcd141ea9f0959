// 该文件是 Renlian （人脸） 项目的一部分。
// src/bin/detect.rs - 命令行人脸检测
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::{path::PathBuf, sync::Arc};

use anyhow::{Result, ensure};
use clap::Parser;
use tracing::info;

use renlian::{
  input::decode_file,
  model::{ModelArtifacts, ResSsdBuilder},
  output::{Record, encode, faces_path},
  task::DetectTask,
};

/// 对单张图像做人脸检测并保存标注结果
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入图像 (PNG / JPEG)
  #[arg(long, value_name = "FILE")]
  pub image: PathBuf,
  /// 网络结构文件路径
  #[arg(long, value_name = "FILE")]
  pub proto: PathBuf,
  /// 权重文件路径
  #[arg(long, value_name = "FILE")]
  pub model: PathBuf,
  /// 置信度阈值
  #[arg(long, allow_negative_numbers = true, value_name = "THRESHOLD")]
  pub confidence: f32,
  /// 输出路径，默认在输入旁边加 `_faces` 后缀
  #[arg(long, value_name = "OUTPUT")]
  pub output: Option<PathBuf>,
  /// 同时写出 JSON 检测记录
  #[arg(long)]
  pub record: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("输入图像: {}", args.image.display());
  info!("网络结构文件: {}", args.proto.display());
  info!("权重文件: {}", args.model.display());
  info!("置信度阈值: {}", args.confidence);

  ensure!(
    args.image.is_file(),
    "image {} does not exist or is not a file",
    args.image.display()
  );
  ensure!(
    args.confidence >= 0.0,
    "confidence must be at least 0.0, got {}",
    args.confidence
  );
  let artifacts = ModelArtifacts::new(&args.proto, &args.model);
  artifacts.check()?;

  let image = decode_file(&args.image)?;
  let model = ResSsdBuilder::new(artifacts).build()?;
  let task = DetectTask::new(Arc::new(model));

  let result = task.run_image(image, args.confidence)?;
  for item in result.items.iter() {
    info!(
      "  - {:.2}% at ({}, {}) - ({}, {})",
      item.detection.confidence * 100.0,
      item.rect[0],
      item.rect[1],
      item.rect[2],
      item.rect[3]
    );
  }

  let output = args.output.unwrap_or_else(|| faces_path(&args.image));
  encode(&result.image, &output)?;
  info!("检测到 {} 张人脸，结果保存到: {}", result.accepted, output.display());

  if args.record {
    Record {
      threshold: args.confidence,
    }
    .record(&result, &output)?;
  }

  Ok(())
}
