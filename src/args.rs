// 该文件是 Renlian （人脸） 项目的一部分。
// src/args.rs - 服务参数配置
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::PathBuf;

use clap::Parser;

/// Renlian 人脸检测服务参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 网络结构文件路径 (ONNX)
  #[arg(long, value_name = "FILE")]
  pub architecture: PathBuf,

  /// 权重文件路径（ONNX 外部数据，可与结构文件相同）
  #[arg(long, value_name = "FILE")]
  pub weights: PathBuf,

  /// 标注结果保存目录
  #[arg(long, default_value = "outputs", value_name = "DIR")]
  pub output_dir: PathBuf,

  /// 监听地址
  #[arg(long, default_value = "0.0.0.0", value_name = "HOST")]
  pub host: String,

  /// 监听端口
  #[arg(long, env = "PORT", default_value = "5000", value_name = "PORT")]
  pub port: u16,

  /// 推理线程数
  #[arg(long, default_value = "1", value_name = "COUNT")]
  pub threads: usize,
}
