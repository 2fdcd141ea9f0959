// 该文件是 Renlian （人脸） 项目的一部分。
// src/model.rs - 模型
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use thiserror::Error;

use crate::frame::Blob;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 网络给出的单个候选人脸
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
  pub confidence: f32,
  pub bbox: [f32; 4], // 归一化坐标 [x_min, y_min, x_max, y_max]
}

#[derive(Error, Debug)]
pub enum InferenceError {
  #[error("输入张量形状错误: {0:?}")]
  InputShape(Vec<usize>),
  #[error("输出张量形状错误: {0:?}")]
  OutputShape(Vec<usize>),
  #[error("ONNX Runtime 错误: {0}")]
  Runtime(#[from] ort::Error),
}

/// 可在多个请求间共享的人脸检测模型
pub trait FaceModel:
  Model<Input = Blob, Output = Vec<Detection>, Error = InferenceError> + Send + Sync
{
}

impl<M> FaceModel for M where
  M: Model<Input = Blob, Output = Vec<Detection>, Error = InferenceError> + Send + Sync
{
}

mod res_ssd;
pub use self::res_ssd::{ModelArtifacts, ModelLoadError, ResSsd, ResSsdBuilder};
