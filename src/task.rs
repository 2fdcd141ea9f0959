// 该文件是 Renlian （人脸） 项目的一部分。
// src/task.rs - 单张图像检测任务
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

use std::sync::Arc;

use image::RgbImage;
use thiserror::Error;
use tracing::info;

use crate::{
  frame::{PreprocessError, Preprocessor},
  input::{DecodeError, decode},
  model::{FaceModel, InferenceError},
  output::{DetectionResult, Draw},
};

#[derive(Error, Debug)]
pub enum TaskError {
  #[error("解码错误: {0}")]
  Decode(#[from] DecodeError),
  #[error("预处理错误: {0}")]
  Preprocess(#[from] PreprocessError),
  #[error("推理错误: {0}")]
  Inference(#[from] InferenceError),
}

/// 解码、预处理、推理、筛选绘制，一次请求走一遍
pub struct DetectTask<M> {
  model: Arc<M>,
  preprocessor: Preprocessor,
  draw: Draw<'static>,
}

impl<M: FaceModel> DetectTask<M> {
  pub fn new(model: Arc<M>) -> Self {
    Self {
      model,
      preprocessor: Preprocessor::default(),
      draw: Draw::default(),
    }
  }

  pub fn with_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
    self.preprocessor = preprocessor;
    self
  }

  pub fn model(&self) -> &Arc<M> {
    &self.model
  }

  pub fn run_bytes(&self, bytes: &[u8], threshold: f32) -> Result<DetectionResult, TaskError> {
    let now = std::time::Instant::now();
    let image = decode(bytes)?;
    info!("解码完成，耗时: {:.2?}", now.elapsed());
    self.run_image(image, threshold)
  }

  pub fn run_image(&self, image: RgbImage, threshold: f32) -> Result<DetectionResult, TaskError> {
    info!("开始任务...");
    let now = std::time::Instant::now();
    let blob = self.preprocessor.prepare(&image)?;
    info!("预处理完成，耗时: {:.2?}", now.elapsed());

    let now = std::time::Instant::now();
    let detections = self.model.infer(&blob)?;
    info!(
      "推理完成，耗时: {:.2?}，候选 {} 个",
      now.elapsed(),
      detections.len()
    );

    let now = std::time::Instant::now();
    let result = self.draw.filter_and_render(image, &detections, threshold);
    info!(
      "渲染完成，耗时: {:.2?}，检测到 {} 张人脸",
      now.elapsed(),
      result.accepted
    );

    Ok(result)
  }
}
