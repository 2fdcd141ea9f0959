// 该文件是 Renlian （人脸） 项目的一部分。
// tests/common/mod.rs - 测试公共工具
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

#![allow(dead_code)]

use std::{
  io::Cursor,
  sync::atomic::{AtomicUsize, Ordering},
};

use image::{ImageFormat, Rgb, RgbImage};
use renlian::{
  frame::Blob,
  model::{Detection, InferenceError, Model},
};

/// 固定输出的模型，用来代替真实网络
pub struct FixedModel {
  detections: Vec<Detection>,
  calls: AtomicUsize,
}

impl FixedModel {
  pub fn new(detections: Vec<Detection>) -> Self {
    Self {
      detections,
      calls: AtomicUsize::new(0),
    }
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

impl Model for FixedModel {
  type Input = Blob;
  type Output = Vec<Detection>;
  type Error = InferenceError;

  fn infer(&self, input: &Blob) -> Result<Vec<Detection>, InferenceError> {
    assert_eq!(input.shape(), &[1, 3, 300, 300]);
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.detections.clone())
  }
}

pub fn face(confidence: f32, bbox: [f32; 4]) -> Detection {
  Detection { confidence, bbox }
}

pub fn gray_image(width: u32, height: u32) -> RgbImage {
  RgbImage::from_pixel(width, height, Rgb([128, 128, 128]))
}

pub fn encoded(image: &RgbImage, format: ImageFormat) -> Vec<u8> {
  let mut bytes = Cursor::new(Vec::new());
  image
    .write_to(&mut bytes, format)
    .expect("encode test image");
  bytes.into_inner()
}
