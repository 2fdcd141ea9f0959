// 该文件是 Renlian （人脸） 项目的一部分。
// src/frame.rs - NCHW 网络输入定义与预处理
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

use image::{
  RgbImage,
  imageops::{self, FilterType},
};
use ndarray::Array4;
use thiserror::Error;
use tracing::debug;

const RGB_CHANNELS: usize = 3;

/// ResNet-10 SSD 人脸检测网络的输入分辨率
pub const RES_SSD_INPUT_W: u32 = 300;
pub const RES_SSD_INPUT_H: u32 = 300;
/// 训练时使用的通道均值
pub const RES_SSD_MEAN: [f32; 3] = [104.0, 177.0, 123.0];

#[derive(Error, Debug)]
pub enum PreprocessError {
  #[error("图像尺寸无效: {0}x{1}")]
  InvalidImage(u32, u32),
}

/// 网络输入的通道顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
  Rgb,
  Bgr,
}

#[derive(Debug, Clone)]
pub struct PreprocessConfig {
  pub width: u32,
  pub height: u32,
  /// 按输出通道顺序给出的均值
  pub mean: [f32; 3],
  pub scale: f32,
  pub order: ChannelOrder,
}

impl Default for PreprocessConfig {
  fn default() -> Self {
    Self {
      width: RES_SSD_INPUT_W,
      height: RES_SSD_INPUT_H,
      mean: RES_SSD_MEAN,
      scale: 1.0,
      order: ChannelOrder::Rgb,
    }
  }
}

/// 形状为 `[1, C, H, W]` 的浮点输入张量
#[derive(Debug, Clone)]
pub struct Blob {
  data: Array4<f32>,
}

impl From<Array4<f32>> for Blob {
  fn from(data: Array4<f32>) -> Self {
    Self { data }
  }
}

impl Blob {
  pub fn shape(&self) -> &[usize] {
    self.data.shape()
  }

  pub fn channels(&self) -> usize {
    self.data.dim().1
  }

  pub fn height(&self) -> usize {
    self.data.dim().2
  }

  pub fn width(&self) -> usize {
    self.data.dim().3
  }

  pub fn as_array(&self) -> &Array4<f32> {
    &self.data
  }

  pub fn into_array(self) -> Array4<f32> {
    self.data
  }
}

#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
  config: PreprocessConfig,
}

impl Preprocessor {
  pub fn new(config: PreprocessConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &PreprocessConfig {
    &self.config
  }

  /// 缩放到网络输入分辨率，减去均值并按配置排列通道
  pub fn prepare(&self, image: &RgbImage) -> Result<Blob, PreprocessError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      return Err(PreprocessError::InvalidImage(width, height));
    }

    let PreprocessConfig {
      width: dst_w,
      height: dst_h,
      mean,
      scale,
      order,
    } = self.config;

    let resized = if (width, height) == (dst_w, dst_h) {
      None
    } else {
      debug!("缩放图像 {}x{} -> {}x{}", width, height, dst_w, dst_h);
      Some(imageops::resize(image, dst_w, dst_h, FilterType::Triangle))
    };
    let resized = resized.as_ref().unwrap_or(image);

    let mut data = Array4::<f32>::zeros((1, RGB_CHANNELS, dst_h as usize, dst_w as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
      for c in 0..RGB_CHANNELS {
        let src = match order {
          ChannelOrder::Rgb => c,
          ChannelOrder::Bgr => RGB_CHANNELS - 1 - c,
        };
        data[[0, c, y as usize, x as usize]] = (pixel[src] as f32 - mean[c]) * scale;
      }
    }

    Ok(Blob { data })
  }
}
