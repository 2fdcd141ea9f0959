// 该文件是 Renlian （人脸） 项目的一部分。
// src/input.rs - 图像解码输入
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

use std::path::Path;

use image::{ImageFormat, RgbImage};
use thiserror::Error;
use tracing::{debug, error};

/// 允许解码的图像格式
pub const ALLOWED_FORMATS: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png];

#[derive(Error, Debug)]
pub enum DecodeError {
  #[error("Unsupported image format: {0}")]
  UnsupportedFormat(String),
  #[error("Corrupt image data: {0}")]
  CorruptData(image::ImageError),
  #[error("Invalid image size: {0}x{1}")]
  InvalidImage(u32, u32),
  #[error("I/O error: {0}")]
  IoError(std::io::Error),
}

impl From<std::io::Error> for DecodeError {
  fn from(err: std::io::Error) -> Self {
    DecodeError::IoError(err)
  }
}

/// 按内容识别格式并解码为 RGB 图像
pub fn decode(bytes: &[u8]) -> Result<RgbImage, DecodeError> {
  let format = image::guess_format(bytes).map_err(|e| {
    debug!("无法识别图像格式: {}", e);
    DecodeError::UnsupportedFormat("unknown".to_string())
  })?;

  if !ALLOWED_FORMATS.contains(&format) {
    error!("图像格式不在允许列表中: {:?}", format);
    return Err(DecodeError::UnsupportedFormat(format!("{:?}", format)));
  }

  let image = image::load_from_memory_with_format(bytes, format)
    .map_err(DecodeError::CorruptData)?
    .into_rgb8();

  let (width, height) = image.dimensions();
  if width == 0 || height == 0 {
    return Err(DecodeError::InvalidImage(width, height));
  }

  debug!("解码图像 {:?}: {}x{}", format, width, height);
  Ok(image)
}

pub fn decode_file(path: impl AsRef<Path>) -> Result<RgbImage, DecodeError> {
  let path = path.as_ref();
  if !path.is_file() {
    return Err(DecodeError::IoError(std::io::Error::new(
      std::io::ErrorKind::NotFound,
      format!("not a file: {}", path.display()),
    )));
  }

  let bytes = std::fs::read(path)?;
  decode(&bytes)
}
