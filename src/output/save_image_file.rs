// 该文件是 Renlian （人脸） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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

use image::{ImageError, RgbImage};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum EncodeError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(image::ImageError),
}

impl From<ImageError> for EncodeError {
  fn from(err: ImageError) -> Self {
    match err {
      ImageError::IoError(err) => EncodeError::IoError(err),
      err => EncodeError::ImageError(err),
    }
  }
}

/// 按扩展名选择格式写出图像，目标文件存在时覆盖
///
/// 不会创建缺失的父目录。
pub fn encode(image: &RgbImage, path: impl AsRef<Path>) -> Result<(), EncodeError> {
  let path = path.as_ref();
  image.save(path)?;
  info!("保存图像到文件: {}", path.display());
  Ok(())
}
