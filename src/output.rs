// 该文件是 Renlian （人脸） 项目的一部分。
// src/output.rs - 输出定义
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

use std::path::{Path, PathBuf};

pub mod draw;
pub use self::draw::{AcceptedDetection, DetectionResult, Draw};

mod record;
pub use self::record::{Record, RecordError};

mod save_image_file;
pub use self::save_image_file::{EncodeError, encode};

/// 标注后图像文件名的后缀
pub const FACES_SUFFIX: &str = "_faces";

/// `photo.png` -> `photo_faces.png`
pub fn faces_file_name(file_name: &str) -> String {
  match file_name.rsplit_once('.') {
    Some((stem, ext)) if !stem.is_empty() => format!("{}{}.{}", stem, FACES_SUFFIX, ext),
    _ => format!("{}{}", file_name, FACES_SUFFIX),
  }
}

/// 与输入同目录、带后缀的输出路径
pub fn faces_path(input: &Path) -> PathBuf {
  let file_name = input
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default();
  input.with_file_name(faces_file_name(&file_name))
}
