// 该文件是 Renlian （人脸） 项目的一部分。
// src/output/record.rs - 检测结果记录
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

use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;

use crate::output::DetectionResult;

#[derive(Error, Debug)]
pub enum RecordError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 把接受的检测写成与图像同名的 JSON 文件
pub struct Record {
  pub threshold: f32,
}

impl Record {
  pub fn to_json(&self, result: &DetectionResult) -> Value {
    let faces: Vec<Value> = result
      .items
      .iter()
      .map(|item| {
        json!({
          "confidence": item.detection.confidence,
          "bbox": item.detection.bbox,
          "rect": item.rect,
        })
      })
      .collect();

    json!({
      "threshold": self.threshold,
      "width": result.image.width(),
      "height": result.image.height(),
      "count": result.accepted,
      "faces": faces,
    })
  }

  pub fn record(&self, result: &DetectionResult, path: &Path) -> Result<PathBuf, RecordError> {
    let path = path.with_extension("json");
    let document = serde_json::to_string_pretty(&self.to_json(result))?;
    std::fs::write(&path, document)?;
    info!("保存检测记录到文件: {}", path.display());
    Ok(path)
  }
}
