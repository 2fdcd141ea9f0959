// 该文件是 Renlian （人脸） 项目的一部分。
// src/web/form.rs - 上传表单校验
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

use thiserror::Error;

pub const IMAGE_FIELD: &str = "image";
pub const CONFIDENCE_FIELD: &str = "confidence";

/// 允许上传的扩展名（不区分大小写）
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png"];
/// 置信度阈值范围 [0.0, 0.999)
pub const CONFIDENCE_MIN: f32 = 0.0;
pub const CONFIDENCE_MAX: f32 = 0.999;

const DEFAULT_FILE_NAME: &str = "upload";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
  pub field: &'static str,
  pub message: String,
}

impl FieldError {
  pub fn new(field: &'static str, message: impl Into<String>) -> Self {
    Self {
      field,
      message: message.into(),
    }
  }
}

/// 每个出错字段一条消息
#[derive(Error, Debug)]
#[error("表单校验失败: {} 个字段", .errors.len())]
pub struct InputValidationError {
  pub errors: Vec<FieldError>,
}

impl InputValidationError {
  pub fn field(&self, field: &str) -> Option<&FieldError> {
    self.errors.iter().find(|error| error.field == field)
  }
}

#[derive(Debug, Clone, Default)]
pub struct Upload {
  pub file_name: String,
  pub bytes: Vec<u8>,
}

/// 从请求里读出的原始表单
#[derive(Debug, Clone, Default)]
pub struct Submission {
  pub image: Option<Upload>,
  pub confidence: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ValidSubmission {
  pub upload: Upload,
  pub confidence: f32,
}

pub fn allowed_extension(file_name: &str) -> bool {
  Path::new(file_name)
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
    .unwrap_or(false)
}

pub fn parse_confidence(raw: Option<&str>) -> Result<f32, String> {
  let value = raw
    .map(str::trim)
    .filter(|raw| !raw.is_empty())
    .and_then(|raw| raw.parse::<f32>().ok())
    .ok_or_else(|| "Confidence is required and must be a float".to_string())?;

  if !(CONFIDENCE_MIN..CONFIDENCE_MAX).contains(&value) {
    return Err(format!(
      "Confidence must be at least {:.1} and below {}",
      CONFIDENCE_MIN, CONFIDENCE_MAX
    ));
  }

  Ok(value)
}

pub fn validate(submission: Submission) -> Result<ValidSubmission, InputValidationError> {
  let mut errors = Vec::new();

  let confidence = parse_confidence(submission.confidence.as_deref())
    .map_err(|message| errors.push(FieldError::new(CONFIDENCE_FIELD, message)))
    .ok();

  let upload = match submission.image {
    None => {
      errors.push(FieldError::new(IMAGE_FIELD, "An image is required"));
      None
    }
    Some(upload) if !allowed_extension(&upload.file_name) => {
      errors.push(FieldError::new(
        IMAGE_FIELD,
        "Only .jpeg, .jpg and .png images are allowed",
      ));
      None
    }
    Some(upload) => Some(upload),
  };

  match (upload, confidence) {
    (Some(upload), Some(confidence)) => Ok(ValidSubmission { upload, confidence }),
    _ => Err(InputValidationError { errors }),
  }
}

/// 只保留文件名本身，替换不安全字符
pub fn sanitize_file_name(file_name: &str) -> String {
  let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
  let cleaned: String = base
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
        c
      } else {
        '_'
      }
    })
    .collect();
  let cleaned = cleaned.trim_start_matches('.');

  if cleaned.is_empty() {
    DEFAULT_FILE_NAME.to_string()
  } else {
    cleaned.to_string()
  }
}
