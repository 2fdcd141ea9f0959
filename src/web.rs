// 该文件是 Renlian （人脸） 项目的一部分。
// src/web.rs - HTTP 上传与结果展示
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

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{
  Router,
  extract::{DefaultBodyLimit, Multipart, Path as RoutePath, State, multipart::MultipartError},
  http::{StatusCode, header},
  response::{Html, IntoResponse, Response},
  routing::get,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
  model::FaceModel,
  output::{EncodeError, encode, faces_file_name},
  task::{DetectTask, TaskError},
};

pub mod form;
pub mod page;

use self::{
  form::{CONFIDENCE_FIELD, FieldError, IMAGE_FIELD, InputValidationError, Submission, Upload, ValidSubmission},
  page::{FormView, ResultView},
};

/// 上传请求体上限
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;
pub const OUTPUTS_ROUTE: &str = "/outputs";

pub struct AppState<M> {
  task: DetectTask<M>,
  output_dir: PathBuf,
}

impl<M> AppState<M> {
  pub fn new(task: DetectTask<M>, output_dir: impl Into<PathBuf>) -> Self {
    Self {
      task,
      output_dir: output_dir.into(),
    }
  }

  pub fn output_dir(&self) -> &Path {
    &self.output_dir
  }
}

#[derive(Error, Debug)]
pub enum WebError {
  #[error("{0}")]
  Validation(#[from] InputValidationError),
  #[error("任务错误: {0}")]
  Task(#[from] TaskError),
  #[error("保存结果失败: {0}")]
  Storage(#[from] EncodeError),
  #[error("请求体错误: {0}")]
  Multipart(#[from] MultipartError),
  #[error("后台任务失败: {0}")]
  Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for WebError {
  fn into_response(self) -> Response {
    match self {
      WebError::Validation(err) => {
        debug!("{}", err);
        (
          StatusCode::UNPROCESSABLE_ENTITY,
          Html(page::form(&FormView::with_errors(err.errors))),
        )
          .into_response()
      }
      WebError::Task(TaskError::Decode(err)) => {
        warn!("上传的图像无法解码: {}", err);
        let errors = vec![FieldError::new(
          IMAGE_FIELD,
          "The uploaded file is not a readable PNG or JPEG image",
        )];
        (
          StatusCode::UNPROCESSABLE_ENTITY,
          Html(page::form(&FormView::with_errors(errors))),
        )
          .into_response()
      }
      WebError::Multipart(err) => {
        warn!("无法读取上传内容: {}", err);
        (err.status(), Html(page::error(&err.body_text()))).into_response()
      }
      err => {
        error!("请求处理失败: {}", err);
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Html(page::error("Face detection failed, please try again")),
        )
          .into_response()
      }
    }
  }
}

pub fn router<M: FaceModel + 'static>(state: Arc<AppState<M>>) -> Router {
  Router::new()
    .route("/", get(show_form).post(submit::<M>))
    .route(
      &format!("{}/{{request_id}}/{{name}}", OUTPUTS_ROUTE),
      get(serve_output::<M>),
    )
    .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
    .with_state(state)
}

/// 校验表单，在阻塞线程上跑检测并保存标注后的图像
pub async fn process_submission<M: FaceModel + 'static>(
  state: Arc<AppState<M>>,
  submission: Submission,
) -> Result<ResultView, WebError> {
  let ValidSubmission { upload, confidence } = form::validate(submission)?;
  let file_name = faces_file_name(&form::sanitize_file_name(&upload.file_name));
  // 每个请求一个子目录，同名上传互不覆盖
  let request_id = Uuid::new_v4().to_string();
  info!(
    "收到图像 {} ({} 字节)，置信度阈值 {}，请求 {}",
    upload.file_name,
    upload.bytes.len(),
    confidence,
    request_id
  );

  let view = tokio::task::spawn_blocking(move || -> Result<ResultView, WebError> {
    let result = state.task.run_bytes(&upload.bytes, confidence)?;
    let request_dir = state.output_dir.join(&request_id);
    std::fs::create_dir_all(&request_dir).map_err(EncodeError::IoError)?;
    encode(&result.image, request_dir.join(&file_name))?;
    Ok(ResultView::new(&request_id, &file_name, confidence, &result))
  })
  .await??;

  Ok(view)
}

/// 已保存结果的内容类型，名字不是安全文件名时返回 None
pub fn output_content_type(name: &str) -> Option<&'static str> {
  if name != form::sanitize_file_name(name) {
    return None;
  }

  let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
  match ext.as_str() {
    "png" => Some("image/png"),
    "jpg" | "jpeg" => Some("image/jpeg"),
    _ => None,
  }
}

/// 只接受 `process_submission` 生成的带连字符小写 UUID
fn is_request_id(request_id: &str) -> bool {
  Uuid::parse_str(request_id)
    .map(|id| id.hyphenated().to_string() == request_id)
    .unwrap_or(false)
}

async fn show_form() -> Html<String> {
  Html(page::form(&FormView::default()))
}

async fn submit<M: FaceModel + 'static>(
  State(state): State<Arc<AppState<M>>>,
  multipart: Multipart,
) -> Result<Html<String>, WebError> {
  let submission = read_submission(multipart).await?;
  let view = process_submission(state, submission).await?;
  Ok(Html(page::result(&view)))
}

async fn read_submission(mut multipart: Multipart) -> Result<Submission, MultipartError> {
  let mut submission = Submission::default();

  while let Some(field) = multipart.next_field().await? {
    let name = field.name().map(str::to_owned);
    match name.as_deref() {
      Some(IMAGE_FIELD) => {
        let file_name = field.file_name().map(str::to_owned).unwrap_or_default();
        let bytes = field.bytes().await?;
        // 浏览器在未选择文件时也会发送一个空文件名的字段
        if !file_name.is_empty() {
          submission.image = Some(Upload {
            file_name,
            bytes: bytes.to_vec(),
          });
        }
      }
      Some(CONFIDENCE_FIELD) => submission.confidence = Some(field.text().await?),
      _ => debug!("忽略表单字段: {:?}", name),
    }
  }

  Ok(submission)
}

async fn serve_output<M: FaceModel + 'static>(
  State(state): State<Arc<AppState<M>>>,
  RoutePath((request_id, name)): RoutePath<(String, String)>,
) -> Response {
  if !is_request_id(&request_id) {
    return StatusCode::NOT_FOUND.into_response();
  }
  let Some(content_type) = output_content_type(&name) else {
    return StatusCode::NOT_FOUND.into_response();
  };

  match tokio::fs::read(state.output_dir.join(&request_id).join(&name)).await {
    Ok(bytes) => ([(header::CONTENT_TYPE, content_type)], bytes).into_response(),
    Err(err) => {
      debug!("读取结果文件 {} 失败: {}", name, err);
      StatusCode::NOT_FOUND.into_response()
    }
  }
}
