// 该文件是 Renlian （人脸） 项目的一部分。
// src/web/page.rs - HTML 页面
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

use std::fmt::Write;

use crate::{
  output::{DetectionResult, draw::label_text},
  web::{
    OUTPUTS_ROUTE,
    form::{CONFIDENCE_FIELD, FieldError, IMAGE_FIELD},
  },
};

/// 重新渲染表单时需要的内容
#[derive(Debug, Clone, Default)]
pub struct FormView {
  pub errors: Vec<FieldError>,
}

impl FormView {
  pub fn with_errors(errors: Vec<FieldError>) -> Self {
    Self { errors }
  }

  fn error_for(&self, field: &str) -> String {
    self
      .errors
      .iter()
      .filter(|error| error.field == field)
      .map(|error| format!(r#"<p class="error">{}</p>"#, escape(&error.message)))
      .collect()
  }
}

#[derive(Debug, Clone)]
pub struct ResultView {
  pub request_id: String,
  pub file_name: String,
  pub threshold: f32,
  pub count: usize,
  pub faces: Vec<(String, [i32; 4])>,
}

impl ResultView {
  pub fn new(
    request_id: &str,
    file_name: &str,
    threshold: f32,
    result: &DetectionResult,
  ) -> Self {
    Self {
      request_id: request_id.to_string(),
      file_name: file_name.to_string(),
      threshold,
      count: result.accepted,
      faces: result
        .items
        .iter()
        .map(|item| (label_text(item.detection.confidence), item.rect))
        .collect(),
    }
  }

  pub fn image_url(&self) -> String {
    format!(
      "{}/{}/{}",
      OUTPUTS_ROUTE,
      urlencoding::encode(&self.request_id),
      urlencoding::encode(&self.file_name)
    )
  }
}

pub fn escape(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&#39;"),
      c => escaped.push(c),
    }
  }
  escaped
}

fn layout(title: &str, body: &str) -> String {
  format!(
    r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
.error {{ color: #b00020; margin: 0.2em 0; }}
img {{ max-width: 100%; }}
</style>
</head>
<body>
<h1>{title}</h1>
{body}
</body>
</html>
"#,
    title = escape(title),
    body = body,
  )
}

pub fn form(view: &FormView) -> String {
  let body = format!(
    r#"<form method="post" action="/" enctype="multipart/form-data">
<p><label for="{image}">Upload an Image</label><br>
<input type="file" id="{image}" name="{image}" accept=".jpeg,.jpg,.png"></p>
{image_errors}
<p><label for="{confidence}">Confidence</label><br>
<input type="number" id="{confidence}" name="{confidence}" min="0" max="0.998" step="0.001" value="0.5"></p>
{confidence_errors}
<p><input type="submit" value="Detect faces"></p>
</form>"#,
    image = IMAGE_FIELD,
    confidence = CONFIDENCE_FIELD,
    image_errors = view.error_for(IMAGE_FIELD),
    confidence_errors = view.error_for(CONFIDENCE_FIELD),
  );
  layout("Face Detector", &body)
}

pub fn result(view: &ResultView) -> String {
  let mut body = String::new();
  let noun = if view.count == 1 { "face" } else { "faces" };
  let _ = writeln!(
    body,
    "<p>{} {} detected above {:.2}% confidence</p>",
    view.count,
    noun,
    view.threshold * 100.0
  );
  let _ = writeln!(
    body,
    r#"<img src="{}" alt="{}">"#,
    escape(&view.image_url()),
    escape(&view.file_name)
  );

  if !view.faces.is_empty() {
    body.push_str("<ol>\n");
    for (label, rect) in &view.faces {
      let _ = writeln!(
        body,
        "<li>{} at ({}, {}) - ({}, {})</li>",
        escape(label),
        rect[0],
        rect[1],
        rect[2],
        rect[3]
      );
    }
    body.push_str("</ol>\n");
  }

  body.push_str(r#"<p><a href="/">Try another image</a></p>"#);
  layout("Detected Faces", &body)
}

pub fn error(message: &str) -> String {
  let body = format!(
    r#"<p class="error">{}</p>
<p><a href="/">Back</a></p>"#,
    escape(message)
  );
  layout("Something went wrong", &body)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn escape_html_specials() {
    assert_eq!(
      escape(r#"<a href="x">&'</a>"#),
      "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
    );
  }

  #[test]
  fn form_shows_field_errors() {
    let view = FormView::with_errors(vec![FieldError::new(
      CONFIDENCE_FIELD,
      "Confidence must be <1",
    )]);
    let html = form(&view);
    assert!(html.contains(r#"name="image""#));
    assert!(html.contains(r#"name="confidence""#));
    assert!(html.contains("Confidence must be &lt;1"));
    assert_eq!(html.matches(r#"class="error""#).count(), 1);
  }

  #[test]
  fn result_page_lists_faces() {
    let view = ResultView {
      request_id: "42".to_string(),
      file_name: "my face_faces.png".to_string(),
      threshold: 0.5,
      count: 1,
      faces: vec![("90.00%".to_string(), [20, 20, 100, 100])],
    };
    let html = result(&view);
    assert!(html.contains("1 face detected"));
    assert!(html.contains("/outputs/42/my%20face_faces.png"));
    assert!(html.contains("90.00% at (20, 20) - (100, 100)"));
  }
}
