// 该文件是 Renlian （人脸） 项目的一部分。
// src/model/res_ssd.rs - ResNet-10 SSD 人脸检测模型
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
  borrow::Cow,
  path::{Path, PathBuf},
};

use ndarray::{ArrayViewD, Ix4};
use ort::{
  session::{Session, builder::GraphOptimizationLevel},
  value::Tensor,
};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
  frame::Blob,
  model::{Detection, InferenceError, Model},
};

const RES_SSD_NUM_INPUTS: usize = 1;
const RES_SSD_INPUT_CHANNELS: usize = 3;
// 每行: [image_id, class_id, confidence, x_min, y_min, x_max, y_max]
const RES_SSD_ROW_LEN: usize = 7;
const RES_SSD_CONFIDENCE_IDX: usize = 2;
const RES_SSD_BBOX_IDX: usize = 3;

#[derive(Error, Debug)]
pub enum ModelLoadError {
  #[error("模型文件不存在: {}", .0.display())]
  Missing(PathBuf),
  #[error("模型路径不是文件: {}", .0.display())]
  NotAFile(PathBuf),
  #[error("读取模型文件失败: {0}")]
  Io(#[from] std::io::Error),
  #[error("ONNX Runtime 错误: {0}")]
  Runtime(#[from] ort::Error),
  #[error("模型签名不符: {0}")]
  Signature(String),
}

/// 网络结构与权重文件
///
/// 权重文件是结构文件按文件名引用的 ONNX 外部数据，加载时一并读入内存；
/// 自包含的模型可以把同一路径传两次。
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
  pub architecture: PathBuf,
  pub weights: PathBuf,
}

impl ModelArtifacts {
  pub fn new(architecture: impl Into<PathBuf>, weights: impl Into<PathBuf>) -> Self {
    Self {
      architecture: architecture.into(),
      weights: weights.into(),
    }
  }

  /// 在创建推理会话之前检查两个文件都存在
  pub fn check(&self) -> Result<(), ModelLoadError> {
    check_file(&self.architecture)?;
    check_file(&self.weights)
  }

  pub fn is_self_contained(&self) -> bool {
    self.architecture == self.weights
  }
}

/// 结构文件中外部数据的 location 以原始字符串保存，直接按字节查找文件名
fn references_file(graph: &[u8], file_name: &str) -> bool {
  let needle = file_name.as_bytes();
  !needle.is_empty() && graph.windows(needle.len()).any(|window| window == needle)
}

/// 读入结构文件和权重文件，权重文件必须被结构引用
fn read_artifacts(
  artifacts: &ModelArtifacts,
) -> Result<(Vec<u8>, Option<(String, Vec<u8>)>), ModelLoadError> {
  let graph = std::fs::read(&artifacts.architecture)?;
  if artifacts.is_self_contained() {
    return Ok((graph, None));
  }

  let file_name = artifacts
    .weights
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default();
  if !references_file(&graph, &file_name) {
    error!("模型结构未引用权重文件: {}", artifacts.weights.display());
    return Err(ModelLoadError::Signature(format!(
      "模型结构未引用权重文件 {}",
      file_name
    )));
  }

  let weights = std::fs::read(&artifacts.weights)?;
  if weights.is_empty() {
    error!("权重文件为空: {}", artifacts.weights.display());
    return Err(ModelLoadError::Signature(format!("权重文件 {} 为空", file_name)));
  }

  Ok((graph, Some((file_name, weights))))
}

fn check_file(path: &Path) -> Result<(), ModelLoadError> {
  if !path.exists() {
    error!("模型文件不存在: {}", path.display());
    return Err(ModelLoadError::Missing(path.to_path_buf()));
  }
  if !path.is_file() {
    error!("模型路径不是文件: {}", path.display());
    return Err(ModelLoadError::NotAFile(path.to_path_buf()));
  }
  Ok(())
}

pub struct ResSsdBuilder {
  artifacts: ModelArtifacts,
  intra_threads: usize,
}

impl ResSsdBuilder {
  pub fn new(artifacts: ModelArtifacts) -> Self {
    Self {
      artifacts,
      intra_threads: 1,
    }
  }

  pub fn intra_threads(mut self, intra_threads: usize) -> Self {
    self.intra_threads = intra_threads.max(1);
    self
  }

  pub fn build(self) -> Result<ResSsd, ModelLoadError> {
    self.artifacts.check()?;
    let (graph, weights) = read_artifacts(&self.artifacts)?;

    info!("加载模型结构: {}", self.artifacts.architecture.display());
    let mut builder = Session::builder()?
      .with_optimization_level(GraphOptimizationLevel::Level3)?
      .with_intra_threads(self.intra_threads)?;
    if let Some((file_name, weights)) = weights {
      info!(
        "加载模型权重: {} ({} 字节)",
        self.artifacts.weights.display(),
        weights.len()
      );
      builder = builder.with_external_initializer_file(file_name, Cow::Owned(weights))?;
    }
    let session = builder.commit_from_memory(&graph)?;

    if session.inputs.len() != RES_SSD_NUM_INPUTS {
      error!(
        "预期模型输入数量为 {}, 实际为 {}",
        RES_SSD_NUM_INPUTS,
        session.inputs.len()
      );
      return Err(ModelLoadError::Signature(format!(
        "预期模型输入数量为 {}, 实际为 {}",
        RES_SSD_NUM_INPUTS,
        session.inputs.len()
      )));
    }

    if session.outputs.is_empty() {
      error!("模型没有输出");
      return Err(ModelLoadError::Signature("模型没有输出".to_string()));
    }

    debug!("模型输入: {}", session.inputs[0].name);
    debug!("模型输出: {}", session.outputs[0].name);
    info!("模型加载完成");

    Ok(ResSsd { session })
  }
}

/// 加载完成的人脸检测网络，只读，可在线程间共享
pub struct ResSsd {
  session: Session,
}

impl ResSsd {
  /// 将 `[1, 1, N, 7]` 的网络输出解析为检测结果，保持网络给出的顺序
  pub fn postprocess(output: ArrayViewD<'_, f32>) -> Result<Vec<Detection>, InferenceError> {
    let shape = output.shape().to_vec();
    let output = output
      .into_dimensionality::<Ix4>()
      .map_err(|_| InferenceError::OutputShape(shape.clone()))?;

    let (batch, plane, _, row_len) = output.dim();
    if batch != 1 || plane != 1 || row_len != RES_SSD_ROW_LEN {
      error!("输出张量形状不符: {:?}", shape);
      return Err(InferenceError::OutputShape(shape));
    }

    let rows = output.index_axis_move(ndarray::Axis(0), 0).index_axis_move(ndarray::Axis(0), 0);
    let detections: Vec<Detection> = rows
      .outer_iter()
      .map(|row| Detection {
        confidence: row[RES_SSD_CONFIDENCE_IDX],
        bbox: [
          row[RES_SSD_BBOX_IDX],
          row[RES_SSD_BBOX_IDX + 1],
          row[RES_SSD_BBOX_IDX + 2],
          row[RES_SSD_BBOX_IDX + 3],
        ],
      })
      .collect();

    debug!("网络给出 {} 个候选", detections.len());
    Ok(detections)
  }
}

impl Model for ResSsd {
  type Input = Blob;
  type Output = Vec<Detection>;
  type Error = InferenceError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let shape = input.shape();
    if shape[0] != 1 || shape[1] != RES_SSD_INPUT_CHANNELS {
      error!("输入张量形状不符: {:?}", shape);
      return Err(InferenceError::InputShape(shape.to_vec()));
    }

    debug!("设置模型输入");
    let tensor = Tensor::from_array(input.as_array().view())?;

    debug!("执行模型推理");
    let outputs = self.session.run(ort::inputs![tensor]?)?;

    debug!("获取模型输出");
    let output = outputs[0].try_extract_tensor::<f32>()?;
    Self::postprocess(output)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ndarray::Array4;

  #[test]
  fn postprocess_keeps_network_order() {
    let output = Array4::from_shape_vec(
      (1, 1, 2, 7),
      vec![
        0.0, 1.0, 0.25, 0.1, 0.2, 0.3, 0.4, //
        0.0, 1.0, 0.95, 0.5, 0.5, 0.9, 0.8,
      ],
    )
    .unwrap();

    let detections = ResSsd::postprocess(output.view().into_dyn()).unwrap();
    assert_eq!(
      detections,
      vec![
        Detection {
          confidence: 0.25,
          bbox: [0.1, 0.2, 0.3, 0.4],
        },
        Detection {
          confidence: 0.95,
          bbox: [0.5, 0.5, 0.9, 0.8],
        },
      ]
    );
  }

  #[test]
  fn postprocess_accepts_empty_output() {
    let output = Array4::<f32>::zeros((1, 1, 0, 7));
    let detections = ResSsd::postprocess(output.view().into_dyn()).unwrap();
    assert!(detections.is_empty());
  }

  #[test]
  fn postprocess_rejects_malformed_output() {
    let output = Array4::<f32>::zeros((1, 1, 3, 5));
    let err = ResSsd::postprocess(output.view().into_dyn()).unwrap_err();
    assert!(matches!(err, InferenceError::OutputShape(shape) if shape == vec![1, 1, 3, 5]));

    let output = ndarray::Array2::<f32>::zeros((3, 7));
    let err = ResSsd::postprocess(output.view().into_dyn()).unwrap_err();
    assert!(matches!(err, InferenceError::OutputShape(_)));
  }

  #[test]
  fn build_fails_fast_on_missing_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let architecture = dir.path().join("deploy.onnx");
    std::fs::write(&architecture, b"graph").unwrap();

    let artifacts = ModelArtifacts::new(&architecture, dir.path().join("weights.bin"));
    let err = ResSsdBuilder::new(artifacts).build().err().unwrap();
    assert!(matches!(err, ModelLoadError::Missing(path) if path.ends_with("weights.bin")));

    let artifacts = ModelArtifacts::new(dir.path(), &architecture);
    let err = ResSsdBuilder::new(artifacts).build().err().unwrap();
    assert!(matches!(err, ModelLoadError::NotAFile(_)));
  }

  // 外部数据引用的片段：TensorProto.external_data { key: "location", value: ... }
  const GRAPH_WITH_EXTERNAL_DATA: &[u8] = b"\x0a\x08location\x12\x0bweights.bin";

  #[test]
  fn graph_must_reference_weights_file() {
    assert!(references_file(GRAPH_WITH_EXTERNAL_DATA, "weights.bin"));
    assert!(!references_file(GRAPH_WITH_EXTERNAL_DATA, "other.bin"));
    assert!(!references_file(GRAPH_WITH_EXTERNAL_DATA, ""));
  }

  #[test]
  fn build_rejects_mismatched_weights() {
    let dir = tempfile::tempdir().unwrap();
    let architecture = dir.path().join("deploy.onnx");
    std::fs::write(&architecture, GRAPH_WITH_EXTERNAL_DATA).unwrap();
    let weights = dir.path().join("other.bin");
    std::fs::write(&weights, b"\x00\x01\x02\x03").unwrap();

    let artifacts = ModelArtifacts::new(&architecture, &weights);
    let err = ResSsdBuilder::new(artifacts).build().err().unwrap();
    assert!(matches!(err, ModelLoadError::Signature(message) if message.contains("other.bin")));
  }

  #[test]
  fn build_rejects_empty_weights() {
    let dir = tempfile::tempdir().unwrap();
    let architecture = dir.path().join("deploy.onnx");
    std::fs::write(&architecture, GRAPH_WITH_EXTERNAL_DATA).unwrap();
    let weights = dir.path().join("weights.bin");
    std::fs::write(&weights, b"").unwrap();

    let artifacts = ModelArtifacts::new(&architecture, &weights);
    let err = ResSsdBuilder::new(artifacts).build().err().unwrap();
    assert!(matches!(err, ModelLoadError::Signature(_)));
  }
}
