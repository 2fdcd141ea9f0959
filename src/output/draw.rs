// 该文件是 Renlian （人脸） 项目的一部分。
// src/output/draw.rs - 检测结果筛选与可视化
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

use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::debug;

use crate::model::Detection;

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_OFFSET: i32 = 10;
const BOX_THICKNESS: i32 = 2;
const BOX_COLOR: [u8; 3] = [0, 255, 0]; // 绿色

/// 通过阈值的检测及其像素坐标
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedDetection {
  pub detection: Detection,
  pub rect: [i32; 4], // [x_min, y_min, x_max, y_max]
}

#[derive(Debug, Clone)]
pub struct DetectionResult {
  pub image: RgbImage,
  pub accepted: usize,
  pub items: Box<[AcceptedDetection]>,
}

/// 把归一化坐标按 (W, H, W, H) 放大并向零截断
pub fn scale_bbox(bbox: &[f32; 4], width: u32, height: u32) -> [i32; 4] {
  let (w, h) = (width as f32, height as f32);
  [
    (bbox[0] * w) as i32,
    (bbox[1] * h) as i32,
    (bbox[2] * w) as i32,
    (bbox[3] * h) as i32,
  ]
}

/// 标签基线：框上方 10 像素；放不下文字高度或离顶边太近时改到框内下方
pub fn label_baseline(y_min: i32, text_height: i32) -> i32 {
  let above = y_min - LABEL_OFFSET;
  if above > LABEL_OFFSET && above - text_height >= 0 {
    above
  } else {
    y_min + LABEL_OFFSET
  }
}

pub fn label_text(confidence: f32) -> String {
  format!("{:.2}%", confidence * 100.0)
}

#[derive(Clone)]
pub struct Draw<'a> {
  font_size: f32,
  box_thickness: i32,
  box_color: [u8; 3],
  font: FontRef<'a>,
}

impl<'a> Default for Draw<'a> {
  fn default() -> Self {
    let font_data = include_bytes!("../../assets/font.ttf"); // default font
    let font = FontRef::try_from_slice(font_data).expect("无法加载嵌入的字体文件");

    Self {
      font_size: LABEL_FONT_SIZE,
      box_thickness: BOX_THICKNESS,
      box_color: BOX_COLOR,
      font,
    }
  }
}

impl<'a> Draw<'a> {
  /// 按阈值筛选检测结果并画到图像上，阈值严格大于才接受
  pub fn filter_and_render(
    &self,
    mut image: RgbImage,
    detections: &[Detection],
    threshold: f32,
  ) -> DetectionResult {
    let (width, height) = image.dimensions();

    let items: Vec<AcceptedDetection> = detections
      .iter()
      .filter(|detection| detection.confidence > threshold)
      .map(|detection| AcceptedDetection {
        detection: *detection,
        rect: scale_bbox(&detection.bbox, width, height),
      })
      .collect();

    for item in &items {
      self.draw_bbox_with_label(&mut image, &item.rect, &label_text(item.detection.confidence));
    }

    debug!(
      "阈值 {} 下接受 {}/{} 个检测",
      threshold,
      items.len(),
      detections.len()
    );

    DetectionResult {
      image,
      accepted: items.len(),
      items: items.into_boxed_slice(),
    }
  }

  // 在图像上绘制置信度标签和矩形边框，rect 为像素坐标
  fn draw_bbox_with_label(&self, image: &mut RgbImage, rect: &[i32; 4], label: &str) {
    let (w, h) = (image.width() as i32, image.height() as i32);
    if w == 0 || h == 0 {
      return;
    }

    // 完全落在画布外的框不画，但仍计数
    if rect[2] < 0 || rect[3] < 0 || rect[0] >= w || rect[1] >= h {
      debug!("检测框 {:?} 不在画布 {}x{} 内", rect, w, h);
      return;
    }

    // Clamp to image bounds
    let x_min = rect[0].clamp(0, w - 1);
    let y_min = rect[1].clamp(0, h - 1);
    let x_max = rect[2].clamp(0, w - 1);
    let y_max = rect[3].clamp(0, h - 1);

    if x_min > x_max || y_min > y_max {
      return;
    }

    // 先画标签，边框随后覆盖，保证边框颜色不被抗锯齿混合
    self.draw_label(image, x_min, rect[1], label);

    let color = Rgb(self.box_color);
    for thickness in 0..self.box_thickness {
      let x_min_t = (x_min + thickness).min(x_max);
      let y_min_t = (y_min + thickness).min(y_max);
      let x_max_t = (x_max - thickness).max(x_min);
      let y_max_t = (y_max - thickness).max(y_min);

      // Top and bottom edges
      for x in x_min_t..=x_max_t {
        image.put_pixel(x as u32, y_min_t as u32, color);
        image.put_pixel(x as u32, y_max_t as u32, color);
      }

      // Left and right edges
      for y in y_min_t..=y_max_t {
        image.put_pixel(x_min_t as u32, y as u32, color);
        image.put_pixel(x_max_t as u32, y as u32, color);
      }
    }
  }

  /// draw_text_mut 以行顶定位，字形底部落在 y + ascent
  fn label_top(&self, y_min: i32, label: &str, canvas_height: i32) -> i32 {
    let scale = PxScale::from(self.font_size);
    let (_, text_height) = text_size(scale, &self.font, label);
    let ascent = self.font.as_scaled(scale).ascent().round() as i32;

    let baseline = label_baseline(y_min, text_height as i32);
    let lowest = (canvas_height - self.font_size.ceil() as i32).max(0);
    (baseline - ascent).clamp(0, lowest)
  }

  fn draw_label(&self, image: &mut RgbImage, x: i32, y_min: i32, label: &str) {
    let top = self.label_top(y_min, label, image.height() as i32);
    draw_text_mut(
      image,
      Rgb(self.box_color),
      x,
      top,
      PxScale::from(self.font_size),
      &self.font,
      label,
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn detection(confidence: f32, bbox: [f32; 4]) -> Detection {
    Detection { confidence, bbox }
  }

  fn sample_detections() -> Vec<Detection> {
    vec![
      detection(0.15, [0.0, 0.0, 0.2, 0.2]),
      detection(0.5, [0.2, 0.2, 0.4, 0.4]),
      detection(0.75, [0.4, 0.4, 0.6, 0.6]),
      detection(0.99, [0.6, 0.6, 0.9, 0.9]),
    ]
  }

  #[test]
  fn unit_box_scales_to_full_image() {
    assert_eq!(scale_bbox(&[0.0, 0.0, 1.0, 1.0], 640, 480), [0, 0, 640, 480]);
    assert_eq!(scale_bbox(&[0.1, 0.1, 0.5, 0.5], 200, 200), [20, 20, 100, 100]);
  }

  #[test]
  fn scaling_truncates_toward_zero() {
    assert_eq!(scale_bbox(&[0.259, 0.999, 0.5, 0.5], 10, 10), [2, 9, 5, 5]);
    assert_eq!(scale_bbox(&[-0.019, 0.0, 1.0, 1.0], 100, 100)[0], -1);
  }

  #[test]
  fn threshold_is_strict() {
    let draw = Draw::default();
    let image = RgbImage::new(100, 100);
    let result = draw.filter_and_render(image, &sample_detections(), 0.5);
    assert_eq!(result.accepted, 2);
    assert!(result.items.iter().all(|item| item.detection.confidence > 0.5));
  }

  #[test]
  fn filtering_is_monotonic_in_threshold() {
    let draw = Draw::default();
    let detections = sample_detections();
    let thresholds = [0.0, 0.1, 0.15, 0.3, 0.5, 0.6, 0.75, 0.9, 0.99];

    let counts: Vec<usize> = thresholds
      .iter()
      .map(|t| {
        draw
          .filter_and_render(RgbImage::new(50, 50), &detections, *t)
          .accepted
      })
      .collect();

    assert_eq!(counts, vec![4, 4, 3, 3, 2, 2, 1, 1, 0]);
    assert!(counts.windows(2).all(|pair| pair[1] <= pair[0]));
  }

  #[test]
  fn no_accepted_detection_leaves_image_untouched() {
    let draw = Draw::default();
    let image = RgbImage::from_fn(64, 48, |x, y| Rgb([x as u8, y as u8, 7]));

    let result = draw.filter_and_render(image.clone(), &[], 0.3);
    assert_eq!(result.accepted, 0);
    assert_eq!(result.image, image);

    let result = draw.filter_and_render(image.clone(), &sample_detections(), 0.99);
    assert_eq!(result.accepted, 0);
    assert_eq!(result.image, image);
  }

  #[test]
  fn draws_two_pixel_green_border() {
    let draw = Draw::default();
    let image = RgbImage::new(200, 200);
    let detections = [detection(0.9, [0.1, 0.1, 0.5, 0.5])];
    let result = draw.filter_and_render(image, &detections, 0.5);

    assert_eq!(result.items[0].rect, [20, 20, 100, 100]);
    let green = Rgb([0, 255, 0]);
    assert_eq!(*result.image.get_pixel(20, 60), green);
    assert_eq!(*result.image.get_pixel(21, 60), green);
    assert_eq!(*result.image.get_pixel(100, 60), green);
    assert_eq!(*result.image.get_pixel(99, 60), green);
    assert_eq!(*result.image.get_pixel(60, 100), green);
    assert_eq!(*result.image.get_pixel(60, 80), Rgb([0, 0, 0]));
    assert_eq!(*result.image.get_pixel(22, 60), Rgb([0, 0, 0]));
  }

  #[test]
  fn box_outside_canvas_is_clamped() {
    let draw = Draw::default();
    let detections = [detection(0.9, [-0.5, -0.5, 1.5, 1.5])];
    let result = draw.filter_and_render(RgbImage::new(40, 30), &detections, 0.1);
    assert_eq!(result.accepted, 1);
    assert_eq!(result.items[0].rect, [-20, -15, 60, 45]);
    assert_eq!(*result.image.get_pixel(39, 29), Rgb([0, 255, 0]));
  }

  #[test]
  fn label_flips_below_near_top_edge() {
    assert_eq!(label_baseline(50, 12), 40);
    assert_eq!(label_baseline(21, 0), 11);
    assert_eq!(label_baseline(21, 12), 31);
    assert_eq!(label_baseline(20, 12), 30);
    assert_eq!(label_baseline(3, 12), 13);
  }

  fn lit_pixels(image: &RgbImage) -> usize {
    image.pixels().filter(|p| p[1] > 0).count()
  }

  #[test]
  fn label_is_fully_visible_at_top_edge() {
    let draw = Draw::default();
    let label = label_text(0.9);

    let mut reference = RgbImage::new(200, 100);
    draw.draw_label(&mut reference, 20, 60, &label);
    let expected = lit_pixels(&reference);
    assert!(expected > 0);

    for y_min in [0, 5, 20] {
      let mut image = RgbImage::new(200, 100);
      draw.draw_label(&mut image, 20, y_min, &label);
      assert_eq!(lit_pixels(&image), expected, "y_min = {}", y_min);
      assert!(draw.label_top(y_min, &label, 100) >= 0);
    }
  }

  #[test]
  fn border_survives_label_drawn_below_top_edge() {
    let draw = Draw::default();
    let detections = [detection(0.9, [0.1, 0.1, 0.5, 0.5])];
    let result = draw.filter_and_render(RgbImage::new(200, 200), &detections, 0.5);

    let green = Rgb([0, 255, 0]);
    for x in 20..=100 {
      assert_eq!(*result.image.get_pixel(x, 20), green, "x = {}", x);
      assert_eq!(*result.image.get_pixel(x, 21), green, "x = {}", x);
    }
    for y in 20..=40 {
      assert_eq!(*result.image.get_pixel(20, y), green, "y = {}", y);
      assert_eq!(*result.image.get_pixel(21, y), green, "y = {}", y);
    }
  }

  #[test]
  fn box_entirely_off_canvas_is_counted_but_not_drawn() {
    let draw = Draw::default();
    let image = RgbImage::new(40, 30);
    let detections = [detection(0.9, [1.2, 1.2, 1.5, 1.5])];

    let result = draw.filter_and_render(image.clone(), &detections, 0.5);
    assert_eq!(result.accepted, 1);
    assert_eq!(result.items[0].rect, [48, 36, 60, 45]);
    assert_eq!(result.image, image);
  }

  #[test]
  fn label_shows_percentage_with_two_decimals() {
    assert_eq!(label_text(0.98767), "98.77%");
    assert_eq!(label_text(0.5), "50.00%");
  }
}
