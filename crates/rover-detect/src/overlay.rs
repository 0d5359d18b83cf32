//! 诊断叠加
//!
//! 只修改图像缓冲，不影响控制量。

use crate::detector::Detection;
use rover_bus::{Annotation, ImageFrame};

/// 检测框颜色（红）
pub const BOX_COLOR: [u8; 3] = [255, 0, 0];

/// 在图像上绘制检测框并记录标注
pub fn mark(image: &mut ImageFrame, detection: &Detection) {
    image.draw_rect(&detection.bbox, BOX_COLOR);
    image.annotate(Annotation {
        label: detection.label.clone(),
        bbox: detection.bbox,
        score: detection.score,
    });
}
