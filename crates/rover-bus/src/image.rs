//! 图像帧定义
//!
//! 相机部件输出的原始像素缓冲（行优先、交错通道），以及检测结果的
//! 诊断叠加标注。图像在总线上以 `Arc<ImageFrame>` 共享，需要修改时使用
//! `Arc::make_mut` 写时复制，不影响其他持有者。

use crate::error::BusError;

/// 像素坐标系下的矩形框
///
/// `x`/`y` 为左上角，可以为负（目标部分超出画面）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 水平中心（像素）
    pub fn center_x(&self) -> f64 {
        f64::from(self.x) + f64::from(self.width) / 2.0
    }

    /// 垂直中心（像素）
    pub fn center_y(&self) -> f64 {
        f64::from(self.y) + f64::from(self.height) / 2.0
    }
}

/// 叠加标注（检测框 + 标签）
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub label: String,
    pub bbox: BoundingBox,
    pub score: f32,
}

/// 图像帧
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
    annotations: Vec<Annotation>,
}

impl ImageFrame {
    /// 创建全黑的 RGB 图像
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * 3;
        Self {
            width,
            height,
            channels: 3,
            data: vec![0; len],
            annotations: Vec::new(),
        }
    }

    /// 从原始缓冲创建图像
    ///
    /// # 错误
    /// - `BusError::InvalidImage`: 缓冲长度不等于 `width * height * channels`
    pub fn from_raw(
        width: u32,
        height: u32,
        channels: u8,
        data: Vec<u8>,
    ) -> Result<Self, BusError> {
        let expected = width as usize * height as usize * channels as usize;
        if channels == 0 || data.len() != expected {
            return Err(BusError::InvalidImage {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
            annotations: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// 图像水平中心（像素）
    pub fn center_x(&self) -> f64 {
        f64::from(self.width) / 2.0
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotate(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * self.channels as usize)
    }

    /// 读取像素（最多前 3 个通道，单通道图像三个分量相同）
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        let offset = self.offset(x, y)?;
        let px = &self.data[offset..offset + self.channels as usize];
        Some(match px.len() {
            1 | 2 => [px[0]; 3],
            _ => [px[0], px[1], px[2]],
        })
    }

    /// 写入像素，越界时忽略
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        let Some(offset) = self.offset(x, y) else {
            return;
        };
        let channels = self.channels as usize;
        if channels < 3 {
            // 灰度：取均值
            let gray = ((u16::from(color[0]) + u16::from(color[1]) + u16::from(color[2])) / 3) as u8;
            self.data[offset] = gray;
        } else {
            self.data[offset..offset + 3].copy_from_slice(&color);
        }
    }

    /// 绘制矩形边框（1 像素宽），超出画面的部分被裁剪
    pub fn draw_rect(&mut self, bbox: &BoundingBox, color: [u8; 3]) {
        if self.width == 0 || self.height == 0 || bbox.width == 0 || bbox.height == 0 {
            return;
        }
        let left = i64::from(bbox.x);
        let top = i64::from(bbox.y);
        let right = left + i64::from(bbox.width) - 1;
        let bottom = top + i64::from(bbox.height) - 1;
        let max_x = i64::from(self.width) - 1;
        let max_y = i64::from(self.height) - 1;

        if right < 0 || bottom < 0 || left > max_x || top > max_y {
            return;
        }

        let (x0, x1) = (left.max(0), right.min(max_x));
        let (y0, y1) = (top.max(0), bottom.min(max_y));

        for x in x0..=x1 {
            if top >= 0 {
                self.set_pixel(x as u32, top as u32, color);
            }
            if bottom <= max_y {
                self.set_pixel(x as u32, bottom as u32, color);
            }
        }
        for y in y0..=y1 {
            if left >= 0 {
                self.set_pixel(left as u32, y as u32, color);
            }
            if right <= max_x {
                self.set_pixel(right as u32, y as u32, color);
            }
        }
    }
}
