//! EWA 系数表构建.
//!
//! 为每个目标像素计算需要读取的源像素窗口 (左上角 + 统一边长) 与归一化权重.
//!
//! 非边界像素按量化后的小数源坐标去重: 同一缩放比下, 内部像素的小数偏移
//! 只有有限种, 借助量化缓存把 `dst_w * dst_h` 次系数计算压缩到
//! `O(quantize_x * quantize_y)` 次. 边界像素的窗口被源图像边缘截断, 逐个计算.
//!
//! 系数块按行存放, 行跨度向上对齐到 [`COEFF_ALIGN`] 个 f32, 多出部分为 0.

use jinc_core::{AlignedBuf, JincError, JincResult};
use log::debug;

use crate::lut::FilterLut;

/// 默认量化网格 (每源像素)
pub const DEFAULT_QUANTIZE: u32 = 256;

/// 系数行跨度对齐 (f32 个数)
pub const COEFF_ALIGN: usize = 8;

/// 源图像裁剪矩形 (源像素单位, 可为小数)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    /// 左边界
    pub left: f64,
    /// 上边界
    pub top: f64,
    /// 宽度
    pub width: f64,
    /// 高度
    pub height: f64,
}

impl CropRect {
    /// 创建裁剪矩形
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// 覆盖整个源图像的矩形
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, f64::from(width), f64::from(height))
    }

    /// 按子采样系数 (log2) 缩小, 用于色度平面
    pub fn subsampled(&self, ssw: u32, ssh: u32) -> Self {
        let div_w = f64::from(ssw).exp2();
        let div_h = f64::from(ssh).exp2();
        Self::new(
            self.left / div_w,
            self.top / div_h,
            self.width / div_w,
            self.height / div_h,
        )
    }

    /// 校验: 各分量有限, 宽高为正
    pub fn validate(&self) -> JincResult<()> {
        let finite = [self.left, self.top, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.width <= 0.0 || self.height <= 0.0 {
            return Err(JincError::InvalidArgument(format!(
                "裁剪区域无效: left={}, top={}, width={}, height={}",
                self.left, self.top, self.width, self.height,
            )));
        }
        Ok(())
    }
}

/// 系数表构建参数 (单个平面)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StencilParams {
    /// 水平量化网格
    pub quantize_x: u32,
    /// 垂直量化网格
    pub quantize_y: u32,
    /// 源平面宽度
    pub src_width: u32,
    /// 源平面高度
    pub src_height: u32,
    /// 目标平面宽度
    pub dst_width: u32,
    /// 目标平面高度
    pub dst_height: u32,
    /// 核半径 (与查找表归一化使用同一半径)
    pub radius: f64,
    /// 裁剪矩形 (本平面坐标)
    pub crop: CropRect,
}

impl StencilParams {
    fn validate(&self) -> JincResult<()> {
        if self.src_width == 0 || self.src_height == 0 {
            return Err(JincError::InvalidArgument(format!(
                "源平面尺寸必须大于 0, 实际: {}x{}",
                self.src_width, self.src_height,
            )));
        }
        if self.dst_width == 0 || self.dst_height == 0 {
            return Err(JincError::InvalidArgument(format!(
                "目标平面尺寸必须大于 0, 实际: {}x{}",
                self.dst_width, self.dst_height,
            )));
        }
        if self.quantize_x == 0 || self.quantize_y == 0 {
            return Err(JincError::InvalidArgument(format!(
                "量化网格必须大于 0, 实际: {}x{}",
                self.quantize_x, self.quantize_y,
            )));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(JincError::InvalidArgument(format!(
                "核半径必须为正数, 实际: {}",
                self.radius,
            )));
        }
        self.crop.validate()
    }
}

/// 单个目标像素的窗口描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelStencil {
    /// 窗口左上角 X (源像素)
    pub start_x: u32,
    /// 窗口左上角 Y (源像素)
    pub start_y: u32,
    /// 系数块在系数区中的偏移 (f32 个数)
    pub coeff_offset: usize,
}

/// 单轴窗口
struct AxisWindow {
    begin: usize,
    border: bool,
}

/// 计算单轴窗口 `[end - filter_size + 1, end]`, `end = floor(pos + support)`,
/// 超出 `[0, extent - 1]` 时截断并标记为边界
fn axis_window(pos: f64, support: f64, filter_size: usize, extent: u32) -> AxisWindow {
    let extent = i64::from(extent);
    let mut border = false;

    let mut end = (pos + support).floor() as i64;
    if end >= extent {
        end = extent - 1;
        border = true;
    }
    let mut begin = end - filter_size as i64 + 1;
    if begin < 0 {
        begin = 0;
        border = true;
    }
    AxisWindow {
        begin: begin as usize,
        border,
    }
}

/// 单轴量化: 返回 (桶索引, 量化后坐标)
#[inline]
fn quantize(pos: f64, grid: u32) -> (usize, f64) {
    let grid = i64::from(grid);
    let q = (pos * grid as f64 + 0.5).floor() as i64;
    (q.rem_euclid(grid) as usize, q as f64 / grid as f64)
}

/// EWA 系数表 (单个平面)
///
/// 构建后只读, 可在多个线程间共享.
#[derive(Debug, Clone)]
pub struct StencilTable {
    filter_size: usize,
    coeff_stride: usize,
    block_len: usize,
    taps_x: usize,
    taps_y: usize,
    src_width: usize,
    src_height: usize,
    dst_width: usize,
    dst_height: usize,
    quantize_x: usize,
    quantize_y: usize,
    meta: Vec<PixelStencil>,
    coeffs: AlignedBuf<f32>,
    factor_map: Vec<Option<usize>>,
    border_pixels: usize,
}

impl StencilTable {
    /// 为一个平面构建系数表
    pub fn build(lut: &FilterLut, params: &StencilParams) -> JincResult<Self> {
        params.validate()?;

        let StencilParams {
            quantize_x,
            quantize_y,
            src_width,
            src_height,
            dst_width,
            dst_height,
            radius,
            crop,
        } = *params;

        let dst_w = f64::from(dst_width);
        let dst_h = f64::from(dst_height);

        // 仅缩小时放大支撑, 放大时保持核的名义支撑
        let step_x = (dst_w / crop.width).min(1.0);
        let step_y = (dst_h / crop.height).min(1.0);
        let support_x = radius / step_x;
        let support_y = radius / step_y;
        let support = support_x.max(support_y);
        let filter_size = (support * 2.0).ceil() as usize;

        // 源图像比窗口还小时只读取源图像范围内的像素, 系数块按实际读取范围分配
        let taps_x = filter_size.min(src_width as usize);
        let taps_y = filter_size.min(src_height as usize);
        let coeff_stride = taps_x.next_multiple_of(COEFF_ALIGN);
        let coeffs_per_pixel = coeff_stride * taps_y;

        // 目标像素中心映射到源像素坐标
        let start_x = crop.left + (crop.width - dst_w) / (dst_w * 2.0);
        let start_y = crop.top + (crop.height - dst_h) / (dst_h * 2.0);
        let x_step = crop.width / dst_w;
        let y_step = crop.height / dst_h;

        let radius2 = radius * radius;
        let max_x = f64::from(src_width - 1);
        let max_y = f64::from(src_height - 1);

        let qx = quantize_x as usize;
        let qy = quantize_y as usize;
        let mut factor_map: Vec<Option<usize>> = vec![None; qx * qy];
        let mut meta = Vec::with_capacity(dst_width as usize * dst_height as usize);
        let mut arena: Vec<f32> = Vec::new();
        let mut border_pixels = 0usize;

        for y in 0..dst_height as usize {
            let ypos = start_y + y as f64 * y_step;
            let win_y = axis_window(ypos, support, filter_size, src_height);
            let (bucket_y, quant_ypos) = quantize(ypos, quantize_y);
            let qwin_y = axis_window(quant_ypos, support, filter_size, src_height);

            for x in 0..dst_width as usize {
                let xpos = start_x + x as f64 * x_step;
                let win_x = axis_window(xpos, support, filter_size, src_width);
                let (bucket_x, quant_xpos) = quantize(xpos, quantize_x);
                let qwin_x = axis_window(quant_xpos, support, filter_size, src_width);

                // 量化后窗口越界也按边界处理, 保证存储的窗口与系数一致
                let is_border = win_x.border || win_y.border || qwin_x.border || qwin_y.border;
                let bucket = bucket_y * qx + bucket_x;

                if !is_border {
                    if let Some(offset) = factor_map[bucket] {
                        meta.push(PixelStencil {
                            start_x: qwin_x.begin as u32,
                            start_y: qwin_y.begin as u32,
                            coeff_offset: offset,
                        });
                        continue;
                    }
                }

                let (begin_x, begin_y, cur_x, cur_y) = if is_border {
                    border_pixels += 1;
                    (
                        win_x.begin,
                        win_y.begin,
                        xpos.clamp(0.0, max_x),
                        ypos.clamp(0.0, max_y),
                    )
                } else {
                    (qwin_x.begin, qwin_y.begin, quant_xpos, quant_ypos)
                };

                let offset = arena.len();
                arena.resize(offset + coeffs_per_pixel, 0.0);
                let block = &mut arena[offset..];

                let mut divider = 0.0f64;
                for ly in 0..taps_y {
                    let dy = (cur_y - (begin_y + ly) as f64) * step_y;
                    let row = &mut block[ly * coeff_stride..ly * coeff_stride + taps_x];
                    for (lx, slot) in row.iter_mut().enumerate() {
                        let dx = (cur_x - (begin_x + lx) as f64) * step_x;
                        let factor = lut.lookup(dx * dx + dy * dy, radius2);
                        *slot = factor;
                        divider += f64::from(factor);
                    }
                }

                if divider == 0.0 || !divider.is_finite() {
                    return Err(JincError::DegenerateStencil { plane: 0, x, y });
                }
                for ly in 0..taps_y {
                    for slot in &mut block[ly * coeff_stride..ly * coeff_stride + taps_x] {
                        *slot = (f64::from(*slot) / divider) as f32;
                    }
                }

                if !is_border {
                    factor_map[bucket] = Some(offset);
                }
                meta.push(PixelStencil {
                    start_x: begin_x as u32,
                    start_y: begin_y as u32,
                    coeff_offset: offset,
                });
            }
        }

        let coeffs = AlignedBuf::from_slice(&arena);
        debug!(
            "构建 EWA 系数表: {}x{} -> {}x{}, filter_size={}, 系数块 {} 个, 边界像素 {} 个",
            src_width,
            src_height,
            dst_width,
            dst_height,
            filter_size,
            coeffs.len() / coeffs_per_pixel,
            border_pixels,
        );

        Ok(Self {
            filter_size,
            coeff_stride,
            block_len: coeffs_per_pixel,
            taps_x,
            taps_y,
            src_width: src_width as usize,
            src_height: src_height as usize,
            dst_width: dst_width as usize,
            dst_height: dst_height as usize,
            quantize_x: qx,
            quantize_y: qy,
            meta,
            coeffs,
            factor_map,
            border_pixels,
        })
    }

    /// 窗口边长 (全表统一)
    pub fn filter_size(&self) -> usize {
        self.filter_size
    }

    /// 系数行跨度 (f32 个数, 水平 tap 数向上取整到 [`COEFF_ALIGN`] 的倍数)
    pub fn coeff_stride(&self) -> usize {
        self.coeff_stride
    }

    /// 实际读取的窗口宽高 (源图像小于窗口时被截断)
    pub fn taps(&self) -> (usize, usize) {
        (self.taps_x, self.taps_y)
    }

    /// 源平面尺寸
    pub fn src_size(&self) -> (usize, usize) {
        (self.src_width, self.src_height)
    }

    /// 目标平面尺寸
    pub fn dst_size(&self) -> (usize, usize) {
        (self.dst_width, self.dst_height)
    }

    /// 全部目标像素的窗口 (行优先)
    pub fn stencils(&self) -> &[PixelStencil] {
        &self.meta
    }

    /// 目标像素 (x, y) 的窗口
    pub fn stencil(&self, x: usize, y: usize) -> Option<&PixelStencil> {
        if x >= self.dst_width {
            return None;
        }
        self.meta.get(y * self.dst_width + x)
    }

    /// 窗口对应的系数块 (`taps().1` 行, 行跨度 `coeff_stride`)
    pub fn coefficients(&self, stencil: &PixelStencil) -> &[f32] {
        &self.coeffs[stencil.coeff_offset..stencil.coeff_offset + self.block_len]
    }

    /// 全部系数块
    pub fn arena(&self) -> &[f32] {
        &self.coeffs
    }

    /// 量化桶 (bx, by) 缓存的系数偏移
    pub fn cached_offset(&self, bucket_x: usize, bucket_y: usize) -> Option<usize> {
        if bucket_x >= self.quantize_x || bucket_y >= self.quantize_y {
            return None;
        }
        self.factor_map[bucket_y * self.quantize_x + bucket_x]
    }

    /// 不同系数块的个数
    pub fn distinct_stencils(&self) -> usize {
        self.coeffs.len() / self.block_len
    }

    /// 边界像素个数
    pub fn border_pixels(&self) -> usize {
        self.border_pixels
    }
}
