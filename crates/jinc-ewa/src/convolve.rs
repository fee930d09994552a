//! EWA 卷积.
//!
//! 对每个目标像素, 从源平面读取其窗口内的像素块, 与系数块逐元素相乘求和,
//! 按采样格式截断后写入目标平面. 各平面相互独立.
//!
//! 步长 (stride) 以采样个数计, 不是字节数.

use jinc_core::{JincError, JincResult, SampleType, VideoFormat};
use rayon::prelude::*;

use crate::stencil::{PixelStencil, StencilTable};

/// 加速路径的累加通道数
pub const LANES: usize = 8;

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for f32 {}
}

/// 平面采样类型: `u8` (8 位), `u16` (9-16 位), `f32` (浮点)
pub trait Sample: sealed::Sealed + Copy + Send + Sync + 'static {
    /// 对应的采样类型
    const SAMPLE_TYPE: SampleType;
    /// 每个采样的字节数
    const BYTES: usize;

    /// 转为 f32 参与卷积
    fn to_f32(self) -> f32;

    /// 由已截断的 f32 值转回
    fn from_f32(v: f32) -> Self;
}

impl Sample for u8 {
    const SAMPLE_TYPE: SampleType = SampleType::Integer;
    const BYTES: usize = 1;

    #[inline]
    fn to_f32(self) -> f32 {
        f32::from(self)
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        v as u8
    }
}

impl Sample for u16 {
    const SAMPLE_TYPE: SampleType = SampleType::Integer;
    const BYTES: usize = 2;

    #[inline]
    fn to_f32(self) -> f32 {
        f32::from(self)
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        v as u16
    }
}

impl Sample for f32 {
    const SAMPLE_TYPE: SampleType = SampleType::Float;
    const BYTES: usize = 4;

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        v
    }
}

/// 输出截断策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleClamp {
    /// 整数: 四舍五入后截断到 `[0, peak]`
    Integer {
        /// 峰值 (2^bits - 1)
        peak: u32,
    },
    /// 浮点: 截断到 `[-1, 1]`
    Float,
}

impl SampleClamp {
    /// 按视频格式选择截断策略
    pub fn for_format(format: &VideoFormat) -> Self {
        match format.peak() {
            Some(peak) => Self::Integer { peak },
            None => Self::Float,
        }
    }

    /// 截断单个卷积结果
    #[inline]
    pub fn apply(self, v: f32) -> f32 {
        match self {
            Self::Integer { peak } => v.round().clamp(0.0, peak as f32),
            Self::Float => v.clamp(-1.0, 1.0),
        }
    }
}

/// 卷积内积实现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Accel {
    /// 逐元素累加 (参考实现)
    Scalar,
    /// 8 路并行累加后归约, 便于编译器向量化
    #[default]
    Lanes,
}

/// 单线程缩放一个平面
///
/// # 参数
/// - `table`: 该平面的系数表
/// - `src` / `src_stride`: 源平面数据与行跨度 (采样个数)
/// - `dst` / `dst_stride`: 目标平面数据与行跨度 (采样个数)
/// - `clamp`: 输出截断策略
/// - `accel`: 内积实现
pub fn resize_plane<T: Sample>(
    table: &StencilTable,
    src: &[T],
    src_stride: usize,
    dst: &mut [T],
    dst_stride: usize,
    clamp: SampleClamp,
    accel: Accel,
) -> JincResult<()> {
    check_buffers(table, src.len(), src_stride, dst.len(), dst_stride)?;
    let (dst_w, dst_h) = table.dst_size();

    for (y, row) in dst.chunks_mut(dst_stride).take(dst_h).enumerate() {
        convolve_row(table, src, src_stride, y, &mut row[..dst_w], clamp, accel);
    }
    Ok(())
}

/// 按行并行缩放一个平面 (rayon 线程池)
///
/// 参数与 [`resize_plane`] 相同, 结果逐位一致.
pub fn resize_plane_parallel<T: Sample>(
    table: &StencilTable,
    src: &[T],
    src_stride: usize,
    dst: &mut [T],
    dst_stride: usize,
    clamp: SampleClamp,
    accel: Accel,
) -> JincResult<()> {
    check_buffers(table, src.len(), src_stride, dst.len(), dst_stride)?;
    let (dst_w, dst_h) = table.dst_size();

    dst.par_chunks_mut(dst_stride)
        .take(dst_h)
        .enumerate()
        .for_each(|(y, row)| {
            convolve_row(table, src, src_stride, y, &mut row[..dst_w], clamp, accel);
        });
    Ok(())
}

/// 校验缓冲区形状, 保证卷积过程中不会越界
fn check_buffers(
    table: &StencilTable,
    src_len: usize,
    src_stride: usize,
    dst_len: usize,
    dst_stride: usize,
) -> JincResult<()> {
    let (src_w, src_h) = table.src_size();
    let (dst_w, dst_h) = table.dst_size();

    if src_stride < src_w {
        return Err(JincError::InvalidArgument(format!(
            "源行跨度 {src_stride} 小于平面宽度 {src_w}",
        )));
    }
    if dst_stride < dst_w {
        return Err(JincError::InvalidArgument(format!(
            "目标行跨度 {dst_stride} 小于平面宽度 {dst_w}",
        )));
    }
    let src_need = src_stride * (src_h - 1) + src_w;
    if src_len < src_need {
        return Err(JincError::InvalidArgument(format!(
            "源平面数据不足: 需要 {src_need} 个采样, 实际 {src_len}",
        )));
    }
    let dst_need = dst_stride * (dst_h - 1) + dst_w;
    if dst_len < dst_need {
        return Err(JincError::InvalidArgument(format!(
            "目标平面缓冲区不足: 需要 {dst_need} 个采样, 实际 {dst_len}",
        )));
    }
    Ok(())
}

fn convolve_row<T: Sample>(
    table: &StencilTable,
    src: &[T],
    src_stride: usize,
    y: usize,
    row: &mut [T],
    clamp: SampleClamp,
    accel: Accel,
) {
    let (dst_w, _) = table.dst_size();
    let stencils = &table.stencils()[y * dst_w..(y + 1) * dst_w];
    for (out, st) in row.iter_mut().zip(stencils) {
        let v = convolve_pixel(table, src, src_stride, st, accel);
        *out = T::from_f32(clamp.apply(v));
    }
}

#[inline]
fn convolve_pixel<T: Sample>(
    table: &StencilTable,
    src: &[T],
    src_stride: usize,
    st: &PixelStencil,
    accel: Accel,
) -> f32 {
    let (taps_x, taps_y) = table.taps();
    let coeff_stride = table.coeff_stride();
    let coeffs = table.coefficients(st);
    let (sx, sy) = (st.start_x as usize, st.start_y as usize);

    let mut acc = 0.0f32;
    for ly in 0..taps_y {
        let base = (sy + ly) * src_stride + sx;
        let pixels = &src[base..base + taps_x];
        let weights = &coeffs[ly * coeff_stride..ly * coeff_stride + taps_x];
        acc += match accel {
            Accel::Scalar => dot_scalar(pixels, weights),
            Accel::Lanes => dot_lanes(pixels, weights),
        };
    }
    acc
}

#[inline]
fn dot_scalar<T: Sample>(pixels: &[T], weights: &[f32]) -> f32 {
    pixels
        .iter()
        .zip(weights)
        .map(|(&p, &w)| p.to_f32() * w)
        .sum()
}

#[inline]
fn dot_lanes<T: Sample>(pixels: &[T], weights: &[f32]) -> f32 {
    let pixel_chunks = pixels.chunks_exact(LANES);
    let weight_chunks = weights.chunks_exact(LANES);
    let tail = dot_scalar(pixel_chunks.remainder(), weight_chunks.remainder());

    let mut lanes = [0.0f32; LANES];
    for (p, w) in pixel_chunks.zip(weight_chunks) {
        for ((lane, &p), &w) in lanes.iter_mut().zip(p).zip(w) {
            *lane += p.to_f32() * w;
        }
    }
    lanes.iter().sum::<f32>() + tail
}
