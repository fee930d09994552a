//! # jinc-ewa
//!
//! Jinc 缩放库 EWA (椭圆加权平均) 重采样实现.
//!
//! 本 crate 提供:
//! - Jinc 径向核函数 (`kernel`)
//! - 滤镜权重查找表 (`lut`)
//! - 带量化去重缓存的系数表构建 (`stencil`)
//! - 8/16 位整数与 32 位浮点平面卷积 (`convolve`)
//!
//! [`JincResizer`] 在创建时一次性构建查找表与各平面系数表, 之后只读,
//! 可在多个线程间共享并对任意多帧复用.

pub mod convolve;
pub mod kernel;
pub mod lut;
pub mod stencil;

use jinc_core::{JincError, JincResult, VideoFormat};
use log::debug;

pub use convolve::{Accel, Sample, SampleClamp, resize_plane, resize_plane_parallel};
pub use kernel::{DEFAULT_BLUR, MAX_TAP, jinc, radius_for_tap};
pub use lut::{DEFAULT_LUT_SAMPLES, FilterLut};
pub use stencil::{CropRect, DEFAULT_QUANTIZE, PixelStencil, StencilParams, StencilTable};

/// 缩放参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeParams {
    /// 目标宽度 (亮度平面)
    pub dst_width: u32,
    /// 目标高度 (亮度平面)
    pub dst_height: u32,
    /// 核的 tap 数 (1-16), 即取 Jinc 第几个零点作为半径
    pub tap: u32,
    /// 模糊系数, <1 锐化, >1 柔化
    pub blur: f64,
    /// 源裁剪区域 (亮度平面坐标), None 表示整幅源图像
    pub crop: Option<CropRect>,
    /// 查找表采样点数
    pub lut_samples: usize,
    /// 水平量化网格
    pub quantize_x: u32,
    /// 垂直量化网格
    pub quantize_y: u32,
    /// 是否按行并行卷积
    pub parallel: bool,
    /// 内积实现
    pub accel: Accel,
}

impl ResizeParams {
    /// 以默认参数创建 (tap=3, 默认模糊系数, 1024 采样点, 256x256 量化网格)
    pub fn new(dst_width: u32, dst_height: u32) -> Self {
        Self {
            dst_width,
            dst_height,
            tap: 3,
            blur: DEFAULT_BLUR,
            crop: None,
            lut_samples: DEFAULT_LUT_SAMPLES,
            quantize_x: DEFAULT_QUANTIZE,
            quantize_y: DEFAULT_QUANTIZE,
            parallel: true,
            accel: Accel::default(),
        }
    }

    /// 设置 tap 数
    pub fn with_tap(mut self, tap: u32) -> Self {
        self.tap = tap;
        self
    }

    /// 设置模糊系数
    pub fn with_blur(mut self, blur: f64) -> Self {
        self.blur = blur;
        self
    }

    /// 设置源裁剪区域
    pub fn with_crop(mut self, crop: CropRect) -> Self {
        self.crop = Some(crop);
        self
    }

    /// 设置查找表采样点数
    pub fn with_lut_samples(mut self, samples: usize) -> Self {
        self.lut_samples = samples;
        self
    }

    /// 设置量化网格
    pub fn with_quantize(mut self, quantize_x: u32, quantize_y: u32) -> Self {
        self.quantize_x = quantize_x;
        self.quantize_y = quantize_y;
        self
    }

    /// 启用或关闭按行并行
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// 设置内积实现
    pub fn with_accel(mut self, accel: Accel) -> Self {
        self.accel = accel;
        self
    }
}

/// Jinc 缩放上下文
///
/// 配置一次后可多次复用, 每个平面持有独立的系数表.
#[derive(Debug, Clone)]
pub struct JincResizer {
    src_format: VideoFormat,
    dst_format: VideoFormat,
    params: ResizeParams,
    radius: f64,
    blur: f64,
    clamp: SampleClamp,
    lut: FilterLut,
    tables: Vec<StencilTable>,
}

impl JincResizer {
    /// 创建缩放上下文并构建全部系数表
    pub fn new(src_format: VideoFormat, params: ResizeParams) -> JincResult<Self> {
        src_format.validate()?;

        let mut radius = radius_for_tap(params.tap).ok_or_else(|| {
            JincError::InvalidArgument(format!(
                "tap 必须在 1-{MAX_TAP} 范围内, 实际: {}",
                params.tap,
            ))
        })?;
        let mut blur = params.blur;

        if params.dst_width == 0 || params.dst_height == 0 {
            return Err(JincError::InvalidArgument(format!(
                "目标尺寸必须大于 0, 实际: {}x{}",
                params.dst_width, params.dst_height,
            )));
        }
        let dst_format = src_format.with_size(params.dst_width, params.dst_height);
        dst_format.validate()?;

        let crop = params
            .crop
            .unwrap_or_else(|| CropRect::full(src_format.width, src_format.height));
        crop.validate()?;

        // 缩小时按缩小比例放大核半径与模糊系数
        if params.dst_width < src_format.width || params.dst_height < src_format.height {
            let scale = (f64::from(src_format.width) / f64::from(params.dst_width))
                .min(f64::from(src_format.height) / f64::from(params.dst_height));
            radius *= scale;
            blur *= scale;
        }

        let lut = FilterLut::new(params.lut_samples, radius, blur)?;

        let mut tables = Vec::with_capacity(src_format.plane_count());
        for plane in 0..src_format.plane_count() {
            let (ssw, ssh) = src_format.plane_sub_sampling(plane);
            let stencil_params = StencilParams {
                quantize_x: params.quantize_x,
                quantize_y: params.quantize_y,
                src_width: src_format.plane_width(plane),
                src_height: src_format.plane_height(plane),
                dst_width: dst_format.plane_width(plane),
                dst_height: dst_format.plane_height(plane),
                radius,
                crop: crop.subsampled(ssw, ssh),
            };
            let table = StencilTable::build(&lut, &stencil_params).map_err(|e| match e {
                JincError::DegenerateStencil { x, y, .. } => {
                    JincError::DegenerateStencil { plane, x, y }
                }
                other => other,
            })?;
            tables.push(table);
        }

        debug!(
            "创建 Jinc 缩放上下文: {} -> {}x{}, tap={}, radius={:.6}, blur={:.6}",
            src_format, params.dst_width, params.dst_height, params.tap, radius, blur,
        );

        Ok(Self {
            src_format,
            dst_format,
            params,
            radius,
            blur,
            clamp: SampleClamp::for_format(&src_format),
            lut,
            tables,
        })
    }

    /// 源格式
    pub fn src_format(&self) -> &VideoFormat {
        &self.src_format
    }

    /// 输出格式 (源格式替换为目标尺寸)
    pub fn output_format(&self) -> VideoFormat {
        self.dst_format
    }

    /// 创建时使用的参数
    pub fn params(&self) -> &ResizeParams {
        &self.params
    }

    /// 实际使用的核半径 (已按缩小比例调整)
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// 实际使用的模糊系数 (已按缩小比例调整)
    pub fn blur(&self) -> f64 {
        self.blur
    }

    /// 输出截断策略
    pub fn clamp(&self) -> SampleClamp {
        self.clamp
    }

    /// 查找表
    pub fn lut(&self) -> &FilterLut {
        &self.lut
    }

    /// 指定平面的系数表
    pub fn table(&self, plane: usize) -> Option<&StencilTable> {
        self.tables.get(plane)
    }

    /// 缩放一帧的全部平面
    ///
    /// # 参数
    /// - `src` / `src_strides`: 源图像各平面数据与行跨度 (采样个数)
    /// - `dst` / `dst_strides`: 目标图像各平面数据与行跨度 (采样个数)
    pub fn process<T: Sample>(
        &self,
        src: &[&[T]],
        src_strides: &[usize],
        dst: &mut [&mut [T]],
        dst_strides: &[usize],
    ) -> JincResult<()> {
        let planes = self.tables.len();
        if src.len() < planes || src_strides.len() < planes {
            return Err(JincError::InvalidArgument(format!(
                "源图像需要 {planes} 个平面, 实际: {} 个数据 / {} 个行跨度",
                src.len(),
                src_strides.len(),
            )));
        }
        if dst.len() < planes || dst_strides.len() < planes {
            return Err(JincError::InvalidArgument(format!(
                "目标图像需要 {planes} 个平面, 实际: {} 个数据 / {} 个行跨度",
                dst.len(),
                dst_strides.len(),
            )));
        }

        for plane in 0..planes {
            self.process_plane(
                plane,
                src[plane],
                src_strides[plane],
                &mut *dst[plane],
                dst_strides[plane],
            )?;
        }
        Ok(())
    }

    /// 缩放单个平面
    pub fn process_plane<T: Sample>(
        &self,
        plane: usize,
        src: &[T],
        src_stride: usize,
        dst: &mut [T],
        dst_stride: usize,
    ) -> JincResult<()> {
        self.check_sample::<T>()?;
        let table = self.tables.get(plane).ok_or_else(|| {
            JincError::InvalidArgument(format!(
                "平面索引 {plane} 超出范围 (共 {} 个平面)",
                self.tables.len(),
            ))
        })?;

        let (clamp, accel) = (self.clamp, self.params.accel);
        if self.params.parallel {
            resize_plane_parallel(table, src, src_stride, dst, dst_stride, clamp, accel)
        } else {
            resize_plane(table, src, src_stride, dst, dst_stride, clamp, accel)
        }
    }

    /// 校验采样类型与源格式一致
    fn check_sample<T: Sample>(&self) -> JincResult<()> {
        let fmt = &self.src_format;
        if T::SAMPLE_TYPE != fmt.sample_type || T::BYTES != fmt.bytes_per_sample() {
            return Err(JincError::InvalidArgument(format!(
                "采样类型与格式 {fmt} 不匹配: 每采样 {} 字节",
                T::BYTES,
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_默认参数() {
        let params = ResizeParams::new(1280, 720);
        assert_eq!(params.tap, 3);
        assert_eq!(params.blur, DEFAULT_BLUR);
        assert_eq!(params.lut_samples, 1024);
        assert_eq!((params.quantize_x, params.quantize_y), (256, 256));
        assert!(params.parallel);
        assert_eq!(params.accel, Accel::Lanes);
        assert!(params.crop.is_none());
    }

    #[test]
    fn test_tap_超出范围() {
        let src = VideoFormat::gray8(8, 8);
        for tap in [0, 17] {
            let err = JincResizer::new(src, ResizeParams::new(16, 16).with_tap(tap));
            assert!(matches!(err, Err(JincError::InvalidArgument(_))), "tap={tap}");
        }
        assert!(JincResizer::new(src, ResizeParams::new(16, 16).with_tap(16)).is_ok());
    }

    #[test]
    fn test_非法配置() {
        let src = VideoFormat::gray8(8, 8);
        let cases = [
            ResizeParams::new(0, 8),
            ResizeParams::new(8, 8).with_quantize(0, 256),
            ResizeParams::new(8, 8).with_lut_samples(1),
            ResizeParams::new(8, 8).with_crop(CropRect::new(0.0, 0.0, -4.0, 8.0)),
        ];
        for params in cases {
            assert!(
                matches!(JincResizer::new(src, params), Err(JincError::InvalidArgument(_))),
                "{params:?}",
            );
        }
        // 24 位整数不支持
        let err = JincResizer::new(VideoFormat::gray(8, 8, 24), ResizeParams::new(8, 8));
        assert!(matches!(err, Err(JincError::Unsupported(_))));
        // 目标色度平面宽度为 0
        let err = JincResizer::new(VideoFormat::yuv420p8(8, 8), ResizeParams::new(1, 8));
        assert!(matches!(err, Err(JincError::InvalidArgument(_))));
    }

    #[test]
    fn test_缩小时调整半径与模糊() {
        let src = VideoFormat::gray8(100, 100);
        let resizer = JincResizer::new(src, ResizeParams::new(50, 50)).unwrap();
        let tap3 = radius_for_tap(3).unwrap();
        assert!((resizer.radius() - tap3 * 2.0).abs() < 1e-12);
        assert!((resizer.blur() - DEFAULT_BLUR * 2.0).abs() < 1e-12);

        let resizer = JincResizer::new(src, ResizeParams::new(200, 150)).unwrap();
        assert_eq!(resizer.radius(), tap3);
        assert_eq!(resizer.blur(), DEFAULT_BLUR);
    }

    #[test]
    fn test_权重和为0_报告平面() {
        let err = JincResizer::new(
            VideoFormat::gray8(16, 16),
            ResizeParams::new(32, 32).with_blur(0.05),
        )
        .unwrap_err();
        assert!(matches!(err, JincError::DegenerateStencil { plane: 0, .. }), "{err:?}");

        // 亮度 1:1 且裁剪偏移 1 像素, 采样点落在源像素中心;
        // 色度裁剪偏移为 0.5, 采样点全部落在两像素之间
        let params = ResizeParams::new(16, 16)
            .with_blur(0.05)
            .with_crop(CropRect::new(1.0, 0.0, 16.0, 16.0));
        let err = JincResizer::new(VideoFormat::yuv420p8(16, 16), params).unwrap_err();
        assert!(matches!(err, JincError::DegenerateStencil { plane: 1, .. }), "{err:?}");

        // 去掉裁剪后各平面都能构建
        let params = ResizeParams::new(16, 16).with_blur(0.05);
        assert!(JincResizer::new(VideoFormat::yuv420p8(16, 16), params).is_ok());
    }

    #[test]
    fn test_yuv420p_平面几何() {
        let src = VideoFormat::yuv420p8(64, 48);
        let resizer = JincResizer::new(src, ResizeParams::new(32, 24)).unwrap();
        assert_eq!(resizer.output_format(), VideoFormat::yuv420p8(32, 24));
        assert_eq!(resizer.table(0).unwrap().src_size(), (64, 48));
        assert_eq!(resizer.table(0).unwrap().dst_size(), (32, 24));
        assert_eq!(resizer.table(1).unwrap().src_size(), (32, 24));
        assert_eq!(resizer.table(2).unwrap().dst_size(), (16, 12));
        assert!(resizer.table(3).is_none());
        assert_eq!(resizer.clamp(), SampleClamp::Integer { peak: 255 });
    }

    #[test]
    fn test_处理一帧_yuv420p() {
        let src_fmt = VideoFormat::yuv420p8(16, 16);
        let resizer = JincResizer::new(src_fmt, ResizeParams::new(24, 24)).unwrap();

        let y = vec![200u8; 16 * 16];
        let u = vec![60u8; 8 * 8];
        let v = vec![140u8; 8 * 8];
        let mut dy = vec![0u8; 24 * 24];
        let mut du = vec![0u8; 12 * 12];
        let mut dv = vec![0u8; 12 * 12];
        resizer
            .process(
                &[&y[..], &u[..], &v[..]],
                &[16, 8, 8],
                &mut [&mut dy[..], &mut du[..], &mut dv[..]],
                &[24, 12, 12],
            )
            .unwrap();
        assert!(dy.iter().all(|&p| p == 200));
        assert!(du.iter().all(|&p| p == 60));
        assert!(dv.iter().all(|&p| p == 140));
    }

    #[test]
    fn test_采样类型不匹配() {
        let resizer = JincResizer::new(VideoFormat::gray16(8, 8), ResizeParams::new(4, 4)).unwrap();
        let src = vec![0u8; 64];
        let mut dst = vec![0u8; 16];
        let err = resizer.process_plane(0, &src, 8, &mut dst, 4);
        assert!(matches!(err, Err(JincError::InvalidArgument(_))));

        let src = vec![0u16; 64];
        let mut dst = vec![0u16; 16];
        assert!(resizer.process_plane(0, &src, 8, &mut dst, 4).is_ok());
        assert!(resizer.process_plane(1, &src, 8, &mut dst, 4).is_err());
    }

    #[test]
    fn test_平面数量不足() {
        let resizer = JincResizer::new(VideoFormat::rgbp8(8, 8), ResizeParams::new(8, 8)).unwrap();
        let r = vec![0u8; 64];
        let mut dr = vec![0u8; 64];
        let err = resizer.process(&[&r[..]], &[8], &mut [&mut dr[..]], &[8]);
        assert!(matches!(err, Err(JincError::InvalidArgument(_))));
    }
}
