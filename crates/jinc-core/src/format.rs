//! 视频格式描述.
//!
//! 描述一帧平面图像的几何与采样表示: 尺寸、色彩族、每平面子采样、
//! 采样类型 (整数/浮点) 与位深. 缩放上下文据此校验输入并推导各平面尺寸.

use std::fmt;

use crate::{JincError, JincResult};

/// 色度子采样系数 (log2) 上限, 即最多 1/16
pub const MAX_SUB_SAMPLING: u32 = 4;

/// 采样类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    /// 无符号整数 (8-16 位)
    Integer,
    /// IEEE 754 浮点 (仅 32 位)
    Float,
}

/// 色彩族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFamily {
    /// 单平面灰度
    Gray,
    /// Y/U/V 三平面, 色度平面可子采样
    Yuv,
    /// R/G/B 三平面, 无子采样
    Rgb,
}

impl ColorFamily {
    /// 该色彩族的平面数量
    pub const fn plane_count(&self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Yuv | Self::Rgb => 3,
        }
    }
}

/// 平面视频格式
///
/// `sub_sampling_w` / `sub_sampling_h` 为 log2 子采样系数,
/// 例如 YUV420 为 (1, 1), 表示色度平面为亮度的 1/2 x 1/2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoFormat {
    /// 亮度平面宽度
    pub width: u32,
    /// 亮度平面高度
    pub height: u32,
    /// 色彩族
    pub family: ColorFamily,
    /// 采样类型
    pub sample_type: SampleType,
    /// 每个采样的有效位数
    pub bits_per_sample: u32,
    /// 色度水平子采样 (log2)
    pub sub_sampling_w: u32,
    /// 色度垂直子采样 (log2)
    pub sub_sampling_h: u32,
    /// 是否为固定格式 (可变尺寸/格式的流无法预先构建系数表)
    pub constant: bool,
}

impl VideoFormat {
    /// 创建整数灰度格式
    pub const fn gray(width: u32, height: u32, bits: u32) -> Self {
        Self::new(width, height, ColorFamily::Gray, SampleType::Integer, bits, 0, 0)
    }

    /// 8 位灰度
    pub const fn gray8(width: u32, height: u32) -> Self {
        Self::gray(width, height, 8)
    }

    /// 16 位灰度
    pub const fn gray16(width: u32, height: u32) -> Self {
        Self::gray(width, height, 16)
    }

    /// 32 位浮点灰度
    pub const fn grayf32(width: u32, height: u32) -> Self {
        Self::new(width, height, ColorFamily::Gray, SampleType::Float, 32, 0, 0)
    }

    /// 整数 YUV 平面格式, 子采样由 (ssw, ssh) 指定
    pub const fn yuv(width: u32, height: u32, bits: u32, ssw: u32, ssh: u32) -> Self {
        Self::new(width, height, ColorFamily::Yuv, SampleType::Integer, bits, ssw, ssh)
    }

    /// YUV 4:2:0 平面格式, 8 位
    pub const fn yuv420p8(width: u32, height: u32) -> Self {
        Self::yuv(width, height, 8, 1, 1)
    }

    /// YUV 4:2:0 平面格式, 16 位
    pub const fn yuv420p16(width: u32, height: u32) -> Self {
        Self::yuv(width, height, 16, 1, 1)
    }

    /// YUV 4:4:4 平面格式, 32 位浮点
    pub const fn yuv444pf32(width: u32, height: u32) -> Self {
        Self::new(width, height, ColorFamily::Yuv, SampleType::Float, 32, 0, 0)
    }

    /// RGB 平面格式, 8 位
    pub const fn rgbp8(width: u32, height: u32) -> Self {
        Self::new(width, height, ColorFamily::Rgb, SampleType::Integer, 8, 0, 0)
    }

    /// 通用构造
    pub const fn new(
        width: u32,
        height: u32,
        family: ColorFamily,
        sample_type: SampleType,
        bits_per_sample: u32,
        sub_sampling_w: u32,
        sub_sampling_h: u32,
    ) -> Self {
        Self {
            width,
            height,
            family,
            sample_type,
            bits_per_sample,
            sub_sampling_w,
            sub_sampling_h,
            constant: true,
        }
    }

    /// 返回尺寸替换后的同格式描述
    pub const fn with_size(&self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..*self
        }
    }

    /// 平面数量
    pub const fn plane_count(&self) -> usize {
        self.family.plane_count()
    }

    /// 每个采样占用的字节数
    pub const fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample.div_ceil(8) as usize
    }

    /// 整数格式的峰值 (2^bits - 1), 浮点格式返回 None
    pub const fn peak(&self) -> Option<u32> {
        match self.sample_type {
            SampleType::Integer => match 1u32.checked_shl(self.bits_per_sample) {
                Some(v) => Some(v - 1),
                None => Some(u32::MAX),
            },
            SampleType::Float => None,
        }
    }

    /// 指定平面的 log2 子采样系数 (亮度平面恒为 (0, 0))
    pub const fn plane_sub_sampling(&self, plane: usize) -> (u32, u32) {
        if plane == 0 {
            (0, 0)
        } else {
            (self.sub_sampling_w, self.sub_sampling_h)
        }
    }

    /// 指定平面的宽度 (像素), 子采样移位超过 31 时为 0
    pub const fn plane_width(&self, plane: usize) -> u32 {
        match self.width.checked_shr(self.plane_sub_sampling(plane).0) {
            Some(w) => w,
            None => 0,
        }
    }

    /// 指定平面的高度 (像素), 子采样移位超过 31 时为 0
    pub const fn plane_height(&self, plane: usize) -> u32 {
        match self.height.checked_shr(self.plane_sub_sampling(plane).1) {
            Some(h) => h,
            None => 0,
        }
    }

    /// 校验格式是否可用于 Jinc 缩放
    ///
    /// 仅支持固定格式的 8-16 位整数与 32 位浮点输入.
    pub fn validate(&self) -> JincResult<()> {
        let supported = self.constant
            && match self.sample_type {
                SampleType::Integer => (1..=16).contains(&self.bits_per_sample),
                SampleType::Float => self.bits_per_sample == 32,
            };
        if !supported {
            return Err(JincError::Unsupported(format!(
                "仅支持固定格式的 8-16 位整数与 32 位浮点输入, 实际: {self}",
            )));
        }
        if self.sub_sampling_w > MAX_SUB_SAMPLING || self.sub_sampling_h > MAX_SUB_SAMPLING {
            return Err(JincError::InvalidArgument(format!(
                "色度子采样系数 (log2) 不能超过 {MAX_SUB_SAMPLING}, 实际: ({}, {})",
                self.sub_sampling_w, self.sub_sampling_h,
            )));
        }
        if self.family == ColorFamily::Rgb && (self.sub_sampling_w != 0 || self.sub_sampling_h != 0)
        {
            return Err(JincError::InvalidArgument(
                "RGB 平面格式不能带色度子采样".into(),
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(JincError::InvalidArgument(format!(
                "源尺寸必须大于 0, 实际: {}x{}",
                self.width, self.height,
            )));
        }
        for plane in 1..self.plane_count() {
            if self.plane_width(plane) == 0 || self.plane_height(plane) == 0 {
                return Err(JincError::InvalidArgument(format!(
                    "平面 {plane} 子采样后尺寸为 0 ({}x{})",
                    self.plane_width(plane),
                    self.plane_height(plane),
                )));
            }
        }
        Ok(())
    }

    /// 按名称解析格式, 如 `gray8`, `gray16`, `grayf32`, `yuv420p10`,
    /// `yuv444pf32`, `rgbp8`
    pub fn parse(name: &str, width: u32, height: u32) -> JincResult<Self> {
        let invalid = || JincError::InvalidArgument(format!("无法识别的格式名: {name}"));

        let (family, ssw, ssh, depth) = if let Some(rest) = name.strip_prefix("gray") {
            (ColorFamily::Gray, 0, 0, rest)
        } else if let Some(rest) = name.strip_prefix("rgbp") {
            (ColorFamily::Rgb, 0, 0, rest)
        } else if let Some(rest) = name.strip_prefix("yuv") {
            let (sub, depth) = rest.split_once('p').ok_or_else(invalid)?;
            let (ssw, ssh) = match sub {
                "444" => (0, 0),
                "422" => (1, 0),
                "440" => (0, 1),
                "420" => (1, 1),
                "411" => (2, 0),
                "410" => (2, 1),
                _ => return Err(invalid()),
            };
            (ColorFamily::Yuv, ssw, ssh, depth)
        } else {
            return Err(invalid());
        };

        let (sample_type, bits) = match depth.strip_prefix('f') {
            Some(bits) => (SampleType::Float, bits.parse().map_err(|_| invalid())?),
            None => (SampleType::Integer, depth.parse().map_err(|_| invalid())?),
        };

        Ok(Self::new(width, height, family, sample_type, bits, ssw, ssh))
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = match self.sample_type {
            SampleType::Integer => format!("{}", self.bits_per_sample),
            SampleType::Float => format!("f{}", self.bits_per_sample),
        };
        match self.family {
            ColorFamily::Gray => write!(f, "gray{depth}")?,
            ColorFamily::Rgb => write!(f, "rgbp{depth}")?,
            ColorFamily::Yuv => {
                let sub = match (self.sub_sampling_w, self.sub_sampling_h) {
                    (0, 0) => "444",
                    (1, 0) => "422",
                    (0, 1) => "440",
                    (1, 1) => "420",
                    (2, 0) => "411",
                    (2, 1) => "410",
                    _ => "xxx",
                };
                write!(f, "yuv{sub}p{depth}")?;
            }
        }
        if !self.constant {
            f.write_str(" (可变)")?;
        }
        write!(f, " {}x{}", self.width, self.height)
    }
}
