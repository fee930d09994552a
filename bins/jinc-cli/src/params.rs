//! 命令行参数解析与参数文件.
//!
//! 参数文件为 JSON, 字段均可省略, 命令行选项优先于文件中的值:
//!
//! ```json
//! {
//!     "tap": 4,
//!     "blur": 1.0,
//!     "crop": { "left": 8, "top": 0, "width": 624, "height": 480 },
//!     "lut_samples": 2048,
//!     "quantize_x": 128,
//!     "quantize_y": 128,
//!     "parallel": false,
//!     "accel": "scalar"
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use jinc_ewa::{Accel, CropRect, ResizeParams};
use serde::Deserialize;

/// 内积实现 (命令行与参数文件共用)
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccelArg {
    /// 逐元素累加
    Scalar,
    /// 8 路并行累加
    Lanes,
}

impl From<AccelArg> for Accel {
    fn from(arg: AccelArg) -> Self {
        match arg {
            AccelArg::Scalar => Accel::Scalar,
            AccelArg::Lanes => Accel::Lanes,
        }
    }
}

/// 参数文件中的裁剪区域
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CropSpec {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl From<CropSpec> for CropRect {
    fn from(c: CropSpec) -> Self {
        CropRect::new(c.left, c.top, c.width, c.height)
    }
}

/// JSON 参数文件
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParamsFile {
    pub tap: Option<u32>,
    pub blur: Option<f64>,
    pub crop: Option<CropSpec>,
    pub lut_samples: Option<usize>,
    pub quantize_x: Option<u32>,
    pub quantize_y: Option<u32>,
    pub parallel: Option<bool>,
    pub accel: Option<AccelArg>,
}

impl ParamsFile {
    /// 从 JSON 文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取参数文件 '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("参数文件格式错误 '{}'", path.display()))
    }

    /// 解析 JSON 文本
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// 将文件中出现的字段写入缩放参数
    pub fn apply(&self, mut params: ResizeParams) -> ResizeParams {
        if let Some(tap) = self.tap {
            params = params.with_tap(tap);
        }
        if let Some(blur) = self.blur {
            params = params.with_blur(blur);
        }
        if let Some(crop) = self.crop {
            params = params.with_crop(crop.into());
        }
        if let Some(samples) = self.lut_samples {
            params = params.with_lut_samples(samples);
        }
        let qx = self.quantize_x.unwrap_or(params.quantize_x);
        let qy = self.quantize_y.unwrap_or(params.quantize_y);
        params = params.with_quantize(qx, qy);
        if let Some(parallel) = self.parallel {
            params = params.with_parallel(parallel);
        }
        if let Some(accel) = self.accel {
            params = params.with_accel(accel.into());
        }
        params
    }
}

/// 解析尺寸字符串 (如 "1280x720")
pub fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("尺寸格式应为 WxH, 实际: '{s}'"))?;
    let w = w.parse().map_err(|_| format!("无效的宽度: '{w}'"))?;
    let h = h.parse().map_err(|_| format!("无效的高度: '{h}'"))?;
    Ok((w, h))
}

/// 解析裁剪区域 (如 "8:0:624:480", 即 left:top:width:height)
pub fn parse_crop(s: &str) -> Result<CropRect, String> {
    let parts = s
        .split(':')
        .map(|p| p.parse::<f64>().map_err(|_| format!("无效的裁剪分量: '{p}'")))
        .collect::<Result<Vec<_>, _>>()?;
    match parts[..] {
        [left, top, width, height] => Ok(CropRect::new(left, top, width, height)),
        _ => Err(format!("裁剪格式应为 L:T:W:H, 实际: '{s}'")),
    }
}

/// 解析量化网格 (如 "256:256")
pub fn parse_quantize(s: &str) -> Result<(u32, u32), String> {
    let (qx, qy) = s
        .split_once(':')
        .ok_or_else(|| format!("量化网格格式应为 QX:QY, 实际: '{s}'"))?;
    let qx = qx.parse().map_err(|_| format!("无效的水平量化网格: '{qx}'"))?;
    let qy = qy.parse().map_err(|_| format!("无效的垂直量化网格: '{qy}'"))?;
    Ok((qx, qy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_解析尺寸() {
        assert_eq!(parse_size("1280x720"), Ok((1280, 720)));
        assert!(parse_size("1280").is_err());
        assert!(parse_size("axb").is_err());
        assert!(parse_size("1280x-1").is_err());
    }

    #[test]
    fn test_解析裁剪() {
        assert_eq!(
            parse_crop("8:0.5:624:480"),
            Ok(CropRect::new(8.0, 0.5, 624.0, 480.0))
        );
        assert!(parse_crop("8:0:624").is_err());
        assert!(parse_crop("8:0:x:480").is_err());
    }

    #[test]
    fn test_解析量化网格() {
        assert_eq!(parse_quantize("128:64"), Ok((128, 64)));
        assert!(parse_quantize("128").is_err());
        assert!(parse_quantize("128:y").is_err());
    }

    #[test]
    fn test_参数文件() {
        let file = ParamsFile::parse(
            r#"{ "tap": 4, "crop": { "left": 1, "top": 2, "width": 30, "height": 40 },
                 "quantize_y": 64, "accel": "scalar" }"#,
        )
        .unwrap();
        let params = file.apply(ResizeParams::new(16, 16));
        assert_eq!(params.tap, 4);
        assert_eq!(params.crop, Some(CropRect::new(1.0, 2.0, 30.0, 40.0)));
        assert_eq!((params.quantize_x, params.quantize_y), (256, 64));
        assert_eq!(params.accel, Accel::Scalar);
        assert!(params.parallel);

        assert_eq!(ParamsFile::parse("{}").unwrap(), ParamsFile::default());
        assert!(ParamsFile::parse(r#"{ "taps": 3 }"#).is_err());
        assert!(ParamsFile::parse(r#"{ "accel": "simd" }"#).is_err());
    }
}
