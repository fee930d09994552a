//! # Jinc
//!
//! 纯 Rust 实现的 EWA Jinc 图像缩放库.
//!
//! 以 Jinc (sinc 的圆盘推广) 为径向核, 在源图像上做椭圆加权平均 (EWA) 重采样:
//! - **核函数**: 分段泰勒级数与大参数渐近展开, 覆盖 1-16 tap
//! - **查找表**: 按平方距离离散的 "滤镜 x 窗函数" 权重
//! - **系数表**: 每个目标像素的窗口与归一化权重, 内部像素按量化坐标去重
//! - **卷积**: 8/16 位整数与 32 位浮点平面, 可按行并行
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use jinc::core::VideoFormat;
//! use jinc::ewa::{JincResizer, ResizeParams};
//!
//! let src = VideoFormat::gray8(640, 480);
//! let resizer = JincResizer::new(src, ResizeParams::new(1280, 960).with_tap(3)).unwrap();
//!
//! let input = vec![128u8; 640 * 480];
//! let mut output = vec![0u8; 1280 * 960];
//! resizer.process_plane(0, &input, 640, &mut output, 1280).unwrap();
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `jinc-core` | 错误类型、视频格式、对齐缓冲区 |
//! | `jinc-ewa` | 核函数、查找表、系数表、卷积与缩放上下文 |

/// 核心类型与工具
pub use jinc_core as core;

/// EWA Jinc 重采样
pub use jinc_ewa as ewa;

/// 获取 Jinc 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
