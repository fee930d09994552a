//! # jinc-core
//!
//! Jinc 缩放库核心库, 提供基础类型定义、错误处理和对齐缓冲区.
//!
//! 本 crate 为 `jinc-ewa` 与命令行工具提供底层基础设施.

pub mod aligned;
pub mod error;
pub mod format;

// 重导出常用类型
pub use aligned::AlignedBuf;
pub use error::{JincError, JincResult};
pub use format::{ColorFamily, MAX_SUB_SAMPLING, SampleType, VideoFormat};
