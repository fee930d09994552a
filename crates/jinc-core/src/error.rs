//! 统一错误类型定义.
//!
//! 所有 Jinc crate 共用的错误类型, 支持跨模块传播.

use thiserror::Error;

/// Jinc 缩放库统一错误类型
#[derive(Debug, Error)]
pub enum JincError {
    /// 无效参数 (配置错误或缓冲区形状不匹配)
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 不支持的采样格式或操作
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 滤镜窗口内权重之和为 0, 无法归一化
    #[error("退化的滤镜窗口: 平面 {plane}, 目标像素 ({x}, {y}) 的权重和为 0")]
    DegenerateStencil {
        /// 平面索引
        plane: usize,
        /// 目标像素 X 坐标
        x: usize,
        /// 目标像素 Y 坐标
        y: usize,
    },
}

/// Jinc 缩放库统一 Result 类型
pub type JincResult<T> = Result<T, JincError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_错误信息格式() {
        let err = JincError::InvalidArgument("tap 必须在 1-16 范围内".into());
        assert_eq!(err.to_string(), "无效参数: tap 必须在 1-16 范围内");

        let err = JincError::DegenerateStencil {
            plane: 1,
            x: 3,
            y: 7,
        };
        assert!(err.to_string().contains("(3, 7)"));
    }

    #[test]
    fn test_io_错误转换() {
        fn open_missing() -> JincResult<std::fs::File> {
            Ok(std::fs::File::open("/nonexistent/jinc/input.raw")?)
        }
        assert!(matches!(open_missing(), Err(JincError::Io(_))));
    }
}
