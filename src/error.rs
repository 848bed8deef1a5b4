//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义应用级 `AppError`，覆盖启动阶段（配置、I/O）与装饰流水线的错误，
//! 让 `main` 只需要一个 `Result<(), AppError>`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `DecorError` 与 `std::io::Error` 提供 `From` 转换，无需手动 map。

use crate::decoration::DecorError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 启动配置缺失或非法
    #[error("配置错误: {0}")]
    Config(String),

    /// 头像装饰流水线错误（下载 / 解码 / 绘制）
    #[error("{0}")]
    Decoration(#[from] DecorError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoration_error_is_displayed_transparently() {
        let err: AppError = DecorError::OverlayNotFound("frame.png".into()).into();
        assert_eq!(err.to_string(), "未找到覆盖图：frame.png");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)));
        assert!(err.to_string().starts_with("文件系统错误"));
    }
}
