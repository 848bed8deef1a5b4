//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载装饰链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! “未找到透明槽位”不是错误，而是合成器的回退尺寸分支，因此不在这里出现。

/// 头像装饰统一错误类型。
///
/// 该类型会在服务层被转换为给用户的回复文本。
#[derive(Debug, thiserror::Error)]
pub enum DecorError {
    #[error("网络错误：{0}")]
    Network(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("绘制错误：{0}")]
    Render(String),

    #[error("未知装饰样式：{0}（可选：ring / double-ring / dotted-ring / gradient-ring / glow / overlay）")]
    UnknownStyle(String),

    #[error("缺少参数：{0}")]
    MissingArgument(String),

    #[error("参数无效：{0}")]
    InvalidArgument(String),

    #[error("未找到覆盖图：{0}")]
    OverlayNotFound(String),
}

impl DecorError {
    /// 是否属于用户输入问题（而非系统故障）。
    ///
    /// 服务层据此决定日志级别：用户错误记 `warn`，其余记 `error`。
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownStyle(_)
                | Self::MissingArgument(_)
                | Self::InvalidArgument(_)
                | Self::OverlayNotFound(_)
        )
    }
}

impl From<DecorError> for String {
    fn from(error: DecorError) -> Self {
        error.to_string()
    }
}
