//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `AvatarSource` 表示头像字节从哪里来
//! - `RawImageData` 表示已加载但未解码的字节

/// 头像输入来源。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarSource {
    /// 网络地址来源（附件 URL 或用户头像 URL）。
    Url(String),
    /// 本地文件路径来源。
    FilePath(String),
    /// 调用方已经持有的原始字节。
    Bytes(Vec<u8>),
}

impl AvatarSource {
    /// 仅接受 `http(s)://` 地址，其余返回 `None`。
    ///
    /// 聊天消息里的地址一律走这里，不能借此读取本机文件。
    pub fn from_url(location: &str) -> Option<Self> {
        let trimmed = location.trim();
        let lower = trimmed.to_ascii_lowercase();
        (lower.starts_with("http://") || lower.starts_with("https://"))
            .then(|| Self::Url(trimmed.to_string()))
    }

    /// 根据字符串形态推断来源：`http(s)://` 视为 URL，其余视为本地路径。
    ///
    /// 只用于命令行这类由本机用户直接给出参数的入口。
    pub fn from_location(location: &str) -> Self {
        Self::from_url(location).unwrap_or_else(|| Self::FilePath(location.trim().to_string()))
    }
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}
