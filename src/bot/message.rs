//! 聊天消息的最小数据模型。
//!
//! 平台适配层（网关客户端、命令行）负责把各自的消息结构转换成这里的类型，
//! 服务层只依赖这些字段。

/// 消息附件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
    /// 平台上报的 MIME 类型；缺失时视为非图片。
    pub content_type: Option<String>,
}

impl Attachment {
    pub fn new(url: impl Into<String>, content_type: Option<&str>) -> Self {
        Self {
            url: url.into(),
            content_type: content_type.map(str::to_string),
        }
    }

    /// 是否为图片附件（`image/*`）。
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false)
    }
}

/// 一条收到的消息。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingMessage {
    pub content: String,
    pub author_is_bot: bool,
    pub author_avatar_url: Option<String>,
    pub attachments: Vec<Attachment>,
    /// 被回复消息上的附件（没有回复时为空）。
    pub referenced_attachments: Vec<Attachment>,
}

impl IncomingMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

/// 服务对一条消息的回复。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Image { filename: String, bytes: Vec<u8> },
    Text(String),
}
