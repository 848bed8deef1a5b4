//! # 机器人命令层（bot）
//!
//! 与具体聊天平台无关的命令处理：消息模型、命令解析、服务入口。
//!
//! ```text
//! 平台消息 → IncomingMessage
//!    ↓
//! service.rs（忽略机器人 / 解析命令 / 选择头像来源，只接受 http(s) 地址）
//!    ↓
//! decoration::DecorationHandler
//!    ↓
//! Reply::Image("decorated.png") 或 Reply::Text(错误说明)
//! ```

mod command;
mod message;
mod service;

pub use command::{Command, DECORATE_COMMANDS, HELP_COMMANDS};
pub use message::{Attachment, IncomingMessage, Reply};
pub use service::{DecorationService, ERROR_REPLY_PREFIX, OUTPUT_FILENAME, select_avatar_source};
