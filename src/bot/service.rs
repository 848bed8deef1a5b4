//! # 服务层
//!
//! ## 设计思路
//!
//! `DecorationService` 在启动时由 `BotConfig` 构建一次，之后以只读方式处理每条消息。
//! 平台适配层只需要：把消息转换为 `IncomingMessage` → 调用 `handle_message` → 发送 `Reply`。
//!
//! ## 实现思路
//!
//! - 机器人作者与非命令消息直接忽略（返回 `None`）。
//! - 头像来源优先级：本条消息的图片附件 → 被回复消息的图片附件 → 作者头像。
//! - 消息里的地址只接受 `http(s)://`，本机路径只能由命令行等受信任入口经
//!   `handle_with_source` 传入。
//! - 任何失败都转换成一条文本回复，不向上抛错，也不重试。

use crate::config::BotConfig;
use crate::decoration::{
    AvatarSource, DecorError, DecorationHandler, DecorationStyle, redact_url_for_log,
};

use super::command::Command;
use super::message::{IncomingMessage, Reply};

/// 装饰结果图片的文件名。
pub const OUTPUT_FILENAME: &str = "decorated.png";

/// 出错回复的前缀。
pub const ERROR_REPLY_PREFIX: &str = "处理图片时出错：";

/// 消息处理服务。
pub struct DecorationService {
    handler: DecorationHandler,
    prefix: String,
}

impl DecorationService {
    pub fn new(config: &BotConfig) -> Result<Self, DecorError> {
        Ok(Self {
            handler: DecorationHandler::new(config.decoration.clone())?,
            prefix: config.command_prefix.clone(),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// 处理一条消息，返回需要发送的回复；与本服务无关的消息返回 `None`。
    pub async fn handle_message(&self, message: &IncomingMessage) -> Option<Reply> {
        if message.author_is_bot {
            return None;
        }
        self.respond(&message.content, || select_avatar_source(message)).await
    }

    /// 用调用方直接给出的头像来源处理一条命令。
    ///
    /// 来源不做 URL 限制，仅供命令行这类本机入口使用。
    pub async fn handle_with_source(
        &self,
        content: &str,
        source: Option<AvatarSource>,
    ) -> Option<Reply> {
        self.respond(content, move || Ok(source)).await
    }

    async fn respond(
        &self,
        content: &str,
        pick_source: impl FnOnce() -> Result<Option<AvatarSource>, DecorError>,
    ) -> Option<Reply> {
        match Command::parse(content, &self.prefix)? {
            Command::Help => Some(Reply::Text(self.help_text())),
            Command::Decorate { style_arg, args } => {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                Some(self.decorate(style_arg.as_deref(), &args, pick_source).await)
            }
        }
    }

    async fn decorate(
        &self,
        style_arg: Option<&str>,
        args: &[&str],
        pick_source: impl FnOnce() -> Result<Option<AvatarSource>, DecorError>,
    ) -> Reply {
        let style = match DecorationStyle::parse(style_arg, args) {
            Ok(style) => style,
            Err(err) => return error_reply(err),
        };

        let source = match pick_source() {
            Ok(Some(source)) => source,
            Ok(None) => {
                log::warn!("⚠️ 消息中没有可用的图片或头像");
                return Reply::Text("没有找到可处理的图片或头像。".to_string());
            }
            Err(err) => return error_reply(err),
        };

        if let AvatarSource::Url(url) = &source {
            log::info!(
                "🎨 开始装饰 - 样式: {} 来源: {}",
                style.name(),
                redact_url_for_log(url)
            );
        } else {
            log::info!("🎨 开始装饰 - 样式: {}", style.name());
        }

        match self.handler.decorate(&source, &style).await {
            Ok(bytes) => Reply::Image {
                filename: OUTPUT_FILENAME.to_string(),
                bytes,
            },
            Err(err) => error_reply(err),
        }
    }

    /// 帮助文本：列出前缀、命令与可选样式。
    pub fn help_text(&self) -> String {
        let p = &self.prefix;
        [
            format!("前缀：{}", p),
            "命令：".to_string(),
            format!(
                "{}decorar [ring|double-ring|dotted-ring|gradient-ring|glow|overlay] [参数]",
                p
            ),
            format!("  {}decorar ring [颜色]            单环（anel）", p),
            format!("  {}decorar double-ring [颜色]     双环（duplo）", p),
            format!("  {}decorar dotted-ring [颜色] [点数]  点状环（pontilhado）", p),
            format!("  {}decorar gradient-ring [颜色1] [颜色2]  渐变环（gradiente）", p),
            format!("  {}decorar glow [颜色]            光晕", p),
            format!("  {}decorar overlay <文件名> [缩放]   覆盖图（adesivo / sticker）", p),
            format!("  {}decorar adesivo estrela|coração   内置贴纸", p),
            format!("示例：{}decorar anel #ff00ff", p),
            "图片来源：附件 → 被回复消息的附件 → 你的头像".to_string(),
        ]
        .join("\n")
    }
}

/// 选择头像来源：首个图片附件 → 被回复消息的首个图片附件 → 作者头像。
///
/// 选中的地址不是 `http(s)://` 时返回 `InvalidArgument`，不会退回本机路径。
pub fn select_avatar_source(
    message: &IncomingMessage,
) -> Result<Option<AvatarSource>, DecorError> {
    let location = message
        .attachments
        .iter()
        .chain(message.referenced_attachments.iter())
        .find(|attachment| attachment.is_image())
        .map(|attachment| attachment.url.as_str())
        .or_else(|| {
            message
                .author_avatar_url
                .as_deref()
                .filter(|url| !url.trim().is_empty())
        });

    location
        .map(|location| {
            AvatarSource::from_url(location).ok_or_else(|| {
                DecorError::InvalidArgument("图片地址必须是 http(s) 链接".to_string())
            })
        })
        .transpose()
}

fn error_reply(err: DecorError) -> Reply {
    if err.is_user_error() {
        log::warn!("⚠️ 用户输入无效：{}", err);
    } else {
        log::error!("❌ 头像装饰失败：{}", err);
    }
    let detail: String = err.into();
    Reply::Text(format!("{}{}", ERROR_REPLY_PREFIX, detail))
}
