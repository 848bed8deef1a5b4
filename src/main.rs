//! # 头像装饰机器人 — 命令行入口
//!
//! 本文件仅负责日志初始化、配置加载与参数适配。
//! 把一条命令消息交给服务处理：图片回复写入文件，文本回复打印到标准输出。
//!
//! 参数由本机用户直接给出，因此头像与附件既可以是 URL 也可以是本地路径；
//! 来源在这里选定后经 `handle_with_source` 传入，不经过聊天消息的 URL 限制。
//!
//! ```text
//! avatar-decorator --message "!decorar pontilhado #fff 36" --avatar ./me.png
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use avatar_decorator::bot::{DecorationService, Reply};
use avatar_decorator::config::BotConfig;
use avatar_decorator::decoration::AvatarSource;
use avatar_decorator::error::AppError;

/// 给头像加上环形或覆盖图装饰。
#[derive(Debug, Parser)]
#[command(name = "avatar-decorator", version, about)]
struct Args {
    /// 命令消息内容，例如 "!decorar anel #ff00ff"
    #[arg(short, long)]
    message: String,

    /// 作者头像（URL 或本地路径）
    #[arg(short, long)]
    avatar: Option<String>,

    /// 图片附件（URL 或本地路径），可重复
    #[arg(long = "attachment")]
    attachments: Vec<String>,

    /// 被回复消息上的图片附件，可重复
    #[arg(long = "reply-attachment")]
    reply_attachments: Vec<String>,

    /// 输出 PNG 路径
    #[arg(short, long, default_value = "decorated.png")]
    out: PathBuf,
}

impl Args {
    /// 按附件 → 被回复消息附件 → 头像的顺序选出第一个来源。
    fn avatar_source(&self) -> Option<AvatarSource> {
        self.attachments
            .iter()
            .chain(self.reply_attachments.iter())
            .chain(self.avatar.iter())
            .map(|location| location.trim())
            .find(|location| !location.is_empty())
            .map(AvatarSource::from_location)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            log::error!("❌ {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode, AppError> {
    let config = BotConfig::from_env()?;
    log::info!(
        "⚙️ 配置已加载 - 前缀: {} 覆盖图目录: {}",
        config.command_prefix,
        config.decoration.overlay_dir.display()
    );

    let service = DecorationService::new(&config)?;

    match service
        .handle_with_source(&args.message, args.avatar_source())
        .await
    {
        Some(Reply::Image { filename, bytes }) => {
            tokio::fs::write(&args.out, &bytes).await?;
            log::info!(
                "✅ 已写入 {}（{}，{} bytes）",
                args.out.display(),
                filename,
                bytes.len()
            );
            Ok(ExitCode::SUCCESS)
        }
        Some(Reply::Text(text)) => {
            println!("{}", text);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            log::warn!(
                "⚠️ 消息不是以 {} 开头的已知命令，未做处理",
                service.prefix()
            );
            Ok(ExitCode::from(2))
        }
    }
}
