//! # 头像装饰机器人 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │         平台适配（网关客户端 / 命令行 main.rs）           │
//! │                消息 → IncomingMessage                    │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓ handle_message（聊天，仅 URL）/ handle_with_source（命令行）
//! ┌───────┼──────────────────────────────────────────────────┐
//! │  ┌─ config ───── BotConfig（dotenvy + 环境变量）          │
//! │  ├─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ bot ──────── 命令解析 · 头像来源选择 · 回复            │
//! │  │                                                       │
//! │  └─ decoration   加载·解码·绘制·PNG 编码                  │
//! │      ├─ surface      状态栈 + StateGuard (RAII)          │
//! │      ├─ primitives   环形 / 渐变环 / 光晕 / 内置贴纸      │
//! │      └─ overlay      透明洞估计 + 覆盖图合成              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`config`] | 启动配置 `BotConfig`，凭据、前缀、覆盖图目录 |
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`bot`] | 与平台无关的命令处理服务 |
//! | [`decoration`] | 头像加载、解码与装饰绘制 |

pub mod bot;
pub mod config;
pub mod decoration;
pub mod error;
