//! # 头像装饰模块（decoration）
//!
//! ## 设计思路
//!
//! 将“头像来源 → 加载校验 → 解码降采样 → 绘制样式 → PNG 编码”按职责拆分为多个子模块，
//! 与聊天平台完全解耦，命令行与机器人共用同一套实现。
//!
//! - `surface`：带样式/裁剪状态栈的绘制表面（RAII 恢复）
//! - `primitives`：圆形头像、单环、双环、点状环、渐变环、光晕、内置贴纸
//! - `overlay`：覆盖图透明洞估计与合成
//! - `color`：颜色参数回退与 CSS 颜色解析
//! - `style`：子命令 → 封闭样式枚举
//! - `handler`：编排整条流水线
//! - `loader`：URL/文件/字节加载与安全校验
//! - `pipeline`：解码 + 像素限制 + 降采样
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! bot::DecorationService（命令解析 + 头像来源选择）
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（来源加载 + URL/体积安全校验）
//!    ├─ pipeline.rs（解码 + 像素限制 + 降采样）
//!    ├─ primitives.rs / overlay.rs（绘制）
//!    └─ surface.rs（PNG 编码）
//!    ↓
//! PNG 字节 或 DecorError
//! ```
//!
//! ## 分层职责建议
//!
//! - 新增样式：先改 `style.rs` 的枚举，再在 `handler.rs::render` 补分支
//! - 调整尺寸比例：改 `style.rs` 中的线宽/间隙函数
//! - 覆盖图对齐问题：看 `overlay.rs` 的扫描与回退逻辑

mod color;
mod config;
mod error;
mod handler;
mod loader;
pub mod overlay;
mod pipeline;
pub mod primitives;
mod source;
mod style;
mod surface;

pub use color::{DEFAULT_GRADIENT_END_COLOR, DEFAULT_RING_COLOR, parse_color, resolve_css_color};
pub use config::{DEFAULT_CANVAS_SIZE, DEFAULT_OVERLAY_DIR, DecorConfig};
pub use error::DecorError;
pub use handler::DecorationHandler;
pub use loader::redact_url_for_log;
pub use overlay::{compose_with_overlay, estimate_center_radius_from_overlay_alpha};
pub use primitives::{
    draw_circular_avatar, draw_dotted_ring, draw_double_ring, draw_glow, draw_gradient_ring,
    draw_ring, draw_sticker,
};
pub use source::AvatarSource;
pub use style::{DecorationStyle, MAX_DOT_COUNT, StickerKind};
pub use surface::{StateGuard, Surface};
