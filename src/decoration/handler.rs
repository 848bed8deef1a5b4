//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `DecorationHandler` 只负责流程编排，不感知聊天平台。
//! 处理链路固定为：
//! 1. 覆盖图样式先确认素材存在（早于任何网络请求）
//! 2. 按来源加载头像原始字节
//! 3. 解码为预乘 RGBA 画布
//! 4. 按样式绘制
//! 5. 编码为 PNG
//!
//! ## 实现思路
//!
//! - 配置在构建时校验一次，之后只读；不存在跨请求的共享可变状态。
//! - HTTP 客户端复用，减少每次请求的初始化开销。
//! - 记录 `load/decode/render/encode/total` 阶段耗时，便于性能诊断。

use std::path::{Path, PathBuf};
use std::time::Instant;

use tiny_skia::Pixmap;

use super::loader::build_http_client;
use super::overlay::compose_with_overlay;
use super::primitives::{
    draw_circular_avatar, draw_dotted_ring, draw_double_ring, draw_glow, draw_gradient_ring,
    draw_ring, draw_sticker,
};
use super::style::{
    dot_radius, double_ring_gap, double_ring_thickness, glow_sigma, gradient_ring_thickness,
    ring_thickness,
};
use super::{AvatarSource, DecorConfig, DecorError, DecorationStyle, Surface};

/// 头像装饰处理器。
///
/// 封装了只读配置与 HTTP 客户端，并编排各子模块实现完整流程。
pub struct DecorationHandler {
    pub(super) config: DecorConfig,
    pub(super) client: reqwest::Client,
}

impl DecorationHandler {
    /// 根据配置创建处理器，配置非法时直接返回错误。
    ///
    /// # 示例
    /// ```rust
    /// use avatar_decorator::decoration::{DecorConfig, DecorationHandler};
    ///
    /// let handler = DecorationHandler::new(DecorConfig::default())?;
    /// assert_eq!(handler.config().canvas_size, 512);
    /// # Ok::<(), avatar_decorator::decoration::DecorError>(())
    /// ```
    pub fn new(config: DecorConfig) -> Result<Self, DecorError> {
        config.validate()?;
        let client = build_http_client(&config)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &DecorConfig {
        &self.config
    }

    /// 加载头像并按样式装饰，返回 PNG 字节。
    pub async fn decorate(
        &self,
        source: &AvatarSource,
        style: &DecorationStyle,
    ) -> Result<Vec<u8>, DecorError> {
        let config = &self.config;
        let total_start = Instant::now();

        let overlay_path = match style {
            DecorationStyle::Overlay { file, .. } => Some(self.resolve_overlay_path(file).await?),
            _ => None,
        };

        let load_start = Instant::now();
        let raw = self.load_source(source, config).await?;
        let overlay_raw = match &overlay_path {
            Some(path) => Some(Self::load_from_file(path, config).await?),
            None => None,
        };
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let avatar = self.decode_to_pixmap(&raw, config)?;
        let overlay = overlay_raw
            .map(|raw| self.decode_overlay_to_pixmap(&raw, config))
            .transpose()?;
        let decode_elapsed = decode_start.elapsed();

        let render_start = Instant::now();
        let surface = self.render(&avatar, style, overlay.as_ref())?;
        let render_elapsed = render_start.elapsed();

        let encode_start = Instant::now();
        let png = surface.encode_png()?;
        let encode_elapsed = encode_start.elapsed();

        log::info!(
            "⏱️ 头像装饰完成 - 样式: {} 来源: {} 输出: {}x{} {} bytes | load={}ms decode={}ms render={}ms encode={}ms total={}ms",
            style.name(),
            raw.source_hint,
            surface.width(),
            surface.height(),
            png.len(),
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            render_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(png)
    }

    /// 在已解码的头像上绘制指定样式。
    ///
    /// 环形与贴纸样式：`canvas_size` 见方的画布，圆形头像铺满后再叠加装饰。
    /// 光晕样式：头像向内收缩 `2σ`，为光晕留出可见边距。
    /// 覆盖图样式：画布尺寸取覆盖图尺寸，`overlay` 必须提供。
    pub fn render(
        &self,
        avatar: &Pixmap,
        style: &DecorationStyle,
        overlay: Option<&Pixmap>,
    ) -> Result<Surface, DecorError> {
        if let DecorationStyle::Overlay { file, scale } = style {
            let overlay = overlay.ok_or_else(|| DecorError::OverlayNotFound(file.clone()))?;
            return compose_with_overlay(avatar, overlay, *scale);
        }

        let size = self.config.canvas_size;
        let d = size as f32;
        let mut surface = Surface::new(size, size)?;

        if let DecorationStyle::Glow { color } = style {
            let sigma = glow_sigma(size);
            let margin = sigma * 2.0;
            let inner = d - margin * 2.0;
            draw_glow(&mut surface, margin, margin, inner, color, sigma)?;
            draw_circular_avatar(&mut surface, avatar, margin, margin, inner);
            return Ok(surface);
        }

        draw_circular_avatar(&mut surface, avatar, 0.0, 0.0, d);

        match style {
            DecorationStyle::Ring { color } => {
                draw_ring(&mut surface, 0.0, 0.0, d, color, ring_thickness(size));
            }
            DecorationStyle::DoubleRing { color } => draw_double_ring(
                &mut surface,
                0.0,
                0.0,
                d,
                color,
                double_ring_thickness(size),
                double_ring_gap(size),
            ),
            DecorationStyle::DottedRing { color, count } => draw_dotted_ring(
                &mut surface,
                0.0,
                0.0,
                d,
                color,
                *count,
                dot_radius(size),
            ),
            DecorationStyle::GradientRing { from, to } => draw_gradient_ring(
                &mut surface,
                0.0,
                0.0,
                d,
                from,
                to,
                gradient_ring_thickness(size),
            ),
            DecorationStyle::Sticker { kind } => draw_sticker(&mut surface, 0.0, 0.0, d, *kind),
            DecorationStyle::Glow { .. } | DecorationStyle::Overlay { .. } => {}
        }

        Ok(surface)
    }

    /// 用内存中的头像字节与指定路径的覆盖图合成，返回 PNG 字节。
    pub async fn compose_overlay_bytes(
        &self,
        avatar_bytes: &[u8],
        overlay_path: &Path,
        scale: f32,
    ) -> Result<Vec<u8>, DecorError> {
        let config = &self.config;
        if !tokio::fs::try_exists(overlay_path).await.unwrap_or(false) {
            return Err(DecorError::OverlayNotFound(overlay_path.display().to_string()));
        }

        let overlay_raw = Self::load_from_file(overlay_path, config).await?;
        let avatar_raw = self
            .load_source(&AvatarSource::Bytes(avatar_bytes.to_vec()), config)
            .await?;

        let avatar = self.decode_to_pixmap(&avatar_raw, config)?;
        let overlay = self.decode_overlay_to_pixmap(&overlay_raw, config)?;

        compose_with_overlay(&avatar, &overlay, scale)?.encode_png()
    }

    /// 将覆盖图文件名解析为素材目录下的路径，并确认文件存在。
    ///
    /// 文件名只能是单个路径分量，不能跳出素材目录。
    pub async fn resolve_overlay_path(&self, file: &str) -> Result<PathBuf, DecorError> {
        let name = file.trim();
        if name.is_empty()
            || name.contains(['/', '\\'])
            || name.contains("..")
            || Path::new(name).is_absolute()
        {
            return Err(DecorError::InvalidArgument(format!("覆盖图文件名不合法：{}", file)));
        }

        let path = self.config.overlay_dir.join(name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => {
                log::warn!("⚠️ 覆盖图不存在：{}", path.display());
                Err(DecorError::OverlayNotFound(name.to_string()))
            }
        }
    }
}
