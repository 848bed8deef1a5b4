//! # 覆盖图合成模块
//!
//! ## 设计思路
//!
//! 覆盖图（贴纸/头像框 PNG）在中心留有一个透明圆洞，头像应从洞中露出。
//! 这里不依赖任何元数据，直接从覆盖图的 alpha 通道推断洞的大小：
//!
//! 1. 从中心 `(⌊w/2⌋, ⌊h/2⌋)` 沿上、下、左、右四个方向逐像素外扩；
//! 2. 遇到边界或 alpha 超过阈值即停止，计数减去 `padding`（不低于 0）作为该方向的可达距离；
//! 3. 取四个方向的最小值作为半径（最保守，保证头像不会压到任何方向的不透明图案）。
//!
//! 半径为 0 表示中心没有透明洞，合成时改用“短边 × 0.85”的回退尺寸。
//!
//! ## 实现思路
//!
//! - `plan_overlay_layout`：纯计算，输出直径与居中位置，便于单测。
//! - `compose_with_overlay`：清空画布 → 圆形头像 → 覆盖图整体叠加（不裁剪）。
//! - 洞不规则或偏心时会按最受限方向低估，这是该启发式的既定行为。

use tiny_skia::Pixmap;

use super::primitives::draw_circular_avatar;
use super::{DecorError, Surface};

/// 默认 alpha 阈值：超过该值的像素视为“足够不透明”。
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 10;

/// 默认安全内缩（像素），用于容忍抗锯齿边缘。
pub const DEFAULT_PADDING: u32 = 2;

/// 缩放系数下限。
pub const MIN_SCALE: f32 = 0.1;

/// 缩放系数上限。
pub const MAX_SCALE: f32 = 2.0;

/// 未找到透明洞时，头像直径占短边的比例。
pub const FALLBACK_DIAMETER_RATIO: f32 = 0.85;

/// 头像在覆盖图中的摆放方案。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayLayout {
    /// 估计出的透明洞半径；`None` 表示走回退尺寸。
    pub slot_radius: Option<u32>,
    /// 头像直径（像素）。
    pub diameter: u32,
    /// 头像外接正方形左上角 x（可能为负，表示超出画布）。
    pub x: i64,
    /// 头像外接正方形左上角 y。
    pub y: i64,
}

/// 从表面的 alpha 通道估计中心透明圆洞的半径。
///
/// 返回 `None` 表示没有找到透明槽位（任一方向上中心即不透明）。
pub fn estimate_center_radius_from_overlay_alpha(
    surface: &Surface,
    threshold: u8,
    padding: u32,
) -> Option<u32> {
    let w = i64::from(surface.width());
    let h = i64::from(surface.height());
    let cx = w / 2;
    let cy = h / 2;

    let scan = |dx: i64, dy: i64| -> u32 {
        let mut reach: u32 = 0;
        let (mut x, mut y) = (cx, cy);
        while x >= 0 && x < w && y >= 0 && y < h {
            if surface.alpha_at(x as u32, y as u32) > threshold {
                break;
            }
            reach += 1;
            x += dx;
            y += dy;
        }
        reach.saturating_sub(padding)
    };

    let up = scan(0, -1);
    let down = scan(0, 1);
    let left = scan(-1, 0);
    let right = scan(1, 0);

    let radius = up.min(down).min(left).min(right);
    log::debug!(
        "🔍 覆盖图透明洞扫描 - up={} down={} left={} right={} radius={}",
        up,
        down,
        left,
        right,
        radius
    );

    (radius > 0).then_some(radius)
}

/// 将缩放系数限制在 `[MIN_SCALE, MAX_SCALE]`；非有限值按 1.0 处理。
pub fn clamp_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    } else {
        1.0
    }
}

/// 计算头像直径：有洞时 `⌊radius·2·scale⌋`，否则 `⌊min(w, h)·0.85·scale⌋`。
pub fn avatar_diameter(slot_radius: Option<u32>, width: u32, height: u32, scale: f32) -> u32 {
    let scale = f64::from(clamp_scale(scale));
    let raw = match slot_radius {
        Some(radius) => f64::from(radius) * 2.0 * scale,
        None => f64::from(width.min(height)) * f64::from(FALLBACK_DIAMETER_RATIO) * scale,
    };
    raw.floor() as u32
}

/// 居中摆放：`x = ⌊(w − d)/2⌋`，`y = ⌊(h − d)/2⌋`（向下取整，支持负值）。
pub fn centered_position(width: u32, height: u32, diameter: u32) -> (i64, i64) {
    let d = i64::from(diameter);
    (
        (i64::from(width) - d).div_euclid(2),
        (i64::from(height) - d).div_euclid(2),
    )
}

/// 基于已绘制覆盖图的表面计算摆放方案。
pub fn plan_overlay_layout(surface: &Surface, scale: f32) -> OverlayLayout {
    let slot_radius = estimate_center_radius_from_overlay_alpha(
        surface,
        DEFAULT_ALPHA_THRESHOLD,
        DEFAULT_PADDING,
    );
    let diameter = avatar_diameter(slot_radius, surface.width(), surface.height(), scale);
    let (x, y) = centered_position(surface.width(), surface.height(), diameter);

    OverlayLayout {
        slot_radius,
        diameter,
        x,
        y,
    }
}

/// 头像置于覆盖图之下合成，返回可直接编码的表面。
pub fn compose_with_overlay(
    avatar: &Pixmap,
    overlay: &Pixmap,
    scale: f32,
) -> Result<Surface, DecorError> {
    let (w, h) = (overlay.width(), overlay.height());
    let mut surface = Surface::new(w, h)?;

    // 先画覆盖图，才能读取它的 alpha
    surface.clear();
    surface.draw_image(overlay, 0, 0);

    let layout = plan_overlay_layout(&surface, scale);
    match layout.slot_radius {
        Some(radius) => log::info!(
            "🎯 覆盖图透明洞半径 {}px，头像直径 {}px，位置 ({}, {})",
            radius,
            layout.diameter,
            layout.x,
            layout.y
        ),
        None => log::warn!(
            "⚠️ 覆盖图中心没有透明洞，使用回退尺寸：直径 {}px，位置 ({}, {})",
            layout.diameter,
            layout.x,
            layout.y
        ),
    }

    surface.clear();
    draw_circular_avatar(
        &mut surface,
        avatar,
        layout.x as f32,
        layout.y as f32,
        layout.diameter as f32,
    );
    surface.draw_image(overlay, 0, 0);

    Ok(surface)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tiny_skia::{Color, FillRule, Paint, PathBuilder, Transform};

    /// 构造一张不透明覆盖图，中心挖出半径为 `hole_radius` 的透明圆洞。
    pub(crate) fn overlay_with_hole(width: u32, height: u32, hole_radius: f32) -> Pixmap {
        let mut pixmap = Pixmap::new(width, height).expect("pixmap init failed");
        pixmap.fill(Color::from_rgba8(30, 30, 30, 255));

        if let Some(path) =
            PathBuilder::from_circle(width as f32 / 2.0, height as f32 / 2.0, hole_radius)
        {
            let paint = Paint {
                blend_mode: tiny_skia::BlendMode::Clear,
                anti_alias: false,
                ..Default::default()
            };
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
        pixmap
    }

    fn solid_avatar(size: u32) -> Pixmap {
        let mut pixmap = Pixmap::new(size, size).expect("pixmap init failed");
        pixmap.fill(Color::from_rgba8(0, 200, 0, 255));
        pixmap
    }

    #[test]
    fn estimates_radius_of_centered_hole() {
        let overlay = overlay_with_hole(512, 512, 100.0);
        let surface = Surface::from_pixmap(overlay);

        let radius = estimate_center_radius_from_overlay_alpha(&surface, 10, 2)
            .expect("hole should be detected");

        assert!((97..=99).contains(&radius), "radius = {}", radius);
    }

    #[test]
    fn fully_opaque_overlay_has_no_slot() {
        let mut pixmap = Pixmap::new(64, 64).expect("pixmap init failed");
        pixmap.fill(Color::from_rgba8(255, 255, 255, 255));
        let surface = Surface::from_pixmap(pixmap);

        assert_eq!(estimate_center_radius_from_overlay_alpha(&surface, 10, 2), None);
    }

    #[test]
    fn fully_transparent_overlay_reaches_the_edges() {
        let surface = Surface::new(40, 20).expect("surface init failed");

        // 中心 (20, 10)：上方 11 步、下方 10 步、左 21 步、右 20 步，取最小 10 − 2
        assert_eq!(estimate_center_radius_from_overlay_alpha(&surface, 10, 2), Some(8));
    }

    #[test]
    fn padding_larger_than_reach_means_no_slot() {
        let overlay = overlay_with_hole(64, 64, 2.0);
        let surface = Surface::from_pixmap(overlay);

        assert_eq!(estimate_center_radius_from_overlay_alpha(&surface, 10, 5), None);
    }

    #[test]
    fn diameter_and_position_for_reference_scenario() {
        assert_eq!(avatar_diameter(Some(98), 512, 512, 1.0), 196);
        assert_eq!(centered_position(512, 512, 196), (158, 158));
    }

    #[test]
    fn scale_is_clamped_before_diameter() {
        assert_eq!(avatar_diameter(Some(50), 512, 512, 3.0), 200);
        assert_eq!(avatar_diameter(Some(50), 512, 512, 0.01), 10);
        assert_eq!(clamp_scale(f32::NAN), 1.0);
    }

    #[test]
    fn fallback_diameter_uses_short_side() {
        assert_eq!(avatar_diameter(None, 400, 200, 1.0), 170);
    }

    #[test]
    fn oversized_avatar_gets_negative_position() {
        assert_eq!(centered_position(100, 100, 151), (-26, -26));
    }

    #[test]
    fn compose_places_avatar_inside_hole() {
        let overlay = overlay_with_hole(128, 128, 40.0);
        let avatar = solid_avatar(32);

        let surface = compose_with_overlay(&avatar, &overlay, 1.0).expect("compose failed");

        assert_eq!((surface.width(), surface.height()), (128, 128));
        let center = surface.pixmap().pixel(64, 64).expect("pixel in bounds");
        assert!(center.green() >= 195, "center green = {}", center.green());
        let corner = surface.pixmap().pixel(2, 2).expect("pixel in bounds");
        assert_eq!((corner.red(), corner.green()), (30, 30));
        assert!(!surface.has_clip());
    }

    #[test]
    fn compose_without_hole_uses_fallback_and_overlay_covers_avatar() {
        let mut overlay = Pixmap::new(100, 100).expect("pixmap init failed");
        overlay.fill(Color::from_rgba8(10, 10, 200, 255));
        let avatar = solid_avatar(16);

        let surface = compose_with_overlay(&avatar, &overlay, 1.0).expect("compose failed");

        let center = surface.pixmap().pixel(50, 50).expect("pixel in bounds");
        assert_eq!(center.blue(), 200);
    }
}
