//! # 绘制原语模块
//!
//! 无状态的绘制函数：圆形裁剪头像、单环、双环、点状环、渐变环、光晕、内置贴纸。
//! 每个函数都在自己的 `save()` 作用域内修改样式/裁剪，返回时状态自动恢复。
//!
//! 所有原语共享同一个几何约定：边长为 `d` 的正方形位于 `(x, y)`，
//! 内切圆圆心为 `(x + d/2, y + d/2)`。

use std::f32::consts::PI;

use image::{DynamicImage, RgbaImage};
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Transform};

use super::color::{DEFAULT_GRADIENT_END_COLOR, DEFAULT_RING_COLOR, resolve_css_color};
use super::pipeline::dynamic_image_to_pixmap;
use super::style::StickerKind;
use super::{DecorError, Surface};

/// 点状环默认点数。
pub const DEFAULT_DOT_COUNT: u32 = 48;

/// 点状环默认点半径（像素）。
pub const DEFAULT_DOT_RADIUS: f32 = 2.0;

/// 在 `(x, y, d)` 内切圆中绘制缩放到 `d × d` 的 `image`，圆外部分不可见。
pub fn draw_circular_avatar(surface: &mut Surface, image: &Pixmap, x: f32, y: f32, d: f32) {
    if !(d > 0.0) {
        return;
    }
    let r = d / 2.0;

    let mut scoped = surface.save();
    scoped.clip_circle(x + r, y + r, r);
    scoped.draw_image_rect(image, x, y, d, d);
}

/// 描一个半径为 `d/2 − thickness/2` 的圆环，保证描边完全落在外接正方形内。
pub fn draw_ring(surface: &mut Surface, x: f32, y: f32, d: f32, color: &str, thickness: f32) {
    let r = d / 2.0;

    let mut scoped = surface.save();
    scoped.set_stroke_style(color);
    scoped.set_line_width(thickness);
    scoped.stroke_circle(x + r, y + r, r - thickness / 2.0);
}

/// 描两个同心圆环：外环半径 `d/2 − t/2`，内环半径 `d/2 − t/2 − gap − t`。
pub fn draw_double_ring(
    surface: &mut Surface,
    x: f32,
    y: f32,
    d: f32,
    color: &str,
    thickness: f32,
    gap: f32,
) {
    let r = d / 2.0;
    let outer = r - thickness / 2.0;
    let inner = outer - gap - thickness;

    let mut scoped = surface.save();
    scoped.set_stroke_style(color);
    scoped.set_line_width(thickness);
    scoped.stroke_circle(x + r, y + r, outer);
    scoped.stroke_circle(x + r, y + r, inner);
}

/// 计算点状环各点圆心。
///
/// 第 `i` 个点位于角度 `2π·i/count`（从 x 轴正方向开始、角度递增），
/// 所有点到圆心的距离均为 `d/2 − dot_r − 1`。
pub fn dotted_ring_centers(x: f32, y: f32, d: f32, count: u32, dot_r: f32) -> Vec<(f32, f32)> {
    let cx = x + d / 2.0;
    let cy = y + d / 2.0;
    let radius = d / 2.0 - dot_r - 1.0;

    (0..count)
        .map(|i| {
            let theta = 2.0 * PI * i as f32 / count as f32;
            (cx + theta.cos() * radius, cy + theta.sin() * radius)
        })
        .collect()
}

/// 沿圆周均匀放置 `count` 个半径为 `dot_r` 的实心点。
pub fn draw_dotted_ring(
    surface: &mut Surface,
    x: f32,
    y: f32,
    d: f32,
    color: &str,
    count: u32,
    dot_r: f32,
) {
    let mut scoped = surface.save();
    scoped.set_fill_style(color);
    for (px, py) in dotted_ring_centers(x, y, d, count, dot_r) {
        scoped.fill_circle(px, py, dot_r);
    }
}

/// 描一个从左到右线性渐变的圆环，几何与 [`draw_ring`] 相同。
///
/// 无法解析的端点颜色回退到默认渐变色。
pub fn draw_gradient_ring(
    surface: &mut Surface,
    x: f32,
    y: f32,
    d: f32,
    from: &str,
    to: &str,
    thickness: f32,
) {
    let r = d / 2.0;
    let start = color_or_default(from, DEFAULT_RING_COLOR);
    let end = color_or_default(to, DEFAULT_GRADIENT_END_COLOR);

    let mut scoped = surface.save();
    scoped.set_line_width(thickness);
    scoped.stroke_circle_gradient(x + r, y + r, r - thickness / 2.0, x, x + d, start, end);
}

/// 在 `(x, y, d)` 内切圆下方铺一层高斯模糊的纯色剪影。
///
/// 只画光晕本身，头像需要随后另行绘制在上面。
pub fn draw_glow(
    surface: &mut Surface,
    x: f32,
    y: f32,
    d: f32,
    color: &str,
    sigma: f32,
) -> Result<(), DecorError> {
    let r = d / 2.0;
    let Some(circle) = PathBuilder::from_circle(x + r, y + r, r) else {
        return Ok(());
    };

    let (width, height) = (surface.width(), surface.height());
    let mut silhouette = Pixmap::new(width, height)
        .ok_or_else(|| DecorError::Render(format!("无法创建 {}x{} 光晕图层", width, height)))?;
    let paint = Paint {
        anti_alias: true,
        ..Default::default()
    };
    silhouette.fill_path(&circle, &paint, FillRule::Winding, Transform::identity(), None);

    // 颜色通道恒定、只有 alpha 变化，直接对非预乘数据做模糊即可
    let tint = color_or_default(color, DEFAULT_RING_COLOR).to_color_u8();
    let data: Vec<u8> = silhouette
        .pixels()
        .iter()
        .flat_map(|p| {
            let alpha = (u16::from(p.alpha()) * u16::from(tint.alpha()) / 255) as u8;
            [tint.red(), tint.green(), tint.blue(), alpha]
        })
        .collect();
    let straight = RgbaImage::from_raw(width, height, data)
        .ok_or_else(|| DecorError::Render("光晕图层缓冲长度异常".to_string()))?;

    let blurred = image::imageops::blur(&straight, sigma);
    let layer = dynamic_image_to_pixmap(&DynamicImage::ImageRgba8(blurred))?;

    let mut scoped = surface.save();
    scoped.draw_image(&layer, 0, 0);
    Ok(())
}

/// 在 `(x, y, d)` 区域右下角绘制内置贴纸。
pub fn draw_sticker(surface: &mut Surface, x: f32, y: f32, d: f32, kind: StickerKind) {
    let mut scoped = surface.save();
    match kind {
        StickerKind::Star => {
            let points = star_points(x + d * 0.78, y + d * 0.78, d * 0.16);
            scoped.set_fill_style("#ffdf00e6");
            scoped.fill_polygon(&points);
            scoped.set_stroke_style("#ffb400");
            scoped.set_line_width(2.0);
            scoped.stroke_polygon(&points);
        }
        StickerKind::Heart => {
            let (cx, cy) = (x + d * 0.8, y + d * 0.78);
            let r = d * 0.1;
            let lift = d * 0.01;
            scoped.set_fill_style("#ff4081e6");
            scoped.fill_oval(cx - r, cy - r - lift, r, 2.0 * r);
            scoped.fill_oval(cx, cy - r - lift, r, 2.0 * r);
            scoped.fill_polygon(&[(cx - r, cy), (cx + r, cy), (cx, cy + 1.5 * r)]);
        }
    }
}

/// 五角星的十个顶点，从正上方开始顺时针，内外半径比 1:2。
pub fn star_points(cx: f32, cy: f32, outer: f32) -> Vec<(f32, f32)> {
    let inner = outer * 0.5;
    (0..10)
        .map(|i| {
            let angle = i as f32 * PI / 5.0;
            let r = if i % 2 == 0 { outer } else { inner };
            (cx + r * angle.sin(), cy - r * angle.cos())
        })
        .collect()
}

fn color_or_default(value: &str, fallback: &str) -> Color {
    resolve_css_color(value)
        .or_else(|| {
            log::warn!("⚠️ 无法解析颜色 {}，改用 {}", value, fallback);
            resolve_css_color(fallback)
        })
        .unwrap_or(Color::BLACK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    fn solid_pixmap(width: u32, height: u32) -> Pixmap {
        let mut pixmap = Pixmap::new(width, height).expect("pixmap init failed");
        pixmap.fill(Color::from_rgba8(200, 40, 40, 255));
        pixmap
    }

    #[test]
    fn circular_avatar_is_clipped_to_circle() {
        let mut surface = Surface::new(100, 100).expect("surface init failed");
        let avatar = solid_pixmap(10, 10);

        draw_circular_avatar(&mut surface, &avatar, 0.0, 0.0, 100.0);

        assert_eq!(surface.alpha_at(50, 50), 255);
        assert_eq!(surface.alpha_at(2, 2), 0);
        assert_eq!(surface.alpha_at(97, 97), 0);
        assert!(!surface.has_clip());
    }

    #[test]
    fn circular_avatar_with_zero_diameter_draws_nothing() {
        let mut surface = Surface::new(10, 10).expect("surface init failed");
        let avatar = solid_pixmap(4, 4);

        draw_circular_avatar(&mut surface, &avatar, 0.0, 0.0, 0.0);

        assert!(surface.pixmap().pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn ring_stays_inside_bounding_box() {
        let mut surface = Surface::new(100, 100).expect("surface init failed");

        draw_ring(&mut surface, 0.0, 0.0, 100.0, "#ffffff", 8.0);

        // 环中线半径 46，线宽 8：覆盖 42~50
        assert!(surface.alpha_at(50, 4) > 200);
        assert_eq!(surface.alpha_at(50, 50), 0);
        assert_eq!(surface.alpha_at(0, 0), 0);
        assert_eq!(surface.line_width(), 1.0);
    }

    #[test]
    fn double_ring_leaves_gap_between_rings() {
        let mut surface = Surface::new(200, 200).expect("surface init failed");

        draw_double_ring(&mut surface, 0.0, 0.0, 200.0, "#ffffff", 10.0, 12.0);

        // 外环中线 95（覆盖 90~100），内环中线 73（覆盖 68~78），间隙 78~90
        assert!(surface.alpha_at(100, 100 - 95) > 200);
        assert!(surface.alpha_at(100, 100 - 73) > 200);
        assert_eq!(surface.alpha_at(100, 100 - 84), 0);
        assert_eq!(surface.alpha_at(100, 100), 0);
    }

    #[test]
    fn dotted_ring_produces_requested_number_of_dots() {
        let centers = dotted_ring_centers(0.0, 0.0, 100.0, 12, 2.0);
        assert_eq!(centers.len(), 12);

        let (first_x, first_y) = centers[0];
        assert!((first_x - (50.0 + 47.0)).abs() < 1e-4);
        assert!((first_y - 50.0).abs() < 1e-4);
    }

    #[test]
    fn dotted_ring_with_zero_count_draws_nothing() {
        let mut surface = Surface::new(50, 50).expect("surface init failed");

        draw_dotted_ring(&mut surface, 0.0, 0.0, 50.0, "#ffffff", 0, 2.0);

        assert!(surface.pixmap().pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn dotted_ring_paints_first_dot_on_positive_x_axis() {
        let mut surface = Surface::new(100, 100).expect("surface init failed");

        draw_dotted_ring(
            &mut surface,
            0.0,
            0.0,
            100.0,
            "#ffffff",
            DEFAULT_DOT_COUNT,
            DEFAULT_DOT_RADIUS,
        );

        assert!(surface.alpha_at(97, 50) > 0);
        assert_eq!(surface.alpha_at(50, 50), 0);
    }

    #[test]
    fn invalid_color_falls_back_to_previous_style() {
        let mut surface = Surface::new(100, 100).expect("surface init failed");

        draw_ring(&mut surface, 0.0, 0.0, 100.0, "nope", 8.0);

        // 非法颜色被忽略，沿用默认黑色描边
        let pixel = surface.pixmap().pixel(50, 4).expect("pixel in bounds");
        assert!(pixel.alpha() > 200);
        assert_eq!(pixel.red(), 0);
    }

    #[test]
    fn gradient_ring_blends_from_left_to_right() {
        let mut surface = Surface::new(100, 100).expect("surface init failed");

        draw_gradient_ring(&mut surface, 0.0, 0.0, 100.0, "#ff0000", "#0000ff", 10.0);

        let left = surface.pixmap().pixel(3, 50).expect("pixel in bounds");
        let right = surface.pixmap().pixel(96, 50).expect("pixel in bounds");
        assert!(left.alpha() > 200 && left.red() > 200 && left.blue() < 50, "left = {:?}", left);
        assert!(right.alpha() > 200 && right.blue() > 200 && right.red() < 50, "right = {:?}", right);
        assert_eq!(surface.alpha_at(50, 50), 0);
        assert_eq!(surface.line_width(), 1.0);
    }

    #[test]
    fn gradient_ring_with_bad_colors_uses_defaults() {
        let mut surface = Surface::new(100, 100).expect("surface init failed");

        draw_gradient_ring(&mut surface, 0.0, 0.0, 100.0, "nope", "also-nope", 10.0);

        // 左端回退到 #5865F2
        let left = surface.pixmap().pixel(3, 50).expect("pixel in bounds");
        assert!(left.alpha() > 200);
        assert!(left.blue() > left.red());
    }

    #[test]
    fn glow_spreads_color_outside_the_circle() {
        let mut surface = Surface::new(100, 100).expect("surface init failed");

        draw_glow(&mut surface, 20.0, 20.0, 60.0, "#ff0000", 6.0).expect("glow failed");

        // 圆外 4px 处有半透明红色，中心接近不透明，远角几乎透明
        let halo = surface.pixmap().pixel(50, 16).expect("pixel in bounds");
        assert!(halo.alpha() > 0 && halo.alpha() < 255, "halo = {:?}", halo);
        assert_eq!((halo.green(), halo.blue()), (0, 0));
        assert!(surface.alpha_at(50, 50) > 240);
        assert!(surface.alpha_at(0, 0) < 5);
    }

    #[test]
    fn star_points_alternate_outer_and_inner_radius() {
        let points = star_points(50.0, 50.0, 20.0);
        assert_eq!(points.len(), 10);
        assert!((points[0].0 - 50.0).abs() < 1e-4);
        assert!((points[0].1 - 30.0).abs() < 1e-4);
        for (i, (px, py)) in points.iter().enumerate() {
            let dist = ((px - 50.0).powi(2) + (py - 50.0).powi(2)).sqrt();
            let expected = if i % 2 == 0 { 20.0 } else { 10.0 };
            assert!((dist - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn stickers_land_in_lower_right_corner() {
        for kind in [StickerKind::Star, StickerKind::Heart] {
            let mut surface = Surface::new(200, 200).expect("surface init failed");

            draw_sticker(&mut surface, 0.0, 0.0, 200.0, kind);

            assert!(surface.alpha_at(158, 158) > 200, "{:?} missing at its center", kind);
            assert_eq!(surface.alpha_at(40, 40), 0);
            assert_eq!(surface.line_width(), 1.0);
        }
    }
}
