//! # 绘制表面模块
//!
//! ## 设计思路
//!
//! `Surface` 是一块可变的 RGBA 画布（tiny-skia `Pixmap`），附带 canvas 风格的绘制状态：
//! 填充色、描边色、线宽与裁剪蒙版。
//!
//! 绘制状态的保存/恢复采用 RAII 守卫：`save()` 返回 `StateGuard`，
//! 守卫离开作用域（包括提前 `return` 与 panic 展开）时自动恢复先前状态，
//! 因此裁剪区域和样式不会泄漏到后续绘制。
//!
//! ## 实现思路
//!
//! - 状态栈：`save` 压栈当前状态，守卫 `Drop` 时出栈覆盖。
//! - 裁剪：首次裁剪创建 `Mask`，再次裁剪与已有蒙版求交。
//! - 像素数据始终为预乘 alpha，读取 alpha 通道时与非预乘一致。

use std::ops::{Deref, DerefMut};

use tiny_skia::{
    Color, FillRule, FilterQuality, GradientStop, LinearGradient, Mask, Paint, Path, PathBuilder,
    Pattern, Pixmap, PixmapPaint, Point, Rect, SpreadMode, Stroke, Transform,
};

use super::DecorError;
use super::color::resolve_css_color;

#[derive(Clone)]
struct DrawingState {
    fill: Color,
    stroke: Color,
    line_width: f32,
    clip: Option<Mask>,
}

impl Default for DrawingState {
    fn default() -> Self {
        Self {
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
            clip: None,
        }
    }
}

/// 可变绘制表面。
pub struct Surface {
    pixmap: Pixmap,
    state: DrawingState,
    state_stack: Vec<DrawingState>,
}

impl Surface {
    /// 创建全透明画布。
    pub fn new(width: u32, height: u32) -> Result<Self, DecorError> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            DecorError::Render(format!("无法创建 {}x{} 画布", width, height))
        })?;
        Ok(Self::from_pixmap(pixmap))
    }

    pub(crate) fn from_pixmap(pixmap: Pixmap) -> Self {
        Self {
            pixmap,
            state: DrawingState::default(),
            state_stack: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// 只读访问底层像素。
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// 读取 `(x, y)` 处的 alpha；越界返回 0。
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.pixmap.pixel(x, y).map(|p| p.alpha()).unwrap_or(0)
    }

    /// 保存当前绘制状态，返回的守卫在离开作用域时恢复该状态。
    ///
    /// # 示例
    /// ```rust
    /// use avatar_decorator::decoration::Surface;
    ///
    /// let mut surface = Surface::new(8, 8)?;
    /// {
    ///     let mut scoped = surface.save();
    ///     scoped.set_line_width(4.0);
    /// }
    /// assert_eq!(surface.line_width(), 1.0);
    /// # Ok::<(), avatar_decorator::decoration::DecorError>(())
    /// ```
    pub fn save(&mut self) -> StateGuard<'_> {
        self.state_stack.push(self.state.clone());
        StateGuard { surface: self }
    }

    fn restore(&mut self) {
        if let Some(state) = self.state_stack.pop() {
            self.state = state;
        }
    }

    /// 设置填充色；无法解析时保持原样式并返回 `false`。
    pub fn set_fill_style(&mut self, style: &str) -> bool {
        match resolve_css_color(style) {
            Some(color) => {
                self.state.fill = color;
                true
            }
            None => {
                log::warn!("⚠️ 忽略无法解析的填充色：{}", style);
                false
            }
        }
    }

    /// 设置描边色；无法解析时保持原样式并返回 `false`。
    pub fn set_stroke_style(&mut self, style: &str) -> bool {
        match resolve_css_color(style) {
            Some(color) => {
                self.state.stroke = color;
                true
            }
            None => {
                log::warn!("⚠️ 忽略无法解析的描边色：{}", style);
                false
            }
        }
    }

    pub fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    pub fn line_width(&self) -> f32 {
        self.state.line_width
    }

    pub fn fill_color(&self) -> Color {
        self.state.fill
    }

    pub fn stroke_color(&self) -> Color {
        self.state.stroke
    }

    pub fn has_clip(&self) -> bool {
        self.state.clip.is_some()
    }

    /// 将裁剪区域与圆 `(cx, cy, r)` 求交。
    ///
    /// 半径非正时裁剪为空区域（后续绘制全部不可见）。
    pub fn clip_circle(&mut self, cx: f32, cy: f32, r: f32) {
        let path = PathBuilder::from_circle(cx, cy, r);
        let clip = match (self.state.clip.take(), path) {
            (Some(mut mask), Some(path)) => {
                mask.intersect_path(&path, FillRule::Winding, true, Transform::identity());
                Some(mask)
            }
            (None, Some(path)) => {
                Mask::new(self.pixmap.width(), self.pixmap.height()).map(|mut mask| {
                    mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
                    mask
                })
            }
            // 新建的 Mask 全为 0，即空裁剪区域
            (_, None) => Mask::new(self.pixmap.width(), self.pixmap.height()),
        };

        self.state.clip = clip;
    }

    /// 以当前描边样式描一个圆。
    pub fn stroke_circle(&mut self, cx: f32, cy: f32, r: f32) {
        let Some(path) = PathBuilder::from_circle(cx, cy, r) else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color(self.state.stroke);
        paint.anti_alias = true;

        let stroke = Stroke {
            width: self.state.line_width,
            ..Default::default()
        };

        self.pixmap.stroke_path(
            &path,
            &paint,
            &stroke,
            Transform::identity(),
            self.state.clip.as_ref(),
        );
    }

    /// 以当前填充样式填充一个圆。
    pub fn fill_circle(&mut self, cx: f32, cy: f32, r: f32) {
        let Some(path) = PathBuilder::from_circle(cx, cy, r) else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color(self.state.fill);
        paint.anti_alias = true;

        self.pixmap.fill_path(
            &path,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            self.state.clip.as_ref(),
        );
    }

    /// 以水平线性渐变描一个圆：`x0` 处为 `from`，`x1` 处为 `to`，两端之外取端点色。
    ///
    /// 线宽取当前状态，颜色不读写当前描边样式。
    #[allow(clippy::too_many_arguments)]
    pub fn stroke_circle_gradient(
        &mut self,
        cx: f32,
        cy: f32,
        r: f32,
        x0: f32,
        x1: f32,
        from: Color,
        to: Color,
    ) {
        let Some(path) = PathBuilder::from_circle(cx, cy, r) else {
            return;
        };
        let Some(shader) = LinearGradient::new(
            Point::from_xy(x0, cy),
            Point::from_xy(x1, cy),
            vec![GradientStop::new(0.0, from), GradientStop::new(1.0, to)],
            SpreadMode::Pad,
            Transform::identity(),
        ) else {
            return;
        };

        let paint = Paint {
            shader,
            anti_alias: true,
            ..Default::default()
        };
        let stroke = Stroke {
            width: self.state.line_width,
            ..Default::default()
        };

        self.pixmap.stroke_path(
            &path,
            &paint,
            &stroke,
            Transform::identity(),
            self.state.clip.as_ref(),
        );
    }

    /// 以当前填充样式填充闭合多边形；少于三个顶点时不绘制。
    pub fn fill_polygon(&mut self, points: &[(f32, f32)]) {
        let Some(path) = polygon_path(points) else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color(self.state.fill);
        paint.anti_alias = true;

        self.pixmap.fill_path(
            &path,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            self.state.clip.as_ref(),
        );
    }

    /// 以当前填充样式填充内切于矩形 `(x, y, w, h)` 的椭圆。
    pub fn fill_oval(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let Some(path) = Rect::from_xywh(x, y, w, h).and_then(PathBuilder::from_oval) else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color(self.state.fill);
        paint.anti_alias = true;

        self.pixmap.fill_path(
            &path,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            self.state.clip.as_ref(),
        );
    }

    /// 以当前描边样式描闭合多边形的轮廓。
    pub fn stroke_polygon(&mut self, points: &[(f32, f32)]) {
        let Some(path) = polygon_path(points) else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color(self.state.stroke);
        paint.anti_alias = true;

        let stroke = Stroke {
            width: self.state.line_width,
            ..Default::default()
        };

        self.pixmap.stroke_path(
            &path,
            &paint,
            &stroke,
            Transform::identity(),
            self.state.clip.as_ref(),
        );
    }

    /// 将 `image` 缩放绘制到矩形 `(x, y, w, h)`，受当前裁剪约束。
    pub fn draw_image_rect(&mut self, image: &Pixmap, x: f32, y: f32, w: f32, h: f32) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        let Some(rect) = Rect::from_xywh(x, y, w, h) else {
            return;
        };

        let scale_x = w / image.width() as f32;
        let scale_y = h / image.height() as f32;
        if !scale_x.is_finite() || !scale_y.is_finite() {
            return;
        }

        let mut paint = Paint::default();
        paint.shader = Pattern::new(
            image.as_ref(),
            SpreadMode::Pad,
            FilterQuality::Bicubic,
            1.0,
            Transform::from_row(scale_x, 0.0, 0.0, scale_y, x, y),
        );
        paint.anti_alias = true;

        self.pixmap
            .fill_rect(rect, &paint, Transform::identity(), self.state.clip.as_ref());
    }

    /// 以原始尺寸在 `(x, y)` 处绘制 `image`，受当前裁剪约束。
    pub fn draw_image(&mut self, image: &Pixmap, x: i32, y: i32) {
        self.pixmap.draw_pixmap(
            x,
            y,
            image.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            self.state.clip.as_ref(),
        );
    }

    /// 清空整块画布为全透明（不受裁剪影响）。
    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    /// 编码为 PNG 字节。
    pub fn encode_png(&self) -> Result<Vec<u8>, DecorError> {
        self.pixmap
            .encode_png()
            .map_err(|e| DecorError::Render(format!("PNG 编码失败：{}", e)))
    }
}

fn polygon_path(points: &[(f32, f32)]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    if rest.len() < 2 {
        return None;
    }

    let mut builder = PathBuilder::new();
    builder.move_to(first.0, first.1);
    for (x, y) in rest {
        builder.line_to(*x, *y);
    }
    builder.close();
    builder.finish()
}

/// 绘制状态守卫。
///
/// 通过 `Deref`/`DerefMut` 透明访问 `Surface`，`Drop` 时恢复 `save()` 之前的状态。
pub struct StateGuard<'a> {
    surface: &'a mut Surface,
}

impl Deref for StateGuard<'_> {
    type Target = Surface;

    fn deref(&self) -> &Self::Target {
        self.surface
    }
}

impl DerefMut for StateGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.surface
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.surface.restore();
    }
}
