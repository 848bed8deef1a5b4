//! # 颜色参数模块
//!
//! 两步处理：
//! 1. `parse_color`：只做“空值回退”，不校验语法，原样透传用户输入。
//! 2. `resolve_css_color`：由绘制表面在设置样式时调用，把 CSS 颜色串解析为 RGBA。
//!    解析失败时由表面保留先前样式（与 canvas 忽略非法赋值的语义一致）。

use tiny_skia::Color;

/// 未指定颜色时使用的默认环颜色。
pub const DEFAULT_RING_COLOR: &str = "#5865F2";

/// 返回 `value`（非空时），否则返回 `fallback`。
///
/// # 示例
/// ```rust
/// use avatar_decorator::decoration::parse_color;
///
/// assert_eq!(parse_color(None, "#ABC"), "#ABC");
/// assert_eq!(parse_color(Some("#123"), "#ABC"), "#123");
/// ```
pub fn parse_color<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => fallback,
    }
}

/// 渐变环未指定终点色时使用的默认颜色。
pub const DEFAULT_GRADIENT_END_COLOR: &str = "#00d4ff";

/// 将 CSS 颜色字符串（`#rgb` / `#rrggbb` / `#rrggbbaa` / 颜色名 / `rgb()` 等）解析为 RGBA。
///
/// 聊天里常见省略 `#` 的六位十六进制（`ff00ff`），同样接受。
pub fn resolve_css_color(value: &str) -> Option<Color> {
    let value = value.trim();
    let parsed = if is_bare_hex6(value) {
        csscolorparser::parse(&format!("#{}", value)).ok()?
    } else {
        csscolorparser::parse(value).ok()?
    };
    Color::from_rgba(
        (parsed.r as f32).clamp(0.0, 1.0),
        (parsed.g as f32).clamp(0.0, 1.0),
        (parsed.b as f32).clamp(0.0, 1.0),
        (parsed.a as f32).clamp(0.0, 1.0),
    )
}

fn is_bare_hex6(value: &str) -> bool {
    value.len() == 6 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_color_returns_fallback_for_missing_value() {
        assert_eq!(parse_color(None, "#ABC"), "#ABC");
        assert_eq!(parse_color(Some(""), "#ABC"), "#ABC");
    }

    #[test]
    fn parse_color_passes_value_through_unchanged() {
        assert_eq!(parse_color(Some("#123"), "#ABC"), "#123");
        assert_eq!(parse_color(Some("not-a-color"), "#ABC"), "not-a-color");
    }

    #[test]
    fn resolves_hex_and_named_colors() {
        let blurple = resolve_css_color(DEFAULT_RING_COLOR).expect("default color should parse");
        let rgba = blurple.to_color_u8();
        assert_eq!((rgba.red(), rgba.green(), rgba.blue(), rgba.alpha()), (0x58, 0x65, 0xF2, 255));

        let red = resolve_css_color("red").expect("named color should parse");
        assert_eq!(red.to_color_u8().red(), 255);
        assert_eq!(red.to_color_u8().green(), 0);

        let short = resolve_css_color("#fff").expect("short hex should parse");
        assert_eq!(short.to_color_u8().blue(), 255);
    }

    #[test]
    fn resolves_hex_without_hash() {
        let magenta = resolve_css_color("FF00ff").expect("bare hex should parse");
        let rgba = magenta.to_color_u8();
        assert_eq!((rgba.red(), rgba.green(), rgba.blue()), (255, 0, 255));

        // 六位以外的裸十六进制不做补全
        assert!(resolve_css_color("ff00f").is_none());
    }

    #[test]
    fn unresolvable_color_is_none() {
        assert!(resolve_css_color("definitely-not-a-color").is_none());
        assert!(resolve_css_color("#12").is_none());
    }
}
