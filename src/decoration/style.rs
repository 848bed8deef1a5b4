//! # 装饰样式模块
//!
//! 把命令里的子命令与参数解析为封闭枚举 [`DecorationStyle`]，
//! 渲染层只对枚举做穷尽匹配，不再接触原始字符串。
//!
//! 参数约定（`args` 不含子命令本身）：
//!
//! | 样式 | args[0] | args[1] |
//! |------|---------|---------|
//! | 单环 / 双环 / 光晕 | 颜色 | - |
//! | 点状环 | 颜色 | 点数 |
//! | 渐变环 | 起点色 | 终点色 |
//! | 覆盖图 | 文件名或内置贴纸名（必填） | 缩放 |

use super::color::{DEFAULT_GRADIENT_END_COLOR, DEFAULT_RING_COLOR, parse_color};
use super::primitives::DEFAULT_DOT_COUNT;
use super::DecorError;

/// 点状环允许的最大点数。
pub const MAX_DOT_COUNT: u32 = 720;

/// 命令层对覆盖图缩放的预限制下限。
pub const COMMAND_MIN_SCALE: f32 = 0.5;

/// 命令层对覆盖图缩放的预限制上限。
pub const COMMAND_MAX_SCALE: f32 = 1.5;

const OVERLAY_USAGE: &str =
    "用法：decorar overlay <文件名|estrela|coração> [缩放 0.5~1.5]";

/// 内置矢量贴纸。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickerKind {
    Star,
    Heart,
}

impl StickerKind {
    /// 按名称匹配内置贴纸（不区分大小写）。
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "estrela" | "star" => Some(Self::Star),
            "coração" | "coracao" | "heart" => Some(Self::Heart),
            _ => None,
        }
    }
}

/// 一次请求选定的装饰样式。
#[derive(Debug, Clone, PartialEq)]
pub enum DecorationStyle {
    Ring { color: String },
    DoubleRing { color: String },
    DottedRing { color: String, count: u32 },
    GradientRing { from: String, to: String },
    Glow { color: String },
    Sticker { kind: StickerKind },
    Overlay { file: String, scale: f32 },
}

impl DecorationStyle {
    /// 解析子命令与参数。子命令缺省时为默认颜色的单环。
    ///
    /// # 示例
    /// ```rust
    /// use avatar_decorator::decoration::DecorationStyle;
    ///
    /// let style = DecorationStyle::parse(Some("pontilhado"), &["#fff", "12"])?;
    /// assert_eq!(
    ///     style,
    ///     DecorationStyle::DottedRing { color: "#fff".to_string(), count: 12 }
    /// );
    /// # Ok::<(), avatar_decorator::decoration::DecorError>(())
    /// ```
    pub fn parse(sub: Option<&str>, args: &[&str]) -> Result<Self, DecorError> {
        let Some(sub) = sub else {
            return Ok(Self::Ring {
                color: DEFAULT_RING_COLOR.to_string(),
            });
        };

        let color = || parse_color(args.first().copied(), DEFAULT_RING_COLOR).to_string();

        match sub.to_ascii_lowercase().as_str() {
            "ring" | "anel" => Ok(Self::Ring { color: color() }),
            "double-ring" | "duplo" => Ok(Self::DoubleRing { color: color() }),
            "dotted-ring" | "pontilhado" => Ok(Self::DottedRing {
                color: color(),
                count: parse_dot_count(args.get(1).copied()),
            }),
            "gradient-ring" | "gradiente" | "gradiente2" => Ok(Self::GradientRing {
                from: color(),
                to: parse_color(args.get(1).copied(), DEFAULT_GRADIENT_END_COLOR).to_string(),
            }),
            "glow" => Ok(Self::Glow { color: color() }),
            "overlay" | "adesivo" | "sticker" => {
                let file = args
                    .first()
                    .filter(|f| !f.is_empty())
                    .ok_or_else(|| DecorError::MissingArgument(OVERLAY_USAGE.to_string()))?;
                if let Some(kind) = StickerKind::from_name(file) {
                    return Ok(Self::Sticker { kind });
                }
                Ok(Self::Overlay {
                    file: (*file).to_string(),
                    scale: parse_command_scale(args.get(1).copied()),
                })
            }
            other => Err(DecorError::UnknownStyle(other.to_string())),
        }
    }

    /// 日志用的简短名称。
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ring { .. } => "ring",
            Self::DoubleRing { .. } => "double-ring",
            Self::DottedRing { .. } => "dotted-ring",
            Self::GradientRing { .. } => "gradient-ring",
            Self::Glow { .. } => "glow",
            Self::Sticker { .. } => "sticker",
            Self::Overlay { .. } => "overlay",
        }
    }
}

fn parse_dot_count(raw: Option<&str>) -> u32 {
    match raw.map(|s| s.trim().parse::<i64>()) {
        Some(Ok(n)) => n.clamp(0, i64::from(MAX_DOT_COUNT)) as u32,
        _ => DEFAULT_DOT_COUNT,
    }
}

fn parse_command_scale(raw: Option<&str>) -> f32 {
    let scale = raw
        .and_then(|s| s.trim().parse::<f32>().ok())
        .filter(|s| s.is_finite() && *s != 0.0)
        .unwrap_or(1.0);
    scale.clamp(COMMAND_MIN_SCALE, COMMAND_MAX_SCALE)
}

/// 单环线宽：`max(4, ⌊size·0.08⌋)`。
pub fn ring_thickness(size: u32) -> f32 {
    scaled_at_least(size, 0.08, 4)
}

/// 双环线宽：`max(3, ⌊size·0.05⌋)`。
pub fn double_ring_thickness(size: u32) -> f32 {
    scaled_at_least(size, 0.05, 3)
}

/// 双环间隙：`⌊size·0.06⌋`。
pub fn double_ring_gap(size: u32) -> f32 {
    scaled_at_least(size, 0.06, 0)
}

/// 渐变环线宽：`max(3, ⌊size·0.1⌋)`。
pub fn gradient_ring_thickness(size: u32) -> f32 {
    scaled_at_least(size, 0.1, 3)
}

/// 光晕模糊半径（高斯 σ）：`max(2, ⌊size·0.036⌋)`。
pub fn glow_sigma(size: u32) -> f32 {
    scaled_at_least(size, 0.036, 2)
}

/// 点半径：`max(2, ⌊size·0.02⌋)`。
pub fn dot_radius(size: u32) -> f32 {
    scaled_at_least(size, 0.02, 2)
}

fn scaled_at_least(size: u32, ratio: f64, min: u32) -> f32 {
    let scaled = (f64::from(size) * ratio).floor() as u32;
    scaled.max(min) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sub_is_default_ring() {
        let style = DecorationStyle::parse(None, &[]).expect("default style");
        assert_eq!(
            style,
            DecorationStyle::Ring {
                color: DEFAULT_RING_COLOR.to_string()
            }
        );
    }

    #[test]
    fn accepts_both_name_sets_case_insensitively() {
        assert!(matches!(
            DecorationStyle::parse(Some("ANEL"), &[]),
            Ok(DecorationStyle::Ring { .. })
        ));
        assert!(matches!(
            DecorationStyle::parse(Some("duplo"), &["red"]),
            Ok(DecorationStyle::DoubleRing { ref color }) if color == "red"
        ));
        assert!(matches!(
            DecorationStyle::parse(Some("Dotted-Ring"), &[]),
            Ok(DecorationStyle::DottedRing { count: 48, .. })
        ));
        assert!(matches!(
            DecorationStyle::parse(Some("sticker"), &["frame.png"]),
            Ok(DecorationStyle::Overlay { .. })
        ));
    }

    #[test]
    fn gradient_and_glow_take_colors_with_defaults() {
        assert_eq!(
            DecorationStyle::parse(Some("gradiente"), &["red", "#00ff00"]).expect("gradient"),
            DecorationStyle::GradientRing {
                from: "red".to_string(),
                to: "#00ff00".to_string()
            }
        );
        assert_eq!(
            DecorationStyle::parse(Some("gradiente2"), &[]).expect("gradient"),
            DecorationStyle::GradientRing {
                from: DEFAULT_RING_COLOR.to_string(),
                to: DEFAULT_GRADIENT_END_COLOR.to_string()
            }
        );
        assert_eq!(
            DecorationStyle::parse(Some("GLOW"), &["blue"]).expect("glow"),
            DecorationStyle::Glow {
                color: "blue".to_string()
            }
        );
    }

    #[test]
    fn builtin_sticker_names_win_over_overlay_files() {
        assert_eq!(
            DecorationStyle::parse(Some("adesivo"), &["Estrela"]).expect("sticker"),
            DecorationStyle::Sticker {
                kind: StickerKind::Star
            }
        );
        assert_eq!(
            DecorationStyle::parse(Some("sticker"), &["CORAÇÃO"]).expect("sticker"),
            DecorationStyle::Sticker {
                kind: StickerKind::Heart
            }
        );
        assert!(matches!(
            DecorationStyle::parse(Some("adesivo"), &["estrela.png"]),
            Ok(DecorationStyle::Overlay { ref file, .. }) if file == "estrela.png"
        ));
    }

    #[test]
    fn unknown_sub_is_rejected() {
        let err = DecorationStyle::parse(Some("spiral"), &[]).expect_err("should fail");
        assert!(matches!(err, DecorError::UnknownStyle(ref s) if s == "spiral"));
    }

    #[test]
    fn dot_count_fallbacks_and_clamps() {
        assert_eq!(parse_dot_count(None), 48);
        assert_eq!(parse_dot_count(Some("abc")), 48);
        assert_eq!(parse_dot_count(Some("1.5")), 48);
        assert_eq!(parse_dot_count(Some("-3")), 0);
        assert_eq!(parse_dot_count(Some("12")), 12);
        assert_eq!(parse_dot_count(Some("100000")), MAX_DOT_COUNT);
    }

    #[test]
    fn overlay_requires_file() {
        let err = DecorationStyle::parse(Some("overlay"), &[]).expect_err("should fail");
        assert!(matches!(err, DecorError::MissingArgument(_)));
    }

    #[test]
    fn overlay_scale_is_pre_clamped() {
        assert_eq!(parse_command_scale(None), 1.0);
        assert_eq!(parse_command_scale(Some("0")), 1.0);
        assert_eq!(parse_command_scale(Some("NaN")), 1.0);
        assert_eq!(parse_command_scale(Some("oops")), 1.0);
        assert_eq!(parse_command_scale(Some("3")), 1.5);
        assert_eq!(parse_command_scale(Some("0.1")), 0.5);
        assert_eq!(parse_command_scale(Some("1.2")), 1.2);
    }

    #[test]
    fn size_derived_measurements_for_default_canvas() {
        assert_eq!(ring_thickness(512), 40.0);
        assert_eq!(double_ring_thickness(512), 25.0);
        assert_eq!(double_ring_gap(512), 30.0);
        assert_eq!(dot_radius(512), 10.0);
        assert_eq!(gradient_ring_thickness(512), 51.0);
        assert_eq!(glow_sigma(512), 18.0);
    }

    #[test]
    fn size_derived_measurements_respect_minimums() {
        assert_eq!(ring_thickness(32), 4.0);
        assert_eq!(double_ring_thickness(32), 3.0);
        assert_eq!(dot_radius(32), 2.0);
    }
}
