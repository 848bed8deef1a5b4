//! # 解码流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → 预乘 RGBA 画布”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸
//! 2. 按像素上限快速拒绝
//! 3. 完整解码
//! 4. 头像单边超过 `max_working_dimension` 时降采样（绘制时还会再缩放到目标直径）
//! 5. 转换为 tiny-skia 使用的预乘 alpha `Pixmap`
//!
//! 覆盖图决定输出画布尺寸，只做像素上限检查，不降采样。

use fast_image_resize as fr;
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgba};
use std::io::Cursor;
use tiny_skia::{IntSize, Pixmap};

use super::source::RawImageData;
use super::{DecorConfig, DecorError, DecorationHandler};

impl DecorationHandler {
    /// 将头像原始字节解码为可绘制的 `Pixmap`，超大图会先降采样。
    pub(crate) fn decode_to_pixmap(
        &self,
        raw: &RawImageData,
        config: &DecorConfig,
    ) -> Result<Pixmap, DecorError> {
        Self::decode(raw, config, true)
    }

    /// 解码覆盖图，保持原始尺寸。
    pub(crate) fn decode_overlay_to_pixmap(
        &self,
        raw: &RawImageData,
        config: &DecorConfig,
    ) -> Result<Pixmap, DecorError> {
        Self::decode(raw, config, false)
    }

    fn decode(
        raw: &RawImageData,
        config: &DecorConfig,
        downscale: bool,
    ) -> Result<Pixmap, DecorError> {
        image::guess_format(&raw.bytes)
            .map_err(|e| DecorError::InvalidFormat(format!("不支持的图片格式：{}", e)))?;

        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        Self::validate_pixel_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| DecorError::Decode(format!("图片解码失败：{}", e)))?;

        let (raw_width, raw_height) = decoded.dimensions();
        Self::validate_pixel_limits(config, raw_width, raw_height)?;

        let working = if downscale {
            Self::maybe_downscale(decoded, config)?
        } else {
            decoded
        };
        let (width, height) = working.dimensions();

        let pixmap = dynamic_image_to_pixmap(&working)?;

        log::info!(
            "✅ 图片解码成功 - 来源: {} 原始尺寸: {}x{} 工作尺寸: {}x{}",
            raw.source_hint,
            raw_width,
            raw_height,
            width,
            height
        );

        Ok(pixmap)
    }

    /// 仅通过内存中的图片头信息读取宽高。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), DecorError> {
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DecorError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;

        reader
            .into_dimensions()
            .map_err(|e| DecorError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
    }

    /// 校验像素数量是否超过配置上限。
    fn validate_pixel_limits(
        config: &DecorConfig,
        width: u32,
        height: u32,
    ) -> Result<(), DecorError> {
        if width == 0 || height == 0 {
            return Err(DecorError::Decode(format!("图片尺寸无效：{}x{}", width, height)));
        }

        let pixels = u64::from(width)
            .checked_mul(u64::from(height))
            .ok_or_else(|| DecorError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > config.max_decoded_pixels {
            return Err(DecorError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    /// 单边超限时按比例降采样。
    fn maybe_downscale(
        image: DynamicImage,
        config: &DecorConfig,
    ) -> Result<DynamicImage, DecorError> {
        let (width, height) = image.dimensions();
        let max_dim = config.max_working_dimension;
        if width <= max_dim && height <= max_dim {
            return Ok(image);
        }

        let scale = (f64::from(max_dim) / f64::from(width))
            .min(f64::from(max_dim) / f64::from(height))
            .min(1.0);
        let target_width = ((f64::from(width) * scale).floor() as u32).max(1);
        let target_height = ((f64::from(height) * scale).floor() as u32).max(1);

        log::info!(
            "🧩 降采样：{}x{} -> {}x{}",
            width,
            height,
            target_width,
            target_height
        );

        match Self::resize_with_fast_image_resize(&image, target_width, target_height) {
            Ok(resized) => Ok(resized),
            Err(err) => {
                log::warn!(
                    "⚠️ fast_image_resize 降采样失败，回退 image::resize_exact：{}",
                    err
                );
                Ok(image.resize_exact(
                    target_width,
                    target_height,
                    image::imageops::FilterType::Triangle,
                ))
            }
        }
    }

    fn resize_with_fast_image_resize(
        image: &DynamicImage,
        target_width: u32,
        target_height: u32,
    ) -> Result<DynamicImage, DecorError> {
        let src = image.to_rgba8();
        let (src_width, src_height) = src.dimensions();

        let src_image =
            fr::images::Image::from_vec_u8(src_width, src_height, src.into_raw(), fr::PixelType::U8x4)
                .map_err(|e| DecorError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3));

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| DecorError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

        let rgba = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(
            target_width,
            target_height,
            dst_image.into_vec(),
        )
        .ok_or_else(|| DecorError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))?;

        Ok(DynamicImage::ImageRgba8(rgba))
    }
}

/// 转换为 tiny-skia 所需的预乘 alpha RGBA。
pub(crate) fn dynamic_image_to_pixmap(image: &DynamicImage) -> Result<Pixmap, DecorError> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let size = IntSize::from_wh(width, height)
        .ok_or_else(|| DecorError::Decode(format!("图片尺寸无效：{}x{}", width, height)))?;

    let mut data = rgba.into_raw();
    for px in data.chunks_exact_mut(4) {
        let alpha = u16::from(px[3]);
        if alpha == 255 {
            continue;
        }
        for channel in &mut px[..3] {
            *channel = ((u16::from(*channel) * alpha + 127) / 255) as u8;
        }
    }

    Pixmap::from_vec(data, size)
        .ok_or_else(|| DecorError::Decode("像素数据长度与尺寸不一致".to_string()))
}
