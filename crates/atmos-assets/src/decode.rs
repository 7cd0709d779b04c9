//! Image decoding and fitting to the device's texture limits.
//!
//! Runs on the loader thread so the render thread only ever uploads pixels.

use image::imageops::FilterType;

use crate::error::LoadError;

/// Hard cap on texture width regardless of what the device allows.
pub const MAX_TEXTURE_WIDTH: u32 = 8192;

/// Hard cap on anisotropic filtering.
pub const MAX_ANISOTROPY: u16 = 16;

/// Device limits relevant to earth imagery. Queried once per load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Largest supported 2D texture dimension.
    pub max_texture_size: u32,
    /// Largest supported anisotropic filtering level (1 = none).
    pub max_anisotropy: u16,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_texture_size: 4096,
            max_anisotropy: 1,
        }
    }
}

/// How the uploaded texture should be sampled.
///
/// Earth imagery is always sRGB, clamped at the edges, trilinearly filtered
/// and mipmapped; only the level counts vary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureSettings {
    /// `min(16, device max)`.
    pub anisotropy: u16,
    /// Full mip chain length for the fitted size.
    pub mip_levels: u32,
    /// Sample as sRGB.
    pub srgb: bool,
    /// Clamp-to-edge addressing instead of repeat.
    pub clamp_to_edge: bool,
}

/// RGBA8 pixels ready for upload.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
    pub settings: TextureSettings,
}

/// Number of mip levels in a full chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Target size for a `source_width` x `source_height` image. Width is capped
/// at `min(8192, device max, source width)`, height at `min(device max,
/// source height)`, and whichever axis is over its cap by more sets a single
/// scale so the aspect ratio is kept.
pub fn fitted_size(source_width: u32, source_height: u32, caps: DeviceCapabilities) -> (u32, u32) {
    let source_width = source_width.max(1);
    let source_height = source_height.max(1);
    let max_width = MAX_TEXTURE_WIDTH
        .min(caps.max_texture_size)
        .min(source_width)
        .max(1);
    let max_height = caps.max_texture_size.min(source_height).max(1);

    let scale = (f64::from(max_width) / f64::from(source_width))
        .min(f64::from(max_height) / f64::from(source_height));
    let fit = |source: u32, max: u32| ((f64::from(source) * scale).round() as u32).clamp(1, max);
    (fit(source_width, max_width), fit(source_height, max_height))
}

/// Decode `bytes`, downscale to [`fitted_size`], and convert to RGBA8.
pub fn decode_image(bytes: &[u8], caps: DeviceCapabilities) -> Result<DecodedImage, LoadError> {
    let image = image::load_from_memory(bytes).map_err(|e| LoadError::DecodeFailure(e.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(LoadError::DecodeFailure("image has zero dimensions".to_string()));
    }

    let (width, height) = fitted_size(image.width(), image.height(), caps);
    let image = if (width, height) != (image.width(), image.height()) {
        tracing::debug!(
            from_w = image.width(),
            from_h = image.height(),
            to_w = width,
            to_h = height,
            "downscaling earth texture"
        );
        image.resize_exact(width, height, FilterType::Triangle)
    } else {
        image
    };

    Ok(DecodedImage {
        width,
        height,
        pixels: image.to_rgba8().into_raw(),
        settings: TextureSettings {
            anisotropy: MAX_ANISOTROPY.min(caps.max_anisotropy).max(1),
            mip_levels: mip_level_count(width, height),
            srgb: true,
            clamp_to_edge: true,
        },
    })
}

#[cfg(test)]
pub(crate) fn encode_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([30, 58, 138, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(max_texture_size: u32, max_anisotropy: u16) -> DeviceCapabilities {
        DeviceCapabilities {
            max_texture_size,
            max_anisotropy,
        }
    }

    #[test]
    fn test_fitted_size_respects_device_limit() {
        assert_eq!(fitted_size(8192, 4096, caps(4096, 1)), (4096, 2048));
    }

    #[test]
    fn test_fitted_size_respects_hard_cap() {
        assert_eq!(fitted_size(10_000, 5000, caps(16_384, 1)), (8192, 4096));
    }

    #[test]
    fn test_fitted_size_never_upscales() {
        assert_eq!(fitted_size(100, 50, caps(16_384, 1)), (100, 50));
    }

    #[test]
    fn test_fitted_size_rounds_height() {
        // 3 / 7 * 5 = 2.14 → 2
        assert_eq!(fitted_size(7, 3, caps(5, 1)), (5, 2));
    }

    #[test]
    fn test_fitted_size_limits_tall_images_by_height() {
        assert_eq!(fitted_size(1000, 8000, caps(4096, 1)), (512, 4096));
        assert_eq!(fitted_size(2, 10_000, caps(4096, 1)), (1, 4096));
    }

    #[test]
    fn test_tall_image_decodes_within_device_limit() {
        let png = encode_test_png(4, 32);
        let decoded = decode_image(&png, caps(8, 1)).unwrap();
        assert_eq!((decoded.width, decoded.height), (1, 8));
        assert_eq!(decoded.pixels.len(), 8 * 4);
    }

    #[test]
    fn test_mip_level_count() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(8192, 4096), 14);
        assert_eq!(mip_level_count(300, 10), 9);
    }

    #[test]
    fn test_decode_and_downscale() {
        let png = encode_test_png(16, 8);
        let decoded = decode_image(&png, caps(4, 32)).unwrap();
        assert_eq!((decoded.width, decoded.height), (4, 2));
        assert_eq!(decoded.pixels.len(), 4 * 2 * 4, "RGBA8 tightly packed");
        assert_eq!(decoded.settings.anisotropy, 16, "anisotropy caps at 16");
        assert_eq!(decoded.settings.mip_levels, 3);
        assert!(decoded.settings.srgb && decoded.settings.clamp_to_edge);
        for (got, want) in decoded.pixels[..4].iter().zip([30u8, 58, 138, 255]) {
            assert!(got.abs_diff(want) <= 1, "pixel channel {got} vs {want}");
        }
    }

    #[test]
    fn test_anisotropy_limited_by_device() {
        let png = encode_test_png(2, 2);
        let decoded = decode_image(&png, caps(4096, 4)).unwrap();
        assert_eq!(decoded.settings.anisotropy, 4);
    }

    #[test]
    fn test_garbage_is_decode_failure() {
        let result = decode_image(b"definitely not an image", DeviceCapabilities::default());
        assert!(matches!(result, Err(LoadError::DecodeFailure(_))));
    }
}
