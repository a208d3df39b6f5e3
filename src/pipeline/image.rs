//! Image normalisation: uploaded bytes → bounded PNG → base64.
//!
//! Vision APIs accept images as base64 data-URIs embedded in the JSON
//! request body. PNG is used because it is lossless and every provider
//! accepts it; screenshots of scam messages are mostly text, and JPEG
//! artefacts around glyphs make them harder to read.
//!
//! ## Two paths
//!
//! * **Fast path**: the upload is already a PNG and both sides fit within
//!   the bound: the original bytes are base64-encoded unchanged.
//! * **Slow path**: anything else: fix the colour mode, shrink so the longer
//!   side equals the bound (only if it exceeds it), re-encode as PNG.
//!
//! In both cases [`EncodedImage::original_max_dimension`] is the longer side
//! of the *uploaded* image, not of the transmitted one. Use
//! [`EncodedImage::encoded_width`] / [`EncodedImage::encoded_height`] for
//! the size the model actually sees.

use crate::error::SusCheckError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageFormat};
use serde::Serialize;
use std::io::Cursor;
use tracing::debug;

/// A decoded upload together with the format it was stored in.
pub struct RawImage {
    image: DynamicImage,
    format: ImageFormat,
}

impl RawImage {
    /// Sniff the format from the magic bytes and decode.
    pub fn decode(bytes: &[u8]) -> Result<Self, SusCheckError> {
        let format = image::guess_format(bytes).map_err(SusCheckError::decode)?;
        let image =
            image::load_from_memory_with_format(bytes, format).map_err(SusCheckError::decode)?;
        Ok(Self { image, format })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn color(&self) -> ColorType {
        self.image.color()
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}

/// A base64 PNG ready to be embedded in a completion request.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Base64 (standard alphabet, padded) of the PNG bytes.
    pub data: String,
    /// `max(width, height)` of the uploaded image, before any resize.
    pub original_max_dimension: u32,
    pub original_width: u32,
    pub original_height: u32,
    /// Size of the image that was encoded into `data`.
    pub encoded_width: u32,
    pub encoded_height: u32,
    /// MIME type of the upload, e.g. `image/jpeg`.
    pub source_format: &'static str,
    /// True when the upload bytes were reused as-is.
    pub passthrough: bool,
}

impl EncodedImage {
    /// `(base64, original_max_dimension)`.
    pub fn into_parts(self) -> (String, u32) {
        (self.data, self.original_max_dimension)
    }

    /// `data:image/png;base64,<payload>`
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.data)
    }

    pub fn summary(&self) -> ImageSummary {
        ImageSummary {
            source_format: self.source_format.to_string(),
            width: self.original_width,
            height: self.original_height,
            max_dimension: self.original_max_dimension,
            encoded_width: self.encoded_width,
            encoded_height: self.encoded_height,
            encoded_len: self.data.len(),
            passthrough: self.passthrough,
        }
    }
}

/// Serialisable description of a normalised image (no payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSummary {
    pub source_format: String,
    pub width: u32,
    pub height: u32,
    pub max_dimension: u32,
    pub encoded_width: u32,
    pub encoded_height: u32,
    /// Length of the base64 text in bytes.
    pub encoded_len: usize,
    pub passthrough: bool,
}

/// Normalise an uploaded image so its longer side is at most `max_size`.
///
/// # Errors
/// * [`SusCheckError::InvalidConfig`] when `max_size` is 0
/// * [`SusCheckError::ImageDecode`] when the bytes are not a supported image
/// * [`SusCheckError::ImageEncode`] when PNG encoding fails
pub fn process_image(bytes: &[u8], max_size: u32) -> Result<EncodedImage, SusCheckError> {
    if max_size == 0 {
        return Err(SusCheckError::InvalidConfig(
            "max image size must be ≥ 1".into(),
        ));
    }

    let raw = RawImage::decode(bytes)?;
    let (width, height) = (raw.width(), raw.height());
    let source_format = raw.mime_type();
    debug!(
        "Decoded {} image {}x{} ({:?})",
        source_format,
        width,
        height,
        raw.color()
    );

    if raw.format() == ImageFormat::Png && width <= max_size && height <= max_size {
        let data = STANDARD.encode(bytes);
        debug!("PNG within {}px, passing through → {} bytes base64", max_size, data.len());
        return Ok(EncodedImage {
            data,
            original_max_dimension: width.max(height),
            original_width: width,
            original_height: height,
            encoded_width: width,
            encoded_height: height,
            source_format,
            passthrough: true,
        });
    }

    let resized = resize_image(raw.into_image(), max_size);
    let png = convert_to_png(&resized)?;
    let data = STANDARD.encode(&png);
    debug!(
        "Re-encoded as PNG {}x{} → {} bytes base64",
        resized.width(),
        resized.height(),
        data.len()
    );

    Ok(EncodedImage {
        data,
        original_max_dimension: width.max(height),
        original_width: width,
        original_height: height,
        encoded_width: resized.width(),
        encoded_height: resized.height(),
        source_format,
        passthrough: false,
    })
}

/// Fix the colour mode, then shrink to fit `max_dimension` keeping the
/// aspect ratio. Images already within bounds keep their size.
pub fn resize_image(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    let image = fix_color_mode(image);
    let (width, height) = (image.width(), image.height());
    let (new_width, new_height) = fit_within(width, height, max_dimension);
    if (new_width, new_height) == (width, height) {
        return image;
    }
    debug!(
        "Resizing {}x{} → {}x{}",
        width, height, new_width, new_height
    );
    image.resize_exact(new_width, new_height, FilterType::Lanczos3)
}

/// Target size for a `width`×`height` image bounded by `max_dimension`.
///
/// The longer side becomes `max_dimension`; the shorter side is scaled by
/// the same factor and truncated, but never drops below 1 pixel.
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }
    let scale = |side: u32, longer: u32| -> u32 {
        let scaled = (side as f64 * (max_dimension as f64 / longer as f64)) as u32;
        scaled.clamp(1, max_dimension)
    };
    if width > height {
        (max_dimension, scale(height, width))
    } else {
        (scale(width, height), max_dimension)
    }
}

/// Bring the pixel buffer into a mode the PNG encoder and the resampler
/// handle without artefacts.
///
/// Indexed-colour sources never reach this point as palettes: the decoder
/// expands them to RGBA8 when a transparency chunk is present and to RGB8
/// otherwise. Float buffers have no PNG representation and are quantised.
fn fix_color_mode(image: DynamicImage) -> DynamicImage {
    match image.color() {
        ColorType::Rgba32F => DynamicImage::ImageRgba8(image.to_rgba8()),
        ColorType::Rgb32F => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image,
    }
}

/// Encode as PNG bytes.
pub fn convert_to_png(image: &DynamicImage) -> Result<Vec<u8>, SusCheckError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(SusCheckError::encode)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, Rgba32FImage, RgbaImage};

    fn encode_as(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format)
            .expect("test image encodes");
        buf
    }

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([200, 10, 10, 128])));
        encode_as(&img, ImageFormat::Png)
    }

    /// Two-colour indexed PNG; `trns` adds a transparency chunk.
    fn palette_png(w: u32, h: u32, trns: bool) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut enc = png::Encoder::new(&mut buf, w, h);
            enc.set_color(png::ColorType::Indexed);
            enc.set_depth(png::BitDepth::Eight);
            enc.set_palette(vec![255u8, 0, 0, 0, 0, 255]);
            if trns {
                enc.set_trns(vec![0u8, 255]);
            }
            let mut writer = enc.write_header().expect("png header");
            let pixels: Vec<u8> = (0..w * h).map(|i| (i % 2) as u8).collect();
            writer.write_image_data(&pixels).expect("png data");
            writer.finish().expect("png finish");
        }
        buf
    }

    fn jpeg_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([10, 200, 10])));
        encode_as(&img, ImageFormat::Jpeg)
    }

    fn decode_payload(encoded: &EncodedImage) -> (Vec<u8>, DynamicImage) {
        let bytes = STANDARD.decode(&encoded.data).expect("valid base64");
        let img = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
            .expect("payload is a PNG");
        (bytes, img)
    }

    #[test]
    fn small_png_passes_through_byte_for_byte() {
        let original = png_bytes(40, 30);
        let encoded = process_image(&original, 64).expect("process");
        assert!(encoded.passthrough);
        let (bytes, _) = decode_payload(&encoded);
        assert_eq!(bytes, original);
        assert_eq!(encoded.original_max_dimension, 40);
        assert_eq!(encoded.source_format, "image/png");
    }

    #[test]
    fn png_with_side_equal_to_bound_passes_through() {
        let original = png_bytes(64, 10);
        let encoded = process_image(&original, 64).expect("process");
        assert!(encoded.passthrough);
    }

    #[test]
    fn small_jpeg_is_converted_without_resize() {
        let encoded = process_image(&jpeg_bytes(50, 20), 64).expect("process");
        assert!(!encoded.passthrough);
        assert_eq!(encoded.source_format, "image/jpeg");
        let (_, img) = decode_payload(&encoded);
        assert_eq!((img.width(), img.height()), (50, 20));
        assert_eq!((encoded.encoded_width, encoded.encoded_height), (50, 20));
    }

    #[test]
    fn oversized_png_is_shrunk_to_bound() {
        let encoded = process_image(&png_bytes(200, 100), 64).expect("process");
        assert!(!encoded.passthrough);
        let (_, img) = decode_payload(&encoded);
        assert_eq!((img.width(), img.height()), (64, 32));
        // Keeps alpha through the slow path.
        assert!(img.color().has_alpha());
    }

    #[test]
    fn reported_dimension_is_pre_resize() {
        let encoded = process_image(&jpeg_bytes(90, 180), 64).expect("process");
        assert_eq!(encoded.original_max_dimension, 180);
        assert_eq!(encoded.encoded_height, 64);
        assert_eq!(encoded.encoded_width, 32);
        let (b64, dim) = encoded.into_parts();
        assert!(!b64.is_empty());
        assert_eq!(dim, 180);
    }

    #[test]
    fn fit_within_truncates_shorter_side() {
        assert_eq!(fit_within(3000, 2000, 1024), (1024, 682));
        assert_eq!(fit_within(300, 1500, 1024), (204, 1024));
        assert_eq!(fit_within(2048, 2048, 1024), (1024, 1024));
        assert_eq!(fit_within(800, 600, 1024), (800, 600));
    }

    #[test]
    fn fit_within_never_returns_zero() {
        assert_eq!(fit_within(5000, 1, 1024), (1024, 1));
        assert_eq!(fit_within(1, 5000, 1024), (1, 1024));
    }

    #[test]
    fn fit_within_preserves_aspect_ratio() {
        let sizes = [(4032, 3024), (1080, 2400), (1025, 17), (7000, 6999), (1500, 1499)];
        for (w, h) in sizes {
            let (nw, nh) = fit_within(w, h, 1024);
            assert!(nw <= 1024 && nh <= 1024, "{w}x{h} → {nw}x{nh}");
            assert_eq!(nw.max(nh), 1024);
            let factor = 1024.0 / w.max(h) as f64;
            let (ew, eh) = (w as f64 * factor, h as f64 * factor);
            assert!(
                (nw as f64 - ew).abs() <= 1.0 && (nh as f64 - eh).abs() <= 1.0,
                "{w}x{h} → {nw}x{nh}, expected ≈ {ew}x{eh}"
            );
        }
    }

    #[test]
    fn palette_with_transparency_becomes_rgba() {
        let encoded = process_image(&palette_png(200, 100, true), 64).expect("process");
        assert!(!encoded.passthrough);
        let (_, img) = decode_payload(&encoded);
        assert_eq!(img.color(), ColorType::Rgba8);
        assert_eq!((img.width(), img.height()), (64, 32));
    }

    #[test]
    fn palette_without_transparency_becomes_rgb() {
        let encoded = process_image(&palette_png(200, 100, false), 64).expect("process");
        assert!(!encoded.passthrough);
        let (_, img) = decode_payload(&encoded);
        assert_eq!(img.color(), ColorType::Rgb8);
        assert_eq!((img.width(), img.height()), (64, 32));
    }

    #[test]
    fn small_palette_png_passes_through() {
        let original = palette_png(10, 10, true);
        let encoded = process_image(&original, 64).expect("process");
        assert!(encoded.passthrough);
        let (bytes, _) = decode_payload(&encoded);
        assert_eq!(bytes, original);
    }

    #[test]
    fn float_buffers_are_quantised() {
        let img = DynamicImage::ImageRgba32F(Rgba32FImage::new(4, 4));
        let fixed = fix_color_mode(img);
        assert_eq!(fixed.color(), ColorType::Rgba8);
        assert!(convert_to_png(&fixed).is_ok());
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = process_image(b"definitely not an image", 1024).unwrap_err();
        assert!(matches!(err, SusCheckError::ImageDecode { .. }), "got {err:?}");
    }

    #[test]
    fn truncated_png_fails_to_decode() {
        let bytes = png_bytes(20, 20);
        let err = process_image(&bytes[..bytes.len() / 2], 1024).unwrap_err();
        assert!(matches!(err, SusCheckError::ImageDecode { .. }), "got {err:?}");
    }

    #[test]
    fn zero_bound_is_rejected() {
        let err = process_image(&png_bytes(2, 2), 0).unwrap_err();
        assert!(matches!(err, SusCheckError::InvalidConfig(_)));
    }

    #[test]
    fn data_uri_has_png_prefix() {
        let encoded = process_image(&png_bytes(2, 2), 8).expect("process");
        assert!(encoded.data_uri().starts_with("data:image/png;base64,"));
        let summary = encoded.summary();
        assert_eq!(summary.encoded_len, encoded.data.len());
        assert!(summary.passthrough);
    }
}
