//! Per-type content normalization.
//!
//! Turns classified files into request fragments: images are decoded and
//! downscaled, HTML is reduced to its readable text, raw text is decoded
//! leniently. Binary uploads are handled by the upload manager instead.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::error::FileError;
use crate::processing::html::{extract_text, truncate_chars};
use crate::types::{AssetKind, InputFile, NormalizedFragment, TextMode};
use crate::{MAX_IMAGE_DIMENSION, MAX_TEXT_CHARS, MIN_TEXT_CHARS};

/// Normalizer for locally handled content.
#[derive(Debug, Clone)]
pub struct ContentNormalizer {
    text_mode: TextMode,
}

impl Default for ContentNormalizer {
    fn default() -> Self {
        Self::new(TextMode::ExtractHtml)
    }
}

impl ContentNormalizer {
    pub fn new(text_mode: TextMode) -> Self {
        Self { text_mode }
    }

    /// Decode an image, downscale it if needed and caption it.
    pub fn normalize_image(&self, file: &InputFile) -> Result<NormalizedFragment, FileError> {
        let bytes = file.raw_bytes();
        let image = image::load_from_memory(bytes).map_err(|source| FileError::Decode {
            name: file.name().to_string(),
            source,
        })?;

        let (width, height) = (image.width(), image.height());
        let image = resize_to_fit(image, MAX_IMAGE_DIMENSION);
        debug!(
            file = %file.name(),
            from = ?(width, height),
            to = ?(image.width(), image.height()),
            "Normalized image"
        );

        let mime_type = match image::guess_format(bytes) {
            Ok(ImageFormat::Jpeg) => "image/jpeg",
            _ => "image/png",
        };

        Ok(NormalizedFragment::Image {
            image,
            mime_type: mime_type.to_string(),
            caption: caption(AssetKind::Image, file.name()),
        })
    }

    /// Turn an HTML file into a delimited text block.
    pub fn normalize_html(&self, file: &InputFile) -> Result<NormalizedFragment, FileError> {
        match self.text_mode {
            TextMode::ExtractHtml => self.extract_html(file),
            TextMode::Raw => Ok(self.normalize_text(file)),
        }
    }

    /// Lenient decode of raw bytes; invalid sequences become U+FFFD.
    pub fn normalize_text(&self, file: &InputFile) -> NormalizedFragment {
        let text = String::from_utf8_lossy(file.raw_bytes());
        text_block(file.name(), &text)
    }

    fn extract_html(&self, file: &InputFile) -> Result<NormalizedFragment, FileError> {
        let raw_html = String::from_utf8_lossy(file.raw_bytes());
        let text = extract_text(&raw_html);

        let chars = text.chars().count();
        if chars <= MIN_TEXT_CHARS {
            return Err(FileError::EmptyContent {
                name: file.name().to_string(),
                chars,
            });
        }

        if chars > MAX_TEXT_CHARS {
            debug!(file = %file.name(), chars, cap = MAX_TEXT_CHARS, "Truncating extracted text");
        }

        Ok(text_block(file.name(), truncate_chars(&text, MAX_TEXT_CHARS)))
    }
}

/// Caption attached after an image or uploaded asset.
pub fn caption(kind: AssetKind, name: &str) -> String {
    format!("{}: {}", kind.caption_label(), name)
}

/// Wrap text in the delimiter header naming its source.
pub fn text_block(name: &str, text: &str) -> NormalizedFragment {
    NormalizedFragment::TextBlock {
        text: format!("\n--- CONTENTS OF {} ---\n{}\n", name, text),
        source_name: name.to_string(),
    }
}

/// Downscale so the larger side equals `max_dimension`, keeping aspect ratio.
///
/// Images already within bounds are returned untouched.
pub fn resize_to_fit(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    if width <= max_dimension && height <= max_dimension {
        return image;
    }

    let scale = max_dimension as f64 / width.max(height) as f64;
    let scaled = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max_dimension);
    let (new_width, new_height) = if width >= height {
        (max_dimension, scaled(height))
    } else {
        (scaled(width), max_dimension)
    };

    image.resize_exact(new_width, new_height, FilterType::Triangle)
}

/// Encode an image for inline transport.
///
/// JPEG output drops the alpha channel, which the encoder cannot carry.
pub fn encode_image(image: &DynamicImage, mime_type: &str) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);

    if mime_type == "image/jpeg" {
        DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut cursor, ImageFormat::Jpeg)?;
    } else {
        image.write_to(&mut cursor, ImageFormat::Png)?;
    }

    Ok(buffer)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// PNG bytes for a solid image of the given size.
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 30, 30])));
        encode_image(&image, "image/png").unwrap()
    }

    fn dims(fragment: &NormalizedFragment) -> (u32, u32) {
        match fragment {
            NormalizedFragment::Image { image, .. } => (image.width(), image.height()),
            other => panic!("expected image fragment, got {:?}", other),
        }
    }

    #[test]
    fn test_large_landscape_image_is_downscaled() {
        let normalizer = ContentNormalizer::default();
        let file = InputFile::new("big.png", "image/png", png_bytes(2048, 1536));

        let fragment = normalizer.normalize_image(&file).unwrap();

        assert_eq!(dims(&fragment), (1024, 768));
    }

    #[test]
    fn test_large_portrait_image_keeps_aspect_ratio() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(1000, 3000));
        let resized = resize_to_fit(image, 1024);

        assert_eq!(resized.height(), 1024);
        let ratio = resized.width() as f64 / resized.height() as f64;
        assert!((ratio - 1000.0 / 3000.0).abs() < 0.01);
    }

    #[test]
    fn test_one_side_over_limit_triggers_resize() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(1025, 10));
        let resized = resize_to_fit(image, 1024);
        assert_eq!((resized.width(), resized.height()), (1024, 10));
    }

    #[test]
    fn test_small_image_untouched() {
        let normalizer = ContentNormalizer::default();
        let file = InputFile::new("a.png", "image/png", png_bytes(800, 600));

        let fragment = normalizer.normalize_image(&file).unwrap();

        assert_eq!(dims(&fragment), (800, 600));
        assert_eq!(fragment.label(), "Image filename: a.png");
    }

    #[test]
    fn test_exactly_at_limit_untouched() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(1024, 1024));
        let resized = resize_to_fit(image, 1024);
        assert_eq!((resized.width(), resized.height()), (1024, 1024));
    }

    #[test]
    fn test_corrupt_image_is_decode_error() {
        let normalizer = ContentNormalizer::default();
        let file = InputFile::new("broken.jpg", "image/jpeg", b"not really a jpeg".to_vec());

        let err = normalizer.normalize_image(&file).unwrap_err();
        assert!(matches!(err, FileError::Decode { .. }));
        assert!(!err.always_skipped());
    }

    #[test]
    fn test_short_html_is_empty_content() {
        let normalizer = ContentNormalizer::default();
        let html = "<html><body><img src=\"q1.png\"><p>Page 1 of 3</p></body></html>";
        let file = InputFile::new("b.html", "text/html", html.as_bytes().to_vec());

        let err = normalizer.normalize_html(&file).unwrap_err();
        assert!(matches!(err, FileError::EmptyContent { chars: 11, .. }));
    }

    #[test]
    fn test_threshold_is_exclusive_at_fifty_chars() {
        let normalizer = ContentNormalizer::default();

        let fifty = format!("<p>{}</p>", "x".repeat(50));
        let file = InputFile::new("fifty.html", "text/html", fifty.into_bytes());
        assert!(normalizer.normalize_html(&file).is_err());

        let fifty_one = format!("<p>{}</p>", "x".repeat(51));
        let file = InputFile::new("fifty_one.html", "text/html", fifty_one.into_bytes());
        assert!(normalizer.normalize_html(&file).is_ok());
    }

    #[test]
    fn test_long_html_is_capped() {
        let normalizer = ContentNormalizer::default();
        let html = format!("<body><p>{}</p></body>", "q".repeat(MAX_TEXT_CHARS + 5_000));
        let file = InputFile::new("long.html", "text/html", html.into_bytes());

        let fragment = normalizer.normalize_html(&file).unwrap();

        let NormalizedFragment::TextBlock { text, source_name } = fragment else {
            panic!("expected text block");
        };
        let overhead = "\n--- CONTENTS OF long.html ---\n".len() + "\n".len();
        assert_eq!(source_name, "long.html");
        assert_eq!(text.chars().count(), MAX_TEXT_CHARS + overhead);
    }

    #[test]
    fn test_raw_mode_keeps_markup_and_tolerates_bad_bytes() {
        let normalizer = ContentNormalizer::new(TextMode::Raw);
        let mut bytes = b"<p>Q1</p>".to_vec();
        bytes.push(0xFF);
        let file = InputFile::new("p.html", "text/html", bytes);

        let fragment = normalizer.normalize_html(&file).unwrap();

        let NormalizedFragment::TextBlock { text, .. } = fragment else {
            panic!("expected text block");
        };
        assert!(text.starts_with("\n--- CONTENTS OF p.html ---\n<p>Q1</p>"));
        assert!(text.contains('\u{FFFD}'));
    }
}
