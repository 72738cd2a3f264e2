//! Image decoding with a structured fallback path.
//!
//! The primary decoder is the `image` crate with format sniffing. Its
//! failure is classified into a tagged variant so the fallback decision is
//! a type-safe branch: only an unrecognized-format error triggers the
//! secondary decoder (zune-jpeg, which accepts JPEG streams the primary
//! sniffer rejects, e.g. with mangled leading markers). Any other failure,
//! or failure of the fallback itself, is final for the item.

use std::io::Cursor;

use image::{DynamicImage, ImageError, RgbImage};
use thiserror::Error;
use zune_jpeg::zune_core::colorspace::ColorSpace;
use zune_jpeg::zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Structured decode failure classification.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The body is not in any format the decoder set recognizes
    #[error("unrecognized image format")]
    Unsupported,

    /// Recognized format, but the stream is broken
    #[error("decode failed: {0}")]
    Malformed(String),
}

/// Decode a response body into an image, falling back to the secondary
/// decoder only when the primary reports an unrecognized format.
///
/// Zero-byte and non-image bodies fail here, never earlier.
pub fn decode_image(body: &[u8]) -> Result<DynamicImage, DecodeError> {
    match decode_primary(body) {
        Ok(image) => Ok(image),
        Err(DecodeError::Unsupported) => {
            tracing::debug!("primary decoder did not recognize the format, trying jpeg fallback");
            decode_fallback(body)
        }
        Err(e) => Err(e),
    }
}

fn decode_primary(body: &[u8]) -> Result<DynamicImage, DecodeError> {
    let reader = image::ImageReader::new(Cursor::new(body))
        .with_guessed_format()
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;
    if reader.format().is_none() {
        return Err(DecodeError::Unsupported);
    }
    reader.decode().map_err(classify)
}

fn classify(err: ImageError) -> DecodeError {
    match err {
        ImageError::Unsupported(_) => DecodeError::Unsupported,
        other => DecodeError::Malformed(other.to_string()),
    }
}

fn decode_fallback(body: &[u8]) -> Result<DynamicImage, DecodeError> {
    let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::RGB);
    let mut decoder = JpegDecoder::new_with_options(body, options);
    let pixels = decoder
        .decode()
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;
    let (width, height) = decoder
        .dimensions()
        .ok_or_else(|| DecodeError::Malformed("missing jpeg dimensions".into()))?;
    let image = RgbImage::from_raw(width as u32, height as u32, pixels)
        .ok_or_else(|| DecodeError::Malformed("jpeg pixel buffer size mismatch".into()))?;
    Ok(DynamicImage::ImageRgb8(image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([10, 20, 30]),
        ));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([10, 20, 30]),
        ));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Jpeg).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_decodes_png() {
        let image = decode_image(&png_bytes(8, 6)).unwrap();
        assert_eq!(image.width(), 8);
        assert_eq!(image.height(), 6);
    }

    #[test]
    fn test_decodes_jpeg() {
        let image = decode_image(&jpeg_bytes(8, 6)).unwrap();
        assert_eq!(image.width(), 8);
        assert_eq!(image.height(), 6);
    }

    #[test]
    fn test_zero_byte_body_fails_at_decode() {
        assert!(decode_image(&[]).is_err());
    }

    #[test]
    fn test_non_image_body_fails_at_decode() {
        assert!(decode_image(b"<html>404 not found</html>").is_err());
    }

    #[test]
    fn test_unknown_magic_classified_as_unsupported() {
        let err = decode_primary(b"\x00\x01\x02\x03 definitely not an image").unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported));
    }

    #[test]
    fn test_truncated_png_classified_as_malformed() {
        let mut bytes = png_bytes(16, 16);
        bytes.truncate(bytes.len() / 2);
        let err = decode_primary(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_fallback_accepts_jpeg() {
        let image = decode_fallback(&jpeg_bytes(4, 4)).unwrap();
        assert_eq!(image.width(), 4);
        assert_eq!(image.height(), 4);
    }

    #[test]
    fn test_fallback_rejects_garbage() {
        assert!(decode_fallback(b"not a jpeg").is_err());
    }
}
