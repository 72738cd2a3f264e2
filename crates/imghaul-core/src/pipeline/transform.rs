//! Resizing and transparency flattening.

use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};

/// Downscale (never upscale) so both dimensions fit within `max`,
/// preserving aspect ratio. Images already within bounds pass through
/// unchanged.
pub fn shrink_to_fit(image: DynamicImage, max: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    if width <= max && height <= max {
        return image;
    }
    image.resize(max, max, FilterType::Lanczos3)
}

/// Composite the image over an opaque white background, producing a fully
/// opaque RGB image. JPEG has no alpha channel, so anything transparent
/// must be resolved to a concrete color before encoding.
pub fn flatten(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut flat = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u32;
        if alpha == 0 {
            continue;
        }
        if alpha == 255 {
            flat.put_pixel(x, y, Rgb([pixel[0], pixel[1], pixel[2]]));
            continue;
        }
        let blend = |c: u8| -> u8 {
            ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        flat.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }
    flat
}
