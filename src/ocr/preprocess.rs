use image::{GrayImage, Luma, RgbaImage};

use crate::sorter::config::{CropRegion, PreprocessSettings};

/// 3x3 sharpen kernel, row-major, divided by its sum.
const SHARPEN_KERNEL: [f32; 9] = [-2.0, -2.0, -2.0, -2.0, 32.0, -2.0, -2.0, -2.0, -2.0];
const SHARPEN_SCALE: f32 = 16.0;

/// Crops a sub-region from an image using absolute pixel coordinates.
///
/// The rectangle is clamped to the image bounds, so a region hanging off the
/// edge yields only the overlapping pixels (possibly none).
pub fn crop_region(img: &RgbaImage, region: &CropRegion) -> RgbaImage {
    let (w, h) = img.dimensions();

    let x0 = region.left.min(w);
    let y0 = region.top.min(h);
    let x1 = region.right.min(w).max(x0);
    let y1 = region.bottom.min(h).max(y0);

    image::imageops::crop_imm(img, x0, y0, x1 - x0, y1 - y0).to_image()
}

/// Scales each pixel's distance from the mean luminance by `factor`.
pub fn enhance_contrast(img: &GrayImage, factor: f32) -> GrayImage {
    let pixel_count = img.width() as u64 * img.height() as u64;
    if pixel_count == 0 {
        return img.clone();
    }

    let sum: u64 = img.pixels().map(|p| p[0] as u64).sum();
    let mean = (sum as f32 / pixel_count as f32).round();

    let mut output = img.clone();
    for pixel in output.pixels_mut() {
        let value = mean + factor * (pixel[0] as f32 - mean);
        pixel[0] = value.round().clamp(0.0, 255.0) as u8;
    }
    output
}

/// Applies a 3x3 sharpen filter. The one-pixel border is copied unchanged.
pub fn sharpen(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = img.clone();
    if width < 3 || height < 3 {
        return output;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut sum = 0.0f32;
            for (i, weight) in SHARPEN_KERNEL.iter().enumerate() {
                let nx = x + (i as u32 % 3) - 1;
                let ny = y + (i as u32 / 3) - 1;
                sum += weight * img.get_pixel(nx, ny)[0] as f32;
            }
            let value = (sum / SHARPEN_SCALE).round().clamp(0.0, 255.0) as u8;
            output.put_pixel(x, y, Luma([value]));
        }
    }

    output
}

/// Converts a grayscale image to pure black and white.
///
/// Pixels strictly brighter than `threshold` become white (255), all others black (0).
pub fn binarize(img: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = GrayImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let value = if pixel[0] > threshold { 255u8 } else { 0u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// Full recipe run on every image (or crop) before recognition:
/// grayscale → contrast boost → sharpen → binarize.
pub fn prepare_for_ocr(img: &RgbaImage, settings: &PreprocessSettings) -> GrayImage {
    let gray = image::imageops::grayscale(img);
    let contrasted = enhance_contrast(&gray, settings.contrast_factor);
    let sharpened = sharpen(&contrasted);
    binarize(&sharpened, settings.binarize_threshold)
}
