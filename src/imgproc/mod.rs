//! Pixel-level operations backing the cleaning pipeline.
//!
//! Brightness measurement is used as an exposure proxy when filtering, and
//! the enhancement pass rewrites accepted images with brightness/contrast
//! scaling plus an optional fixed-kernel sharpen.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, GrayImage, ImageError, RgbImage};

/// 3x3 sharpening convolution, normalized to a kernel sum of 1.
const SHARPEN_KERNEL: [f32; 9] = [
    -2.0 / 16.0,
    -2.0 / 16.0,
    -2.0 / 16.0,
    -2.0 / 16.0,
    32.0 / 16.0,
    -2.0 / 16.0,
    -2.0 / 16.0,
    -2.0 / 16.0,
    -2.0 / 16.0,
];

const JPEG_QUALITY: u8 = 95;

/// Enhancement parameters. Factors of 1.0 are no-ops.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnhanceOptions {
    /// Multiplier on perceived brightness (>1.0 = brighter).
    pub brightness_factor: f32,
    /// Multiplier on contrast around the image's gray mean (>1.0 = more contrast).
    pub contrast_factor: f32,
    /// Apply the fixed sharpening convolution after the scalar adjustments.
    pub sharpen: bool,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            brightness_factor: 1.1,
            contrast_factor: 1.1,
            sharpen: true,
        }
    }
}

/// Mean luminance of the image at `path` on the 0-255 scale.
pub fn mean_luminance(path: &Path) -> Result<f64, ImageError> {
    let gray = image::open(path)?.to_luma8();
    Ok(gray_mean(&gray))
}

fn gray_mean(gray: &GrayImage) -> f64 {
    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return 0.0;
    }
    let sum: u64 = pixels.iter().map(|&p| u64::from(p)).sum();
    sum as f64 / pixels.len() as f64
}

/// Decode `input`, apply the enhancement pass, and encode the result to
/// `output`. JPEG outputs are written at quality 95; other formats use the
/// codec's defaults.
pub fn enhance_image(
    input: &Path,
    output: &Path,
    opts: &EnhanceOptions,
) -> Result<(), ImageError> {
    let mut rgb = image::open(input)?.to_rgb8();

    if opts.brightness_factor != 1.0 {
        scale_brightness(&mut rgb, opts.brightness_factor);
    }
    if opts.contrast_factor != 1.0 {
        scale_contrast(&mut rgb, opts.contrast_factor);
    }
    if opts.sharpen {
        rgb = imageops::filter3x3(&rgb, &SHARPEN_KERNEL);
    }

    encode(&rgb, output)
}

/// Multiply every channel by `factor`, saturating at the channel bounds.
fn scale_brightness(rgb: &mut RgbImage, factor: f32) {
    for pixel in rgb.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = (f32::from(*channel) * factor).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Interpolate every channel away from the image's gray mean by `factor`.
fn scale_contrast(rgb: &mut RgbImage, factor: f32) {
    let mean = rgb_gray_mean(rgb).round();
    for pixel in rgb.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            let value = mean + factor * (f32::from(*channel) - mean);
            *channel = value.round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Rec. 601 luma mean of an RGB buffer.
fn rgb_gray_mean(rgb: &RgbImage) -> f32 {
    let mut sum = 0.0f64;
    let mut count = 0u64;
    for pixel in rgb.pixels() {
        let [r, g, b] = pixel.0;
        sum += 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    (sum / count as f64) as f32
}

fn encode(rgb: &RgbImage, output: &Path) -> Result<(), ImageError> {
    let is_jpeg = output
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false);

    if is_jpeg {
        let file = File::create(output)?;
        let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY);
        encoder.encode_image(rgb)?;
        Ok(())
    } else {
        rgb.save(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid_rgb(width: u32, height: u32, level: u8) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([level, level, level]))
    }

    #[test]
    fn mean_luminance_of_solid_png() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("gray.png");
        solid_rgb(8, 8, 128).save(&path).expect("write png");

        let mean = mean_luminance(&path).expect("mean");
        assert!((mean - 128.0).abs() < 1.0, "mean was {mean}");
    }

    #[test]
    fn mean_luminance_fails_on_undecodable_bytes() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").expect("write bytes");

        assert!(mean_luminance(&path).is_err());
    }

    #[test]
    fn brightness_scaling_multiplies_and_saturates() {
        let mut rgb = solid_rgb(4, 4, 100);
        scale_brightness(&mut rgb, 1.5);
        assert_eq!(rgb.get_pixel(0, 0).0, [150, 150, 150]);

        let mut bright = solid_rgb(4, 4, 200);
        scale_brightness(&mut bright, 2.0);
        assert_eq!(bright.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn contrast_scaling_spreads_values_around_the_mean() {
        // Half 100, half 200; mean 150. Factor 2 pushes the halves apart.
        let mut rgb = solid_rgb(2, 2, 100);
        rgb.put_pixel(0, 0, Rgb([200, 200, 200]));
        rgb.put_pixel(1, 0, Rgb([200, 200, 200]));

        scale_contrast(&mut rgb, 2.0);
        assert_eq!(rgb.get_pixel(0, 0).0, [250, 250, 250]);
        assert_eq!(rgb.get_pixel(0, 1).0, [50, 50, 50]);
    }

    #[test]
    fn unit_factors_leave_pixels_untouched() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let input = temp.path().join("in.png");
        let output = temp.path().join("out.png");
        solid_rgb(6, 6, 90).save(&input).expect("write input");

        let opts = EnhanceOptions {
            brightness_factor: 1.0,
            contrast_factor: 1.0,
            sharpen: false,
        };
        enhance_image(&input, &output, &opts).expect("enhance");

        let out = image::open(&output).expect("reopen").to_rgb8();
        assert_eq!(out.get_pixel(3, 3).0, [90, 90, 90]);
    }

    #[test]
    fn enhance_writes_a_decodable_image_of_the_same_size() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let input = temp.path().join("in.jpg");
        let output = temp.path().join("out.jpg");
        solid_rgb(10, 6, 120).save(&input).expect("write input");

        enhance_image(&input, &output, &EnhanceOptions::default()).expect("enhance");

        let out = image::open(&output).expect("reopen");
        assert_eq!((out.width(), out.height()), (10, 6));
    }

    #[test]
    fn enhance_fails_on_undecodable_input() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let input = temp.path().join("broken.jpg");
        let output = temp.path().join("out.jpg");
        std::fs::write(&input, b"garbage").expect("write bytes");

        let err = enhance_image(&input, &output, &EnhanceOptions::default());
        assert!(err.is_err());
        assert!(!output.exists());
    }
}
