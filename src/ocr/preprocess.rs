use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter;
use imageproc::morphology::{self, Mask};

/// Intensity above which a pixel counts as digit ink.
pub const DEFAULT_THRESHOLD: u8 = 200;

/// Normalized 3×3 Gaussian kernel.
const GAUSSIAN_3X3: [f32; 9] = [
    1.0 / 16.0,
    2.0 / 16.0,
    1.0 / 16.0,
    2.0 / 16.0,
    4.0 / 16.0,
    2.0 / 16.0,
    1.0 / 16.0,
    2.0 / 16.0,
    1.0 / 16.0,
];

/// Prepares a captured frame for digit OCR.
///
/// Steps, in order:
/// 1. Rotate 90° counter-clockwise (the camera is mounted sideways)
/// 2. Convert to grayscale
/// 3. 3×3 Gaussian blur against sensor noise
/// 4. Binary-inverse threshold: bright digits become black on white
/// 5. Upscale 2× with linear interpolation
/// 6. Morphological opening with a 3×3 square to remove speckles
pub fn preprocess_for_ocr(img: &DynamicImage, threshold: u8) -> GrayImage {
    let rotated = img.rotate270();
    let gray = rotated.to_luma8();
    let blurred = blur_3x3(&gray);
    let binary = threshold_inverse(&blurred, threshold);
    let upscaled = upscale_2x(&binary);
    open_3x3(&upscaled)
}

/// Gaussian blur; edge pixels reuse the nearest in-bounds neighbour.
pub fn blur_3x3(img: &GrayImage) -> GrayImage {
    filter::filter3x3::<Luma<u8>, f32, u8>(img, &GAUSSIAN_3X3)
}

/// Grayscale opening (min then max) over a 3×3 square.
pub fn open_3x3(img: &GrayImage) -> GrayImage {
    morphology::grayscale_open(img, &Mask::square(1))
}

/// Pixels brighter than `threshold` become 0, everything else 255.
pub fn threshold_inverse(img: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = GrayImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let value = if pixel[0] > threshold { 0u8 } else { 255u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// Doubles both dimensions using bilinear filtering.
pub fn upscale_2x(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    imageops::resize(img, width * 2, height * 2, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_threshold_inverse() {
        let mut img = GrayImage::new(3, 1);
        img.put_pixel(0, 0, Luma([100]));
        img.put_pixel(1, 0, Luma([250]));
        img.put_pixel(2, 0, Luma([200]));

        let result = threshold_inverse(&img, 200);

        assert_eq!(result.get_pixel(0, 0)[0], 255, "Dark pixel should become white");
        assert_eq!(result.get_pixel(1, 0)[0], 0, "Bright pixel should become black");
        assert_eq!(result.get_pixel(2, 0)[0], 255, "Cutoff is exclusive");
    }

    #[test]
    fn test_upscale_doubles_dimensions() {
        let img = GrayImage::new(7, 3);
        assert_eq!(upscale_2x(&img).dimensions(), (14, 6));
    }

    #[test]
    fn test_preprocess_rotates_and_upscales() {
        // 40 wide × 10 tall landscape frame becomes 20 × 80 after rotate + 2×
        let img = DynamicImage::ImageRgb8(RgbImage::new(40, 10));
        let out = preprocess_for_ocr(&img, DEFAULT_THRESHOLD);
        assert_eq!(out.dimensions(), (20, 80));
    }

    #[test]
    fn test_preprocess_rotation_is_counter_clockwise() {
        // A bright block in the top-right corner ends up top-left after a
        // counter-clockwise quarter turn.
        let img = RgbImage::from_fn(30, 20, |x, y| {
            if x >= 20 && y < 10 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let out = preprocess_for_ocr(&DynamicImage::ImageRgb8(img), DEFAULT_THRESHOLD);

        assert_eq!(out.dimensions(), (40, 60));
        assert_eq!(out.get_pixel(8, 8)[0], 0, "Bright block should be black ink");
        assert_eq!(out.get_pixel(35, 55)[0], 255, "Dark area should be white");
    }

    #[test]
    fn test_blur_keeps_edges() {
        let img = GrayImage::from_pixel(5, 4, Luma([255]));
        let blurred = blur_3x3(&img);
        assert!(blurred.pixels().all(|p| p[0] > 250));
    }

    #[test]
    fn test_preprocess_bright_frame_is_all_ink() {
        // Digits touching the frame edge must survive the blur
        let img = RgbImage::from_pixel(20, 10, Rgb([255, 255, 255]));
        let out = preprocess_for_ocr(&DynamicImage::ImageRgb8(img), DEFAULT_THRESHOLD);
        assert_eq!(out.dimensions(), (20, 40));
        assert!(out.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_opening_removes_isolated_speck() {
        // One dark pixel in a bright field blurs to ~191, which the inverse
        // threshold turns into a lone white speck inside the ink.
        let img = RgbImage::from_fn(21, 21, |x, y| {
            if x == 10 && y == 10 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let img = DynamicImage::ImageRgb8(img);

        let gray = img.rotate270().to_luma8();
        let upscaled = upscale_2x(&threshold_inverse(&blur_3x3(&gray), DEFAULT_THRESHOLD));
        assert!(upscaled.pixels().any(|p| p[0] >= 128), "speck should survive the threshold");

        let out = preprocess_for_ocr(&img, DEFAULT_THRESHOLD);
        assert!(out.pixels().all(|p| p[0] < 128), "opening should flatten the speck");
    }

    #[test]
    fn test_opening_keeps_stroke_width() {
        // 10×10 bright block: the 8×8 core passes the threshold and upscales
        // to a 16×16 area darker than mid-gray, which the opening must keep.
        let img = RgbImage::from_fn(40, 40, |x, y| {
            if (15..25).contains(&x) && (15..25).contains(&y) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let out = preprocess_for_ocr(&DynamicImage::ImageRgb8(img), DEFAULT_THRESHOLD);
        let ink = out.pixels().filter(|p| p[0] < 128).count();
        assert!(ink >= 16 * 16, "stroke shrank to {} pixels", ink);
    }

    #[test]
    fn test_preprocess_is_deterministic() {
        let img = RgbImage::from_fn(32, 16, |x, y| Rgb([((x * y) % 256) as u8, 200, 255]));
        let img = DynamicImage::ImageRgb8(img);
        assert_eq!(
            preprocess_for_ocr(&img, DEFAULT_THRESHOLD),
            preprocess_for_ocr(&img, DEFAULT_THRESHOLD)
        );
    }
}
