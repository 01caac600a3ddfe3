//! Captured frames and selection cropping
//!
//! This module consolidates:
//! - Screenshot image type (image.rs)
//! - Cropping the user's selection out of an output frame
//! - PNG encoding, including the debug screenshot

pub mod image;

pub use image::ScreenshotImage;

use crate::domain::Rect;
use ::image::RgbaImage;
use std::io;
use std::path::Path;

/// Fixed local filename the debug screenshot is written to
pub const DEBUG_SCREENSHOT_PATH: &str = "shot.png";

/// Crop the selection out of one output's frame.
///
/// `output_rect` and `selection` are in global logical coordinates; the frame
/// may be larger than the output's logical size on HiDPI outputs, so the
/// intersection is scaled into pixel coordinates before cropping.
///
/// Returns None when the selection does not overlap this output or the
/// overlap rounds down to zero pixels.
pub fn crop_selection(frame: &RgbaImage, output_rect: Rect, selection: Rect) -> Option<RgbaImage> {
    let intersection = selection.intersect(output_rect)?;
    let scale = frame.width() as f32 / output_rect.width() as f32;

    let x = ((intersection.left - output_rect.left) as f32 * scale) as u32;
    let y = ((intersection.top - output_rect.top) as f32 * scale) as u32;
    let w = (intersection.width() as f32 * scale) as u32;
    let h = (intersection.height() as f32 * scale) as u32;
    if w == 0 || h == 0 {
        return None;
    }

    Some(::image::imageops::crop_imm(frame, x, y, w, h).to_image())
}

pub fn write_png<W: io::Write>(w: W, image: &RgbaImage) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())
}

/// Write the cropped region to the fixed debug path in the working directory
pub fn write_debug_screenshot(image: &RgbaImage) -> anyhow::Result<()> {
    write_debug_screenshot_to(image, Path::new(DEBUG_SCREENSHOT_PATH))
}

fn write_debug_screenshot_to(image: &RgbaImage, path: &Path) -> anyhow::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_png(&mut file, image)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::Rgba;

    fn checker_frame(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 0, 255])
        })
    }

    #[test]
    fn test_crop_selection_inside_output() {
        let frame = checker_frame(100, 100);
        let output = Rect::new(0, 0, 100, 100);
        let selection = Rect::new(10, 20, 40, 50);

        let cropped = crop_selection(&frame, output, selection).unwrap();
        assert_eq!(cropped.dimensions(), (30, 30));
        assert_eq!(cropped.get_pixel(0, 0), &Rgba([10, 20, 0, 255]));
    }

    #[test]
    fn test_crop_selection_clamped_to_output() {
        let frame = checker_frame(100, 100);
        let output = Rect::new(0, 0, 100, 100);
        let selection = Rect::new(-50, -50, 30, 30);

        let cropped = crop_selection(&frame, output, selection).unwrap();
        assert_eq!(cropped.dimensions(), (30, 30));
        assert_eq!(cropped.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_crop_selection_outside_output() {
        let frame = checker_frame(100, 100);
        let output = Rect::new(0, 0, 100, 100);
        let selection = Rect::new(200, 200, 300, 300);

        assert!(crop_selection(&frame, output, selection).is_none());
    }

    #[test]
    fn test_crop_selection_hidpi_scale() {
        // 2x scale: 100 logical units backed by 200 pixels
        let frame = checker_frame(200, 200);
        let output = Rect::new(0, 0, 100, 100);
        let selection = Rect::new(10, 10, 60, 60);

        let cropped = crop_selection(&frame, output, selection).unwrap();
        assert_eq!(cropped.dimensions(), (100, 100));
        assert_eq!(cropped.get_pixel(0, 0), &Rgba([20, 20, 0, 255]));
    }

    #[test]
    fn test_crop_selection_second_output() {
        // Output positioned to the right of a 1920-wide primary
        let frame = checker_frame(100, 100);
        let output = Rect::new(1920, 0, 2020, 100);
        let selection = Rect::new(1930, 10, 1960, 40);

        let cropped = crop_selection(&frame, output, selection).unwrap();
        assert_eq!(cropped.dimensions(), (30, 30));
        assert_eq!(cropped.get_pixel(0, 0), &Rgba([10, 10, 0, 255]));
    }

    #[test]
    fn test_write_debug_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        let frame = checker_frame(8, 8);

        write_debug_screenshot_to(&frame, &path).unwrap();

        let decoded = ::image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (8, 8));
    }
}
