//! System tesseract backend via rusty-tesseract

use std::collections::HashMap;

use anyhow::anyhow;
use image::RgbaImage;
use rusty_tesseract::{Args, Image};

use super::OcrBackend;

pub struct TesseractBackend;

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        // Probes the tesseract binary, same check the original wrapper used
        rusty_tesseract::get_tesseract_version().is_ok()
    }

    fn recognize(&self, image: &RgbaImage, languages: &[String]) -> anyhow::Result<String> {
        log::info!(
            "Running OCR with tesseract on {}x{} image",
            image.width(),
            image.height()
        );

        let dynamic_img = image::DynamicImage::ImageRgba8(image.clone());

        // Tesseract works best with text that's at least 10-12 pixels tall,
        // so small selections are upscaled before recognition.
        let min_dimension = image.width().min(image.height());
        let factor = upscale_factor(min_dimension);
        let processed_img = if factor > 1 {
            let new_width = image.width() * factor;
            let new_height = image.height() * factor;
            log::info!("Upscaling small image {factor}x to {new_width}x{new_height}");
            dynamic_img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
        } else {
            dynamic_img
        };

        let tess_img = Image::from_dynamic_image(&processed_img)
            .map_err(|e| anyhow!("Failed to create tesseract image: {e}"))?;

        let dpi = if min_dimension < 200 { 300 } else { 150 };
        let args = Args {
            lang: join_languages(languages),
            config_variables: HashMap::new(),
            dpi: Some(dpi),
            psm: Some(11), // Fully automatic page segmentation
            oem: Some(3),  // Default OCR Engine Mode
        };

        let text = rusty_tesseract::image_to_string(&tess_img, &args)
            .map_err(|e| anyhow!("Tesseract OCR failed: {e}"))?;
        Ok(text.trim().to_string())
    }
}

/// Upscaling factor applied before recognition, by smallest selection side
fn upscale_factor(min_dimension: u32) -> u32 {
    if min_dimension < 100 {
        4
    } else if min_dimension < 200 {
        2
    } else {
        1
    }
}

/// Tesseract takes "+"-joined language codes, e.g. "chi_sim+eng"
fn join_languages(languages: &[String]) -> String {
    if languages.is_empty() {
        "eng".to_string()
    } else {
        languages.join("+")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_languages_defaults_to_english() {
        assert_eq!(join_languages(&[]), "eng");
    }

    #[test]
    fn test_join_languages_plus_separated() {
        let langs = vec!["chi_sim".to_string(), "eng".to_string()];
        assert_eq!(join_languages(&langs), "chi_sim+eng");
    }

    #[test]
    fn test_upscale_factor_thresholds() {
        assert_eq!(upscale_factor(50), 4);
        assert_eq!(upscale_factor(99), 4);
        assert_eq!(upscale_factor(100), 2);
        assert_eq!(upscale_factor(199), 2);
        assert_eq!(upscale_factor(200), 1);
        assert_eq!(upscale_factor(1080), 1);
    }
}
