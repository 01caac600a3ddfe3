//! PP-OCR backend via ocr-rs
//!
//! Models are not bundled; they live under the user data directory
//! (`~/.local/share/snaptext/models`). The detection model is shared, the
//! recognition model and charset are picked per script family from the
//! language hints.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use image::RgbaImage;
use ocr_rs::OcrEngine;

use super::OcrBackend;

pub struct PaddleBackend;

/// Detection model shared by all languages
const DET_MODEL: &str = "PP-OCRv5_mobile_det.mnn";

/// Recognition model and charset for one script family
struct RecModel {
    /// Tesseract-style language hints this model covers
    hints: &'static [&'static str],
    rec_model: &'static str,
    charset_file: &'static str,
}

// The v5 mobile model covers Chinese, Japanese and English in one charset;
// it doubles as the fallback when no hint matches.
const REC_MODELS: &[RecModel] = &[
    RecModel {
        hints: &["chi_sim", "chi_sim_vert", "chi_tra", "chi_tra_vert", "jpn", "jpn_vert", "eng"],
        rec_model: "PP-OCRv5_mobile_rec.mnn",
        charset_file: "ppocr_keys_v5.txt",
    },
    RecModel {
        hints: &["kor", "kor_vert"],
        rec_model: "korean_PP-OCRv5_mobile_rec_infer.mnn",
        charset_file: "ppocr_keys_korean.txt",
    },
    RecModel {
        hints: &["ara", "fas", "urd"],
        rec_model: "arabic_PP-OCRv5_mobile_rec_infer.mnn",
        charset_file: "ppocr_keys_arabic.txt",
    },
    RecModel {
        hints: &["rus", "ukr", "bel", "bul", "srp"],
        rec_model: "cyrillic_PP-OCRv5_mobile_rec_infer.mnn",
        charset_file: "ppocr_keys_cyrillic.txt",
    },
    RecModel {
        hints: &["hin", "mar", "nep", "san"],
        rec_model: "devanagari_PP-OCRv5_mobile_rec_infer.mnn",
        charset_file: "ppocr_keys_devanagari.txt",
    },
    RecModel {
        hints: &["fra", "deu", "spa", "ita", "por", "nld", "pol", "vie"],
        rec_model: "latin_PP-OCRv5_mobile_rec_infer.mnn",
        charset_file: "ppocr_keys_latin.txt",
    },
];

/// Vertical distance within which two boxes count as the same text line
const LINE_HEIGHT_THRESHOLD: i32 = 20;

impl OcrBackend for PaddleBackend {
    fn name(&self) -> &'static str {
        "paddle"
    }

    fn is_available(&self) -> bool {
        models_dir().is_some_and(|dir| dir.join(DET_MODEL).exists())
    }

    fn recognize(&self, image: &RgbaImage, languages: &[String]) -> Result<String> {
        let dir = models_dir().ok_or_else(|| anyhow!("No user data directory"))?;
        let (det_path, rec_path, charset_path) = model_paths(&dir, languages)?;

        log::info!(
            "Running OCR with PP-OCR ({}) on {}x{} image",
            rec_path.display(),
            image.width(),
            image.height()
        );

        let engine = OcrEngine::new(&det_path, &rec_path, &charset_path, None)
            .map_err(|e| anyhow!("Failed to create OCR engine: {e}"))?;

        let img = image::DynamicImage::ImageRgba8(image.clone());
        let results = engine
            .recognize(&img)
            .map_err(|e| anyhow!("PP-OCR recognition failed: {e}"))?;

        let boxes: Vec<(i32, i32, String)> = results
            .into_iter()
            .filter(|r| !r.text.trim().is_empty())
            .map(|r| {
                (
                    r.bbox.rect.left(),
                    r.bbox.rect.top(),
                    r.text.trim().to_string(),
                )
            })
            .collect();

        Ok(join_lines(boxes))
    }
}

/// Where the model files are expected
fn models_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("snaptext").join("models"))
}

/// Resolve detection, recognition and charset paths for the language hints
fn model_paths(models_dir: &Path, languages: &[String]) -> Result<(PathBuf, PathBuf, PathBuf)> {
    let det_path = models_dir.join(DET_MODEL);
    if !det_path.exists() {
        return Err(anyhow!(
            "Detection model missing: {}",
            det_path.display()
        ));
    }

    let model = rec_model_for(languages);
    if let Some(unmatched) = languages
        .iter()
        .find(|l| !model.hints.contains(&l.as_str()))
    {
        log::warn!("No PP-OCR recognition model for language hint {unmatched}, using {}", model.rec_model);
    }

    let rec_path = models_dir.join(model.rec_model);
    let charset_path = models_dir.join(model.charset_file);
    if !rec_path.exists() {
        return Err(anyhow!("Recognition model missing: {}", rec_path.display()));
    }
    if !charset_path.exists() {
        return Err(anyhow!("Charset file missing: {}", charset_path.display()));
    }

    Ok((det_path, rec_path, charset_path))
}

/// Pick the recognition model whose script family covers the first matching hint
fn rec_model_for(languages: &[String]) -> &'static RecModel {
    languages
        .iter()
        .find_map(|lang| {
            REC_MODELS
                .iter()
                .find(|m| m.hints.contains(&lang.as_str()))
        })
        .unwrap_or(&REC_MODELS[0])
}

/// Group detected boxes into text lines and join them top to bottom
///
/// Boxes within LINE_HEIGHT_THRESHOLD of a line's first box belong to that
/// line; lines are joined with newlines, boxes within a line with spaces.
fn join_lines(mut boxes: Vec<(i32, i32, String)>) -> String {
    boxes.sort_by_key(|(_, y, _)| *y);

    let mut lines: Vec<Vec<(i32, i32, String)>> = Vec::new();
    for b in boxes {
        match lines
            .iter_mut()
            .find(|line| (b.1 - line[0].1).abs() <= LINE_HEIGHT_THRESHOLD)
        {
            Some(line) => line.push(b),
            None => lines.push(vec![b]),
        }
    }

    lines
        .iter_mut()
        .map(|line| {
            line.sort_by_key(|(x, _, _)| *x);
            line.iter()
                .map(|(_, _, text)| text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints(langs: &[&str]) -> Vec<String> {
        langs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rec_model_for_korean() {
        let model = rec_model_for(&hints(&["kor"]));
        assert_eq!(model.rec_model, "korean_PP-OCRv5_mobile_rec_infer.mnn");
    }

    #[test]
    fn test_rec_model_falls_back_to_default() {
        assert_eq!(rec_model_for(&[]).rec_model, "PP-OCRv5_mobile_rec.mnn");
        assert_eq!(
            rec_model_for(&hints(&["xyz"])).rec_model,
            "PP-OCRv5_mobile_rec.mnn"
        );
    }

    #[test]
    fn test_rec_model_first_matching_hint_wins() {
        let model = rec_model_for(&hints(&["xyz", "rus"]));
        assert_eq!(model.rec_model, "cyrillic_PP-OCRv5_mobile_rec_infer.mnn");
    }

    #[test]
    fn test_join_lines_orders_reading_direction() {
        let boxes = vec![
            (120, 52, "world".to_string()),
            (10, 50, "hello".to_string()),
            (10, 110, "below".to_string()),
        ];
        assert_eq!(join_lines(boxes), "hello world\nbelow");
    }

    #[test]
    fn test_join_lines_empty() {
        assert_eq!(join_lines(Vec::new()), "");
    }

    #[test]
    fn test_model_paths_missing_detection_model() {
        let dir = tempfile::tempdir().unwrap();
        let err = model_paths(dir.path(), &[]).unwrap_err();
        assert!(err.to_string().contains("Detection model missing"));
    }

    #[test]
    fn test_model_paths_with_models_present() {
        let dir = tempfile::tempdir().unwrap();
        for name in [DET_MODEL, "PP-OCRv5_mobile_rec.mnn", "ppocr_keys_v5.txt"] {
            std::fs::write(dir.path().join(name), b"stub").unwrap();
        }
        let (det, rec, charset) = model_paths(dir.path(), &hints(&["eng"])).unwrap();
        assert!(det.ends_with(DET_MODEL));
        assert!(rec.ends_with("PP-OCRv5_mobile_rec.mnn"));
        assert!(charset.ends_with("ppocr_keys_v5.txt"));
    }
}
