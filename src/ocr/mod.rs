//! OCR backend dispatch
//!
//! Two interchangeable engines sit behind [`OcrBackend`]: system tesseract
//! (rusty-tesseract) and PP-OCR (ocr-rs). The registry picks one at startup,
//! either by name or by falling back to the first engine that is available.

pub mod paddle;
pub mod tesseract;
pub mod text;

pub use paddle::PaddleBackend;
pub use tesseract::TesseractBackend;

use image::RgbaImage;
use std::time::Duration;

/// Fixed bound on a single recognition call
pub const OCR_TIMEOUT: Duration = Duration::from_secs(5);

/// An interchangeable OCR engine selected at startup
pub trait OcrBackend: Send + Sync {
    /// Stable name used for `--backend` selection
    fn name(&self) -> &'static str;

    /// Whether the engine can run on this system
    fn is_available(&self) -> bool;

    /// Recognize text in the image
    ///
    /// Language hints use tesseract-style codes ("eng", "chi_sim", ...);
    /// backends map them to whatever their engine understands.
    fn recognize(&self, image: &RgbaImage, languages: &[String]) -> anyhow::Result<String>;
}

/// All known backends, in default-preference order
pub fn backends() -> &'static [&'static dyn OcrBackend] {
    &[&TesseractBackend, &PaddleBackend]
}

/// Select a backend by name, or the first available one when no name is given
///
/// A named backend that is unknown or unavailable yields None rather than
/// silently falling back, so the caller can report it and exit.
pub fn select(preferred: Option<&str>) -> Option<&'static dyn OcrBackend> {
    select_from(backends(), preferred)
}

fn select_from<'a>(
    backends: &[&'a dyn OcrBackend],
    preferred: Option<&str>,
) -> Option<&'a dyn OcrBackend> {
    match preferred {
        Some(name) => backends
            .iter()
            .copied()
            .find(|b| b.name() == name)
            .filter(|b| b.is_available()),
        None => backends.iter().copied().find(|b| b.is_available()),
    }
}

/// Recognition progress for the overlay session
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OcrStatus {
    #[default]
    Idle,
    Running,
    Done(String),
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubBackend {
        name: &'static str,
        available: bool,
    }

    impl OcrBackend for StubBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn recognize(&self, _image: &RgbaImage, _languages: &[String]) -> anyhow::Result<String> {
            Ok(String::new())
        }
    }

    const ALPHA_DOWN: StubBackend = StubBackend {
        name: "alpha",
        available: false,
    };
    const BETA_UP: StubBackend = StubBackend {
        name: "beta",
        available: true,
    };

    #[test]
    fn test_select_first_available() {
        let list: &[&dyn OcrBackend] = &[&ALPHA_DOWN, &BETA_UP];
        let chosen = select_from(list, None).unwrap();
        assert_eq!(chosen.name(), "beta");
    }

    #[test]
    fn test_select_by_name() {
        let list: &[&dyn OcrBackend] = &[&ALPHA_DOWN, &BETA_UP];
        let chosen = select_from(list, Some("beta")).unwrap();
        assert_eq!(chosen.name(), "beta");
    }

    #[test]
    fn test_select_named_but_unavailable() {
        let list: &[&dyn OcrBackend] = &[&ALPHA_DOWN, &BETA_UP];
        assert!(select_from(list, Some("alpha")).is_none());
    }

    #[test]
    fn test_select_unknown_name() {
        let list: &[&dyn OcrBackend] = &[&ALPHA_DOWN, &BETA_UP];
        assert!(select_from(list, Some("gamma")).is_none());
    }

    #[test]
    fn test_select_none_available() {
        let gamma = StubBackend {
            name: "gamma",
            available: false,
        };
        let list: &[&dyn OcrBackend] = &[&ALPHA_DOWN, &gamma];
        assert!(select_from(list, None).is_none());
    }

    #[test]
    fn test_registry_names_are_distinct() {
        let names: Vec<_> = backends().iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["tesseract", "paddle"]);
    }
}
