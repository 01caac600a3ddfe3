//! Command line flags

use clap::Parser;

/// Select a screen region, recognize its text, and copy it to the clipboard
#[derive(Parser, Debug, Default)]
#[command(name = "snaptext", version, about)]
pub struct Cli {
    /// Language hint(s) forwarded to the OCR backend,
    /// e.g. "eng", "chi_sim+eng" or "--lang chi_sim --lang eng"
    #[arg(long = "lang", value_name = "LANG")]
    pub lang: Vec<String>,

    /// OCR backend to use (see --list-backends); default is the first
    /// available backend
    #[arg(long, value_name = "NAME")]
    pub backend: Option<String>,

    /// List known OCR backends and whether they are available, then exit
    #[arg(long)]
    pub list_backends: bool,

    /// Write the cropped selection to shot.png before recognition
    #[arg(long)]
    pub debug_screenshot: bool,
}

impl Cli {
    /// Language hints split on the "+" and "," joiners tesseract users expect
    pub fn languages(&self) -> Vec<String> {
        self.lang
            .iter()
            .flat_map(|l| l.split(['+', ',']))
            .filter(|l| !l.is_empty())
            .map(|l| l.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::parse_from(["snaptext"]);
        assert!(cli.lang.is_empty());
        assert_eq!(cli.backend, None);
        assert!(!cli.list_backends);
        assert!(!cli.debug_screenshot);
    }

    #[test]
    fn test_parse_backend_and_lang() {
        let cli = Cli::parse_from(["snaptext", "--backend", "paddle", "--lang", "eng"]);
        assert_eq!(cli.backend.as_deref(), Some("paddle"));
        assert_eq!(cli.languages(), vec!["eng"]);
    }

    #[test]
    fn test_languages_split_on_plus() {
        let cli = Cli::parse_from(["snaptext", "--lang", "chi_sim+eng"]);
        assert_eq!(cli.languages(), vec!["chi_sim", "eng"]);
    }

    #[test]
    fn test_languages_repeated_flag() {
        let cli = Cli::parse_from(["snaptext", "--lang", "jpn", "--lang", "eng"]);
        assert_eq!(cli.languages(), vec!["jpn", "eng"]);
    }

    #[test]
    fn test_languages_comma_separated() {
        let cli = Cli::parse_from(["snaptext", "--lang", "kor,eng"]);
        assert_eq!(cli.languages(), vec!["kor", "eng"]);
    }
}
