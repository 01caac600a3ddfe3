//! Normalization of recognized text
//!
//! Engines disagree about inter-glyph whitespace in scripts that do not use
//! it; tesseract in particular inserts spaces between CJK glyphs. The final
//! text is normalized once here, after whichever backend ran.

/// Language hints whose scripts do not separate words with spaces
const CJK_HINTS: &[&str] = &[
    "chi_sim",
    "chi_sim_vert",
    "chi_tra",
    "chi_tra_vert",
    "jpn",
    "jpn_vert",
    "kor",
    "kor_vert",
];

/// Whether a language hint names a CJK script
pub fn is_cjk_hint(lang: &str) -> bool {
    CJK_HINTS.contains(&lang)
}

/// Trim the engine output and strip spaces for CJK language hints
pub fn normalize(text: &str, languages: &[String]) -> String {
    let text = text.trim();
    if languages.iter().any(|l| is_cjk_hint(l)) {
        text.replace(' ', "")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langs(hints: &[&str]) -> Vec<String> {
        hints.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_trims() {
        assert_eq!(normalize("  hello world \n", &langs(&["eng"])), "hello world");
    }

    #[test]
    fn test_normalize_keeps_spaces_for_latin() {
        assert_eq!(normalize("hello world", &langs(&["eng"])), "hello world");
        assert_eq!(normalize("hello world", &[]), "hello world");
    }

    #[test]
    fn test_normalize_strips_spaces_for_chinese() {
        assert_eq!(normalize("你 好 世 界", &langs(&["chi_sim"])), "你好世界");
        assert_eq!(normalize("你 好", &langs(&["chi_tra"])), "你好");
    }

    #[test]
    fn test_normalize_strips_spaces_for_mixed_hints() {
        // Any CJK hint in the set triggers stripping, as the original did
        // for "chi_sim+eng".
        assert_eq!(
            normalize("中 文 text", &langs(&["chi_sim", "eng"])),
            "中文text"
        );
    }

    #[test]
    fn test_normalize_keeps_newlines() {
        assert_eq!(normalize("第一\n第二", &langs(&["jpn"])), "第一\n第二");
    }
}
