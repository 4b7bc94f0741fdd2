//! Wake-phrase matching on transcripts.
//!
//! Transcripts of a short wake window are noisy, so matching is done on an
//! accent-folded, lowercased form: "Bảo ơi", "bao oi" and "BẢO ƠI!" all fold
//! to the same keywords.

use unicode_normalization::UnicodeNormalization;

/// Lowercase and strip Vietnamese diacritics (`đ` becomes `d`). Input is
/// NFC-composed first so decomposed transcripts fold the same way.
pub fn fold_vietnamese(text: &str) -> String {
    text.nfc()
        .collect::<String>()
        .to_lowercase()
        .chars()
        .map(fold_char)
        .collect()
}

fn fold_char(c: char) -> char {
    match c {
        'à' | 'á' | 'ạ' | 'ả' | 'ã' | 'â' | 'ầ' | 'ấ' | 'ậ' | 'ẩ' | 'ẫ' | 'ă' | 'ằ' | 'ắ'
        | 'ặ' | 'ẳ' | 'ẵ' => 'a',
        'è' | 'é' | 'ẹ' | 'ẻ' | 'ẽ' | 'ê' | 'ề' | 'ế' | 'ệ' | 'ể' | 'ễ' => 'e',
        'ì' | 'í' | 'ị' | 'ỉ' | 'ĩ' => 'i',
        'ò' | 'ó' | 'ọ' | 'ỏ' | 'õ' | 'ô' | 'ồ' | 'ố' | 'ộ' | 'ổ' | 'ỗ' | 'ơ' | 'ờ' | 'ớ'
        | 'ợ' | 'ở' | 'ỡ' => 'o',
        'ù' | 'ú' | 'ụ' | 'ủ' | 'ũ' | 'ư' | 'ừ' | 'ứ' | 'ự' | 'ử' | 'ữ' => 'u',
        'ỳ' | 'ý' | 'ỵ' | 'ỷ' | 'ỹ' => 'y',
        'đ' => 'd',
        other => other,
    }
}

#[derive(Debug, Clone)]
pub struct WakeWordDetector {
    phrase: String,
    keywords: Vec<String>,
}

impl WakeWordDetector {
    pub fn new(phrase: &str) -> Self {
        let keywords = fold_vietnamese(phrase)
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_owned)
            .collect();
        Self {
            phrase: phrase.trim().to_owned(),
            keywords,
        }
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// True when every keyword appears somewhere in the folded transcript.
    /// A phrase without keywords never fires.
    pub fn detect(&self, transcript: &str) -> bool {
        if self.keywords.is_empty() || transcript.trim().is_empty() {
            return false;
        }
        let folded = fold_vietnamese(transcript);
        self.keywords.iter().all(|k| folded.contains(k.as_str()))
    }
}

impl Default for WakeWordDetector {
    fn default() -> Self {
        Self::new("Bảo ơi")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_diacritics() {
        assert_eq!(fold_vietnamese("Bảo ơi"), "bao oi");
        assert_eq!(fold_vietnamese("ĐƯỜNG ĐI"), "duong di");
        assert_eq!(fold_vietnamese("tiến lên"), "tien len");
    }

    #[test]
    fn default_phrase_keywords() {
        let d = WakeWordDetector::default();
        assert_eq!(d.keywords(), ["bao", "oi"]);
        assert_eq!(d.phrase(), "Bảo ơi");
    }

    #[test]
    fn detects_accented_and_plain_variants() {
        let d = WakeWordDetector::default();
        assert!(d.detect("Bảo ơi"));
        assert!(d.detect("bao oi"));
        assert!(d.detect("  BẢO ƠI, giúp tôi với"));
        assert!(d.detect("ơi Bảo"));
    }

    #[test]
    fn decomposed_transcript_still_wakes() {
        let d = WakeWordDetector::default();
        assert_eq!(fold_vietnamese("Ba\u{0309}o o\u{031B}i"), "bao oi");
        assert!(d.detect("Ba\u{0309}o o\u{031B}i"));
    }

    #[test]
    fn needs_every_keyword() {
        let d = WakeWordDetector::default();
        assert!(!d.detect("Bảo"));
        assert!(!d.detect("xin chào"));
        assert!(!d.detect(""));
    }

    #[test]
    fn empty_phrase_never_fires() {
        let d = WakeWordDetector::new("  !! ");
        assert!(d.keywords().is_empty());
        assert!(!d.detect("bảo ơi"));
    }
}
