//! Cleanup for model replies and transcripts before they are spoken or
//! classified.

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Default cap on spoken reply length, in characters.
pub const DEFAULT_MAX_REPLY_CHARS: usize = 500;

const MARKDOWN_MARKERS: [&str; 8] = ["**", "__", "##", "```", "`", "*", "_", "#"];
const SENTENCE_END: [char; 5] = ['.', '!', '?', ';', ':'];

struct Patterns {
    bangs: Regex,
    questions: Regex,
    dashes: Regex,
    equals: Regex,
}

fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(Patterns {
                bangs: Regex::new(r"!{2,}").ok()?,
                questions: Regex::new(r"\?{2,}").ok()?,
                dashes: Regex::new(r"-{3,}").ok()?,
                equals: Regex::new(r"={3,}").ok()?,
            })
        })
        .as_ref()
}

/// Zero-width and bidi formatting characters that survive `is_control`.
fn is_format_char(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{061C}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
    )
}

/// Whitespace becomes a plain space; other control and format characters
/// are dropped.
fn strip_control(text: &str) -> String {
    text.chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some(' ')
            } else if c.is_control() || is_format_char(c) {
                None
            } else {
                Some(c)
            }
        })
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn clean_special_chars(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut out: String = text.nfc().collect();
    for marker in MARKDOWN_MARKERS {
        out = out.replace(marker, "");
    }
    out = strip_control(&out);
    if let Some(p) = patterns() {
        out = p.bangs.replace_all(&out, "!").into_owned();
        out = p.questions.replace_all(&out, "?").into_owned();
        out = p.dashes.replace_all(&out, "--").into_owned();
        out = p.equals.replace_all(&out, "==").into_owned();
    }
    collapse_whitespace(&out)
}

/// Shorten `text` to at most `max_chars` characters (plus a trailing
/// "..." when cut mid-sentence).
///
/// Prefers ending at a sentence terminator that lies past 70% of the limit;
/// otherwise cuts at the last space, otherwise hard-cuts.
pub fn limit_length(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    let truncated = truncated.trim();
    let chars: Vec<char> = truncated.chars().collect();

    let min_pos = max_chars as f64 * 0.7;
    if let Some(pos) = chars.iter().rposition(|c| SENTENCE_END.contains(c)) {
        if pos as f64 > min_pos {
            return chars[..=pos].iter().collect::<String>().trim().to_string();
        }
    }

    if let Some(space) = chars.iter().rposition(|c| *c == ' ') {
        if space > 0 {
            let head: String = chars[..space].iter().collect();
            return format!("{}...", head.trim_end());
        }
    }
    format!("{truncated}...")
}

/// Clean then limit, ready for speech synthesis.
pub fn process_reply(text: &str, max_chars: usize) -> String {
    limit_length(&clean_special_chars(text), max_chars)
}

pub fn sanitize_user_input(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let composed: String = text.nfc().collect();
    collapse_whitespace(&strip_control(&composed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_markers() {
        assert_eq!(
            clean_special_chars("Xin chào! **Đây là thử nghiệm** với __, ##tags###"),
            "Xin chào! Đây là thử nghiệm với , tags"
        );
        assert_eq!(clean_special_chars("`code` _x_"), "code x");
    }

    #[test]
    fn collapses_repeated_punctuation() {
        assert_eq!(clean_special_chars("Hay quá!!!! Thật???"), "Hay quá! Thật?");
        assert_eq!(clean_special_chars("a ----- b ==== c"), "a -- b == c");
        assert_eq!(clean_special_chars("a -- b"), "a -- b");
    }

    #[test]
    fn removes_control_and_format_chars() {
        assert_eq!(clean_special_chars("xin\u{200B}chào\u{0007}"), "xinchào");
        assert_eq!(clean_special_chars("dòng một\n\n  dòng\thai "), "dòng một dòng hai");
        assert_eq!(clean_special_chars(""), "");
    }

    #[test]
    fn decomposed_input_is_composed() {
        let nfd = "Ba\u{0309}o o\u{031B}i,  tie\u{0302}\u{0301}n le\u{0302}n";
        assert_eq!(sanitize_user_input(nfd), "Bảo ơi, tiến lên");
        assert_eq!(clean_special_chars("**Đu\u{031B}o\u{031B}\u{0323}c**"), "Được");
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(limit_length("ngắn gọn", 500), "ngắn gọn");
        assert_eq!(limit_length("", 10), "");
    }

    #[test]
    fn cuts_at_late_sentence_end() {
        let text = "Đây là một câu khá dài. Câu thứ hai còn dài hơn nữa đấy";
        // '.' sits at index 22, past 70% of 30
        assert_eq!(limit_length(text, 30), "Đây là một câu khá dài.");
    }

    #[test]
    fn early_sentence_end_falls_back_to_space() {
        let text = "Xin chào. Hôm nay trời đẹp và nắng vàng rực rỡ";
        assert_eq!(limit_length(text, 30), "Xin chào. Hôm nay trời đẹp...");
    }

    #[test]
    fn hard_cut_without_spaces() {
        assert_eq!(limit_length("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "ừ ừ ừ ừ ừ ừ";
        let out = limit_length(text, 5);
        assert_eq!(out, "ừ ừ...");
    }

    #[test]
    fn process_reply_cleans_before_limiting() {
        assert_eq!(
            process_reply("**Hello** world!!!?? `code` here ___underline___", 50),
            "Hello world!? code here underline"
        );
    }

    #[test]
    fn sanitize_keeps_markdown_but_drops_controls() {
        assert_eq!(sanitize_user_input("  tiến\tlên **3** bước\r\n"), "tiến lên **3** bước");
        assert_eq!(sanitize_user_input(""), "");
    }
}
