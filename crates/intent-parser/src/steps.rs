//! Repeat-count extraction ("3 bước", "2 steps")

use regex::Regex;
use std::sync::OnceLock;

const STEP_PATTERN: &str = r"(?i)([0-9]+)\s*(?:bước|steps?)\b";

fn step_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(STEP_PATTERN).ok()).as_ref()
}

/// Number of times to repeat the command. Defaults to 1 when the utterance
/// carries no usable count.
pub fn extract_steps(text: &str) -> u32 {
    step_pattern()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|&n| n >= 1)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_compiles() {
        assert!(step_pattern().is_some());
    }

    #[test]
    fn reads_vietnamese_step_count() {
        assert_eq!(extract_steps("tiến lên 3 bước"), 3);
        assert_eq!(extract_steps("lùi lại 12bước"), 12);
        assert_eq!(extract_steps("TIẾN LÊN 4 BƯỚC"), 4);
    }

    #[test]
    fn reads_english_step_count() {
        assert_eq!(extract_steps("forward 2 steps"), 2);
        assert_eq!(extract_steps("go 1 step"), 1);
    }

    #[test]
    fn defaults_to_one() {
        assert_eq!(extract_steps("đi thẳng"), 1);
        assert_eq!(extract_steps(""), 1);
        assert_eq!(extract_steps("rẽ trái 3"), 1);
        assert_eq!(extract_steps("5 stepsister"), 1);
    }

    #[test]
    fn zero_and_overflow_fall_back_to_one() {
        assert_eq!(extract_steps("tiến lên 0 bước"), 1);
        assert_eq!(extract_steps("tiến lên 99999999999999999999 bước"), 1);
    }

    #[test]
    fn first_count_wins() {
        assert_eq!(extract_steps("tiến 2 bước rồi lùi 5 bước"), 2);
    }
}
