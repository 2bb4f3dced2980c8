//! Text helpers shared by the extractor and the transformers.

use unicode_normalization::UnicodeNormalization;

/// Presentation-form ligatures and their expansions.
const LIGATURES: [(char, &str); 7] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

/// Check if a character is from a script that doesn't use word spaces.
///
/// Chinese and Japanese don't use spaces between words, but Korean does.
pub(crate) fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions A-F
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        // Hiragana, Katakana
        || (0x3040..=0x30FF).contains(&code)
        // CJK Symbols and Punctuation
        || (0x3000..=0x303F).contains(&code)
}

/// NFC-normalize, expand ligatures and drop U+FFFD.
pub(crate) fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfc() {
        if c == '\u{FFFD}' {
            continue;
        }
        match LIGATURES.iter().find(|(lig, _)| *lig == c) {
            Some((_, expansion)) => out.push_str(expansion),
            None => out.push(c),
        }
    }
    out
}

/// Join two pieces of text with a single space.
///
/// No space is inserted when either side already provides whitespace or
/// when both sides are in a spaceless script.
pub(crate) fn join_words(left: &str, right: &str) -> String {
    let (Some(last), Some(first)) = (left.chars().last(), right.chars().next()) else {
        return format!("{}{}", left, right);
    };
    if last.is_whitespace()
        || first.is_whitespace()
        || (is_spaceless_script_char(last) && is_spaceless_script_char(first))
    {
        format!("{}{}", left, right)
    } else {
        format!("{} {}", left, right)
    }
}

/// Join two lines of a paragraph.
///
/// A word hyphenated across the break ("infor-" + "mation") is rejoined
/// when the next line continues in lowercase. Hyphens elsewhere in either
/// line are left alone.
pub(crate) fn join_lines(upper: &str, lower: &str) -> String {
    let head = upper.trim_end();
    let tail = lower.trim_start();

    if let Some(stem) = head.strip_suffix('-') {
        let letter_before = stem.chars().last().is_some_and(char::is_alphabetic);
        let lowercase_after = tail.chars().next().is_some_and(char::is_lowercase);
        if letter_before && lowercase_after {
            return format!("{}{}", stem, tail);
        }
    }
    join_words(upper, lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ligatures() {
        assert_eq!(normalize("ﬁnding ﬂowers"), "finding flowers");
        assert_eq!(normalize("oﬃce"), "office");
    }

    #[test]
    fn test_normalize_nfc_and_replacement_char() {
        // "e" + combining acute accent composes to a single char
        assert_eq!(normalize("cafe\u{0301}"), "café");
        assert_eq!(normalize("Hello\u{FFFD}World"), "HelloWorld");
    }

    #[test]
    fn test_join_words() {
        assert_eq!(join_words("Hello", "world"), "Hello world");
        assert_eq!(join_words("Hello ", "world"), "Hello world");
        assert_eq!(join_words("", "world"), "world");
        assert_eq!(join_words("日本", "語"), "日本語");
        // Korean uses word spaces
        assert_eq!(join_words("반드시", "지키십시오"), "반드시 지키십시오");
    }

    #[test]
    fn test_join_lines_repairs_hyphenation() {
        assert_eq!(join_lines("infor-", "mation"), "information");
        assert_eq!(join_lines("infor- ", " mation"), "information");
        assert_eq!(join_lines("well-", "Known"), "well- Known");
        assert_eq!(join_lines("page 3 -", "next"), "page 3 - next");
    }

    #[test]
    fn test_join_lines_keeps_inline_hyphens() {
        assert_eq!(
            join_lines("Both pre- and post-processing apply", "to the data."),
            "Both pre- and post-processing apply to the data."
        );
    }

    #[test]
    fn test_spaceless_script() {
        assert!(is_spaceless_script_char('中'));
        assert!(is_spaceless_script_char('か'));
        assert!(!is_spaceless_script_char('한'));
        assert!(!is_spaceless_script_char('a'));
    }
}
