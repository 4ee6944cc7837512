//! Kana classification and hiragana → katakana conversion.

/// Distance between a hiragana code point and its katakana counterpart.
pub const KATAKANA_OFFSET: u32 = 0x60;

pub fn is_katakana(c: char) -> bool {
    // Small Kana Extension covers the archaic small ヰ/ヱ/ヲ/ン.
    matches!(c as u32, 0x30A1..=0x30FF | 0x1B132..=0x1B167)
}

pub fn is_hiragana(c: char) -> bool {
    matches!(c as u32, 0x3041..=0x3096)
}

/// Non-empty and made only of katakana.
pub fn is_pure_katakana(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_katakana)
}

/// Non-empty and made only of hiragana.
pub fn is_pure_hiragana(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_hiragana)
}

/// Shift every hiragana character into the katakana block. Anything else is
/// passed through unchanged.
pub fn hiragana_to_katakana(s: &str) -> String {
    s.chars()
        .map(|c| {
            if is_hiragana(c) {
                char::from_u32(c as u32 + KATAKANA_OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// A reading written in kana, normalized to katakana. `None` for mixed or
/// non-kana text.
pub fn to_katakana_reading(s: &str) -> Option<String> {
    if is_pure_katakana(s) {
        Some(s.to_string())
    } else if is_pure_hiragana(s) {
        Some(hiragana_to_katakana(s))
    } else {
        None
    }
}
