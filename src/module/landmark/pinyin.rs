//! Phonetic key derivation for landmark names
//!
//! Han characters are mapped to their pinyin reading (lowercase, tone
//! stripped); everything else passes through unchanged. Characters with
//! multiple readings use only the first listed one, a documented lossy
//! simplification: disambiguation would need per-word context the records
//! do not carry.

use pinyin::ToPinyin;

/// Convert a display name into its phonetic search key.
///
/// Total function: input that cannot be transliterated is returned verbatim,
/// so the caller can always substring-match against the result.
pub fn to_phonetic_key(text: &str) -> String {
    let mut key = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch.to_pinyin() {
            Some(reading) => key.push_str(reading.plain()),
            None => key.push(ch),
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_han_name_to_pinyin() {
        assert_eq!(to_phonetic_key("青鸟居"), "qingniaoju");
    }

    #[test]
    fn test_non_han_passes_through() {
        assert_eq!(to_phonetic_key("Spawn-01"), "Spawn-01");
    }

    #[test]
    fn test_mixed_input() {
        assert_eq!(to_phonetic_key("雾桥West"), "wuqiaoWest");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(to_phonetic_key(""), "");
    }

    #[test]
    fn test_tone_is_stripped() {
        // 后土 reads hòutǔ; the key carries no tone marks.
        assert_eq!(to_phonetic_key("后土"), "houtu");
    }
}
