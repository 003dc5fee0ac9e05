//! Script-based language detection.

use lexscan_model::Language;

/// Share of Arabic-script letters from which a text counts as Arabic.
pub const ARABIC_SHARE_THRESHOLD: f32 = 0.30;

/// Classify a text by the script of its letters.
///
/// At least 30% Arabic letters gives Arabic, otherwise any Latin letter gives
/// French; a text without letters is unknown.
pub fn detect_language(text: &str) -> Language {
    let mut letters = 0usize;
    let mut arabic = 0usize;
    let mut latin = 0usize;
    for ch in text.chars().filter(|ch| ch.is_alphabetic()) {
        letters += 1;
        if is_arabic(ch) {
            arabic += 1;
        } else if is_latin(ch) {
            latin += 1;
        }
    }
    if letters == 0 {
        return Language::Unknown;
    }
    if arabic as f32 / letters as f32 >= ARABIC_SHARE_THRESHOLD {
        Language::Arabic
    } else if latin > 0 {
        Language::French
    } else {
        Language::Unknown
    }
}

fn is_arabic(ch: char) -> bool {
    matches!(ch,
        '\u{0600}'..='\u{06FF}'
        | '\u{0750}'..='\u{077F}'
        | '\u{08A0}'..='\u{08FF}'
        | '\u{FB50}'..='\u{FDFF}'
        | '\u{FE70}'..='\u{FEFF}')
}

fn is_latin(ch: char) -> bool {
    ch.is_ascii_alphabetic() || matches!(ch, '\u{00C0}'..='\u{024F}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn french_text() {
        assert_eq!(
            detect_language("Décret exécutif n° 23-145 du 12 mars 2023"),
            Language::French
        );
    }

    #[test]
    fn arabic_text() {
        assert_eq!(
            detect_language("مرسوم تنفيذي رقم 23-145 مؤرخ في 12 مارس سنة 2023"),
            Language::Arabic
        );
    }

    #[test]
    fn mixed_text_uses_the_arabic_share() {
        // 4 Arabic letters out of 10
        assert_eq!(detect_language("abcdef قرار"), Language::Arabic);
        // 4 Arabic letters out of 14
        assert_eq!(detect_language("abcdefghij قرار"), Language::French);
    }

    #[test]
    fn text_without_letters_is_unknown() {
        assert_eq!(detect_language("23-145 / 2023"), Language::Unknown);
        assert_eq!(detect_language(""), Language::Unknown);
        assert_eq!(detect_language("Ωμέγα"), Language::Unknown);
    }
}
