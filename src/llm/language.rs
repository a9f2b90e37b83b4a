//! Page-language detection for prompt localization. The generated copy
//! should come back in the language of the source page, so the prompt
//! carries an explicit instruction derived from the fetched text.

use whatlang::{detect, Lang};

/// Detect the dominant language of the text. Short or ambiguous input
/// defaults to English rather than guessing.
pub fn detect_language(text: &str) -> Lang {
    if text.trim().chars().count() < 10 {
        return Lang::Eng;
    }
    match detect(text) {
        Some(info) if info.is_reliable() => info.lang(),
        _ => Lang::Eng,
    }
}

/// Prompt instruction for the detected language. Languages outside the
/// supported set fall back to English.
pub fn language_instruction(lang: Lang) -> &'static str {
    match lang {
        Lang::Eng => "Write in English.",
        Lang::Deu => "Write in German (Deutsch).",
        Lang::Fra => "Write in French (Français).",
        Lang::Spa => "Write in Spanish (Español).",
        Lang::Ita => "Write in Italian (Italiano).",
        Lang::Por => "Write in Portuguese (Português).",
        Lang::Nld => "Write in Dutch (Nederlands).",
        Lang::Pol => "Write in Polish (Polski).",
        Lang::Rus => "Write in Russian (Русский).",
        Lang::Jpn => "Write in Japanese (日本語).",
        Lang::Kor => "Write in Korean (한국어).",
        Lang::Cmn => "Write in Chinese (中文).",
        Lang::Ara => "Write in Arabic (العربية).",
        Lang::Hin => "Write in Hindi (हिन्दी).",
        Lang::Tur => "Write in Turkish (Türkçe).",
        Lang::Swe => "Write in Swedish (Svenska).",
        Lang::Dan => "Write in Danish (Dansk).",
        Lang::Nob => "Write in Norwegian (Norsk).",
        Lang::Fin => "Write in Finnish (Suomi).",
        _ => "Write in English.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GERMAN: &str = "Unsere Laufschuhe sind für jedes Gelände geeignet. \
        Die gepolsterte Sohle und das wasserdichte Obermaterial sorgen für \
        Komfort auf langen Strecken. Kostenloser Versand für alle Bestellungen \
        innerhalb Deutschlands.";

    #[test]
    fn test_short_text_defaults_to_english() {
        assert_eq!(detect_language(""), Lang::Eng);
        assert_eq!(detect_language("ok"), Lang::Eng);
    }

    #[test]
    fn test_detects_german_page_text() {
        assert_eq!(detect_language(GERMAN), Lang::Deu);
        assert_eq!(
            language_instruction(detect_language(GERMAN)),
            "Write in German (Deutsch)."
        );
    }

    #[test]
    fn test_unsupported_language_falls_back_to_english() {
        assert_eq!(language_instruction(Lang::Epo), "Write in English.");
    }
}
