//! Resolve human-readable language names to the codes the service expects

use isolang::Language;

use crate::core::errors::{Result, TranslationError};

/// Names and codes the service uses that have no plain ISO 639-1 form
const ALIASES: &[(&str, &str)] = &[
    ("chinese", "zh-cn"),
    ("chinese (simplified)", "zh-cn"),
    ("chinese (traditional)", "zh-tw"),
    ("zh-cn", "zh-cn"),
    ("zh-tw", "zh-tw"),
    ("greek", "el"),
    ("filipino", "tl"),
];

/// Languages offered by the `languages` command, in display order
pub const COMMON_LANGUAGES: &[&str] = &[
    "en", "ko", "ja", "zh-cn", "zh-tw", "de", "fr", "es", "it", "pt", "ru", "pl", "uk", "cs",
    "tr", "nl", "sv", "fi", "hu", "ro", "vi", "th", "id",
];

/// Resolve a code or English language name to a service code
pub fn resolve_language(input: &str) -> Result<String> {
    let normalized = input.trim().to_lowercase();

    if let Some((_, code)) = ALIASES.iter().find(|(name, _)| *name == normalized) {
        return Ok(code.to_string());
    }

    if normalized.len() == 2 && Language::from_639_1(&normalized).is_some() {
        return Ok(normalized);
    }

    Language::from_name(&capitalize(&normalized))
        .or_else(|| Language::from_name(input.trim()))
        .and_then(|lang| lang.to_639_1())
        .map(|code| code.to_string())
        .ok_or_else(|| TranslationError::UnknownLanguage {
            name: input.to_string(),
        })
}

/// English display name for a service code
pub fn language_name(code: &str) -> Option<String> {
    match code {
        "zh-cn" => Some("Chinese (Simplified)".to_string()),
        "zh-tw" => Some("Chinese (Traditional)".to_string()),
        _ => Language::from_639_1(code).map(|lang| lang.to_name().to_string()),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
