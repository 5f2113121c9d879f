//! Placeholder protection and XML escaping around a translation call
//!
//! Bracketed tokens such as `[PAWN_nameDef]` are grammar symbols the game
//! resolves at runtime. They are swapped for a neutral marker before the text
//! leaves the process and put back, in order, once the translation returns.

use regex::Regex;
use std::sync::OnceLock;

/// Marker substituted for each placeholder while the text is being translated
pub const MARKER: &str = "{}";

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[.*?\]").expect("placeholder pattern is valid"))
}

fn entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(?:#[xX]([0-9a-fA-F]+)|#([0-9]+)|(lt|gt|apos|quot|amp));")
            .expect("entity pattern is valid")
    })
}

/// Text with its placeholders swapped out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protected {
    /// Text with every placeholder replaced by [`MARKER`]
    pub clean_text: String,
    /// Extracted placeholders in order of appearance
    pub placeholders: Vec<String>,
}

/// Result of putting placeholders back into translated text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restored {
    /// Translated text with placeholders put back
    pub text: String,
    /// Placeholders that found a marker
    pub substituted: usize,
    /// Placeholders extracted by [`protect`]
    pub expected: usize,
    /// Markers still present after every placeholder was placed
    pub leftover_markers: usize,
}

impl Restored {
    /// True when the translator dropped or invented markers
    pub fn is_mismatch(&self) -> bool {
        self.substituted != self.expected || self.leftover_markers > 0
    }
}

/// Replace every `[...]` token with [`MARKER`], remembering the tokens in order
pub fn protect(text: &str) -> Protected {
    let re = placeholder_regex();
    let placeholders = re
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();
    let clean_text = re.replace_all(text, MARKER).into_owned();

    Protected {
        clean_text,
        placeholders,
    }
}

/// Put placeholders back into `translated`, one per marker, left to right
///
/// Extra markers are left as they are and extra placeholders are dropped;
/// the returned counts let the caller report the mismatch.
pub fn restore(translated: &str, placeholders: &[String]) -> Restored {
    let mut text = String::with_capacity(translated.len());
    let mut rest = translated;
    let mut substituted = 0;

    for placeholder in placeholders {
        let Some(pos) = rest.find(MARKER) else {
            break;
        };
        text.push_str(&rest[..pos]);
        text.push_str(placeholder);
        rest = &rest[pos + MARKER.len()..];
        substituted += 1;
    }

    let leftover_markers = rest.matches(MARKER).count();
    text.push_str(rest);

    Restored {
        text,
        substituted,
        expected: placeholders.len(),
        leftover_markers,
    }
}

/// Escape XML metacharacters, `&` first so produced entities stay intact
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
        .replace('"', "&quot;")
}

/// Decode the five predefined entities and numeric character references
///
/// Decoding is a single pass, so `&amp;lt;` and `&#38;#10;` come out as the
/// literal text `&lt;` and `&#10;`. References that do not name a valid
/// `char` are left as they are.
pub fn unescape_xml(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    entity_regex()
        .replace_all(text, |caps: &regex::Captures| {
            let decoded = if let Some(hex) = caps.get(1) {
                u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = caps.get(2) {
                dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match caps.get(3).map(|m| m.as_str()) {
                    Some("lt") => Some('<'),
                    Some("gt") => Some('>'),
                    Some("apos") => Some('\''),
                    Some("quot") => Some('"'),
                    Some("amp") => Some('&'),
                    _ => None,
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
