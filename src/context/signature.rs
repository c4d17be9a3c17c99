//! Signature normalization ahead of structural matching

use crate::indexer::SourceLanguage;

/// Normalize a user-supplied function signature.
///
/// Strips a leading visibility modifier (restricted forms such as
/// `pub(in crate::a)` included), drops everything from the first `{`, and
/// leaves exactly one trailing `;`. Normalizing twice is a no-op.
pub fn normalize_signature(signature: &str, language: SourceLanguage) -> String {
    let mut text = signature.trim();
    if let Some(idx) = text.find('{') {
        text = &text[..idx];
    }
    let mut text = strip_visibility(text.trim(), language);
    text = text.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    format!("{};", text)
}

fn strip_visibility(text: &str, language: SourceLanguage) -> &str {
    if language == SourceLanguage::Rust
        && let Some(rest) = text.strip_prefix("pub")
        && rest.trim_start().starts_with('(')
    {
        let rest = rest.trim_start();
        if let Some(close) = rest.find(')') {
            return rest[close + 1..].trim_start();
        }
    }
    for modifier in language.visibility_modifiers() {
        if let Some(rest) = text.strip_prefix(modifier)
            && rest
                .chars()
                .next()
                .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
        {
            return rest.trim_start();
        }
    }
    text
}
