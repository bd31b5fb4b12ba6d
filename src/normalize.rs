use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Leading tokens dropped from person names ("The Spider", "El Cucuy").
const NAME_ARTICLES: &[&str] = &["the", "el", "la", "le"];

/// Normalize a person name into a comparison key.
///
/// Transformations applied, in order:
/// 1. Replace special characters that don't decompose via NFKD (ł, đ, ø, æ, ß)
/// 2. NFKD decomposition so accented letters split into base + combining marks
/// 3. Strip combining diacritical marks
/// 4. Convert to lowercase
/// 5. Drop leading article tokens
/// 6. Keep only `[a-z0-9]` and whitespace, collapse and trim whitespace
///
/// Total over any input (empty in, empty out) and idempotent.
pub fn normalize_name(name: &str) -> String {
    let mut key = strip_diacritics(name)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ");

    // Strip to a fixed point so re-normalizing a key is a no-op
    loop {
        match strip_leading_article(&key) {
            Some(rest) => key = rest,
            None => return key,
        }
    }
}

/// Normalize an event name into a comparison key.
///
/// Event names keep their article tokens ("The Ultimate Fighter Finale");
/// only separators and periods are folded.
pub fn normalize_event_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| match c {
            ':' | '-' | '\u{2013}' | '\u{2014}' => ' ',
            other => other,
        })
        .filter(|c| *c != '.')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Remove accents while preserving case, spacing and punctuation.
///
/// Produces an ASCII-safe display form ("Błachowicz" -> "Blachowicz");
/// not a comparison key.
pub fn strip_diacritics(s: &str) -> String {
    replace_special_chars(s)
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Replace letters that NFKD does not decompose into base + mark.
fn replace_special_chars(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            // Polish
            'ł' => out.push('l'),
            'Ł' => out.push('L'),
            // Croatian/Serbian
            'đ' => out.push('d'),
            'Đ' => out.push('D'),
            // Nordic
            'ø' => out.push('o'),
            'Ø' => out.push('O'),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("Ae"),
            // German
            'ß' => out.push_str("ss"),
            'ẞ' => out.push_str("SS"),
            other => out.push(other),
        }
    }
    out
}

fn strip_leading_article(key: &str) -> Option<String> {
    for article in NAME_ARTICLES {
        if let Some(rest) = key.strip_prefix(article) {
            if let Some(stripped) = rest.strip_prefix(' ') {
                return Some(stripped.to_string());
            }
        }
    }
    None
}
