//! Text keys used for name and keyword comparison.

/// Lowercase, strip French diacritics, unify Arabic hamza carriers and
/// collapse separators and whitespace into single spaces.
pub fn normalize_key(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars().flat_map(char::to_lowercase) {
        match ch {
            'à' | 'â' | 'ä' | 'á' => out.push('a'),
            'é' | 'è' | 'ê' | 'ë' => out.push('e'),
            'î' | 'ï' | 'í' => out.push('i'),
            'ô' | 'ö' | 'ó' => out.push('o'),
            'ù' | 'û' | 'ü' | 'ú' => out.push('u'),
            'ç' => out.push('c'),
            'œ' => out.push_str("oe"),
            'æ' => out.push_str("ae"),
            'أ' | 'إ' | 'آ' => out.push('ا'),
            '_' | '-' | '.' | '/' | '\\' | '\'' | '’' | ',' => out.push(' '),
            other => out.push(other),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape a literal phrase for a regex alternation; inner spaces match any whitespace run.
pub(crate) fn phrase_pattern(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

/// Alternation of phrases, longest first so the leftmost-first engine prefers them.
pub(crate) fn alternation<'a>(phrases: impl IntoIterator<Item = &'a str>) -> String {
    let mut phrases: Vec<&str> = phrases
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    phrases.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    phrases.dedup();
    phrases
        .into_iter()
        .map(phrase_pattern)
        .collect::<Vec<_>>()
        .join("|")
}
