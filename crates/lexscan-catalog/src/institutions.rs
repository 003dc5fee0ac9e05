//! Known issuing institutions and fuzzy resolution against them.

use rapidfuzz::distance::jaro_winkler;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::text::normalize_key;

/// Score given when a raw value starts with a full known name followed by more words.
const PREFIX_SCORE: f32 = 0.97;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Institution {
    pub canonical: String,
    pub aliases: Vec<String>,
    pub arabic: Option<String>,
}

impl Institution {
    /// Canonical name, aliases, then the Arabic name.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .chain(self.arabic.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct InstitutionRow {
    canonical: String,
    #[serde(default)]
    aliases: String,
    #[serde(default)]
    arabic: String,
}

#[derive(Debug, Clone, Copy)]
pub struct InstitutionMatch<'a> {
    pub institution: &'a Institution,
    pub score: f32,
}

#[derive(Debug, Clone, Default)]
pub struct InstitutionList {
    entries: Vec<Institution>,
    keys: Vec<Vec<String>>,
}

impl InstitutionList {
    pub fn new(entries: Vec<Institution>) -> Self {
        let keys = entries
            .iter()
            .map(|entry| {
                entry
                    .names()
                    .map(normalize_key)
                    .filter(|key| !key.is_empty())
                    .collect()
            })
            .collect();
        Self { entries, keys }
    }

    /// Parse `canonical,aliases,arabic` rows; aliases are separated by `|`.
    pub fn parse_csv(source: &str, origin: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(source.as_bytes());
        let mut entries = Vec::new();
        for row in reader.deserialize::<InstitutionRow>() {
            let row = row.map_err(|source| CatalogError::Csv {
                origin: origin.to_string(),
                source,
            })?;
            let canonical = row.canonical.trim();
            if canonical.is_empty() {
                return Err(CatalogError::invalid(format!(
                    "{origin}: institution row without a canonical name"
                )));
            }
            entries.push(Institution {
                canonical: canonical.to_string(),
                aliases: row
                    .aliases
                    .split('|')
                    .map(str::trim)
                    .filter(|alias| !alias.is_empty())
                    .map(str::to_string)
                    .collect(),
                arabic: Some(row.arabic.trim())
                    .filter(|name| !name.is_empty())
                    .map(str::to_string),
            });
        }
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Institution> {
        self.entries.iter()
    }

    /// Best known institution for a raw entity value.
    ///
    /// Exact key match scores 1.0, a known name followed by extra words scores
    /// 0.97, anything else is scored by Jaro-Winkler similarity. Ties keep the
    /// earlier entry. Callers apply their own threshold.
    pub fn resolve(&self, raw: &str) -> Option<InstitutionMatch<'_>> {
        let key = normalize_key(raw);
        if key.is_empty() {
            return None;
        }
        let mut best: Option<(usize, f32)> = None;
        for (idx, names) in self.keys.iter().enumerate() {
            for name in names {
                let score = score_key(&key, name);
                if best.is_none_or(|(_, top)| score > top) {
                    best = Some((idx, score));
                }
            }
        }
        best.map(|(idx, score)| InstitutionMatch {
            institution: &self.entries[idx],
            score,
        })
    }

    /// Institution whose name or alias occurs earliest in `text` as whole words.
    pub fn find_in_text(&self, text: &str) -> Option<&Institution> {
        let haystack = format!(" {} ", normalize_key(text));
        let mut best: Option<(usize, usize)> = None;
        for (idx, names) in self.keys.iter().enumerate() {
            for name in names {
                let needle = format!(" {name} ");
                if let Some(pos) = haystack.find(&needle)
                    && best.is_none_or(|(_, top)| pos < top)
                {
                    best = Some((idx, pos));
                }
            }
        }
        best.map(|(idx, _)| &self.entries[idx])
    }
}

fn score_key(key: &str, name: &str) -> f32 {
    if key == name {
        1.0
    } else if key
        .strip_prefix(name)
        .is_some_and(|rest| rest.starts_with(' '))
    {
        PREFIX_SCORE
    } else {
        jaro_winkler::similarity(key.chars(), name.chars()) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedded::INSTITUTIONS_CSV;

    fn list() -> InstitutionList {
        InstitutionList::parse_csv(INSTITUTIONS_CSV, "embedded").unwrap()
    }

    #[test]
    fn parses_aliases_and_quoted_names() {
        let list = list();
        let labour = list
            .iter()
            .find(|i| i.canonical.starts_with("Ministère du Travail"))
            .unwrap();
        assert_eq!(
            labour.canonical,
            "Ministère du Travail, de l'Emploi et de la Sécurité sociale"
        );
        let justice = list
            .iter()
            .find(|i| i.canonical == "Ministère de la Justice")
            .unwrap();
        assert_eq!(justice.aliases, vec!["ministre de la justice", "garde des sceaux"]);
        assert_eq!(justice.arabic.as_deref(), Some("وزارة العدل"));
    }

    #[test]
    fn resolve_scores_exact_prefix_and_fuzzy() {
        let list = list();
        let exact = list.resolve("MINISTRE DES FINANCES").unwrap();
        assert_eq!(exact.institution.canonical, "Ministère des Finances");
        assert_eq!(exact.score, 1.0);

        let prefix = list.resolve("Premier ministre et chef du gouvernement").unwrap();
        assert_eq!(prefix.institution.canonical, "Premier ministère");
        assert_eq!(prefix.score, PREFIX_SCORE);

        let fuzzy = list.resolve("Ministere des Finaces").unwrap();
        assert_eq!(fuzzy.institution.canonical, "Ministère des Finances");
        assert!(fuzzy.score > 0.9 && fuzzy.score < 1.0);
    }

    #[test]
    fn find_in_text_prefers_earliest_whole_word_occurrence() {
        let list = list();
        let text = "Sur le rapport du ministre de la santé,\nLe Premier ministre,";
        assert_eq!(
            list.find_in_text(text).map(|i| i.canonical.as_str()),
            Some("Ministère de la Santé")
        );
        assert!(list.find_in_text("APNEE du sommeil").is_none());
    }
}
