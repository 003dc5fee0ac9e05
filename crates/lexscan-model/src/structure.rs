use serde::{Deserialize, Serialize};

/// One article of a legal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub number: String,
    pub content: String,
}

/// Coarse skeleton derived once per document.
///
/// The mapper prefers these values over raw entity scanning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStructure {
    pub title: Option<String>,
    pub declared_type: Option<String>,
    pub declared_number: Option<String>,
    #[serde(default)]
    pub articles: Vec<Article>,
}

impl DocumentStructure {
    pub fn article(&self, number: &str) -> Option<&Article> {
        self.articles.iter().find(|article| article.number == number)
    }
}
