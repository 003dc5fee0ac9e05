/// Thresholds used by the field mapper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapperOptions {
    /// Minimum similarity for an institution entity to map to a known institution.
    pub institution_similarity: f32,
    /// Minimum length (characters) of a paragraph used as description.
    pub description_min_chars: usize,
    /// Minimum similarity for a below-threshold institution to be suggested.
    pub suggestion_min_similarity: f32,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            institution_similarity: 0.88,
            description_min_chars: 80,
            suggestion_min_similarity: 0.6,
        }
    }
}
