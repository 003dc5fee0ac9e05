use serde::{Deserialize, Serialize};

/// Completed output of the external text-recognition engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrOutput {
    pub text: String,
    /// Recognition confidence (0.0 to 1.0); a data-quality signal only.
    pub confidence: f32,
    #[serde(default)]
    pub page_count: Option<u32>,
}

impl OcrOutput {
    pub fn is_low_confidence(&self, threshold: f32) -> bool {
        self.confidence < threshold
    }
}
