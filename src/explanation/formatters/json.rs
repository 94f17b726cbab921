use crate::engine::RecommendationResult;
use serde_json;

/// JSON formatter for recommendation results
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format result as pretty-printed JSON
    pub fn format(result: &RecommendationResult) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(result)
    }

    /// Format result as compact JSON (no whitespace)
    pub fn format_compact(result: &RecommendationResult) -> Result<String, serde_json::Error> {
        serde_json::to_string(result)
    }
}
