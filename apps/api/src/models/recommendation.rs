use serde::Serialize;

/// One ranked recommendation row. Wire names match what the frontend has
/// always consumed, so the Spanish field names are kept via renames.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub rank: usize,
    #[serde(rename = "similitud")]
    pub similarity: f64,
    #[serde(rename = "cargo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    pub eurace_skills: String,
    pub skills: String,
    pub url: String,
    pub cosine_similarity: f64,
    pub cosine_angle_deg: f64,
    #[serde(rename = "explicacion_ai", skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}
