use serde::Deserialize;

/// One job posting as it appears in a scraped source CSV. Every field is
/// optional; the sources are merged scrapes and frequently sparse. Columns
/// beyond these are ignored on read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostingRecord {
    pub job_title: Option<String>,
    pub description: Option<String>,
    pub skills: Option<String>,
    #[serde(rename = "EURACE_skills")]
    pub eurace_skills: Option<String>,
    pub url: Option<String>,
}

impl PostingRecord {
    /// Title used for display and for case-sensitive deduplication.
    pub fn title_or_default(&self) -> &str {
        self.job_title.as_deref().filter(|t| !t.is_empty()).unwrap_or("N/A")
    }

    /// Lower-cased skills + description text fed to the vectorizer.
    pub fn vectorization_text(&self) -> String {
        let skills = self.skills.as_deref().unwrap_or("");
        let description = self.description.as_deref().unwrap_or("");
        format!("{skills} {description}").to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_falls_back_for_missing_or_empty() {
        let record = PostingRecord::default();
        assert_eq!(record.title_or_default(), "N/A");
        let record = PostingRecord {
            job_title: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(record.title_or_default(), "N/A");
        let record = PostingRecord {
            job_title: Some("Data Engineer".into()),
            ..Default::default()
        };
        assert_eq!(record.title_or_default(), "Data Engineer");
    }

    #[test]
    fn vectorization_text_joins_and_lowercases() {
        let record = PostingRecord {
            skills: Some("Python, SQL".into()),
            description: Some("Backend EN LA NUBE".into()),
            ..Default::default()
        };
        assert_eq!(record.vectorization_text(), "python, sql backend en la nube");
    }
}
