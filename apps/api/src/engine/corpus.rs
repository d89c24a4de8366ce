//! Posting source reading.
//!
//! Sources are tabular CSV exports merged per career by the scraping
//! pipeline. A source is only usable when the three text columns the
//! vectorizer depends on are present; a source that lacks them, or cannot
//! be read at all, is skipped by the engine rather than failing the request.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::posting::PostingRecord;

/// Columns every posting source must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["skills", "description", "EURACE_skills"];

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("posting source {} is missing required columns: {missing}", path.display())]
    MissingColumns { path: PathBuf, missing: String },

    #[error("failed to read posting source {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: csv::Error,
    },
}

/// Reads all postings from one source, verifying the required header set
/// before any row is parsed.
pub fn read_postings(path: &Path) -> Result<Vec<PostingRecord>, SourceError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let headers = reader
        .headers()
        .map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(SourceError::MissingColumns {
            path: path.to_path_buf(),
            missing: missing.join(", "),
        });
    }

    reader
        .deserialize()
        .collect::<Result<Vec<PostingRecord>, csv::Error>>()
        .map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write_csv(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_postings_with_optional_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "ofertas.csv",
            "job_title,description,skills,EURACE_skills,url\n\
             Desarrollador Python,Backend con Django,\"python, sql\",liderazgo y equipo,https://example.com/1\n\
             ,,,,\n",
        );
        let postings = read_postings(&path).unwrap();
        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0].job_title.as_deref(), Some("Desarrollador Python"));
        assert_eq!(postings[0].skills.as_deref(), Some("python, sql"));
        // empty fields deserialize to None
        assert_eq!(postings[1].title_or_default(), "N/A");
        assert!(postings[1].description.is_none());
    }

    #[test]
    fn extra_columns_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "ofertas.csv",
            "job_title,company,description,skills,EURACE_skills,url,scraped_at\n\
             Analista,ACME,Datos,sql,gestion,https://example.com/2,2024-01-01\n",
        );
        let postings = read_postings(&path).unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].title_or_default(), "Analista");
    }

    #[test]
    fn missing_required_column_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "ofertas.csv",
            "job_title,description,skills,url\nDev,desc,python,https://example.com\n",
        );
        let err = read_postings(&path).unwrap_err();
        assert!(matches!(err, SourceError::MissingColumns { .. }));
        assert!(err.to_string().contains("EURACE_skills"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let err = read_postings(&dir.path().join("no_existe.csv")).unwrap_err();
        assert!(matches!(err, SourceError::Read { .. }));
    }
}
