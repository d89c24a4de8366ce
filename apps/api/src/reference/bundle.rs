//! Reference bundle loading.
//!
//! The offline processing pipeline serializes the skill vocabulary, the
//! 69-group skill mapping and the academic profile matrix into a single JSON
//! bundle (`datos_procesados.json`, matrix in pandas `orient="split"`
//! layout). This module resolves the bundle through an ordered list of
//! candidate locations and validates it structurally before anything else in
//! the process is allowed to serve traffic.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::{AcademicProfileMatrix, ReferenceData};

pub const BUNDLE_FILE_NAME: &str = "datos_procesados.json";

/// Git LFS pointer files are short text files with this prefix. Deployments
/// that clone without `git lfs pull` end up with one in place of the real
/// bundle; serving would silently produce garbage, so it is a fatal error.
const LFS_POINTER_PREFIX: &[u8] = b"version https://git-lfs.github.com/spec/v1";

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("reference bundle not found; tried: {tried}")]
    NotFound { tried: String },

    #[error(
        "{} is a Git LFS pointer, not the bundle itself; \
         run `git lfs install && git lfs pull` to fetch the real file",
        path.display()
    )]
    LfsPointer { path: PathBuf },

    #[error("failed to read reference bundle {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse reference bundle {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid reference bundle: {0}")]
    Invalid(String),
}

/// Ordered candidate locations for the bundle: explicit override first, then
/// the configured data directory, then the working directory and its parent.
#[derive(Debug, Clone, Default)]
pub struct BundleLocator {
    pub explicit: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

impl BundleLocator {
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(path) = &self.explicit {
            candidates.push(path.clone());
        }
        if let Some(dir) = &self.data_dir {
            candidates.push(dir.join(BUNDLE_FILE_NAME));
        }
        candidates.push(PathBuf::from(BUNDLE_FILE_NAME));
        candidates.push(Path::new("..").join(BUNDLE_FILE_NAME));
        candidates
    }

    fn resolve(&self) -> Result<PathBuf, BundleError> {
        let candidates = self.candidates();
        candidates
            .iter()
            .find(|p| p.exists())
            .cloned()
            .ok_or_else(|| BundleError::NotFound {
                tried: candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

#[derive(Debug, Deserialize)]
struct BundleFile {
    habilidades: Vec<String>,
    grupos_bge_ngram: IndexMap<String, Vec<String>>,
    tfidf_epn_69d: MatrixFile,
}

/// pandas `DataFrame.to_json(orient="split")`: row labels in `index`,
/// career names in `columns`, weights row-major in `data`.
#[derive(Debug, Deserialize)]
struct MatrixFile {
    columns: Vec<String>,
    index: Vec<String>,
    data: Vec<Vec<f64>>,
}

/// Resolves, reads and validates the bundle. Any failure here means the
/// process must not begin serving.
pub fn load(locator: &BundleLocator) -> Result<ReferenceData, BundleError> {
    let path = locator.resolve()?;
    let bytes = fs::read(&path).map_err(|source| BundleError::Io {
        path: path.clone(),
        source,
    })?;
    if bytes.starts_with(LFS_POINTER_PREFIX) {
        return Err(BundleError::LfsPointer { path });
    }

    let file: BundleFile =
        serde_json::from_slice(&bytes).map_err(|source| BundleError::Parse {
            path: path.clone(),
            source,
        })?;

    // The matrix row order is defined by the group-mapping key order; a
    // bundle where they disagree would silently scramble every dimension.
    let group_labels: Vec<&String> = file.grupos_bge_ngram.keys().collect();
    let row_labels: Vec<&String> = file.tfidf_epn_69d.index.iter().collect();
    if group_labels != row_labels {
        return Err(BundleError::Invalid(
            "academic matrix row labels do not match the skill group labels".into(),
        ));
    }

    let academic =
        AcademicProfileMatrix::new(file.tfidf_epn_69d.columns, file.tfidf_epn_69d.data)?;
    let data = ReferenceData::new(file.habilidades, file.grupos_bge_ngram, academic)?;

    info!(
        path = %path.display(),
        vocabulary = data.vocabulary().len(),
        careers = data.academic_profiles().careers().len(),
        "reference bundle loaded"
    );
    Ok(data)
}
