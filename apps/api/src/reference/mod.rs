// Reference data layer: the skill vocabulary, the 69-group skill mapping and
// the per-career academic profile matrix, loaded once per process from a
// single serialized bundle. Everything here is read-only after load and
// shared freely between the vectorizer and the engine.

pub mod bundle;
pub mod careers;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use indexmap::IndexMap;

use crate::reference::bundle::{BundleError, BundleLocator};

/// Number of technical-skill dimensions, one per skill group.
pub const TECHNICAL_DIMENSIONS: usize = 69;
/// Number of soft-skill dimensions appended after the technical block.
pub const SOFT_SKILL_DIMENSIONS: usize = 7;
/// Full size of the shared embedding space: 69 technical + 7 soft skills.
pub const VECTOR_DIMENSIONS: usize = TECHNICAL_DIMENSIONS + SOFT_SKILL_DIMENSIONS;

/// Human-readable names for the soft-skill dimensions [69, 76), in order.
pub const SOFT_SKILL_LABELS: [&str; SOFT_SKILL_DIMENSIONS] = [
    "Gestión",
    "Comunicación efectiva",
    "Liderazgo",
    "Trabajo en equipo",
    "Ética profesional",
    "Responsabilidad social",
    "Aprendizaje autónomo",
];

/// Keyword stems scanned against the EURACE competency field, one per
/// soft-skill label, in label order. Plain substring containment over the
/// lower-cased field; deliberately not NLP.
pub const SOFT_SKILL_KEYWORDS: [(&str, &str); SOFT_SKILL_DIMENSIONS] = [
    ("Gestión", "gestion"),
    ("Comunicación efectiva", "comunicacion"),
    ("Liderazgo", "liderazgo"),
    ("Trabajo en equipo", "equipo"),
    ("Ética profesional", "etica"),
    ("Responsabilidad social", "responsabilidad"),
    ("Aprendizaje autónomo", "aprendizaje"),
];

/// Per-career academic relevance weights: one row per skill group (in group
/// order), one column per canonical career.
#[derive(Debug, Clone)]
pub struct AcademicProfileMatrix {
    careers: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl AcademicProfileMatrix {
    pub fn new(careers: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, BundleError> {
        if rows.len() != TECHNICAL_DIMENSIONS {
            return Err(BundleError::Invalid(format!(
                "academic matrix has {} rows, expected {TECHNICAL_DIMENSIONS}",
                rows.len()
            )));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != careers.len() {
                return Err(BundleError::Invalid(format!(
                    "academic matrix row {i} has {} columns, expected {}",
                    row.len(),
                    careers.len()
                )));
            }
            if let Some(w) = row.iter().find(|w| !w.is_finite() || **w < 0.0) {
                return Err(BundleError::Invalid(format!(
                    "academic matrix row {i} contains invalid weight {w}"
                )));
            }
        }
        Ok(Self { careers, rows })
    }

    pub fn careers(&self) -> &[String] {
        &self.careers
    }

    /// The 69-component column for one canonical career, in group order.
    pub fn column(&self, career: &str) -> Option<Vec<f64>> {
        let col = self.careers.iter().position(|c| c == career)?;
        Some(self.rows.iter().map(|row| row[col]).collect())
    }
}

/// The three reference structures plus derived lookup indexes. Immutable
/// after construction.
#[derive(Debug)]
pub struct ReferenceData {
    vocabulary: Vec<String>,
    groups: IndexMap<String, Vec<String>>,
    academic: AcademicProfileMatrix,
    /// vocabulary term -> position in `vocabulary`
    term_ids: HashMap<String, usize>,
    /// vocabulary position -> indexes of the groups containing the term
    term_groups: Vec<Vec<usize>>,
}

impl ReferenceData {
    pub fn new(
        vocabulary: Vec<String>,
        groups: IndexMap<String, Vec<String>>,
        academic: AcademicProfileMatrix,
    ) -> Result<Self, BundleError> {
        if vocabulary.is_empty() {
            return Err(BundleError::Invalid("skill vocabulary is empty".into()));
        }
        if groups.len() != TECHNICAL_DIMENSIONS {
            return Err(BundleError::Invalid(format!(
                "skill grouping has {} groups, expected {TECHNICAL_DIMENSIONS}",
                groups.len()
            )));
        }

        let term_ids: HashMap<String, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        let mut term_groups = vec![Vec::new(); vocabulary.len()];
        for (group_idx, terms) in groups.values().enumerate() {
            for term in terms {
                // terms outside the vocabulary carry no dimension
                if let Some(&id) = term_ids.get(term) {
                    term_groups[id].push(group_idx);
                }
            }
        }

        Ok(Self {
            vocabulary,
            groups,
            academic,
            term_ids,
            term_groups,
        })
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn groups(&self) -> &IndexMap<String, Vec<String>> {
        &self.groups
    }

    pub fn academic_profiles(&self) -> &AcademicProfileMatrix {
        &self.academic
    }

    /// Position of an exact vocabulary term, if present.
    pub fn term_id(&self, term: &str) -> Option<usize> {
        self.term_ids.get(term).copied()
    }

    /// Group dimensions the vocabulary term at `term_id` belongs to.
    pub fn groups_of_term(&self, term_id: usize) -> &[usize] {
        &self.term_groups[term_id]
    }

    /// True once all three structures are present and non-empty.
    pub fn is_ready(&self) -> bool {
        !self.vocabulary.is_empty()
            && !self.groups.is_empty()
            && !self.academic.careers.is_empty()
    }
}

static SHARED: OnceLock<Arc<ReferenceData>> = OnceLock::new();
static SHARED_INIT: Mutex<()> = Mutex::new(());

/// Process-wide reference data, loaded at most once. The first caller
/// performs the load while holding the init guard; concurrent callers block
/// on the guard and then reuse the stored result. A failed load is
/// propagated and leaves the slot empty so startup can abort with the real
/// error.
pub fn shared(locator: &BundleLocator) -> Result<Arc<ReferenceData>, BundleError> {
    if let Some(data) = SHARED.get() {
        return Ok(Arc::clone(data));
    }
    let _guard = SHARED_INIT
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(data) = SHARED.get() {
        return Ok(Arc::clone(data));
    }
    let data = Arc::new(bundle::load(locator)?);
    let _ = SHARED.set(Arc::clone(&data));
    Ok(data)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use indexmap::IndexMap;

    use super::{AcademicProfileMatrix, ReferenceData, TECHNICAL_DIMENSIONS};

    pub const SOFTWARE_CAREER: &str = "Ingenieria En Software";
    pub const OTHER_CAREER: &str = "Economia";

    /// A full-size reference fixture: 69 groups, the first few carrying real
    /// terms, the rest empty filler so the dimension invariants hold.
    pub fn reference() -> Arc<ReferenceData> {
        let vocabulary: Vec<String> = [
            "python",
            "java",
            "git",
            "sql",
            "bases de datos",
            "machine learning",
            "docker",
            "microeconomia",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
        groups.insert(
            "lenguajes de programacion".into(),
            vec!["python".into(), "java".into()],
        );
        groups.insert("control de versiones".into(), vec!["git".into()]);
        groups.insert(
            "bases de datos".into(),
            vec!["sql".into(), "bases de datos".into()],
        );
        groups.insert(
            "aprendizaje automatico".into(),
            vec!["machine learning".into(), "python".into()],
        );
        groups.insert("infraestructura".into(), vec!["docker".into()]);
        groups.insert("economia aplicada".into(), vec!["microeconomia".into()]);
        for i in groups.len()..TECHNICAL_DIMENSIONS {
            groups.insert(format!("grupo_{i:02}"), Vec::new());
        }

        let careers = vec![SOFTWARE_CAREER.to_string(), OTHER_CAREER.to_string()];
        let mut rows = vec![vec![0.0, 0.0]; TECHNICAL_DIMENSIONS];
        rows[0] = vec![0.8, 0.05]; // lenguajes de programacion
        rows[1] = vec![0.6, 0.0]; // control de versiones
        rows[2] = vec![0.7, 0.1]; // bases de datos
        rows[3] = vec![0.5, 0.05]; // aprendizaje automatico
        rows[4] = vec![0.4, 0.0]; // infraestructura
        rows[5] = vec![0.0, 0.9]; // economia aplicada
        let academic = AcademicProfileMatrix::new(careers, rows).expect("fixture matrix");

        Arc::new(ReferenceData::new(vocabulary, groups, academic).expect("fixture reference"))
    }
}
