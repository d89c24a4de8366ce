//! Posting corpus engine: loads, vectorizes and caches per-career posting
//! corpora, and ranks them against a student vector in the shared 76d space.

pub mod cache;
pub mod corpus;
pub mod vectorize;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::recommendation::Recommendation;
use crate::reference::careers::CareerResolver;
use crate::reference::{
    ReferenceData, SOFT_SKILL_KEYWORDS, TECHNICAL_DIMENSIONS, VECTOR_DIMENSIONS,
};
use crate::vectorizer::student::StudentVector;

use self::cache::{CorpusCache, LoadedCorpus};

/// Results returned when the caller does not ask for a specific count.
pub const DEFAULT_TOP_N: usize = 5;
/// Display truncation for the description and skills fields.
const FIELD_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Records and vectors out of alignment is a pipeline bug, never a
    /// data-quality issue; it must surface loudly.
    #[error(
        "posting vectors out of shape for {}: {vectors} vectors of width \
         {width} against {postings} postings (expected width {TECHNICAL_DIMENSIONS})",
        path.display()
    )]
    ShapeMismatch {
        path: PathBuf,
        postings: usize,
        vectors: usize,
        width: usize,
    },
}

pub struct RecommendationEngine {
    reference: Arc<ReferenceData>,
    resolver: Arc<CareerResolver>,
    offers_root: PathBuf,
    cache: CorpusCache,
}

impl RecommendationEngine {
    pub fn new(
        reference: Arc<ReferenceData>,
        resolver: Arc<CareerResolver>,
        offers_root: PathBuf,
    ) -> Self {
        Self {
            reference,
            resolver,
            offers_root,
            cache: CorpusCache::default(),
        }
    }

    /// Ranks the career's postings against the student vector and returns up
    /// to `top_n` unique-title results. An empty vector means no
    /// recommendations could be produced (unknown sources, every source
    /// failed, or no postings); that is an answer, not an error.
    pub fn recommend(
        &self,
        student: &StudentVector,
        career: &str,
        top_n: Option<usize>,
    ) -> Result<Vec<Recommendation>, EngineError> {
        let top_n = match top_n {
            Some(n) if n >= 1 => n,
            _ => DEFAULT_TOP_N,
        };

        let Some(sources) = self.resolver.sources(career) else {
            debug!(career, "no posting sources configured");
            return Ok(Vec::new());
        };

        // Load each source independently; concatenation in source-list order
        // defines the authoritative ranking index space.
        let mut corpora: Vec<(PathBuf, Arc<LoadedCorpus>)> = Vec::new();
        for relative in sources {
            let path = self.offers_root.join(relative);
            let loaded = self
                .cache
                .get_or_load(&path, || load_source(&self.reference, &path));
            if let Some(corpus) = loaded {
                corpora.push((path, corpus));
            }
        }
        if corpora.is_empty() {
            return Ok(Vec::new());
        }

        for (path, corpus) in &corpora {
            verify_shape(path, corpus)?;
        }

        Ok(rank(student, &corpora, top_n))
    }

    /// Drops all cached corpora; the next request reloads from source.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    #[cfg(test)]
    fn cached_sources(&self) -> usize {
        self.cache.len()
    }
}

/// Reads and vectorizes one source. Any failure is logged and absorbed; the
/// engine continues with the remaining sources.
fn load_source(reference: &ReferenceData, path: &Path) -> Option<LoadedCorpus> {
    match corpus::read_postings(path) {
        Ok(postings) => {
            let mut vectors = vectorize::group_count_matrix(reference, &postings);
            vectorize::tfidf_l2(&mut vectors);
            debug!(path = %path.display(), postings = postings.len(), "posting source vectorized");
            Some(LoadedCorpus { postings, vectors })
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "skipping posting source");
            None
        }
    }
}

fn verify_shape(path: &Path, corpus: &LoadedCorpus) -> Result<(), EngineError> {
    let width_ok = corpus
        .vectors
        .iter()
        .all(|v| v.len() == TECHNICAL_DIMENSIONS);
    if corpus.vectors.len() != corpus.postings.len() || !width_ok {
        return Err(EngineError::ShapeMismatch {
            path: path.to_path_buf(),
            postings: corpus.postings.len(),
            vectors: corpus.vectors.len(),
            width: corpus
                .vectors
                .iter()
                .map(Vec::len)
                .find(|&w| w != TECHNICAL_DIMENSIONS)
                .unwrap_or(TECHNICAL_DIMENSIONS),
        });
    }
    Ok(())
}

/// Expands one posting to the 76d space: TF-IDF technical block plus binary
/// EURACE keyword indicators.
fn expand_to_76d(tfidf: &[f64], eurace_field: Option<&str>) -> Vec<f64> {
    let mut vector = Vec::with_capacity(VECTOR_DIMENSIONS);
    vector.extend_from_slice(tfidf);
    let eurace = eurace_field.unwrap_or("").to_lowercase();
    for (_, stem) in SOFT_SKILL_KEYWORDS {
        vector.push(if eurace.contains(stem) { 1.0 } else { 0.0 });
    }
    vector
}

fn rank(
    student: &StudentVector,
    corpora: &[(PathBuf, Arc<LoadedCorpus>)],
    top_n: usize,
) -> Vec<Recommendation> {
    // flat index space over the concatenated corpora
    let flat: Vec<(&LoadedCorpus, usize)> = corpora
        .iter()
        .flat_map(|(_, corpus)| (0..corpus.postings.len()).map(move |i| (corpus.as_ref(), i)))
        .collect();

    let similarities: Vec<f64> = flat
        .iter()
        .map(|(corpus, i)| {
            let posting = &corpus.postings[*i];
            let vector = expand_to_76d(&corpus.vectors[*i], posting.eurace_skills.as_deref());
            vectorize::cosine_similarity(student.as_slice(), &vector)
        })
        .collect();

    // descending similarity; ties resolve to the first-seen record so
    // identical inputs always produce identical output
    let mut order: Vec<usize> = (0..flat.len()).collect();
    order.sort_by(|&a, &b| similarities[b].total_cmp(&similarities[a]).then(a.cmp(&b)));

    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut results = Vec::with_capacity(top_n);
    for index in order {
        let (corpus, i) = flat[index];
        let posting = &corpus.postings[i];
        let title = posting.title_or_default().to_string();
        if !seen_titles.insert(title.clone()) {
            continue;
        }
        let similarity = similarities[index];
        results.push(Recommendation {
            rank: results.len() + 1,
            similarity,
            title,
            description: truncate_preview(posting.description.as_deref().unwrap_or("")),
            eurace_skills: posting.eurace_skills.clone().unwrap_or_else(|| "N/A".into()),
            skills: truncate_preview(posting.skills.as_deref().unwrap_or("N/A")),
            url: posting
                .url
                .as_deref()
                .map(str::trim)
                .unwrap_or("")
                .to_string(),
            cosine_similarity: similarity,
            cosine_angle_deg: similarity.clamp(-1.0, 1.0).acos().to_degrees(),
            explanation: None,
        });
        if results.len() >= top_n {
            break;
        }
    }
    results
}

/// Truncates to the preview length on a character boundary, appending an
/// ellipsis marker only when something was cut.
fn truncate_preview(text: &str) -> String {
    if text.chars().count() <= FIELD_PREVIEW_CHARS {
        return text.to_string();
    }
    let mut preview: String = text.chars().take(FIELD_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::reference::fixtures;
    use crate::vectorizer::StudentVectorizer;

    const SOFTWARE_CSV: &str = "software.csv";

    fn software_csv_contents() -> String {
        let mut rows = vec![
            "job_title,description,skills,EURACE_skills,url".to_string(),
            "Desarrollador Python,Backend con Python y bases de datos,\"python, sql, git\",liderazgo y trabajo en equipo,https://example.com/1".to_string(),
            "Ingeniero de Datos,Pipelines de machine learning en python,\"python, machine learning\",gestion de proyectos y aprendizaje continuo,https://example.com/2".to_string(),
            "Desarrollador Python,Rol duplicado con otro texto,python,comunicacion efectiva,https://example.com/3".to_string(),
            "Consultor ERP,Modulos contables,sap,etica profesional,https://example.com/4".to_string(),
        ];
        // filler postings without vocabulary terms rank at the bottom
        for i in 0..4 {
            rows.push(format!(
                "Puesto Generico {i},Tareas varias,ofimatica,responsabilidad social,https://example.com/g{i}"
            ));
        }
        rows.join("\n")
    }

    struct Fixture {
        _dir: TempDir,
        engine: RecommendationEngine,
        vectorizer: StudentVectorizer,
    }

    fn fixture_with_sources(
        sources: Vec<(String, Vec<PathBuf>)>,
        files: Vec<(&str, String)>,
    ) -> Fixture {
        let dir = TempDir::new().unwrap();
        for (name, contents) in files {
            fs::write(dir.path().join(name), contents).unwrap();
        }
        let reference = fixtures::reference();
        let resolver = Arc::new(CareerResolver::with_tables(Vec::new(), sources));
        let engine = RecommendationEngine::new(
            Arc::clone(&reference),
            resolver,
            dir.path().to_path_buf(),
        );
        let vectorizer = StudentVectorizer::new(reference);
        Fixture {
            _dir: dir,
            engine,
            vectorizer,
        }
    }

    fn software_fixture() -> Fixture {
        fixture_with_sources(
            vec![(
                fixtures::SOFTWARE_CAREER.to_string(),
                vec![PathBuf::from(SOFTWARE_CSV)],
            )],
            vec![(SOFTWARE_CSV, software_csv_contents())],
        )
    }

    #[test]
    fn end_to_end_ranking_scenario() {
        let fx = software_fixture();
        let student = fx
            .vectorizer
            .build(
                fixtures::SOFTWARE_CAREER,
                "Python, Git",
                Some(&[3, 4, 2, 4, 4, 3, 5]),
            )
            .unwrap();
        let results = fx
            .engine
            .recommend(&student, fixtures::SOFTWARE_CAREER, Some(5))
            .unwrap();

        assert!(!results.is_empty());
        assert!(results.len() <= 5);
        // ranks are contiguous and 1-based
        for (i, rec) in results.iter().enumerate() {
            assert_eq!(rec.rank, i + 1);
            assert!(rec.similarity >= 0.0 && rec.similarity <= 1.0);
        }
        // similarity is non-increasing
        for pair in results.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
        // no duplicate titles
        let titles: HashSet<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles.len(), results.len());
        // postings with matching vocabulary outrank the generic filler
        assert!(results[0].title.contains("Python") || results[0].title.contains("Datos"));
    }

    #[test]
    fn ranking_is_deterministic() {
        let fx = software_fixture();
        let student = fx
            .vectorizer
            .build(fixtures::SOFTWARE_CAREER, "Python", Some(&[3; 7]))
            .unwrap();
        let first = fx
            .engine
            .recommend(&student, fixtures::SOFTWARE_CAREER, Some(5))
            .unwrap();
        let second = fx
            .engine
            .recommend(&student, fixtures::SOFTWARE_CAREER, Some(5))
            .unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn clear_cache_reproduces_the_same_output() {
        let fx = software_fixture();
        let student = fx
            .vectorizer
            .build(fixtures::SOFTWARE_CAREER, "Python", Some(&[3; 7]))
            .unwrap();
        let before = fx
            .engine
            .recommend(&student, fixtures::SOFTWARE_CAREER, None)
            .unwrap();
        assert_eq!(fx.engine.cached_sources(), 1);
        fx.engine.clear_cache();
        assert_eq!(fx.engine.cached_sources(), 0);
        let after = fx
            .engine
            .recommend(&student, fixtures::SOFTWARE_CAREER, None)
            .unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn non_positive_top_n_falls_back_to_default() {
        let fx = software_fixture();
        let student = fx
            .vectorizer
            .build(fixtures::SOFTWARE_CAREER, "", Some(&[3; 7]))
            .unwrap();
        let results = fx
            .engine
            .recommend(&student, fixtures::SOFTWARE_CAREER, Some(0))
            .unwrap();
        assert!(results.len() <= DEFAULT_TOP_N);
        let one = fx
            .engine
            .recommend(&student, fixtures::SOFTWARE_CAREER, Some(1))
            .unwrap();
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn multi_source_career_concatenates_in_listed_order() {
        let second_csv = "job_title,description,skills,EURACE_skills,url\n\
             Economista Junior,Analisis de microeconomia,microeconomia,gestion,https://example.com/e1";
        let fx = fixture_with_sources(
            vec![(
                "Union".to_string(),
                vec![PathBuf::from(SOFTWARE_CSV), PathBuf::from("economia.csv")],
            )],
            vec![
                (SOFTWARE_CSV, software_csv_contents()),
                ("economia.csv", second_csv.to_string()),
            ],
        );
        let student = fx
            .vectorizer
            .build(fixtures::SOFTWARE_CAREER, "", Some(&[3; 7]))
            .unwrap();
        let results = fx.engine.recommend(&student, "Union", Some(20)).unwrap();
        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert!(titles.contains(&"Economista Junior"));
        assert_eq!(fx.engine.cached_sources(), 2);
    }

    #[test]
    fn broken_source_is_skipped_but_siblings_contribute() {
        let fx = fixture_with_sources(
            vec![(
                "Union".to_string(),
                vec![PathBuf::from("rota.csv"), PathBuf::from(SOFTWARE_CSV)],
            )],
            vec![
                // missing the EURACE column
                (
                    "rota.csv",
                    "job_title,description,skills\nDev,desc,python".to_string(),
                ),
                (SOFTWARE_CSV, software_csv_contents()),
            ],
        );
        let student = fx
            .vectorizer
            .build(fixtures::SOFTWARE_CAREER, "", Some(&[3; 7]))
            .unwrap();
        let results = fx.engine.recommend(&student, "Union", Some(3)).unwrap();
        assert!(!results.is_empty());
    }

    #[test]
    fn career_without_loadable_sources_yields_no_recommendations() {
        let fx = fixture_with_sources(
            vec![("Fantasma".to_string(), vec![PathBuf::from("no_existe.csv")])],
            Vec::new(),
        );
        let student = fx
            .vectorizer
            .build(fixtures::SOFTWARE_CAREER, "", Some(&[3; 7]))
            .unwrap();
        let results = fx.engine.recommend(&student, "Fantasma", None).unwrap();
        assert!(results.is_empty());
        // unresolved career behaves the same way
        let results = fx.engine.recommend(&student, "Desconocida", None).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn misaligned_vectors_raise_a_shape_error() {
        use crate::models::posting::PostingRecord;

        let corpus = LoadedCorpus {
            postings: vec![PostingRecord::default(); 2],
            vectors: vec![vec![0.0; TECHNICAL_DIMENSIONS]],
        };
        let err = verify_shape(Path::new("ofertas.csv"), &corpus).unwrap_err();
        assert!(err.to_string().contains("out of shape"));

        let corpus = LoadedCorpus {
            postings: vec![PostingRecord::default()],
            vectors: vec![vec![0.0; 3]],
        };
        assert!(verify_shape(Path::new("ofertas.csv"), &corpus).is_err());
    }

    #[test]
    fn description_preview_is_truncated_with_ellipsis() {
        assert_eq!(truncate_preview("corto"), "corto");
        let long = "x".repeat(150);
        let preview = truncate_preview(&long);
        assert_eq!(preview.chars().count(), FIELD_PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn eurace_indicators_are_binary() {
        let v = expand_to_76d(
            &vec![0.0; TECHNICAL_DIMENSIONS],
            Some("Se requiere LIDERAZGO y trabajo en equipo"),
        );
        assert_eq!(v.len(), VECTOR_DIMENSIONS);
        // label order: gestion, comunicacion, liderazgo, equipo, etica,
        // responsabilidad, aprendizaje
        assert_eq!(&v[TECHNICAL_DIMENSIONS..], &[0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        let none = expand_to_76d(&vec![0.0; TECHNICAL_DIMENSIONS], None);
        assert!(none[TECHNICAL_DIMENSIONS..].iter().all(|&x| x == 0.0));
    }
}
