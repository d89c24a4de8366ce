//! Posting vectorization: vocabulary-restricted n-gram counting, 69-group
//! aggregation and the smooth-idf TF-IDF transform with per-document L2
//! normalization.

use std::collections::HashMap;

use crate::models::posting::PostingRecord;
use crate::reference::{ReferenceData, TECHNICAL_DIMENSIONS};
use crate::vectorizer::similarity::tokenize;

/// Vocabulary terms are n-grams of up to five words.
const MAX_NGRAM: usize = 5;

/// Counts occurrences of vocabulary terms (as 1..=5-grams over the word
/// tokens) in one document's text.
fn vocabulary_counts(reference: &ReferenceData, text: &str) -> HashMap<usize, u32> {
    let tokens = tokenize(text);
    let mut counts: HashMap<usize, u32> = HashMap::new();
    for n in 1..=MAX_NGRAM {
        if n > tokens.len() {
            break;
        }
        for window in tokens.windows(n) {
            let gram = window.join(" ");
            if let Some(term_id) = reference.term_id(&gram) {
                *counts.entry(term_id).or_insert(0) += 1;
            }
        }
    }
    counts
}

/// One 69-component group-count row per posting: each group sums the counts
/// of its member terms; a term belonging to several groups contributes to
/// each of them.
pub fn group_count_matrix(
    reference: &ReferenceData,
    postings: &[PostingRecord],
) -> Vec<Vec<f64>> {
    postings
        .iter()
        .map(|posting| {
            let counts = vocabulary_counts(reference, &posting.vectorization_text());
            let mut row = vec![0.0; TECHNICAL_DIMENSIONS];
            for (term_id, count) in counts {
                for &group in reference.groups_of_term(term_id) {
                    row[group] += count as f64;
                }
            }
            row
        })
        .collect()
}

/// In-place smooth-idf TF-IDF over the count rows (documents as rows here,
/// i.e. columns of the conceptual 69xN matrix), then L2-normalizes each
/// document. All-zero documents stay zero.
pub fn tfidf_l2(rows: &mut [Vec<f64>]) {
    let Some(dimensions) = rows.first().map(Vec::len) else {
        return;
    };
    let n_docs = rows.len() as f64;

    let mut document_frequency = vec![0usize; dimensions];
    for row in rows.iter() {
        for (dim, &count) in row.iter().enumerate() {
            if count > 0.0 {
                document_frequency[dim] += 1;
            }
        }
    }
    let idf: Vec<f64> = document_frequency
        .iter()
        .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
        .collect();

    for row in rows.iter_mut() {
        for (value, idf) in row.iter_mut().zip(&idf) {
            *value *= idf;
        }
        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in row.iter_mut() {
                *value /= norm;
            }
        }
    }
}

/// Cosine similarity between two dense vectors of equal length. Returns 0.0
/// when either vector has zero norm.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::fixtures;

    fn posting(skills: &str, description: &str) -> PostingRecord {
        PostingRecord {
            skills: Some(skills.to_string()),
            description: Some(description.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn counts_ngram_terms_restricted_to_the_vocabulary() {
        let reference = fixtures::reference();
        let rows = group_count_matrix(
            &reference,
            &[posting("Python, Git", "usamos git y bases de datos a diario")],
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), TECHNICAL_DIMENSIONS);
        // python: groups 0 and 3; git twice: group 1; "bases de datos"
        // (3-gram) and "datos"? only the full trigram is in the vocabulary
        assert_eq!(rows[0][0], 1.0);
        assert_eq!(rows[0][1], 2.0);
        assert_eq!(rows[0][2], 1.0);
        assert_eq!(rows[0][3], 1.0);
        assert_eq!(rows[0][4], 0.0);
    }

    #[test]
    fn documents_without_vocabulary_terms_stay_zero() {
        let reference = fixtures::reference();
        let mut rows = group_count_matrix(
            &reference,
            &[posting("ventas", "atencion al cliente presencial")],
        );
        tfidf_l2(&mut rows);
        assert!(rows[0].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn tfidf_weights_and_normalizes_by_document() {
        // Two documents over two active dimensions:
        //   doc0 = [2, 1], doc1 = [0, 3]
        // idf(dim0) = ln(3/2)+1, idf(dim1) = ln(3/3)+1 = 1
        let mut rows = vec![vec![2.0, 1.0], vec![0.0, 3.0]];
        tfidf_l2(&mut rows);

        let idf0 = (3.0f64 / 2.0).ln() + 1.0;
        let raw0 = [2.0 * idf0, 1.0];
        let norm0 = (raw0[0] * raw0[0] + raw0[1] * raw0[1]).sqrt();
        assert!((rows[0][0] - raw0[0] / norm0).abs() < 1e-12);
        assert!((rows[0][1] - raw0[1] / norm0).abs() < 1e-12);

        // doc1 only has dim1, so it normalizes to a unit axis vector
        assert_eq!(rows[1][0], 0.0);
        assert!((rows[1][1] - 1.0).abs() < 1e-12);

        // every non-zero document is unit length
        for row in &rows {
            let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        let sim = cosine_similarity(&[1.0, 1.0], &[1.0, 0.0]);
        assert!((sim - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }
}
