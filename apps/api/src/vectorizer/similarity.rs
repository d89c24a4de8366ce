//! Word-level TF-IDF similarity between free-text subject tokens and the
//! fixed skill vocabulary.
//!
//! The index is fitted once over the vocabulary terms (each term is one
//! "document") with smooth idf and L2 normalization, matching the defaults
//! of the offline pipeline that produced the reference data. Because every
//! stored vector is unit-length, cosine similarity reduces to a sparse dot
//! product.

use std::collections::HashMap;

/// Splits lower-cased text into word tokens of at least two word characters,
/// the same analyzer rule the offline vectorizer uses. Single-character
/// tokens ("c", "r") are dropped by that rule and must stay dropped here so
/// the two sides of the similarity agree on the term space.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            current.extend(ch.to_lowercase());
        } else {
            flush_token(&mut current, &mut tokens);
        }
    }
    flush_token(&mut current, &mut tokens);
    tokens
}

fn flush_token(current: &mut String, tokens: &mut Vec<String>) {
    if current.chars().count() >= 2 {
        tokens.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

/// TF-IDF index over the vocabulary terms.
#[derive(Debug)]
pub struct SubjectMatcher {
    word_ids: HashMap<String, usize>,
    idf: Vec<f64>,
    /// One sparse unit vector per vocabulary term, entries sorted by word id.
    term_vectors: Vec<Vec<(usize, f64)>>,
}

impl SubjectMatcher {
    pub fn fit(vocabulary: &[String]) -> Self {
        let tokenized: Vec<Vec<String>> = vocabulary.iter().map(|t| tokenize(t)).collect();

        let mut word_ids: HashMap<String, usize> = HashMap::new();
        let mut doc_frequency: Vec<usize> = Vec::new();
        for tokens in &tokenized {
            let mut seen = std::collections::HashSet::new();
            for token in tokens {
                let next_id = word_ids.len();
                let id = *word_ids.entry(token.clone()).or_insert_with(|| {
                    doc_frequency.push(0);
                    next_id
                });
                if seen.insert(id) {
                    doc_frequency[id] += 1;
                }
            }
        }

        let n_docs = vocabulary.len() as f64;
        let idf: Vec<f64> = doc_frequency
            .iter()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let term_vectors = tokenized
            .iter()
            .map(|tokens| Self::weigh(tokens, &word_ids, &idf))
            .collect();

        Self {
            word_ids,
            idf,
            term_vectors,
        }
    }

    /// Indexes of vocabulary terms whose cosine similarity to `subject` is at
    /// least `threshold`.
    pub fn matching_terms(&self, subject: &str, threshold: f64) -> Vec<usize> {
        let tokens = tokenize(subject);
        let query = Self::weigh(&tokens, &self.word_ids, &self.idf);
        if query.is_empty() {
            return Vec::new();
        }
        self.term_vectors
            .iter()
            .enumerate()
            .filter(|(_, term)| sparse_dot(&query, term) >= threshold)
            .map(|(i, _)| i)
            .collect()
    }

    /// Counts known words, applies idf and L2-normalizes. Unknown words are
    /// ignored, exactly as a fitted vectorizer transforms unseen input.
    fn weigh(
        tokens: &[String],
        word_ids: &HashMap<String, usize>,
        idf: &[f64],
    ) -> Vec<(usize, f64)> {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokens {
            if let Some(&id) = word_ids.get(token) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }
        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(id, tf)| (id, tf * idf[id]))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut entries {
                *w /= norm;
            }
        }
        entries
    }
}

/// Dot product of two sparse vectors with sorted indexes.
fn sparse_dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j, mut dot) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn tokenize_drops_single_character_tokens() {
        assert_eq!(
            tokenize("C, Python y SQL!"),
            vec!["python".to_string(), "sql".to_string()]
        );
        assert_eq!(tokenize("a b c"), Vec::<String>::new());
        assert_eq!(tokenize(""), Vec::<String>::new());
    }

    #[test]
    fn tokenize_keeps_underscores_and_digits() {
        assert_eq!(
            tokenize("redes_5g / web3"),
            vec!["redes_5g".to_string(), "web3".to_string()]
        );
    }

    #[test]
    fn exact_term_matches_with_similarity_one() {
        let matcher = SubjectMatcher::fit(&vocab(&["python", "java", "sql"]));
        assert_eq!(matcher.matching_terms("python", 0.99), vec![0]);
    }

    #[test]
    fn shared_word_scores_partial_similarity() {
        // "python avanzado" shares one of its two words with the query:
        // idf(python) = ln(4/3)+1, idf(avanzado) = ln(4/2)+1, so the cosine
        // against the unit query is 1.2877/sqrt(1.2877^2+1.6931^2) ~= 0.605.
        let matcher = SubjectMatcher::fit(&vocab(&["python", "python avanzado", "java"]));
        let matched = matcher.matching_terms("python", 0.5);
        assert_eq!(matched, vec![0, 1]);
        let strict = matcher.matching_terms("python", 0.7);
        assert_eq!(strict, vec![0]);
    }

    #[test]
    fn unrelated_subject_matches_nothing() {
        let matcher = SubjectMatcher::fit(&vocab(&["python", "java"]));
        assert!(matcher.matching_terms("termodinamica", 0.5).is_empty());
        assert!(matcher.matching_terms("", 0.5).is_empty());
    }

    #[test]
    fn sparse_dot_merges_sorted_indexes() {
        let a = vec![(0, 0.5), (3, 0.5)];
        let b = vec![(1, 1.0), (3, 0.5)];
        assert!((sparse_dot(&a, &b) - 0.25).abs() < 1e-12);
    }
}
