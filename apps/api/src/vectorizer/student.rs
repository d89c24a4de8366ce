#![allow(dead_code)]

//! Builds the 76-dimensional student vector: the career's academic profile
//! personalized by self-reported subjects, concatenated with normalized
//! soft-skill self-assessments.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::reference::{
    ReferenceData, SOFT_SKILL_DIMENSIONS, TECHNICAL_DIMENSIONS, VECTOR_DIMENSIONS,
};
use crate::vectorizer::similarity::SubjectMatcher;

/// Cosine threshold above which a subject token counts as a vocabulary match.
pub const SUBJECT_MATCH_THRESHOLD: f64 = 0.5;
/// Weight written into every group dimension reached by a matched subject.
/// Overwrite, not additive: repeated matches stay at this ceiling.
pub const PERSONALIZATION_WEIGHT: f64 = 0.99;
/// Neutral value substituted when the soft-skill input is absent or not
/// exactly seven ratings.
const NEUTRAL_SOFT_SKILL: f64 = 0.5;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("career '{0}' has no academic profile")]
    UnknownCareer(String),

    #[error("student vector has {0} components, expected {VECTOR_DIMENSIONS}")]
    WrongDimensions(usize),
}

/// A dense student vector of exactly 76 non-negative components:
/// [0, 69) technical-skill weights, [69, 76) soft-skill scores.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentVector(Vec<f64>);

impl StudentVector {
    pub fn new(components: Vec<f64>) -> Result<Self, VectorError> {
        if components.len() != VECTOR_DIMENSIONS {
            return Err(VectorError::WrongDimensions(components.len()));
        }
        Ok(Self(components))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn technical(&self) -> &[f64] {
        &self.0[..TECHNICAL_DIMENSIONS]
    }

    pub fn soft_skills(&self) -> &[f64] {
        &self.0[TECHNICAL_DIMENSIONS..]
    }

    /// Copy with every soft-skill component raised by `delta` and clamped to
    /// [0, 1]; the technical block is untouched. Used for the "improved soft
    /// skills" alternative ranking.
    pub fn with_boosted_soft_skills(&self, delta: f64) -> StudentVector {
        let mut components = self.0.clone();
        for value in &mut components[TECHNICAL_DIMENSIONS..] {
            *value = (*value + delta).clamp(0.0, 1.0);
        }
        StudentVector(components)
    }
}

pub struct StudentVectorizer {
    reference: Arc<ReferenceData>,
    matcher: SubjectMatcher,
}

impl StudentVectorizer {
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        let matcher = SubjectMatcher::fit(reference.vocabulary());
        Self { reference, matcher }
    }

    /// Builds the full 76d vector. `ratings` other than exactly seven values
    /// degrade to the neutral default rather than failing; an unknown career
    /// is a reportable failure, not a crash.
    pub fn build(
        &self,
        career: &str,
        subjects: &str,
        ratings: Option<&[i64]>,
    ) -> Result<StudentVector, VectorError> {
        let mut components = self
            .reference
            .academic_profiles()
            .column(career)
            .ok_or_else(|| VectorError::UnknownCareer(career.to_string()))?;

        self.personalize(&mut components, subjects);
        components.extend_from_slice(&normalize_soft_skills(ratings));
        StudentVector::new(components)
    }

    /// Overwrites the group dimensions reached by each matched subject with
    /// the personalization ceiling. Idempotent: subject order and repetition
    /// cannot change the result.
    fn personalize(&self, technical: &mut [f64], subjects: &str) {
        for token in split_subjects(subjects) {
            let matched = self
                .matcher
                .matching_terms(&token, SUBJECT_MATCH_THRESHOLD);
            if matched.is_empty() {
                continue;
            }
            debug!(subject = %token, terms = matched.len(), "subject matched vocabulary");
            for term_id in matched {
                for &group in self.reference.groups_of_term(term_id) {
                    technical[group] = PERSONALIZATION_WEIGHT;
                }
            }
        }
    }
}

/// Splits the free-text subjects field on comma, semicolon, slash and
/// newline; trims, lower-cases and drops empty tokens.
fn split_subjects(text: &str) -> Vec<String> {
    text.split(|c| matches!(c, ',' | ';' | '/' | '\n'))
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Clamps each rating to [1, 5] and maps it linearly onto [0, 1]. Anything
/// other than exactly seven ratings yields the neutral default for all
/// seven; a deliberate graceful-degradation policy, not an error.
fn normalize_soft_skills(ratings: Option<&[i64]>) -> [f64; SOFT_SKILL_DIMENSIONS] {
    let mut normalized = [NEUTRAL_SOFT_SKILL; SOFT_SKILL_DIMENSIONS];
    let Some(ratings) = ratings else {
        return normalized;
    };
    if ratings.len() != SOFT_SKILL_DIMENSIONS {
        return normalized;
    }
    for (slot, &rating) in normalized.iter_mut().zip(ratings) {
        let clamped = rating.clamp(1, 5) as f64;
        *slot = (clamped - 1.0) / 4.0;
    }
    normalized
}
