//! Request validation for the recommendations API.
//!
//! The API boundary is strict (exactly seven ratings in range, bounded
//! `top_n`) even where the vector builder itself degrades gracefully;
//! malformed client input should be a 400, not a silently neutral vector.

use crate::errors::AppError;
use crate::reference::careers::CareerResolver;
use crate::reference::SOFT_SKILL_DIMENSIONS;

pub const MAX_SUBJECTS_CHARS: usize = 1000;

/// Resolves a career input in either survey or canonical form: survey
/// mapping first (trim + exact), then a case-insensitive comparison against
/// the canonical list.
pub fn validate_career(resolver: &CareerResolver, input: &str) -> Result<String, AppError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "La carrera debe ser un texto no vacío".into(),
        ));
    }
    if let Some(canonical) = resolver.map_career(trimmed) {
        return Ok(canonical.to_string());
    }
    let lowered = trimmed.to_lowercase();
    if let Some(canonical) = resolver
        .list_careers()
        .into_iter()
        .find(|career| career.to_lowercase() == lowered)
    {
        return Ok(canonical.to_string());
    }
    let mut sample: Vec<&str> = resolver.list_careers();
    sample.sort_unstable();
    sample.truncate(5);
    Err(AppError::Validation(format!(
        "Carrera '{trimmed}' no válida. Carreras disponibles: {}...",
        sample.join(", ")
    )))
}

/// Subjects are optional personalization input; only the length is bounded.
pub fn validate_subjects(subjects: &str) -> Result<String, AppError> {
    let subjects = subjects.trim();
    if subjects.chars().count() > MAX_SUBJECTS_CHARS {
        return Err(AppError::Validation(format!(
            "El texto de asignaturas es demasiado largo (máximo {MAX_SUBJECTS_CHARS} caracteres)"
        )));
    }
    Ok(subjects.to_string())
}

pub fn validate_soft_skills(ratings: Option<&[i64]>) -> Result<Vec<i64>, AppError> {
    let ratings = ratings.ok_or_else(|| {
        AppError::Validation("Falta el campo requerido: soft_skills".into())
    })?;
    if ratings.len() != SOFT_SKILL_DIMENSIONS {
        return Err(AppError::Validation(format!(
            "soft_skills debe tener exactamente {SOFT_SKILL_DIMENSIONS} valores, se recibieron {}",
            ratings.len()
        )));
    }
    for (i, &rating) in ratings.iter().enumerate() {
        if !(1..=5).contains(&rating) {
            return Err(AppError::Validation(format!(
                "soft_skills[{i}] debe estar entre 1 y 5, se recibió {rating}"
            )));
        }
    }
    Ok(ratings.to_vec())
}

pub fn validate_top_n(top_n: Option<i64>, max: usize) -> Result<usize, AppError> {
    let Some(top_n) = top_n else {
        return Ok(crate::engine::DEFAULT_TOP_N);
    };
    if top_n < 1 || top_n > max as i64 {
        return Err(AppError::Validation(format!(
            "top_n debe estar entre 1 y {max}"
        )));
    }
    Ok(top_n as usize)
}
