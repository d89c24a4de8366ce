//! Recommendations API handlers.
//!
//! The predict pipeline (vector build + corpus ranking) is CPU-bound and
//! runs inside `tokio::task::spawn_blocking`; explanation generation is the
//! only async stage.

use std::collections::HashSet;

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::recommendation::Recommendation;
use crate::personalizer::ExplainContext;
use crate::reference::{
    SOFT_SKILL_DIMENSIONS, SOFT_SKILL_KEYWORDS, SOFT_SKILL_LABELS, TECHNICAL_DIMENSIONS,
    VECTOR_DIMENSIONS,
};
use crate::routes::{success, validation};
use crate::state::AppState;
use crate::vectorizer::VectorError;

/// Soft-skill delta applied to the student vector for the alternative
/// "if you improve your soft skills" ranking.
const SOFT_SKILL_BOOST: f64 = 0.3;

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub carrera: String,
    #[serde(default)]
    pub asignaturas: String,
    #[serde(default)]
    pub soft_skills: Option<Vec<i64>>,
    #[serde(default)]
    pub top_n: Option<i64>,
    #[serde(default)]
    pub include_alt: bool,
}

/// POST /api/recommendations/predict
pub async fn handle_predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<Value>, AppError> {
    let career = validation::validate_career(&state.resolver, &req.carrera)?;
    let subjects = validation::validate_subjects(&req.asignaturas)?;
    let ratings = validation::validate_soft_skills(req.soft_skills.as_deref())?;
    let top_n = validation::validate_top_n(req.top_n, state.config.max_recommendations)?;
    let include_alt = req.include_alt;

    let status = state.personalizer.status();
    if state.config.require_llm && !status.enabled {
        return Err(AppError::ServiceUnavailable {
            message: "El personalizador LLM está deshabilitado o no pudo inicializarse; \
                      revisa OPENAI_API_KEY y OPENAI_MODEL"
                .into(),
            details: serde_json::to_value(&status).unwrap_or(Value::Null),
        });
    }

    // CPU-bound: vector construction plus corpus vectorization and ranking.
    let blocking_state = state.clone();
    let blocking_career = career.clone();
    let blocking_subjects = subjects.clone();
    let blocking_ratings = ratings.clone();
    let (primary, alternatives) = tokio::task::spawn_blocking(move || {
        let student = blocking_state
            .vectorizer
            .build(
                &blocking_career,
                &blocking_subjects,
                Some(&blocking_ratings),
            )
            .map_err(|err| match err {
                VectorError::UnknownCareer(career) => AppError::Validation(format!(
                    "No se pudo crear el vector para la carrera: {career}"
                )),
                other => AppError::Internal(anyhow::anyhow!(other)),
            })?;

        let primary = blocking_state
            .engine
            .recommend(&student, &blocking_career, Some(top_n))?;

        let alternatives = if include_alt {
            let improved = student.with_boosted_soft_skills(SOFT_SKILL_BOOST);
            blocking_state
                .engine
                .recommend(&improved, &blocking_career, Some(top_n * 2))?
        } else {
            Vec::new()
        };
        Ok::<_, AppError>((primary, alternatives))
    })
    .await
    .map_err(|err| AppError::Internal(anyhow::anyhow!("ranking task failed: {err}")))??;

    let ctx = ExplainContext {
        career: &career,
        subjects: &subjects,
        ratings: &ratings,
    };

    if primary.is_empty() {
        return Ok(success(
            json!({
                "carrera": career,
                "num_recomendaciones": 0,
                "recomendaciones": [],
                "mensaje": "No hay ofertas disponibles para esta carrera",
            }),
            "No se encontraron recomendaciones",
        ));
    }

    let mut primary = primary;
    let explanations = state.personalizer.explain_batch(&primary, ctx).await;
    for (rec, explanation) in primary.iter_mut().zip(explanations) {
        rec.explanation = Some(explanation);
    }

    let mut alt_block = Vec::new();
    let mut advice = String::new();
    if include_alt {
        let primary_titles: HashSet<&str> = primary.iter().map(|r| r.title.as_str()).collect();
        let mut alts: Vec<Recommendation> = alternatives
            .into_iter()
            .filter(|rec| !primary_titles.contains(rec.title.as_str()))
            .take(top_n)
            .collect();
        for (i, rec) in alts.iter_mut().enumerate() {
            rec.rank = i + 1;
        }
        let suggestions: Vec<Vec<String>> = alts
            .iter()
            .map(|rec| suggest_soft_skills(&rec.eurace_skills, &ratings))
            .collect();
        let explanations = state
            .personalizer
            .explain_alternatives(&alts, &suggestions, ctx)
            .await;
        for (rec, explanation) in alts.iter_mut().zip(explanations) {
            rec.explanation = Some(explanation);
        }
        advice = state.personalizer.soft_skills_advice(ctx).await;
        alt_block = alts;
    }

    Ok(success(
        json!({
            "carrera": career,
            "num_recomendaciones": primary.len(),
            "recomendaciones": primary,
            "mejora_soft_skills_mensaje": advice,
            "recomendaciones_mejorando_soft_skills": alt_block,
            "include_alt": include_alt,
            "llm_used": status.enabled,
        }),
        "Recomendaciones generadas exitosamente",
    ))
}

/// GET /api/recommendations/health
pub async fn handle_health(State(state): State<AppState>) -> Json<Value> {
    let ready = state.reference.is_ready();
    success(
        json!({
            "status": if ready { "healthy" } else { "not_ready" },
            "data_loaded": ready,
        }),
        "Health check passed",
    )
}

/// GET /api/recommendations/careers
pub async fn handle_careers(State(state): State<AppState>) -> Json<Value> {
    let mut careers: Vec<&str> = state.resolver.list_careers();
    careers.sort_unstable();
    success(
        json!({
            "total": careers.len(),
            "careers": careers,
        }),
        "Carreras obtenidas exitosamente",
    )
}

/// GET /api/recommendations/soft-skills-labels
pub async fn handle_soft_skill_labels() -> Json<Value> {
    success(
        json!({
            "labels": SOFT_SKILL_LABELS,
            "count": SOFT_SKILL_LABELS.len(),
        }),
        "Soft skills labels obtenidos exitosamente",
    )
}

/// GET /api/recommendations/info
pub async fn handle_info(State(state): State<AppState>) -> Json<Value> {
    let status = state.personalizer.status();
    success(
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "name": "Sistema de Recomendación de Ofertas Laborales",
            "description": "API que proporciona recomendaciones de ofertas laborales \
                            basadas en vectores de estudiantes",
            "features": [
                "Vectorización de usuarios (76 dimensiones)",
                "Personalización por asignaturas relevantes",
                "Evaluación de habilidades blandas",
                "Cálculo de similitud coseno con ofertas laborales",
                "Ranking de recomendaciones",
            ],
            "technical_skills_dimensions": TECHNICAL_DIMENSIONS,
            "soft_skills_dimensions": SOFT_SKILL_DIMENSIONS,
            "total_dimensions": VECTOR_DIMENSIONS,
            "available_careers_count": state.resolver.list_careers().len(),
            "llm_enabled": status.enabled,
            "llm_required": state.config.require_llm,
            "llm_status_details": status,
        }),
        "API info retrieved successfully",
    )
}

/// POST /api/recommendations/clear-cache
/// Drops every cached posting corpus; used after source data changes.
pub async fn handle_clear_cache(State(state): State<AppState>) -> Json<Value> {
    state.engine.clear_cache();
    success(
        json!({ "cleared": true }),
        "Cache de ofertas limpiado exitosamente",
    )
}

/// Picks up to two soft-skill labels worth improving for one posting: labels
/// whose EURACE stem appears in the posting and whose self-rating is 3 or
/// lower, weakest first; when none qualify, the student's two weakest labels
/// overall.
fn suggest_soft_skills(eurace: &str, ratings: &[i64]) -> Vec<String> {
    let eurace = eurace.to_lowercase();
    let mut by_rating: Vec<(&str, &str, i64)> = SOFT_SKILL_KEYWORDS
        .iter()
        .zip(ratings)
        .map(|((label, stem), &rating)| (*label, *stem, rating))
        .collect();
    by_rating.sort_by_key(|&(_, _, rating)| rating);

    let suggested: Vec<String> = by_rating
        .iter()
        .filter(|(_, stem, rating)| *rating <= 3 && eurace.contains(stem))
        .map(|(label, _, _)| label.to_string())
        .take(2)
        .collect();
    if !suggested.is_empty() {
        return suggested;
    }
    by_rating
        .iter()
        .map(|(label, _, _)| label.to_string())
        .take(2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestions_prefer_low_rated_labels_present_in_the_posting() {
        // Liderazgo rated 2 and present; Gestión rated 3 and present;
        // Comunicación present but rated 5
        let ratings = [3, 5, 2, 4, 4, 4, 4];
        let suggested = suggest_soft_skills(
            "se valora liderazgo, gestion y comunicacion",
            &ratings,
        );
        assert_eq!(suggested, vec!["Liderazgo".to_string(), "Gestión".to_string()]);
    }

    #[test]
    fn suggestions_fall_back_to_the_weakest_overall() {
        let ratings = [4, 4, 4, 4, 4, 4, 4];
        let suggested = suggest_soft_skills("sin competencias reconocibles", &ratings);
        assert_eq!(suggested.len(), 2);
        // stable sort keeps label order among equal ratings
        assert_eq!(suggested[0], "Gestión");
        assert_eq!(suggested[1], "Comunicación efectiva");
    }

    #[test]
    fn at_most_two_suggestions() {
        let ratings = [1, 1, 1, 1, 1, 1, 1];
        let suggested = suggest_soft_skills(
            "gestion comunicacion liderazgo equipo etica responsabilidad aprendizaje",
            &ratings,
        );
        assert_eq!(suggested.len(), 2);
    }
}
