//! Deterministic template backend.
//!
//! No network calls, same inputs produce the same outputs. Free-text inputs
//! are scrubbed before they are quoted back to the student: scraped skills
//! fields and survey subjects are full of `nan` artifacts and keyboard
//! noise, and quoting those would read as a bug.

use async_trait::async_trait;

use crate::models::recommendation::Recommendation;
use crate::reference::SOFT_SKILL_LABELS;

use super::{ExplainContext, Personalizer, PersonalizerStatus};

/// Explanation templates, selected per posting by a stable hash so adjacent
/// results phrase differently without any randomness.
const EXPLANATION_TEMPLATES: [&str; 4] = [
    "'{cargo}' es pertinente para perfiles de {carrera}.",
    "En {carrera}, '{cargo}' destaca como opción sólida.",
    "La base de {carrera} sustenta '{cargo}' con buen potencial.",
    "'{cargo}' guarda relación directa con {carrera}.",
];

const ALTERNATIVE_TEMPLATES: [&str; 5] = [
    "Si fortaleces {obj}, accederás a retos con mayor alcance y mejor proyección.",
    "Al incorporar {obj}, ganarás tracción hacia proyectos de impacto y liderazgo.",
    "Con {obj}, ampliarás tu margen para roles con mejores condiciones y responsabilidad.",
    "Al desarrollar {obj}, acelerarás tu avance hacia posiciones de referencia.",
    "Si potencias {obj}, destacarás en procesos con mayores exigencias técnicas y de gestión.",
];

const ADVICE_BENEFITS: [&str; 3] = [
    "acceder a más ofertas relevantes",
    "mejorar tu proyección y remuneración",
    "acelerar tu crecimiento profesional",
];

pub struct TemplatePersonalizer {
    require_llm: bool,
}

impl TemplatePersonalizer {
    pub fn new(require_llm: bool) -> Self {
        Self { require_llm }
    }

    pub(crate) fn explain_one(rec: &Recommendation, ctx: ExplainContext<'_>) -> String {
        let subjects = clean_subjects(ctx.subjects);
        let picked = pick_skills(&rec.skills);

        let hint = if !rec.eurace_skills.trim().is_empty() && !picked.is_empty() {
            format!("EURACE y {}", spanish_join(&picked))
        } else if !picked.is_empty() {
            spanish_join(&picked)
        } else if !rec.eurace_skills.trim().is_empty() {
            "las competencias EURACE del cargo".to_string()
        } else {
            "tus competencias y trayectoria".to_string()
        };

        let seed = fnv1a(&format!("{}|{}|{}", rec.title, ctx.career, subjects));
        let template = EXPLANATION_TEMPLATES[(seed % EXPLANATION_TEMPLATES.len() as u64) as usize];
        let mut line = template
            .replace("{cargo}", &rec.title)
            .replace("{carrera}", ctx.career);
        if !subjects.is_empty() {
            line.push_str(&format!(" Asignaturas relevantes: {subjects}."));
        }
        line.push_str(&format!(" Se sustentan en {hint}."));
        line
    }

    pub(crate) fn explain_alternative(
        rec: &Recommendation,
        suggested: &[String],
    ) -> String {
        let object = match suggested.len() {
            0 => "tus habilidades blandas prioritarias".to_string(),
            1 => format!("esta habilidad ({})", suggested[0]),
            _ => format!("estas habilidades ({})", spanish_join(&suggested[..2])),
        };
        let seed = fnv1a(&format!("{}|{}", rec.title, suggested.join(" ")));
        let template = ALTERNATIVE_TEMPLATES[(seed % ALTERNATIVE_TEMPLATES.len() as u64) as usize];
        let mut line = template.replace("{obj}", &object);
        let tech = pick_skills(&rec.skills);
        if !tech.is_empty() {
            line.push_str(&format!(
                " En paralelo, tus bases técnicas en {} consolidarán tu aporte en el rol.",
                spanish_join(&tech)
            ));
        }
        line
    }

    pub(crate) fn advice(ctx: ExplainContext<'_>) -> String {
        let mut pairs: Vec<(&str, i64)> = SOFT_SKILL_LABELS
            .iter()
            .copied()
            .zip(ctx.ratings.iter().copied())
            .collect();
        pairs.sort_by_key(|&(_, rating)| rating);
        let weak: Vec<&str> = pairs
            .iter()
            .filter(|&&(_, r)| r <= 3)
            .map(|&(label, _)| label)
            .take(2)
            .collect();
        let strength = SOFT_SKILL_LABELS
            .iter()
            .copied()
            .zip(ctx.ratings.iter().copied())
            .find(|&(_, r)| r >= 4)
            .map(|(label, _)| label);

        let total: i64 = ctx.ratings.iter().sum();
        let benefit = ADVICE_BENEFITS[(total.unsigned_abs() % ADVICE_BENEFITS.len() as u64) as usize];

        let mut advice = format!("Para impulsar tu trayectoria en {}, prioriza ", ctx.career);
        if weak.is_empty() {
            advice.push_str("tus habilidades blandas clave");
        } else {
            let weak: Vec<String> = weak.iter().map(|s| s.to_string()).collect();
            advice.push_str(&spanish_join(&weak));
        }
        advice.push_str(&format!(": te ayudará a {benefit}."));
        if let Some(strength) = strength {
            advice.push_str(&format!(
                " Ya destacas en {strength}; capitalízalo mientras fortaleces lo anterior."
            ));
        }
        advice.push_str(
            " Prácticas rápidas: lidera pequeñas tareas en equipo y presenta avances breves; \
             busca feedback quincenal y documenta aprendizajes.",
        );
        let subjects = clean_subjects(ctx.subjects);
        if !subjects.is_empty() {
            advice.push_str(&format!(
                " Integra estas acciones con {subjects} para impacto inmediato."
            ));
        }
        advice
    }
}

#[async_trait]
impl Personalizer for TemplatePersonalizer {
    async fn explain_batch(
        &self,
        recommendations: &[Recommendation],
        ctx: ExplainContext<'_>,
    ) -> Vec<String> {
        recommendations
            .iter()
            .map(|rec| Self::explain_one(rec, ctx))
            .collect()
    }

    async fn explain_alternatives(
        &self,
        recommendations: &[Recommendation],
        suggestions: &[Vec<String>],
        _ctx: ExplainContext<'_>,
    ) -> Vec<String> {
        recommendations
            .iter()
            .enumerate()
            .map(|(i, rec)| {
                let suggested = suggestions.get(i).map(Vec::as_slice).unwrap_or(&[]);
                Self::explain_alternative(rec, suggested)
            })
            .collect()
    }

    async fn soft_skills_advice(&self, ctx: ExplainContext<'_>) -> String {
        Self::advice(ctx)
    }

    fn status(&self) -> PersonalizerStatus {
        PersonalizerStatus {
            enabled: false,
            model: String::new(),
            require_llm: self.require_llm,
            client_ready: false,
        }
    }
}

/// Stable 64-bit FNV-1a hash for deterministic template selection.
fn fnv1a(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in text.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Joins parts Spanish-style: "a", "a y b", "a, b y c".
fn spanish_join(parts: &[String]) -> String {
    match parts.len() {
        0 => String::new(),
        1 => parts[0].clone(),
        2 => format!("{} y {}", parts[0], parts[1]),
        _ => format!(
            "{} y {}",
            parts[..parts.len() - 1].join(", "),
            parts[parts.len() - 1]
        ),
    }
}

fn is_noise_token(token: &str) -> bool {
    let letters: String = token
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect::<String>()
        .to_lowercase();
    if letters.len() <= 2 {
        return true;
    }
    matches!(letters.as_str(), "nan" | "null" | "none")
}

/// Filters the free-text subjects down to a short presentable phrase,
/// dropping tokens without vowels, placeholder values and low-diversity
/// keyboard mashing. Returns an empty string when nothing survives.
fn clean_subjects(subjects: &str) -> String {
    let mut clean = Vec::new();
    for part in subjects.split([',', ';', '\n']) {
        let part = part.trim();
        if part.is_empty() || is_noise_token(part) {
            continue;
        }
        if !part.chars().any(|c| c.is_alphabetic()) {
            continue;
        }
        if !part
            .to_lowercase()
            .chars()
            .any(|c| "aeiouáéíóú".contains(c))
        {
            continue;
        }
        let distinct: std::collections::HashSet<char> = part
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphabetic())
            .collect();
        if distinct.len() < 3 && part.len() > 4 {
            continue;
        }
        clean.push(part.to_string());
        if clean.len() == 3 {
            break;
        }
    }
    clean.join(", ")
}

/// Picks up to two presentable technical skills from the posting's skills
/// field for quoting in an explanation.
fn pick_skills(skills: &str) -> Vec<String> {
    let mut picked = Vec::new();
    for part in skills.split([',', ';']) {
        let part = part.trim().trim_end_matches("...");
        if part.is_empty() || part.len() > 40 || is_noise_token(part) {
            continue;
        }
        let punct = part.chars().filter(|c| !c.is_alphanumeric() && !c.is_whitespace()).count();
        let digits = part.chars().filter(char::is_ascii_digit).count();
        if punct * 5 > part.len() * 2 || digits * 5 > part.len() * 2 {
            continue;
        }
        picked.push(part.to_string());
        if picked.len() == 2 {
            break;
        }
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(title: &str, skills: &str, eurace: &str) -> Recommendation {
        Recommendation {
            rank: 1,
            similarity: 0.5,
            title: title.into(),
            description: "desc".into(),
            eurace_skills: eurace.into(),
            skills: skills.into(),
            url: String::new(),
            cosine_similarity: 0.5,
            cosine_angle_deg: 60.0,
            explanation: None,
        }
    }

    fn ctx<'a>(ratings: &'a [i64]) -> ExplainContext<'a> {
        ExplainContext {
            career: "Ingenieria En Software",
            subjects: "Python, Bases de Datos",
            ratings,
        }
    }

    #[test]
    fn explanations_are_deterministic() {
        let r = rec("Desarrollador Python", "python, sql", "liderazgo");
        let ratings = [3; 7];
        let a = TemplatePersonalizer::explain_one(&r, ctx(&ratings));
        let b = TemplatePersonalizer::explain_one(&r, ctx(&ratings));
        assert_eq!(a, b);
        assert!(a.contains("Desarrollador Python"));
        assert!(a.contains("Ingenieria En Software"));
        assert!(a.contains("Asignaturas relevantes"));
    }

    #[test]
    fn noise_subjects_are_scrubbed() {
        assert_eq!(clean_subjects("sdfgh, nan, 12345, Python"), "Python");
        assert_eq!(clean_subjects(""), "");
        assert_eq!(clean_subjects("xxxxx"), "");
        assert_eq!(
            clean_subjects("Redes; Calculo Vectorial\nQuimica, Fisica"),
            "Redes, Calculo Vectorial, Quimica"
        );
    }

    #[test]
    fn skills_picking_skips_noise_and_long_fragments() {
        let picked = pick_skills("nan, python, sql, una frase larguisima que no cabe en una etiqueta razonable");
        assert_eq!(picked, vec!["python".to_string(), "sql".to_string()]);
        assert!(pick_skills("nan, n/a").is_empty());
    }

    #[test]
    fn alternative_explanation_names_the_suggested_skills() {
        let r = rec("Scrum Master", "jira", "gestion y equipo");
        let line = TemplatePersonalizer::explain_alternative(
            &r,
            &["Gestión".to_string(), "Liderazgo".to_string()],
        );
        assert!(line.contains("Gestión y Liderazgo"));
        assert!(line.contains("jira"));
        let bare = TemplatePersonalizer::explain_alternative(&r, &[]);
        assert!(bare.contains("habilidades blandas prioritarias"));
    }

    #[test]
    fn advice_prioritizes_the_lowest_rated_labels() {
        let ratings = [3, 4, 2, 4, 4, 3, 5];
        let advice = TemplatePersonalizer::advice(ctx(&ratings));
        // Liderazgo (2) and Gestión (3) are the two weakest
        assert!(advice.contains("Liderazgo"));
        assert!(advice.contains("Gestión"));
        assert!(advice.contains("Ya destacas en"));
    }

    #[test]
    fn advice_without_weak_skills_stays_generic() {
        let ratings = [5, 5, 4, 5, 4, 5, 5];
        let advice = TemplatePersonalizer::advice(ctx(&ratings));
        assert!(advice.contains("tus habilidades blandas clave"));
    }

    #[test]
    fn spanish_join_forms() {
        let one = vec!["a".to_string()];
        let two = vec!["a".to_string(), "b".to_string()];
        let three = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(spanish_join(&one), "a");
        assert_eq!(spanish_join(&two), "a y b");
        assert_eq!(spanish_join(&three), "a, b y c");
    }

    #[tokio::test]
    async fn batch_explanations_align_with_input() {
        let p = TemplatePersonalizer::new(false);
        let ratings = [3; 7];
        let recs = vec![
            rec("Dev Backend", "python", ""),
            rec("Dev Frontend", "react", "comunicacion"),
        ];
        let out = p.explain_batch(&recs, ctx(&ratings)).await;
        assert_eq!(out.len(), 2);
        assert!(out[0].contains("Dev Backend"));
        assert!(out[1].contains("Dev Frontend"));
    }
}
