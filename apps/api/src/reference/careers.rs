#![allow(dead_code)]

//! Career name resolution: survey spellings to canonical career keys, and
//! canonical keys to the posting-source files backing them. Both tables are
//! static reference data; the only normalization performed here is trimming.

use std::path::PathBuf;

/// Survey spellings (as exported from the intake Excel) to canonical career
/// keys, the column names of the academic profile matrix.
const SURVEY_CAREER_MAP: &[(&str, &str)] = &[
    ("(RRA20) COMPUTACIÓN", "Ingenieria En Ciencias De La Computacion"),
    ("(RRA20) AGROINDUSTRIA", "Ingenieria Agroindustria"),
    (
        "(RRA20) ADMINISTRACIÓN DE EMPRESAS",
        "Licenciatura Administracion De Empresas",
    ),
    ("(RRA20) INGENIERÍA AMBIENTAL", "Ingenieria Ambiental"),
    ("(RRA20) ECONOMÍA", "Economia"),
    ("INGENIERIA EN CIENCIAS ECONOMICAS Y FINANCIERAS", "Economia"),
    ("(RRA20) ELECTRICIDAD", "Ingenieria En Electricidad"),
    (
        "(RRA20) ELECTRÓNICA Y AUTOMATIZACIÓN",
        "Ingenieria En Electronica Y Automatizacion",
    ),
    ("(RRA20) FÍSICA", "Fisica"),
    ("FISICA", "Fisica"),
    ("(RRA20) GEOLOGÍA", "Ingenieria En Geologia"),
    ("INGENIERIA GEOLOGICA", "Ingenieria En Geologia"),
    (
        "(RRA20) INGENIERÍA DE LA PRODUCCIÓN",
        "Ingenieria De La Produccion",
    ),
    ("(RRA20) MATEMÁTICA", "Matematica"),
    ("(RRA20) MECÁNICA", "Ingenieria En Mecanica"),
    ("INGENIERIA MECANICA", "Ingenieria En Mecanica"),
    ("(RRA20) PETRÓLEOS", "Ingenieria En Petroleos"),
    ("(RRA20) INGENIERÍA QUÍMICA", "Ingenieria Quimica"),
    ("(RRA20) DESARROLLO DE SOFTWARE", "Ingenieria En Software"),
    ("(RRA20) SOFTWARE", "Ingenieria En Software"),
    ("(RRA20) TELECOMUNICACIONES", "Ingenieria En Telecomunicaciones"),
    ("(RRA20) INGENIERÍA CIVIL", "Ingenieria Civil"),
];

/// Canonical career key to posting-source CSV locations, relative to the
/// offers root. Careers with more than one entry are unions of independently
/// scraped corpora; list order is the concatenation order, which in turn
/// fixes the ranking index space.
const CAREER_SOURCES: &[(&str, &[&str])] = &[
    (
        "Ingenieria En Ciencias De La Computacion",
        &["todas_las_plataformas/Computación/Computación_Merged.csv"],
    ),
    (
        "Ingenieria Agroindustria",
        &["todas_las_plataformas/Agroindustria/Agroindustria_Merged.csv"],
    ),
    (
        "Licenciatura Administracion De Empresas",
        &["todas_las_plataformas/Administración_de_Empresas/Administración_de_Empresas_Merged.csv"],
    ),
    (
        "Ingenieria Ambiental",
        &["todas_las_plataformas/Ingeniería_Ambiental/Ingeniería_Ambiental_Merged.csv"],
    ),
    ("Economia", &["todas_las_plataformas/Economía/Economía_Merged.csv"]),
    (
        "Ingenieria En Electricidad",
        &["todas_las_plataformas/Electricidad/Electricidad_Merged.csv"],
    ),
    (
        "Ingenieria En Electronica Y Automatizacion",
        &["todas_las_plataformas/Electrónica_y_Automatización/Electrónica_y_Automatización_Merged.csv"],
    ),
    ("Fisica", &["todas_las_plataformas/Física/Física_Merged.csv"]),
    (
        "Ingenieria En Geologia",
        &["todas_las_plataformas/Geología/Geología_Merged.csv"],
    ),
    (
        "Ingenieria De La Produccion",
        &["todas_las_plataformas/Ingeniería_de_la_Producción/Ingeniería_de_la_Producción_Merged.csv"],
    ),
    (
        "Ingenieria En Materiales",
        &["todas_las_plataformas/Materiales/Materiales_Merged.csv"],
    ),
    (
        "Ingenieria En Mecanica",
        &["todas_las_plataformas/Mecánica/Mecánica_Merged.csv"],
    ),
    (
        "Ingenieria En Mecatronica",
        &["todas_las_plataformas/Mecatrónica/Mecatrónica_Merged.csv"],
    ),
    (
        "Ingenieria En Petroleos",
        &["todas_las_plataformas/Petróleos/Petróleos_Merged.csv"],
    ),
    (
        "Ingenieria Quimica",
        &["todas_las_plataformas/Ingeniería_Química/Ingeniería_Química_Merged.csv"],
    ),
    (
        "Ingenieria En Telecomunicaciones",
        &["todas_las_plataformas/Telecomunicaciones/Telecomunicaciones_Merged.csv"],
    ),
    (
        "Ingenieria Civil",
        &["todas_las_plataformas/Ingeniería_Civil/Ingeniería_Civil_Merged.csv"],
    ),
    (
        "Matematica",
        &["todas_las_plataformas/Matemática/Matemática_Merged.csv"],
    ),
    (
        "Matematica Aplicada",
        &["todas_las_plataformas/Matemática_Aplicada/Matemática_Aplicada_Merged.csv"],
    ),
    (
        "Ingenieria En Software",
        &["todas_las_plataformas/Software/Software_Merged.csv"],
    ),
    (
        "Ingenieria En Ciencias De Datos",
        &["todas_las_plataformas/Ciencia_de_Datos/Ciencia_de_Datos_Merged.csv"],
    ),
    // union career: both source corpora, in this order
    (
        "Ciencias De Datos E Inteligencia Artificial",
        &[
            "todas_las_plataformas/Inteligencia_Artificial/Inteligencia_Artificial_Merged.csv",
            "todas_las_plataformas/Ciencia_de_Datos/Ciencia_de_Datos_Merged.csv",
        ],
    ),
    (
        "Ingenieria En Sistemas De Informacion",
        &["todas_las_plataformas/Sistemas_de_Información/Sistemas_de_Información_Merged.csv"],
    ),
];

/// Lookup over the two static tables above. Constructed once at startup and
/// shared; `with_tables` exists so tests can point careers at fixture files.
#[derive(Debug, Clone)]
pub struct CareerResolver {
    survey_map: Vec<(String, String)>,
    sources: Vec<(String, Vec<PathBuf>)>,
}

impl Default for CareerResolver {
    fn default() -> Self {
        Self {
            survey_map: SURVEY_CAREER_MAP
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            sources: CAREER_SOURCES
                .iter()
                .map(|(career, paths)| {
                    (
                        career.to_string(),
                        paths.iter().map(PathBuf::from).collect(),
                    )
                })
                .collect(),
        }
    }
}

impl CareerResolver {
    pub fn with_tables(
        survey_map: Vec<(String, String)>,
        sources: Vec<(String, Vec<PathBuf>)>,
    ) -> Self {
        Self {
            survey_map,
            sources,
        }
    }

    /// Survey label to canonical career key. Trim plus exact match only;
    /// anything fuzzier is the caller's concern.
    pub fn map_career(&self, label: &str) -> Option<&str> {
        let label = label.trim();
        self.survey_map
            .iter()
            .find(|(survey, _)| survey == label)
            .map(|(_, canonical)| canonical.as_str())
    }

    /// Posting sources for a canonical career, in concatenation order.
    pub fn sources(&self, career: &str) -> Option<&[PathBuf]> {
        self.sources
            .iter()
            .find(|(key, _)| key == career)
            .map(|(_, paths)| paths.as_slice())
    }

    /// All canonical careers with configured posting sources.
    pub fn list_careers(&self) -> Vec<&str> {
        self.sources.iter().map(|(key, _)| key.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survey_label_maps_after_trimming() {
        let resolver = CareerResolver::default();
        assert_eq!(
            resolver.map_career("  (RRA20) SOFTWARE  "),
            Some("Ingenieria En Software")
        );
        assert_eq!(
            resolver.map_career("(RRA20) ECONOMÍA"),
            Some("Economia")
        );
        assert_eq!(resolver.map_career("(rra20) software"), None);
        assert_eq!(resolver.map_career("ASTRONOMIA"), None);
    }

    #[test]
    fn every_career_has_at_least_one_source() {
        let resolver = CareerResolver::default();
        for career in resolver.list_careers() {
            let sources = resolver.sources(career).unwrap();
            assert!(!sources.is_empty(), "career {career} has no sources");
        }
    }

    #[test]
    fn union_career_preserves_source_order() {
        let resolver = CareerResolver::default();
        let sources = resolver
            .sources("Ciencias De Datos E Inteligencia Artificial")
            .unwrap();
        assert_eq!(sources.len(), 2);
        assert!(sources[0].to_str().unwrap().contains("Inteligencia_Artificial"));
        assert!(sources[1].to_str().unwrap().contains("Ciencia_de_Datos"));
    }

    #[test]
    fn mapped_survey_careers_resolve_to_sources() {
        let resolver = CareerResolver::default();
        for (label, _) in SURVEY_CAREER_MAP {
            let canonical = resolver.map_career(label).unwrap().to_string();
            assert!(
                resolver.sources(&canonical).is_some(),
                "{canonical} has no posting sources"
            );
        }
    }
}
