//! AI coaching report returned by `GET /api/coaching`

use serde::{Deserialize, Serialize};

/// Portfolio-wide coaching: strengths, weaknesses and a weekly mission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoachingReport {
    /// Overall skill level assessment
    #[serde(default, rename = "resumen_nivel")]
    pub level_summary: Option<String>,
    #[serde(default, rename = "fortalezas")]
    pub strengths: Vec<CoachingItem>,
    #[serde(default, rename = "debilidades")]
    pub weaknesses: Vec<CoachingItem>,
    /// Recurring mistakes across the portfolio
    #[serde(default, rename = "patron_errores")]
    pub error_pattern: Option<String>,
    #[serde(default, rename = "mision_semanal")]
    pub weekly_mission: Option<WeeklyMission>,
    #[serde(default)]
    pub sweet_spot: Option<String>,
    #[serde(default, rename = "proximo_objetivo")]
    pub next_goal: Option<String>,
}

impl CoachingReport {
    /// Number of detected patterns (strengths plus weaknesses)
    pub fn pattern_count(&self) -> usize {
        self.strengths.len() + self.weaknesses.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoachingItem {
    #[serde(default, rename = "titulo")]
    pub title: String,
    #[serde(default, rename = "detalle")]
    pub detail: String,
    /// Example file names, comma separated
    #[serde(default, rename = "fotos_ejemplo")]
    pub example_photos: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyMission {
    #[serde(default, rename = "titulo")]
    pub title: String,
    #[serde(default, rename = "descripcion")]
    pub description: String,
    #[serde(default, rename = "ejercicio")]
    pub exercise: Option<String>,
    #[serde(default, rename = "settings_sugeridos")]
    pub suggested_settings: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coaching_wire_names() {
        let json = serde_json::json!({
            "resumen_nivel": "Intermedio",
            "fortalezas": [{"titulo": "Luz", "detalle": "Buen uso de golden hour", "fotos_ejemplo": "a.jpg, b.jpg"}],
            "debilidades": [{"titulo": "Horizonte", "detalle": "Torcido"}],
            "mision_semanal": {"titulo": "Regla de tercios", "descripcion": "Practicar", "ejercicio": "10 fotos"},
            "sweet_spot": "Retratos",
        });
        let report: CoachingReport = serde_json::from_value(json).unwrap();

        assert_eq!(report.level_summary.as_deref(), Some("Intermedio"));
        assert_eq!(report.pattern_count(), 2);
        assert_eq!(report.weaknesses[0].example_photos, None);
        let mission = report.weekly_mission.unwrap();
        assert_eq!(mission.title, "Regla de tercios");
        assert_eq!(mission.suggested_settings, None);
        assert_eq!(report.next_goal, None);
    }
}
