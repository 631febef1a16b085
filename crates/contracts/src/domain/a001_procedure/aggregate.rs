use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::sanitize::SanitizeMode;
use crate::shared::schema::Schema;

// ============================================================================
// Select options
// ============================================================================

pub const PROCEDURE_CATEGORIES: &[&str] = &[
    "Urbanisme",
    "État civil",
    "Fiscalité",
    "Commerce",
    "Social",
    "Santé",
    "Éducation",
    "Transport",
    "Environnement",
    "Agriculture",
];

pub const ORGANIZATIONS: &[&str] = &[
    "Ministère de l'Intérieur",
    "Ministère des Finances",
    "Ministère de la Justice",
    "Ministère de la Santé",
    "Ministère de l'Éducation",
    "Ministère du Commerce",
    "Ministère de l'Agriculture",
    "Ministère des Transports",
    "Wilaya",
    "Commune",
    "Direction des Impôts",
    "Tribunal",
    "Office National des Statistiques",
];

pub const DURATION_OPTIONS: &[&str] = &[
    "1 jour",
    "2-3 jours",
    "1 semaine",
    "2 semaines",
    "1 mois",
    "2-3 mois",
    "Plus de 3 mois",
];

// ============================================================================
// DTO
// ============================================================================

/// One step of an administrative procedure, as the citizen goes through it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureStepDto {
    pub title: String,
    pub description: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<String>>,
}

/// Administrative procedure as submitted by the creation wizard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureDto {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub steps: Vec<ProcedureStepDto>,
    pub estimated_duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    pub requirements: Vec<String>,
    pub responsible_organization: String,
}

impl ProcedureDto {
    /// Build from the output of a successful `procedure_schema()` validation
    pub fn from_validated(data: Value) -> Result<Self, String> {
        serde_json::from_value(data).map_err(|e| format!("Procédure invalide : {}", e))
    }
}

pub fn procedure_step_schema() -> Schema {
    Schema::object()
        .field(
            "title",
            Schema::string()
                .non_empty("Le titre de l'étape est requis")
                .sanitize(SanitizeMode::Text),
        )
        .field(
            "description",
            Schema::string().sanitize(SanitizeMode::Html),
        )
        .field("required", Schema::boolean())
        .optional("documents", Schema::array(Schema::string()))
        .into()
}

pub fn procedure_schema() -> Schema {
    Schema::object()
        .field(
            "name",
            Schema::string()
                .min_length(5, "Le nom doit contenir au moins 5 caractères")
                .max_length(150, "Le nom ne peut pas dépasser 150 caractères")
                .sanitize(SanitizeMode::Text),
        )
        .field(
            "description",
            Schema::string()
                .min_length(20, "La description doit contenir au moins 20 caractères")
                .max_length(1000, "La description ne peut pas dépasser 1000 caractères")
                .sanitize(SanitizeMode::Html),
        )
        .optional(
            "category",
            Schema::enumeration(PROCEDURE_CATEGORIES.iter().copied())
                .message("Catégorie inconnue"),
        )
        .field(
            "steps",
            Schema::array(procedure_step_schema())
                .min_items(1, "Au moins une étape est requise"),
        )
        .field(
            "estimatedDuration",
            Schema::string().sanitize(SanitizeMode::Text),
        )
        .optional(
            "cost",
            Schema::number().min(0.0, "Le coût ne peut pas être négatif"),
        )
        .field(
            "requirements",
            Schema::array(Schema::string().sanitize(SanitizeMode::Text)),
        )
        .field(
            "responsibleOrganization",
            Schema::string().sanitize(SanitizeMode::Text),
        )
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn permit() -> Value {
        json!({
            "name": "Demande de permis",
            "description": "<p>Permis de construire pour une habitation individuelle</p>",
            "category": "Urbanisme",
            "steps": [
                { "id": "s1", "title": "Dépôt du dossier", "description": "Au guichet", "required": true }
            ],
            "estimatedDuration": "1 mois",
            "requirements": ["Pièce d'identité"],
            "responsibleOrganization": "Commune"
        })
    }

    #[test]
    fn test_valid_procedure_round_trips_into_dto() {
        let result = procedure_schema().validate(&permit());
        assert!(result.success, "{:?}", result.errors);

        let dto = ProcedureDto::from_validated(result.data.unwrap()).unwrap();
        assert_eq!(dto.name, "Demande de permis");
        assert_eq!(dto.steps.len(), 1);
        assert_eq!(dto.steps[0].documents, None);
        assert_eq!(dto.cost, None);
    }

    #[test]
    fn test_empty_procedure_reports_each_field() {
        let result = procedure_schema().validate(&json!({ "steps": [], "requirements": [] }));
        let paths: Vec<String> = result.errors.iter().map(|e| e.joined_path()).collect();
        assert_eq!(
            paths,
            vec![
                "name",
                "description",
                "steps",
                "estimatedDuration",
                "responsibleOrganization"
            ]
        );
    }

    #[test]
    fn test_negative_cost_and_unknown_category() {
        let mut input = permit();
        input["cost"] = json!(-10);
        input["category"] = json!("Sport");
        let result = procedure_schema().validate(&input);
        assert_eq!(
            result.messages(),
            vec!["Catégorie inconnue", "Le coût ne peut pas être négatif"]
        );
    }
}
