use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

/// A generated recipe, exactly as the model returns it.
///
/// Every field is required. Quantities and durations stay free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub name: String,
    pub description: String,
    pub chef_note: String,
    pub prep_time: String,
    pub cook_time: String,
    pub total_time: String,
    pub servings: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub chefs_secret: String,
    pub plating_tip: String,
}

#[derive(Error, Debug)]
#[error("Recipe response does not match the expected schema: {0}")]
pub struct RecipeParseError(#[from] serde_json::Error);

impl Recipe {
    /// Decode a model response. Any missing or mistyped field rejects the whole recipe.
    pub fn parse(text: &str) -> Result<Self, RecipeParseError> {
        Ok(serde_json::from_str(text.trim())?)
    }

    /// Pretty-printed JSON, as embedded in the photography prompt.
    pub fn to_pretty_json(&self) -> String {
        // Serializing plain strings and string vectors cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// A recipe produced by one successful generation.
///
/// Immutable once created. Two values are the same recipe only if they share
/// an `id`; identical content from two generations counts as two recipes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecipe {
    pub id: Uuid,
    /// When the recipe text was parsed, before any photo was requested.
    pub generated_at: DateTime<Utc>,
    /// The user input the recipe was generated from.
    pub input: String,
    pub recipe: Recipe,
}

impl GeneratedRecipe {
    pub fn new(input: impl Into<String>, recipe: Recipe) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            input: input.into(),
            recipe,
        })
    }

    pub fn same_generation(&self, other: &GeneratedRecipe) -> bool {
        self.id == other.id
    }
}

/// Identity comparison for optional shared recipes.
pub fn same_recipe(a: Option<&Arc<GeneratedRecipe>>, b: Option<&Arc<GeneratedRecipe>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.same_generation(b),
        _ => false,
    }
}

/// A single wine recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinePairing {
    pub wine_type: String,
    pub pairing_notes: String,
}

#[derive(Error, Debug)]
pub enum WinePairingParseError {
    #[error("Wine pairing response is not valid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Unexpected response format: expected an array or an object with a winePairings array")]
    UnexpectedShape,

    #[error("Invalid wine pairing entry: {0}")]
    InvalidEntry(serde_json::Error),
}

/// Decode a wine pairing response.
///
/// Accepts `{"winePairings": [...]}` or a bare array. Other fields of the
/// object (such as `recipeName`) are ignored.
pub fn parse_wine_pairings(text: &str) -> Result<Vec<WinePairing>, WinePairingParseError> {
    let value: JsonValue =
        serde_json::from_str(text.trim()).map_err(WinePairingParseError::InvalidJson)?;

    let entries = match value {
        JsonValue::Object(mut map) => match map.remove("winePairings") {
            Some(array @ JsonValue::Array(_)) => array,
            _ => return Err(WinePairingParseError::UnexpectedShape),
        },
        array @ JsonValue::Array(_) => array,
        _ => return Err(WinePairingParseError::UnexpectedShape),
    };

    serde_json::from_value(entries).map_err(WinePairingParseError::InvalidEntry)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_recipe() -> Recipe {
        Recipe {
            name: "Seared Salmon with Charred Asparagus".to_string(),
            description: "Crisp-skinned salmon over blistered asparagus.".to_string(),
            chef_note: "Dry the skin well for a glassy crust.".to_string(),
            prep_time: "10 minutes".to_string(),
            cook_time: "15 minutes".to_string(),
            total_time: "25 minutes".to_string(),
            servings: "2".to_string(),
            ingredients: vec![
                "2 salmon fillets".to_string(),
                "1 bunch asparagus".to_string(),
                "1 lemon".to_string(),
                "2 cloves garlic".to_string(),
                "1 tbsp capers".to_string(),
            ],
            instructions: vec![
                "Pat the salmon dry.".to_string(),
                "Sear skin-side down until crisp.".to_string(),
                "Char the asparagus in the same pan.".to_string(),
            ],
            chefs_secret: "Finish with brown butter and capers.".to_string(),
            plating_tip: "Lean the salmon against the asparagus.".to_string(),
        }
    }

    #[test]
    fn test_recipe_uses_camel_case_fields() {
        let json = serde_json::to_value(sample_recipe()).unwrap();
        for field in [
            "name",
            "description",
            "chefNote",
            "prepTime",
            "cookTime",
            "totalTime",
            "servings",
            "ingredients",
            "instructions",
            "chefsSecret",
            "platingTip",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn test_recipe_parse_rejects_partial() {
        let mut json = serde_json::to_value(sample_recipe()).unwrap();
        json.as_object_mut().unwrap().remove("platingTip");
        assert!(Recipe::parse(&json.to_string()).is_err());
    }

    #[test]
    fn test_recipe_parse_rejects_mistyped_fields() {
        let mut json = serde_json::to_value(sample_recipe()).unwrap();
        json["ingredients"] = serde_json::json!("salmon, asparagus");
        assert!(Recipe::parse(&json.to_string()).is_err());

        assert!(Recipe::parse("not json at all").is_err());
    }

    #[test]
    fn test_recipe_parse_ignores_extra_fields() {
        let mut json = serde_json::to_value(sample_recipe()).unwrap();
        json["cuisine"] = serde_json::json!("French");
        assert_eq!(Recipe::parse(&json.to_string()).unwrap(), sample_recipe());
    }

    #[test]
    fn test_generated_recipe_identity() {
        let a = GeneratedRecipe::new("salmon", sample_recipe());
        let b = GeneratedRecipe::new("salmon", sample_recipe());

        assert!(a.same_generation(&a.clone()));
        assert!(!a.same_generation(&b));
        assert!(same_recipe(Some(&a), Some(&a)));
        assert!(!same_recipe(Some(&a), Some(&b)));
        assert!(!same_recipe(Some(&a), None));
        assert!(same_recipe(None, None));
    }

    #[test]
    fn test_generated_recipe_serializes_identity_and_time() {
        let before = Utc::now();
        let generated = GeneratedRecipe::new("salmon", sample_recipe());
        assert!(generated.generated_at >= before);
        assert!(generated.generated_at <= Utc::now());

        let json = serde_json::to_value(&*generated).unwrap();
        assert_eq!(json["id"], generated.id.to_string());
        assert_eq!(json["input"], "salmon");
        assert_eq!(json["recipe"]["chefNote"], sample_recipe().chef_note);

        let stamp: DateTime<Utc> = serde_json::from_value(json["generatedAt"].clone()).unwrap();
        assert_eq!(stamp, generated.generated_at);
    }

    #[test]
    fn test_parse_wine_pairings_object() {
        let pairings = parse_wine_pairings(
            r#"{"recipeName": "Salmon", "winePairings": [{"wineType": "Chablis", "pairingNotes": "x"}]}"#,
        )
        .unwrap();
        assert_eq!(pairings.len(), 1);
        assert_eq!(pairings[0].wine_type, "Chablis");
    }

    #[test]
    fn test_parse_wine_pairings_bare_array() {
        let pairings = parse_wine_pairings(
            r#"[{"wineType": "Sancerre", "pairingNotes": "a"}, {"wineType": "Sancerre", "pairingNotes": "b"}]"#,
        )
        .unwrap();
        assert_eq!(pairings.len(), 2);
        assert_eq!(pairings[1].pairing_notes, "b");

        assert!(parse_wine_pairings("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_wine_pairings_rejects_other_shapes() {
        assert!(matches!(
            parse_wine_pairings(r#"{"foo": 1}"#),
            Err(WinePairingParseError::UnexpectedShape)
        ));
        assert!(matches!(
            parse_wine_pairings(r#"{"winePairings": "Chablis"}"#),
            Err(WinePairingParseError::UnexpectedShape)
        ));
        assert!(matches!(
            parse_wine_pairings("42"),
            Err(WinePairingParseError::UnexpectedShape)
        ));
        assert!(matches!(
            parse_wine_pairings("Chablis, obviously"),
            Err(WinePairingParseError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_wine_pairings(r#"[{"wineType": "Chablis"}]"#),
            Err(WinePairingParseError::InvalidEntry(_))
        ));
    }
}
