//! Terminal rendering of workflow state.
//!
//! Everything here is a pure function of the observed state.

use std::fmt;

use saucier_core::{
    GeneratedRecipe, Recipe, RecipePhase, RecipeState, WinePairing, WinePairingPhase,
    WinePairingState,
};
use serde::Serialize;

/// One-line progress message for a loading phase.
pub fn recipe_progress(state: &RecipeState) -> Option<&'static str> {
    match state.phase {
        RecipePhase::GeneratingRecipe => Some("Generating recipe..."),
        RecipePhase::GeneratingImage => Some("Generating image..."),
        _ => None,
    }
}

pub fn render_recipe_state(state: &RecipeState) -> String {
    if let Some(error) = &state.error {
        return format!("{error}\n");
    }

    match &state.recipe {
        Some(generated) => render_recipe(&generated.recipe, state.image_url()),
        None => "Generate a recipe to see it displayed here!\n".to_string(),
    }
}

pub fn render_recipe(recipe: &Recipe, image_url: Option<&str>) -> String {
    RecipeCard { recipe, image_url }.to_string()
}

pub fn render_wine_state(state: &WinePairingState) -> String {
    WinePairingList(state).to_string()
}

struct RecipeCard<'a> {
    recipe: &'a Recipe,
    image_url: Option<&'a str>,
}

impl fmt::Display for RecipeCard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let recipe = self.recipe;

        writeln!(f, "{}", recipe.name)?;
        writeln!(f, "{}", "=".repeat(recipe.name.chars().count()))?;
        writeln!(f, "{}\n", recipe.description)?;
        writeln!(f, "Photo: {}\n", self.image_url.unwrap_or("(none)"))?;

        writeln!(f, "Chef's Note: {}\n", recipe.chef_note)?;
        writeln!(f, "Prep Time: {}", recipe.prep_time)?;
        writeln!(f, "Cook Time: {}", recipe.cook_time)?;
        writeln!(f, "Total Time: {}", recipe.total_time)?;
        writeln!(f, "Servings: {}\n", recipe.servings)?;

        writeln!(f, "Ingredients:")?;
        for ingredient in &recipe.ingredients {
            writeln!(f, "  - {ingredient}")?;
        }
        writeln!(f)?;

        writeln!(f, "Instructions:")?;
        for (i, step) in recipe.instructions.iter().enumerate() {
            writeln!(f, "  {}. {step}", i + 1)?;
        }
        writeln!(f)?;

        writeln!(f, "Chef's Secret: {}", recipe.chefs_secret)?;
        writeln!(f, "Plating Tip: {}", recipe.plating_tip)
    }
}

struct WinePairingList<'a>(&'a WinePairingState);

impl fmt::Display for WinePairingList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0;
        writeln!(f, "Wine Pairings\n-------------")?;

        if state.phase == WinePairingPhase::Loading {
            return writeln!(f, "Generating wine pairings...");
        }
        if let Some(message) = state.error_message() {
            return writeln!(f, "{message}");
        }
        if state.pairings.is_empty() {
            return writeln!(f, "No wine pairings generated yet.");
        }

        for (i, pairing) in state.pairings.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, pairing.wine_type)?;
            writeln!(f, "   {}", pairing.pairing_notes)?;
        }
        Ok(())
    }
}

/// Final result of `generate --json`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateOutput<'a> {
    recipe: Option<&'a GeneratedRecipe>,
    image_url: Option<&'a str>,
    error: Option<&'a str>,
    wine_pairings: &'a [WinePairing],
    wine_pairing_error: Option<String>,
}

pub fn render_json(
    recipe: &RecipeState,
    wine: Option<&WinePairingState>,
) -> serde_json::Result<String> {
    let output = GenerateOutput {
        recipe: recipe.recipe.as_deref(),
        image_url: recipe.image_url(),
        error: recipe.error.as_deref(),
        wine_pairings: wine.map(|w| w.pairings.as_slice()).unwrap_or_default(),
        wine_pairing_error: wine.and_then(|w| w.error_message()),
    };

    serde_json::to_string_pretty(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use saucier_core::ai::GeneratedImage;
    use saucier_core::WinePairingError;

    fn recipe() -> Recipe {
        Recipe {
            name: "Spaghetti Carbonara".to_string(),
            description: "A classic Italian pasta dish.".to_string(),
            chef_note: "Work quickly when combining the pasta with the eggs.".to_string(),
            prep_time: "10 minutes".to_string(),
            cook_time: "15 minutes".to_string(),
            total_time: "25 minutes".to_string(),
            servings: "4".to_string(),
            ingredients: vec!["400g spaghetti".to_string(), "4 large eggs".to_string()],
            instructions: vec![
                "Boil the pasta.".to_string(),
                "Toss with the eggs.".to_string(),
            ],
            chefs_secret: "Use freshly grated Parmesan.".to_string(),
            plating_tip: "Serve in warmed bowls.".to_string(),
        }
    }

    #[test]
    fn test_render_recipe() {
        let out = render_recipe(&recipe(), Some("https://images.example/carbonara.png"));

        assert!(out.starts_with("Spaghetti Carbonara\n===================\n"));
        assert!(out.contains("Photo: https://images.example/carbonara.png\n"));
        assert!(out.contains("Total Time: 25 minutes"));
        assert!(out.contains("Ingredients:\n  - 400g spaghetti\n  - 4 large eggs\n\n"));
        assert!(out.contains("  2. Toss with the eggs.\n"));
        assert!(out.ends_with("Plating Tip: Serve in warmed bowls.\n"));
    }

    #[test]
    fn test_render_recipe_state_variants() {
        let idle = RecipeState::default();
        assert!(render_recipe_state(&idle).contains("Generate a recipe"));
        assert_eq!(recipe_progress(&idle), None);

        let failed = RecipeState {
            phase: RecipePhase::Failed,
            error: Some("Sorry, something went wrong.".to_string()),
            ..Default::default()
        };
        assert_eq!(render_recipe_state(&failed), "Sorry, something went wrong.\n");

        let ready = RecipeState {
            phase: RecipePhase::GeneratingImage,
            recipe: Some(GeneratedRecipe::new("pasta", recipe())),
            ..Default::default()
        };
        assert!(render_recipe_state(&ready).contains("Photo: (none)"));
        assert_eq!(recipe_progress(&ready), Some("Generating image..."));
    }

    #[test]
    fn test_render_wine_state() {
        let loading = WinePairingState {
            phase: WinePairingPhase::Loading,
            ..Default::default()
        };
        assert!(render_wine_state(&loading).contains("Generating wine pairings..."));

        let failed = WinePairingState {
            phase: WinePairingPhase::Failed,
            error: Some(WinePairingError::Parse),
            ..Default::default()
        };
        assert!(render_wine_state(&failed).contains("Error parsing wine pairings"));

        let empty = WinePairingState {
            phase: WinePairingPhase::Ready,
            ..Default::default()
        };
        assert!(render_wine_state(&empty).contains("No wine pairings generated yet."));

        let ready = WinePairingState {
            phase: WinePairingPhase::Ready,
            pairings: vec![WinePairing {
                wine_type: "Frascati".to_string(),
                pairing_notes: "Crisp enough to cut the richness.".to_string(),
            }],
            ..Default::default()
        };
        assert_eq!(
            render_wine_state(&ready),
            "Wine Pairings\n-------------\n1. Frascati\n   Crisp enough to cut the richness.\n"
        );
    }

    #[test]
    fn test_render_json_includes_generation_metadata() {
        let generated = GeneratedRecipe::new("pasta", recipe());
        let state = RecipeState {
            phase: RecipePhase::Ready,
            recipe: Some(generated.clone()),
            image: Some(GeneratedImage {
                url: "https://images.example/carbonara.png".to_string(),
                revised_prompt: None,
            }),
            error: None,
        };
        let wine = WinePairingState {
            phase: WinePairingPhase::Failed,
            recipe: Some(generated.clone()),
            error: Some(WinePairingError::Generation),
            ..Default::default()
        };

        let json: serde_json::Value =
            serde_json::from_str(&render_json(&state, Some(&wine)).unwrap()).unwrap();

        assert_eq!(json["recipe"]["id"], generated.id.to_string());
        assert_eq!(json["recipe"]["input"], "pasta");
        assert_eq!(json["recipe"]["recipe"]["name"], "Spaghetti Carbonara");
        assert!(json["recipe"]["generatedAt"].is_string());
        assert_eq!(json["imageUrl"], "https://images.example/carbonara.png");
        assert!(json["error"].is_null());
        assert_eq!(json["winePairings"], serde_json::json!([]));
        assert_eq!(
            json["winePairingError"],
            "Error generating wine pairings. Please try again."
        );
    }

    #[test]
    fn test_render_json_without_recipe() {
        let state = RecipeState {
            phase: RecipePhase::Failed,
            error: Some("Sorry, something went wrong.".to_string()),
            ..Default::default()
        };

        let json: serde_json::Value =
            serde_json::from_str(&render_json(&state, None).unwrap()).unwrap();

        assert!(json["recipe"].is_null());
        assert_eq!(json["error"], "Sorry, something went wrong.");
        assert!(json["winePairingError"].is_null());
    }
}
