//! Sommelier prompt for wine pairings.

use crate::types::Recipe;

/// Prompt name for logs and call accounting.
pub const WINE_PAIRING_PROMPT_NAME: &str = "wine_pairing";

/// Render the wine pairing prompt from the recipe name, description and ingredients.
pub fn render_wine_pairing_prompt(recipe: &Recipe) -> String {
    format!(
        r#"Imagine you are a wine sommelier making a list of recommended wine pairings to go with a meal. Based on the following recipe, suggest 3 wine pairings:

Recipe Name: {name}
Description: {description}
Ingredients: {ingredients}

Please provide your three recommendations in the following JSON format:

{{
  "recipeName": "Name of the recipe",
  "winePairings": [
    {{
      "wineType": "Name of wine varietal or blend",
      "pairingNotes": "Brief explanation of why this wine pairs well with the dish"
    }},
    {{
      "wineType": "Name of another wine varietal or blend",
      "pairingNotes": "Brief explanation of why this wine pairs well with the dish"
    }},
    {{
      "wineType": "Name of a third wine varietal or blend",
      "pairingNotes": "Brief explanation of why this wine pairs well with the dish"
    }}
  ]
}}

Guidelines for your recommendations:

* Consider the main ingredients, flavors, and cooking methods in the recipe
* Provide a mix of red, white, and/or sparkling wines as appropriate
* Include both Old World and New World wine options when possible
* Consider the intensity of flavors in the dish and match with appropriate wine body
* Think about complementary and contrasting flavor pairings
* Take into account any sauces, spices, or dominant flavors that might influence the pairing
* If the recipe has a specific cultural origin, consider traditional wine pairings from that region

Your recommendations should be specific (e.g., "Chablis" rather than just "Chardonnay") and your pairing notes should be concise but informative, explaining why each wine works well with the dish."#,
        name = recipe.name,
        description = recipe.description,
        ingredients = recipe.ingredients.join(", ")
    )
}
