//! Recipe generation prompt.

/// Prompt name for logs and call accounting.
pub const RECIPE_PROMPT_NAME: &str = "recipe";

/// Render the recipe prompt for the user's ingredients or idea.
///
/// The input is embedded verbatim; an empty input still yields a complete prompt.
pub fn render_recipe_prompt(input: &str) -> String {
    format!(
        r#"# Michelin Star Chef Recipe Generation Prompt
Imagine you are a Michelin star chef creating a new recipe for a person preparing a home meal for themselves. Generate a recipe based on the following input and criteria:
Input: {input}
Criteria:
1. The recipe must be healthy
2. Use only whole, non-processed ingredients
3. Include 5-8 ingredients (excluding salt, pepper, and olive oil)
4. Total time to make should be under 30 minutes
5. The recipe should be simple to prepare, suitable for a home cook
6. Incorporate innovative techniques or flavor combinations that reflect your expertise as a Michelin star chef, while keeping the recipe accessible
Note: Assume the chef already has salt, pepper, and olive oil available. Do not include these in the ingredient list.
Please provide the recipe in the following JSON format:
{{
  "name": "Recipe Name",
  "description": "Brief description (1-2 sentences) highlighting the Michelin star quality",
  "chefNote": "A brief note from you as a Michelin star chef about what makes this recipe special",
  "prepTime": "Preparation time in minutes",
  "cookTime": "Cooking time in minutes",
  "totalTime": "Total time in minutes (must be under 30)",
  "servings": "Number of servings",
  "ingredients": [
    "Ingredient 1",
    "Ingredient 2",
    ...
  ],
  "instructions": [
    "Step 1",
    "Step 2",
    ...
  ],
  "chefsSecret": "A special tip or technique that elevates this dish",
  "platingTip": "A simple suggestion for presenting the dish in an elevated manner"
}}
Ensure that the recipe adheres to all the criteria mentioned above while incorporating elements from the input provided. Be creative and innovative, drawing from your expertise as a Michelin star chef, but keep the recipe practical and achievable for a home cook with limited time and ingredients.
Respond with the JSON object only, no other text."#,
        input = input.trim()
    )
}
