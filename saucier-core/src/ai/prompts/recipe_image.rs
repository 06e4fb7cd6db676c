//! Food photography prompt for a generated recipe.

use crate::types::Recipe;

/// Prompt name for logs and call accounting.
pub const RECIPE_IMAGE_PROMPT_NAME: &str = "recipe_image";

/// Render the image prompt with the full recipe serialized into it.
pub fn render_recipe_image_prompt(recipe: &Recipe) -> String {
    format!(
        r#"Imagine you are a food photographer taking pictures of food dishes for a recipe book. Generate a photo of a food dish resulting from the following recipe:
{recipe_json}
Key elements for the image:
1. The dish should be plated on a round plate
2. The plate should be sitting on a light white and grey granite countertop
3. The view of the photo should be directly from above (bird's-eye view)
Additional guidelines:
* Ensure the food is styled attractively and appetizingly
* Pay attention to color contrast between the food, plate, and countertop
* Include any relevant garnishes or accompaniments mentioned in the recipe
* The lighting should be bright and even, typical of professional food photography
* The focus should be sharp across the entire dish
* If the recipe includes a specific number of servings, try to represent that in the plating
Please generate a high-resolution, photorealistic image that accurately represents the recipe while adhering to these guidelines. The image should look as if it were taken by a professional food photographer for a high-end cookbook."#,
        recipe_json = recipe.to_pretty_json()
    )
}
