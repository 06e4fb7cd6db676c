//! Prompt templates.

pub mod recipe;
pub mod recipe_image;
pub mod wine_pairing;

pub use recipe::{render_recipe_prompt, RECIPE_PROMPT_NAME};
pub use recipe_image::{render_recipe_image_prompt, RECIPE_IMAGE_PROMPT_NAME};
pub use wine_pairing::{render_wine_pairing_prompt, WINE_PAIRING_PROMPT_NAME};
