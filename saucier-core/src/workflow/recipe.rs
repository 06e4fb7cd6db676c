//! Recipe workflow: input -> recipe -> photo.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info_span, Instrument};

use super::OnDrop;
use crate::ai::prompts::{
    render_recipe_image_prompt, render_recipe_prompt, RECIPE_IMAGE_PROMPT_NAME, RECIPE_PROMPT_NAME,
};
use crate::ai::{AiClient, AiError, ChatRequest, GeneratedImage, ImageRequest};
use crate::types::{same_recipe, GeneratedRecipe, Recipe, RecipeParseError};

/// The one message shown for any recipe failure.
pub const RECIPE_ERROR_MESSAGE: &str =
    "Sorry, there was an error generating the recipe or image. Please try again.";

/// Where the recipe workflow is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecipePhase {
    #[default]
    Idle,
    GeneratingRecipe,
    GeneratingImage,
    Ready,
    Failed,
}

/// Observable state of the recipe workflow.
#[derive(Debug, Clone, Default)]
pub struct RecipeState {
    pub phase: RecipePhase,
    /// The current recipe. Kept while a replacement is being generated.
    pub recipe: Option<Arc<GeneratedRecipe>>,
    /// Photo of the current recipe, if one was generated.
    pub image: Option<GeneratedImage>,
    pub error: Option<String>,
}

impl RecipeState {
    pub fn is_loading(&self) -> bool {
        matches!(
            self.phase,
            RecipePhase::GeneratingRecipe | RecipePhase::GeneratingImage
        )
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image.as_ref().map(|i| i.url.as_str())
    }
}

/// How a call to [`RecipeWorkflow::generate`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeRunOutcome {
    Ready,
    /// The recipe is ready but no photo could be produced.
    ReadyWithoutImage,
    Failed,
    /// Another generation was in flight; this request was ignored.
    AlreadyRunning,
}

/// Why the text half of the chain failed. Logged, never shown.
#[derive(Error, Debug)]
enum RecipeStepError {
    #[error("recipe generation failed: {0}")]
    Generation(#[from] AiError),

    #[error(transparent)]
    Parse(#[from] RecipeParseError),
}

/// Owns the recipe generation chain and its state.
///
/// At most one chain runs at a time; requests made while one is in flight
/// are rejected rather than queued.
pub struct RecipeWorkflow {
    client: Arc<dyn AiClient>,
    state: watch::Sender<RecipeState>,
    recipes: watch::Sender<Option<Arc<GeneratedRecipe>>>,
    running: AtomicBool,
}

impl RecipeWorkflow {
    pub fn new(client: Arc<dyn AiClient>) -> Self {
        let (state, _) = watch::channel(RecipeState::default());
        let (recipes, _) = watch::channel(None);

        Self {
            client,
            state,
            recipes,
            running: AtomicBool::new(false),
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<RecipeState> {
        self.state.subscribe()
    }

    /// Subscribe to recipe identity changes only.
    ///
    /// A value is published when a new recipe is generated or when a failure
    /// clears the current one. Image updates do not publish.
    pub fn recipe_updates(&self) -> watch::Receiver<Option<Arc<GeneratedRecipe>>> {
        self.recipes.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> RecipeState {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Generate a recipe for the input, then a photo of it.
    pub async fn generate(&self, input: &str) -> RecipeRunOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!("Recipe generation already in progress, ignoring request");
            return RecipeRunOutcome::AlreadyRunning;
        }

        let _release = OnDrop::new(|| {
            self.settle();
            self.running.store(false, Ordering::Release);
        });

        let span = info_span!("recipe_workflow", input = %input);
        self.run_chain(input).instrument(span).await
    }

    async fn run_chain(&self, input: &str) -> RecipeRunOutcome {
        let start = Instant::now();

        self.state.send_modify(|s| {
            s.phase = RecipePhase::GeneratingRecipe;
            s.error = None;
        });

        let recipe = match self.generate_recipe(input).await {
            Ok(recipe) => recipe,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Error generating recipe"
                );
                self.fail();
                return RecipeRunOutcome::Failed;
            }
        };

        tracing::info!(
            recipe = %recipe.name,
            duration_ms = start.elapsed().as_millis() as u64,
            "Recipe generated"
        );

        let generated = GeneratedRecipe::new(input, recipe);
        self.state.send_modify(|s| {
            s.phase = RecipePhase::GeneratingImage;
            s.recipe = Some(generated.clone());
            s.image = None;
        });
        self.publish_recipe(Some(generated.clone()));

        let image = self.generate_image(&generated.recipe).await;
        let outcome = if image.is_some() {
            RecipeRunOutcome::Ready
        } else {
            RecipeRunOutcome::ReadyWithoutImage
        };

        self.state.send_modify(|s| {
            s.phase = RecipePhase::Ready;
            s.image = image;
        });

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            outcome = ?outcome,
            "Recipe workflow finished"
        );

        outcome
    }

    async fn generate_recipe(&self, input: &str) -> Result<Recipe, RecipeStepError> {
        let request = ChatRequest::json(render_recipe_prompt(input));

        let response = self
            .client
            .complete(RECIPE_PROMPT_NAME, request)
            .instrument(info_span!("generate_recipe"))
            .await?;

        tracing::debug!(content = %response.content, "Recipe response received");

        Ok(Recipe::parse(&response.content)?)
    }

    /// A missing or failed photo leaves the recipe usable.
    async fn generate_image(&self, recipe: &Recipe) -> Option<GeneratedImage> {
        let request = ImageRequest::single(render_recipe_image_prompt(recipe));

        match self
            .client
            .generate_image(RECIPE_IMAGE_PROMPT_NAME, request)
            .instrument(info_span!("generate_image"))
            .await
        {
            Ok(Some(image)) => Some(image),
            Ok(None) => {
                tracing::info!("No image returned for recipe");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Image generation failed, continuing without image");
                None
            }
        }
    }

    fn fail(&self) {
        self.state.send_modify(|s| {
            s.phase = RecipePhase::Failed;
            s.recipe = None;
            s.image = None;
            s.error = Some(RECIPE_ERROR_MESSAGE.to_string());
        });
        self.publish_recipe(None);
    }

    fn publish_recipe(&self, recipe: Option<Arc<GeneratedRecipe>>) {
        self.recipes.send_if_modified(|current| {
            if same_recipe(current.as_ref(), recipe.as_ref()) {
                return false;
            }
            *current = recipe;
            true
        });
    }

    /// Leave the loading phases if the chain ended without doing so.
    fn settle(&self) {
        self.state.send_if_modified(|s| {
            if !s.is_loading() {
                return false;
            }
            s.phase = if s.recipe.is_some() {
                RecipePhase::Ready
            } else {
                RecipePhase::Idle
            };
            true
        });
    }
}
