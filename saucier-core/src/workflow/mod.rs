//! Workflow controllers for recipe generation and wine pairing.
//!
//! - `RecipeWorkflow` turns user input into a recipe and then a photo, in order.
//! - `WinePairingWorkflow` reacts to every new recipe and asks for pairings.
//! - `RecipeSession` wires the two together the way an application uses them.
//!
//! Each controller owns its state and publishes it through a `watch` channel.
//! Failures never escape a controller; they become part of its state.

mod recipe;
mod wine;

pub use recipe::{
    RecipePhase, RecipeRunOutcome, RecipeState, RecipeWorkflow, RECIPE_ERROR_MESSAGE,
};
pub use wine::{
    PairingRunOutcome, WinePairingError, WinePairingPhase, WinePairingState, WinePairingWorkflow,
};

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::ai::AiClient;

/// Runs a closure when dropped, including when the owning future is cancelled.
pub(crate) struct OnDrop<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> OnDrop<F> {
    pub(crate) fn new(f: F) -> Self {
        Self(Some(f))
    }
}

impl<F: FnOnce()> Drop for OnDrop<F> {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

/// Both controllers sharing one client, with wine pairing subscribed to recipes.
///
/// Must be created inside a Tokio runtime. Dropping the session stops the
/// wine pairing observer.
pub struct RecipeSession {
    pub recipe: Arc<RecipeWorkflow>,
    pub wine: Arc<WinePairingWorkflow>,
    observer: JoinHandle<()>,
}

impl RecipeSession {
    pub fn start(client: Arc<dyn AiClient>) -> Self {
        let recipe = Arc::new(RecipeWorkflow::new(client.clone()));
        let wine = Arc::new(WinePairingWorkflow::new(client));
        let observer = wine.clone().observe(recipe.recipe_updates());

        Self {
            recipe,
            wine,
            observer,
        }
    }
}

impl Drop for RecipeSession {
    fn drop(&mut self) {
        self.observer.abort();
    }
}
