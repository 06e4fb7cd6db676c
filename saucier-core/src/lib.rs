pub mod ai;
pub mod types;
pub mod workflow;

pub use ai::{AiClient, AiConfig, AiError, FakeAiClient, OpenAiClient};
pub use types::{parse_wine_pairings, GeneratedRecipe, Recipe, WinePairing};
pub use workflow::{
    PairingRunOutcome, RecipePhase, RecipeRunOutcome, RecipeSession, RecipeState, RecipeWorkflow,
    WinePairingError, WinePairingPhase, WinePairingState, WinePairingWorkflow,
};
