//! Wine pairing workflow, re-run for every new recipe.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info_span, Instrument};

use super::OnDrop;
use crate::ai::prompts::{render_wine_pairing_prompt, WINE_PAIRING_PROMPT_NAME};
use crate::ai::{AiClient, AiError, ChatRequest};
use crate::types::{parse_wine_pairings, GeneratedRecipe, Recipe, WinePairing};

/// User-visible wine pairing failures. All of them can be retried.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinePairingError {
    #[error("API key is missing. Please check your configuration.")]
    Configuration,

    #[error("Error parsing wine pairings. Please try again.")]
    Parse,

    #[error("Error generating wine pairings. Please try again.")]
    Generation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WinePairingPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Observable state of the wine pairing workflow.
#[derive(Debug, Clone, Default)]
pub struct WinePairingState {
    pub phase: WinePairingPhase,
    /// The recipe the pairings are for. Retries reuse it.
    pub recipe: Option<Arc<GeneratedRecipe>>,
    pub pairings: Vec<WinePairing>,
    pub error: Option<WinePairingError>,
}

impl WinePairingState {
    pub fn is_loading(&self) -> bool {
        self.phase == WinePairingPhase::Loading
    }

    /// Whether a retry should be offered.
    pub fn can_retry(&self) -> bool {
        self.error.is_some() && self.recipe.is_some()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.map(|e| e.to_string())
    }
}

/// How a pairing run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingRunOutcome {
    /// Pairings were stored; carries how many.
    Ready(usize),
    Failed(WinePairingError),
    /// A newer run started before this one finished; its result was dropped.
    Superseded,
    /// A retry was requested while a run was in flight.
    AlreadyRunning,
    /// A retry was requested with no recipe to pair.
    NoRecipe,
}

/// Owns the wine pairing chain and its state.
///
/// Every run takes a ticket. Only the run holding the latest ticket may
/// write its result, so a run for an older recipe can never overwrite
/// pairings for a newer one.
pub struct WinePairingWorkflow {
    client: Arc<dyn AiClient>,
    state: watch::Sender<WinePairingState>,
    ticket: AtomicU64,
    runs_started: AtomicUsize,
}

impl WinePairingWorkflow {
    pub fn new(client: Arc<dyn AiClient>) -> Self {
        let (state, _) = watch::channel(WinePairingState::default());

        Self {
            client,
            state,
            ticket: AtomicU64::new(0),
            runs_started: AtomicUsize::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WinePairingState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> WinePairingState {
        self.state.borrow().clone()
    }

    /// Number of runs that actually started (rejected retries excluded).
    pub fn runs_started(&self) -> usize {
        self.runs_started.load(Ordering::Relaxed)
    }

    /// Pair wines with a recipe, superseding any run in flight.
    pub async fn run(&self, recipe: Arc<GeneratedRecipe>) -> PairingRunOutcome {
        self.start(recipe, true).await
    }

    /// Run again for the current recipe. Rejected while a run is in flight.
    pub async fn retry(&self) -> PairingRunOutcome {
        let recipe = self.state.borrow().recipe.clone();
        match recipe {
            Some(recipe) => self.start(recipe, false).await,
            None => PairingRunOutcome::NoRecipe,
        }
    }

    /// Forget the current recipe and pairings.
    pub fn reset(&self) {
        self.state.send_if_modified(|s| {
            self.ticket.fetch_add(1, Ordering::SeqCst);
            let changed = s.recipe.is_some() || s.phase != WinePairingPhase::Idle;
            *s = WinePairingState::default();
            changed
        });
    }

    /// Follow a recipe channel: run once for the current recipe and once per
    /// new recipe after that. A recipe that arrives mid-run cancels that run.
    pub fn observe(
        self: Arc<Self>,
        mut recipes: watch::Receiver<Option<Arc<GeneratedRecipe>>>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let current = recipes.borrow_and_update().clone();

                match current {
                    None => self.reset(),
                    Some(recipe) => {
                        tracing::debug!(
                            recipe_id = %recipe.id,
                            "New recipe, generating wine pairings"
                        );

                        let run = self.run(recipe);
                        tokio::pin!(run);

                        tokio::select! {
                            _ = &mut run => {}
                            changed = recipes.changed() => match changed {
                                Ok(()) => {
                                    tracing::debug!("Recipe replaced mid-run, cancelling pairing");
                                    continue;
                                }
                                Err(_) => {
                                    // Producer is gone; nothing can supersede this run.
                                    run.await;
                                    break;
                                }
                            },
                        }
                    }
                }

                if recipes.changed().await.is_err() {
                    break;
                }
            }

            tracing::debug!("Recipe channel closed, wine pairing observer stopping");
        })
    }

    async fn start(&self, recipe: Arc<GeneratedRecipe>, supersede: bool) -> PairingRunOutcome {
        let mut ticket = 0;
        let started = self.state.send_if_modified(|s| {
            if !supersede && s.is_loading() {
                return false;
            }
            ticket = self.ticket.fetch_add(1, Ordering::SeqCst) + 1;

            let same = s
                .recipe
                .as_ref()
                .is_some_and(|current| current.same_generation(&recipe));
            if !same {
                s.pairings.clear();
                s.recipe = Some(recipe.clone());
            }
            s.phase = WinePairingPhase::Loading;
            s.error = None;
            true
        });

        if !started {
            tracing::info!("Wine pairing already in progress, ignoring retry");
            return PairingRunOutcome::AlreadyRunning;
        }

        self.runs_started.fetch_add(1, Ordering::Relaxed);
        let _settle = OnDrop::new(|| self.settle(ticket));

        let start = Instant::now();
        let span = info_span!(
            "wine_pairing_workflow",
            recipe_id = %recipe.id,
            recipe = %recipe.recipe.name,
            ticket
        );
        let result = self.generate_pairings(&recipe.recipe).instrument(span).await;

        tracing::info!(
            recipe_id = %recipe.id,
            duration_ms = start.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Wine pairing run finished"
        );

        self.finish(ticket, result)
    }

    async fn generate_pairings(
        &self,
        recipe: &Recipe,
    ) -> Result<Vec<WinePairing>, WinePairingError> {
        if !self.client.has_credential() {
            tracing::error!("API key is not set, skipping wine pairing request");
            return Err(WinePairingError::Configuration);
        }

        let request = ChatRequest::json(render_wine_pairing_prompt(recipe));

        let response = self
            .client
            .complete(WINE_PAIRING_PROMPT_NAME, request)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Error generating wine pairings");
                match e {
                    AiError::Config(_) => WinePairingError::Configuration,
                    _ => WinePairingError::Generation,
                }
            })?;

        let pairings = parse_wine_pairings(&response.content).map_err(|e| {
            tracing::warn!(error = %e, content = %response.content, "Error parsing wine pairings");
            WinePairingError::Parse
        })?;

        tracing::debug!(count = pairings.len(), "Wine pairings parsed");
        Ok(pairings)
    }

    fn finish(
        &self,
        ticket: u64,
        result: Result<Vec<WinePairing>, WinePairingError>,
    ) -> PairingRunOutcome {
        let outcome = match &result {
            Ok(pairings) => PairingRunOutcome::Ready(pairings.len()),
            Err(e) => PairingRunOutcome::Failed(*e),
        };

        let applied = self.state.send_if_modified(|s| {
            if self.ticket.load(Ordering::SeqCst) != ticket {
                return false;
            }
            match result {
                Ok(pairings) => {
                    s.phase = WinePairingPhase::Ready;
                    s.pairings = pairings;
                    s.error = None;
                }
                Err(e) => {
                    s.phase = WinePairingPhase::Failed;
                    s.error = Some(e);
                }
            }
            true
        });

        if applied {
            outcome
        } else {
            tracing::debug!(ticket, "Discarding superseded wine pairing result");
            PairingRunOutcome::Superseded
        }
    }

    /// Leave `Loading` if the run holding `ticket` was dropped mid-flight.
    fn settle(&self, ticket: u64) {
        self.state.send_if_modified(|s| {
            if self.ticket.load(Ordering::SeqCst) != ticket || !s.is_loading() {
                return false;
            }
            s.phase = WinePairingPhase::Idle;
            true
        });
    }
}
