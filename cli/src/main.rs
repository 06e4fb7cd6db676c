mod display;

use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use saucier_core::ai::prompts::{
    render_recipe_image_prompt, render_recipe_prompt, render_wine_pairing_prompt,
};
use saucier_core::{
    AiClient, GeneratedRecipe, OpenAiClient, PairingRunOutcome, Recipe, RecipeRunOutcome,
    RecipeSession, WinePairingPhase, WinePairingState, WinePairingWorkflow,
};
use tokio::task::JoinHandle;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "saucier")]
#[command(about = "Michelin star recipe generator with wine pairings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a recipe, a photo of it and wine pairings
    Generate {
        /// Ingredients or an idea, e.g. "salmon and asparagus"
        input: Vec<String>,
        /// Print the final result as JSON
        #[arg(long)]
        json: bool,
        /// Do not offer to retry failed wine pairings
        #[arg(long)]
        no_retry_prompt: bool,
    },
    /// Suggest wine pairings for a recipe stored as JSON
    Pair {
        /// Recipe JSON file
        #[arg(long)]
        recipe_file: PathBuf,
        /// Print the pairings as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a rendered prompt without calling the API
    Prompt {
        #[arg(value_enum)]
        kind: PromptKind,
        /// Recipe JSON file (image and wine prompts)
        #[arg(long)]
        recipe_file: Option<PathBuf>,
        /// Ingredients or an idea (recipe prompt)
        input: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PromptKind {
    Recipe,
    Image,
    Wine,
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            json,
            no_retry_prompt,
        } => generate(&input.join(" "), json, !no_retry_prompt).await,
        Commands::Pair { recipe_file, json } => pair(&recipe_file, json).await,
        Commands::Prompt {
            kind,
            recipe_file,
            input,
        } => {
            print_prompt(kind, recipe_file.as_deref(), &input.join(" "))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn create_client() -> Result<Arc<dyn AiClient>> {
    let client = OpenAiClient::from_env().context("Failed to create generation client")?;
    Ok(Arc::new(client))
}

async fn generate(input: &str, json: bool, retry_prompt: bool) -> Result<ExitCode> {
    let session = RecipeSession::start(create_client()?);
    let progress = (!json).then(|| spawn_progress(&session));

    let outcome = session.recipe.generate(input).await;
    tracing::debug!(?outcome, "Recipe workflow returned");

    let recipe_state = session.recipe.state();
    let mut wine_state = match &recipe_state.recipe {
        Some(generated) => Some(wait_for_pairings(&session, generated).await?),
        None => None,
    };

    if let Some(progress) = progress {
        progress.abort();
    }

    if json {
        let json = display::render_json(&recipe_state, wine_state.as_ref())
            .context("Failed to serialize result")?;
        println!("{json}");
    } else {
        print!("{}", display::render_recipe_state(&recipe_state));

        if let Some(wine) = wine_state.as_mut() {
            println!();
            print!("{}", display::render_wine_state(wine));

            while retry_prompt && wine.can_retry() && confirm("Try again?")? {
                eprintln!("Generating wine pairings...");
                if session.wine.retry().await == PairingRunOutcome::AlreadyRunning {
                    continue;
                }
                *wine = session.wine.state();
                print!("{}", display::render_wine_state(wine));
            }
        }
    }

    Ok(match outcome {
        RecipeRunOutcome::Failed => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

async fn pair(recipe_file: &Path, json: bool) -> Result<ExitCode> {
    let recipe = load_recipe(Some(recipe_file))?;
    let workflow = WinePairingWorkflow::new(create_client()?);

    let outcome = workflow
        .run(GeneratedRecipe::new(recipe.name.clone(), recipe))
        .await;
    let state = workflow.state();

    if json {
        println!("{}", serde_json::to_string_pretty(&state.pairings)?);
    } else {
        print!("{}", display::render_wine_state(&state));
    }

    Ok(match outcome {
        PairingRunOutcome::Ready(_) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

fn print_prompt(kind: PromptKind, recipe_file: Option<&Path>, input: &str) -> Result<()> {
    let prompt = match kind {
        PromptKind::Recipe => render_recipe_prompt(input),
        PromptKind::Image => render_recipe_image_prompt(&load_recipe(recipe_file)?),
        PromptKind::Wine => render_wine_pairing_prompt(&load_recipe(recipe_file)?),
    };

    println!("{prompt}");
    Ok(())
}

fn load_recipe(path: Option<&Path>) -> Result<Recipe> {
    let path = path.context("--recipe-file is required for this command")?;
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Recipe::parse(&text).with_context(|| format!("Invalid recipe JSON in {}", path.display()))
}

/// Print loading transitions to stderr while the workflows run.
fn spawn_progress(session: &RecipeSession) -> JoinHandle<()> {
    let mut recipe_rx = session.recipe.subscribe();
    let mut wine_rx = session.wine.subscribe();

    tokio::spawn(async move {
        let mut wine_loading = false;

        loop {
            tokio::select! {
                changed = recipe_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if let Some(line) = display::recipe_progress(&recipe_rx.borrow_and_update()) {
                        eprintln!("{line}");
                    }
                }
                changed = wine_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let loading = wine_rx.borrow_and_update().is_loading();
                    if loading && !wine_loading {
                        eprintln!("Generating wine pairings...");
                    }
                    wine_loading = loading;
                }
            }
        }
    })
}

/// Wait until the pairing run for `recipe` has produced a result or an error.
async fn wait_for_pairings(
    session: &RecipeSession,
    recipe: &Arc<GeneratedRecipe>,
) -> Result<WinePairingState> {
    let mut rx = session.wine.subscribe();
    let state = rx
        .wait_for(|s| {
            !s.is_loading()
                && s.phase != WinePairingPhase::Idle
                && s.recipe.as_ref().is_some_and(|r| r.same_generation(recipe))
        })
        .await
        .context("Wine pairing workflow stopped")?
        .clone();

    Ok(state)
}

fn confirm(question: &str) -> Result<bool> {
    if !io::stdin().is_terminal() {
        return Ok(false);
    }

    eprint!("{question} [y/N] ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    Ok(matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
