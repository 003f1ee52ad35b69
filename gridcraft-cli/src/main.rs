//! # gridcraft CLI
//!
//! Runs the foraging agent with an LLM (or a random walker) choosing moves.
//!
//! Usage:
//!   gridcraft [OPTIONS]
//!
//! Examples:
//!   gridcraft --dry-run --seed 7
//!   gridcraft -n 20 --vision 2 --show-hunger
//!   gridcraft --world board.txt --transcript run.json
//!   gridcraft --base-url http://localhost:11434/v1 -m llama3.1

use anyhow::{bail, Context};
use clap::Parser;
use gridcraft_agent::{
    ChatOracle, ControllerConfig, Oracle, RandomOracle, RunAborted, RunReport, Termination,
    TurnController, TurnRecord, Visibility,
};
use gridcraft_sim::{OpenAIProvider, Position, ProviderConfig, SimConfig, Simulation};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "gridcraft")]
#[command(author, version, about = "gridcraft - an LLM forages for food on a grid")]
struct Cli {
    /// Simulation parameters as JSON (flags below override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Hand-drawn board to play on instead of a generated one ('@' marks the agent)
    #[arg(short, long)]
    world: Option<PathBuf>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    /// Start column
    #[arg(long, requires = "start_y")]
    start_x: Option<i64>,

    /// Start row, counted from the bottom
    #[arg(long, requires = "start_x")]
    start_y: Option<i64>,

    #[arg(long)]
    max_hunger: Option<u32>,

    /// Seed for world generation and the dry-run walker
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum number of turns
    #[arg(short = 'n', long, default_value = "10")]
    steps: usize,

    /// Show only a window this many cells around the agent
    #[arg(long)]
    vision: Option<u32>,

    /// Tell the oracle its hunger every turn
    #[arg(long)]
    show_hunger: bool,

    /// Seconds to wait for each oracle reply
    #[arg(long, default_value = "120")]
    timeout: u64,

    /// Extra attempts per turn when the oracle fails or says nothing useful
    #[arg(long, default_value = "2")]
    retries: u32,

    /// Pick random directions instead of calling an LLM
    #[arg(long)]
    dry_run: bool,

    #[arg(short, long)]
    model: Option<String>,

    /// OpenAI-compatible endpoint, e.g. a local Ollama server
    #[arg(long)]
    base_url: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long)]
    temperature: Option<f32>,

    /// Write the full run transcript as JSON
    #[arg(short, long)]
    transcript: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Only print the final summary
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn sim_config(&self) -> anyhow::Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)?,
            None => SimConfig::default(),
        };

        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let (Some(x), Some(y)) = (self.start_x, self.start_y) {
            config.start = Position::new(x, y);
        }
        if let Some(max_hunger) = self.max_hunger {
            config.max_hunger = max_hunger;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(config)
    }

    fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            max_steps: self.steps,
            visibility: match self.vision {
                Some(range) => Visibility::Window { range },
                None => Visibility::Full,
            },
            show_hunger: self.show_hunger,
            oracle_timeout_secs: self.timeout,
            max_retries: self.retries,
        }
    }

    fn provider_config(&self) -> anyhow::Result<ProviderConfig> {
        let config = match (&self.base_url, &self.api_key) {
            (Some(url), key) => {
                let Some(model) = &self.model else {
                    bail!("--model is required with --base-url");
                };
                let mut config = ProviderConfig::local(url, model);
                config.api_key = key.clone();
                config
            }
            (None, Some(key)) => {
                let config = ProviderConfig::openai(key);
                match &self.model {
                    Some(model) => config.with_model(model),
                    None => config,
                }
            }
            (None, None) => {
                bail!("no API key: set OPENAI_API_KEY, pass --api-key, or use --dry-run")
            }
        };
        Ok(config.with_timeout(self.timeout))
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_simulation(cli: &Cli, config: &SimConfig) -> anyhow::Result<Simulation> {
    let sim = match &cli.world {
        Some(path) => Simulation::load(path, config.max_hunger)?,
        None => Simulation::from_config(config)?,
    };
    Ok(sim)
}

fn print_turn(record: &TurnRecord, sim: &Simulation) {
    println!("--- step {} ---", record.step);
    println!("oracle: {}", record.response.trim());
    if let Some(message) = &record.feedback.message {
        println!("{}", message);
    }
    println!("hunger: {} / {}", record.hunger, sim.agent().max_hunger());
    println!("{}\n", sim.render());
}

fn print_summary(report: &RunReport) {
    let reason = match report.termination {
        Termination::StepLimit => "step limit reached",
        Termination::AgentDied => "agent starved",
        Termination::Failed => "oracle failed",
        Termination::Interrupted => "interrupted",
    };
    println!("=== RUN FINISHED: {} ===", reason);
    println!(
        "oracle: {}  steps: {}  food eaten: {}  hunger left: {}",
        report.oracle, report.steps, report.food_eaten, report.final_hunger
    );

    if let Some(usage) = &report.usage {
        let mut models: Vec<_> = usage.by_model.iter().collect();
        models.sort_by(|a, b| a.0.cmp(b.0));
        for (model, tokens) in models {
            println!(
                "{}: {} tokens ({} prompt, {} completion)",
                model, tokens.total_tokens, tokens.prompt_tokens, tokens.completion_tokens
            );
        }
        println!("oracle calls: {}", usage.total_calls);
    }
}

/// Play the run; on Ctrl-C the turns so far are kept
async fn drive<O: Oracle>(
    mut controller: TurnController<O>,
    sim: &mut Simulation,
    quiet: bool,
) -> Result<RunReport, RunAborted> {
    let outcome = {
        let run = controller.run_with(sim, |record, sim| {
            if !quiet {
                print_turn(record, sim);
            }
        });
        tokio::select! {
            result = run => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        }
    };

    match outcome {
        Some(result) => result,
        None => Err(controller.interrupt(sim)),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let sim_config = cli.sim_config()?;
    let mut sim = build_simulation(&cli, &sim_config)?;
    let config = cli.controller_config();

    if !cli.quiet {
        let world = sim.world();
        println!(
            "gridcraft - {}x{} world, {} food, hunger {}\n",
            world.width(),
            world.height(),
            world.food_count(),
            sim.agent().max_hunger()
        );
        println!("{}\n", sim.render());
    }

    let outcome = if cli.dry_run {
        let rng = match sim_config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let controller = TurnController::new(RandomOracle::new(rng), config)?;
        drive(controller, &mut sim, cli.quiet).await
    } else {
        let provider =
            OpenAIProvider::new(cli.provider_config()?).context("failed to create provider")?;
        let mut oracle = ChatOracle::new(provider);
        if let Some(temperature) = cli.temperature {
            oracle = oracle.with_temperature(temperature);
        }
        let controller = TurnController::new(oracle, config)?;
        drive(controller, &mut sim, cli.quiet).await
    };

    let report = match &outcome {
        Ok(report) => report,
        Err(aborted) => aborted.report.as_ref(),
    };
    print_summary(report);

    if let Some(path) = &cli.transcript {
        report.save(path)?;
        info!(path = %path.display(), "transcript written");
    }

    outcome?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
