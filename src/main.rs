use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use evoquant::config::{ConfigManager, RunConfig};
use evoquant::engines::generation::{EvolutionEngine, LogProgressCallback};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "evoquant", about = "Nightly evolution of quant strategy genomes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a full evolution and write the report and memory logs
    #[command(alias = "evoquant-run")]
    Run {
        /// TOML run configuration; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        run_id: Option<String>,
        /// Comma-separated market identifiers
        #[arg(long)]
        markets: Option<String>,
        #[arg(long)]
        periods: Option<usize>,
        #[arg(long)]
        generations: Option<usize>,
        #[arg(long)]
        population: Option<usize>,
        #[arg(long)]
        top_k: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Write the default run configuration to a TOML file
    InitConfig { path: PathBuf },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let manager = ConfigManager::new();

    match cli.command {
        Command::Run {
            config,
            run_id,
            markets,
            periods,
            generations,
            population,
            top_k,
            seed,
            output_dir,
        } => {
            let mut run_config = match config {
                Some(path) => manager
                    .load_from_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => RunConfig::new(format!("evoquant-{}", chrono::Utc::now().format("%Y%m%d-%H%M%S"))),
            };
            if let Some(run_id) = run_id {
                run_config.run_id = run_id;
            }
            if let Some(markets) = markets {
                run_config.data.markets = markets
                    .split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect();
            }
            if let Some(periods) = periods {
                run_config.data.periods = periods;
            }
            if let Some(generations) = generations {
                run_config.evolution.generations = generations;
            }
            if let Some(population) = population {
                run_config.evolution.population_size = population;
            }
            if let Some(top_k) = top_k {
                run_config.evolution.top_k = top_k;
            }
            if let Some(seed) = seed {
                run_config.evolution.seed = seed;
            }
            if let Some(output_dir) = output_dir {
                run_config.output_dir = output_dir;
            }

            let engine = EvolutionEngine::new(run_config).context("invalid run configuration")?;
            let progress = LogProgressCallback::new(engine.config().evolution.generations);
            let result = engine.run(progress).context("evolution run failed")?;

            println!("EvoQuant run finished: {}", result.config.run_dir().display());
            println!(
                "reports: {}  alpha_zoo: {}  hall_of_shame: {}  meta_rules: {}",
                result.reports.len(),
                result.memory_updates.alpha_zoo,
                result.memory_updates.hall_of_shame,
                result.memory_updates.meta_rules
            );
            for (rank, candidate) in result.top_candidates.iter().enumerate() {
                println!(
                    "  #{} {} fitness={:.4} dsr={:.3} mdd={:.3} turnover={:.2}",
                    rank + 1,
                    candidate.strategy_id,
                    candidate.metrics.fitness,
                    candidate.metrics.dsr,
                    candidate.metrics.mdd,
                    candidate.metrics.turnover
                );
            }
        }
        Command::InitConfig { path } => {
            manager
                .save_to_file(&RunConfig::default(), &path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}
