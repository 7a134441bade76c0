use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, Level};

use rustlake::config::TrainConfig;
use rustlake::env::FrozenLake;
use rustlake::exploration::GaussianNoise;
use rustlake::trainer::QLearningTrainer;
use rustlake::{logging, report, Result};


/// Command line argument parser.
#[derive(Parser, Debug)]
#[command(about = "Tabular Q-learning on the 4x4 FrozenLake grid", long_about = None)]
pub struct Args {
    /// Path to the training configuration TOML file.
    config_path: PathBuf,

    /// Default log level, overridden by RUST_LOG.
    #[arg(long, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Commands,
}


#[derive(Subcommand, Debug)]
enum Commands {
    /// Train an agent and print the learned Q-table.
    Train {
        /// Write per-episode returns to this CSV file.
        #[arg(long)]
        returns_csv: Option<PathBuf>,
        /// Play this many greedy episodes after training.
        #[arg(long)]
        eval_episodes: Option<usize>,
    },
    /// Print the lake layout.
    Map,
}


fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_logging(args.log_level);
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprint!("{}", report::format_error(&e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = TrainConfig::from_path(&args.config_path)?;
    match &args.command {
        Commands::Train { returns_csv, eval_episodes } => {
            train(config, returns_csv.as_deref(), *eval_episodes)
        }
        Commands::Map => {
            let lake = FrozenLake::seeded(config.slippery, 0);
            println!("{}", lake.render());
            Ok(())
        }
    }
}

fn train(
    config: TrainConfig, returns_csv: Option<&Path>, eval_episodes: Option<usize>,
) -> Result<()> {
    let (mut lake, noise) = match config.seed {
        Some(seed) => (
            FrozenLake::seeded(config.slippery, seed),
            GaussianNoise::seeded(seed.wrapping_add(1)),
        ),
        None => (
            FrozenLake::new(config.slippery, StdRng::from_entropy()),
            GaussianNoise::from_entropy(),
        ),
    };
    let num_episodes = config.num_episodes;
    let mut trainer = QLearningTrainer::new(config, &lake, noise)?;
    let summary = trainer.train(&mut lake, &mut ())?;

    println!("{}", report::format_summary(&summary));
    println!("Final Q-Table values:\n{}", report::format_q_table(&summary.q_table));
    println!("Greedy policy:\n{}", report::format_policy(&summary.q_table, &lake));
    // A bad path layout must not hide the training results above.
    match report::format_path(&summary.last_path) {
        Ok(grid) => println!(
            "The final path of the agent after {} episodes is:\n{}",
            num_episodes, grid
        ),
        Err(e) => eprintln!("Unable to print final path: {}", e),
    }

    if let Some(path) = returns_csv {
        report::write_returns_csv(path, &summary.episode_returns)?;
        info!(path = %path.display(), "Wrote episode returns");
    }
    if let Some(episodes) = eval_episodes {
        let evaluation = trainer.evaluate(&mut lake, episodes)?;
        println!("{}", report::format_evaluation(&evaluation));
    }
    Ok(())
}
