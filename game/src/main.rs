use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use learn_game::config::AppConfig;
use learn_game::AGENT_NAMES;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "game")]
#[command(version, about = "Tic-tac-toe agents that learn by playing each other", long_about = None)]
struct Cli {
    /// TOML file with `[agent]` and `[training]` sections
    #[arg(long, global = true, default_value = "learn_game.toml")]
    config: PathBuf,

    /// Directory holding the `<name>_data.json` value tables
    #[arg(long, global = true)]
    table_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train both agents by self-play and save their value tables
    Train(TrainArgs),
    /// Play one game against a trained agent
    Play(PlayArgs),
}

#[derive(Args)]
struct TrainArgs {
    #[arg(long)]
    episodes: Option<usize>,
    #[arg(long)]
    log_every: Option<usize>,
    /// Start from empty tables instead of loading saved ones
    #[arg(long)]
    fresh: bool,
    /// Also write dated copies of the tables
    #[arg(long)]
    snapshot: bool,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct PlayArgs {
    #[arg(long, default_value = AGENT_NAMES[0])]
    agent: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    if let Some(table_dir) = cli.table_dir {
        config.training.table_dir = table_dir;
    }
    match cli.command {
        Commands::Train(args) => {
            let training = &mut config.training;
            training.episodes = args.episodes.unwrap_or(training.episodes);
            training.log_every = args.log_every.or(training.log_every);
            training.fresh |= args.fresh;
            training.snapshot |= args.snapshot;
            training.seed = args.seed.or(training.seed);
            let summary = learn_game::train_agents(&config).context("training self-play agents")?;
            log::info!("{:?}", summary);
        }
        Commands::Play(args) => {
            let stdin = io::stdin();
            let outcome =
                learn_game::play_human_vs_agent(&config, &args.agent, stdin.lock(), io::stdout())
                    .with_context(|| format!("playing against {}", args.agent))?;
            log::info!("game against {} finished: {:?}", args.agent, outcome);
        }
    }
    Ok(())
}
