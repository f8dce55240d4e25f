use anyhow::Result;
use clap::Parser;
use kinterra_core::history::init_logging;
use kinterra_core::{Engine, EnvConfig, SharedBuffers};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Drives the environment with a uniform random policy; useful for smoke
/// runs and for producing episode logs without a learner attached.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Engine RNG seed, overriding the config
    #[arg(short, long)]
    seed: Option<u64>,

    /// Episodes to run before exiting
    #[arg(short, long, default_value_t = 3)]
    episodes: u64,

    /// Directory for the per-episode JSONL log
    #[arg(long)]
    log_dir: Option<String>,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EnvConfig::from_toml(&std::fs::read_to_string(path)?)?,
        None => EnvConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.log_dir.is_some() {
        config.log_dir = args.log_dir.clone();
    }

    let mut buffers = SharedBuffers::new(&config);
    let mut engine = Engine::new(config.clone())?;
    engine.reset(&mut buffers)?;

    // a separate stream for the policy keeps engine replay independent of it
    let mut policy = ChaCha8Rng::seed_from_u64(config.seed.unwrap_or(0) ^ 0x9e37_79b9);
    while engine.episodes_completed() < args.episodes {
        for slot in buffers.actions.iter_mut() {
            *slot = policy.gen_range(0..11);
        }
        engine.step(&mut buffers)?;
    }

    engine.close();
    Ok(())
}
