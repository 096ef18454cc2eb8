use anyhow::Result;
use clap::Parser;
use settlers_lib::{AdvisorMode, ExtinctionPolicy, RunOptions};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless settlers simulation", long_about = None)]
struct Args {
    /// Config file path. Defaults are used if omitted and `config.toml` is absent.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 1000)]
    ticks: u64,

    /// World seed, overriding the config
    #[arg(short, long)]
    seed: Option<u64>,

    /// Population snapshot to start from
    #[arg(long)]
    load: Option<PathBuf>,

    /// Save the population here on exit
    #[arg(long)]
    save: Option<PathBuf>,

    /// Directory for the lifecycle history log
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Optional advisor consulted before the genome network
    #[arg(long, value_enum, default_value = "none")]
    advisor: AdvisorMode,

    /// What to do when the population dies out
    #[arg(long, value_enum, default_value = "reseed")]
    on_extinction: ExtinctionPolicy,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    settlers_core::metrics::init_logging();
    let args = Args::parse();

    let config = args.config.or_else(|| {
        let fallback = PathBuf::from("config.toml");
        fallback.exists().then_some(fallback)
    });
    let options = RunOptions {
        config,
        ticks: args.ticks,
        seed: args.seed,
        load: args.load,
        save: args.save,
        log_dir: args.log_dir,
        advisor: args.advisor,
        on_extinction: args.on_extinction,
        ..Default::default()
    };

    let summary = settlers_lib::run(options).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary);
    }
    Ok(())
}
