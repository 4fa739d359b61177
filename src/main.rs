use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "billcopy")]
#[command(about = "Generate length-limited variants of broadcast billing copy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Enable verbose debug output")]
    verbose: bool,

    #[arg(long, global = true, help = "Print prompts without calling the generation endpoint")]
    dry_run: bool,

    #[arg(long, global = true, help = "Generation endpoint URL")]
    endpoint: Option<String>,

    #[arg(long, global = true, help = "Model name sent to the endpoint")]
    model: Option<String>,

    #[arg(long, global = true, default_value_t = 60, help = "Per-request timeout in seconds")]
    timeout_secs: u64,

    #[arg(long, global = true, default_value_t = 1024, help = "Maximum tokens the model may produce")]
    max_tokens: u32,

    #[arg(long, global = true, help = "Environment variable holding the API key (default ANTHROPIC_API_KEY)")]
    api_key_env: Option<String>,

    #[arg(long, global = true, help = "History file (default .billcopy/history.jsonl)")]
    history: Option<PathBuf>,

    #[arg(long, global = true, help = "Do not record results in the history file")]
    no_history: bool,

    #[arg(long, global = true, help = "Directory holding style presets (default presets)")]
    presets_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Generate variants for a single piece of copy")]
    Generate(GenerateArgs),

    #[command(about = "Generate variants for every item in a YAML batch job")]
    Batch {
        #[arg(help = "Path to the batch job file")]
        job: PathBuf,

        #[arg(long, short, help = "Write results to this file instead of stdout")]
        output: Option<PathBuf>,
    },

    #[command(about = "Show recent generations from the history file")]
    History {
        #[arg(long, default_value_t = 10, help = "Number of entries to show")]
        last: usize,
    },

    #[command(about = "List available style presets")]
    Presets,
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(long, conflicts_with = "source_file", help = "Source copy text")]
    source: Option<String>,

    #[arg(long, help = "Read the source copy from a file")]
    source_file: Option<PathBuf>,

    #[arg(long = "limit", required = true, help = "Output limit as LABEL:BOUND[:characters|words]")]
    limits: Vec<String>,

    #[command(flatten)]
    style: cli::StyleArgs,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "billcopy=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the environment may already hold the key
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli::Config {
        verbose: cli.verbose,
        dry_run: cli.dry_run,
        endpoint: cli.endpoint,
        model: cli.model,
        timeout_secs: cli.timeout_secs,
        max_tokens: cli.max_tokens,
        api_key_env: cli.api_key_env,
        history: cli.history,
        no_history: cli.no_history,
        presets_dir: cli.presets_dir,
    };

    match cli.command {
        Commands::Generate(args) => {
            let source = cli::read_source(args.source, args.source_file)?;
            cli::generate(source, args.limits, args.style, &config).await?;
        }
        Commands::Batch { job, output } => {
            cli::batch(job, output, &config).await?;
        }
        Commands::History { last } => {
            cli::history(last, &config)?;
        }
        Commands::Presets => {
            cli::presets(&config)?;
        }
    }

    Ok(())
}
