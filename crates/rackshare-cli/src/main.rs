//! rackshare - analyze Ableton Live rack presets from the command line.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use rackshare_adg::RackFileDecoder;
use rackshare_cli::{
    analyze_all, edition_line, render, BatchOptions, Config, FileOutcome, Job, OutputFormat,
};

#[derive(Parser)]
#[command(name = "rackshare")]
#[command(author, version, about = "Analyze Ableton Live rack presets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (default: ~/.config/rackshare/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode rack files and print their structure
    Analyze(AnalyzeArgs),
    /// Print the minimum Live edition for each rack file
    Edition(BatchArgs),
    /// Create a default configuration file
    Init,
    /// Show the configuration file path
    ConfigPath,
}

#[derive(Args)]
struct BatchArgs {
    /// Rack files (.adg)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Maximum rack nesting depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Worker threads
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Per-file time budget in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    batch: BatchArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Indent JSON output
    #[arg(long)]
    pretty: bool,

    /// Rack name to report (single file only)
    #[arg(long)]
    name: Option<String>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Init => {
            let path = Config::create_default_config_file()?;
            println!("Created default config at: {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::ConfigPath => {
            let path = Config::config_path()?;
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Analyze(args) => {
            let config = load_config(cli.config, &args.batch)?;
            if args.name.is_some() && args.batch.files.len() > 1 {
                bail!("--name can only be used with a single file");
            }

            let mut jobs = jobs_for(&args.batch.files);
            if let Some(job) = jobs.first_mut() {
                job.display_name = args.name.clone();
            }

            let outcomes = run(&config, jobs)?;
            let mut failed = 0;
            for outcome in outcomes {
                match outcome.result {
                    Ok(analysis) => println!("{}", render(&analysis, args.format, args.pretty)?),
                    Err(e) => {
                        failed += 1;
                        eprintln!("{}: {}", outcome.path.display(), e);
                    }
                }
            }
            Ok(exit_code(failed))
        }
        Commands::Edition(args) => {
            let config = load_config(cli.config, &args)?;
            let outcomes = run(&config, jobs_for(&args.files))?;
            let mut failed = 0;
            for outcome in outcomes {
                match outcome.result {
                    Ok(analysis) => {
                        println!("{}", edition_line(&outcome.path.display().to_string(), &analysis))
                    }
                    Err(e) => {
                        failed += 1;
                        eprintln!("{}: {}", outcome.path.display(), e);
                    }
                }
            }
            Ok(exit_code(failed))
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Config file (explicit or default location) with command line overrides applied.
fn load_config(path: Option<PathBuf>, args: &BatchArgs) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_from(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_or_default(),
    };

    if let Some(max_depth) = args.max_depth {
        config.analyzer.max_depth = max_depth;
    }
    if let Some(jobs) = args.jobs {
        config.batch.jobs = jobs;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.batch.timeout_secs = timeout_secs;
    }
    config.validate()?;
    Ok(config)
}

fn jobs_for(files: &[PathBuf]) -> Vec<Job> {
    files.iter().cloned().map(Job::new).collect()
}

fn run(config: &Config, jobs: Vec<Job>) -> Result<Vec<FileOutcome<rackshare_adg::RackAnalysis>>> {
    let decoder = RackFileDecoder::new(config.analyzer.clone())?;
    let options = BatchOptions {
        jobs: config.batch.jobs,
        timeout: config.batch.timeout(),
    };
    log::info!(
        "Analyzing {} files ({} workers, {} s budget each)",
        jobs.len(),
        options.jobs,
        config.batch.timeout_secs
    );
    Ok(analyze_all(&decoder, jobs, options))
}

fn exit_code(failed: usize) -> ExitCode {
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        log::warn!("{} files could not be analyzed", failed);
        ExitCode::FAILURE
    }
}
