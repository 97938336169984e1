use std::path::PathBuf;

use campus_rollup::config::RollupConfig;
use campus_rollup::io::notify::TracingNotifier;
use campus_rollup::model::Level;
use campus_rollup::normalize::normalize;
use campus_rollup::sync;
use campus_rollup::{Result, RollupError};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose)?;
    match cli.command {
        Command::Aggregate(args) => execute_aggregate(args),
        Command::Validate(args) => execute_validate(args),
        Command::Normalize(args) => {
            for label in &args.labels {
                println!("{label}\t{}", normalize(label));
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_directives = if verbose {
        "campus_rollup=debug,info"
    } else {
        "campus_rollup=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| RollupError::Logging(error.to_string()))
}

fn execute_aggregate(args: AggregateArgs) -> Result<()> {
    for path in [&args.sources, &args.report] {
        if !path.exists() {
            return Err(RollupError::MissingInput(path.clone()));
        }
    }

    let config = RollupConfig::load(&args.config)?;
    let output = args.output.as_ref().unwrap_or(&args.report);
    let summary = sync::rollup_workbook(
        &config,
        &args.sources,
        &args.report,
        output,
        args.level.map(Level::from),
        &TracingNotifier,
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary.message());
    }
    Ok(())
}

fn execute_validate(args: ValidateArgs) -> Result<()> {
    let config = RollupConfig::load(&args.config)?;
    let identities = config.identity_map();
    let layout = config.row_layout();

    for level in Level::ALL {
        let ranges: Vec<String> = layout
            .level(level)
            .iter()
            .map(ToString::to_string)
            .collect();
        println!(
            "{level}: {} campuses, rows {}",
            identities.campuses(level).len(),
            ranges.join(", ")
        );
    }

    let conflicts = identities.conflicts();
    for conflict in &conflicts {
        println!(
            "{}: source '{}' is mapped to {}; '{}' wins",
            conflict.level,
            conflict.source,
            conflict.names.join(", "),
            conflict.names.last().map(String::as_str).unwrap_or_default()
        );
    }

    if args.strict && !conflicts.is_empty() {
        return Err(RollupError::InvalidConfig(format!(
            "{} source identifier(s) mapped to several campuses",
            conflicts.len()
        )));
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Roll per-campus enrollment counts up into the district report."
)]
struct Cli {
    /// Log debug output from the rollup.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write per-campus totals into the report workbook.
    Aggregate(AggregateArgs),
    /// Check a configuration file and report identifier conflicts.
    Validate(ValidateArgs),
    /// Print the comparison key of each campus label.
    Normalize(NormalizeArgs),
}

#[derive(clap::Args)]
struct AggregateArgs {
    /// Rollup configuration file (TOML).
    #[arg(long)]
    config: PathBuf,

    /// Counts workbook with one sheet per level.
    #[arg(long)]
    sources: PathBuf,

    /// Report workbook to update.
    #[arg(long)]
    report: PathBuf,

    /// Where to save the updated report. Defaults to overwriting `--report`.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Only roll up one level.
    #[arg(long, value_enum)]
    level: Option<LevelArg>,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct ValidateArgs {
    /// Rollup configuration file (TOML).
    #[arg(long)]
    config: PathBuf,

    /// Fail when a source identifier is mapped to several campuses.
    #[arg(long)]
    strict: bool,
}

#[derive(clap::Args)]
struct NormalizeArgs {
    /// Campus labels to normalize.
    #[arg(required = true)]
    labels: Vec<String>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LevelArg {
    Es,
    Ms,
    Hs,
}

impl From<LevelArg> for Level {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Es => Level::Es,
            LevelArg::Ms => Level::Ms,
            LevelArg::Hs => Level::Hs,
        }
    }
}
