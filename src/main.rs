use std::{
    path::{Path, PathBuf},
    process,
};

use clap::{Parser, Subcommand};
use opulse::{
    config::Config,
    expression::{
        evaluator::ExpressionEvaluator,
        generator::{AtomPolicy, ExpressionGenerator},
    },
    operator::{
        OperatorRegistry,
        priority::assign_priorities,
        seed::set_initial_operators,
        store::{self, clear_temp_file, load_file, promote_temp_file, write_jsonl},
    },
    synthesis::{generator::OperatorGenerator, pipeline::Synthesizer},
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

/// opulse synthesizes custom arithmetic operators and writes expression
/// datasets over them.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Writes the six seed operators.
    SeedOperators {
        #[arg(long)]
        output_file: PathBuf,
    },
    /// Adds a prefix operator for every numeral base that has none.
    BaseOperators {
        #[arg(long)]
        config:        PathBuf,
        #[arg(long)]
        operator_file: PathBuf,
        #[arg(long)]
        output_file:   PathBuf,
        #[arg(long)]
        seed:          Option<u64>,
    },
    /// Synthesizes new operators on top of an existing family.
    GenerateOperators {
        #[arg(long)]
        config:                   PathBuf,
        #[arg(long)]
        initial_operators_path:   PathBuf,
        #[arg(long)]
        generated_operators_path: PathBuf,
        /// Operators to synthesize, not counting base operators.
        #[arg(long)]
        num:                      usize,
        #[arg(long)]
        seed:                     Option<u64>,
    },
    /// Gives every operator without a precedence level one.
    AssignPriorities {
        #[arg(long)]
        config:               PathBuf,
        #[arg(long)]
        operator_file:        PathBuf,
        #[arg(long)]
        output_operator_file: PathBuf,
        #[arg(long)]
        seed:                 Option<u64>,
    },
    /// Writes random expressions with their value and metrics, plus the
    /// operator-to-expression index.
    GenerateExpressions {
        #[arg(long)]
        config:                           PathBuf,
        #[arg(long)]
        operators_path:                   PathBuf,
        #[arg(long)]
        generated_expression_path:        PathBuf,
        #[arg(long)]
        generated_opexpr_dependency_path: PathBuf,
        #[arg(long)]
        num:                              usize,
        #[arg(long)]
        seed:                             Option<u64>,
    },
}

type CommandResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();

    let config = match cli.command.config_path().map(Config::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        },
    };
    init_logging(&config.logging.level);

    if let Err(e) = run(cli.command, &config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter)
         .with_target(false)
         .with_writer(std::io::stderr)
         .init();
}

impl Command {
    fn config_path(&self) -> Option<&Path> {
        match self {
            Self::SeedOperators { .. } => None,
            Self::BaseOperators { config, .. }
            | Self::GenerateOperators { config, .. }
            | Self::AssignPriorities { config, .. }
            | Self::GenerateExpressions { config, .. } => Some(config),
        }
    }
}

fn rng(seed: Option<u64>) -> ChaCha8Rng {
    seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64)
}

fn load_registry(config: &Config, path: &Path) -> Result<OperatorRegistry, Box<dyn std::error::Error>> {
    let mut registry = OperatorRegistry::with_limits(config.evaluation);
    let loaded = load_file(&mut registry, path)?;
    info!(path = %path.display(), loaded, "operators loaded");
    Ok(registry)
}

fn run(command: Command, config: &Config) -> CommandResult {
    match command {
        Command::SeedOperators { output_file } => {
            let mut registry = OperatorRegistry::with_limits(config.evaluation);
            set_initial_operators(&mut registry)?;
            store::save(&registry, &output_file)?;
        },
        Command::BaseOperators { operator_file,
                                 output_file,
                                 seed,
                                 .. } => {
            let mut registry = load_registry(config, &operator_file)?;
            OperatorGenerator::new(config).generate_base_operators(&mut registry, &mut rng(seed))?;
            store::save(&registry, &output_file)?;
        },
        Command::GenerateOperators { initial_operators_path,
                                     generated_operators_path,
                                     num,
                                     seed,
                                     .. } => {
            let mut registry = load_registry(config, &initial_operators_path)?;
            let temp = temp_path(&generated_operators_path);
            clear_temp_file(&temp)?;

            let mut synthesizer = Synthesizer::new(config).with_temp_file(&temp);
            let report = synthesizer.generate_random_operators(&mut registry, &mut rng(seed), num)?;
            info!(generated = report.generated, discarded = report.discarded, "synthesis finished");

            store::save(&registry, &temp)?;
            promote_temp_file(&temp, &generated_operators_path)?;
        },
        Command::AssignPriorities { operator_file,
                                    output_operator_file,
                                    seed,
                                    .. } => {
            let mut registry = load_registry(config, &operator_file)?;
            assign_priorities(&mut registry, &mut rng(seed), config.synthesis.max_priority)?;
            store::save(&registry, &output_operator_file)?;
        },
        Command::GenerateExpressions { operators_path,
                                       generated_expression_path,
                                       generated_opexpr_dependency_path,
                                       num,
                                       seed,
                                       .. } => {
            let registry = load_registry(config, &operators_path)?;
            let evaluator = ExpressionEvaluator::new(&registry).with_digits(&config.symbols.custom_digits)
                                                               .with_nan_symbol(&config.symbols.nan_symbol);
            let mut generator = ExpressionGenerator::new(&config.expression, config.synthesis.max_base);
            generator.refresh_pools(&registry);

            let mut random = rng(seed);
            let records: Vec<_> =
                (0..num).map(|_| generator.create_expression(&evaluator, &mut random, AtomPolicy::Number))
                        .collect();
            write_jsonl(&generated_expression_path, records)?;
            generator.index().save(&generated_opexpr_dependency_path)?;
        },
    }
    Ok(())
}

/// `operators.jsonl` becomes `operators.jsonl.tmp`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
