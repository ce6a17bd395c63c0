use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use ruleforge::{
    DataContext, Engine, EngineOptions, RuleSet, RuleforgeError, DEFAULT_MAX_CYCLES,
    EXIT_BUILD_ERROR, EXIT_RUNTIME_ERROR,
};

/// Output format for run results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Forward-chaining rules engine.
#[derive(Parser)]
#[command(name = "ruleforge", version, about)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a rules file and report errors
    Check {
        /// Path to the rules file
        rules: PathBuf,
    },

    /// Run a rules file against JSON facts and print the updated facts
    Run {
        /// Path to the rules file (or a binary cache ending in .rfrg)
        rules: PathBuf,
        /// Path to the facts JSON file
        #[arg(long)]
        facts: PathBuf,
        /// Stop with an error after this many cycles
        #[arg(long, env = "RULEFORGE_MAX_CYCLES", default_value_t = DEFAULT_MAX_CYCLES)]
        max_cycles: usize,
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_enum)]
        output: OutputFormat,
    },

    /// Build a rules file into a binary cache
    #[cfg(feature = "binary-cache")]
    Compile {
        /// Path to the rules file
        rules: PathBuf,
        /// Where to write the cache
        #[arg(short, long)]
        out: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_rules(path: &Path) -> Result<RuleSet, RuleforgeError> {
    #[cfg(feature = "binary-cache")]
    if path.extension().is_some_and(|ext| ext == "rfrg") {
        debug!(path = %path.display(), "loading binary cache");
        return Ok(RuleSet::from_binary_file(path)?);
    }
    debug!(path = %path.display(), "building rules");
    RuleSet::from_file(path)
}

fn report_build_error(path: &Path, err: &RuleforgeError) {
    match err {
        RuleforgeError::Build(errors) => {
            for e in errors {
                eprintln!("{}: {e}", path.display());
            }
        }
        other => eprintln!("{}: {other}", path.display()),
    }
}

fn load_facts(path: &Path) -> Result<DataContext, RuleforgeError> {
    debug!(path = %path.display(), "loading facts");
    DataContext::from_json_file(path)
}

fn check(rules: &Path) -> i32 {
    match load_rules(rules) {
        Ok(ruleset) => {
            println!("{}: {} rule(s) ok", rules.display(), ruleset.len());
            0
        }
        Err(e) => {
            report_build_error(rules, &e);
            EXIT_BUILD_ERROR
        }
    }
}

fn run(rules: &Path, facts: &Path, max_cycles: usize, output: OutputFormat) -> i32 {
    let ruleset = match load_rules(rules) {
        Ok(ruleset) => ruleset,
        Err(e) => {
            report_build_error(rules, &e);
            return EXIT_BUILD_ERROR;
        }
    };
    let data = match load_facts(facts) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{}: {e}", facts.display());
            return EXIT_RUNTIME_ERROR;
        }
    };

    info!(rules = ruleset.len(), max_cycles, "starting run");
    let options = EngineOptions::new().with_max_cycles(max_cycles);
    let mut engine = Engine::with_options(&ruleset, data, options);
    let result = engine.run();
    let facts = engine.into_data().to_json();

    match output {
        OutputFormat::Text => {
            println!("{result}");
            println!(
                "{}",
                serde_json::to_string_pretty(&facts).unwrap_or_else(|_| facts.to_string())
            );
        }
        OutputFormat::Json => {
            let report = json!({
                "cycles_run": result.cycles_run(),
                "fired_rules": result.fired_rules(),
                "error": result.error().map(ToString::to_string),
                "exit_code": result.exit_code(),
                "facts": facts,
            });
            println!("{report}");
        }
    }
    if let Some(e) = result.error() {
        eprintln!("error: {e}");
    }
    result.exit_code()
}

#[cfg(feature = "binary-cache")]
fn compile(rules: &Path, out: &Path) -> i32 {
    let built = std::fs::read_to_string(rules)
        .map_err(RuleforgeError::from)
        .and_then(|source| {
            let ruleset = RuleSet::from_dsl(&source)?;
            ruleset.to_binary_file(out, Some(&source))?;
            Ok(ruleset.len())
        });
    match built {
        Ok(count) => {
            println!("{}: {count} rule(s) written", out.display());
            0
        }
        Err(e) => {
            report_build_error(rules, &e);
            EXIT_BUILD_ERROR
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match &cli.command {
        Commands::Check { rules } => check(rules),
        Commands::Run {
            rules,
            facts,
            max_cycles,
            output,
        } => run(rules, facts, *max_cycles, *output),
        #[cfg(feature = "binary-cache")]
        Commands::Compile { rules, out } => compile(rules, out),
    };
    process::exit(code);
}
