mod registry;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use mockseed_config::{
    ConfigError, PopulateConfig, ValidationReport, config_json_schema, load_config,
    validate_config_against_catalog, validate_config_json,
};
use mockseed_core::{Error as CoreError, SchemaCatalog, validate_catalog};
use mockseed_populate::handlers::pack_names;
use mockseed_populate::{
    HandlerRegistry, MemoryBackend, PopulateError, PopulateOptions, PopulationEngine,
};
use registry::{
    RunContext, init_logging, start_run, write_composite_csvs, write_records, write_report,
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("catalog error: {0}")]
    Core(#[from] CoreError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("population error: {0}")]
    Populate(#[from] PopulateError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Parser, Debug)]
#[command(name = "mockseed", version, about = "Populate schemas with random records")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Populate the configured containers and write run artifacts.
    Run(RunArgs),
    /// Check a config against the config schema and a catalog.
    Validate(ValidateArgs),
    /// List handler keys after applying the configured packs.
    Handlers(HandlersArgs),
    /// Print the config JSON Schema.
    ConfigSchema,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Schema catalog (JSON).
    #[arg(long)]
    schema: PathBuf,
    /// Population config (TOML or JSON).
    #[arg(long)]
    config: PathBuf,
    /// Override the configured number of cycles.
    #[arg(long)]
    cycles: Option<u32>,
    /// Always populate optional fields.
    #[arg(long, default_value_t = false)]
    no_coin: bool,
    /// Override the configured seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Schema catalog (JSON).
    #[arg(long)]
    schema: PathBuf,
    /// Population config (TOML or JSON).
    #[arg(long)]
    config: PathBuf,
}

#[derive(Args, Debug)]
struct HandlersArgs {
    /// Population config whose packs and strict values are applied.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run_populate(args),
        Command::Validate(args) => run_validate(args),
        Command::Handlers(args) => run_handlers(args),
        Command::ConfigSchema => {
            println!("{}", serde_json::to_string_pretty(&config_json_schema())?);
            Ok(())
        }
    }
}

fn run_populate(args: RunArgs) -> Result<(), CliError> {
    let RunArgs {
        schema,
        config,
        cycles,
        no_coin,
        seed,
        run_dir,
    } = args;

    let catalog = load_catalog(&schema)?;
    let mut populate_config = load_config(&config)?;
    apply_overrides(&mut populate_config, cycles, no_coin, seed);

    let report = validate_config_against_catalog(&populate_config, &catalog);
    if !report.is_ok() {
        print_report(&report);
        return Err(CliError::InvalidConfig(format!(
            "{} validation error(s) in {}",
            report.errors.len(),
            config.display()
        )));
    }

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        run_dir,
        schema_path: schema,
        config_path: config,
    };
    let run_paths = start_run(&run_ctx, &populate_config)?;
    init_logging(Some(&run_paths.logs_path))?;

    tracing::info!(event = "run_started", run_id = %run_id, dir = %run_paths.root.display());
    for issue in &report.warnings {
        tracing::warn!(code = %issue.code, path = %issue.path, "{}", issue.message);
    }

    let timer = Instant::now();
    let registry = HandlerRegistry::from_config(&populate_config)?;
    let mut engine =
        PopulationEngine::new(PopulateOptions::from_config(&populate_config), registry)
            .with_run_id(run_id.clone());
    let mut store = MemoryBackend::new();

    let run_report = engine.run(&catalog, &mut store)?;
    write_report(&run_paths, &run_report)?;
    write_records(&run_paths, &store)?;

    let discovery = engine.discover(&catalog)?;
    let composites: Vec<_> = discovery.iter_composites().cloned().collect();
    let bytes_written = write_composite_csvs(&run_paths, &catalog, &composites, &store)?;

    let (containers, persisted, filled, skipped) = run_report.totals();
    tracing::info!(
        event = "run_finished",
        status = "success",
        bytes_written,
        duration_ms = timer.elapsed().as_millis() as u64
    );
    println!(
        "containers={containers} persisted={persisted} filled={filled} skipped={skipped} dir={}",
        run_paths.root.display()
    );

    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), CliError> {
    init_logging(None)?;

    let catalog = load_catalog(&args.schema)?;
    let raw = read_config_json(&args.config)?;
    let schema_json = serde_json::to_value(config_json_schema())?;

    let mut report = validate_config_json(&raw, &schema_json)?;
    if report.is_ok() {
        let config: PopulateConfig = serde_json::from_value(raw)?;
        report.merge(validate_config_against_catalog(&config, &catalog));
    }

    print_report(&report);
    if report.is_ok() {
        println!("ok ({} warning(s))", report.warnings.len());
        Ok(())
    } else {
        Err(CliError::InvalidConfig(format!(
            "{} validation error(s)",
            report.errors.len()
        )))
    }
}

fn run_handlers(args: HandlersArgs) -> Result<(), CliError> {
    init_logging(None)?;

    let registry = match &args.config {
        Some(path) => HandlerRegistry::from_config(&load_config(path)?)?,
        None => HandlerRegistry::with_defaults(),
    };

    println!("packs: {}", pack_names().join(", "));
    for key in registry.strict_keys() {
        println!("strict {key}");
    }
    for key in registry.global_keys() {
        println!("global {key}");
    }
    Ok(())
}

fn load_catalog(path: &Path) -> Result<SchemaCatalog, CliError> {
    let contents = std::fs::read_to_string(path)?;
    let catalog: SchemaCatalog = serde_json::from_str(&contents)?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

// The JSON Schema check runs on the raw document so unknown keys and type
// errors are reported by path instead of failing deserialization.
fn read_config_json(path: &Path) -> Result<serde_json::Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Ok(toml::from_str(&contents)?),
        Some("json") => Ok(serde_json::from_str(&contents)?),
        other => Err(CliError::Config(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        ))),
    }
}

fn apply_overrides(
    config: &mut PopulateConfig,
    cycles: Option<u32>,
    no_coin: bool,
    seed: Option<u64>,
) {
    if let Some(cycles) = cycles {
        config.cycles = cycles;
    }
    if no_coin {
        config.use_coin_toss = false;
    }
    if seed.is_some() {
        config.seed = seed;
    }
}

fn print_report(report: &ValidationReport) {
    for issue in &report.errors {
        eprintln!("error[{}] {}: {}", issue.code, issue.path, issue.message);
        if let Some(hint) = &issue.hint {
            eprintln!("  hint: {hint}");
        }
    }
    for issue in &report.warnings {
        eprintln!("warning[{}] {}: {}", issue.code, issue.path, issue.message);
        if let Some(hint) = &issue.hint {
            eprintln!("  hint: {hint}");
        }
    }
}
