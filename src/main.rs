use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use grade_bonus::bonus::{calculate_single_grade_bonus, calculate_term_bonus, RawGradeEntry};
use grade_bonus::config::{self, Config, GradingSystemConfig};
use grade_bonus::grading::GradingSystemModel;
use grade_bonus::ledger::{self, BonusLedger};
use grade_bonus::{output, term};

const EXIT_SUCCESS: i32 = 0;
const EXIT_INVALID_GRADE: i32 = 1;
const EXIT_CONFIG: i32 = 4;
const EXIT_LEDGER: i32 = 5;

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
enum Format {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Evaluate a single grade
    Quick {
        /// Grading system id from the config
        #[arg(long)]
        system: String,
        /// Class level (school year) of the child
        #[arg(long)]
        level: u32,
        #[arg(long)]
        subject: String,
        /// Raw grade, e.g. "2", "87.5" or "B"
        #[arg(long)]
        grade: String,
        /// Count the subject as a core subject
        #[arg(long)]
        core: bool,
        #[command(flatten)]
        scope: Scope,
        /// Store the bonus in the ledger as unsettled
        #[arg(long)]
        record: bool,
    },
    /// Evaluate all grades of a term file
    Term {
        /// YAML term file
        file: PathBuf,
        #[command(flatten)]
        scope: Scope,
        /// Store the bonuses in the ledger as unsettled
        #[arg(long)]
        record: bool,
        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },
    /// List ledger records (unsettled only unless --all)
    Ledger {
        #[arg(long)]
        child: Option<String>,
        #[arg(long)]
        all: bool,
    },
    /// Mark ledger records as settled
    Settle {
        /// Record ids to settle
        ids: Vec<u64>,
        /// Settle every open record (of --child, if given)
        #[arg(long, conflicts_with = "ids")]
        all: bool,
        #[arg(long)]
        child: Option<String>,
    },
}

/// Whose factor overrides apply.
#[derive(clap::Args, Debug, Clone)]
struct Scope {
    /// Parent whose factor overrides apply
    #[arg(long)]
    user: Option<String>,
    /// Child the grades belong to
    #[arg(long)]
    child: Option<String>,
}

#[derive(Parser, Debug)]
#[command(name = "grade-bonus")]
#[command(about = "Normalize school grades and calculate reward bonuses", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/grade-bonus/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to ledger file (defaults to ~/.config/grade-bonus/ledger.json)
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_CONFIG
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let ledger_path = match cli.ledger {
        Some(path) => path,
        None => ledger::get_ledger_path()?,
    };

    match cli.command {
        Commands::Init { force } => {
            let path = match cli.config {
                Some(path) => path,
                None => config::get_config_path()?,
            };
            config::write_config(&path, &Config::default(), force)?;
            println!("Config written to {}", path.display());
            Ok(EXIT_SUCCESS)
        }
        Commands::Quick {
            system,
            level,
            subject,
            grade,
            core,
            scope,
            record,
        } => {
            let config = match load_validated_config(cli.config) {
                Ok(c) => c,
                Err(code) => return Ok(code),
            };
            let (system_config, model) = grading_system(&config, &system)?;
            let table = config.effective_table(scope.user.as_deref(), scope.child.as_deref());

            let entry = RawGradeEntry::new(subject, system_config.resolve_raw(&grade), core);
            let result = match calculate_single_grade_bonus(&model, &table, level, &entry) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("{}", e);
                    return Ok(EXIT_INVALID_GRADE);
                }
            };

            let use_colors = output::should_use_colors();
            println!("{}", output::format_result_detail(&result, use_colors));

            if record {
                let id = with_ledger(&ledger_path, |ledger| {
                    ledger.record(
                        scope.user.as_deref(),
                        scope.child.as_deref(),
                        &result,
                        Utc::now(),
                    )
                });
                match id {
                    Ok(id) => println!("Recorded as #{}", id),
                    Err(e) => {
                        eprintln!("Ledger error: {:#}", e);
                        return Ok(EXIT_LEDGER);
                    }
                }
            }
            Ok(EXIT_SUCCESS)
        }
        Commands::Term {
            file,
            scope,
            record,
            format,
        } => {
            let config = match load_validated_config(cli.config) {
                Ok(c) => c,
                Err(code) => return Ok(code),
            };
            let term_file = term::load_term_file(&file)?;
            let (system_config, model) = grading_system(&config, &term_file.system)?;
            let table = config.effective_table(scope.user.as_deref(), scope.child.as_deref());

            let entries = term_file.entries(system_config);
            info!(
                entries = entries.len(),
                system = %term_file.system,
                class_level = term_file.class_level,
                "evaluating term"
            );
            let result = calculate_term_bonus(&model, &table, term_file.class_level, &entries);

            match format {
                Format::Table => {
                    let use_colors = output::should_use_colors();
                    println!("{}", output::format_term(&result, use_colors));
                    if cli.verbose {
                        for entry in &result.per_entry {
                            eprintln!();
                            eprintln!("{}", output::format_result_detail(entry, false));
                        }
                    }
                }
                Format::Json => println!("{}", output::format_term_json(&result)),
            }

            if record && !result.per_entry.is_empty() {
                let saved = with_ledger(&ledger_path, |ledger| {
                    let now = Utc::now();
                    result
                        .per_entry
                        .iter()
                        .map(|r| ledger.record(scope.user.as_deref(), scope.child.as_deref(), r, now))
                        .collect::<Vec<_>>()
                });
                match saved {
                    Ok(ids) => eprintln!("Recorded {} bonus(es) in the ledger", ids.len()),
                    Err(e) => {
                        eprintln!("Ledger error: {:#}", e);
                        return Ok(EXIT_LEDGER);
                    }
                }
            }
            Ok(EXIT_SUCCESS)
        }
        Commands::Ledger { child, all } => {
            let ledger = match ledger::load_ledger(&ledger_path) {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Ledger error: {:#}", e);
                    return Ok(EXIT_LEDGER);
                }
            };
            let use_colors = output::should_use_colors();
            let child = child.as_deref();
            let listing = if all {
                output::format_ledger(
                    ledger
                        .records()
                        .iter()
                        .filter(|(_, r)| child.is_none() || r.child.as_deref() == child)
                        .map(|(id, r)| (*id, r)),
                    use_colors,
                )
            } else {
                output::format_ledger(ledger.unsettled(child), use_colors)
            };
            println!("{}", listing);
            println!();
            println!(
                "Unsettled: {}",
                output::format_bonus(ledger.unsettled_total(child), false)
            );
            Ok(EXIT_SUCCESS)
        }
        Commands::Settle { ids, all, child } => {
            if ids.is_empty() && !all {
                eprintln!("Nothing to settle: pass record ids or --all");
                return Ok(EXIT_CONFIG);
            }
            let settled = with_ledger(&ledger_path, |ledger| {
                let now = Utc::now();
                if all {
                    ledger.settle_all(child.as_deref(), now)
                } else {
                    ids.iter().filter(|id| ledger.settle(**id, now)).count()
                }
            });
            match settled {
                Ok(count) => {
                    println!("Settled {} record(s)", count);
                    Ok(EXIT_SUCCESS)
                }
                Err(e) => {
                    eprintln!("Ledger error: {:#}", e);
                    Ok(EXIT_LEDGER)
                }
            }
        }
    }
}

/// Load the config and validate it, printing every problem found.
fn load_validated_config(path: Option<PathBuf>) -> std::result::Result<Config, i32> {
    let config = match config::load_config(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            return Err(EXIT_CONFIG);
        }
    };

    if let Err(errors) = config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(EXIT_CONFIG);
    }

    debug!(systems = config.grading_systems.len(), "config loaded");
    Ok(config)
}

fn grading_system<'a>(
    config: &'a Config,
    id: &str,
) -> Result<(&'a GradingSystemConfig, GradingSystemModel)> {
    let system = config.grading_system(id).with_context(|| {
        let known: Vec<&str> = config.grading_systems.iter().map(|s| s.id.as_str()).collect();
        format!("Unknown grading system '{}' (known: {})", id, known.join(", "))
    })?;
    let model = system.to_model()?;
    Ok((system, model))
}

/// Load the ledger, apply `update`, and save it back atomically.
fn with_ledger<T>(path: &Path, update: impl FnOnce(&mut BonusLedger) -> T) -> Result<T> {
    let mut ledger = ledger::load_ledger(path)?;
    let value = update(&mut ledger);
    ledger::save_ledger(path, &ledger)?;
    Ok(value)
}
