//! poldiff: Semantic SELinux policy diff tool
//!
//! Compares two policies category by category, lining up renamed, split and
//! merged types before comparing rules.

#![allow(clippy::needless_pass_by_value)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use poldiff::{
    cli::{self, RemapArg, TypemapOptions},
    config::{self, AppConfig, DiffConfig, DiffPaths},
    diff::{Category, TypeRename},
    pipeline::exit_codes,
    reports::ReportFormat,
    ConfigPreset,
};
use std::io::{self, Write as _};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build long version string with format support info
const fn build_long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\nPolicy Formats:",
        "\n  Declarative policy documents (YAML, JSON)",
        "\n\nOutput Formats:",
        "\n  summary, text, json, markdown",
        "\n\nCategories:",
        "\n  classes, commons, types, attributes, roles, users, booleans,",
        "\n  levels, categories, av-allow, av-audit-allow, av-dont-audit,",
        "\n  av-never-allow, te-change, te-member, te-transition,",
        "\n  role-allows, role-transitions, range-transitions"
    )
}

#[derive(Parser)]
#[command(name = "poldiff")]
#[command(version, long_version = build_long_version())]
#[command(about = "Semantic SELinux policy diff tool", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  No differences (or --fail-on-change not set)
    1  Differences found with --fail-on-change
    3  Error occurred

EXAMPLES:
    # Compare everything
    poldiff diff base-1.0.yaml base-1.1.yaml

    # Only allow rules, with source line numbers
    poldiff diff old.yaml new.yaml --category av-allow --line-numbers

    # Declare a rename and export JSON
    poldiff diff old.yaml new.yaml --rename httpd_sys_content_t:httpd_content_t -o json

    # Inspect how types line up
    poldiff typemap old.yaml new.yaml --remap 'a_t,b_t=ab_t'")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output (also respects `NO_COLOR` env)
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to configuration file
    #[arg(long, global = true, env = "POLDIFF_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments for the `diff` subcommand
#[derive(Parser)]
struct DiffArgs {
    /// Path to the original policy
    original: PathBuf,

    /// Path to the modified policy
    modified: PathBuf,

    /// Category to compare (repeatable; default is every category)
    #[arg(short, long = "category", value_enum)]
    categories: Vec<Category>,

    /// Named category selection
    #[arg(long, value_enum, conflicts_with = "categories")]
    preset: Option<ConfigPreset>,

    /// Declare a type rename as ORIGINAL:MODIFIED (repeatable)
    #[arg(long = "rename", value_name = "ORIGINAL:MODIFIED")]
    renames: Vec<TypeRename>,

    /// Annotate allow and type rule differences with source line numbers
    #[arg(short = 'l', long)]
    line_numbers: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<ReportFormat>,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// List at most this many items per category
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_items: Option<u64>,

    /// Exit with code 1 if any differences are found
    #[arg(long)]
    fail_on_change: bool,
}

/// Arguments for the `typemap` subcommand
#[derive(Parser)]
struct TypemapArgs {
    /// Path to the original policy
    original: PathBuf,

    /// Path to the modified policy
    modified: PathBuf,

    /// Declare a type rename as ORIGINAL:MODIFIED (repeatable)
    #[arg(long = "rename", value_name = "ORIGINAL:MODIFIED")]
    renames: Vec<TypeRename>,

    /// Declare a split or merge as ORIG[,ORIG...]=MOD[,MOD...] (repeatable)
    #[arg(long = "remap", value_name = "ORIG=MOD")]
    remaps: Vec<RemapArg>,

    /// Also list types that map to themselves
    #[arg(short, long)]
    all: bool,

    /// Output format (text or json)
    #[arg(short, long, value_enum, default_value = "text")]
    output: ReportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,
}

/// Arguments for the `validate` subcommand
#[derive(Parser)]
struct ValidateArgs {
    /// Policies to load and check
    #[arg(required = true)]
    policies: Vec<PathBuf>,

    /// Output format (text or json)
    #[arg(short, long, value_enum, default_value = "text")]
    output: ReportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// Exit with code 1 if any policy has warnings
    #[arg(long)]
    fail_on_warning: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two policies
    Diff(DiffArgs),

    /// Show how the types of two policies line up
    Typemap(TypemapArgs),

    /// Load policies and report what they declare
    Validate(ValidateArgs),

    /// List the category presets
    Presets,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate JSON Schema for the config file format
    ConfigSchema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show, discover, or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate a man page and print it to stdout
    Man,
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print current effective configuration (merged from defaults + file)
    Show,
    /// Print config file search paths and discovered config file
    Path,
    /// Generate an example .poldiff.yaml in the current directory
    Init,
}

/// Translate diff arguments into config overrides.
fn diff_overrides(args: &DiffArgs, cli: &Cli) -> AppConfig {
    let mut overrides = args.preset.map(AppConfig::from_preset).unwrap_or_default();
    if !args.categories.is_empty() {
        overrides.diff.categories.clone_from(&args.categories);
    }
    overrides.diff.line_numbers = args.line_numbers;
    overrides.renames.clone_from(&args.renames);
    overrides.output.format = args.output.unwrap_or_default();
    overrides.output.file.clone_from(&args.output_file);
    overrides.output.max_items = args.max_items.map(|n| n as usize);
    overrides.output.no_color = cli.no_color;
    overrides.behavior.fail_on_change = args.fail_on_change;
    overrides.behavior.quiet = cli.quiet;
    overrides
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_codes::ERROR
        }
    };
    if exit_code != exit_codes::SUCCESS {
        std::process::exit(exit_code);
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Commands::Diff(args) => {
            let overrides = diff_overrides(args, cli);
            let (app, loaded_from) =
                AppConfig::from_file_with_overrides(cli.config.as_deref(), &overrides);
            if let Some(path) = &loaded_from {
                tracing::debug!("Using config file {}", path.display());
            }
            let config = DiffConfig::from_app_config(
                DiffPaths {
                    original: args.original.clone(),
                    modified: args.modified.clone(),
                },
                &app,
            );
            cli::run_diff(config)
        }

        Commands::Typemap(args) => {
            let (app, _) = config::load_or_default(cli.config.as_deref());
            let mut renames = app.renames;
            for rename in &args.renames {
                if !renames.contains(rename) {
                    renames.push(rename.clone());
                }
            }
            cli::run_typemap(TypemapOptions {
                paths: DiffPaths {
                    original: args.original.clone(),
                    modified: args.modified.clone(),
                },
                renames,
                remaps: args.remaps.clone(),
                all: args.all,
                format: args.output,
                output_file: args.output_file.clone(),
            })?;
            Ok(exit_codes::SUCCESS)
        }

        Commands::Validate(args) => cli::run_validate(
            args.policies.clone(),
            args.output,
            args.output_file.clone(),
            args.fail_on_warning,
        ),

        Commands::Presets => {
            for preset in ConfigPreset::all() {
                println!("{:<10} {}", preset.name(), preset.description());
                let names: Vec<&str> = preset.mask().categories().map(|c| c.name()).collect();
                println!("{:<10} {}", "", names.join(", "));
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Completions { shell } => {
            generate(*shell, &mut Cli::command(), "poldiff", &mut io::stdout());
            Ok(exit_codes::SUCCESS)
        }

        Commands::ConfigSchema { output } => {
            let schema = config::generate_json_schema().context("failed to build schema")?;
            match output {
                Some(path) => {
                    std::fs::write(path, &schema)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => println!("{schema}"),
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Config { action } => {
            run_config(action, cli)?;
            Ok(exit_codes::SUCCESS)
        }

        Commands::Man => {
            let man = clap_mangen::Man::new(Cli::command());
            let mut buf = Vec::new();
            man.render(&mut buf).context("failed to render man page")?;
            io::stdout().write_all(&buf)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn run_config(action: &ConfigAction, cli: &Cli) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let (config, loaded_from) = config::load_or_default(cli.config.as_deref());
            if let Some(path) = &loaded_from {
                eprintln!("# Loaded from: {}", path.display());
            } else {
                eprintln!("# No config file found; showing defaults");
            }
            let yaml = serde_yaml_ng::to_string(&config).context("failed to serialize config")?;
            print!("{yaml}");
        }
        ConfigAction::Path => {
            let search_paths: [Option<String>; 3] = [
                std::env::current_dir()
                    .ok()
                    .map(|p| p.display().to_string()),
                config::user_config_dir().map(|p| p.display().to_string()),
                ::dirs::home_dir().map(|p| p.display().to_string()),
            ];
            eprintln!("Config file search paths (in order, git root after the current directory):");
            for path in search_paths.into_iter().flatten() {
                eprintln!("  {path}");
            }
            eprintln!();
            eprintln!("Recognized file names:");
            for name in config::CONFIG_FILE_NAMES {
                eprintln!("  {name}");
            }
            eprintln!();
            match config::discover_config_file(cli.config.as_deref()) {
                Some(path) => eprintln!("Active config file: {}", path.display()),
                None => eprintln!("No config file found."),
            }
        }
        ConfigAction::Init => {
            let target = std::env::current_dir()
                .context("cannot determine current directory")?
                .join(".poldiff.yaml");
            if target.exists() {
                anyhow::bail!(
                    "{} already exists. Remove it first to re-initialize.",
                    target.display()
                );
            }
            std::fs::write(&target, config::generate_full_example_config())
                .with_context(|| format!("failed to write {}", target.display()))?;
            eprintln!("Created {}", target.display());
        }
    }
    Ok(())
}
