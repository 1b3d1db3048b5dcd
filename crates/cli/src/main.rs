// idmatch CLI - match registry persons against the demographic database

mod exit_codes;
mod lookup;
mod run;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use idmatch_config::{ConfigError, Settings, TOKEN_ENV};

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "idmatch")]
#[command(about = "Match registry persons against a demographic database and report back")]
#[command(version)]
#[command(long_version = long_version())]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every registry person, match it, and submit a report
    #[command(after_help = "\
Examples:
  idmatch run
  idmatch run --config /etc/idmatch.toml --json
  idmatch run --dry-run --limit 20

Exit codes:
  0   run finished (skipped persons are counted, not fatal)
  2   configuration error
  60  halted: registry fetch failed
  61  halted: demographic store unusable
  62  halted: report submission failed")]
    Run {
        /// Config file (TOML, or JSON when the extension is .json)
        #[arg(long, env = "IDMATCH_CONFIG")]
        config: Option<PathBuf>,

        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Log reports instead of submitting them
        #[arg(long)]
        dry_run: bool,

        /// Stop after this many persons
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Look up one person and print the report that would be submitted
    #[command(after_help = "\
Examples:
  idmatch lookup --given Jane --family Doe --state IL
  idmatch lookup --given Jane --family Doe --state IL --city Springfield
  idmatch lookup --given Jane --family Doe --state IL --database infousa.sqlite")]
    Lookup(lookup::LookupArgs),

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Load and validate the configuration
    Check {
        #[arg(long, env = "IDMATCH_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("IDMATCH_COMMIT"), ")",
        "\ntarget:  ", env!("IDMATCH_TARGET"),
    )
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, json, dry_run, limit } => {
            run::cmd_run(config.as_deref(), json, dry_run, limit)
        }
        Commands::Lookup(args) => lookup::cmd_lookup(args),
        Commands::Config(ConfigCommands::Check { config }) => cmd_config_check(config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Read { .. } => Some(format!(
                "pass --config or create {}",
                Settings::config_path().display()
            )),
            ConfigError::Invalid { field: "registry.token", .. } => {
                Some(format!("set registry.token or export {TOKEN_ENV}"))
            }
            _ => None,
        };
        Self { code: EXIT_USAGE, message: err.to_string(), hint }
    }
}

fn cmd_config_check(config: Option<&Path>) -> Result<(), CliError> {
    let settings = Settings::load(config).map_err(CliError::config)?;

    eprintln!("database: {}", settings.database.path.display());
    eprintln!(
        "registry: {} (page size {}, timeout {}s)",
        settings.registry.api_base, settings.registry.page_size, settings.registry.timeout_secs,
    );
    if let Some(archive) = &settings.registry.archive {
        eprintln!("archive:  {}", archive.display());
    }
    let policy = settings.run_policy();
    eprintln!(
        "policy:   lookup failure {:?}, submit failure {:?}, {} submit attempt(s)",
        policy.on_lookup_failure, policy.on_submit_failure, policy.submit_attempts,
    );
    eprintln!("config ok");
    Ok(())
}
