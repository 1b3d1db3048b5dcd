//! `idmatch lookup` - one lookup, classification, and report, printed
//! instead of submitted.

use std::path::PathBuf;

use clap::Args;

use idmatch_config::Settings;
use idmatch_recon::{
    build_report, classify, resolve_query, DemographicStore, Location, MatchOutcome, NameParts,
    PersonRecord,
};
use idmatch_store::SqliteDemographicStore;

use crate::exit_codes::{EXIT_LOOKUP_INPUT, EXIT_RUN_STORE};
use crate::CliError;

#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Given (first) name
    #[arg(long)]
    pub given: String,

    /// Family (last) name
    #[arg(long)]
    pub family: String,

    /// Two-letter US state code
    #[arg(long)]
    pub state: String,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub postal_code: Option<String>,

    /// Demographic database; overrides database.path from the config
    #[arg(long)]
    pub database: Option<PathBuf>,

    #[arg(long, env = "IDMATCH_CONFIG")]
    pub config: Option<PathBuf>,
}

impl LookupArgs {
    /// Shape the arguments as a registry person so they go through the same
    /// resolution rules a fetched person does.
    fn as_person(&self) -> PersonRecord {
        PersonRecord {
            id: "lookup".into(),
            name: None,
            names: vec![NameParts {
                personal: Some(self.given.clone()),
                family: Some(self.family.clone()),
            }],
            location: Some(Location {
                city: self.city.clone(),
                state: Some(self.state.clone()),
                postal_code: self.postal_code.clone(),
            }),
            locations: Vec::new(),
        }
    }

    fn database_path(&self) -> Result<PathBuf, CliError> {
        if let Some(path) = &self.database {
            return Ok(path.clone());
        }
        let settings = Settings::read(self.config.as_deref()).map_err(CliError::config)?;
        settings.validate_database().map_err(CliError::config)?;
        Ok(settings.database.path)
    }
}

pub fn cmd_lookup(args: LookupArgs) -> Result<(), CliError> {
    let query = resolve_query(&args.as_person())
        .map_err(|e| CliError::new(EXIT_LOOKUP_INPUT, format!("cannot look up this person: {e}")))?;

    let db_path = args.database_path()?;
    let store = SqliteDemographicStore::open(&db_path).map_err(|e| {
        CliError::new(EXIT_RUN_STORE, e.to_string())
            .with_hint(format!("check the database path ({})", db_path.display()))
    })?;

    let candidates = store
        .lookup(&query)
        .map_err(|e| CliError::new(EXIT_RUN_STORE, e.to_string()))?;
    let outcome = classify(&query, candidates);

    match &outcome {
        MatchOutcome::NoMatch => eprintln!("no match"),
        MatchOutcome::ExactMatch(c) => {
            eprintln!("exact match: {} ({})", c.display_name(), c.external_id)
        }
        MatchOutcome::AmbiguousMatch(c) => {
            eprintln!("ambiguous match: {} candidates", c.as_slice().len())
        }
    }

    let report = build_report(&outcome);
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| CliError::usage(format!("JSON serialization error: {e}")))?;
    println!("{json}");
    Ok(())
}
