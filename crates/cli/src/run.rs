//! `idmatch run` - one full pass over the registry.

use std::path::Path;

use idmatch_config::Settings;
use idmatch_recon::{
    FetchError, Halted, Orchestrator, PersonRecord, Registry, Report, RunError, RunPolicy,
    RunSummary, SubmitError,
};
use idmatch_registry::{PatchBody, RegistryClient, RegistryCredentials, RegistryOptions};
use idmatch_store::SqliteDemographicStore;

use crate::exit_codes::{run_error_exit_code, EXIT_RUN_STORE};
use crate::CliError;

/// Passes fetches through; logs reports instead of submitting them.
pub struct DryRunRegistry<R> {
    inner: R,
}

impl<R> DryRunRegistry<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Registry> Registry for DryRunRegistry<R> {
    fn fetch_next_person(&mut self) -> Result<Option<PersonRecord>, FetchError> {
        self.inner.fetch_next_person()
    }

    fn submit_report(&mut self, person_id: &str, report: &Report) -> Result<(), SubmitError> {
        match serde_json::to_string(&PatchBody::from(report)) {
            Ok(body) => log::info!("dry run: would PATCH /persons/{person_id} {body}"),
            Err(e) => log::warn!("dry run: cannot render report for {person_id}: {e}"),
        }
        Ok(())
    }
}

pub fn cmd_run(
    config: Option<&Path>,
    json_output: bool,
    dry_run: bool,
    limit: Option<u64>,
) -> Result<(), CliError> {
    let settings = Settings::load(config).map_err(CliError::config)?;

    let store = SqliteDemographicStore::open(&settings.database.path).map_err(|e| {
        CliError::new(EXIT_RUN_STORE, e.to_string())
            .with_hint(format!("check database.path ({})", settings.database.path.display()))
    })?;

    let creds = RegistryCredentials::new(settings.registry.token.clone(), settings.registry.api_base.clone());
    let opts = RegistryOptions {
        page_size: settings.registry.page_size,
        timeout: settings.registry.timeout(),
        archive: settings.registry.archive.clone(),
    };
    let client = RegistryClient::new(&creds, opts).map_err(|e| CliError::usage(e.to_string()))?;

    let mut policy = settings.run_policy();
    policy.max_persons = limit;

    log::info!(
        "starting run against {}{}",
        client.api_base(),
        if dry_run { " (dry run)" } else { "" }
    );

    let result = if dry_run {
        execute(DryRunRegistry::new(client), &store, policy)
    } else {
        execute(client, &store, policy)
    };

    match result {
        Ok(summary) => {
            print_summary(&summary, json_output, dry_run)?;
            Ok(())
        }
        Err(Halted { summary, error }) => {
            print_summary(&summary, json_output, dry_run)?;
            Err(halt_error(&error))
        }
    }
}

fn execute<R: Registry>(
    registry: R,
    store: &SqliteDemographicStore,
    policy: RunPolicy,
) -> Result<RunSummary, Halted> {
    Orchestrator::new(registry, store, policy).run()
}

fn halt_error(error: &RunError) -> CliError {
    let err = CliError::new(run_error_exit_code(error), format!("run halted: {error}"));
    match error {
        RunError::Fetch { .. } => err.with_hint("check registry.api_base and the registry token"),
        RunError::Store { source, .. } if !source.is_connection() => {
            err.with_hint("policy.on_lookup_failure = \"skip\" continues past failed lookups")
        }
        RunError::Submit { .. } => {
            err.with_hint("policy.submit_attempts retries a rejected report before giving up")
        }
        RunError::Store { .. } => err,
    }
}

fn print_summary(summary: &RunSummary, json_output: bool, dry_run: bool) -> Result<(), CliError> {
    if json_output {
        let json = serde_json::to_string_pretty(summary)
            .map_err(|e| CliError::usage(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    eprintln!(
        "fetched {} persons: {} exact, {} ambiguous, {} no match, {} unresolvable",
        summary.fetched, summary.exact, summary.ambiguous, summary.no_match, summary.unresolvable,
    );
    eprintln!(
        "{} reports {}; {} lookup failures, {} submit failures skipped",
        summary.submitted,
        if dry_run { "logged (dry run)" } else { "submitted" },
        summary.lookup_failures,
        summary.submit_failures,
    );
    Ok(())
}
