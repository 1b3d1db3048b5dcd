//! Sequential fetch → lookup → classify → report → submit loop.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::classify;
use crate::error::RunError;
use crate::gateway::{DemographicStore, Registry};
use crate::identity::resolve_query;
use crate::report::{build_report, Report, ReportOutcome};

/// What to do when one person's cycle fails on a recoverable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureAction {
    /// Log it, count it, move on to the next person.
    #[default]
    Skip,
    /// Stop the run.
    Halt,
}

/// Failure handling for a run.
///
/// Fetch errors and unusable store connections always halt; these knobs
/// only cover per-person failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPolicy {
    pub on_lookup_failure: FailureAction,
    pub on_submit_failure: FailureAction,
    /// Submission attempts per report, including the first. No backoff.
    pub submit_attempts: u32,
    /// Stop after this many persons have been fetched.
    pub max_persons: Option<u64>,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            on_lookup_failure: FailureAction::Skip,
            on_submit_failure: FailureAction::Skip,
            submit_attempts: 1,
            max_persons: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub fetched: u64,
    pub exact: u64,
    pub ambiguous: u64,
    pub no_match: u64,
    pub unresolvable: u64,
    pub submitted: u64,
    pub lookup_failures: u64,
    pub submit_failures: u64,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
}

impl RunSummary {
    fn started() -> Self {
        Self {
            started_at: chrono::Utc::now().to_rfc3339(),
            ..Default::default()
        }
    }

    fn finish(&mut self) {
        self.finished_at = Some(chrono::Utc::now().to_rfc3339());
    }

    fn record(&mut self, outcome: ReportOutcome) {
        match outcome {
            ReportOutcome::ExactMatch => self.exact += 1,
            ReportOutcome::AmbiguousMatch => self.ambiguous += 1,
            ReportOutcome::NoMatch => self.no_match += 1,
            ReportOutcome::Unresolvable => self.unresolvable += 1,
        }
    }
}

/// A run that stopped early, with everything tallied up to that point.
#[derive(Debug, Error)]
#[error("run halted: {error}")]
pub struct Halted {
    pub summary: RunSummary,
    #[source]
    pub error: RunError,
}

/// How a single cycle ended when it did not halt the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    Submitted(ReportOutcome),
    /// Lookup failed; no report was submitted for this person.
    LookupSkipped,
    /// Every submission attempt failed; the report is lost.
    SubmitSkipped(ReportOutcome),
}

pub struct Orchestrator<R, S> {
    registry: R,
    store: S,
    policy: RunPolicy,
    cycle: u64,
}

impl<R: Registry, S: DemographicStore> Orchestrator<R, S> {
    pub fn new(registry: R, store: S, policy: RunPolicy) -> Self {
        Self { registry, store, policy, cycle: 0 }
    }

    /// Process persons until the registry runs dry, the person limit is
    /// reached, or a failure halts the run.
    pub fn run(&mut self) -> Result<RunSummary, Halted> {
        let mut summary = RunSummary::started();

        loop {
            if self.policy.max_persons.is_some_and(|max| summary.fetched >= max) {
                log::info!("person limit reached after {} fetched", summary.fetched);
                break;
            }

            match self.run_cycle(&mut summary) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    log::info!("registry exhausted after {} person(s)", summary.fetched);
                    break;
                }
                Err(error) => {
                    log::error!("{error}");
                    summary.finish();
                    return Err(Halted { summary, error });
                }
            }
        }

        summary.finish();
        Ok(summary)
    }

    /// Run one full cycle. `Ok(None)` means the registry had no more persons.
    pub fn run_cycle(&mut self, summary: &mut RunSummary) -> Result<Option<CycleStatus>, RunError> {
        self.cycle += 1;
        let cycle = self.cycle;

        let person = match self.registry.fetch_next_person() {
            Ok(Some(person)) => person,
            Ok(None) => return Ok(None),
            Err(source) => return Err(RunError::Fetch { cycle, source }),
        };
        summary.fetched += 1;

        let report = match resolve_query(&person) {
            Err(reason) => {
                log::warn!("cycle {cycle}, person {}: unresolvable: {reason}", person.id);
                Report::unresolvable()
            }
            Ok(query) => match self.store.lookup(&query) {
                Ok(candidates) => build_report(&classify(&query, candidates)),
                Err(source) => {
                    summary.lookup_failures += 1;
                    if source.is_connection() || self.policy.on_lookup_failure == FailureAction::Halt {
                        return Err(RunError::Store { cycle, person_id: person.id, source });
                    }
                    log::error!("cycle {cycle}, person {}: {source}; skipping", person.id);
                    return Ok(Some(CycleStatus::LookupSkipped));
                }
            },
        };
        let outcome = report.outcome();
        summary.record(outcome);

        match self.submit(&person.id, &report) {
            Ok(()) => {
                summary.submitted += 1;
                log::info!("cycle {cycle}, person {}: {outcome}", person.id);
                Ok(Some(CycleStatus::Submitted(outcome)))
            }
            Err(source) => {
                summary.submit_failures += 1;
                if self.policy.on_submit_failure == FailureAction::Halt {
                    return Err(RunError::Submit { cycle, person_id: person.id, source });
                }
                log::error!("cycle {cycle}, person {}: report not submitted: {source}; skipping", person.id);
                Ok(Some(CycleStatus::SubmitSkipped(outcome)))
            }
        }
    }

    fn submit(&mut self, person_id: &str, report: &Report) -> Result<(), crate::SubmitError> {
        let attempts = self.policy.submit_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.registry.submit_report(person_id, report) {
                Ok(()) => return Ok(()),
                Err(err) if attempt < attempts => {
                    log::warn!("person {person_id}: submit attempt {attempt}/{attempts} failed: {err}");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub fn into_parts(self) -> (R, S) {
        (self.registry, self.store)
    }
}
