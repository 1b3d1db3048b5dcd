//! `idmatch-recon`: person-to-demographic-record matching core.
//!
//! Pure engine crate: resolves a registry person into a lookup key,
//! classifies the candidates a store returns, and shapes the report.
//! All I/O lives behind the [`Registry`] and [`DemographicStore`] traits.

pub mod classify;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod model;
pub mod report;

pub use classify::classify;
pub use engine::{CycleStatus, FailureAction, Halted, Orchestrator, RunPolicy, RunSummary};
pub use error::{FetchError, RunError, StoreUnavailable, SubmitError};
pub use gateway::{DemographicStore, Registry};
pub use identity::{resolve_query, Unresolvable};
pub use model::{
    AgeRange, AmbiguousCandidates, CandidateRecord, Demographics, Gender, Location, MatchOutcome,
    MatchedIdentity, NameParts, PersonQuery, PersonRecord, UsState,
};
pub use report::{build_report, Report, ReportOutcome};
