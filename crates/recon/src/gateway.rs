//! Collaborator seams. The core never talks to HTTP or SQL directly.

use crate::error::{FetchError, StoreUnavailable, SubmitError};
use crate::model::{CandidateRecord, PersonQuery, PersonRecord};
use crate::report::Report;

/// Remote person source and report sink.
pub trait Registry {
    /// Next person, or `None` once the registry has no more.
    fn fetch_next_person(&mut self) -> Result<Option<PersonRecord>, FetchError>;

    fn submit_report(&mut self, person_id: &str, report: &Report) -> Result<(), SubmitError>;
}

/// Local demographic database.
pub trait DemographicStore {
    /// Rows equal to `query` on every field it carries. Order is not meaningful.
    fn lookup(&self, query: &PersonQuery) -> Result<Vec<CandidateRecord>, StoreUnavailable>;
}

impl<R: Registry + ?Sized> Registry for &mut R {
    fn fetch_next_person(&mut self) -> Result<Option<PersonRecord>, FetchError> {
        (**self).fetch_next_person()
    }

    fn submit_report(&mut self, person_id: &str, report: &Report) -> Result<(), SubmitError> {
        (**self).submit_report(person_id, report)
    }
}

impl<S: DemographicStore + ?Sized> DemographicStore for &S {
    fn lookup(&self, query: &PersonQuery) -> Result<Vec<CandidateRecord>, StoreUnavailable> {
        (**self).lookup(query)
    }
}
