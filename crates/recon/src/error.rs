use thiserror::Error;

/// The demographic store could not answer a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreUnavailable {
    /// The connection itself is unusable. Every later lookup would fail too.
    #[error("demographic store connection unusable: {0}")]
    Connection(String),
    /// This one query could not execute.
    #[error("demographic store query failed: {0}")]
    Query(String),
}

impl StoreUnavailable {
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// The registry could not hand over the next person.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("registry unreachable: {0}")]
    Network(String),
    #[error("registry returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("registry returned malformed data: {0}")]
    Malformed(String),
    /// The fetched person could not be written to the local archive.
    #[error("could not archive fetched person: {0}")]
    Archive(String),
}

/// The registry did not accept a report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("registry unreachable: {0}")]
    Network(String),
    #[error("registry rejected report with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Why a run stopped before the registry ran out of persons.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("cycle {cycle}: fetching next person failed: {source}")]
    Fetch { cycle: u64, source: FetchError },
    #[error("cycle {cycle}, person {person_id}: {source}")]
    Store {
        cycle: u64,
        person_id: String,
        source: StoreUnavailable,
    },
    #[error("cycle {cycle}, person {person_id}: report not submitted: {source}")]
    Submit {
        cycle: u64,
        person_id: String,
        source: SubmitError,
    },
}

impl RunError {
    pub fn cycle(&self) -> u64 {
        match self {
            Self::Fetch { cycle, .. } | Self::Store { cycle, .. } | Self::Submit { cycle, .. } => *cycle,
        }
    }

    /// The person whose cycle failed, if one had been fetched.
    pub fn person_id(&self) -> Option<&str> {
        match self {
            Self::Fetch { .. } => None,
            Self::Store { person_id, .. } | Self::Submit { person_id, .. } => Some(person_id),
        }
    }
}
