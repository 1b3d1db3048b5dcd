use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Registry input
// ---------------------------------------------------------------------------

/// One alternate name as the registry reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    pub personal: Option<String>,
    pub family: Option<String>,
}

/// One location as the registry reports it. Values are unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

/// A registry person before identity resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonRecord {
    /// Registry person id, used to tag the submitted report.
    pub id: String,
    /// Primary full name ("Given Family").
    pub name: Option<String>,
    pub names: Vec<NameParts>,
    pub location: Option<Location>,
    pub locations: Vec<Location>,
}

// ---------------------------------------------------------------------------
// Lookup key
// ---------------------------------------------------------------------------

/// ANSI INCITS 38:2009 codes: the 50 states plus DC.
pub const STATE_CODES: [&str; 51] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH",
    "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VT", "VA", "WA", "WV", "WI", "WY",
];

/// A validated U.S. state code. Only the codes in [`STATE_CODES`] exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UsState(&'static str);

impl UsState {
    /// Parse a state code, case-insensitively. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.trim().to_ascii_uppercase();
        STATE_CODES.iter().find(|code| **code == upper).copied().map(UsState)
    }

    /// Upper-case two-letter code.
    pub fn code(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for UsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Identifying attributes used as lookup key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonQuery {
    pub given_name: String,
    pub family_name: String,
    pub state: UsState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl PersonQuery {
    pub fn new(given_name: impl Into<String>, family_name: impl Into<String>, state: UsState) -> Self {
        Self {
            given_name: given_name.into(),
            family_name: family_name.into(),
            state,
            city: None,
            postal_code: None,
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Store output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Age bounds in whole years. The demographic store only knows a birth
/// year, so both bounds are usually equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgeRange {
    pub minimum: u8,
    pub maximum: u8,
}

impl AgeRange {
    pub fn exact(age: u8) -> Self {
        Self { minimum: age, maximum: age }
    }
}

/// Fields the store knows that the registry does not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Demographics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<AgeRange>,
}

impl Demographics {
    pub fn is_empty(&self) -> bool {
        self.gender.is_none() && self.age.is_none()
    }
}

/// One demographic-store row that satisfied a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateRecord {
    pub external_id: String,
    pub given_name: String,
    pub family_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub demographics: Demographics,
}

impl CandidateRecord {
    /// "Given Family", as the registry displays names.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Two or more candidates. Cannot be built from fewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousCandidates(Vec<CandidateRecord>);

impl AmbiguousCandidates {
    pub fn as_slice(&self) -> &[CandidateRecord] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<CandidateRecord> {
        self.0
    }
}

impl TryFrom<Vec<CandidateRecord>> for AmbiguousCandidates {
    type Error = Vec<CandidateRecord>;

    fn try_from(candidates: Vec<CandidateRecord>) -> Result<Self, Self::Error> {
        if candidates.len() >= 2 {
            Ok(Self(candidates))
        } else {
            Err(candidates)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    NoMatch,
    ExactMatch(CandidateRecord),
    AmbiguousMatch(AmbiguousCandidates),
}

impl MatchOutcome {
    pub fn candidates(&self) -> &[CandidateRecord] {
        match self {
            Self::NoMatch => &[],
            Self::ExactMatch(candidate) => std::slice::from_ref(candidate),
            Self::AmbiguousMatch(candidates) => candidates.as_slice(),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Identifying fields of the single resolved candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedIdentity {
    pub external_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl From<&CandidateRecord> for MatchedIdentity {
    fn from(candidate: &CandidateRecord) -> Self {
        Self {
            external_id: candidate.external_id.clone(),
            name: candidate.display_name(),
            city: candidate.city.clone(),
            state: candidate.state.clone(),
        }
    }
}
