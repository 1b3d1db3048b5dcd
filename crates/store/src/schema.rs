use idmatch_recon::{AgeRange, CandidateRecord, Demographics, Gender, UsState};

/// Ages at or above this are data-entry noise in the source tables.
pub const MAX_PLAUSIBLE_AGE: i32 = 115;

pub(crate) const COLUMNS: &str = "individualid, firstname, lastname, gender, birthdate, city, state, zip";

/// Per-state table holding that state's individuals.
///
/// Safe to interpolate into SQL: `UsState` only ever holds a known code.
pub fn table_name(state: UsState) -> String {
    format!("{}_indiv_raw", state.code().to_ascii_lowercase())
}

pub(crate) fn create_table_sql(state: UsState) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (
            individualid TEXT NOT NULL,
            firstname    TEXT NOT NULL,
            lastname     TEXT NOT NULL,
            gender       TEXT,
            birthdate    TEXT,
            city         TEXT,
            state        TEXT,
            zip          TEXT
        )",
        table_name(state)
    )
}

/// One raw row of a `{state}_indiv_raw` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemographicRow {
    pub individualid: String,
    pub firstname: String,
    pub lastname: String,
    /// `M`, `F`, or anything else for unknown.
    pub gender: Option<String>,
    /// Starts with the four-digit birth year (`YYYYMMDD` in practice).
    pub birthdate: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

impl DemographicRow {
    pub fn into_candidate(self, reference_year: i32) -> CandidateRecord {
        let demographics = Demographics {
            gender: parse_gender(self.gender.as_deref()),
            age: self
                .birthdate
                .as_deref()
                .and_then(|b| age_from_birthdate(b, reference_year))
                .map(AgeRange::exact),
        };

        CandidateRecord {
            external_id: self.individualid,
            given_name: self.firstname,
            family_name: self.lastname,
            city: self.city,
            state: self.state,
            postal_code: self.zip,
            demographics,
        }
    }
}

fn parse_gender(raw: Option<&str>) -> Option<Gender> {
    match raw.map(str::trim) {
        Some("M") => Some(Gender::Male),
        Some("F") => Some(Gender::Female),
        _ => None,
    }
}

fn age_from_birthdate(birthdate: &str, reference_year: i32) -> Option<u8> {
    let year: i32 = birthdate.trim().get(..4)?.parse().ok()?;
    let age = reference_year - year;
    if (0..MAX_PLAUSIBLE_AGE).contains(&age) {
        u8::try_from(age).ok()
    } else {
        None
    }
}
