//! Registry JSON shapes.
//!
//! Inbound persons are decoded leniently (missing and `null` both mean
//! absent). Outbound PATCH bodies never contain `null`: absent values are
//! omitted.

use idmatch_recon::{AgeRange, Gender, Location, NameParts, PersonRecord, Report, ReportOutcome};
use serde::{Deserialize, Serialize};

// ── Inbound ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct PersonsPage {
    #[serde(default)]
    pub persons: Option<Vec<serde_json::Value>>,
}

/// Registry ids are numeric today but have been strings before.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(i64),
    Text(String),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Number(n) => n.to_string(),
            WireId::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireName {
    #[serde(default)]
    personal: Option<String>,
    #[serde(default)]
    family: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireLocation {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default, alias = "zip", alias = "postal")]
    postal_code: Option<String>,
}

impl From<WireLocation> for Location {
    fn from(l: WireLocation) -> Self {
        Location {
            city: l.city,
            state: l.state,
            postal_code: l.postal_code,
        }
    }
}

/// One person object from `GET /persons`.
#[derive(Debug, Clone, Deserialize)]
pub struct WirePerson {
    id: WireId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    names: Option<Vec<WireName>>,
    #[serde(default)]
    location: Option<WireLocation>,
    #[serde(default)]
    locations: Option<Vec<WireLocation>>,
}

impl From<WirePerson> for PersonRecord {
    fn from(p: WirePerson) -> Self {
        PersonRecord {
            id: p.id.into_string(),
            name: p.name,
            names: p
                .names
                .unwrap_or_default()
                .into_iter()
                .map(|n| NameParts { personal: n.personal, family: n.family })
                .collect(),
            location: p.location.map(Location::from),
            locations: p.locations.unwrap_or_default().into_iter().map(Location::from).collect(),
        }
    }
}

// ── Outbound ────────────────────────────────────────────────────────

/// Registry status string for an outcome.
pub fn wire_status(outcome: ReportOutcome) -> &'static str {
    match outcome {
        ReportOutcome::ExactMatch => "found",
        ReportOutcome::NoMatch => "missing",
        ReportOutcome::AmbiguousMatch => "ambiguous",
        ReportOutcome::Unresolvable => "failed",
    }
}

/// Body of `PATCH /persons/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchBody {
    pub person: PatchPerson,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchPerson {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<AgeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<PatchLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl From<&Report> for PatchBody {
    fn from(report: &Report) -> Self {
        let matched = report.matched();
        let demographics = report.demographics();

        let location = matched
            .filter(|m| m.city.is_some() || m.state.is_some())
            .map(|m| PatchLocation { city: m.city.clone(), state: m.state.clone() });

        PatchBody {
            person: PatchPerson {
                status: wire_status(report.outcome()),
                external_id: matched.map(|m| m.external_id.clone()),
                name: matched.map(|m| m.name.clone()),
                gender: demographics.and_then(|d| d.gender),
                age: demographics.and_then(|d| d.age),
                location,
            },
        }
    }
}
