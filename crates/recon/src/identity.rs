//! Turn what the registry knows about a person into a lookup key.
//!
//! The registry carries a primary name/location plus lists of alternates.
//! The primary value wins when present; an alternate is only used when it
//! is the single usable one.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::model::{Location, PersonQuery, PersonRecord, UsState};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Unresolvable {
    #[error("no usable first/last name pair")]
    MissingName,
    /// The demographic store is Latin-1; anything outside it can never match.
    #[error("name contains characters outside Latin-1")]
    UnsupportedCharacters,
    #[error("no usable state")]
    MissingState,
    #[error("unknown state code '{0}'")]
    UnknownState(String),
}

/// Resolve a registry person into a [`PersonQuery`].
pub fn resolve_query(person: &PersonRecord) -> Result<PersonQuery, Unresolvable> {
    let (given, family) = resolve_name(person)?;
    if !is_latin1(&given) || !is_latin1(&family) {
        return Err(Unresolvable::UnsupportedCharacters);
    }

    let (state, city, postal_code) = resolve_location(person)?;

    Ok(PersonQuery {
        given_name: given,
        family_name: family,
        state,
        city,
        postal_code,
    })
}

fn resolve_name(person: &PersonRecord) -> Result<(String, String), Unresolvable> {
    if let Some(name) = person.name.as_deref() {
        let tokens: Vec<&str> = name.split_whitespace().collect();
        if let [given, family] = tokens.as_slice() {
            return Ok((given.to_string(), family.to_string()));
        }
    }

    let complete: Vec<(&str, &str)> = person
        .names
        .iter()
        .filter_map(|n| Some((non_empty(n.personal.as_deref())?, non_empty(n.family.as_deref())?)))
        .collect();

    match complete.as_slice() {
        [(given, family)] => Ok((given.to_string(), family.to_string())),
        _ => Err(Unresolvable::MissingName),
    }
}

type ResolvedLocation = (UsState, Option<String>, Option<String>);

fn resolve_location(person: &PersonRecord) -> Result<ResolvedLocation, Unresolvable> {
    if let Some(primary) = &person.location {
        if let Some(raw) = non_empty(primary.state.as_deref()) {
            let state = parse_state(raw)?;
            return Ok((
                state,
                non_empty(primary.city.as_deref()).map(String::from),
                non_empty(primary.postal_code.as_deref()).map(String::from),
            ));
        }
    }

    let states: BTreeSet<String> = person
        .locations
        .iter()
        .filter_map(|l| non_empty(l.state.as_deref()))
        .map(|s| s.to_ascii_uppercase())
        .collect();

    if states.len() != 1 {
        return Err(Unresolvable::MissingState);
    }
    let Some(raw) = states.into_iter().next() else {
        return Err(Unresolvable::MissingState);
    };
    let state = parse_state(&raw)?;

    let same_state: Vec<&Location> = person
        .locations
        .iter()
        .filter(|l| non_empty(l.state.as_deref()).is_some_and(|s| s.eq_ignore_ascii_case(&raw)))
        .collect();
    let city = unique(same_state.iter().filter_map(|l| non_empty(l.city.as_deref())));
    let postal_code = unique(same_state.iter().filter_map(|l| non_empty(l.postal_code.as_deref())));

    Ok((state, city, postal_code))
}

fn parse_state(raw: &str) -> Result<UsState, Unresolvable> {
    UsState::parse(raw).ok_or_else(|| Unresolvable::UnknownState(raw.to_string()))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// The single distinct value, if the values agree.
fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
    let distinct: BTreeSet<&str> = values.collect();
    if distinct.len() == 1 {
        distinct.into_iter().next().map(String::from)
    } else {
        None
    }
}

fn is_latin1(s: &str) -> bool {
    s.chars().all(|c| (c as u32) <= 0xFF)
}
