use crate::model::{AmbiguousCandidates, CandidateRecord, MatchOutcome, PersonQuery};

/// Classify the candidates a lookup returned for `query`.
///
/// The store already applied exact equality on every key field, so the
/// outcome depends only on how many rows came back. No scoring, no
/// tie-breaking.
pub fn classify(query: &PersonQuery, candidates: Vec<CandidateRecord>) -> MatchOutcome {
    let outcome = match AmbiguousCandidates::try_from(candidates) {
        Ok(many) => MatchOutcome::AmbiguousMatch(many),
        Err(mut few) => match few.pop() {
            Some(only) => MatchOutcome::ExactMatch(only),
            None => MatchOutcome::NoMatch,
        },
    };

    log::debug!(
        "{} {} ({}): {} candidate(s)",
        query.given_name,
        query.family_name,
        query.state,
        outcome.candidates().len(),
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Demographics, UsState};
    use proptest::prelude::*;

    fn query() -> PersonQuery {
        PersonQuery::new("Jane", "Doe", UsState::parse("IL").unwrap()).with_city("Springfield")
    }

    fn record(id: &str) -> CandidateRecord {
        CandidateRecord {
            external_id: id.into(),
            given_name: "Jane".into(),
            family_name: "Doe".into(),
            city: Some("Springfield".into()),
            state: Some("IL".into()),
            postal_code: None,
            demographics: Demographics::default(),
        }
    }

    #[test]
    fn empty_is_no_match() {
        assert_eq!(classify(&query(), vec![]), MatchOutcome::NoMatch);
    }

    #[test]
    fn singleton_is_exact_match() {
        let outcome = classify(&query(), vec![record("a")]);
        assert_eq!(outcome, MatchOutcome::ExactMatch(record("a")));
    }

    #[test]
    fn many_is_ambiguous_and_keeps_every_candidate() {
        let outcome = classify(&query(), vec![record("a"), record("b")]);
        match outcome {
            MatchOutcome::AmbiguousMatch(c) => {
                let ids: Vec<_> = c.as_slice().iter().map(|r| r.external_id.as_str()).collect();
                assert_eq!(ids, ["a", "b"]);
            }
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn identical_rows_are_still_ambiguous() {
        let outcome = classify(&query(), vec![record("a"), record("a")]);
        assert!(matches!(outcome, MatchOutcome::AmbiguousMatch(_)));
    }

    proptest! {
        #[test]
        fn outcome_partitions_on_cardinality(n in 0usize..20) {
            let candidates: Vec<_> = (0..n).map(|i| record(&i.to_string())).collect();
            let outcome = classify(&query(), candidates);
            prop_assert_eq!(outcome.candidates().len(), n);
            match n {
                0 => prop_assert!(matches!(outcome, MatchOutcome::NoMatch)),
                1 => prop_assert!(matches!(outcome, MatchOutcome::ExactMatch(_))),
                _ => prop_assert!(matches!(outcome, MatchOutcome::AmbiguousMatch(_))),
            }
        }
    }
}
