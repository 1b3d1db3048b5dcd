//! CLI Exit Code Registry
//!
//! Single source of truth for `idmatch` exit codes. Schedulers and wrapper
//! scripts key off these, so they are part of the shell contract.
//!
//! | Code | Meaning                                           |
//! |------|---------------------------------------------------|
//! | 0    | Success (including a run that skipped persons)    |
//! | 2    | Usage or configuration error                      |
//! | 60   | Run halted: registry fetch failed                 |
//! | 61   | Run halted: demographic store unusable            |
//! | 62   | Run halted: report submission failed              |
//! | 63   | `lookup` input cannot form a query                |
//!
//! New codes go in the 60-69 block; update the table when adding one.

use idmatch_recon::RunError;

/// Success - command completed. Skipped persons are not a failure.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, unreadable or invalid configuration.
pub const EXIT_USAGE: u8 = 2;

/// The registry could not hand over the next person.
pub const EXIT_RUN_FETCH: u8 = 60;

/// The demographic store could not be opened, or a lookup failed under
/// the halt policy.
pub const EXIT_RUN_STORE: u8 = 61;

/// A report could not be submitted under the halt policy.
pub const EXIT_RUN_SUBMIT: u8 = 62;

/// `lookup` was given a name or state that cannot form a query.
pub const EXIT_LOOKUP_INPUT: u8 = 63;

/// Exit code for a halted run.
pub fn run_error_exit_code(err: &RunError) -> u8 {
    match err {
        RunError::Fetch { .. } => EXIT_RUN_FETCH,
        RunError::Store { .. } => EXIT_RUN_STORE,
        RunError::Submit { .. } => EXIT_RUN_SUBMIT,
    }
}
