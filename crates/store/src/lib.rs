//! SQLite demographic store.
//!
//! Records are partitioned per state into `{state}_indiv_raw` tables.
//! The database is opened read-only once and reused for every lookup.
//!
//! ```rust,no_run
//! use idmatch_recon::{DemographicStore, PersonQuery, UsState};
//! use idmatch_store::SqliteDemographicStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteDemographicStore::open("infousa.sqlite")?;
//! let il = UsState::parse("IL").unwrap();
//! let rows = store.lookup(&PersonQuery::new("Jane", "Doe", il))?;
//! println!("{} candidate(s)", rows.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod schema;
mod store;

pub use error::store_error;
pub use schema::{table_name, DemographicRow, MAX_PLAUSIBLE_AGE};
pub use store::SqliteDemographicStore;
