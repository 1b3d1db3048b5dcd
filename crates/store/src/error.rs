use idmatch_recon::StoreUnavailable;
use rusqlite::ErrorCode;

/// Map a SQLite error onto the store failure taxonomy.
///
/// Open/format/corruption errors mean the connection is unusable; anything
/// else (missing table, busy, bad statement) only fails the current query.
pub fn store_error(err: rusqlite::Error) -> StoreUnavailable {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(
                e.code,
                ErrorCode::CannotOpen | ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt
            ) =>
        {
            StoreUnavailable::Connection(err.to_string())
        }
        _ => StoreUnavailable::Query(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_failures_are_connection_errors() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_NOTADB),
            Some("file is not a database".into()),
        );
        assert!(store_error(err).is_connection());
    }

    #[test]
    fn statement_failures_are_query_errors() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some("no such table: zz_indiv_raw".into()),
        );
        let mapped = store_error(err);
        assert!(!mapped.is_connection());
        assert!(mapped.to_string().contains("no such table"));
    }
}
