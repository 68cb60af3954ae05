use golink_core::StorageError;

/// PostgreSQL's `duplicate_table` / `duplicate_object`.
const ALREADY_EXISTS_CODES: [&str; 2] = ["42P07", "42710"];

pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Configuration(_)
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_) => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

/// Whether a schema statement failed only because its object already exists.
///
/// `IF NOT EXISTS` is not race free on PostgreSQL: two instances creating
/// the same table at once can trip a unique violation in the catalog.
pub(crate) fn is_already_exists(err: &sqlx::Error) -> bool {
    err.as_database_error().is_some_and(|db_err| {
        db_err.is_unique_violation()
            || db_err
                .code()
                .is_some_and(|code| ALREADY_EXISTS_CODES.iter().any(|known| *known == code))
    })
}
