use pricelens_db::SqliteBackend;
use sqlx::sqlite::SqlitePoolOptions;

/// An in-memory backend for tests that do not need a file on disk.
///
/// Limited to a single connection: every in-memory connection is its own
/// database, so a larger pool would scatter the data.
pub async fn memory_backend() -> SqliteBackend {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database should open");
    SqliteBackend::from_pool(pool)
        .await
        .expect("schema init should succeed")
}
