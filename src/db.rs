//! Shared SQLite pool construction for the store and the queue.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// Open a SQLite pool for the given connection string.
///
/// File-backed databases are created if missing. In-memory databases are
/// pinned to a single pooled connection, since every new `:memory:`
/// connection would otherwise see its own empty database.
pub(crate) async fn connect_pool(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

    let mut pool_options = SqlitePoolOptions::new();
    if url.contains(":memory:") {
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    pool_options.connect_with(options).await
}
