use std::path::Path;

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use tracing::debug;

use crate::error::EnvError;

/// Delete the tracker database file if it exists and recreate it empty.
///
/// # Errors
///
/// Will return an error if the file or its parent directory cannot be
/// touched, or if SQLite cannot initialize the new database.
pub async fn reset_database(path: &Path) -> Result<(), EnvError> {
    if path.exists() {
        debug!(file = %path.display(), "removing previous database file");
        tokio::fs::remove_file(path).await?;
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&options).await?;

    // An empty VACUUM forces the header write, so a valid empty database
    // lands on disk instead of a zero-byte file.
    sqlx::query("VACUUM").execute(&mut conn).await?;

    conn.close().await?;
    Ok(())
}
