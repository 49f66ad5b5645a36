use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};

use torrust_e2e_env::db::sqlite;

fn temp_db_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut path = std::env::temp_dir();
    path.push(format!(
        "torrust-e2e-env-{tag}-{}-{nanos}",
        std::process::id()
    ));
    path.push("storage/tracker/lib/database/torrust_tracker_e2e_testing.db");
    path
}

async fn count_schema_objects(path: &Path) -> i64 {
    let options = SqliteConnectOptions::new().filename(path);
    let mut conn = SqliteConnection::connect_with(&options)
        .await
        .expect("failed to open database");
    let (objects,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sqlite_master")
        .fetch_one(&mut conn)
        .await
        .expect("failed to query sqlite_master");
    conn.close().await.expect("failed to close database");
    objects
}

#[tokio::test]
async fn reset_creates_a_valid_empty_database_and_its_parent_directories() {
    let path = temp_db_path("fresh");

    sqlite::reset_database(&path).await.expect("reset failed");

    assert!(path.exists());
    assert_eq!(count_schema_objects(&path).await, 0);

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn reset_replaces_an_existing_database() {
    let path = temp_db_path("existing");

    sqlite::reset_database(&path).await.expect("first reset failed");

    // Leave a table behind so the second reset has something to wipe.
    let options = SqliteConnectOptions::new().filename(&path);
    let mut conn = SqliteConnection::connect_with(&options)
        .await
        .expect("failed to open database");
    sqlx::query("CREATE TABLE torrents (id INTEGER PRIMARY KEY)")
        .execute(&mut conn)
        .await
        .expect("failed to create table");
    conn.close().await.expect("failed to close database");

    sqlite::reset_database(&path).await.expect("second reset failed");

    assert_eq!(count_schema_objects(&path).await, 0);

    let _ = std::fs::remove_file(&path);
}
