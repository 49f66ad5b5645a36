use sqlx::{Connection, MySqlConnection};
use tracing::debug;
use url::Url;

use crate::error::EnvError;

/// Drop and recreate the index backend database on the given server.
///
/// # Errors
///
/// Will return an error if the database name is not a plain identifier, or if
/// the MySQL server rejects the connection or the DDL.
pub async fn reset_database(url: &Url, database: &str) -> Result<(), EnvError> {
    ensure_valid_identifier(database)?;

    let mut conn = MySqlConnection::connect(url.as_str()).await?;
    for statement in reset_statements(database) {
        debug!(statement = %statement, "executing");
        sqlx::query(&statement).execute(&mut conn).await?;
    }
    conn.close().await?;
    Ok(())
}

// The name is interpolated into DDL, where bind placeholders are not
// available.
fn ensure_valid_identifier(database: &str) -> Result<(), EnvError> {
    if database.is_empty()
        || !database
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(EnvError::InvalidDatabaseName(database.to_string()));
    }
    Ok(())
}

fn reset_statements(database: &str) -> [String; 2] {
    [
        format!("DROP DATABASE IF EXISTS `{database}`"),
        format!("CREATE DATABASE `{database}`"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_e2e_database_names() {
        assert!(ensure_valid_identifier("torrust_index_backend_e2e_testing").is_ok());
        assert!(ensure_valid_identifier("torrust_index_e2e_testing").is_ok());
    }

    #[test]
    fn rejects_names_that_would_break_out_of_the_ddl() {
        for name in ["", "db`; DROP DATABASE mysql", "db name", "db-name"] {
            assert!(
                matches!(
                    ensure_valid_identifier(name),
                    Err(EnvError::InvalidDatabaseName(_))
                ),
                "accepted {name:?}"
            );
        }
    }

    #[test]
    fn reset_drops_then_recreates() {
        let [drop, create] = reset_statements("torrust_index_backend_e2e_testing");
        assert_eq!(
            drop,
            "DROP DATABASE IF EXISTS `torrust_index_backend_e2e_testing`"
        );
        assert_eq!(create, "CREATE DATABASE `torrust_index_backend_e2e_testing`");
    }
}
