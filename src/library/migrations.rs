use rusqlite::{Connection, Transaction};

use crate::{LibraryError, Result};

const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Bring a library database up to the current schema
///
/// Tracks the applied version in SQLite's `user_version` pragma.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let mut version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| LibraryError::storage("failed to read user_version pragma", e))?;

    if version > CURRENT_SCHEMA_VERSION {
        return Err(LibraryError::InvalidParameter {
            parameter: "schema_version".to_string(),
            value: format!(
                "{} (newer than supported schema {})",
                version, CURRENT_SCHEMA_VERSION
            ),
        });
    }

    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .map_err(|e| LibraryError::storage("failed to open migration transaction", e))?;

    while version < CURRENT_SCHEMA_VERSION {
        let next_version = version + 1;
        apply_migration(&tx, next_version)?;
        version = next_version;
    }

    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .map_err(|e| LibraryError::storage("failed to update user_version pragma", e))?;
    tx.commit()
        .map_err(|e| LibraryError::storage("failed to commit migrations", e))?;

    Ok(())
}

fn apply_migration(tx: &Transaction<'_>, version: i32) -> Result<()> {
    match version {
        1 => tx
            .execute_batch(include_str!("schemas/schema_v1.sql"))
            .map_err(|e| LibraryError::storage("failed to execute schema_v1.sql", e)),
        other => Err(LibraryError::invalid_parameter("schema_version", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM library_colors", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION + 1)
            .unwrap();
        assert!(run_migrations(&mut conn).is_err());
    }
}
