pub mod migrations;
pub mod models;
pub mod queries;

use anyhow::Result;
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

/// Single-connection store. Every request borrows the connection for the
/// duration of one closure, either read-only or as one unit of work.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Fresh private database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))
    }

    /// Run `f` against the connection outside of an explicit transaction.
    /// Meant for reads and single-statement writes.
    pub fn with_conn<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Connection) -> std::result::Result<T, E>,
        E: From<anyhow::Error>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Run `f` as one unit of work: committed if it returns `Ok`, rolled back
    /// otherwise.
    pub fn transaction<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> std::result::Result<T, E>,
        E: From<anyhow::Error>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(anyhow::Error::from)?;

        match f(&tx) {
            Ok(value) => {
                tx.commit().map_err(anyhow::Error::from)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!("Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::queries::users;
    use bazar_types::models::Role;

    fn new_user(email: &str) -> NewUser<'_> {
        NewUser {
            first_name: "Ana",
            last_name: "García",
            email,
            password_hash: "hash",
            role: Role::Buyer,
        }
    }

    #[test]
    fn failed_unit_of_work_is_rolled_back() {
        let db = Database::open_in_memory().unwrap();

        let result: Result<()> = db.transaction(|tx| {
            users::insert(tx, &new_user("ana@example.com"))?;
            anyhow::bail!("boom");
        });
        assert!(result.is_err());

        let found: Option<_> = db
            .with_conn(|conn| users::find_by_email(conn, "ana@example.com"))
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn committed_unit_of_work_is_visible() {
        let db = Database::open_in_memory().unwrap();

        let id: i64 = db
            .transaction(|tx| users::insert(tx, &new_user("luis@example.com")))
            .unwrap();

        let user = db
            .with_conn(|conn| users::find_by_id(conn, id))
            .unwrap()
            .unwrap();
        assert_eq!(user.email, "luis@example.com");
        assert!(user.is_active);
    }
}
