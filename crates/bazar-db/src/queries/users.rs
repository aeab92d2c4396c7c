use anyhow::Result;
use bazar_types::models::{Role, User};
use chrono::Utc;
use rusqlite::{Connection, Row, params};

use super::{OptionalExt, enum_col};
use crate::models::{NewUser, UserChanges, UserRow};

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, password, role, is_active, created_at";

fn map_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        password: row.get(4)?,
        role: enum_col::<Role>(row, 5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub fn insert(conn: &Connection, user: &NewUser<'_>) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (first_name, last_name, email, password, role, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
        params![
            user.first_name,
            user.last_name,
            user.email,
            user.password_hash,
            user.role.as_str(),
            Utc::now(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    conn.query_row(&sql, [id], map_row).optional()
}

pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
    conn.query_row(&sql, [email], map_row).optional()
}

/// Active user by id, as exposed on public reads.
pub fn find_active(conn: &Connection, id: i64) -> Result<Option<User>> {
    Ok(find_by_id(conn, id)?
        .filter(|u| u.is_active)
        .map(UserRow::into_user))
}

pub fn list_active(conn: &Connection) -> Result<Vec<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE is_active = 1 ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], map_row)?
        .map(|r| r.map(UserRow::into_user))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Partial update; `None` fields keep their stored value.
pub fn update(conn: &Connection, id: i64, changes: &UserChanges) -> Result<()> {
    conn.execute(
        "UPDATE users SET
            first_name = COALESCE(?2, first_name),
            last_name  = COALESCE(?3, last_name),
            email      = COALESCE(?4, email),
            password   = COALESCE(?5, password),
            role       = COALESCE(?6, role),
            is_active  = COALESCE(?7, is_active)
         WHERE id = ?1",
        params![
            id,
            changes.first_name,
            changes.last_name,
            changes.email,
            changes.password_hash,
            changes.role.map(Role::as_str),
            changes.is_active,
        ],
    )?;
    Ok(())
}

pub fn set_password(conn: &Connection, id: i64, password_hash: &str) -> Result<()> {
    conn.execute(
        "UPDATE users SET password = ?2 WHERE id = ?1",
        params![id, password_hash],
    )?;
    Ok(())
}

/// Soft delete. Users are never removed because products, orders and
/// messages keep referencing them.
pub fn deactivate(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("UPDATE users SET is_active = 0 WHERE id = ?1", [id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::queries::fixtures;

    #[test]
    fn partial_update_keeps_untouched_fields() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let id = fixtures::user(conn, "eva@example.com", Role::Seller);
            update(
                conn,
                id,
                &UserChanges {
                    first_name: Some("Eva".into()),
                    ..Default::default()
                },
            )?;

            let row = find_by_id(conn, id)?.unwrap();
            assert_eq!(row.first_name, "Eva");
            assert_eq!(row.last_name, "User");
            assert_eq!(row.email, "eva@example.com");
            assert_eq!(row.role, Role::Seller);
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
    }

    #[test]
    fn deactivated_users_are_hidden_from_public_reads() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let keep = fixtures::user(conn, "a@example.com", Role::Buyer);
            let gone = fixtures::user(conn, "b@example.com", Role::Buyer);
            deactivate(conn, gone)?;

            let ids: Vec<i64> = list_active(conn)?.into_iter().map(|u| u.id).collect();
            assert_eq!(ids, vec![keep]);
            assert!(find_active(conn, gone)?.is_none());
            assert!(find_by_id(conn, gone)?.is_some());
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
    }

    #[test]
    fn duplicate_email_violates_constraint() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            fixtures::user(conn, "dup@example.com", Role::Buyer);
            let err = insert(
                conn,
                &NewUser {
                    first_name: "X",
                    last_name: "Y",
                    email: "dup@example.com",
                    password_hash: "h",
                    role: Role::Buyer,
                },
            )
            .unwrap_err();
            assert!(err.downcast_ref::<rusqlite::Error>().is_some());
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
    }
}
