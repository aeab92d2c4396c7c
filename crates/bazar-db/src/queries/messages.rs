use anyhow::Result;
use bazar_types::models::Message;
use chrono::Utc;
use rusqlite::{Connection, Row, params};

use super::OptionalExt;

const MESSAGE_COLUMNS: &str = "id, user_sender, user_receiver, content, created_at, review_date";

fn map_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        user_sender: row.get(1)?,
        user_receiver: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        review_date: row.get(5)?,
    })
}

pub fn insert(conn: &Connection, sender: i64, receiver: i64, content: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO messages (user_sender, user_receiver, content, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![sender, receiver, content, Utc::now()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Message>> {
    let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1");
    conn.query_row(&sql, [id], map_row).optional()
}

/// Messages a user sent or received, or every message when `None`. Newest first.
pub fn list_for_user(conn: &Connection, user_id: Option<i64>) -> Result<Vec<Message>> {
    let sql = format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages
         WHERE ?1 IS NULL OR user_sender = ?1 OR user_receiver = ?1
         ORDER BY id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user_id], map_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Stamp the read date. A message already read keeps its first date.
pub fn mark_read(conn: &Connection, id: i64) -> Result<()> {
    conn.execute(
        "UPDATE messages SET review_date = COALESCE(review_date, ?2) WHERE id = ?1",
        params![id, Utc::now()],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
    Ok(())
}
