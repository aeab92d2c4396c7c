use anyhow::Result;
use bazar_types::models::Comment;
use chrono::Utc;
use rusqlite::{Connection, Row, params};

use super::OptionalExt;
use crate::models::CommentTarget;

// JOIN users to fetch the author's name in a single query
const SELECT_COMMENTS: &str = "SELECT c.id, c.user_id, u.first_name, u.last_name,
        c.profile_user_id, c.product_id, c.content, c.created_at
     FROM comments c
     LEFT JOIN users u ON u.id = c.user_id";

fn map_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    let first: Option<String> = row.get(2)?;
    let last: Option<String> = row.get(3)?;
    let author_name = match (first, last) {
        (Some(first), Some(last)) => format!("{} {}", first, last),
        _ => "unknown".to_string(),
    };

    Ok(Comment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        author_name,
        profile_user_id: row.get(4)?,
        product_id: row.get(5)?,
        content: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub fn insert(conn: &Connection, author: i64, target: &CommentTarget, content: &str) -> Result<i64> {
    let (profile_user_id, product_id) = match *target {
        CommentTarget::Profile(id) => (Some(id), None),
        CommentTarget::Product(id) => (None, Some(id)),
    };
    conn.execute(
        "INSERT INTO comments (user_id, profile_user_id, product_id, content, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![author, profile_user_id, product_id, content, Utc::now()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Comment>> {
    let sql = format!("{SELECT_COMMENTS} WHERE c.id = ?1");
    conn.query_row(&sql, [id], map_row).optional()
}

pub fn list_all(conn: &Connection) -> Result<Vec<Comment>> {
    query_list(conn, &format!("{SELECT_COMMENTS} ORDER BY c.id DESC"), None)
}

pub fn list_for_profile(conn: &Connection, profile_user_id: i64) -> Result<Vec<Comment>> {
    let sql = format!("{SELECT_COMMENTS} WHERE c.profile_user_id = ?1 ORDER BY c.id DESC");
    query_list(conn, &sql, Some(profile_user_id))
}

pub fn list_for_product(conn: &Connection, product_id: i64) -> Result<Vec<Comment>> {
    let sql = format!("{SELECT_COMMENTS} WHERE c.product_id = ?1 ORDER BY c.id DESC");
    query_list(conn, &sql, Some(product_id))
}

fn query_list(conn: &Connection, sql: &str, key: Option<i64>) -> Result<Vec<Comment>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = match key {
        Some(key) => stmt.query_map([key], map_row)?.collect::<std::result::Result<Vec<_>, _>>()?,
        None => stmt.query_map([], map_row)?.collect::<std::result::Result<Vec<_>, _>>()?,
    };
    Ok(rows)
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::queries::fixtures;
    use bazar_types::models::Role;

    #[test]
    fn profile_and_product_comments_are_listed_separately() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let seller = fixtures::user(conn, "s@example.com", Role::Seller);
            let buyer = fixtures::user(conn, "b@example.com", Role::Buyer);
            let bike = fixtures::product(conn, seller, "Bici", 100.0);

            let on_profile = insert(conn, buyer, &CommentTarget::Profile(seller), "Muy amable")?;
            let on_product = insert(conn, buyer, &CommentTarget::Product(bike), "¿Talla?")?;

            let profile: Vec<i64> = list_for_profile(conn, seller)?.iter().map(|c| c.id).collect();
            assert_eq!(profile, vec![on_profile]);
            let product: Vec<i64> = list_for_product(conn, bike)?.iter().map(|c| c.id).collect();
            assert_eq!(product, vec![on_product]);
            assert_eq!(list_all(conn)?.len(), 2);

            let comment = find_by_id(conn, on_profile)?.unwrap();
            assert_eq!(comment.author_name, "Test User");
            assert_eq!(comment.profile_user_id, Some(seller));
            assert_eq!(comment.product_id, None);
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
    }
}
