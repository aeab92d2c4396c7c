use anyhow::Result;
use bazar_types::models::{Favorite, Product};
use chrono::Utc;
use rusqlite::{Connection, Row, params};

use super::{OptionalExt, products};

fn map_row(row: &Row<'_>) -> rusqlite::Result<Favorite> {
    Ok(Favorite {
        id: row.get(0)?,
        user_id: row.get(1)?,
        product_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub fn insert(conn: &Connection, user_id: i64, product_id: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO favorites (user_id, product_id, created_at) VALUES (?1, ?2, ?3)",
        params![user_id, product_id, Utc::now()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Favorite>> {
    conn.query_row(
        "SELECT id, user_id, product_id, created_at FROM favorites WHERE id = ?1",
        [id],
        map_row,
    )
    .optional()
}

/// The pair is unique by convention: callers check here before inserting,
/// inside the same transaction.
pub fn find_for_pair(conn: &Connection, user_id: i64, product_id: i64) -> Result<Option<Favorite>> {
    conn.query_row(
        "SELECT id, user_id, product_id, created_at FROM favorites
         WHERE user_id = ?1 AND product_id = ?2
         ORDER BY id LIMIT 1",
        params![user_id, product_id],
        map_row,
    )
    .optional()
}

/// A user's favorites joined with the favorited products, newest first.
pub fn list_for_user(conn: &Connection, user_id: i64) -> Result<Vec<(Favorite, Product)>> {
    let mut stmt = conn.prepare(
        "SELECT f.id, f.user_id, f.product_id, f.created_at,
                p.id, p.user_id, p.title, p.description, p.price, p.available, p.location,
                p.image_url, p.tags, p.category, p.was_sold, p.created_at
         FROM favorites f
         JOIN products p ON p.id = f.product_id
         WHERE f.user_id = ?1
         ORDER BY f.id DESC",
    )?;
    let rows = stmt
        .query_map([user_id], |row| Ok((map_row(row)?, products::map_row_at(row, 4)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM favorites WHERE id = ?1", [id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::queries::fixtures;
    use bazar_types::models::Role;

    #[test]
    fn favorites_follow_product_deletion() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let seller = fixtures::user(conn, "s@example.com", Role::Seller);
            let buyer = fixtures::user(conn, "b@example.com", Role::Buyer);
            let bike = fixtures::product(conn, seller, "Bici", 100.0);

            let fav = insert(conn, buyer, bike)?;
            assert_eq!(find_for_pair(conn, buyer, bike)?.unwrap().id, fav);

            let listed = list_for_user(conn, buyer)?;
            assert_eq!(listed.len(), 1);
            assert_eq!(listed[0].1.title, "Bici");

            products::delete(conn, bike)?;
            assert!(find_by_id(conn, fav)?.is_none());
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
    }
}
