use anyhow::Result;
use bazar_types::models::{Category, Product, Tag};
use chrono::Utc;
use rusqlite::{Connection, Row, params};

use super::{OptionalExt, enum_col, like_pattern};
use crate::models::{NewProduct, ProductChanges, ProductFilter};

const PRODUCT_COLUMNS: &str = "id, user_id, title, description, price, available, location, \
     image_url, tags, category, was_sold, created_at";

fn map_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    map_row_at(row, 0)
}

/// Map product columns starting at `base`, for joins that select other
/// columns first.
pub(crate) fn map_row_at(row: &Row<'_>, base: usize) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(base)?,
        user_id: row.get(base + 1)?,
        title: row.get(base + 2)?,
        description: row.get(base + 3)?,
        price: row.get(base + 4)?,
        available: row.get(base + 5)?,
        location: row.get(base + 6)?,
        image_url: row.get(base + 7)?,
        tags: enum_col::<Tag>(row, base + 8)?,
        category: enum_col::<Category>(row, base + 9)?,
        was_sold: row.get(base + 10)?,
        created_at: row.get(base + 11)?,
    })
}

pub fn insert(conn: &Connection, product: &NewProduct) -> Result<i64> {
    conn.execute(
        "INSERT INTO products
            (user_id, title, description, price, available, location, image_url,
             tags, category, was_sold, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10)",
        params![
            product.user_id,
            product.title,
            product.description,
            product.price,
            product.available,
            product.location,
            product.image_url,
            product.tags.as_str(),
            product.category.as_str(),
            Utc::now(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    conn.query_row(&sql, [id], map_row).optional()
}

/// Available products matching every filter that is set, newest first.
pub fn search(conn: &Connection, filter: &ProductFilter) -> Result<Vec<Product>> {
    let pattern = filter
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(like_pattern);

    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} FROM products
         WHERE available = 1
           AND (?1 IS NULL
                OR title LIKE ?1 ESCAPE '\\'
                OR description LIKE ?1 ESCAPE '\\'
                OR category LIKE ?1 ESCAPE '\\')
           AND (?2 IS NULL OR category = ?2)
           AND (?3 IS NULL OR tags = ?3)
         ORDER BY id DESC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            params![
                pattern,
                filter.category.map(Category::as_str),
                filter.tag.map(Tag::as_str),
            ],
            map_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_by_user(conn: &Connection, user_id: i64, only_available: bool) -> Result<Vec<Product>> {
    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} FROM products
         WHERE user_id = ?1 AND (?2 = 0 OR available = 1)
         ORDER BY id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![user_id, only_available], map_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Partial update; `None` fields keep their stored value.
pub fn update(conn: &Connection, id: i64, changes: &ProductChanges) -> Result<()> {
    conn.execute(
        "UPDATE products SET
            title       = COALESCE(?2, title),
            description = COALESCE(?3, description),
            price       = COALESCE(?4, price),
            location    = COALESCE(?5, location),
            image_url   = COALESCE(?6, image_url),
            tags        = COALESCE(?7, tags),
            category    = COALESCE(?8, category),
            available   = COALESCE(?9, available)
         WHERE id = ?1",
        params![
            id,
            changes.title,
            changes.description,
            changes.price,
            changes.location,
            changes.image_url,
            changes.tags.map(Tag::as_str),
            changes.category.map(Category::as_str),
            changes.available,
        ],
    )?;
    Ok(())
}

/// Number of order lines that reference the product, across all orders.
pub fn count_order_items(conn: &Connection, id: i64) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM order_items WHERE product_id = ?1",
        [id],
        |r| r.get(0),
    )?;
    Ok(count)
}

/// Retire a product that has been bought: it stays in the table for order
/// history but is no longer listed.
pub fn mark_sold(conn: &Connection, id: i64) -> Result<()> {
    conn.execute(
        "UPDATE products SET available = 0, was_sold = 1 WHERE id = ?1",
        [id],
    )?;
    Ok(())
}

/// Retire every product referenced by an order. Returns the number of rows touched.
pub fn mark_sold_for_order(conn: &Connection, order_id: i64) -> Result<usize> {
    let n = conn.execute(
        "UPDATE products SET available = 0, was_sold = 1
         WHERE id IN (SELECT product_id FROM order_items WHERE order_id = ?1)",
        [order_id],
    )?;
    Ok(n)
}

/// Products in the order that can no longer be bought.
pub fn count_unsellable_in_order(conn: &Connection, order_id: i64) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM order_items i
         JOIN products p ON p.id = i.product_id
         WHERE i.order_id = ?1 AND (p.available = 0 OR p.was_sold = 1)",
        [order_id],
        |r| r.get(0),
    )?;
    Ok(count)
}

/// Hard delete. Favorites and comments on the product go with it.
pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM products WHERE id = ?1", [id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::queries::fixtures;
    use bazar_types::models::Role;

    #[test]
    fn search_matches_text_and_filters() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let seller = fixtures::user(conn, "s@example.com", Role::Seller);
            let bike = fixtures::product(conn, seller, "Bicicleta de montaña", 100.0);
            let lamp = fixtures::product(conn, seller, "Lámpara", 20.0);
            update(
                conn,
                lamp,
                &ProductChanges {
                    category: Some(Category::Fashion),
                    tags: Some(Tag::New),
                    ..Default::default()
                },
            )?;

            let hits = search(
                conn,
                &ProductFilter {
                    q: Some("MONTA".into()),
                    ..Default::default()
                },
            )?;
            assert_eq!(hits.iter().map(|p| p.id).collect::<Vec<_>>(), vec![bike]);

            let hits = search(
                conn,
                &ProductFilter {
                    category: Some(Category::Bicycles),
                    ..Default::default()
                },
            )?;
            assert_eq!(hits.iter().map(|p| p.id).collect::<Vec<_>>(), vec![bike]);

            let hits = search(
                conn,
                &ProductFilter {
                    tag: Some(Tag::New),
                    ..Default::default()
                },
            )?;
            assert_eq!(hits.iter().map(|p| p.id).collect::<Vec<_>>(), vec![lamp]);

            let all = search(conn, &ProductFilter::default())?;
            assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![lamp, bike]);
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
    }

    #[test]
    fn sold_products_drop_out_of_listings() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let seller = fixtures::user(conn, "s@example.com", Role::Seller);
            let id = fixtures::product(conn, seller, "Bici", 100.0);
            mark_sold(conn, id)?;

            let product = find_by_id(conn, id)?.unwrap();
            assert!(!product.available);
            assert!(product.was_sold);

            assert!(search(conn, &ProductFilter::default())?.is_empty());
            assert!(list_by_user(conn, seller, true)?.is_empty());
            assert_eq!(list_by_user(conn, seller, false)?.len(), 1);
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
    }

    #[test]
    fn orders_with_retired_products_are_unsellable() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let seller = fixtures::user(conn, "s@example.com", Role::Seller);
            let buyer = fixtures::user(conn, "b@example.com", Role::Buyer);
            let bike = fixtures::product(conn, seller, "Bici", 100.0);

            let first = crate::queries::orders::insert(conn, buyer)?;
            let second = crate::queries::orders::insert(conn, buyer)?;
            crate::queries::orders::insert_item(conn, first, bike, 1, 100.0)?;
            crate::queries::orders::insert_item(conn, second, bike, 1, 100.0)?;
            assert_eq!(count_unsellable_in_order(conn, second)?, 0);

            mark_sold_for_order(conn, first)?;
            assert_eq!(count_unsellable_in_order(conn, second)?, 1);
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
    }

    #[test]
    fn wildcards_in_query_are_literal() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let seller = fixtures::user(conn, "s@example.com", Role::Seller);
            fixtures::product(conn, seller, "Bici", 100.0);

            let hits = search(
                conn,
                &ProductFilter {
                    q: Some("%".into()),
                    ..Default::default()
                },
            )?;
            assert!(hits.is_empty());
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
    }
}
