use anyhow::Result;
use bazar_types::models::{Order, OrderItem, OrderStatus};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};

use super::{OptionalExt, enum_col, round_cents};

const ORDER_COLUMNS: &str = "id, user_id, status, total, created_at, paid_at";
const ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, unit_price, total";

fn map_order(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        user_id: row.get(1)?,
        status: enum_col::<OrderStatus>(row, 2)?,
        total: row.get(3)?,
        created_at: row.get(4)?,
        paid_at: row.get(5)?,
    })
}

fn map_item(row: &Row<'_>) -> rusqlite::Result<OrderItem> {
    Ok(OrderItem {
        id: row.get(0)?,
        order_id: row.get(1)?,
        product_id: row.get(2)?,
        quantity: row.get(3)?,
        unit_price: row.get(4)?,
        total: row.get(5)?,
    })
}

// -- Orders --

/// New orders always start out pending with an empty total.
pub fn insert(conn: &Connection, user_id: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO orders (user_id, status, total, created_at) VALUES (?1, ?2, 0, ?3)",
        params![user_id, OrderStatus::Pending.as_str(), Utc::now()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
    conn.query_row(&sql, [id], map_order).optional()
}

/// Orders of one user, or of everybody when `user_id` is `None`. Newest first.
pub fn list(conn: &Connection, user_id: Option<i64>) -> Result<Vec<Order>> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE (?1 IS NULL OR user_id = ?1) ORDER BY id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user_id], map_order)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn set_status(
    conn: &Connection,
    id: i64,
    status: OrderStatus,
    paid_at: Option<DateTime<Utc>>,
) -> Result<()> {
    conn.execute(
        "UPDATE orders SET status = ?2, paid_at = COALESCE(?3, paid_at) WHERE id = ?1",
        params![id, status.as_str(), paid_at],
    )?;
    Ok(())
}

/// Removes the order and, through the cascade, its items.
pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM orders WHERE id = ?1", [id])?;
    Ok(())
}

/// Re-derive the order total from its items and store it.
pub fn recompute_total(conn: &Connection, order_id: i64) -> Result<f64> {
    let sum: f64 = conn.query_row(
        "SELECT COALESCE(SUM(total), 0) FROM order_items WHERE order_id = ?1",
        [order_id],
        |r| r.get(0),
    )?;
    let total = round_cents(sum);
    conn.execute(
        "UPDATE orders SET total = ?2 WHERE id = ?1",
        params![order_id, total],
    )?;
    Ok(total)
}

// -- Order items --

pub fn insert_item(
    conn: &Connection,
    order_id: i64,
    product_id: i64,
    quantity: i64,
    unit_price: f64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO order_items (order_id, product_id, quantity, unit_price, total)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            order_id,
            product_id,
            quantity,
            unit_price,
            round_cents(unit_price * quantity as f64),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_item(conn: &Connection, id: i64) -> Result<Option<OrderItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE id = ?1");
    conn.query_row(&sql, [id], map_item).optional()
}

pub fn list_items(conn: &Connection, order_id: i64) -> Result<Vec<OrderItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([order_id], map_item)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Items across all orders owned by `user_id`, or every item when `None`.
pub fn list_items_for_user(conn: &Connection, user_id: Option<i64>) -> Result<Vec<OrderItem>> {
    let mut stmt = conn.prepare(
        "SELECT i.id, i.order_id, i.product_id, i.quantity, i.unit_price, i.total
         FROM order_items i
         JOIN orders o ON o.id = i.order_id
         WHERE (?1 IS NULL OR o.user_id = ?1)
         ORDER BY i.id",
    )?;
    let rows = stmt
        .query_map([user_id], map_item)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Change the quantity, repricing the line at its captured unit price.
pub fn update_item_quantity(conn: &Connection, id: i64, quantity: i64) -> Result<()> {
    conn.execute(
        "UPDATE order_items SET quantity = ?2, total = ROUND(unit_price * ?2, 2) WHERE id = ?1",
        params![id, quantity],
    )?;
    Ok(())
}

pub fn delete_item(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM order_items WHERE id = ?1", [id])?;
    Ok(())
}
