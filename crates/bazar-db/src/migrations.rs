use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name  TEXT NOT NULL,
                last_name   TEXT NOT NULL,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                role        TEXT NOT NULL CHECK (role IN ('seller', 'buyer', 'admin')),
                is_active   INTEGER NOT NULL DEFAULT 1,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE products (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                title       TEXT NOT NULL,
                description TEXT NOT NULL,
                price       REAL NOT NULL CHECK (price > 0),
                available   INTEGER NOT NULL DEFAULT 1,
                location    TEXT NOT NULL,
                image_url   TEXT,
                tags        TEXT NOT NULL CHECK (tags IN ('new', 'used', 'acceptable')),
                category    TEXT NOT NULL,
                was_sold    INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_products_user ON products(user_id);

            CREATE TABLE orders (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                status      TEXT NOT NULL CHECK (status IN ('pending', 'paid', 'close', 'canceled')),
                total       REAL NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL,
                paid_at     TEXT
            );

            CREATE INDEX idx_orders_user ON orders(user_id);

            CREATE TABLE order_items (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id    INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
                product_id  INTEGER NOT NULL REFERENCES products(id),
                quantity    INTEGER NOT NULL CHECK (quantity > 0),
                unit_price  REAL NOT NULL,
                total       REAL NOT NULL
            );

            CREATE INDEX idx_order_items_order ON order_items(order_id);
            CREATE INDEX idx_order_items_product ON order_items(product_id);

            CREATE TABLE favorites (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                product_id  INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_favorites_user ON favorites(user_id, product_id);

            CREATE TABLE messages (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_sender     INTEGER NOT NULL REFERENCES users(id),
                user_receiver   INTEGER NOT NULL REFERENCES users(id),
                content         TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                review_date     TEXT
            );

            CREATE INDEX idx_messages_receiver ON messages(user_receiver);
            CREATE INDEX idx_messages_sender ON messages(user_sender);

            CREATE TABLE comments (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         INTEGER NOT NULL REFERENCES users(id),
                profile_user_id INTEGER REFERENCES users(id),
                product_id      INTEGER REFERENCES products(id) ON DELETE CASCADE,
                content         TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                CHECK ((profile_user_id IS NULL) <> (product_id IS NULL))
            );

            CREATE INDEX idx_comments_profile ON comments(profile_user_id);
            CREATE INDEX idx_comments_product ON comments(product_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
