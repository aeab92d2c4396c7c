use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{auth, comments, favorites, messages, order_items, orders, password, products, users};

/// The full API surface. Public reads and auth endpoints need no token; every
/// other route goes through [`require_auth`].
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/password/forgot", post(password::forgot))
        .route("/password/reset/{token}", post(password::reset))
        .route("/users", get(users::list))
        .route("/users/{id}", get(users::get_user))
        .route("/products", get(products::search))
        .route("/products/{id}", get(products::get_product))
        .route("/products/user/{id}", get(products::list_by_user))
        .route("/comments", get(comments::list_all))
        .route("/comments/profile/{id}", get(comments::list_profile))
        .route("/comments/product/{id}", get(comments::list_product));

    let protected = Router::new()
        .route("/protected", get(auth::protected))
        // Users
        .route("/users", post(users::create))
        .route("/users/{id}", put(users::update).delete(users::delete))
        // Products
        .route("/products", post(products::create))
        .route("/products/user", get(products::list_mine))
        .route("/products/{id}", put(products::update).delete(products::delete))
        // Favorites
        .route("/favorites", get(favorites::list).post(favorites::create))
        .route("/favorites/{id}", delete(favorites::delete))
        .route("/favorites/check/{product_id}", get(favorites::check))
        // Messages
        .route("/messages", get(messages::list).post(messages::send_message))
        .route("/messages/{id}", delete(messages::delete))
        .route("/messages/{id}/read", put(messages::mark_read))
        // Comments
        .route("/comments", post(comments::create))
        .route("/comments/{id}", delete(comments::delete))
        // Orders
        .route("/orders", get(orders::list).post(orders::create))
        .route(
            "/orders/{id}",
            get(orders::get_order).put(orders::update).delete(orders::delete),
        )
        .route("/order-items", get(order_items::list).post(order_items::create))
        .route(
            "/order-items/{id}",
            get(order_items::get_item)
                .put(order_items::update)
                .delete(order_items::delete),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public.merge(protected).with_state(state)
}
