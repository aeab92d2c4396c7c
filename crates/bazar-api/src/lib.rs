//! HTTP layer of the marketplace: authentication, authorization guards and the
//! catalog, order and social handlers. Store work runs on the blocking pool
//! through [`state::blocking`].

pub mod auth;
pub mod comments;
pub mod error;
pub mod favorites;
pub mod guard;
pub mod mailer;
pub mod messages;
pub mod middleware;
pub mod order_items;
pub mod orders;
pub mod password;
pub mod products;
pub mod routes;
pub mod state;
pub mod users;
mod validate;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner, Settings};
