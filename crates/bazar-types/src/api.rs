use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Favorite, Order, OrderItem, Product, Role, User};

// -- JWT Claims --

/// Access token claims. A snapshot of the user taken at login; later profile
/// edits are not reflected until the user logs in again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// -- Envelope --

/// Standard success body: `{"results": ..., "message": ...}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub results: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn new(results: T) -> Self {
        Self {
            results,
            message: None,
        }
    }

    pub fn with_message(results: T, message: impl Into<String>) -> Self {
        Self {
            results,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageOnly {
    pub message: String,
}

impl MessageOnly {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// -- Auth --

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub results: User,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: Option<String>,
}

// -- Users --

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

// -- Products --

#[derive(Debug, Default, Deserialize)]
pub struct CreateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<String>,
    pub category: Option<String>,
    pub available: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<String>,
    pub category: Option<String>,
    pub available: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub tags: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductDeleted {
    pub results: Product,
    /// `false` when the product had been ordered and was only deactivated.
    pub deleted: bool,
    pub message: String,
}

// -- Favorites --

#[derive(Debug, Default, Deserialize)]
pub struct CreateFavoriteRequest {
    pub product_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FavoriteCreated {
    pub results: Favorite,
    pub already_exists: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FavoriteWithProduct {
    #[serde(flatten)]
    pub favorite: Favorite,
    pub product: Product,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FavoriteCheck {
    pub is_favorite: bool,
    pub favorite_id: Option<i64>,
}

// -- Messages --

#[derive(Debug, Default, Deserialize)]
pub struct SendMessageRequest {
    /// Browsers send whatever is in local storage, so numeric strings are accepted.
    #[serde(default, deserialize_with = "lenient_id")]
    pub user_sender: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub user_receiver: Option<i64>,
    pub content: Option<String>,
}

// -- Comments --

#[derive(Debug, Default, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub profile_user_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub product_id: Option<i64>,
    pub content: Option<String>,
}

// -- Orders --

#[derive(Debug, Default, Deserialize)]
pub struct OrderLine {
    #[serde(default, deserialize_with = "lenient_id")]
    pub product_id: Option<i64>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderCreated {
    pub results: OrderDetail,
    /// Product ids from the request that did not produce an item.
    pub skipped: Vec<i64>,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateOrderItemRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub order_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub product_id: Option<i64>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateOrderItemRequest {
    pub quantity: Option<i64>,
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(i64),
        Text(String),
    }

    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Repr::Num(n)) => Ok(Some(n)),
        Some(Repr::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_ids_accept_numeric_strings() {
        let req: SendMessageRequest = serde_json::from_str(
            r#"{"user_sender":"7","user_receiver":12,"content":"hola","created_at":"2025-01-01"}"#,
        )
        .unwrap();
        assert_eq!(req.user_sender, Some(7));
        assert_eq!(req.user_receiver, Some(12));
        assert_eq!(req.content.as_deref(), Some("hola"));
    }

    #[test]
    fn missing_ids_are_none() {
        let req: SendMessageRequest = serde_json::from_str(r#"{"content":"x"}"#).unwrap();
        assert_eq!(req.user_sender, None);
        assert_eq!(req.user_receiver, None);

        assert!(serde_json::from_str::<SendMessageRequest>(r#"{"user_receiver":"abc"}"#).is_err());
    }

    #[test]
    fn envelope_omits_empty_message() {
        let json = serde_json::to_value(Envelope::new(vec![1, 2])).unwrap();
        assert_eq!(json, serde_json::json!({ "results": [1, 2] }));

        let json = serde_json::to_value(Envelope::with_message(1, "ok")).unwrap();
        assert_eq!(json, serde_json::json!({ "results": 1, "message": "ok" }));
    }
}
