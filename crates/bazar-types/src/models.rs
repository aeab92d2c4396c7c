use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Returned when a stored or submitted value is not part of one of the
/// closed vocabularies below.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// -- Roles --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "vendedor")]
    Seller,
    #[serde(alias = "comprador")]
    Buyer,
    #[serde(alias = "administrador")]
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seller => "seller",
            Self::Buyer => "buyer",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seller" | "vendedor" => Ok(Self::Seller),
            "buyer" | "comprador" => Ok(Self::Buyer),
            "admin" | "administrador" => Ok(Self::Admin),
            other => Err(ParseEnumError::new("role", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -- Product vocabularies --

/// Condition of a listed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    New,
    Used,
    Acceptable,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Used => "used",
            Self::Acceptable => "acceptable",
        }
    }
}

impl FromStr for Tag {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "used" => Ok(Self::Used),
            "acceptable" => Ok(Self::Acceptable),
            other => Err(ParseEnumError::new("tag", other)),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed catalog categories. The wire names are the labels shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Coches")]
    Cars,
    #[serde(rename = "Motos")]
    Motorbikes,
    #[serde(rename = "Motor y Accesorios")]
    MotorAccessories,
    #[serde(rename = "Moda y Accesorios")]
    Fashion,
    #[serde(rename = "Tecnología y Electrónica")]
    Electronics,
    #[serde(rename = "Móviles y Tecnología")]
    Phones,
    #[serde(rename = "Informática")]
    Computing,
    #[serde(rename = "Deporte y Ocio")]
    Sports,
    #[serde(rename = "Bicicletas")]
    Bicycles,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Self::Cars,
        Self::Motorbikes,
        Self::MotorAccessories,
        Self::Fashion,
        Self::Electronics,
        Self::Phones,
        Self::Computing,
        Self::Sports,
        Self::Bicycles,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cars => "Coches",
            Self::Motorbikes => "Motos",
            Self::MotorAccessories => "Motor y Accesorios",
            Self::Fashion => "Moda y Accesorios",
            Self::Electronics => "Tecnología y Electrónica",
            Self::Phones => "Móviles y Tecnología",
            Self::Computing => "Informática",
            Self::Sports => "Deporte y Ocio",
            Self::Bicycles => "Bicicletas",
        }
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("category", s))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -- Orders --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Close,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Close => "close",
            Self::Canceled => "canceled",
        }
    }

    /// Legal lifecycle moves: pending -> paid | canceled, paid -> close | canceled.
    /// Re-applying the current status is always allowed.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        self == next
            || matches!(
                (self, next),
                (Pending, Paid) | (Pending, Canceled) | (Paid, Close) | (Paid, Canceled)
            )
    }

    /// Items can only be added, changed or removed while the order is open.
    pub fn is_editable(self) -> bool {
        self == Self::Pending
    }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "close" => Ok(Self::Close),
            "canceled" => Ok(Self::Canceled),
            other => Err(ParseEnumError::new("order status", other)),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -- Entities --

/// Public view of a user. The password hash never leaves the store layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub available: bool,
    pub location: String,
    pub image_url: Option<String>,
    pub tags: Tag,
    pub category: Category,
    pub was_sold: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub total: f64,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub user_sender: i64,
    pub user_receiver: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Set the first time the receiver reads the message.
    pub review_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub user_id: i64,
    pub author_name: String,
    pub profile_user_id: Option<i64>,
    pub product_id: Option<i64>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
