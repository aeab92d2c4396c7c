//! Store-side row and input types. Entities that are safe to expose are
//! returned directly as `bazar_types::models` values; only the user row carries
//! data (the password hash) that must not leave this layer.

use bazar_types::models::{Category, Role, Tag, User};
use chrono::{DateTime, Utc};

pub struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            role: self.role,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
}

#[derive(Debug, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub location: String,
    pub image_url: Option<String>,
    pub tags: Tag,
    pub category: Category,
    pub available: bool,
}

#[derive(Debug, Default)]
pub struct ProductChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<Tag>,
    pub category: Option<Category>,
    pub available: Option<bool>,
}

#[derive(Debug, Default)]
pub struct ProductFilter {
    /// Free text matched against title, description and category.
    pub q: Option<String>,
    pub category: Option<Category>,
    pub tag: Option<Tag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTarget {
    Profile(i64),
    Product(i64),
}
