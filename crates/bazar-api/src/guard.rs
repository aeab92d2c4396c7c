//! Authorization predicates shared by every mutating handler.
//!
//! Check order is fixed: the caller's token was already verified by
//! [`crate::middleware::require_auth`], then a missing resource answers 404,
//! and only an existing resource can answer 403.

use bazar_types::api::Claims;
use bazar_types::models::{Comment, Favorite, Order, Product, Role, User};

use crate::error::ApiError;

const NOT_ALLOWED: &str = "No tienes permiso para modificar este recurso";

/// A resource with a single owning user.
pub trait Owned {
    fn owner_id(&self) -> i64;
}

impl Owned for User {
    fn owner_id(&self) -> i64 {
        self.id
    }
}

impl Owned for Product {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

impl Owned for Order {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

impl Owned for Favorite {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

/// The author owns a comment.
impl Owned for Comment {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

/// Owners and admins may change or remove a resource.
pub fn can_mutate<R: Owned + ?Sized>(actor: &Claims, resource: &R) -> bool {
    actor.role == Role::Admin || actor.user_id == resource.owner_id()
}

/// Resolve a looked-up resource: 404 when absent, 403 when the actor may not
/// touch it.
pub fn authorize<R: Owned>(actor: &Claims, resource: Option<R>, missing: &str) -> Result<R, ApiError> {
    let resource = resource.ok_or_else(|| ApiError::not_found(missing))?;
    if !can_mutate(actor, &resource) {
        return Err(ApiError::forbidden(NOT_ALLOWED));
    }
    Ok(resource)
}

pub fn require_role(actor: &Claims, role: Role, msg: &str) -> Result<(), ApiError> {
    if actor.role != role {
        return Err(ApiError::forbidden(msg));
    }
    Ok(())
}

pub fn require_admin(actor: &Claims, msg: &str) -> Result<(), ApiError> {
    require_role(actor, Role::Admin, msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(user_id: i64, role: Role) -> Claims {
        Claims {
            user_id,
            role,
            first_name: "T".into(),
            last_name: "U".into(),
            email: "t@example.com".into(),
            exp: usize::MAX,
        }
    }

    #[derive(Debug)]
    struct Thing(i64);

    impl Owned for Thing {
        fn owner_id(&self) -> i64 {
            self.0
        }
    }

    #[test]
    fn owner_or_admin_may_mutate() {
        assert!(can_mutate(&claims(1, Role::Seller), &Thing(1)));
        assert!(can_mutate(&claims(2, Role::Admin), &Thing(1)));
        assert!(!can_mutate(&claims(2, Role::Buyer), &Thing(1)));
        assert!(!can_mutate(&claims(2, Role::Seller), &Thing(1)));
    }

    #[test]
    fn missing_resource_wins_over_forbidden() {
        let stranger = claims(2, Role::Buyer);
        let err = authorize::<Thing>(&stranger, None, "no existe").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = authorize(&stranger, Some(Thing(1)), "no existe").unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        assert!(authorize(&claims(1, Role::Buyer), Some(Thing(1)), "no existe").is_ok());
    }

    #[test]
    fn role_gate() {
        assert!(require_role(&claims(1, Role::Seller), Role::Seller, "x").is_ok());
        assert!(matches!(
            require_role(&claims(1, Role::Buyer), Role::Seller, "x"),
            Err(ApiError::Forbidden(_))
        ));
        assert!(require_admin(&claims(1, Role::Admin), "x").is_ok());
    }
}
