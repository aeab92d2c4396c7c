use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use bazar_db::queries::{favorites, products};
use bazar_types::api::{
    Claims, CreateFavoriteRequest, Envelope, FavoriteCheck, FavoriteCreated, FavoriteWithProduct,
    MessageOnly,
};
use bazar_types::models::Role;

use crate::error::{ApiError, JsonBody, PathParam};
use crate::guard;
use crate::state::{AppState, blocking};

/// GET /favorites: the caller's favorites with their products.
pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let listed = blocking(&state, move |db| {
        Ok(db.with_conn(|conn| favorites::list_for_user(conn, claims.user_id))?)
    })
    .await?;

    let listed: Vec<FavoriteWithProduct> = listed
        .into_iter()
        .map(|(favorite, product)| FavoriteWithProduct { favorite, product })
        .collect();

    Ok(Json(Envelope::new(listed)))
}

/// POST /favorites: buyers only. Favoriting twice hands back the first record.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): JsonBody<CreateFavoriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    guard::require_role(&claims, Role::Buyer, "Solo los compradores pueden añadir favoritos")?;
    let product_id = req
        .product_id
        .ok_or_else(|| ApiError::validation("El producto es obligatorio"))?;

    let user_id = claims.user_id;
    let (favorite, already_exists) = blocking(&state, move |db| {
        db.transaction(|tx| {
            if products::find_by_id(tx, product_id)?.is_none() {
                return Err(ApiError::not_found("Producto no encontrado"));
            }

            if let Some(existing) = favorites::find_for_pair(tx, user_id, product_id)? {
                return Ok((existing, true));
            }

            let id = favorites::insert(tx, user_id, product_id)?;
            let created = favorites::find_by_id(tx, id)?
                .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("favorite {} missing after insert", id)))?;
            Ok((created, false))
        })
    })
    .await?;

    let (status, message) = if already_exists {
        (StatusCode::OK, "El producto ya estaba en favoritos")
    } else {
        (StatusCode::CREATED, "Producto añadido a favoritos")
    };

    Ok((
        status,
        Json(FavoriteCreated {
            results: favorite,
            already_exists,
            message: message.to_string(),
        }),
    ))
}

/// DELETE /favorites/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |db| {
        db.transaction(|tx| {
            guard::authorize(&claims, favorites::find_by_id(tx, id)?, "Favorito no encontrado")?;
            favorites::delete(tx, id)?;
            Ok(())
        })
    })
    .await?;

    Ok(Json(MessageOnly::new("Producto eliminado de favoritos")))
}

/// GET /favorites/check/{product_id}
pub async fn check(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(product_id), _): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = blocking(&state, move |db| {
        Ok(db.with_conn(|conn| favorites::find_for_pair(conn, claims.user_id, product_id))?)
    })
    .await?;

    Ok(Json(FavoriteCheck {
        is_favorite: existing.is_some(),
        favorite_id: existing.map(|f| f.id),
    }))
}
