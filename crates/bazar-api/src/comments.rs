use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use bazar_db::models::CommentTarget;
use bazar_db::queries::{comments, products, users};
use bazar_types::api::{Claims, CreateCommentRequest, Envelope, MessageOnly};

use crate::error::{ApiError, JsonBody, PathParam};
use crate::guard;
use crate::state::{AppState, blocking};
use crate::validate;

const NOT_FOUND: &str = "Comentario no encontrado";
const MAX_CONTENT: usize = 1000;

fn parse_target(req: &CreateCommentRequest) -> Result<CommentTarget, ApiError> {
    match (req.profile_user_id, req.product_id) {
        (Some(user_id), None) => Ok(CommentTarget::Profile(user_id)),
        (None, Some(product_id)) => Ok(CommentTarget::Product(product_id)),
        _ => Err(ApiError::validation(
            "Indica un perfil o un producto, pero no ambos",
        )),
    }
}

/// GET /comments
pub async fn list_all(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let listed = blocking(&state, |db| Ok(db.with_conn(comments::list_all)?)).await?;
    Ok(Json(Envelope::new(listed)))
}

/// GET /comments/profile/{id}
pub async fn list_profile(
    State(state): State<AppState>,
    WithRejection(Path(user_id), _): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let listed = blocking(&state, move |db| {
        db.with_conn(|conn| {
            if users::find_active(conn, user_id)?.is_none() {
                return Err(ApiError::not_found("Usuario no encontrado"));
            }
            Ok(comments::list_for_profile(conn, user_id)?)
        })
    })
    .await?;

    Ok(Json(Envelope::new(listed)))
}

/// GET /comments/product/{id}
pub async fn list_product(
    State(state): State<AppState>,
    WithRejection(Path(product_id), _): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let listed = blocking(&state, move |db| {
        db.with_conn(|conn| {
            if products::find_by_id(conn, product_id)?.is_none() {
                return Err(ApiError::not_found("Producto no encontrado"));
            }
            Ok(comments::list_for_product(conn, product_id)?)
        })
    })
    .await?;

    Ok(Json(Envelope::new(listed)))
}

/// POST /comments: on a user profile or on a product, never both.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): JsonBody<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target = parse_target(&req)?;
    let content = validate::required(req.content, "El comentario no puede estar vacío")?;
    validate::max_len(&content, MAX_CONTENT, "comentario")?;

    if let CommentTarget::Profile(user_id) = target {
        if user_id == claims.user_id {
            return Err(ApiError::forbidden("No puedes comentar tu propio perfil"));
        }
    }

    let author = claims.user_id;
    let comment = blocking(&state, move |db| {
        db.transaction(|tx| {
            match target {
                CommentTarget::Profile(user_id) => {
                    if users::find_active(tx, user_id)?.is_none() {
                        return Err(ApiError::not_found("Usuario no encontrado"));
                    }
                }
                CommentTarget::Product(product_id) => {
                    if products::find_by_id(tx, product_id)?.is_none() {
                        return Err(ApiError::not_found("Producto no encontrado"));
                    }
                }
            }

            let id = comments::insert(tx, author, &target, &content)?;
            comments::find_by_id(tx, id)?.ok_or_else(|| ApiError::not_found(NOT_FOUND))
        })
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(comment, "Comentario publicado")),
    ))
}

/// DELETE /comments/{id}: the author, the commented profile's owner or an admin.
pub async fn delete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |db| {
        db.transaction(|tx| {
            let comment = comments::find_by_id(tx, id)?.ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
            let profile_owner = comment.profile_user_id == Some(claims.user_id);
            if !guard::can_mutate(&claims, &comment) && !profile_owner {
                return Err(ApiError::forbidden("No tienes permiso para eliminar este comentario"));
            }
            comments::delete(tx, id)?;
            Ok(())
        })
    })
    .await?;

    Ok(Json(MessageOnly::new("Comentario eliminado")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_target() {
        let profile = CreateCommentRequest {
            profile_user_id: Some(3),
            ..Default::default()
        };
        assert!(matches!(parse_target(&profile), Ok(CommentTarget::Profile(3))));

        let product = CreateCommentRequest {
            product_id: Some(8),
            ..Default::default()
        };
        assert!(matches!(parse_target(&product), Ok(CommentTarget::Product(8))));

        let both = CreateCommentRequest {
            profile_user_id: Some(3),
            product_id: Some(8),
            ..Default::default()
        };
        assert!(parse_target(&both).is_err());
        assert!(parse_target(&CreateCommentRequest::default()).is_err());
    }
}
