use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;

use bazar_db::queries::{messages, users};
use bazar_types::api::{Claims, Envelope, MessageOnly, SendMessageRequest};

use crate::error::{ApiError, JsonBody, PathParam};
use crate::state::{AppState, blocking};
use crate::validate;

const NOT_FOUND: &str = "Mensaje no encontrado";

/// GET /messages: everything the caller sent or received. Clients poll this.
pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = (!claims.is_admin()).then_some(claims.user_id);
    let listed = blocking(&state, move |db| {
        Ok(db.with_conn(|conn| messages::list_for_user(conn, scope))?)
    })
    .await?;

    Ok(Json(Envelope::new(listed)))
}

/// POST /messages: the sender is always the token's user.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): JsonBody<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.user_sender.is_some_and(|sender| sender != claims.user_id) {
        return Err(ApiError::forbidden("No puedes enviar mensajes en nombre de otro usuario"));
    }
    let content = validate::required(req.content, "El contenido del mensaje no puede estar vacío")?;
    let receiver = req
        .user_receiver
        .ok_or_else(|| ApiError::validation("El destinatario es obligatorio"))?;
    if receiver == claims.user_id {
        return Err(ApiError::validation("No puedes enviarte mensajes a ti mismo"));
    }

    let sender = claims.user_id;
    let message = blocking(&state, move |db| {
        db.transaction(|tx| {
            if users::find_active(tx, receiver)?.is_none() {
                return Err(ApiError::not_found("Destinatario no encontrado"));
            }
            let id = messages::insert(tx, sender, receiver, &content)?;
            messages::find_by_id(tx, id)?.ok_or_else(|| ApiError::not_found(NOT_FOUND))
        })
    })
    .await?;

    info!("Message {} sent from {} to {}", message.id, sender, receiver);

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(message, "Mensaje enviado")),
    ))
}

/// PUT /messages/{id}/read: only the receiver can mark a message as read.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let message = blocking(&state, move |db| {
        db.transaction(|tx| {
            let message = messages::find_by_id(tx, id)?.ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
            if message.user_receiver != claims.user_id {
                return Err(ApiError::forbidden("Solo el destinatario puede marcar el mensaje como leído"));
            }
            messages::mark_read(tx, id)?;
            messages::find_by_id(tx, id)?.ok_or_else(|| ApiError::not_found(NOT_FOUND))
        })
    })
    .await?;

    Ok(Json(Envelope::new(message)))
}

/// DELETE /messages/{id}: sender, receiver or admin.
pub async fn delete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |db| {
        db.transaction(|tx| {
            let message = messages::find_by_id(tx, id)?.ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
            let involved = claims.user_id == message.user_sender || claims.user_id == message.user_receiver;
            if !involved && !claims.is_admin() {
                return Err(ApiError::forbidden("No tienes permiso para eliminar este mensaje"));
            }
            messages::delete(tx, id)?;
            Ok(())
        })
    })
    .await?;

    Ok(Json(MessageOnly::new("Mensaje eliminado")))
}
