use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;

use bazar_db::models::UserChanges;
use bazar_db::queries::users;
use bazar_types::api::{Claims, Envelope, MessageOnly, RegisterRequest, UpdateUserRequest};
use bazar_types::models::User;

use crate::auth::{NewAccount, create_account, hash_password};
use crate::error::{ApiError, JsonBody, PathParam};
use crate::guard;
use crate::state::{AppState, blocking};
use crate::validate;

const NOT_FOUND: &str = "Usuario no encontrado";

/// Validated profile changes. The password is still clear text here.
struct ProfileEdit {
    changes: UserChanges,
    password: Option<String>,
}

fn parse_edit(actor: &Claims, req: UpdateUserRequest) -> Result<ProfileEdit, ApiError> {
    if (req.role.is_some() || req.is_active.is_some()) && !actor.is_admin() {
        return Err(ApiError::forbidden(
            "Solo un administrador puede cambiar el rol o el estado de una cuenta",
        ));
    }

    let first_name = validate::optional(req.first_name, "El nombre no puede estar vacío")?;
    let last_name = validate::optional(req.last_name, "El apellido no puede estar vacío")?;
    let email = validate::optional(req.email, "El correo no puede estar vacío")?
        .map(|e| validate::email(&e))
        .transpose()?;
    let role = req
        .role
        .map(|r| validate::parse_enum(&r, "Rol no válido"))
        .transpose()?;
    let password = req.password.filter(|p| !p.is_empty());
    if let Some(password) = &password {
        validate::password(password)?;
    }

    Ok(ProfileEdit {
        changes: UserChanges {
            first_name,
            last_name,
            email,
            password_hash: None,
            role,
            is_active: req.is_active,
        },
        password,
    })
}

/// GET /users: active accounts only.
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let listed = blocking(&state, |db| Ok(db.with_conn(users::list_active)?)).await?;
    Ok(Json(Envelope::new(listed)))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    WithRejection(Path(id), _): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(&state, move |db| {
        db.with_conn(|conn| users::find_active(conn, id))?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))
    })
    .await?;

    Ok(Json(Envelope::new(user)))
}

/// POST /users: admins create accounts of any role, admins included.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    guard::require_admin(&claims, "Solo un administrador puede crear usuarios")?;
    let account = NewAccount::parse(req)?;

    let user = blocking(&state, move |db| create_account(db, account)).await?;
    info!("Admin {} created user {} as {}", claims.user_id, user.id, user.role);

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(user, "Usuario creado")),
    ))
}

/// PUT /users/{id}: the user themself or an admin.
pub async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): PathParam<i64>,
    WithRejection(Json(req), _): JsonBody<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ProfileEdit {
        mut changes,
        password,
    } = parse_edit(&claims, req)?;

    let user: User = blocking(&state, move |db| {
        changes.password_hash = password.as_deref().map(hash_password).transpose()?;

        db.transaction(|tx| {
            let current = users::find_by_id(tx, id)?.map(|row| row.into_user());
            guard::authorize(&claims, current, NOT_FOUND)?;

            users::update(tx, id, &changes)?;
            users::find_by_id(tx, id)?
                .map(|row| row.into_user())
                .ok_or_else(|| ApiError::not_found(NOT_FOUND))
        })
    })
    .await?;

    Ok(Json(Envelope::with_message(user, "Usuario actualizado")))
}

/// DELETE /users/{id}: deactivates the account; its data stays in place.
pub async fn delete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = claims.user_id;
    blocking(&state, move |db| {
        db.transaction(|tx| {
            guard::authorize(&claims, users::find_active(tx, id)?, NOT_FOUND)?;
            users::deactivate(tx, id)?;
            Ok(())
        })
    })
    .await?;

    info!("User {} deactivated by {}", id, actor);
    Ok(Json(MessageOnly::new("Usuario desactivado")))
}
