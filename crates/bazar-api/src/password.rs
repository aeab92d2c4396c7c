//! Password reset: a short-lived signed token mailed to the account owner.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use bazar_db::queries::users;
use bazar_types::api::{ForgotPasswordRequest, MessageOnly, ResetPasswordRequest};

use crate::auth::hash_password;
use crate::error::{ApiError, JsonBody, PathParam};
use crate::mailer::OutgoingMail;
use crate::state::{AppState, blocking};
use crate::validate;

pub const RESET_TOKEN_TTL_SECS: i64 = 3600;
const RESET_PURPOSE: &str = "password_reset";
const INVALID_TOKEN: &str = "Token inválido o expirado";

#[derive(Debug, Serialize, Deserialize)]
struct ResetClaims {
    sub: i64,
    purpose: String,
    exp: usize,
}

pub fn issue_reset_token(secret: &str, user_id: i64) -> anyhow::Result<String> {
    let claims = ResetClaims {
        sub: user_id,
        purpose: RESET_PURPOSE.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::seconds(RESET_TOKEN_TTL_SECS)).timestamp()
            as usize,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// User id carried by a valid, unexpired reset token.
pub fn verify_reset_token(secret: &str, token: &str) -> Result<i64, ApiError> {
    let data = decode::<ResetClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::validation(INVALID_TOKEN))?;

    if data.claims.purpose != RESET_PURPOSE {
        return Err(ApiError::validation(INVALID_TOKEN));
    }
    Ok(data.claims.sub)
}

/// POST /password/forgot: always answers the same way so the endpoint
/// cannot be used to probe which addresses have accounts.
pub async fn forgot(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = validate::required(req.email, "El correo es obligatorio")?
        .to_lowercase();

    let user = blocking(&state, move |db| {
        Ok(db
            .with_conn(|conn| users::find_by_email(conn, &email))?
            .filter(|u| u.is_active))
    })
    .await?;

    if let Some(user) = user {
        let token = issue_reset_token(&state.settings.jwt_secret, user.id)?;
        let link = format!(
            "{}/reset-password/{}",
            state.settings.frontend_url.trim_end_matches('/'),
            token
        );
        let mail = OutgoingMail {
            to: user.email.clone(),
            subject: "Restablece tu contraseña".to_string(),
            text: format!(
                "Hola {},\n\nPara restablecer tu contraseña abre este enlace (válido durante 1 hora):\n{}\n",
                user.first_name, link
            ),
        };

        match state.mailer.send(&mail).await {
            Ok(()) => info!("Password reset requested for user {}", user.id),
            Err(e) => warn!("Could not send reset mail to user {}: {:#}", user.id, e),
        }
    }

    Ok(Json(MessageOnly::new(
        "Si el correo está registrado, recibirás un enlace para restablecer la contraseña",
    )))
}

/// POST /password/reset/{token}
pub async fn reset(
    State(state): State<AppState>,
    WithRejection(Path(token), _): PathParam<String>,
    WithRejection(Json(req), _): JsonBody<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let password = req
        .password
        .ok_or_else(|| ApiError::validation("La contraseña es obligatoria"))?;
    validate::password(&password)?;

    let user_id = verify_reset_token(&state.settings.jwt_secret, &token)?;

    blocking(&state, move |db| {
        let password_hash = hash_password(&password)?;
        db.transaction(|tx| {
            match users::find_by_id(tx, user_id)? {
                Some(user) if user.is_active => {}
                _ => return Err(ApiError::validation(INVALID_TOKEN)),
            }
            users::set_password(tx, user_id, &password_hash)?;
            Ok(())
        })
    })
    .await?;

    info!("Password reset completed for user {}", user_id);
    Ok(Json(MessageOnly::new("Contraseña actualizada correctamente")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_token_round_trip() {
        let token = issue_reset_token("secret", 9).unwrap();
        assert_eq!(verify_reset_token("secret", &token).unwrap(), 9);
        assert!(verify_reset_token("other", &token).is_err());
        assert!(verify_reset_token("secret", "garbage").is_err());
    }

    #[test]
    fn wrong_purpose_is_rejected() {
        let claims = ResetClaims {
            sub: 1,
            purpose: "something_else".into(),
            exp: (chrono::Utc::now().timestamp() + 600) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(matches!(
            verify_reset_token("secret", &token),
            Err(ApiError::Validation(_))
        ));
    }
}
