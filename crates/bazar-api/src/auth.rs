use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{info, warn};

use bazar_db::Database;
use bazar_db::models::NewUser;
use bazar_db::queries::users;
use bazar_types::api::{AuthResponse, Claims, Envelope, LoginRequest, RegisterRequest};
use bazar_types::models::{Role, User};

use crate::error::{ApiError, JsonBody};
use crate::state::{AppState, Settings, blocking};
use crate::validate;

const BAD_CREDENTIALS: &str = "Correo o contraseña incorrectos";

/// Registration input after validation.
pub(crate) struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl NewAccount {
    pub(crate) fn parse(req: RegisterRequest) -> Result<Self, ApiError> {
        let missing = "Por favor, completa todos los campos";
        let first_name = validate::required(req.first_name, missing)?;
        let last_name = validate::required(req.last_name, missing)?;
        let email = validate::email(&validate::required(req.email, missing)?)?;
        let password = req
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::validation(missing))?;
        validate::password(&password)?;
        let role = validate::parse_enum(&validate::required(req.role, missing)?, "Rol no válido")?;

        validate::max_len(&first_name, 120, "nombre")?;
        validate::max_len(&last_name, 120, "apellido")?;
        validate::max_len(&email, 120, "correo")?;

        Ok(Self {
            first_name,
            last_name,
            email,
            password,
            role,
        })
    }
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
}

pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

pub fn create_token(settings: &Settings, user: &User) -> anyhow::Result<String> {
    let claims = Claims {
        user_id: user.id,
        role: user.role,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
        exp: (chrono::Utc::now() + settings.token_ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate signature and expiry of an access token.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::unauthorized("Token inválido o expirado"))
}

/// Hash the password and insert the user, refusing taken addresses.
pub(crate) fn create_account(db: &Database, account: NewAccount) -> Result<User, ApiError> {
    let password_hash = hash_password(&account.password)?;

    db.transaction(|tx| {
        if users::find_by_email(tx, &account.email)?.is_some() {
            return Err(ApiError::conflict("El correo ya está registrado"));
        }

        let id = users::insert(
            tx,
            &NewUser {
                first_name: &account.first_name,
                last_name: &account.last_name,
                email: &account.email,
                password_hash: &password_hash,
                role: account.role,
            },
        )?;

        let row = users::find_by_id(tx, id)?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("user {} missing after insert", id)))?;
        Ok(row.into_user())
    })
}

/// Create the configured administrator unless the address is already taken.
pub fn bootstrap_admin(db: &Database, email: &str, password: &str) -> Result<(), ApiError> {
    let account = NewAccount {
        first_name: "Admin".to_string(),
        last_name: "Bazar".to_string(),
        email: validate::email(email)?,
        password: password.to_string(),
        role: Role::Admin,
    };
    validate::password(&account.password)?;

    match create_account(db, account) {
        Ok(user) => {
            info!("Bootstrapped admin account {} ({})", user.id, user.email);
            Ok(())
        }
        Err(ApiError::Conflict(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = NewAccount::parse(req)?;
    if account.role == Role::Admin {
        return Err(ApiError::forbidden("No puedes registrarte como administrador"));
    }

    let user = blocking(&state, move |db| create_account(db, account)).await?;
    let access_token = create_token(&state.settings, &user)?;

    info!("Registered user {} ({}) as {}", user.id, user.email, user.role);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            access_token,
            results: user,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(ApiError::validation("Correo y contraseña son obligatorios"));
    };
    let email = email.trim().to_lowercase();

    let user = blocking(&state, move |db| {
        let row = db
            .with_conn(|conn| users::find_by_email(conn, &email))?
            .filter(|row| row.is_active);

        match row {
            Some(row) if verify_password(&row.password, &password) => Ok(row.into_user()),
            _ => {
                warn!("Rejected login for {}", email);
                Err(ApiError::unauthorized(BAD_CREDENTIALS))
            }
        }
    })
    .await?;

    let access_token = create_token(&state.settings, &user)?;

    Ok(Json(AuthResponse {
        access_token,
        results: user,
    }))
}

/// GET /protected: echoes the decoded claims.
pub async fn protected(Extension(claims): Extension<Claims>) -> Json<Envelope<Claims>> {
    Json(Envelope::new(claims))
}
