use std::str::FromStr;

use crate::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Trimmed, non-empty text or a validation error carrying `msg`.
pub fn required(value: Option<String>, msg: &str) -> Result<String, ApiError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ApiError::validation(msg)),
    }
}

/// Like [`required`] but only when the field was sent at all.
pub fn optional(value: Option<String>, msg: &str) -> Result<Option<String>, ApiError> {
    value.map(|v| required(Some(v), msg)).transpose()
}

pub fn max_len(value: &str, max: usize, field: &str) -> Result<(), ApiError> {
    if value.chars().count() > max {
        return Err(ApiError::validation(format!(
            "El campo {} no puede superar {} caracteres",
            field, max
        )));
    }
    Ok(())
}

pub fn parse_enum<T: FromStr>(raw: &str, msg: &str) -> Result<T, ApiError> {
    raw.trim().parse().map_err(|_| ApiError::validation(msg))
}

pub fn price(value: f64) -> Result<f64, ApiError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ApiError::validation("El precio debe ser mayor que 0"));
    }
    Ok(value)
}

pub fn quantity(value: Option<i64>) -> Result<i64, ApiError> {
    match value.unwrap_or(1) {
        q if q >= 1 => Ok(q),
        _ => Err(ApiError::validation("La cantidad debe ser al menos 1")),
    }
}

/// Lower-cased address with a plausible `local@domain.tld` shape.
pub fn email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    let plausible = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !plausible {
        return Err(ApiError::validation("El correo electrónico no es válido"));
    }
    Ok(email)
}

pub fn password(raw: &str) -> Result<(), ApiError> {
    if raw.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "La contraseña debe tener al menos {} caracteres",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
