use crate::constants::AUTH_CHALLENGE;
use crate::state::AppState;
use actix_web::dev::Payload;
use actix_web::http::header::{self, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse, ResponseError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::future::{ready, Ready};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    Missing,
    #[error("Malformed Authorization header")]
    Malformed,
    #[error("Invalid credentials")]
    Invalid,
    #[error("Admin access is disabled")]
    Disabled,
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        unauthorized(&self.to_string())
    }
}

/// 401 with the Basic challenge, so browsers prompt again
pub fn unauthorized(body: &str) -> HttpResponse {
    HttpResponse::Unauthorized()
        .insert_header((
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static(AUTH_CHALLENGE),
        ))
        .body(body.to_string())
}

/// Admin login. Only digests are kept in memory.
pub struct AdminCredentials {
    username: String,
    username_digest: [u8; 32],
    password_digest: [u8; 32],
}

impl AdminCredentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            username_digest: digest(username),
            password_digest: digest(password),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Both parts are always compared so a wrong user name costs the same
    /// as a wrong password.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let user_ok = digest(username)[..].ct_eq(&self.username_digest[..]);
        let pass_ok = digest(password)[..].ct_eq(&self.password_digest[..]);
        (user_ok & pass_ok).into()
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

/// Parse `Authorization: Basic <base64(user:pass)>`
pub fn parse_basic(value: &str) -> Result<(String, String), AuthError> {
    let encoded = value
        .strip_prefix("Basic ")
        .or_else(|| value.strip_prefix("basic "))
        .ok_or(AuthError::Malformed)?;
    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthError::Malformed)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::Malformed)?;
    let (username, password) = decoded.split_once(':').ok_or(AuthError::Malformed)?;
    Ok((username.to_string(), password.to_string()))
}

/// Extractor for handlers that require the administrator
#[derive(Debug)]
pub struct AdminPrincipal {
    pub username: String,
}

impl FromRequest for AdminPrincipal {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AdminPrincipal, AuthError> {
    let credentials = req
        .app_data::<web::Data<AppState>>()
        .and_then(|state| state.credentials.as_ref())
        .ok_or(AuthError::Disabled)?;

    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::Missing)?;
    let header = header.to_str().map_err(|_| AuthError::Malformed)?;
    let (username, password) = parse_basic(header)?;

    if !credentials.verify(&username, &password) {
        warn!(username = ?username, "Rejected admin login");
        return Err(AuthError::Invalid);
    }

    Ok(AdminPrincipal { username })
}
