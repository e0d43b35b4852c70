use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// Name of the session cookie carrying the signed token.
pub const SESSION_COOKIE: &str = "token";

/// Lifetime of the token itself (claims `exp`), in seconds.
pub const TOKEN_TTL_SECS: i64 = 2 * 60 * 60;

/// Max-Age of the session cookie set on login/register, in seconds.
///
/// Deliberately shorter than the token TTL: the cookie is the session
/// boundary for browsers, while a token extracted from it stays valid for
/// its full claimed lifetime. This mismatch is part of the documented
/// contract, not something to silently reconcile.
pub const COOKIE_MAX_AGE_SECS: i64 = 60 * 60;

/// hash_password
///
/// Argon2 hash with a fresh random salt. The plaintext never leaves the
/// handler that received it.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// verify_password
///
/// Constant-time verification against a stored argon2 hash. An unparseable
/// stored hash counts as a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Claims
///
/// The signed payload of a session token. Signed with a single shared HS256
/// secret and validated on every authenticated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the numeric id of the user.
    pub sub: i32,
    /// The role captured at issuance (USER | MODERATOR | ADMIN).
    pub role: String,
    /// Issued At timestamp.
    pub iat: usize,
    /// Expiration timestamp. Tokens past this point are rejected.
    pub exp: usize,
}

/// TokenOutcome
///
/// Tagged verification result. Internally we distinguish an expired token
/// from a forged or malformed one (useful for logs); at the HTTP boundary
/// every non-Valid outcome collapses to the same 401.
#[derive(Debug)]
pub enum TokenOutcome {
    Valid(Claims),
    Expired,
    Invalid,
}

impl TokenOutcome {
    pub fn into_claims(self) -> Option<Claims> {
        match self {
            TokenOutcome::Valid(claims) => Some(claims),
            _ => None,
        }
    }
}

/// sign_token
///
/// Issues a signed session token for the given subject and role, valid for
/// `ttl_secs` from now. HS256 with the shared application secret; there is
/// no key rotation.
pub fn sign_token(
    user_id: i32,
    role: &str,
    secret: &str,
    ttl_secs: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        iat: now as usize,
        exp: (now + ttl_secs) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// verify_token
///
/// Checks signature and expiry. Never returns an error to the caller: any
/// failure maps to `Expired` or `Invalid`, both of which upstream code
/// treats exactly like an absent token.
pub fn verify_token(token: &str, secret: &str) -> TokenOutcome {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::default();
    // Ensure expiration time validation is always active.
    validation.validate_exp = true;

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => TokenOutcome::Valid(data.claims),
        Err(e) => match e.kind() {
            ErrorKind::ExpiredSignature => TokenOutcome::Expired,
            // Bad signature, malformed token, wrong algorithm, etc.
            _ => TokenOutcome::Invalid,
        },
    }
}

/// session_cookie
///
/// Builds the Set-Cookie value issued on login/register: httpOnly, Lax,
/// path `/`, 1-hour Max-Age, plus `Secure` in production.
pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, COOKIE_MAX_AGE_SECS
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// clear_session_cookie
///
/// Builds the Set-Cookie value issued on logout: same attributes with an
/// empty value and Max-Age=0, instructing the client to drop the cookie.
/// This does not invalidate the token server-side (no revocation list).
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!(
        "{}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// token_from_request
///
/// Pulls the session token out of the request's Cookie header(s), if any.
/// Cookie pairs are separated by `;` per RFC 6265.
pub fn token_from_request(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// AuthUser
///
/// The resolved identity of an authenticated request: the verified token
/// subject and the role it was issued with. Handlers use this for every
/// ownership and role check.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == crate::models::ROLE_ADMIN
    }

    pub fn is_moderator(&self) -> bool {
        self.role == crate::models::ROLE_MODERATOR
    }
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any protected handler. This keeps authentication
/// (extractor) cleanly separated from business logic (the handler).
///
/// The process:
/// 1. Dependency Resolution: pull AppConfig (JWT secret) from the state.
/// 2. Cookie Extraction: find the `token` cookie; absent means no identity.
/// 3. Verification: signature + expiry via `verify_token`.
///
/// Rejection: StatusCode::UNAUTHORIZED (401) on any failure. An expired
/// token, a forged token, and no token at all are indistinguishable to the
/// client by design.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let token = token_from_request(parts).ok_or(StatusCode::UNAUTHORIZED)?;

        match verify_token(&token, &config.jwt_secret) {
            TokenOutcome::Valid(claims) => Ok(AuthUser {
                id: claims.sub,
                role: claims.role,
            }),
            outcome => {
                // The distinction is for operators only; the response is a flat 401.
                tracing::debug!("session token rejected: {:?}", outcome);
                Err(StatusCode::UNAUTHORIZED)
            }
        }
    }
}
