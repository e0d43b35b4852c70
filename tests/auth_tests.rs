use adboard::{
    auth::{
        AuthUser, TOKEN_TTL_SECS, TokenOutcome, clear_session_cookie, hash_password,
        session_cookie, sign_token, verify_password, verify_token,
    },
    config::AppConfig,
    models::{ROLE_MODERATOR, ROLE_USER},
};
use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    }
}

/// Helper to get the mutable Parts struct from a generated Request
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn parts_with_cookie(cookie_header: &str) -> Parts {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::COOKIE,
        header::HeaderValue::from_str(cookie_header).unwrap(),
    );
    parts
}

// --- Token Service Tests ---

#[test]
fn test_valid_token_round_trips_claims() {
    let token = sign_token(42, ROLE_MODERATOR, TEST_JWT_SECRET, TOKEN_TTL_SECS).unwrap();
    let claims = verify_token(&token, TEST_JWT_SECRET)
        .into_claims()
        .expect("token should verify");
    assert_eq!(claims.sub, 42);
    assert_eq!(claims.role, "MODERATOR");
    assert_eq!(claims.exp as i64 - claims.iat as i64, TOKEN_TTL_SECS);
}

#[test]
fn test_expired_token_is_tagged_expired() {
    // TTL well past the default 60-second decode leeway.
    let token = sign_token(1, ROLE_USER, TEST_JWT_SECRET, -300).unwrap();
    assert!(matches!(
        verify_token(&token, TEST_JWT_SECRET),
        TokenOutcome::Expired
    ));
}

#[test]
fn test_wrong_secret_is_tagged_invalid() {
    let token = sign_token(1, ROLE_USER, TEST_JWT_SECRET, TOKEN_TTL_SECS).unwrap();
    assert!(matches!(
        verify_token(&token, "a-completely-different-secret"),
        TokenOutcome::Invalid
    ));
}

#[test]
fn test_malformed_token_is_tagged_invalid() {
    assert!(matches!(
        verify_token("not-a-jwt-at-all", TEST_JWT_SECRET),
        TokenOutcome::Invalid
    ));
}

// --- Session Cookie Tests ---

#[test]
fn test_session_cookie_attributes() {
    let cookie = session_cookie("abc123", false);
    assert!(cookie.starts_with("token=abc123;"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("SameSite=Lax"));
    // The cookie expires after one hour even though the token lives longer.
    assert!(cookie.contains("Max-Age=3600"));
    assert!(!cookie.contains("Secure"));
}

#[test]
fn test_session_cookie_secure_in_production() {
    assert!(session_cookie("abc123", true).contains("Secure"));
}

#[test]
fn test_clear_cookie_expires_immediately() {
    let cookie = clear_session_cookie(false);
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

// --- Password Hashing Tests ---

#[test]
fn test_password_round_trip() {
    let hash = hash_password("hunter2").unwrap();
    assert_ne!(hash, "hunter2");
    assert!(verify_password("hunter2", &hash));
    assert!(!verify_password("hunter3", &hash));
}

#[test]
fn test_unparseable_stored_hash_is_a_mismatch() {
    assert!(!verify_password("hunter2", "not-an-argon2-hash"));
}

// --- AuthUser Extractor Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_cookie() {
    let token = sign_token(7, ROLE_USER, TEST_JWT_SECRET, TOKEN_TTL_SECS).unwrap();
    let mut parts = parts_with_cookie(&format!("token={}", token));

    let auth_user = AuthUser::from_request_parts(&mut parts, &test_config()).await;

    assert!(auth_user.is_ok());
    let user = auth_user.unwrap();
    assert_eq!(user.id, 7);
    assert_eq!(user.role, "USER");
}

#[tokio::test]
async fn test_auth_success_with_multiple_cookies() {
    let token = sign_token(7, ROLE_USER, TEST_JWT_SECRET, TOKEN_TTL_SECS).unwrap();
    let mut parts = parts_with_cookie(&format!("theme=dark; token={}; lang=en", token));

    let auth_user = AuthUser::from_request_parts(&mut parts, &test_config()).await;

    assert_eq!(auth_user.unwrap().id, 7);
}

#[tokio::test]
async fn test_auth_failure_with_no_cookie() {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let auth_user = AuthUser::from_request_parts(&mut parts, &test_config()).await;

    assert!(auth_user.is_err());
    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_unrelated_cookies() {
    let mut parts = parts_with_cookie("theme=dark; lang=en");

    let auth_user = AuthUser::from_request_parts(&mut parts, &test_config()).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_foreign_signature() {
    // Signed with a different secret: indistinguishable from no token.
    let token = sign_token(7, ROLE_USER, "attacker-secret", TOKEN_TTL_SECS).unwrap();
    let mut parts = parts_with_cookie(&format!("token={}", token));

    let auth_user = AuthUser::from_request_parts(&mut parts, &test_config()).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_expired_token() {
    let token = sign_token(7, ROLE_USER, TEST_JWT_SECRET, -300).unwrap();
    let mut parts = parts_with_cookie(&format!("token={}", token));

    let auth_user = AuthUser::from_request_parts(&mut parts, &test_config()).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cleared_cookie_value_is_rejected() {
    // What a client replays after logout: the emptied cookie.
    let mut parts = parts_with_cookie("token=");

    let auth_user = AuthUser::from_request_parts(&mut parts, &test_config()).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}
