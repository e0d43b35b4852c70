use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Roles ---

// Role values stored in users.role. No endpoint mutates the role; it is
// assigned at registration (USER) or changed out-of-band.
pub const ROLE_USER: &str = "USER";
pub const ROLE_MODERATOR: &str = "MODERATOR";
pub const ROLE_ADMIN: &str = "ADMIN";

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Canonical identity record stored in the `users` table. The password column
/// holds an argon2 hash and is never serialized into any response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: Option<String>,
    // Argon2 hash. Skipped on serialization so it can never leak through a handler.
    #[serde(skip_serializing, default)]
    pub password: String,
    // RBAC field: USER | MODERATOR | ADMIN.
    pub role: String,
}

/// UserSummary
///
/// Abbreviated user shape (`{id, email}`) joined into ads and responses.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub email: String,
}

/// Category
///
/// A marketplace category (`{id, name}`). Mutated only by admins.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub name: String,
}

/// Ad
///
/// A marketplace listing as stored in the `ads` table. `author_id` is always
/// the verified token subject of the creator, never a client-supplied value.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Ad {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<i32>,
    pub author_id: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// AdView
///
/// The wire shape for ad reads: the ad scalars plus the abbreviated author
/// and the (optional) joined category. Built in the repository from a flat
/// joined row.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AdView {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<i32>,
    pub author_id: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub author: UserSummary,
    pub category: Option<Category>,
}

/// AdResponse
///
/// A buyer inquiry on an ad, as stored in the `responses` table. `user_id` is
/// always the verified token subject of the responder.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AdResponse {
    pub id: i32,
    pub ad_id: i32,
    pub user_id: i32,
    pub message: String,
}

/// ResponseView
///
/// The wire shape for response reads: the response scalars plus the full ad
/// record and the abbreviated responding user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ResponseView {
    pub id: i32,
    pub ad_id: i32,
    pub user_id: i32,
    pub message: String,
    pub ad: Ad,
    pub user: UserSummary,
}

// --- Request Payloads (Input Schemas) ---
//
// Required fields are modelled as Option<String> on purpose: a missing field
// must produce a 400 with a descriptive message from the handler, not a
// deserialization rejection.

/// RegisterRequest
///
/// Input payload for POST /auth/register. The password is hashed before it
/// ever reaches the repository and is never logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// LoginRequest
///
/// Input payload for POST /auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// CreateAdRequest
///
/// Input payload for POST /ads. There is deliberately no author field: any
/// `authorId` a client smuggles into the body is ignored by serde, and the
/// stored author is always the authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<i32>,
}

/// UpdateAdRequest
///
/// Partial update payload for PATCH /ads/{id}. `None` means "leave the field
/// unchanged" (COALESCE at the SQL level). An explicitly supplied empty title
/// is rejected with 400 rather than silently skipped.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i32>,
}

/// CategoryRequest
///
/// Input payload for POST /category and PATCH /category/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    pub name: Option<String>,
}

/// CreateResponseRequest
///
/// Input payload for POST /response. Like ads, the responder identity comes
/// from the session, never from the body.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponseRequest {
    pub ad_id: Option<i32>,
    pub message: Option<String>,
}

/// UpdateResponseRequest
///
/// Input payload for PATCH /response/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponseRequest {
    pub message: Option<String>,
}

// --- Validated Internal Payloads (Repository Input) ---

/// NewUser
///
/// A registration payload after handler-side validation: required fields are
/// present and the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub password: String,
}

/// NewAd
///
/// An ad-creation payload after handler-side validation (non-empty title,
/// category existence already checked). The author is passed separately from
/// the authenticated identity.
#[derive(Debug, Clone)]
pub struct NewAd {
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<i32>,
}

// --- Response Envelopes (Output) ---

/// MessageResponse
///
/// Generic `{message}` envelope used by logout, deletes, and error bodies.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

/// RegisterResponse
///
/// Output of POST /auth/register: confirmation plus the abbreviated new user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserSummary,
}

/// SessionUser
///
/// The user shape returned by login (`{id, email, role}`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i32,
    pub email: String,
    pub role: String,
}

/// LoginResponse
///
/// Output of POST /auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub user: SessionUser,
}
