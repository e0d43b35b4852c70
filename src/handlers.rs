use crate::{
    AppState,
    auth::{
        self, AuthUser, TOKEN_TTL_SECS, clear_session_cookie, session_cookie, sign_token,
    },
    models::{
        Ad, AdResponse, AdView, Category, CategoryRequest, CreateAdRequest,
        CreateResponseRequest, LoginRequest, LoginResponse, MessageResponse, NewAd, NewUser,
        RegisterRequest, RegisterResponse, ResponseView, SessionUser, UpdateAdRequest,
        UpdateResponseRequest, UserSummary,
    },
    repository::{AdQuery, AdSort},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;

// --- Error Envelope ---

/// ApiError
///
/// The uniform error shape for every handler: an HTTP status plus a
/// `{"message": "..."}` JSON body. Store failures convert into a generic
/// 500 here; their detail was already logged at the repository layer.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal() -> Self {
        // Deliberately generic: detail stays in the server logs.
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(_: sqlx::Error) -> Self {
        ApiError::internal()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(MessageResponse {
                message: self.message,
            }),
        )
            .into_response()
    }
}

// --- Filter Structs ---

/// AdFilter
///
/// Accepted query parameters for GET /ads. The fields are raw strings on
/// purpose: an invalid or non-numeric value must be silently ignored (the
/// filter is simply not applied), never rejected with a 400.
#[derive(Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AdFilter {
    /// Exact category match.
    pub category_id: Option<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<String>,
    /// Inclusive upper price bound.
    pub max_price: Option<String>,
    /// `asc` or `desc`; anything else falls back to newest-first.
    pub sort_by_price: Option<String>,
}

impl AdFilter {
    fn into_query(self) -> AdQuery {
        AdQuery {
            category_id: self.category_id.as_deref().and_then(|v| v.parse().ok()),
            min_price: self.min_price.as_deref().and_then(|v| v.parse().ok()),
            max_price: self.max_price.as_deref().and_then(|v| v.parse().ok()),
            sort: AdSort::from_param(self.sort_by_price.as_deref()),
        }
    }
}

// --- Auth Handlers ---

/// register
///
/// [Authenticated Route] Creates a new account and opens a session for it.
///
/// *Note*: requiring an existing valid session to register is the literal
/// inherited contract (admin-provisioned accounts); the `AuthUser` argument
/// enforces it.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User created, session cookie set", body = RegisterResponse),
        (status = 400, description = "Missing email or password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(ApiError::bad_request("Email and password required"));
    };
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Email and password required"));
    }

    if state.repo.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict("User already exists"));
    }

    let hashed = auth::hash_password(&password).map_err(|e| {
        tracing::error!("password hashing failed: {:?}", e);
        ApiError::internal()
    })?;

    let user = state
        .repo
        .create_user(NewUser {
            email,
            name: payload.name,
            password: hashed,
        })
        .await?;

    let token = sign_token(user.id, &user.role, &state.config.jwt_secret, TOKEN_TTL_SECS)
        .map_err(|e| {
            tracing::error!("token signing failed: {:?}", e);
            ApiError::internal()
        })?;
    let cookie = session_cookie(&token, state.config.secure_cookies());

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(RegisterResponse {
            message: "User created".to_string(),
            user: UserSummary {
                id: user.id,
                email: user.email,
            },
        }),
    ))
}

/// login
///
/// [Public Route] Password login. Unknown email and wrong password produce
/// the same 401 so the two cases cannot be told apart.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, session cookie set", body = LoginResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Bad credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(ApiError::bad_request("Email and password required"));
    };
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Email and password required"));
    }

    let user = state
        .repo
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;

    if !auth::verify_password(&password, &user.password) {
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid credentials"));
    }

    let token = sign_token(user.id, &user.role, &state.config.jwt_secret, TOKEN_TTL_SECS)
        .map_err(|e| {
            tracing::error!("token signing failed: {:?}", e);
            ApiError::internal()
        })?;
    let cookie = session_cookie(&token, state.config.secure_cookies());

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(LoginResponse {
            message: "Logged in".to_string(),
            user: SessionUser {
                id: user.id,
                email: user.email,
                role: user.role,
            },
        }),
    ))
}

/// logout
///
/// [Public Route] Clears the session cookie. The token itself is not
/// revoked server-side; it simply ages out (stateless-token design).
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Session cookie cleared", body = MessageResponse))
)]
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = clear_session_cookie(state.config.secure_cookies());
    (
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}

// --- Ad Handlers ---

/// get_ads
///
/// [Authenticated Route] Filtered ad listing joined with the abbreviated
/// author and category. All filters optional and independent; invalid
/// values are dropped rather than rejected.
#[utoipa::path(
    get,
    path = "/ads",
    params(AdFilter),
    responses((status = 200, description = "Filtered ads", body = [AdView]))
)]
pub async fn get_ads(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<AdFilter>,
) -> Result<Json<Vec<AdView>>, ApiError> {
    let ads = state.repo.list_ads(filter.into_query()).await?;
    Ok(Json(ads))
}

/// get_ad
///
/// [Authenticated Route] Single ad by numeric id. A non-numeric id is
/// rejected with 400 by the path extractor before this body runs.
#[utoipa::path(
    get,
    path = "/ads/{id}",
    params(("id" = i32, Path, description = "Ad ID")),
    responses(
        (status = 200, description = "Found", body = AdView),
        (status = 400, description = "Invalid ad ID"),
        (status = 404, description = "Ad not found")
    )
)]
pub async fn get_ad(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AdView>, ApiError> {
    let ad = state
        .repo
        .get_ad(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ad not found"))?;
    Ok(Json(ad))
}

/// create_ad
///
/// [Authenticated Route] Creates a listing. The author is always the
/// caller; an `authorId` field in the body is ignored. A supplied category
/// must exist (validate-then-insert, not wrapped in a transaction).
#[utoipa::path(
    post,
    path = "/ads",
    request_body = CreateAdRequest,
    responses(
        (status = 201, description = "Created", body = Ad),
        (status = 400, description = "Missing title or unknown category")
    )
)]
pub async fn create_ad(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateAdRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = match payload.title {
        Some(title) if !title.is_empty() => title,
        _ => return Err(ApiError::bad_request("Title is required")),
    };

    if let Some(category_id) = payload.category_id {
        state
            .repo
            .get_category(category_id)
            .await?
            .ok_or_else(|| ApiError::bad_request("Category not found"))?;
    }

    let ad = state
        .repo
        .create_ad(
            NewAd {
                title,
                description: payload.description,
                price: payload.price,
                category_id: payload.category_id,
            },
            author_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ad)))
}

/// update_ad
///
/// [Authenticated Route] Partial update. Allowed to the author or to a
/// MODERATOR; every other identity (admins included) gets 403. Absent
/// fields keep their prior value; an explicitly empty title is a 400.
#[utoipa::path(
    patch,
    path = "/ads/{id}",
    params(("id" = i32, Path, description = "Ad ID")),
    request_body = UpdateAdRequest,
    responses(
        (status = 200, description = "Updated", body = Ad),
        (status = 400, description = "Empty title or unknown category"),
        (status = 403, description = "Not the author or a moderator"),
        (status = 404, description = "Ad not found")
    )
)]
pub async fn update_ad(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<UpdateAdRequest>,
) -> Result<Json<Ad>, ApiError> {
    let ad = state
        .repo
        .get_ad_record(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ad not found"))?;

    if !auth.is_moderator() && ad.author_id != auth.id {
        return Err(ApiError::forbidden("Forbidden: not your ad"));
    }

    if let Some(title) = &patch.title {
        if title.is_empty() {
            return Err(ApiError::bad_request("Title cannot be empty"));
        }
    }

    if let Some(category_id) = patch.category_id {
        state
            .repo
            .get_category(category_id)
            .await?
            .ok_or_else(|| ApiError::bad_request("Category not found"))?;
    }

    let updated = state
        .repo
        .update_ad(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Ad not found"))?;
    Ok(Json(updated))
}

/// delete_ad
///
/// [Authenticated Route] Hard delete, author or MODERATOR only.
#[utoipa::path(
    delete,
    path = "/ads/{id}",
    params(("id" = i32, Path, description = "Ad ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not the author or a moderator"),
        (status = 404, description = "Ad not found")
    )
)]
pub async fn delete_ad(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let ad = state
        .repo
        .get_ad_record(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ad not found"))?;

    if !auth.is_moderator() && ad.author_id != auth.id {
        return Err(ApiError::forbidden("Forbidden: not your ad"));
    }

    state.repo.delete_ad(id).await?;
    Ok(Json(MessageResponse {
        message: "Ad deleted successfully".to_string(),
    }))
}

// --- Category Handlers ---

/// get_categories
///
/// [Authenticated Route] All categories, any role.
#[utoipa::path(
    get,
    path = "/category",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn get_categories(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.repo.list_categories().await?))
}

/// get_category
///
/// [Authenticated Route] Single category, any role.
#[utoipa::path(
    get,
    path = "/category/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Found", body = Category),
        (status = 404, description = "Category not found")
    )
)]
pub async fn get_category(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Category>, ApiError> {
    let category = state
        .repo
        .get_category(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;
    Ok(Json(category))
}

/// create_category
///
/// [Admin Route] Strict ADMIN check before touching the store.
#[utoipa::path(
    post,
    path = "/category",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 400, description = "Missing name"),
        (status = 403, description = "Admins only")
    )
)]
pub async fn create_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !auth.is_admin() {
        return Err(ApiError::forbidden("Forbidden: Admins only"));
    }

    let name = match payload.name {
        Some(name) if !name.is_empty() => name,
        _ => return Err(ApiError::bad_request("Category name is required")),
    };

    let category = state.repo.create_category(name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// update_category
///
/// [Admin Route] Renames a category.
#[utoipa::path(
    patch,
    path = "/category/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 400, description = "Missing name"),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn update_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    if !auth.is_admin() {
        return Err(ApiError::forbidden("Forbidden: Admins only"));
    }

    let name = match payload.name {
        Some(name) if !name.is_empty() => name,
        _ => return Err(ApiError::bad_request("Category name is required")),
    };

    let category = state
        .repo
        .update_category(id, name)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;
    Ok(Json(category))
}

/// delete_category
///
/// [Admin Route] Deletes a category. Referencing ads are deliberately not
/// checked here; the store's own integrity rules apply.
#[utoipa::path(
    delete,
    path = "/category/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn delete_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !auth.is_admin() {
        return Err(ApiError::forbidden("Forbidden: Admins only"));
    }

    if !state.repo.delete_category(id).await? {
        return Err(ApiError::not_found("Category not found"));
    }
    Ok(Json(MessageResponse {
        message: "Category deleted".to_string(),
    }))
}

// --- Response Handlers ---

/// get_responses
///
/// [Authenticated Route] Lists the caller's own responses, newest first.
/// There is no way to list anyone else's, admin or not.
#[utoipa::path(
    get,
    path = "/response",
    responses((status = 200, description = "Own responses", body = [ResponseView]))
)]
pub async fn get_responses(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ResponseView>>, ApiError> {
    Ok(Json(state.repo.list_responses_for_user(user_id).await?))
}

/// get_response
///
/// [Authenticated Route] Single response, strictly owner-only. Moderators
/// get no override here, unlike on ads.
#[utoipa::path(
    get,
    path = "/response/{id}",
    params(("id" = i32, Path, description = "Response ID")),
    responses(
        (status = 200, description = "Found", body = ResponseView),
        (status = 403, description = "Not the responder"),
        (status = 404, description = "Response not found")
    )
)]
pub async fn get_response(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ResponseView>, ApiError> {
    let response = state
        .repo
        .get_response(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Response not found"))?;

    if response.user_id != auth.id {
        return Err(ApiError::forbidden("Forbidden: not your response"));
    }
    Ok(Json(response))
}

/// create_response
///
/// [Authenticated Route] Posts an inquiry on an ad. The referenced ad must
/// exist (404, no row created otherwise); the responder is always the caller.
#[utoipa::path(
    post,
    path = "/response",
    request_body = CreateResponseRequest,
    responses(
        (status = 201, description = "Created", body = AdResponse),
        (status = 400, description = "Missing adId or message"),
        (status = 404, description = "Ad not found")
    )
)]
pub async fn create_response(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateResponseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(ad_id), Some(message)) = (payload.ad_id, payload.message) else {
        return Err(ApiError::bad_request("adId and message are required"));
    };
    if message.is_empty() {
        return Err(ApiError::bad_request("adId and message are required"));
    }

    state
        .repo
        .get_ad_record(ad_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ad not found"))?;

    let response = state.repo.create_response(ad_id, user_id, message).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// update_response
///
/// [Authenticated Route] Owner-only message edit.
#[utoipa::path(
    patch,
    path = "/response/{id}",
    params(("id" = i32, Path, description = "Response ID")),
    request_body = UpdateResponseRequest,
    responses(
        (status = 200, description = "Updated", body = AdResponse),
        (status = 400, description = "Missing message"),
        (status = 403, description = "Not the responder"),
        (status = 404, description = "Response not found")
    )
)]
pub async fn update_response(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateResponseRequest>,
) -> Result<Json<AdResponse>, ApiError> {
    let existing = state
        .repo
        .get_response_record(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Response not found"))?;

    if existing.user_id != auth.id {
        return Err(ApiError::forbidden("Forbidden: not your response"));
    }

    let message = match payload.message {
        Some(message) if !message.trim().is_empty() => message,
        _ => return Err(ApiError::bad_request("Message is required")),
    };

    let updated = state
        .repo
        .update_response(id, message)
        .await?
        .ok_or_else(|| ApiError::not_found("Response not found"))?;
    Ok(Json(updated))
}

/// delete_response
///
/// [Authenticated Route] Owner-only hard delete.
#[utoipa::path(
    delete,
    path = "/response/{id}",
    params(("id" = i32, Path, description = "Response ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not the responder"),
        (status = 404, description = "Response not found")
    )
)]
pub async fn delete_response(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let existing = state
        .repo
        .get_response_record(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Response not found"))?;

    if existing.user_id != auth.id {
        return Err(ApiError::forbidden("Forbidden: not your response"));
    }

    state.repo.delete_response(id).await?;
    Ok(Json(MessageResponse {
        message: "Response deleted successfully".to_string(),
    }))
}
