use crate::models::{Ad, AdResponse, AdView, Category, NewAd, NewUser, ResponseView, User,
    UpdateAdRequest, UserSummary, ROLE_USER};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, query_builder::QueryBuilder};
use std::sync::Arc;

/// AdSort
///
/// The single sort mode for ad listings. Newest-first is the default; the
/// price orderings are selected by `sortByPrice=asc|desc`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AdSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl AdSort {
    /// Maps the raw `sortByPrice` query value. Anything but `asc`/`desc`
    /// falls back to the default ordering, mirroring the lenient filter
    /// handling of the listing endpoint.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("asc") => AdSort::PriceAsc,
            Some("desc") => AdSort::PriceDesc,
            _ => AdSort::Newest,
        }
    }
}

/// AdQuery
///
/// Parsed, typed listing filters. All fields are independently optional;
/// the handler has already dropped any non-numeric raw values.
#[derive(Debug, Clone, Default)]
pub struct AdQuery {
    pub category_id: Option<i32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort: AdSort,
}

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, allowing the
/// handlers to interact with the data layer without knowing the specific
/// implementation (Postgres, Mock, etc.).
///
/// Every method returns `Result`: a store failure is logged here and surfaces
/// to the handler, which maps it to a generic 500. Ownership and role checks
/// are the handlers' concern; the repository only reads and writes rows.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;
    // Inserts with role USER; roles are only ever changed out-of-band.
    async fn create_user(&self, user: NewUser) -> Result<User, sqlx::Error>;

    // --- Categories ---
    async fn list_categories(&self) -> Result<Vec<Category>, sqlx::Error>;
    async fn get_category(&self, id: i32) -> Result<Option<Category>, sqlx::Error>;
    async fn create_category(&self, name: String) -> Result<Category, sqlx::Error>;
    // Returns None when the id does not resolve.
    async fn update_category(&self, id: i32, name: String) -> Result<Option<Category>, sqlx::Error>;
    // Returns false when the id does not resolve. No referencing-ads guard;
    // the schema's FK rules decide what happens to ads in the category.
    async fn delete_category(&self, id: i32) -> Result<bool, sqlx::Error>;

    // --- Ads ---
    // Filtered listing joined with the abbreviated author and category.
    async fn list_ads(&self, query: AdQuery) -> Result<Vec<AdView>, sqlx::Error>;
    async fn get_ad(&self, id: i32) -> Result<Option<AdView>, sqlx::Error>;
    // Bare row without joins, used for existence and ownership checks.
    async fn get_ad_record(&self, id: i32) -> Result<Option<Ad>, sqlx::Error>;
    async fn create_ad(&self, ad: NewAd, author_id: i32) -> Result<Ad, sqlx::Error>;
    // Partial update: absent fields keep their prior value (COALESCE).
    async fn update_ad(&self, id: i32, patch: UpdateAdRequest) -> Result<Option<Ad>, sqlx::Error>;
    // Hard delete, no tombstone.
    async fn delete_ad(&self, id: i32) -> Result<bool, sqlx::Error>;

    // --- Responses ---
    // Only ever scoped to the caller: no operation lists other users' responses.
    async fn list_responses_for_user(&self, user_id: i32)
        -> Result<Vec<ResponseView>, sqlx::Error>;
    async fn get_response(&self, id: i32) -> Result<Option<ResponseView>, sqlx::Error>;
    // Bare row without joins, used for existence and ownership checks.
    async fn get_response_record(&self, id: i32) -> Result<Option<AdResponse>, sqlx::Error>;
    async fn create_response(
        &self,
        ad_id: i32,
        user_id: i32,
        message: String,
    ) -> Result<AdResponse, sqlx::Error>;
    async fn update_response(
        &self,
        id: i32,
        message: String,
    ) -> Result<Option<AdResponse>, sqlx::Error>;
    async fn delete_response(&self, id: i32) -> Result<bool, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state. Constructed once at startup and injected everywhere;
/// there is no global client handle.
pub type RepositoryState = Arc<dyn Repository>;

// --- Flat Row Shapes (join results) ---

/// One row of the ad listing join, flattened. Reassembled into the nested
/// `AdView` wire shape in `into_view`.
#[derive(Debug, FromRow)]
struct AdRow {
    id: i32,
    title: String,
    description: Option<String>,
    price: Option<f64>,
    category_id: Option<i32>,
    author_id: i32,
    created_at: DateTime<Utc>,
    author_email: String,
    category_name: Option<String>,
}

impl AdRow {
    fn into_view(self) -> AdView {
        let category = match (self.category_id, self.category_name) {
            (Some(id), Some(name)) => Some(Category { id, name }),
            _ => None,
        };
        AdView {
            id: self.id,
            title: self.title,
            description: self.description,
            price: self.price,
            category_id: self.category_id,
            author_id: self.author_id,
            created_at: self.created_at,
            author: UserSummary {
                id: self.author_id,
                email: self.author_email,
            },
            category,
        }
    }
}

/// One row of the response listing join, flattened.
#[derive(Debug, FromRow)]
struct ResponseRow {
    id: i32,
    ad_id: i32,
    user_id: i32,
    message: String,
    user_email: String,
    ad_title: String,
    ad_description: Option<String>,
    ad_price: Option<f64>,
    ad_category_id: Option<i32>,
    ad_author_id: i32,
    ad_created_at: DateTime<Utc>,
}

impl ResponseRow {
    fn into_view(self) -> ResponseView {
        ResponseView {
            id: self.id,
            ad_id: self.ad_id,
            user_id: self.user_id,
            message: self.message,
            ad: Ad {
                id: self.ad_id,
                title: self.ad_title,
                description: self.ad_description,
                price: self.ad_price,
                category_id: self.ad_category_id,
                author_id: self.ad_author_id,
                created_at: self.ad_created_at,
            },
            user: UserSummary {
                id: self.user_id,
                email: self.user_email,
            },
        }
    }
}

const AD_VIEW_SELECT: &str = "SELECT a.id, a.title, a.description, a.price, a.category_id, \
     a.author_id, a.created_at, u.email AS author_email, c.name AS category_name \
     FROM ads a \
     JOIN users u ON u.id = a.author_id \
     LEFT JOIN categories c ON c.id = a.category_id";

const RESPONSE_VIEW_SELECT: &str = "SELECT r.id, r.ad_id, r.user_id, r.message, \
     u.email AS user_email, a.title AS ad_title, a.description AS ad_description, \
     a.price AS ad_price, a.category_id AS ad_category_id, a.author_id AS ad_author_id, \
     a.created_at AS ad_created_at \
     FROM responses r \
     JOIN ads a ON a.id = r.ad_id \
     JOIN users u ON u.id = r.user_id";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by
/// PostgreSQL through a shared connection pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, name, password, role FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("find_user_by_email error: {:?}", e))
    }

    async fn create_user(&self, user: NewUser) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, name, password, role) VALUES ($1, $2, $3, $4) \
             RETURNING id, email, name, password, role",
        )
        .bind(user.email)
        .bind(user.name)
        .bind(user.password)
        .bind(ROLE_USER)
        .fetch_one(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("create_user error: {:?}", e))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("list_categories error: {:?}", e))
    }

    async fn get_category(&self, id: i32) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("get_category error: {:?}", e))
    }

    async fn create_category(&self, name: String) -> Result<Category, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("create_category error: {:?}", e))
    }

    async fn update_category(
        &self,
        id: i32,
        name: String,
    ) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("update_category error: {:?}", e))
    }

    async fn delete_category(&self, id: i32) -> Result<bool, sqlx::Error> {
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|res| res.rows_affected() > 0)
            .inspect_err(|e| tracing::error!("delete_category error: {:?}", e))
    }

    /// list_ads
    ///
    /// Implements the filtered listing with QueryBuilder for safe
    /// parameterization. Filters are independently optional; the price range
    /// is inclusive on both ends.
    async fn list_ads(&self, query: AdQuery) -> Result<Vec<AdView>, sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(AD_VIEW_SELECT);
        builder.push(" WHERE 1=1");

        if let Some(category_id) = query.category_id {
            builder.push(" AND a.category_id = ");
            builder.push_bind(category_id);
        }
        if let Some(min) = query.min_price {
            builder.push(" AND a.price >= ");
            builder.push_bind(min);
        }
        if let Some(max) = query.max_price {
            builder.push(" AND a.price <= ");
            builder.push_bind(max);
        }

        builder.push(match query.sort {
            AdSort::PriceAsc => " ORDER BY a.price ASC",
            AdSort::PriceDesc => " ORDER BY a.price DESC",
            AdSort::Newest => " ORDER BY a.created_at DESC",
        });

        let rows = builder
            .build_query_as::<AdRow>()
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("list_ads error: {:?}", e))?;

        Ok(rows.into_iter().map(AdRow::into_view).collect())
    }

    async fn get_ad(&self, id: i32) -> Result<Option<AdView>, sqlx::Error> {
        let row = sqlx::query_as::<_, AdRow>(&format!("{} WHERE a.id = $1", AD_VIEW_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("get_ad error: {:?}", e))?;

        Ok(row.map(AdRow::into_view))
    }

    async fn get_ad_record(&self, id: i32) -> Result<Option<Ad>, sqlx::Error> {
        sqlx::query_as::<_, Ad>(
            "SELECT id, title, description, price, category_id, author_id, created_at \
             FROM ads WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("get_ad_record error: {:?}", e))
    }

    async fn create_ad(&self, ad: NewAd, author_id: i32) -> Result<Ad, sqlx::Error> {
        sqlx::query_as::<_, Ad>(
            "INSERT INTO ads (title, description, price, category_id, author_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, title, description, price, category_id, author_id, created_at",
        )
        .bind(ad.title)
        .bind(ad.description)
        .bind(ad.price)
        .bind(ad.category_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("create_ad error: {:?}", e))
    }

    /// update_ad
    ///
    /// Uses COALESCE so that only the supplied fields change; a `None` in
    /// the patch leaves the column at its prior value.
    async fn update_ad(&self, id: i32, patch: UpdateAdRequest) -> Result<Option<Ad>, sqlx::Error> {
        sqlx::query_as::<_, Ad>(
            "UPDATE ads SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                price = COALESCE($4, price), \
                category_id = COALESCE($5, category_id) \
             WHERE id = $1 \
             RETURNING id, title, description, price, category_id, author_id, created_at",
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.price)
        .bind(patch.category_id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("update_ad error: {:?}", e))
    }

    async fn delete_ad(&self, id: i32) -> Result<bool, sqlx::Error> {
        sqlx::query("DELETE FROM ads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|res| res.rows_affected() > 0)
            .inspect_err(|e| tracing::error!("delete_ad error: {:?}", e))
    }

    async fn list_responses_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<ResponseView>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ResponseRow>(&format!(
            "{} WHERE r.user_id = $1 ORDER BY r.id DESC",
            RESPONSE_VIEW_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("list_responses_for_user error: {:?}", e))?;

        Ok(rows.into_iter().map(ResponseRow::into_view).collect())
    }

    async fn get_response(&self, id: i32) -> Result<Option<ResponseView>, sqlx::Error> {
        let row = sqlx::query_as::<_, ResponseRow>(&format!(
            "{} WHERE r.id = $1",
            RESPONSE_VIEW_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("get_response error: {:?}", e))?;

        Ok(row.map(ResponseRow::into_view))
    }

    async fn get_response_record(&self, id: i32) -> Result<Option<AdResponse>, sqlx::Error> {
        sqlx::query_as::<_, AdResponse>(
            "SELECT id, ad_id, user_id, message FROM responses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("get_response_record error: {:?}", e))
    }

    async fn create_response(
        &self,
        ad_id: i32,
        user_id: i32,
        message: String,
    ) -> Result<AdResponse, sqlx::Error> {
        sqlx::query_as::<_, AdResponse>(
            "INSERT INTO responses (ad_id, user_id, message) VALUES ($1, $2, $3) \
             RETURNING id, ad_id, user_id, message",
        )
        .bind(ad_id)
        .bind(user_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("create_response error: {:?}", e))
    }

    async fn update_response(
        &self,
        id: i32,
        message: String,
    ) -> Result<Option<AdResponse>, sqlx::Error> {
        sqlx::query_as::<_, AdResponse>(
            "UPDATE responses SET message = $2 WHERE id = $1 \
             RETURNING id, ad_id, user_id, message",
        )
        .bind(id)
        .bind(message)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("update_response error: {:?}", e))
    }

    async fn delete_response(&self, id: i32) -> Result<bool, sqlx::Error> {
        sqlx::query("DELETE FROM responses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|res| res.rows_affected() > 0)
            .inspect_err(|e| tracing::error!("delete_response error: {:?}", e))
    }
}
