/// Authentication Routes
///
/// User registration, login, and the authenticated profile read.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{hash_password, issue_token, verify_password, Claims};
use crate::configuration::JwtSettings;
use crate::error::ApiError;
use crate::models::{Role, RoleRecord, UserRecord};
use crate::validators::{is_valid_email, is_valid_name, is_valid_password};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

/// POST /v1/auth/register
///
/// Creates a user with the default CUSTOMER role and returns an access
/// token.
///
/// # Errors
/// - 400: invalid email, name, or password
/// - 422: email already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, ApiError> {
    let email = is_valid_email(&form.email)?;
    let name = is_valid_name(&form.name)?;
    let password = is_valid_password(&form.password)?;

    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool.get_ref())
        .await?;
    if existing.is_some() {
        return Err(ApiError::EmailAlreadyTaken { email });
    }

    let password_hash = hash_password(&password)?;

    // New registrations always land on the lowest-privilege role.
    let role = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM roles WHERE name = $1")
        .bind(Role::Customer.as_str())
        .fetch_one(pool.get_ref())
        .await?;

    let user_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (name, email, password_hash, role_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $5)
        RETURNING id
        "#,
    )
    .bind(&name)
    .bind(&email)
    .bind(&password_hash)
    .bind(role.0)
    .bind(Utc::now())
    .fetch_one(pool.get_ref())
    .await?;

    let user = UserRecord {
        id: user_id,
        name,
        email,
        image: None,
        role: RoleRecord {
            id: role.0,
            name: Role::parse(&role.1)?,
        },
    };
    let access_token = issue_token(&Claims::from_user(&user), jwt_config.get_ref())?;

    tracing::info!(user_id = user.id, "User registered");

    Ok(HttpResponse::Created().json(TokenResponse { access_token }))
}

/// POST /v1/auth/login
///
/// Verifies credentials and returns an access token.
///
/// # Errors
/// - 400: invalid email format
/// - 404: email not registered
/// - 401: wrong password
pub async fn login(
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, ApiError> {
    let email = is_valid_email(&form.email)?;

    let row = sqlx::query_as::<_, (i64, String, String, Option<String>, String, i64, String)>(
        r#"
        SELECT u.id, u.name, u.email, u.image, u.password_hash, r.id, r.name
        FROM users u
        JOIN roles r ON r.id = u.role_id
        WHERE u.email = $1
        "#,
    )
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(ApiError::EmailNotRegistered { email })?;

    let (user_id, name, email, image, password_hash, role_id, role_name) = row;

    if !verify_password(&form.password, &password_hash) {
        return Err(ApiError::WrongPassword);
    }

    let user = UserRecord {
        id: user_id,
        name,
        email,
        image,
        role: RoleRecord {
            id: role_id,
            name: Role::parse(&role_name)?,
        },
    };
    let access_token = issue_token(&Claims::from_user(&user), jwt_config.get_ref())?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(HttpResponse::Created().json(TokenResponse { access_token }))
}

/// GET /v1/auth/whoami
///
/// Returns the authenticated user's record. Claims are injected by the
/// auth guard.
///
/// # Errors
/// - 401: missing/invalid token (handled by the guard)
/// - 404: user or role no longer present
pub async fn whoami(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let row = sqlx::query_as::<_, (i64, String, String, Option<String>, i64, String)>(
        r#"
        SELECT u.id, u.name, u.email, u.image, r.id, r.name
        FROM users u
        JOIN roles r ON r.id = u.role_id
        WHERE u.id = $1
        "#,
    )
    .bind(claims.id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::RecordNotFound {
        name: "User".to_string(),
    })?;

    let (user_id, name, email, image, role_id, role_name) = row;

    Ok(HttpResponse::Ok().json(UserRecord {
        id: user_id,
        name,
        email,
        image,
        role: RoleRecord {
            id: role_id,
            name: Role::parse(&role_name)?,
        },
    }))
}
