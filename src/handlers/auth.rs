// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, ErrorCode},
    models::{
        answer::SuccessResponse,
        user::{AuthResponse, LoginRequest, MeResponse, SetExamRequest, SignupRequest, User, UserSummary},
    },
    utils::{
        extract::AppJson,
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_jwt},
    },
};

const USER_COLUMNS: &str = "id, email, password_hash, exam_id, role, created_at";

/// Emails are stored and looked up in a single canonical form.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn invalid_credentials() -> AppError {
    AppError::AuthError(ErrorCode::InvalidCredentials, "Invalid credentials".to_string())
}

/// Registers a new user and signs them in.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with `{user, token}`; a taken email is `AUTH_005`.
pub async fn signup(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let email = normalize_email(&payload.email);
    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (email, password_hash) VALUES (?, ?) RETURNING {USER_COLUMNS}"
    ))
    .bind(&email)
    .bind(&hashed_password)
    .fetch_one(&pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::AuthError(
            ErrorCode::DuplicateAccount,
            format!("An account for '{}' already exists", email),
        ),
        other => {
            tracing::error!("Failed to register user: {:?}", other);
            other
        }
    })?;

    let token = sign_jwt(
        user.id,
        &user.email,
        &user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    tracing::info!(user_id = user.id, "New account created");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserSummary {
                id: user.id,
                email: user.email,
            },
            token,
        }),
    ))
}

/// Authenticates a user and returns a JWT token.
///
/// Unknown email and wrong password are indistinguishable (`AUTH_004`).
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(normalize_email(&payload.email))
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::from(e)
    })?
    .ok_or_else(invalid_credentials)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(invalid_credentials());
    }

    let token = sign_jwt(
        user.id,
        &user.email,
        &user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(AuthResponse {
        user: UserSummary {
            id: user.id,
            email: user.email,
        },
        token,
    }))
}

/// Profile of the authenticated user, read fresh from the database.
pub async fn me(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(claims.user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse {
        id: user.id,
        email: user.email,
        role: user.role,
        exam_id: user.exam_id,
    }))
}

/// Sets (or clears, with `exam_id: null`) the user's preparation exam.
pub async fn set_exam(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<SetExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(exam_id) = payload.exam_id {
        sqlx::query_scalar::<_, i64>("SELECT id FROM exams WHERE id = ?")
            .bind(exam_id)
            .fetch_optional(&pool)
            .await?
            .ok_or(AppError::NotFound("Exam not found".to_string()))?;
    }

    sqlx::query("UPDATE users SET exam_id = ? WHERE id = ?")
        .bind(payload.exam_id)
        .bind(claims.user_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to set exam for user {}: {:?}", claims.user_id, e);
            AppError::from(e)
        })?;

    Ok(Json(SuccessResponse::ok()))
}
