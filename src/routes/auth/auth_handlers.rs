use actix_web::{web, HttpResponse};
use log::info;
use sqlx::SqlitePool;

use super::auth_models::{
    AccessTokenResponse, LoginRequest, MessageResponse, ProfileUpdateRequest, RegisterRequest,
    TokenResponse,
};
use crate::auth::{AuthenticatedUser, JwtKeys, RefreshIdentity};
use crate::config::Config;
use crate::error::{ApiError, ApiResult, ErrorResponse};
use crate::models::user::NewUser;
use crate::models::{User, UserProfile};
use crate::routes::guards::load_user;
use crate::routes::validate;

fn tokens_for(keys: &JwtKeys, user: &User) -> ApiResult<TokenResponse> {
    Ok(TokenResponse {
        access_token: keys.access_token(user.id)?,
        refresh_token: keys.refresh_token(user.id)?,
        user: user.profile(),
    })
}

// Handler to register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = TokenResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "User already exists", body = ErrorResponse)
    ),
    tags = ["auth"],
    security([])
)]
pub async fn register(
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    keys: web::Data<JwtKeys>,
    request: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let request = request.into_inner();
    validate::length("username", &request.username, 3, 80)?;
    validate::email(&request.email)?;
    validate::length("full_name", &request.full_name, 1, 200)?;
    validate::min_length("password", &request.password, 6)?;

    if User::find_by_username(&pool, &request.username).await?.is_some() {
        info!("Registration rejected, username taken: {}", request.username);
        return Err(ApiError::Conflict("Username already exists".into()));
    }
    if User::find_by_email(&pool, &request.email).await?.is_some() {
        info!("Registration rejected, email taken: {}", request.email);
        return Err(ApiError::Conflict("Email already exists".into()));
    }

    let user = User::create(
        &pool,
        NewUser {
            username: &request.username,
            email: &request.email,
            full_name: &request.full_name,
            password: &request.password,
        },
        config.bcrypt_cost,
    )
    .await?;

    info!("User registered: {} ({})", user.username, user.id);
    Ok(HttpResponse::Created().json(tokens_for(&keys, &user)?))
}

// Handler to log in and issue a token pair
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tags = ["auth"],
    security([])
)]
pub async fn login(
    pool: web::Data<SqlitePool>,
    keys: web::Data<JwtKeys>,
    request: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    validate::required("username", &request.username)?;
    validate::required("password", &request.password)?;

    let user = match User::find_by_username(&pool, &request.username).await? {
        Some(user) if user.check_password(&request.password) => user,
        _ => {
            info!("Failed login for username: {}", request.username);
            return Err(ApiError::Unauthorized("Invalid username or password".into()));
        }
    };
    if !user.is_active {
        info!("Login refused for deactivated user {}", user.id);
        return Err(ApiError::Unauthorized("Account is deactivated".into()));
    }

    info!("User logged in: {}", user.username);
    Ok(HttpResponse::Ok().json(tokens_for(&keys, &user)?))
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tags = ["auth"]
)]
pub async fn get_profile(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
) -> ApiResult<web::Json<UserProfile>> {
    let user = load_user(&pool, identity.user_id).await?;
    Ok(web::Json(user.profile()))
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated user", body = UserProfile),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse)
    ),
    tags = ["auth"]
)]
pub async fn update_profile(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    request: web::Json<ProfileUpdateRequest>,
) -> ApiResult<web::Json<UserProfile>> {
    let user = load_user(&pool, identity.user_id).await?;
    let request = request.into_inner();

    if let Some(full_name) = &request.full_name {
        validate::length("full_name", full_name, 1, 200)?;
    }
    if let Some(email) = &request.email {
        validate::email(email)?;
        if let Some(existing) = User::find_by_email(&pool, email).await? {
            if existing.id != user.id {
                return Err(ApiError::Conflict("Email already exists".into()));
            }
        }
    }

    let full_name = request.full_name.unwrap_or_else(|| user.full_name.clone());
    let email = request.email.unwrap_or_else(|| user.email.clone());
    User::update_profile(&pool, user.id, &full_name, &email).await?;
    info!("Profile updated for user {}", user.id);

    let user = load_user(&pool, user.id).await?;
    Ok(web::Json(user.profile()))
}

// Handler to exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 401, description = "Invalid refresh token", body = ErrorResponse)
    ),
    tags = ["auth"]
)]
pub async fn refresh(
    pool: web::Data<SqlitePool>,
    keys: web::Data<JwtKeys>,
    identity: RefreshIdentity,
) -> ApiResult<web::Json<AccessTokenResponse>> {
    match User::find_by_id(&pool, identity.user_id).await? {
        Some(user) if user.is_active => Ok(web::Json(AccessTokenResponse {
            access_token: keys.access_token(user.id)?,
        })),
        _ => Err(ApiError::Unauthorized(
            "Invalid user or account deactivated".into(),
        )),
    }
}

// Tokens are stateless; the client discards them.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    ),
    tags = ["auth"]
)]
pub async fn logout(identity: AuthenticatedUser) -> web::Json<MessageResponse> {
    info!("User {} logged out", identity.user_id);
    web::Json(MessageResponse {
        message: "Successfully logged out".into(),
    })
}
