/// Authentication Routes
///
/// Registration, login, token refresh and logout.

use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::audit::AuditLog;
use crate::auth::{
    self, access_token_cookie, hash_password, refresh_token_cookie, removal_cookies, TokenPair,
    REFRESH_TOKEN_COOKIE,
};
use crate::configuration::AuthSettings;
use crate::error::{AppError, ErrorContext, ValidationError};
use crate::middleware::AuthenticatedUser;
use crate::routes::response::ApiResponse;
use crate::store::{NewUser, PublicUser, UserStore};
use crate::validators::{is_valid_email, is_valid_full_name, is_valid_image_url, is_valid_username};

/// User registration request
///
/// `avatar` and `coverImage` are URLs of images already uploaded to the
/// image host.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
}

/// User login request; either `username` or `email` identifies the user
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

fn required(field: &Option<String>) -> Result<&str, ValidationError> {
    match field.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ValidationError::MissingFields),
    }
}

/// JSON response carrying both tokens, with the same tokens set as cookies
fn token_response<T: Serialize>(
    body: ApiResponse<T>,
    tokens: &TokenPair,
    settings: &AuthSettings,
) -> HttpResponse {
    body.builder()
        .cookie(access_token_cookie(
            &tokens.access_token,
            settings.jwt.access_token_expiry,
            &settings.cookie,
        ))
        .cookie(refresh_token_cookie(
            &tokens.refresh_token,
            settings.jwt.refresh_token_expiry,
            &settings.cookie,
        ))
        .json(body)
}

/// POST /api/v1/users/register
///
/// # Errors
/// - 400: a required field is missing or malformed, or the avatar is missing
/// - 409: username or email already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    store: web::Data<dyn UserStore>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let username = required(&form.username)?;
    let email = required(&form.email)?;
    let full_name = required(&form.full_name)?;
    let password = required(&form.password)?;
    let avatar = form
        .avatar
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or(ValidationError::MissingAvatar)?;

    let username = is_valid_username(username)?;
    let email = is_valid_email(email)?;
    let full_name = is_valid_full_name(full_name)?;
    let avatar = is_valid_image_url("avatar", avatar)?;
    let cover_image = match form.cover_image.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => is_valid_image_url("coverImage", url)?,
        _ => String::new(),
    };

    let existing = store
        .find_by_username_or_email(Some(&username), Some(&email))
        .await?;
    if existing.is_some() {
        return Err(AppError::conflict("User with email or username already exists"));
    }

    let password_hash = hash_password(password, settings.password_hash_cost)?;

    let user = store
        .insert_user(NewUser {
            username,
            email,
            full_name,
            avatar,
            cover_image,
            password_hash,
        })
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    AuditLog::success("REGISTER", "User registered")
        .with_user_id(user.id)
        .with_request_id(&context.request_id)
        .record();

    Ok(ApiResponse::new(StatusCode::CREATED, user.to_public(), "User registered successfully")
        .respond())
}

/// POST /api/v1/users/login
///
/// # Errors
/// - 400: neither username nor email given, or password missing
/// - 404: no user with that username/email
/// - 401: wrong password
pub async fn login(
    form: web::Json<LoginRequest>,
    store: web::Data<dyn UserStore>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let password = form
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ValidationError::EmptyField("password".to_string()))?;

    let (user, tokens) = auth::login(
        store.get_ref(),
        form.username.as_deref(),
        form.email.as_deref(),
        password,
        &settings.jwt,
    )
    .await
    .map_err(|e| {
        AuditLog::failure("LOGIN", e.to_string())
            .with_request_id(&context.request_id)
            .record();
        e
    })?;

    AuditLog::success("LOGIN", "User logged in")
        .with_user_id(user.id)
        .with_request_id(&context.request_id)
        .record();

    let body = ApiResponse::ok(
        LoginResponse {
            user,
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
        },
        "User logged in successfully",
    );
    Ok(token_response(body, &tokens, &settings))
}

/// POST /api/v1/users/refresh-token
///
/// Reads the refresh token from the `refreshToken` cookie or the JSON body
/// and rotates it.
///
/// # Errors
/// - 401: token absent, invalid, expired, or no longer the stored one
pub async fn refresh_access_token(
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    store: web::Data<dyn UserStore>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let incoming = req
        .cookie(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| body.and_then(|b| b.into_inner().refresh_token));

    let tokens = auth::refresh(store.get_ref(), incoming.as_deref(), &settings.jwt)
        .await
        .map_err(|e| {
            AuditLog::failure("REFRESH_TOKEN", e.to_string())
                .with_request_id(&context.request_id)
                .record();
            e
        })?;

    AuditLog::success("REFRESH_TOKEN", "Token pair rotated")
        .with_request_id(&context.request_id)
        .record();

    let body = ApiResponse::ok(tokens.clone(), "Access token refreshed");
    Ok(token_response(body, &tokens, &settings))
}

/// POST /api/v1/users/logout
///
/// **Requires authentication.** Clears the stored refresh token and both
/// cookies.
pub async fn logout(
    identity: web::ReqData<AuthenticatedUser>,
    store: web::Data<dyn UserStore>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_logout").with_user_id(identity.id().to_string());

    auth::logout(store.get_ref(), identity.id()).await?;

    AuditLog::success("LOGOUT", "User logged out")
        .with_user_id(identity.id())
        .with_request_id(&context.request_id)
        .record();

    let [access, refresh] = removal_cookies(&settings.cookie);
    Ok(HttpResponse::Ok()
        .cookie(access)
        .cookie(refresh)
        .json(ApiResponse::ok(serde_json::json!({}), "User logged out")))
}
