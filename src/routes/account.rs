/// Account Routes
///
/// Everything here sits behind `JwtMiddleware`; the acting user always
/// comes from the verified request context.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::audit::AuditLog;
use crate::auth::hash_password;
use crate::configuration::AuthSettings;
use crate::error::{AppError, ErrorContext, ValidationError};
use crate::middleware::AuthenticatedUser;
use crate::routes::response::ApiResponse;
use crate::store::UserStore;
use crate::validators::{is_valid_email, is_valid_full_name};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// POST /api/v1/users/change-password
///
/// # Errors
/// - 400: a field is missing, the old password is wrong, or the new one is
///   too short/long
pub async fn change_password(
    identity: web::ReqData<AuthenticatedUser>,
    form: web::Json<ChangePasswordRequest>,
    store: web::Data<dyn UserStore>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("change_password").with_user_id(identity.id().to_string());

    let (old_password, new_password) = match (&form.old_password, &form.new_password) {
        (Some(old), Some(new)) if !old.is_empty() && !new.is_empty() => (old, new),
        _ => return Err(ValidationError::MissingFields.into()),
    };

    let user = store
        .find_by_id(identity.id())
        .await?
        .ok_or_else(|| AppError::not_found("User does not exist"))?;

    if !user.verify_password(old_password)? {
        AuditLog::failure("CHANGE_PASSWORD", "Old password did not match")
            .with_user_id(user.id)
            .with_request_id(&context.request_id)
            .record();
        return Err(ValidationError::InvalidOldPassword.into());
    }

    let password_hash = hash_password(new_password, settings.password_hash_cost)?;
    store.update_password(user.id, &password_hash).await?;

    AuditLog::success("CHANGE_PASSWORD", "Password changed")
        .with_user_id(user.id)
        .with_request_id(&context.request_id)
        .record();

    Ok(ApiResponse::ok(serde_json::json!({}), "Password changed successfully").respond())
}

/// GET /api/v1/users/current-user
pub async fn current_user(identity: web::ReqData<AuthenticatedUser>) -> HttpResponse {
    ApiResponse::ok(identity.into_inner().into_inner(), "Current user fetched successfully")
        .respond()
}

/// PATCH /api/v1/users/update-account
///
/// # Errors
/// - 400: fullName or email missing or malformed
/// - 409: email belongs to another user
pub async fn update_account(
    identity: web::ReqData<AuthenticatedUser>,
    form: web::Json<UpdateAccountRequest>,
    store: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("update_account").with_user_id(identity.id().to_string());

    let (full_name, email) = match (&form.full_name, &form.email) {
        (Some(name), Some(email)) if !name.trim().is_empty() && !email.trim().is_empty() => {
            (is_valid_full_name(name)?, is_valid_email(email)?)
        }
        _ => return Err(ValidationError::MissingFields.into()),
    };

    let user = store
        .update_account(identity.id(), &full_name, &email)
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?
        .ok_or_else(|| AppError::not_found("User does not exist"))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "Account details updated"
    );

    Ok(ApiResponse::ok(user.to_public(), "Account details updated successfully").respond())
}
