use actix_web::{web, HttpResponse};

use crate::error::{AppError, ValidationError};
use crate::middleware::AuthenticatedUser;
use crate::routes::response::ApiResponse;
use crate::store::UserStore;

/// GET /api/v1/users/c/{username}
///
/// Channel profile with subscriber counts, as seen by the requesting user.
pub async fn channel_profile(
    identity: web::ReqData<AuthenticatedUser>,
    path: web::Path<String>,
    store: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let username = path.trim().to_lowercase();
    if username.is_empty() {
        return Err(ValidationError::MissingUsername.into());
    }

    let profile = store
        .find_channel_profile(&username, identity.id())
        .await?
        .ok_or_else(|| AppError::not_found("channel does not exist"))?;

    Ok(ApiResponse::ok(profile, "User channel fetched successfully").respond())
}

/// GET /api/v1/users/history
pub async fn watch_history(
    identity: web::ReqData<AuthenticatedUser>,
    store: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let history = store.watch_history(identity.id()).await?;

    Ok(ApiResponse::ok(history, "Watch history fetched successfully").respond())
}
