use actix_web::HttpResponse;

/// GET /health_check
///
/// Liveness only: answers without touching the user store.
pub async fn health_check() -> HttpResponse {
    tracing::debug!("Health check");
    HttpResponse::Ok().finish()
}
