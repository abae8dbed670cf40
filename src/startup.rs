use actix_web::dev::Server;
use actix_web::error::JsonPayloadError;
use actix_web::{middleware::Logger, web, App, HttpRequest, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::configuration::AuthSettings;
use crate::error::{AppError, ValidationError};
use crate::middleware::JwtMiddleware;
use crate::routes::{
    change_password, channel_profile, current_user, health_check, login, logout,
    refresh_access_token, register, update_account, watch_history,
};
use crate::store::UserStore;

/// Malformed JSON bodies get the same error envelope as every other failure
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, "Rejected request body");
    AppError::Validation(ValidationError::InvalidFormat("request body".to_string())).into()
}

pub fn run(
    listener: TcpListener,
    store: Arc<dyn UserStore>,
    auth_settings: AuthSettings,
) -> Result<Server, std::io::Error> {
    let store_data: web::Data<dyn UserStore> = web::Data::from(store.clone());
    let auth_data = web::Data::new(auth_settings.clone());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())

            // Shared state
            .app_data(store_data.clone())
            .app_data(auth_data.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))

            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/v1/users")
                    // Public routes (no authentication required)
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh-token", web::post().to(refresh_access_token))

                    // Protected routes (require a valid access token)
                    .service(
                        web::scope("")
                            .wrap(JwtMiddleware::new(auth_settings.jwt.clone(), store.clone()))
                            .route("/logout", web::post().to(logout))
                            .route("/change-password", web::post().to(change_password))
                            .route("/current-user", web::get().to(current_user))
                            .route("/update-account", web::patch().to(update_account))
                            .route("/c/{username}", web::get().to(channel_profile))
                            .route("/history", web::get().to(watch_history)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
