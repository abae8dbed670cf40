mod account;
mod auth;
mod channel;
mod health_check;
mod response;

pub use account::{change_password, current_user, update_account};
pub use auth::{login, logout, refresh_access_token, register};
pub use channel::{channel_profile, watch_history};
pub use health_check::health_check;
pub use response::ApiResponse;
