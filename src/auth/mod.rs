/// Authentication module
///
/// JWT generation/validation, password hashing, refresh-token storage
/// helpers, auth cookies, and the token lifecycle built on top of them.

mod claims;
mod cookies;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use claims::{AccessClaims, RefreshClaims};
pub use cookies::{
    access_token_cookie, refresh_token_cookie, removal_cookies, CookieSameSite, CookieSettings,
    ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
pub use jwt::{
    generate_access_token, generate_refresh_token, validate_access_token, validate_refresh_token,
};
pub use password::{hash_password, verify_password};
pub use refresh_token::{hash_refresh_token, refresh_token_matches};
pub use session::{authenticate, issue_tokens, login, logout, refresh, TokenPair};
