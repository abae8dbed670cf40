/// Auth cookies
///
/// Login and refresh deliver both tokens as http-only cookies in addition
/// to the JSON body; logout sends removal cookies for both.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use serde::Deserialize;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieSameSite {
    Strict,
    Lax,
    None,
}

impl From<CookieSameSite> for SameSite {
    fn from(value: CookieSameSite) -> Self {
        match value {
            CookieSameSite::Strict => SameSite::Strict,
            CookieSameSite::Lax => SameSite::Lax,
            CookieSameSite::None => SameSite::None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieSettings {
    /// Should only be turned off for local development over plain HTTP
    pub secure: bool,
    pub same_site: CookieSameSite,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true,
            same_site: CookieSameSite::Lax,
        }
    }
}

fn build_cookie(
    name: &'static str,
    value: String,
    max_age_secs: i64,
    settings: &CookieSettings,
) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .secure(settings.secure)
        .same_site(settings.same_site.into())
        .max_age(Duration::seconds(max_age_secs))
        .finish()
}

pub fn access_token_cookie(
    token: &str,
    max_age_secs: i64,
    settings: &CookieSettings,
) -> Cookie<'static> {
    build_cookie(ACCESS_TOKEN_COOKIE, token.to_string(), max_age_secs, settings)
}

pub fn refresh_token_cookie(
    token: &str,
    max_age_secs: i64,
    settings: &CookieSettings,
) -> Cookie<'static> {
    build_cookie(REFRESH_TOKEN_COOKIE, token.to_string(), max_age_secs, settings)
}

/// Expired, empty cookies that make the browser drop both tokens
pub fn removal_cookies(settings: &CookieSettings) -> [Cookie<'static>; 2] {
    [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE].map(|name| {
        let mut cookie = build_cookie(name, String::new(), 0, settings);
        cookie.make_removal();
        cookie
    })
}
