use config::ConfigError;

use crate::auth::CookieSettings;

const MIN_SECRET_LENGTH: usize = 32;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Everything the token lifecycle and the auth handlers need at request time
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub jwt: JwtSettings,
    #[serde(default)]
    pub cookie: CookieSettings,
    #[serde(default = "default_password_hash_cost")]
    pub password_hash_cost: u32,
}

fn default_password_hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

/// JWT signing settings
///
/// Access and refresh tokens are signed with separate secrets so either
/// family can be invalidated on its own by rotating its secret.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub access_token_secret: String,
    pub access_token_expiry: i64,   // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_secret: String,
    pub refresh_token_expiry: i64,  // seconds (e.g., 864000 for 10 days)
    pub issuer: String,
}

impl JwtSettings {
    /// Reject secrets that are too short or shared between token families
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token_secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "auth.jwt.access_token_secret must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }
        if self.refresh_token_secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "auth.jwt.refresh_token_secret must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }
        if self.access_token_secret == self.refresh_token_secret {
            return Err(ConfigError::Message(
                "access and refresh tokens must use different secrets".to_string(),
            ));
        }
        if self.access_token_expiry <= 0 || self.refresh_token_expiry <= 0 {
            return Err(ConfigError::Message(
                "token expiry must be a positive number of seconds".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load `configuration.yaml` (optional) and `APP_*` environment overrides,
/// e.g. `APP_AUTH__JWT__ACCESS_TOKEN_SECRET`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.auth.jwt.validate()?;
    Ok(settings)
}
