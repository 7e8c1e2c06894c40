use config::ConfigError;
use std::path::PathBuf;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub tokens: TokenSettings,
    pub media: MediaSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Limit for JSON and urlencoded bodies, in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    #[serde(default = "default_static_root")]
    pub static_root: PathBuf,
    /// Where multipart uploads are staged before they are sent to the media host
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
}

fn default_body_limit() -> usize {
    16 * 1024
}

fn default_static_root() -> PathBuf {
    PathBuf::from("./public")
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./public/temp")
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    /// Server-level connection, used to create throwaway databases in tests
    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Signing settings for access and refresh tokens.
///
/// The two token classes never share a secret: an access token must not be
/// accepted where a refresh token is expected and vice versa.
#[derive(serde::Deserialize, Clone)]
pub struct TokenSettings {
    #[serde(default)]
    pub access_token_secret: String,
    pub access_token_expiry: i64,   // seconds (e.g., 900 for 15 minutes)
    #[serde(default)]
    pub refresh_token_secret: String,
    pub refresh_token_expiry: i64,  // seconds (e.g., 864000 for 10 days)
    pub issuer: String,
}

/// Remote media host credentials
#[derive(serde::Deserialize, Clone)]
pub struct MediaSettings {
    pub base_url: String,
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    #[serde(default = "default_media_timeout")]
    pub timeout_ms: u64,
}

fn default_media_timeout() -> u64 {
    10_000
}

impl MediaSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

/// Load settings from an optional `configuration` file in the working
/// directory, overridden by `APP_`-prefixed environment variables
/// (`APP_TOKENS__ACCESS_TOKEN_SECRET=...`).
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
