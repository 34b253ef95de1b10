use anyhow::{anyhow, Result};
use std::net::SocketAddr;
use std::str::FromStr;

pub const DEFAULT_VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/webm",
    "video/ogg",
    "video/avi",
    "video/mov",
    "video/quicktime",
    "video/x-matroska",
    "video/3gpp",
    "video/3gpp2",
];

/// How admin routes are gated. There is no implicit environment bypass:
/// the check only goes away when `ADMIN_AUTH=disabled` is set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminAuthMode {
    Required,
    Disabled,
}

impl FromStr for AdminAuthMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "required" => Ok(Self::Required),
            "disabled" => Ok(Self::Disabled),
            other => Err(format!("expected `required` or `disabled`, got `{}`", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connect_timeout_seconds: u64,
    pub db_idle_timeout_seconds: u64,
    pub db_max_lifetime_seconds: u64,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_bucket: String,
    pub s3_public_base_url: String,
    pub video_key_prefix: String,
    pub admin_auth: AdminAuthMode,
    pub admin_token: Option<String>,
    pub allowed_origins: Vec<String>,
    pub max_file_size: u64,
    pub allowed_video_types: Vec<String>,
    pub static_dir: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let http_addr = match std::env::var("PORT") {
            Ok(port) if std::env::var("HTTP_ADDR").is_err() => {
                let port: u16 = port
                    .parse()
                    .map_err(|err| anyhow!("invalid PORT: {}", err))?;
                format!("0.0.0.0:{}", port)
            }
            _ => env_or("HTTP_ADDR", "0.0.0.0:3000"),
        };
        SocketAddr::from_str(&http_addr)
            .map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))?;

        let s3_endpoint = env_or_err("S3_ENDPOINT")?;
        let s3_bucket = env_or("S3_BUCKET", "review-media");
        let s3_public_base_url = std::env::var("S3_PUBLIC_BASE_URL").unwrap_or_else(|_| {
            format!("{}/{}", s3_endpoint.trim_end_matches('/'), s3_bucket)
        });
        url::Url::parse(&s3_public_base_url)
            .map_err(|err| anyhow!("invalid S3_PUBLIC_BASE_URL: {}", err))?;

        let admin_token = std::env::var("ADMIN_TOKEN")
            .or_else(|_| std::env::var("ADMIN_DASHBOARD_TOKEN"))
            .ok()
            .filter(|token| !token.trim().is_empty());

        let allowed_video_types = match std::env::var("ALLOWED_VIDEO_TYPES") {
            Ok(value) => split_list(&value),
            Err(_) => DEFAULT_VIDEO_TYPES.iter().map(|t| t.to_string()).collect(),
        };
        if allowed_video_types.is_empty() {
            return Err(anyhow!("invalid ALLOWED_VIDEO_TYPES: list is empty"));
        }

        Ok(Self {
            http_addr,
            database_url: env_or_err("DATABASE_URL")?,
            db_max_connections: env_or_parse("DB_MAX_CONNECTIONS", "10")?,
            db_connect_timeout_seconds: env_or_parse("DB_CONNECT_TIMEOUT_SECONDS", "5")?,
            db_idle_timeout_seconds: env_or_parse("DB_IDLE_TIMEOUT_SECONDS", "300")?,
            db_max_lifetime_seconds: env_or_parse("DB_MAX_LIFETIME_SECONDS", "1800")?,
            s3_endpoint,
            s3_region: env_or("S3_REGION", "us-east-1"),
            s3_bucket,
            s3_public_base_url,
            video_key_prefix: env_or("VIDEO_KEY_PREFIX", "review-videos"),
            admin_auth: env_or_parse("ADMIN_AUTH", "required")?,
            admin_token,
            allowed_origins: split_list(&env_or("ALLOWED_ORIGINS", "http://localhost:3000")),
            max_file_size: env_or_parse("MAX_FILE_SIZE", "52428800")?,
            allowed_video_types,
            static_dir: std::env::var("STATIC_DIR").ok().filter(|dir| !dir.is_empty()),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_err(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing required env var: {}", key))
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
