use std::env;

/// Environment configuration
/// Loads and validates environment variables
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expires_in_days: i64,
    pub frontend_url: Option<String>,
    pub reminder_hour: u32,
    pub mail: MailConfig,
    pub storage: StorageConfig,
}

pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub smtp_from: String,
    pub timeout_secs: u64,
}

pub struct StorageConfig {
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    /// Custom endpoint for S3-compatible stores (MinIO etc.); path-style URLs.
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(3000);

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET must be set".to_string())?;

        let jwt_expires_in_days = env::var("JWT_EXPIRES_IN_DAYS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(7);

        let frontend_url = env::var("FRONTEND_URL").ok();

        let reminder_hour = env::var("REMINDER_HOUR")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|h| *h < 24)
            .unwrap_or(9);

        let mail = MailConfig {
            smtp_host: env::var("SMTP_HOST")
                .map_err(|_| "SMTP_HOST must be set".to_string())?,
            smtp_port: env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(587),
            smtp_user: env::var("SMTP_USER")
                .map_err(|_| "SMTP_USER must be set".to_string())?,
            smtp_pass: env::var("SMTP_PASS")
                .map_err(|_| "SMTP_PASS must be set".to_string())?,
            smtp_from: env::var("SMTP_FROM")
                .map_err(|_| "SMTP_FROM must be set".to_string())?,
            timeout_secs: env::var("SMTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };

        let storage = StorageConfig {
            region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            bucket: env::var("S3_BUCKET")
                .map_err(|_| "S3_BUCKET must be set".to_string())?,
            access_key: env::var("S3_ACCESS_KEY")
                .map_err(|_| "S3_ACCESS_KEY must be set".to_string())?,
            secret_key: env::var("S3_SECRET_KEY")
                .map_err(|_| "S3_SECRET_KEY must be set".to_string())?,
            endpoint: env::var("S3_ENDPOINT").ok(),
            timeout_secs: env::var("S3_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
        };

        Ok(Self {
            port,
            database_url,
            jwt_secret,
            jwt_expires_in_days,
            frontend_url,
            reminder_hour,
            mail,
            storage,
        })
    }
}
