//! Application settings loaded from environment variables.

use std::env;

use super::constants::{
    DEFAULT_APP_ENV, DEFAULT_CORS_ORIGINS, DEFAULT_DATABASE_URL, DEFAULT_JWT_EXPIRATION_HOURS,
    DEFAULT_REDIS_URL, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_SMTP_PORT,
    MIN_JWT_SECRET_LENGTH,
};

/// SMTP settings for outgoing mail
#[derive(Clone, Default)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pass: Option<String>,
    /// Implicit TLS (port 465 style) instead of STARTTLS
    pub secure: bool,
    pub from: Option<String>,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("pass", &"[REDACTED]")
            .field("secure", &self.secure)
            .field("from", &self.from)
            .finish()
    }
}

impl SmtpConfig {
    fn from_env() -> Self {
        Self {
            host: env::var("SMTP_HOST").ok().filter(|v| !v.is_empty()),
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            user: env::var("SMTP_USER").ok().filter(|v| !v.is_empty()),
            pass: env::var("SMTP_PASS").ok().filter(|v| !v.is_empty()),
            secure: env::var("SMTP_SECURE")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            from: env::var("MAIL_FROM").ok().filter(|v| !v.is_empty()),
        }
    }

    /// Names of the variables that are required but absent.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.host.is_none() {
            missing.push("SMTP_HOST");
        }
        if self.user.is_none() {
            missing.push("SMTP_USER");
        }
        if self.pass.is_none() {
            missing.push("SMTP_PASS");
        }
        missing
    }

    pub fn is_configured(&self) -> bool {
        self.missing().is_empty()
    }

    pub fn password(&self) -> Option<&str> {
        self.pass.as_deref()
    }

    /// Sender address, falling back to the SMTP login.
    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref().or(self.user.as_deref())
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    /// Emails that are promoted to admin on federated sign-in (lowercase)
    pub admin_emails: Vec<String>,
    /// Firebase project id; federated sign-in is disabled when unset
    pub firebase_project_id: Option<String>,
    pub cors_origins: Vec<String>,
    pub smtp: SmtpConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("environment", &self.environment)
            .field("admin_emails", &self.admin_emails.len())
            .field("firebase_project_id", &self.firebase_project_id)
            .field("cors_origins", &self.cors_origins)
            .field("smtp", &self.smtp)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if JWT_SECRET is not set or is too short (security requirement).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                // Development mode: use default but warn
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                "dev-secret-key-minimum-32-chars!!".to_string()
            } else {
                panic!("JWT_SECRET environment variable must be set in production");
            }
        });

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            panic!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            jwt_secret,
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_JWT_EXPIRATION_HOURS),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            environment: env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_APP_ENV.to_string()),
            admin_emails: split_list(&env::var("ADMIN_EMAILS").unwrap_or_default())
                .into_iter()
                .map(|e| e.to_lowercase())
                .collect(),
            firebase_project_id: env::var("FIREBASE_PROJECT_ID")
                .ok()
                .filter(|v| !v.is_empty()),
            cors_origins: split_list(
                &env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
            ),
            smtp: SmtpConfig::from_env(),
        }
    }

    /// Minimal configuration for tests and tooling.
    pub fn for_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            jwt_secret: jwt_secret.into(),
            jwt_expiration_hours: DEFAULT_JWT_EXPIRATION_HOURS,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            environment: DEFAULT_APP_ENV.to_string(),
            admin_emails: Vec::new(),
            firebase_project_id: None,
            cors_origins: split_list(DEFAULT_CORS_ORIGINS),
            smtp: SmtpConfig {
                port: DEFAULT_SMTP_PORT,
                ..SmtpConfig::default()
            },
        }
    }

    /// Get JWT secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_trims_and_drops_empty() {
        assert_eq!(
            split_list(" a@x.com, ,b@y.com ,"),
            vec!["a@x.com".to_string(), "b@y.com".to_string()]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_smtp_missing_lists_required_vars() {
        let smtp = SmtpConfig {
            host: Some("smtp.example.com".to_string()),
            ..SmtpConfig::default()
        };
        assert_eq!(smtp.missing(), vec!["SMTP_USER", "SMTP_PASS"]);
        assert!(!smtp.is_configured());
    }

    #[test]
    fn test_sender_falls_back_to_user() {
        let smtp = SmtpConfig {
            user: Some("shop@example.com".to_string()),
            ..SmtpConfig::default()
        };
        assert_eq!(smtp.sender(), Some("shop@example.com"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::for_secret("test-secret-key-for-testing-only-32chars");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("test-secret-key"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
