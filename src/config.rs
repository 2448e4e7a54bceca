use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Mark the session cookie `Secure`. Needs HTTPS in front.
    pub secure_cookies: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:data/learnlog.db".into()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: match std::env::var("APP_PORT") {
                Ok(v) => v.parse()?,
                Err(_) => 5003,
            },
            secure_cookies: std::env::var("SECURE_COOKIES")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
