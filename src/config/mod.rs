pub mod oauth;

use std::env;

use anyhow::{anyhow, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use oauth::GoogleOAuthConfig;

/// Runtime environment name. Only `development` unlocks stack traces in error
/// responses; everything else behaves like production.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value {
            "production" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }

    pub fn is_development(self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Process configuration, read once at startup and treated as immutable.
/// Cloned into router state rather than looked up ambiently.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub allowed_origins: Vec<String>,
    pub oauth: GoogleOAuthConfig,
    pub database_pool: PgPool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let environment = Environment::parse(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let port = required("PORT")?
            .parse()
            .map_err(|_| anyhow!("PORT must be a valid port number"))?;

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let oauth = GoogleOAuthConfig {
            client_id: required("GOOGLE_CLIENT_ID")?,
            client_secret: required("GOOGLE_CLIENT_SECRET")?,
            callback_url: env::var("OAUTH_CALLBACK_URL")
                .unwrap_or_else(|_| "http://localhost:3000/auth/google/callback".to_string()),
        };

        // Lazy pool: construction never blocks on the database, connections are
        // established on first use.
        let database_pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(&database_url)?;

        crate::middleware::error_handling::set_environment(environment);

        Ok(Self {
            environment,
            port,
            database_url,
            jwt_secret,
            allowed_origins,
            oauth,
            database_pool,
        })
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| anyhow!("Missing required environment variable: {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_known_names_and_defaults_to_development() {
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse("test"), Environment::Test);
        assert_eq!(Environment::parse("development"), Environment::Development);
        assert_eq!(Environment::parse("staging"), Environment::Development);
        assert!(Environment::Development.is_development());
        assert!(!Environment::Production.is_development());
    }
}
