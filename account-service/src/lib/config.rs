use std::env;
use std::fmt;

use config::builder::DefaultState;
use config::Config as ConfigBuilder;
use config::ConfigBuilder as Builder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password: PasswordConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub http_port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub token_ttl_minutes: i64,
}

// Keeps the secret out of `Debug` output.
impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"***")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .finish()
    }
}

/// Argon2 cost parameters. Defaults match the `argon2` crate's recommendation.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// One year.
const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

fn default_max_connections() -> u32 {
    5
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. `JWT_SECRET` for the signing secret
    /// 2. Environment variables (APP__DATABASE__URL, APP__SERVER__HTTP_PORT, etc.)
    /// 3. Environment-specific config file (config/{environment}.toml)
    /// 4. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let builder = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: APP__DATABASE__URL=sqlite://... overrides database.url
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .set_override_option("jwt.secret", env::var("JWT_SECRET").ok())?;

        Self::try_from_builder(builder)
    }

    /// Build and validate a configuration from an assembled builder.
    pub fn try_from_builder(builder: Builder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "jwt.secret must be set (JWT_SECRET)".to_string(),
            ));
        }
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&self.jwt.token_ttl_minutes) {
            return Err(ConfigError::Message(format!(
                "jwt.token_ttl_minutes must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_MINUTES, self.jwt.token_ttl_minutes
            )));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "database.max_connections must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    const BASE: &str = r#"
        [database]
        url = "sqlite::memory:"

        [server]
        http_port = 8080

        [jwt]
        token_ttl_minutes = 60
    "#;

    fn builder(toml: &str) -> Builder<DefaultState> {
        ConfigBuilder::builder().add_source(File::from_str(toml, FileFormat::Toml))
    }

    #[test]
    fn test_defaults_are_applied() {
        let config =
            Config::try_from_builder(builder(BASE).set_override("jwt.secret", "s3cret").unwrap())
                .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.password, PasswordConfig::default());
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        assert!(Config::try_from_builder(builder(BASE)).is_err());
    }

    #[test]
    fn test_blank_secret_is_rejected() {
        let result =
            Config::try_from_builder(builder(BASE).set_override("jwt.secret", "  ").unwrap());

        assert!(matches!(result, Err(ConfigError::Message(_))));
    }

    #[test]
    fn test_non_positive_ttl_is_rejected() {
        let result = Config::try_from_builder(
            builder(BASE)
                .set_override("jwt.secret", "s3cret")
                .unwrap()
                .set_override("jwt.token_ttl_minutes", 0)
                .unwrap(),
        );

        assert!(matches!(result, Err(ConfigError::Message(_))));
    }

    #[test]
    fn test_oversized_ttl_is_rejected() {
        let result = Config::try_from_builder(
            builder(BASE)
                .set_override("jwt.secret", "s3cret")
                .unwrap()
                .set_override("jwt.token_ttl_minutes", 1_000_000_000_000_i64)
                .unwrap(),
        );

        assert!(matches!(result, Err(ConfigError::Message(_))));
    }

    #[test]
    fn test_one_year_ttl_is_accepted() {
        let config = Config::try_from_builder(
            builder(BASE)
                .set_override("jwt.secret", "s3cret")
                .unwrap()
                .set_override("jwt.token_ttl_minutes", MAX_TOKEN_TTL_MINUTES)
                .unwrap(),
        )
        .unwrap();

        assert_eq!(config.jwt.token_ttl_minutes, MAX_TOKEN_TTL_MINUTES);
    }

    #[test]
    fn test_override_wins_over_file() {
        let config = Config::try_from_builder(
            builder(BASE)
                .set_override("jwt.secret", "s3cret")
                .unwrap()
                .set_override("server.http_port", 9090)
                .unwrap(),
        )
        .unwrap();

        assert_eq!(config.server.http_port, 9090);
        assert_eq!(config.jwt.secret, "s3cret");
    }

    #[test]
    fn test_debug_hides_secret() {
        let config =
            Config::try_from_builder(builder(BASE).set_override("jwt.secret", "s3cret").unwrap())
                .unwrap();

        assert!(!format!("{:?}", config).contains("s3cret"));
    }
}
