/// Configuration management for the API server
///
/// Configuration is read once at startup: `dotenvy` loads `.env` into the
/// process environment, the `config` crate collects the variables below into
/// a flat [`Settings`] struct with defaults, and `Config::try_from` validates
/// them into the typed [`Config`] shared as `Arc<Config>`.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated origins, or `*` (default: `*`)
/// - `STORAGE`: `postgres` or `memory` (default: postgres)
/// - `DATABASE_URL`: PostgreSQL connection string (required for postgres)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Token signing secret, at least 32 characters (required)
/// - `JWT_ISSUER`: Token issuer (default: taskward)
/// - `ADMIN_USERNAME` / `ADMIN_PASSWORD`: Optional bootstrap administrator
/// - `RUST_LOG`, `LOG_FORMAT`: read by the binary's tracing setup
///
/// # Example
///
/// ```no_run
/// use taskward_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use taskward_shared::auth::jwt::DEFAULT_ISSUER;

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_SECRET_LENGTH: usize = 32;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Raw settings as read from the environment
#[derive(Clone, Deserialize)]
pub struct Settings {
    pub api_host: String,
    pub api_port: u16,
    pub cors_origins: String,
    pub storage: String,
    #[serde(default)]
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    #[serde(default)]
    pub jwt_secret: Option<String>,
    pub jwt_issuer: String,
    #[serde(default)]
    pub admin_username: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,
}

impl Settings {
    /// Reads settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(config::Environment::default())
    }

    /// Reads settings from an explicit variable map instead of the process
    /// environment
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let vars: config::Map<String, String> = vars.into_iter().collect();
        Self::load(config::Environment::default().source(Some(vars)))
    }

    fn load(environment: config::Environment) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .set_default("api_host", "0.0.0.0")?
            .set_default("api_port", 8080)?
            .set_default("cors_origins", "*")?
            .set_default("storage", "postgres")?
            .set_default("database_max_connections", 10)?
            .set_default("jwt_issuer", DEFAULT_ISSUER)?
            .add_source(environment)
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,

    /// Process-local stores; data is lost on exit
    Memory,
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,

    pub storage: StorageBackend,

    /// Present when `storage` is `Postgres`
    pub database: Option<DatabaseConfig>,

    pub jwt: JwtConfig,

    pub admin: Option<AdminBootstrap>,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,

    pub port: u16,

    /// Allowed CORS origins; `["*"]` means permissive
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,

    pub max_connections: u32,
}

/// Token signing configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    pub issuer: String,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Administrator account ensured at startup
#[derive(Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<Settings> for Config {
    type Error = ConfigError;

    fn try_from(settings: Settings) -> Result<Self, Self::Error> {
        let storage = match settings.storage.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => StorageBackend::Postgres,
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    key: "STORAGE",
                    reason: format!("expected 'postgres' or 'memory', got '{}'", other),
                })
            }
        };

        let database = match (storage, non_empty(settings.database_url)) {
            (StorageBackend::Postgres, None) => return Err(ConfigError::Missing("DATABASE_URL")),
            (StorageBackend::Postgres, Some(url)) => Some(DatabaseConfig {
                url,
                max_connections: settings.database_max_connections,
            }),
            (StorageBackend::Memory, _) => None,
        };

        if settings.database_max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DATABASE_MAX_CONNECTIONS",
                reason: "must be at least 1".to_string(),
            });
        }

        let secret = non_empty(settings.jwt_secret).ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!("must be at least {} characters long", MIN_SECRET_LENGTH),
            });
        }

        let issuer = settings.jwt_issuer.trim().to_string();
        if issuer.is_empty() {
            return Err(ConfigError::Invalid {
                key: "JWT_ISSUER",
                reason: "must not be empty".to_string(),
            });
        }

        let admin = match (
            non_empty(settings.admin_username),
            non_empty(settings.admin_password),
        ) {
            (Some(username), Some(password)) => Some(AdminBootstrap { username, password }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    key: "ADMIN_USERNAME",
                    reason: "ADMIN_USERNAME and ADMIN_PASSWORD must be set together".to_string(),
                })
            }
        };

        let cors_origins = settings
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            api: ApiConfig {
                host: settings.api_host,
                port: settings.api_port,
                cors_origins,
            },
            storage,
            database,
            jwt: JwtConfig { secret, issuer },
            admin,
        })
    }
}

impl Config {
    /// Loads configuration from `.env` and the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is
    /// invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine
        dotenvy::dotenv().ok();

        Self::try_from(Settings::from_env()?)
    }

    /// In-memory configuration with defaults, for tests and local demos
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
            },
            storage: StorageBackend::Memory,
            database: None,
            jwt: JwtConfig {
                secret: jwt_secret.into(),
                issuer: DEFAULT_ISSUER.to_string(),
            },
            admin: None,
        }
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn cors_is_permissive(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}
