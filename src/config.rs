use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub jwt: JwtConfig,

    pub client: ClientConfig,

    pub security: SecurityConfig,

    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/aula.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 3003,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// HS256 signing secret. Override with AULA_JWT_SECRET; never ship the
    /// default outside local development.
    pub secret: String,

    pub issuer: String,

    pub audience: String,

    /// Token lifetime in days. The session row created at login expires on
    /// the same schedule.
    pub expires_days: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-32-characters-minimum!".to_string(),
            issuer: "http://localhost:3003".to_string(),
            audience: "http://localhost:3003".to_string(),
            expires_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Static identifier checked on API routes via the X-Client-Id header.
    /// Independent of user authentication. Override with AULA_CLIENT_ID.
    pub client_id: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: "aula-web".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// How many recent password hashes the reuse check looks back over.
    pub password_history_limit: u64,

    /// Retries with a random suffix before username generation falls back
    /// to a timestamp.
    pub username_max_retries: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            password_history_limit: 5,
            username_max_retries: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory uploaded files are written under.
    pub upload_path: String,

    /// Public base URL uploaded files are served from.
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_path: "uploads".to_string(),
            public_base_url: "http://localhost:3003/uploads".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = Self::default_config_path();
        let mut config = if path.exists() {
            info!("Loading config from: {}", path.display());
            Self::load_from_path(&path)?
        } else {
            info!("No config file found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets are overridable from the environment so the config file can
    /// be committed without them.
    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("AULA_JWT_SECRET") {
            self.jwt.secret = secret;
        }
        if let Ok(client_id) = std::env::var("AULA_CLIENT_ID") {
            self.client.client_id = client_id;
        }
        if let Ok(database_path) = std::env::var("AULA_DATABASE_PATH") {
            self.general.database_path = database_path;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt.secret.is_empty() {
            anyhow::bail!("JWT secret cannot be empty");
        }

        if self.jwt.secret.len() < 32 {
            anyhow::bail!("JWT secret must be at least 32 characters");
        }

        if self.jwt.expires_days <= 0 {
            anyhow::bail!("JWT expiry must be at least one day");
        }

        if self.client.client_id.is_empty() {
            anyhow::bail!("Client ID cannot be empty");
        }

        if self.security.password_history_limit == 0 {
            anyhow::bail!("Password history limit must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn short_jwt_secret_rejected() {
        let mut config = Config::default();
        config.jwt.secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_client_id_rejected() {
        let mut config = Config::default();
        config.client.client_id = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn roundtrips_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).expect("should serialize");
        let parsed: Config = toml::from_str(&serialized).expect("should parse");
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.jwt.expires_days, 30);
    }
}
