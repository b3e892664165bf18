// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context};

use crate::{
    common::i18n::I18nStore,
    db::{InventoryStore, MemoryStore, PgSettings, PgStore},
    services::{MovementService, SupplyService, ToolService},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("STORAGE_BACKEND inválido: '{other}' (use 'postgres' ou 'memory')")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub host: String,
    pub port: u16,
    pub movements_default_limit: i64,
    pub movements_max_limit: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            backend: StorageBackend::Memory,
            database_url: None,
            db_max_connections: 5,
            db_acquire_timeout: Duration::from_secs(3),
            host: "0.0.0.0".to_string(),
            port: 3000,
            movements_default_limit: 100,
            movements_max_limit: 1000,
        }
    }
}

// Lê uma variável opcional, falhando se ela existir mas não fizer parse
fn var_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{name} inválida ('{raw}'): {e}")),
        _ => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let environment = match env::var("APP_ENV").unwrap_or_default().trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        };

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());

        // Sem escolha explícita: Postgres se houver DATABASE_URL, senão memória
        let backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ if database_url.is_some() => StorageBackend::Postgres,
            _ => StorageBackend::Memory,
        };
        if backend == StorageBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL deve ser definida quando STORAGE_BACKEND=postgres");
        }

        let config = Self {
            environment,
            backend,
            database_url,
            db_max_connections: var_or("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_acquire_timeout: Duration::from_secs(var_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                defaults.db_acquire_timeout.as_secs(),
            )?),
            host: var_or("HOST", defaults.host)?,
            port: var_or("PORT", defaults.port)?,
            movements_default_limit: var_or("MOVEMENTS_DEFAULT_LIMIT", defaults.movements_default_limit)?,
            movements_max_limit: var_or("MOVEMENTS_MAX_LIMIT", defaults.movements_max_limit)?,
        };
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.movements_default_limit < 1 || self.movements_max_limit < self.movements_default_limit {
            bail!("MOVEMENTS_DEFAULT_LIMIT deve estar entre 1 e MOVEMENTS_MAX_LIMIT");
        }
        if self.db_max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS deve ser maior que zero");
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn InventoryStore>,
    pub supply_service: SupplyService,
    pub tool_service: ToolService,
    pub movement_service: MovementService,
    pub i18n_store: I18nStore,
}

impl AppState {
    // A assinatura retorna um Result: falha ao abrir o armazenamento é fatal
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn InventoryStore> = match config.backend {
            StorageBackend::Postgres => {
                let settings = PgSettings {
                    url: config.database_url.clone().context("DATABASE_URL deve ser definida")?,
                    max_connections: config.db_max_connections,
                    acquire_timeout: config.db_acquire_timeout,
                };
                Arc::new(PgStore::open(&settings).await?)
            }
            StorageBackend::Memory => Arc::new(MemoryStore::open()),
        };

        Ok(Self::with_store(config, store))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_store(config: AppConfig, store: Arc<dyn InventoryStore>) -> Self {
        let supply_service = SupplyService::new(store.clone());
        let tool_service = ToolService::new(store.clone());
        let movement_service = MovementService::new(
            store.clone(),
            config.movements_default_limit,
            config.movements_max_limit,
        );
        let i18n_store = I18nStore::new(!config.is_production());

        Self {
            config: Arc::new(config),
            store,
            supply_service,
            tool_service,
            movement_service,
            i18n_store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_parse() {
        assert_eq!("Postgres".parse::<StorageBackend>().unwrap(), StorageBackend::Postgres);
        assert_eq!(" memory ".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("mongo".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn defaults_are_consistent() {
        let config = AppConfig::default();
        assert!(config.check().is_ok());
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert!(!config.is_production());
    }

    #[test]
    fn inverted_limits_are_rejected() {
        let config = AppConfig { movements_default_limit: 500, movements_max_limit: 100, ..AppConfig::default() };
        assert!(config.check().is_err());
    }
}
