//! Database layer for DrugReg
//!
//! Provides:
//! - SeaORM entity models and projection rows
//! - Repositories per entity family
//! - Joined projection SQL
//! - Constraint-violation translation
//! - Connection pool management and embedded migrations

pub mod constraint;
pub mod models;
pub mod projection;
mod repository;

pub use repository::{
    BatchRepository, CatalogKind, CatalogRepository, DrugRepository, RegistrationRepository,
    AuthorityHolders, DosageForms, Ingredients, ManufacturingSites, MarketingAuthorizations,
    RoutesOfAdmin, StrengthUnits,
};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Database connection pool wrapper, cheap to clone
#[derive(Clone)]
pub struct DbPool {
    conn: Arc<DatabaseConnection>,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let mut opts = ConnectOptions::new(&config.url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(true);

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect: {}", e),
            })?;

        info!(
            max_connections = config.max_connections,
            "Database connection established"
        );

        Ok(Self::from_connection(conn))
    }

    /// Wrap an existing connection (used with mock connections in tests)
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self {
            conn: Arc::new(conn),
        }
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;

        Ok(())
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        let DatabaseConnection::SqlxPostgresPoolConnection(_) = self.conn.as_ref() else {
            return Err(AppError::Configuration {
                message: "migrations require a Postgres connection".to_string(),
            });
        };

        MIGRATOR
            .run(self.conn.get_postgres_connection_pool())
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Migration failed: {}", e),
            })?;

        info!(count = MIGRATOR.iter().count(), "Migrations applied");
        Ok(())
    }
}
