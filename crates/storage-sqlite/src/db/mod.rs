use log::{error, info};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use diesel::connection::{Connection, SimpleConnection};
use diesel::r2d2;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::errors::StorageError;
use tipstream_core::errors::{Error, Result, StoreError};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

pub mod write_actor;
pub use write_actor::{spawn_writer, WriteHandle};

/// Prepares the database file at `db_path`, creating parent directories and
/// switching the journal to WAL. Returns the path for use with [`create_pool`].
pub fn init(db_path: &str) -> Result<String> {
    if let Some(db_dir) = Path::new(db_path).parent() {
        if !db_dir.as_os_str().is_empty() && !db_dir.exists() {
            fs::create_dir_all(db_dir).map_err(StorageError::from)?;
        }
    }

    {
        let mut conn = SqliteConnection::establish(db_path).map_err(StorageError::from)?;
        conn.batch_execute(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA busy_timeout = 30000;
            PRAGMA synchronous  = NORMAL;
        ",
        )
        .map_err(StorageError::from)?;
    }

    Ok(db_path.to_string())
}

pub fn create_pool(db_path: &str) -> Result<Arc<DbPool>> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = r2d2::Pool::builder()
        .max_size(8)
        .min_idle(Some(1))
        .connection_timeout(std::time::Duration::from_secs(30))
        .connection_customizer(Box::new(ConnectionCustomizer {}))
        .build(manager)
        .map_err(StorageError::from)?;
    Ok(Arc::new(pool))
}

pub fn run_migrations(pool: &DbPool) -> Result<()> {
    info!("Running database migrations");
    let mut connection = get_connection(pool)?;

    let result = connection.run_pending_migrations(MIGRATIONS).map_err(|e| {
        error!("Database migration failed: {}", e);
        Error::from(StorageError::MigrationFailed(e.to_string()))
    })?;

    if result.is_empty() {
        info!("No pending migrations to apply.");
    } else {
        info!("Applied the following migrations:");
        for migration_version in &result {
            info!("  - {}", migration_version);
        }
    }

    Ok(())
}

pub fn get_connection(pool: &DbPool) -> Result<DbConnection> {
    pool.get().map_err(|e| {
        error!("Failed to get database connection: {}", e);
        Error::Store(StoreError::Unavailable(e.to_string()))
    })
}

#[derive(Debug)]
struct ConnectionCustomizer;

impl r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionCustomizer {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "
            PRAGMA busy_timeout = 30000;
            PRAGMA synchronous = NORMAL;
        ",
        )
        .map_err(diesel::r2d2::Error::QueryError)?;

        Ok(())
    }
}
