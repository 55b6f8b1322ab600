//! SQLite store handle.
//!
//! Requests borrow a pooled connection for the duration of one operation and
//! hand it back when the guard drops, on success and failure alike.

use std::time::Duration;

use log::{debug, info};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::config::Config;
use crate::errors::AppResult;

pub type ConnectionPool = Pool<SqliteConnectionManager>;
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT UNIQUE NOT NULL,
        password TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT,
        is_completed BOOLEAN NOT NULL DEFAULT 0,
        user_id INTEGER NOT NULL,
        priority TEXT NOT NULL DEFAULT 'Medium',
        deadline TEXT,
        time_spent_seconds INTEGER NOT NULL DEFAULT 0,
        completion_date DATE,
        FOREIGN KEY (user_id) REFERENCES users (id)
    );
";

#[derive(Debug)]
struct ConnectionSetup;

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionSetup {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)
    }
}

#[derive(Clone)]
pub struct Store {
    pool: ConnectionPool,
}

impl Store {
    /// Opens (creating if needed) the database file named in `config` and
    /// makes sure both tables exist.
    pub fn open(config: &Config) -> AppResult<Self> {
        let manager = SqliteConnectionManager::file(&config.database_path);
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1))
            .connection_timeout(Duration::from_secs(5))
            .connection_customizer(Box::new(ConnectionSetup))
            .build(manager)?;

        let store = Self { pool };
        store.init_schema()?;
        info!("opened task store at {}", config.database_path);
        Ok(store)
    }

    /// In-memory store for tests. SQLite gives every in-memory connection its
    /// own database, so the pool is pinned to one connection that never
    /// expires.
    pub fn open_in_memory() -> AppResult<Self> {
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_timeout(Duration::from_secs(5))
            .connection_customizer(Box::new(ConnectionSetup))
            .build(SqliteConnectionManager::memory())?;

        let store = Self { pool };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)?;
        debug!("schema ready");
        Ok(())
    }

    /// Borrows a connection for one operation.
    pub fn conn(&self) -> AppResult<PooledConnection> {
        Ok(self.pool.get()?)
    }
}
