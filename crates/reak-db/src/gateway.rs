use std::fmt;
use std::path::{Path, PathBuf};

use reak_common::{Error, Result};
use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior};
use tracing::{debug, info};

/// Parameters for opening a database connection.
#[derive(Clone, Default)]
pub struct ConnectOptions {
    pub user: String,
    pub password: String,
    /// Database to select. `None` opens a scratch in-memory database.
    pub database: Option<String>,
    /// Directory that holds the database files.
    pub data_dir: PathBuf,
}

impl ConnectOptions {
    /// Path of the database file, if a database name was given.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database
            .as_deref()
            .map(|name| self.data_dir.join(format!("{name}.db")))
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

/// A live, verified connection to the target database.
pub struct Database {
    conn: Connection,
    label: String,
}

impl Database {
    /// Open an existing database and verify it with a ping.
    pub fn connect(opts: &ConnectOptions) -> Result<Self> {
        match opts.database_path() {
            Some(path) => {
                if !path.is_file() {
                    return Err(Error::Connection(format!(
                        "database {} does not exist at {}",
                        opts.database.as_deref().unwrap_or_default(),
                        path.display()
                    )));
                }
                let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
                Self::open_with(opts, &path, flags)
            }
            None => {
                debug!(user = %opts.user, "no database selected, opening scratch database");
                Self::in_memory()
            }
        }
    }

    /// Create a new database file, then connect to it. Fails if it already exists.
    pub fn create(opts: &ConnectOptions) -> Result<Self> {
        let Some(path) = opts.database_path() else {
            return Err(Error::Connection(
                "a database name is required to create a database".into(),
            ));
        };
        if path.exists() {
            return Err(Error::Connection(format!(
                "database already exists at {}",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let db = Self::open_with(opts, &path, flags)?;
        info!("created database {}", path.display());
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Connection(format!("failed to open in-memory database: {e}")))?;
        Self::init(conn, ":memory:".to_string())
    }

    fn open_with(opts: &ConnectOptions, path: &Path, flags: OpenFlags) -> Result<Self> {
        debug!(user = %opts.user, "opening database at {}", path.display());
        let conn = Connection::open_with_flags(path, flags).map_err(|e| {
            Error::Connection(format!("failed to open database {}: {e}", path.display()))
        })?;
        Self::init(conn, path.display().to_string())
    }

    fn init(conn: Connection, label: String) -> Result<Self> {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Connection(format!("failed to set pragmas: {e}")))?;

        let db = Self { conn, label };
        db.ping()?;
        info!("connected to {}", db.label);
        Ok(db)
    }

    /// Round-trip a trivial query to prove the connection is usable.
    pub fn ping(&self) -> Result<()> {
        let one: i64 = self
            .conn
            .query_row("SELECT 1", [], |row| row.get(0))
            .map_err(|e| Error::Connection(format!("ping failed: {e}")))?;
        if one != 1 {
            return Err(Error::Connection(format!("ping returned {one}")));
        }
        Ok(())
    }

    /// Human-readable location of the database.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Start an immediate transaction. Dropping it unfinished rolls it back.
    pub fn begin(&self) -> Result<MigrationTx<'_>> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;
        Ok(MigrationTx { tx })
    }

    /// Run a batch outside any migration transaction.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Read the first column of every row returned by `sql` as text.
    pub fn query_strings(&self, sql: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| Error::Database(format!("failed to run query: {e}")))?;

        let mut values = Vec::new();
        for row in rows {
            values.push(row.map_err(|e| Error::Database(format!("failed to read row: {e}")))?);
        }
        Ok(values)
    }
}

/// One migration's transaction. Either everything in it commits or nothing does.
pub struct MigrationTx<'conn> {
    tx: Transaction<'conn>,
}

impl MigrationTx<'_> {
    /// Execute one statement. Statements that return rows are accepted.
    pub fn exec(&self, statement: &str) -> std::result::Result<(), rusqlite::Error> {
        self.tx.execute_batch(statement)
    }

    /// Execute a parameterised statement, returning the affected row count.
    pub fn exec_params<P: rusqlite::Params>(
        &self,
        statement: &str,
        params: P,
    ) -> std::result::Result<usize, rusqlite::Error> {
        self.tx.execute(statement, params)
    }

    pub fn commit(self) -> std::result::Result<(), rusqlite::Error> {
        self.tx.commit()
    }

    pub fn rollback(self) -> std::result::Result<(), rusqlite::Error> {
        self.tx.rollback()
    }
}
