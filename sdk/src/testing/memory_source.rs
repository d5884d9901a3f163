// In-memory data source for testing
use crate::adapter::{CellValue, DataSource, RowSet};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{Connection, ToSql, params_from_iter};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// SQLite in-memory database answering the statements
/// [`crate::argument::QueryClauses`] renders.
///
/// Every column is declared with NUMERIC affinity, so quoted operands such
/// as `age > '18'` compare as numbers against numeric cells. Booleans are
/// stored as `1`/`0` and come back as integers.
#[derive(Debug)]
pub struct MemoryDataSource {
    conn: Arc<Mutex<Connection>>,
    executed: AsyncMutex<Vec<String>>,
    failure: RwLock<Option<String>>,
}

impl MemoryDataSource {
    pub fn new() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            executed: AsyncMutex::new(Vec::new()),
            failure: RwLock::new(None),
        })
    }

    /// Create (or replace) an empty table
    pub fn create_table<I, S>(&self, table: &str, columns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns: Vec<String> = columns
            .into_iter()
            .map(|column| format!("{} NUMERIC", quote_identifier(column.as_ref())))
            .collect();
        if columns.is_empty() {
            bail!("table {} needs at least one column", table);
        }

        let name = quote_identifier(table);
        self.conn
            .lock()
            .execute_batch(&format!(
                "DROP TABLE IF EXISTS {name}; CREATE TABLE {name} ({});",
                columns.join(", ")
            ))
            .with_context(|| format!("Failed to create table {}", table))?;
        Ok(())
    }

    pub fn insert_row(&self, table: &str, row: Vec<CellValue>) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} VALUES ({})",
            quote_identifier(table),
            vec!["?"; row.len()].join(",")
        );
        self.conn
            .lock()
            .execute(&sql, params_from_iter(row.iter()))
            .with_context(|| format!("Failed to insert into {}", table))?;
        Ok(())
    }

    pub fn table_len(&self, table: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
        let count: i64 = self
            .conn
            .lock()
            .query_row(&sql, [], |row| row.get(0))
            .with_context(|| format!("Failed to count rows of {}", table))?;
        Ok(count as usize)
    }

    /// Every statement received so far, in order
    pub async fn executed(&self) -> Vec<String> {
        self.executed.lock().await.clone()
    }

    pub async fn clear_executed(&self) {
        self.executed.lock().await.clear();
    }

    /// Make every following query fail with `message`
    pub async fn fail_with<M: Into<String>>(&self, message: M) {
        *self.failure.write().await = Some(message.into());
    }

    pub async fn clear_failure(&self) {
        *self.failure.write().await = None;
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn query(&self, sql: &str, cancel: &CancellationToken) -> Result<RowSet> {
        self.executed.lock().await.push(sql.to_string());

        if let Some(message) = self.failure.read().await.clone() {
            bail!(message);
        }
        if cancel.is_cancelled() {
            bail!("query cancelled");
        }

        let conn = self.conn.clone();
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || select(&conn.lock(), &sql))
            .await
            .context("Query task failed")?
    }
}

/// Run a read-only statement and collect its rows
fn select(conn: &Connection, sql: &str) -> Result<RowSet> {
    let mut statement = conn
        .prepare(sql)
        .with_context(|| format!("Failed to prepare: {}", sql))?;
    if !statement.readonly() {
        bail!("only read-only statements are accepted: {}", sql);
    }

    let width = statement.column_count();
    let mut result = RowSet::new(statement.column_names());
    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(width);
        for index in 0..width {
            cells.push(cell_from(row.get_ref(index)?));
        }
        result.push_row(cells);
    }

    debug!("Memory source returned {} rows", result.len());
    Ok(result)
}

fn cell_from(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(i) => CellValue::Int(i),
        ValueRef::Real(f) => CellValue::Float(f),
        ValueRef::Text(text) => CellValue::Text(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(bytes) => CellValue::Bytes(bytes.to_vec()),
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            CellValue::Null => ToSqlOutput::Owned(SqlValue::Null),
            CellValue::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            CellValue::Int(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            CellValue::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            CellValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            CellValue::Bytes(bytes) => ToSqlOutput::Borrowed(ValueRef::Blob(bytes)),
        })
    }
}
