//! SQLite backend
//!
//! Each database name maps to `{dir}/{name}.sqlite3`; the name `:memory:`
//! opens a private in-memory database.

use std::path::{Path, PathBuf};

use rusqlite::types::{Value as SqliteValue, ValueRef};
use rusqlite::{Connection, params_from_iter};
use tracing::debug;

use crate::driver::{Driver, ResultSet, Value, valid_identifier};
use crate::error::DriverError;

pub const MEMORY: &str = ":memory:";

pub struct SqliteDriver {
    dir: PathBuf,
    conn: Connection,
}

impl SqliteDriver {
    /// Open database `name` inside `dir`
    pub fn open(dir: impl Into<PathBuf>, name: &str) -> Result<Self, DriverError> {
        let dir = dir.into();
        let conn = Self::connection(&dir, name)?;
        Ok(Self { dir, conn })
    }

    /// Private in-memory database
    pub fn memory() -> Result<Self, DriverError> {
        Self::open(PathBuf::new(), MEMORY)
    }

    fn connection(dir: &Path, name: &str) -> Result<Connection, DriverError> {
        if name == MEMORY {
            return Ok(Connection::open_in_memory()?);
        }
        if !valid_identifier(name) {
            return Err(DriverError::InvalidDatabase(name.to_string()));
        }
        let path = dir.join(format!("{}.sqlite3", name));
        debug!(path = %path.display(), "opening sqlite database");
        Ok(Connection::open(path)?)
    }
}

fn to_sqlite(value: &Value) -> SqliteValue {
    match value {
        Value::Null => SqliteValue::Null,
        Value::Int(v) => SqliteValue::Integer(*v),
        Value::UInt(v) => match i64::try_from(*v) {
            Ok(v) => SqliteValue::Integer(v),
            Err(_) => SqliteValue::Real(*v as f64),
        },
        Value::Float(v) => SqliteValue::Real(*v),
        Value::Text(v) => SqliteValue::Text(v.clone()),
        Value::Bytes(v) => SqliteValue::Blob(v.clone()),
    }
}

fn from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    }
}

impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet, DriverError> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let params: Vec<SqliteValue> = params.iter().map(to_sqlite).collect();

        if columns.is_empty() {
            let affected = stmt.execute(params_from_iter(params.iter()))?;
            let last_insert_id = match self.conn.last_insert_rowid() {
                id if id > 0 => Some(id as u64),
                _ => None,
            };
            return Ok(ResultSet {
                columns,
                rows: Vec::new(),
                affected_rows: affected as u64,
                last_insert_id,
            });
        }

        let mut rows = Vec::new();
        let mut cursor = stmt.query(params_from_iter(params.iter()))?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(from_sqlite(row.get_ref(i)?));
            }
            rows.push(values);
        }

        Ok(ResultSet {
            columns,
            rows,
            ..Default::default()
        })
    }

    fn select_database(&mut self, name: &str) -> Result<(), DriverError> {
        self.conn = Self::connection(&self.dir, name)?;
        debug!(database = name, "switched sqlite database");
        Ok(())
    }
}
