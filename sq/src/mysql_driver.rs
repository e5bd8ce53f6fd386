//! MySQL backend

use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Params};
use tracing::debug;

use crate::driver::{ConnectOptions, Driver, ResultSet, Value, valid_identifier};
use crate::error::DriverError;
use crate::settings::SqlSettings;

/// Server address; the database always runs next to the web server
pub const SQL_HOST: &str = "127.0.0.1";
pub const SQL_PORT: u16 = 3306;

/// MySQL over TCP
pub struct MySqlDriver {
    conn: Conn,
}

impl MySqlDriver {
    /// Connect to `database` on the fixed host and port
    pub fn connect(database: &str, options: &ConnectOptions, settings: &SqlSettings) -> Result<Self, DriverError> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(SQL_HOST))
            .tcp_port(SQL_PORT)
            .prefer_socket(false)
            .user(Some(settings.user.as_str()))
            .pass(Some(settings.password.as_str()))
            .db_name(Some(database))
            .tcp_connect_timeout(options.connect_timeout())
            .init(vec![format!("SET NAMES {}", options.charset)]);

        let conn = Conn::new(opts)?;
        debug!(host = SQL_HOST, port = SQL_PORT, database, "connected to mysql");
        Ok(Self { conn })
    }
}

fn to_mysql(value: &Value) -> mysql::Value {
    match value {
        Value::Null => mysql::Value::NULL,
        Value::Int(v) => mysql::Value::Int(*v),
        Value::UInt(v) => mysql::Value::UInt(*v),
        Value::Float(v) => mysql::Value::Double(*v),
        Value::Text(v) => mysql::Value::Bytes(v.clone().into_bytes()),
        Value::Bytes(v) => mysql::Value::Bytes(v.clone()),
    }
}

fn from_mysql(value: mysql::Value) -> Value {
    match value {
        mysql::Value::NULL => Value::Null,
        mysql::Value::Int(v) => Value::Int(v),
        mysql::Value::UInt(v) => Value::UInt(v),
        mysql::Value::Float(v) => Value::Float(v as f64),
        mysql::Value::Double(v) => Value::Float(v),
        mysql::Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Value::Text(text),
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        mysql::Value::Date(y, m, d, h, i, s, us) => Value::Text(if us > 0 {
            format!("{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}", y, m, d, h, i, s, us)
        } else {
            format!("{:04}-{:02}-{:02} {:02}:{:02}:{:02}", y, m, d, h, i, s)
        }),
        mysql::Value::Time(negative, days, h, i, s, us) => {
            let hours = days * 24 + h as u32;
            let sign = if negative { "-" } else { "" };
            Value::Text(if us > 0 {
                format!("{}{:02}:{:02}:{:02}.{:06}", sign, hours, i, s, us)
            } else {
                format!("{}{:02}:{:02}:{:02}", sign, hours, i, s)
            })
        }
    }
}

impl Driver for MySqlDriver {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet, DriverError> {
        let stmt = self.conn.prep(sql)?;
        let columns = stmt.columns().iter().map(|c| c.name_str().into_owned()).collect();
        let params = if params.is_empty() {
            Params::Empty
        } else {
            Params::Positional(params.iter().map(to_mysql).collect())
        };

        let rows: Vec<mysql::Row> = self.conn.exec(&stmt, params)?;
        let rows = rows
            .into_iter()
            .map(|row| row.unwrap().into_iter().map(from_mysql).collect())
            .collect();

        let last_insert_id = match self.conn.last_insert_id() {
            0 => None,
            id => Some(id),
        };
        Ok(ResultSet {
            columns,
            rows,
            affected_rows: self.conn.affected_rows(),
            last_insert_id,
        })
    }

    fn select_database(&mut self, name: &str) -> Result<(), DriverError> {
        if !valid_identifier(name) {
            return Err(DriverError::InvalidDatabase(name.to_string()));
        }
        self.conn.query_drop(format!("USE `{}`", name))?;
        debug!(database = name, "switched mysql database");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_round_trip_text() {
        assert_eq!(from_mysql(to_mysql(&Value::Text("héllo".to_string()))), Value::Text("héllo".to_string()));
        assert_eq!(from_mysql(to_mysql(&Value::Null)), Value::Null);
    }

    #[test]
    fn test_from_mysql_temporal() {
        assert_eq!(
            from_mysql(mysql::Value::Date(2024, 7, 9, 4, 35, 51, 0)),
            Value::Text("2024-07-09 04:35:51".to_string())
        );
        assert_eq!(
            from_mysql(mysql::Value::Time(true, 1, 2, 3, 4, 0)),
            Value::Text("-26:03:04".to_string())
        );
    }

    #[test]
    fn test_from_mysql_binary() {
        assert_eq!(from_mysql(mysql::Value::Bytes(vec![0xff, 0x00])), Value::Bytes(vec![0xff, 0x00]));
    }
}
