//! sqlhandler - prepared-statement database access with selectable error handling
//!
//! [`SqlHandler`] runs statements through a [`Driver`] (MySQL or SQLite) and
//! routes every failure through its [`ErrorMode`].

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod handler;
pub mod mysql_driver;
pub mod settings;
pub mod sqlite_driver;

pub use config::{Backend, Config, SqlConfig};
pub use driver::{ConnectOptions, Driver, ErrorMode, ResultSet, Value};
pub use error::{DbError, DbResult, DriverError};
pub use handler::{SqlHandler, error_report_html};
pub use mysql_driver::{MySqlDriver, SQL_HOST, SQL_PORT};
pub use settings::SqlSettings;
pub use sqlite_driver::SqliteDriver;
