//! SQL handler
//!
//! Wraps a [`Driver`] with prepared-statement execution and one central
//! place deciding what happens to failures, selected by [`ErrorMode`].

use std::error::Error as StdError;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::driver::{ConnectOptions, Driver, ErrorMode, ResultSet, Value};
use crate::error::{DbError, DbResult, DriverError};
use crate::mysql_driver::MySqlDriver;
use crate::settings::SqlSettings;

pub struct SqlHandler {
    driver: Option<Box<dyn Driver>>,
    database: String,
    mode: ErrorMode,
    report: Box<dyn Write>,
}

impl std::fmt::Debug for SqlHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlHandler")
            .field("driver", &self.driver.as_ref().map(|d| d.name()))
            .field("database", &self.database)
            .field("mode", &self.mode)
            .finish()
    }
}

impl SqlHandler {
    /// Connect to `database` on the local MySQL server.
    ///
    /// Credentials come from the settings file at `settings_path`. A
    /// connection failure goes through the error mode in `options`; with
    /// [`ErrorMode::Ignore`] the handler comes back unconnected and every
    /// query yields `Ok(None)`.
    pub fn connect(database: &str, options: &ConnectOptions, settings_path: &Path) -> DbResult<Self> {
        if database.is_empty() {
            return Err(DbError::MissingParameter("database"));
        }
        let settings = SqlSettings::load(settings_path)?;

        let mut handler = Self {
            driver: None,
            database: database.to_string(),
            mode: options.error_mode,
            report: Box::new(io::stdout()),
        };
        match MySqlDriver::connect(database, options, &settings) {
            Ok(driver) => {
                info!(database, "database connected");
                handler.driver = Some(Box::new(driver));
            }
            Err(e) => {
                handler.dispatch::<()>(e)?;
            }
        }
        Ok(handler)
    }

    /// Wrap an already open driver
    pub fn with_driver(driver: Box<dyn Driver>, database: impl Into<String>, mode: ErrorMode) -> Self {
        Self {
            driver: Some(driver),
            database: database.into(),
            mode,
            report: Box::new(io::stdout()),
        }
    }

    /// Send HTML error reports somewhere other than stdout
    pub fn with_report_sink(mut self, sink: Box<dyn Write>) -> Self {
        self.report = sink;
        self
    }

    pub fn error_mode(&self) -> ErrorMode {
        self.mode
    }

    pub fn set_error_mode(&mut self, mode: ErrorMode) {
        self.mode = mode;
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn is_connected(&self) -> bool {
        self.driver.is_some()
    }

    /// Run `sql` as a prepared statement with positional `params`.
    ///
    /// `Ok(None)` means there was no connection or the failure was ignored.
    pub fn query(&mut self, sql: &str, params: &[Value]) -> DbResult<Option<ResultSet>> {
        let Some(driver) = self.driver.as_mut() else {
            debug!("query: no connection");
            return Ok(None);
        };
        debug!(driver = driver.name(), %sql, params = params.len(), "query");
        match driver.execute(sql, params) {
            Ok(result) => Ok(Some(result)),
            Err(e) => self.dispatch(e),
        }
    }

    /// Switch the active database; `Ok(false)` when nothing was switched
    pub fn set_database(&mut self, name: &str) -> DbResult<bool> {
        let Some(driver) = self.driver.as_mut() else {
            return Ok(false);
        };
        match driver.select_database(name) {
            Ok(()) => {
                info!(database = name, "database changed");
                self.database = name.to_string();
                Ok(true)
            }
            Err(e) => self.dispatch::<()>(e).map(|_| false),
        }
    }

    fn dispatch<T>(&mut self, err: DriverError) -> DbResult<Option<T>> {
        match self.mode {
            ErrorMode::Internal => {
                error!(error = %err, "database error");
                let html = error_report_html(&err);
                if let Err(e) = self.report.write_all(html.as_bytes()).and_then(|_| self.report.flush()) {
                    warn!(error = %e, "failed to write error report");
                }
                Err(DbError::Halted(err.to_string()))
            }
            ErrorMode::Propagate => Err(DbError::Driver(err)),
            ErrorMode::Ignore => {
                debug!(error = %err, "database error ignored");
                Ok(None)
            }
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render an error and its causes as an HTML fragment
pub fn error_report_html(err: &(dyn StdError + 'static)) -> String {
    let mut out = String::from("<span class=\"error\"><strong>An error has occurred: </strong><br/>\n<pre>");
    let _ = writeln!(out, "{}<br/>", escape_html(&err.to_string()));
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = writeln!(out, "\t<strong>caused by</strong> {}<br/>", escape_html(&cause.to_string()));
        source = cause.source();
    }
    out.push_str("</pre></span>");
    out
}
