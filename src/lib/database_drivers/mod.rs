use crate::config;
use crate::error::ProvisionError;
use crate::value::{Table, Value};
use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use std::path::Path;

pub mod mysql;
pub mod postgres;
pub mod sqlite;
mod utils;

// DatabaseDriver is a trait that all database drivers must implement.
// Every call opens its own connection and releases it before returning.
pub trait DatabaseDriver: Send + Sync {
    // look the database up in the server catalog
    fn database_exists<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<bool>>;

    // create an empty database on the server
    fn create_database<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>>;

    // run statements in order on a single connection to the given database
    fn execute_script<'a>(
        &'a self,
        name: &'a str,
        statements: &'a [String],
    ) -> BoxFuture<'a, Result<(), ProvisionError>>;

    // force other sessions off the database, then drop it if it is still listed
    fn drop_database<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>>;

    // run a statement and return the affected row count
    fn execute<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<u64>>;

    // first column of the first row, None when nothing is returned
    fn fetch_scalar<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Option<Value>>>;

    // every row of the result
    fn fetch_table<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Table>>;
}

// Creates a new database driver based on the url scheme
pub fn new(db_url: &str, wait_timeout: Option<usize>) -> Result<Box<dyn DatabaseDriver>> {
    match config::Database::from_url(db_url)? {
        config::Database::Postgres => {
            let driver = postgres::PostgresDriver::new(db_url, wait_timeout)?;
            Ok(Box::new(driver))
        }
        config::Database::MySQL | config::Database::MariaDB => {
            let driver = mysql::MySQLDriver::new(db_url, wait_timeout)?;
            Ok(Box::new(driver))
        }
        config::Database::SQLite => {
            let driver = sqlite::SqliteDriver::new(db_url);
            Ok(Box::new(driver))
        }
    }
}

/// Points a server-level connection string at the named database.
pub fn database_url(server_url: &str, name: &str) -> Result<String> {
    match config::Database::from_url(server_url)? {
        config::Database::SQLite => {
            let (scheme, path) = server_url
                .split_once("://")
                .ok_or_else(|| anyhow!("Invalid sqlite url: {}", server_url))?;
            Ok(format!("{}://{}", scheme, Path::new(path).join(name).display()))
        }
        _ => {
            let mut parsed = url::Url::parse(server_url)?;
            parsed.set_path(&format!("/{}", name));
            Ok(parsed.to_string())
        }
    }
}
