use crate::database_drivers::DatabaseDriver;
use crate::error::ProvisionError;
use crate::value::{Table, Value};
use anyhow::Result;
use futures::future::BoxFuture;
use log::debug;
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{
    Column, ConnectOptions, Connection, Executor, Row, SqliteConnection, Statement, TypeInfo,
    ValueRef,
};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::utils;

// A SQLite "server" is a directory and each database is a file inside it.
// When the driver serves queries the path is the database file itself.
pub struct SqliteDriver {
    path: PathBuf,
}

impl SqliteDriver {
    pub fn new(db_url: &str) -> SqliteDriver {
        let path = if db_url.contains("://") {
            db_url.split_once("://").map(|(_, p)| p).unwrap_or(db_url)
        } else {
            db_url
        };

        SqliteDriver {
            path: PathBuf::from(path),
        }
    }

    fn database_file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    async fn connect(path: &Path, create: bool) -> Result<SqliteConnection> {
        let client = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create)
            .connect()
            .await?;

        Ok(client)
    }
}

impl DatabaseDriver for SqliteDriver {
    fn database_exists<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<bool>> {
        let fut = async move { Ok(self.database_file(name).is_file()) };

        Box::pin(fut)
    }

    fn create_database<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>> {
        let fut = async move {
            fs::create_dir_all(&self.path)?;

            let client = SqliteDriver::connect(&self.database_file(name), true).await?;
            client.close().await?;
            Ok(())
        };

        Box::pin(fut)
    }

    fn execute_script<'a>(
        &'a self,
        name: &'a str,
        statements: &'a [String],
    ) -> BoxFuture<'a, Result<(), ProvisionError>> {
        let fut = async move {
            let mut client = SqliteDriver::connect(&self.database_file(name), false)
                .await
                .map_err(ProvisionError::Connection)?;

            for (index, statement) in statements.iter().enumerate() {
                debug!("Running statement {} of {}", index + 1, statements.len());
                if let Err(e) = client.execute(statement.as_str()).await {
                    return Err(ProvisionError::Statement {
                        index: index + 1,
                        statement: statement.clone(),
                        source: e.into(),
                    });
                }
            }

            Ok(())
        };

        Box::pin(fut)
    }

    // Nothing holds a SQLite file open between calls, so there are no sessions to evict.
    fn drop_database<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>> {
        let fut = async move {
            let file = self.database_file(name);

            let mut targets = vec![file.clone()];
            for suffix in ["-wal", "-shm", "-journal"] {
                let mut side_file = file.clone().into_os_string();
                side_file.push(suffix);
                targets.push(PathBuf::from(side_file));
            }

            for target in targets {
                match fs::remove_file(&target) {
                    Ok(()) => debug!("Removed {}", target.display()),
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }

            Ok(())
        };

        Box::pin(fut)
    }

    fn execute<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<u64>> {
        let fut = async move {
            let mut client = SqliteDriver::connect(&self.path, false).await?;
            let result = client.execute(query).await?;
            Ok(result.rows_affected())
        };

        Box::pin(fut)
    }

    fn fetch_scalar<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
        let fut = async move {
            let mut client = SqliteDriver::connect(&self.path, false).await?;
            let row = client.fetch_optional(query).await?;
            utils::first_value(row, decode_value)
        };

        Box::pin(fut)
    }

    fn fetch_table<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Table>> {
        let fut = async move {
            let mut client = SqliteDriver::connect(&self.path, false).await?;
            let rows = client.fetch_all(query).await?;

            let columns = match rows.first() {
                Some(row) => utils::column_names(row),
                None => match client.prepare(query).await {
                    Ok(statement) => statement
                        .columns()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect(),
                    Err(e) => {
                        debug!("Couldn't describe empty result: {}", e);
                        vec![]
                    }
                },
            };

            utils::into_table(columns, &rows, decode_value)
        };

        Box::pin(fut)
    }
}

// SQLite reports the storage class of each value rather than the declared column type.
fn decode_value(row: &SqliteRow, index: usize) -> Result<Value> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let type_name = raw.type_info().name().to_string();
    let value = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => Value::Int(row.try_get_unchecked(index)?),
        "REAL" => Value::Float(row.try_get_unchecked(index)?),
        "BLOB" => Value::Bytes(row.try_get_unchecked(index)?),
        _ => Value::Text(row.try_get_unchecked(index)?),
    };

    Ok(value)
}
