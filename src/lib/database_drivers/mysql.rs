use crate::database_drivers::DatabaseDriver;
use crate::error::ProvisionError;
use crate::value::{Table, Value};
use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use log::debug;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Executor, MySqlConnection, Row, Statement, TypeInfo, ValueRef};

use super::utils;

// Serves both MySQL and MariaDB, which share the wire protocol.
pub struct MySQLDriver {
    url: String,
    wait_timeout: Option<usize>,
}

impl MySQLDriver {
    pub fn new(db_url: &str, wait_timeout: Option<usize>) -> Result<MySQLDriver> {
        let mut parsed_db_url = url::Url::parse(db_url)?;
        parsed_db_url
            .set_scheme("mysql")
            .map_err(|_| anyhow!("Invalid mysql url: {}", db_url))?;

        Ok(MySQLDriver {
            url: parsed_db_url.to_string(),
            wait_timeout,
        })
    }

    async fn connect(&self, url: &str) -> Result<MySqlConnection> {
        utils::connect::<MySqlConnection>(url, self.wait_timeout).await
    }
}

impl DatabaseDriver for MySQLDriver {
    fn database_exists<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<bool>> {
        let fut = async move {
            let mut client = self.connect(&self.url).await?;
            let row = sqlx::query(
                "SELECT SCHEMA_NAME FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = ?",
            )
            .bind(name)
            .fetch_optional(&mut client)
            .await?;

            Ok(row.is_some())
        };

        Box::pin(fut)
    }

    fn create_database<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>> {
        let fut = async move {
            let query = format!("CREATE DATABASE {}", utils::quote_identifier(name, '`'));

            let mut client = self.connect(&self.url).await?;
            client.execute(query.as_str()).await?;
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
            let url = super::database_url(&self.url, name)?;
            let mut client = self
                .connect(&url)
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

    fn drop_database<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>> {
        let fut = async move {
            let mut client = self.connect(&self.url).await?;

            // MySQL has no single user mode, so kill whatever is still using the schema.
            let sessions = sqlx::query(
                "SELECT CAST(ID AS UNSIGNED) AS id FROM information_schema.PROCESSLIST \
                 WHERE DB = ? AND ID <> CONNECTION_ID()",
            )
            .bind(name)
            .fetch_all(&mut client)
            .await?
            .iter()
            .map(|row| row.try_get::<u64, _>("id"))
            .collect::<Result<Vec<u64>, sqlx::Error>>()?;

            for id in sessions {
                debug!("Killing session {} on {}", id, name);
                if let Err(e) = client.execute(format!("KILL {}", id).as_str()).await {
                    // The session may have ended on its own in the meantime.
                    debug!("Couldn't kill session {}: {}", id, e);
                }
            }

            let query = format!(
                "DROP DATABASE IF EXISTS {}",
                utils::quote_identifier(name, '`')
            );
            client.execute(query.as_str()).await?;
            Ok(())
        };

        Box::pin(fut)
    }

    fn execute<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<u64>> {
        let fut = async move {
            let mut client = self.connect(&self.url).await?;
            let result = client.execute(query).await?;
            Ok(result.rows_affected())
        };

        Box::pin(fut)
    }

    fn fetch_scalar<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
        let fut = async move {
            let mut client = self.connect(&self.url).await?;
            let row = client.fetch_optional(query).await?;
            utils::first_value(row, decode_value)
        };

        Box::pin(fut)
    }

    fn fetch_table<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Table>> {
        let fut = async move {
            let mut client = self.connect(&self.url).await?;
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

fn decode_value(row: &MySqlRow, index: usize) -> Result<Value> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let type_name = raw.type_info().name().to_string();
    let value = match type_name.as_str() {
        "BOOLEAN" => Value::Bool(row.try_get(index)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => Value::Int(row.try_get(index)?),
        t if t.ends_with("UNSIGNED") && !t.starts_with("DECIMAL") => {
            let v: u64 = row.try_get(index)?;
            i64::try_from(v)
                .map(Value::Int)
                .unwrap_or_else(|_| Value::Text(v.to_string()))
        }
        "FLOAT" => Value::Float(row.try_get::<f32, _>(index)?.into()),
        "DOUBLE" => Value::Float(row.try_get(index)?),
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            Value::Bytes(row.try_get_unchecked(index)?)
        }
        _ => match row.try_get_unchecked::<String, _>(index) {
            Ok(v) => Value::Text(v),
            Err(_) => Value::Bytes(row.try_get_unchecked(index)?),
        },
    };

    Ok(value)
}
