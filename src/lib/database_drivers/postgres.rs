use crate::database_drivers::DatabaseDriver;
use crate::error::ProvisionError;
use crate::value::{Table, Value};
use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use log::debug;
use sqlx::postgres::PgRow;
use sqlx::{Column, Executor, PgConnection, Row, Statement, TypeInfo, ValueRef};

use super::utils;

pub struct PostgresDriver {
    url: String,
    wait_timeout: Option<usize>,
}

impl PostgresDriver {
    pub fn new(db_url: &str, wait_timeout: Option<usize>) -> Result<PostgresDriver> {
        let mut parsed_db_url = url::Url::parse(db_url)?;
        parsed_db_url
            .set_scheme("postgresql")
            .map_err(|_| anyhow!("Invalid postgres url: {}", db_url))?;

        Ok(PostgresDriver {
            url: parsed_db_url.to_string(),
            wait_timeout,
        })
    }

    async fn connect(&self, url: &str) -> Result<PgConnection> {
        utils::connect::<PgConnection>(url, self.wait_timeout).await
    }
}

impl DatabaseDriver for PostgresDriver {
    fn database_exists<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<bool>> {
        let fut = async move {
            let mut client = self.connect(&self.url).await?;
            let row = sqlx::query("SELECT oid FROM pg_database WHERE datname = $1")
                .bind(name)
                .fetch_optional(&mut client)
                .await?;

            Ok(row.is_some())
        };

        Box::pin(fut)
    }

    fn create_database<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>> {
        let fut = async move {
            let query = format!("CREATE DATABASE {}", utils::quote_identifier(name, '"'));

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

            // Sessions still attached to the database would make the drop fail.
            sqlx::query(
                "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
                 WHERE datname = $1 AND pid <> pg_backend_pid()",
            )
            .bind(name)
            .execute(&mut client)
            .await?;

            let query = format!(
                "DROP DATABASE IF EXISTS {}",
                utils::quote_identifier(name, '"')
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

// Queries without bind parameters go over the simple protocol, so every value
// arrives in text form and unknown types can be read as strings.
fn decode_value(row: &PgRow, index: usize) -> Result<Value> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let type_name = raw.type_info().name().to_string();
    let value = match type_name.as_str() {
        "BOOL" => Value::Bool(row.try_get(index)?),
        "INT2" => Value::Int(row.try_get::<i16, _>(index)?.into()),
        "INT4" => Value::Int(row.try_get::<i32, _>(index)?.into()),
        "INT8" => Value::Int(row.try_get(index)?),
        "FLOAT4" => Value::Float(row.try_get::<f32, _>(index)?.into()),
        "FLOAT8" => Value::Float(row.try_get(index)?),
        "BYTEA" => Value::Bytes(row.try_get(index)?),
        _ => Value::Text(row.try_get_unchecked(index)?),
    };

    Ok(value)
}
