use crate::value::{Table, Value};
use anyhow::{bail, Result};
use log::info;
use sqlx::{Column, Connection, Row};
use std::time::Duration;

// Opens a connection, retrying once per second for up to `wait_timeout`
// seconds while the server is still coming up.
pub async fn connect<C: Connection>(url: &str, wait_timeout: Option<usize>) -> Result<C> {
    let wait_timeout = wait_timeout.unwrap_or(0);
    let mut count = 0;

    loop {
        match C::connect(url).await {
            Ok(c) => return Ok(c),
            Err(e) => {
                if count >= wait_timeout {
                    bail!(e);
                }

                info!("Waiting for database to be ready");
                count += 1;
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

pub fn column_names<R: Row>(row: &R) -> Vec<String> {
    row.columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect()
}

pub fn into_table<R: Row>(
    columns: Vec<String>,
    rows: &[R],
    decode: fn(&R, usize) -> Result<Value>,
) -> Result<Table> {
    let rows = rows
        .iter()
        .map(|row| (0..row.len()).map(|i| decode(row, i)).collect::<Result<Vec<Value>>>())
        .collect::<Result<Vec<Vec<Value>>>>()?;

    Ok(Table { columns, rows })
}

pub fn first_value<R: Row>(
    row: Option<R>,
    decode: fn(&R, usize) -> Result<Value>,
) -> Result<Option<Value>> {
    match row {
        Some(row) if !row.is_empty() => Ok(Some(decode(&row, 0)?)),
        _ => Ok(None),
    }
}

pub fn quote_identifier(name: &str, quote: char) -> String {
    let escaped = name.replace(quote, &format!("{}{}", quote, quote));
    format!("{}{}{}", quote, escaped, quote)
}
