pub mod config;
mod database_drivers;
pub mod error;
mod management;
mod manager;
mod query;
pub mod script;
#[cfg(test)]
mod test_utils;
mod value;

pub use config::{Database, ManagerConfig, ServerConfig};
pub use error::{ManagerError, ProvisionError};
pub use management::{CreateOutcome, DatabaseAdmin};
pub use manager::DatabaseManager;
pub use value::{Table, Value};

pub async fn create_database(config: ManagerConfig) -> anyhow::Result<CreateOutcome> {
    config.validate()?;

    let outcome = DatabaseAdmin::for_database(config.server.clone(), &config.database_name)?
        .create_if_absent(&config.database_name, &config.script_path)
        .await?;
    Ok(outcome)
}

pub async fn database_exists(server: ServerConfig, name: &str) -> anyhow::Result<bool> {
    DatabaseAdmin::for_database(server, name)?
        .database_exists(name)
        .await
}

pub async fn drop_database(server: ServerConfig, name: &str) -> anyhow::Result<bool> {
    DatabaseAdmin::for_database(server, name)?
        .drop_database(name)
        .await
}

fn query_admin(server: ServerConfig, database: Option<&str>) -> anyhow::Result<DatabaseAdmin> {
    match database {
        Some(name) => DatabaseAdmin::for_database(server, name),
        None => DatabaseAdmin::new(server),
    }
}

pub async fn execute_non_query(
    server: ServerConfig,
    database: Option<&str>,
    query: &str,
) -> anyhow::Result<u64> {
    query_admin(server, database)?.execute_non_query(query).await
}

pub async fn execute_scalar(
    server: ServerConfig,
    database: Option<&str>,
    query: &str,
) -> anyhow::Result<Option<Value>> {
    query_admin(server, database)?.execute_scalar(query).await
}

pub async fn execute_reader(
    server: ServerConfig,
    database: Option<&str>,
    query: &str,
) -> anyhow::Result<Table> {
    query_admin(server, database)?.execute_reader(query).await
}
