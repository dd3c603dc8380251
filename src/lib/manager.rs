use crate::config::ManagerConfig;
use crate::error::{ManagerError, ProvisionError};
use crate::management::{CreateOutcome, DatabaseAdmin};
use crate::value::{Table, Value};
use anyhow::Result;
use log::info;

/// A database that is guaranteed to have been provisioned from its setup
/// script by the time the value exists.
pub struct DatabaseManager {
    config: ManagerConfig,
    admin: DatabaseAdmin,
}

impl DatabaseManager {
    /// Validates the configuration, then creates the database from the script
    /// unless it already exists. Nothing touches the server when validation fails.
    pub async fn new(config: ManagerConfig) -> Result<DatabaseManager, ManagerError> {
        config.validate()?;

        let admin = DatabaseAdmin::for_database(config.server.clone(), &config.database_name)
            .map_err(ManagerError::Config)?;

        DatabaseManager::with_admin(config, admin).await
    }

    pub(crate) async fn with_admin(
        config: ManagerConfig,
        admin: DatabaseAdmin,
    ) -> Result<DatabaseManager, ManagerError> {
        config.validate()?;

        let manager = DatabaseManager { config, admin };
        let outcome = manager
            .create_database()
            .await
            .map_err(ManagerError::CreationFailed)?;
        info!("Database {} ready ({:?})", manager.config.database_name, outcome);

        Ok(manager)
    }

    /// Creates the configured database from the configured script if it is missing.
    pub async fn create_database(&self) -> Result<CreateOutcome, ProvisionError> {
        self.admin
            .create_if_absent(&self.config.database_name, &self.config.script_path)
            .await
    }

    pub async fn database_exists(&self) -> Result<bool> {
        self.admin.database_exists(&self.config.database_name).await
    }

    pub async fn drop_database(&self) -> Result<bool> {
        self.admin.drop_database(&self.config.database_name).await
    }

    pub async fn execute_non_query(&self, query: &str) -> Result<u64> {
        self.admin.execute_non_query(query).await
    }

    pub async fn execute_scalar(&self, query: &str) -> Result<Option<Value>> {
        self.admin.execute_scalar(query).await
    }

    pub async fn execute_reader(&self, query: &str) -> Result<Table> {
        self.admin.execute_reader(query).await
    }

    pub fn admin(&self) -> &DatabaseAdmin {
        &self.admin
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }
}
