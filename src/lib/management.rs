use crate::config::ServerConfig;
use crate::database_drivers::{self, DatabaseDriver};
use crate::error::ProvisionError;
use crate::script;
use anyhow::{bail, Result};
use log::{error, info, warn};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The database was created and the script ran to the end.
    Created { statements: usize },
    AlreadyExists,
}

/// Administrative access to one database server plus a working database for
/// ad-hoc queries.
pub struct DatabaseAdmin {
    pub(crate) config: ServerConfig,
    pub(crate) server: Box<dyn DatabaseDriver>,
    pub(crate) database: Box<dyn DatabaseDriver>,
}

impl DatabaseAdmin {
    /// Queries run against `database_url`, or against the admin url when none is set.
    pub fn new(config: ServerConfig) -> Result<DatabaseAdmin> {
        let query_url = config
            .database_url
            .clone()
            .unwrap_or_else(|| config.admin_url.clone());

        DatabaseAdmin::with_query_url(config, &query_url)
    }

    /// Like `new`, but queries default to `name` on the admin server.
    pub fn for_database(config: ServerConfig, name: &str) -> Result<DatabaseAdmin> {
        let query_url = match &config.database_url {
            Some(url) => url.clone(),
            None => database_drivers::database_url(&config.admin_url, name)?,
        };

        DatabaseAdmin::with_query_url(config, &query_url)
    }

    fn with_query_url(config: ServerConfig, query_url: &str) -> Result<DatabaseAdmin> {
        let server = database_drivers::new(&config.admin_url, config.wait_timeout)?;
        let database = database_drivers::new(query_url, config.wait_timeout)?;

        Ok(DatabaseAdmin::with_drivers(config, server, database))
    }

    pub(crate) fn with_drivers(
        config: ServerConfig,
        server: Box<dyn DatabaseDriver>,
        database: Box<dyn DatabaseDriver>,
    ) -> DatabaseAdmin {
        DatabaseAdmin {
            config,
            server,
            database,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Creates `name` from the script unless it already exists.
    ///
    /// The existence check and the creation are separate round trips, so two
    /// callers racing on the same name can both try to create it.
    pub async fn create_if_absent(
        &self,
        name: &str,
        script_path: &Path,
    ) -> Result<CreateOutcome, ProvisionError> {
        ensure_name(name)?;

        match self.server.database_exists(name).await {
            Ok(true) => {
                info!("Database {} already exists, skipping setup script", name);
                return Ok(CreateOutcome::AlreadyExists);
            }
            Ok(false) => {}
            Err(err) => {
                error!("Couldn't check if database {} exists: {:?}", name, err);
                return Err(ProvisionError::Other(err));
            }
        }

        let statements = match script::load(
            script_path,
            &self.config.batch_separator,
            self.config.backslash_escapes(),
        )
        .await
        {
            Ok(statements) => statements,
            Err(err) => {
                error!("Couldn't read setup script: {:?}", err);
                return Err(ProvisionError::ScriptUnreadable(err));
            }
        };

        if statements.is_empty() {
            error!("Setup script {} has no statements", script_path.display());
            return Err(ProvisionError::EmptyScript(script_path.to_path_buf()));
        }

        info!("Creating database {}", name);
        if let Err(err) = self.server.create_database(name).await {
            error!("Couldn't create database {}: {:?}", name, err);
            return Err(ProvisionError::Other(err));
        }

        info!(
            "Running {} statements from {}",
            statements.len(),
            script_path.display()
        );
        if let Err(err) = self.server.execute_script(name, &statements).await {
            error!("Setup script for {} failed: {}", name, err);

            // Remove the half built database.
            if let Err(drop_err) = self.server.drop_database(name).await {
                warn!(
                    "Couldn't remove partially created database {}: {:?}",
                    name, drop_err
                );
            }

            return Err(err);
        }

        Ok(CreateOutcome::Created {
            statements: statements.len(),
        })
    }

    pub async fn database_exists(&self, name: &str) -> Result<bool> {
        ensure_name(name)?;
        self.server.database_exists(name).await
    }

    /// Drops `name`, disconnecting anyone still using it. Returns false when
    /// there was nothing to drop.
    pub async fn drop_database(&self, name: &str) -> Result<bool> {
        ensure_name(name)?;

        if !self.server.database_exists(name).await? {
            info!("Database {} does not exist, nothing to drop", name);
            return Ok(false);
        }

        info!("Dropping database {}", name);
        self.server.drop_database(name).await?;
        Ok(true)
    }
}

fn ensure_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("no database name was given");
    }

    Ok(())
}
