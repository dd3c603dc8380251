use std::path::PathBuf;
use thiserror::Error;

/// Why provisioning a database from a script did not complete.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("couldn't read the setup script: {0:#}")]
    ScriptUnreadable(anyhow::Error),

    #[error("setup script {} contains no statements", .0.display())]
    EmptyScript(PathBuf),

    #[error("couldn't connect to the database: {0:#}")]
    Connection(anyhow::Error),

    #[error("statement {index} failed: {source:#}\n{statement}")]
    Statement {
        index: usize,
        statement: String,
        source: anyhow::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("no database name was given")]
    MissingDatabaseName,

    #[error("no setup script path was given")]
    MissingScriptPath,

    #[error("setup script {} does not exist", .0.display())]
    ScriptNotFound(PathBuf),

    #[error("invalid connection configuration: {0:#}")]
    Config(anyhow::Error),

    #[error("couldn't create the database")]
    CreationFailed(#[source] ProvisionError),
}
