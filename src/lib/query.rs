use crate::management::DatabaseAdmin;
use crate::value::{Table, Value};
use anyhow::Result;
use log::debug;

// Query text is sent as is. Callers are responsible for anything they splice into it.
impl DatabaseAdmin {
    pub async fn execute_non_query(&self, query: &str) -> Result<u64> {
        debug!("Executing non-query: {}", query);
        self.database.execute(query).await
    }

    pub async fn execute_scalar(&self, query: &str) -> Result<Option<Value>> {
        debug!("Executing scalar query: {}", query);
        self.database.fetch_scalar(query).await
    }

    pub async fn execute_reader(&self, query: &str) -> Result<Table> {
        debug!("Executing reader query: {}", query);
        self.database.fetch_table(query).await
    }
}
