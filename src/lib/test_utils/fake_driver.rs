use crate::database_drivers::DatabaseDriver;
use crate::error::ProvisionError;
use crate::value::{Table, Value};
use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeState {
    databases: HashSet<String>,
    executed: Vec<String>,
    create_calls: usize,
    exists_calls: usize,
}

/// In-memory driver that records what it was asked to do.
#[derive(Clone, Default)]
pub struct FakeDriver {
    state: Arc<Mutex<FakeState>>,
    failing_statement: Option<String>,
    unreachable: bool,
}

impl FakeDriver {
    pub fn with_databases(names: &[&str]) -> FakeDriver {
        let driver = FakeDriver::default();
        driver
            .state
            .lock()
            .unwrap()
            .databases
            .extend(names.iter().map(|n| n.to_string()));
        driver
    }

    pub fn failing_on(mut self, statement: &str) -> FakeDriver {
        self.failing_statement = Some(statement.to_string());
        self
    }

    /// Every catalog lookup fails as if the server were down.
    pub fn unreachable(mut self) -> FakeDriver {
        self.unreachable = true;
        self
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn exists_calls(&self) -> usize {
        self.state.lock().unwrap().exists_calls
    }

    pub fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }
}

impl DatabaseDriver for FakeDriver {
    fn database_exists<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.exists_calls += 1;
            if self.unreachable {
                return Err(anyhow!("connection refused"));
            }
            Ok(state.databases.contains(name))
        })
    }

    fn create_database<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.create_calls += 1;
            state.databases.insert(name.to_string());
            Ok(())
        })
    }

    fn execute_script<'a>(
        &'a self,
        _name: &'a str,
        statements: &'a [String],
    ) -> BoxFuture<'a, Result<(), ProvisionError>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            for (index, statement) in statements.iter().enumerate() {
                if self.failing_statement.as_deref() == Some(statement.as_str()) {
                    return Err(ProvisionError::Statement {
                        index: index + 1,
                        statement: statement.clone(),
                        source: anyhow!("no such table: nowhere"),
                    });
                }
                state.executed.push(statement.clone());
            }
            Ok(())
        })
    }

    fn drop_database<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.state.lock().unwrap().databases.remove(name);
            Ok(())
        })
    }

    fn execute<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<u64>> {
        Box::pin(async move {
            self.state.lock().unwrap().executed.push(query.to_string());
            Ok(1)
        })
    }

    fn fetch_scalar<'a>(&'a self, _query: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
        Box::pin(async move { Ok(Some(Value::Int(1))) })
    }

    fn fetch_table<'a>(&'a self, _query: &'a str) -> BoxFuture<'a, Result<Table>> {
        Box::pin(async move { Ok(Table::default()) })
    }
}
