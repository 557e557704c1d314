use {
    std::{sync::{Arc, RwLock}, collections::HashMap},
    crate::{BoxedTable, StorageError},
};

/// Tables by name. Handlers resolve their table here on every invocation.
#[derive(Clone, Default)]
pub struct TableRegistry {
    registry: Arc<RwLock<HashMap<String, BoxedTable>>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, name: impl Into<String>, table: BoxedTable) -> Result<Self, StorageError> {
        self.register(name, table)?;
        Ok(self)
    }

    pub fn register(&self, name: impl Into<String>, table: BoxedTable) -> Result<(), StorageError> {
        self.registry.write()
            .map_err(|err| StorageError::InternalError { description: format!("failed to lock table registry: {err:?}") })?
            .insert(name.into(), table);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<BoxedTable, StorageError> {
        self.registry.read()
            .map_err(|err| StorageError::InternalError { description: format!("failed to lock table registry: {err:?}") })?
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::TableNotFound { table_name: name.to_owned() })
    }
}
