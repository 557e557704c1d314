pub use crate::{
    memory::MemoryTable,
    registry::TableRegistry,
    sqlite::{SqliteTable, SqliteTableConnectionError},
};

use {
    std::sync::Arc,
    thiserror::Error,
    tally_core::{Item, ItemKey, UpdateExpression},
};

mod memory;
mod registry;
mod sqlite;

/// Key-value table addressed by a numeric partition key.
///
/// Every call is atomic on its own. Nothing spans two calls, so a read followed
/// by an update can interleave with other callers doing the same.
pub trait Table {
    fn get_item(&self, key: &ItemKey) -> Result<Option<Item>, StorageError>;

    /// Sets one attribute of the item stored under `key`. Creates the item
    /// (holding the key and that attribute) when there is none yet.
    fn update_item(&self, key: &ItemKey, update: &UpdateExpression) -> Result<(), StorageError>;

    /// Replaces the whole item. Used for seeding, never by the counter itself.
    fn put_item(&self, key: &ItemKey, item: Item) -> Result<(), StorageError>;
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum StorageError {
    /// Storage operation failed because of internal error in storage implementation
    /// If this happens, something is very broken (similar to 503 response in http).
    #[error("internal storage error: {description}")]
    InternalError {
        description: String,
    },

    /// No table is registered under the requested name.
    #[error("table not found: {table_name}")]
    TableNotFound {
        table_name: String,
    },
}

#[derive(Clone)]
pub struct BoxedTable {
    inner: Arc<dyn Table + Send + Sync>,
}

impl BoxedTable {
    pub fn new<T: Table + Send + Sync + 'static>(inner: T) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl Table for BoxedTable {
    fn get_item(&self, key: &ItemKey) -> Result<Option<Item>, StorageError> {
        self.inner.get_item(key)
    }

    fn update_item(&self, key: &ItemKey, update: &UpdateExpression) -> Result<(), StorageError> {
        self.inner.update_item(key, update)
    }

    fn put_item(&self, key: &ItemKey, item: Item) -> Result<(), StorageError> {
        self.inner.put_item(key, item)
    }
}

impl<T: Table> Table for Arc<T> {
    fn get_item(&self, key: &ItemKey) -> Result<Option<Item>, StorageError> { self.as_ref().get_item(key) }
    fn update_item(&self, key: &ItemKey, update: &UpdateExpression) -> Result<(), StorageError> { self.as_ref().update_item(key, update) }
    fn put_item(&self, key: &ItemKey, item: Item) -> Result<(), StorageError> { self.as_ref().put_item(key, item) }
}

pub trait WithItem: Sized {
    fn with_item(self, key: &ItemKey, item: impl Into<Item>) -> Result<Self, StorageError>;
}

impl<T: Table> WithItem for T {
    fn with_item(self, key: &ItemKey, item: impl Into<Item>) -> Result<Self, StorageError> {
        self.put_item(key, item.into())?;
        Ok(self)
    }
}
