use {
    std::sync::{Arc, Mutex, MutexGuard},
    tracing::debug,
    thiserror::Error,
    rusqlite::{Connection, OptionalExtension},
    tally_core::{AttributeValue, Item, ItemKey, UpdateExpression, PARTITION_KEY_ATTRIBUTE},
    crate::{Table, StorageError},
};

/// Table backed by sqlite. Several named tables can share one database file,
/// items are kept as json-encoded attribute maps.
#[derive(Clone)]
pub struct SqliteTable {
    connection: Arc<Mutex<Connection>>,
    table_name: String,
}

#[derive(Error, Debug)]
pub enum SqliteTableConnectionError {
    #[error("failed to open connection: {0:?}")]
    ConnectionOpenError(rusqlite::Error),

    #[error("failed to init database: {0:?}")]
    DatabaseInitError(rusqlite::Error),
}

impl SqliteTable {
    pub fn open(path: impl AsRef<std::path::Path>, table_name: impl Into<String>) -> Result<Self, SqliteTableConnectionError> {
        Self::from_connection(
            Connection::open(path)
                .map_err(SqliteTableConnectionError::ConnectionOpenError)?,
            table_name,
        )
    }

    pub fn in_memory(table_name: impl Into<String>) -> Result<Self, SqliteTableConnectionError> {
        Self::from_connection(
            Connection::open_in_memory()
                .map_err(SqliteTableConnectionError::ConnectionOpenError)?,
            table_name,
        )
    }

    fn from_connection(connection: Connection, table_name: impl Into<String>) -> Result<Self, SqliteTableConnectionError> {
        connection.execute(
            "create table if not exists items (table_name text not null, id integer not null, item text not null, primary key (table_name, id))",
            (),
        ).map_err(SqliteTableConnectionError::DatabaseInitError)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            table_name: table_name.into(),
        })
    }

    /// Another table living in the same database.
    pub fn table(&self, table_name: impl Into<String>) -> Self {
        Self {
            connection: self.connection.clone(),
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.connection.lock()
            .map_err(|err| StorageError::InternalError { description: format!("failed to acquire sqlite connection: {err:?}") })
    }

    fn read_item(&self, connection: &Connection, key: &ItemKey) -> Result<Option<Item>, StorageError> {
        let encoded: Option<String> = connection
            .query_row(
                "select item from items where table_name = ?1 and id = ?2",
                (&self.table_name, key.id),
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StorageError::InternalError { description: format!("failed to read item from sqlite: {err:?}") })?;

        encoded
            .map(|v| serde_json::from_str(&v)
                .map_err(|err| StorageError::InternalError { description: format!("failed to decode stored item: {err:?}") }))
            .transpose()
    }

    fn write_item(&self, connection: &Connection, key: &ItemKey, item: &Item) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(item)
            .map_err(|err| StorageError::InternalError { description: format!("failed to encode item: {err:?}") })?;
        connection.execute(
            "insert or replace into items (table_name, id, item) values (?1, ?2, ?3)",
            (&self.table_name, key.id, &encoded),
        )
            .map_err(|err| StorageError::InternalError { description: format!("failed to execute sqlite query: {err:?}") })
            .map(|_| ())
    }
}

impl Table for SqliteTable {
    fn get_item(&self, key: &ItemKey) -> Result<Option<Item>, StorageError> {
        let connection = self.lock()?;
        self.read_item(&connection, key)
    }

    fn update_item(&self, key: &ItemKey, update: &UpdateExpression) -> Result<(), StorageError> {
        let mut connection = self.lock()?;
        let transaction = connection.transaction()
            .map_err(|err| StorageError::InternalError { description: format!("failed to start sqlite transaction: {err:?}") })?;

        let mut item = self.read_item(&transaction, key)?.unwrap_or_else(|| Item::for_key(key));
        update.apply(&mut item);
        self.write_item(&transaction, key, &item)?;

        transaction.commit()
            .map_err(|err| StorageError::InternalError { description: format!("failed to commit sqlite transaction: {err:?}") })?;
        debug!(table = self.table_name.as_str(), "applied {update} to item {key}");
        Ok(())
    }

    fn put_item(&self, key: &ItemKey, item: Item) -> Result<(), StorageError> {
        let item = item.with_attribute(PARTITION_KEY_ATTRIBUTE, AttributeValue::number(key.id));
        let connection = self.lock()?;
        self.write_item(&connection, key, &item)
    }
}
