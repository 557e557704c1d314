use {
    std::{collections::HashMap, sync::{Arc, Mutex, MutexGuard}},
    tally_core::{AttributeValue, Item, ItemKey, UpdateExpression, PARTITION_KEY_ATTRIBUTE},
    crate::{Table, StorageError},
};

#[derive(Clone, Default)]
pub struct MemoryTable {
    items: Arc<Mutex<HashMap<ItemKey, Item>>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<ItemKey, Item>>, StorageError> {
        self.items.lock()
            .map_err(|err| StorageError::InternalError { description: format!("failed to lock memory table: {err:?}") })
    }
}

impl Table for MemoryTable {
    fn get_item(&self, key: &ItemKey) -> Result<Option<Item>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn update_item(&self, key: &ItemKey, update: &UpdateExpression) -> Result<(), StorageError> {
        let mut items = self.lock()?;
        let item = items.entry(*key).or_insert_with(|| Item::for_key(key));
        update.apply(item);
        Ok(())
    }

    fn put_item(&self, key: &ItemKey, item: Item) -> Result<(), StorageError> {
        let item = item.with_attribute(PARTITION_KEY_ATTRIBUTE, AttributeValue::number(key.id));
        self.lock()?.insert(*key, item);
        Ok(())
    }
}
