use {
    std::{env, fs, process},
    tally_core::{AttributeValue, CounterRecord, Item, ItemKey, UpdateExpression},
    tally_store::{BoxedTable, MemoryTable, SqliteTable, StorageError, Table, TableRegistry, WithItem},
};

fn tables() -> Vec<(&'static str, BoxedTable)> {
    vec![
        ("memory", BoxedTable::new(MemoryTable::new())),
        ("sqlite", BoxedTable::new(SqliteTable::in_memory("counter-table").unwrap())),
    ]
}

#[test]
fn get_missing_item() {
    for (name, table) in tables() {
        assert_eq!(None, table.get_item(&ItemKey::new(1)).unwrap(), "backend: {name}");
    }
}

#[test]
fn put_then_get() {
    for (name, table) in tables() {
        let table = table.with_item(&CounterRecord::key(), CounterRecord::new(10)).unwrap();
        let item = table.get_item(&CounterRecord::key()).unwrap().unwrap();
        assert_eq!(Some(&AttributeValue::number(10)), item.get("counter"), "backend: {name}");
        assert_eq!(Some(&AttributeValue::number(1)), item.get("id"), "backend: {name}");
    }
}

#[test]
fn put_overrides_key_attribute() {
    for (name, table) in tables() {
        let item = Item::new()
            .with_attribute("id", AttributeValue::number(42))
            .with_attribute("counter", AttributeValue::string("test"));
        table.put_item(&ItemKey::new(1), item).unwrap();

        let stored = table.get_item(&ItemKey::new(1)).unwrap().unwrap();
        assert_eq!(Some(&AttributeValue::number(1)), stored.get("id"), "backend: {name}");
        assert_eq!(Some(&AttributeValue::string("test")), stored.get("counter"), "backend: {name}");
        assert_eq!(None, table.get_item(&ItemKey::new(42)).unwrap(), "backend: {name}");
    }
}

#[test]
fn update_keeps_other_attributes() {
    for (name, table) in tables() {
        let item = Item::from(CounterRecord::new(3)).with_attribute("owner", AttributeValue::string("me"));
        table.put_item(&CounterRecord::key(), item).unwrap();

        table.update_item(&CounterRecord::key(), &UpdateExpression::set("counter", AttributeValue::number(4))).unwrap();

        let stored = table.get_item(&CounterRecord::key()).unwrap().unwrap();
        assert_eq!(Some(&AttributeValue::number(4)), stored.get("counter"), "backend: {name}");
        assert_eq!(Some(&AttributeValue::string("me")), stored.get("owner"), "backend: {name}");
    }
}

#[test]
fn update_creates_missing_item() {
    for (name, table) in tables() {
        table.update_item(&ItemKey::new(1), &UpdateExpression::set("counter", AttributeValue::number(1))).unwrap();

        let stored = table.get_item(&ItemKey::new(1)).unwrap().unwrap();
        assert_eq!(Item::from(CounterRecord::new(1)), stored, "backend: {name}");
    }
}

#[test]
fn sqlite_tables_share_database_but_not_items() {
    let first = SqliteTable::in_memory("first").unwrap();
    let second = first.table("second");

    first.put_item(&ItemKey::new(1), CounterRecord::new(5).into()).unwrap();

    assert_eq!("second", second.table_name());
    assert_eq!(None, second.get_item(&ItemKey::new(1)).unwrap());
    assert!(first.get_item(&ItemKey::new(1)).unwrap().is_some());
}

#[test]
fn sqlite_persists_on_disk() {
    let path = env::temp_dir().join(format!("tally-store-test-{}.db", process::id()));
    let _ = fs::remove_file(&path);

    {
        let table = SqliteTable::open(&path, "counter-table").unwrap();
        table.put_item(&CounterRecord::key(), CounterRecord::new(7).into()).unwrap();
    }

    let reopened = SqliteTable::open(&path, "counter-table").unwrap();
    let item = reopened.get_item(&CounterRecord::key()).unwrap().unwrap();
    assert_eq!(Some(&AttributeValue::number(7)), item.get("counter"));

    drop(reopened);
    fs::remove_file(&path).unwrap();
}

#[test]
fn registry_resolves_registered_tables() {
    let table = MemoryTable::new();
    let registry = TableRegistry::new()
        .with_table("counter-table", BoxedTable::new(table.clone()))
        .unwrap();

    registry.resolve("counter-table").unwrap()
        .put_item(&CounterRecord::key(), CounterRecord::new(2).into())
        .unwrap();
    assert!(table.get_item(&CounterRecord::key()).unwrap().is_some());

    match registry.resolve("other-table") {
        Err(StorageError::TableNotFound { table_name }) => assert_eq!("other-table", table_name),
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("expected table not found"),
    }
}
