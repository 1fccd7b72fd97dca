use xbase_table::writer::TableWriterBuilder;
use xbase_table::{Codepage, MemoFileType, Options, Table, Value};

fn open_for_create(path: &std::path::Path) -> std::fs::File {
    std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .unwrap()
}

fn write_dbase_iii_fixture(path: &std::path::Path) {
    let mut table = TableWriterBuilder::new()
        .add_character_field("NAME", 20)
        .add_numeric_field("AGE", 5, 0)
        .build(open_for_create(path))
        .unwrap();

    table.add_record().unwrap();
    table
        .set_value(0, Value::Character("Judiciary Sq".to_string()))
        .unwrap();
    table.set_value(1, Value::Number(34.0)).unwrap();

    table.add_record().unwrap();
    table
        .set_value(0, Value::Character("Metro Center".to_string()))
        .unwrap();
    table.set_value(1, Value::Number(51.0)).unwrap();
}

#[test]
fn read_only_round_trip_through_a_real_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stations.dbf");
    write_dbase_iii_fixture(&path);

    let mut table = Table::open_read_only(&path).unwrap();
    assert_eq!(table.size(), 2);
    assert_eq!(table.open_mode(), xbase_table::OpenMode::ReadOnly);

    assert!(table.next());
    assert_eq!(
        table.value_by_name("name"),
        Some(Value::Character("Judiciary Sq".to_string()))
    );
    assert_eq!(table.value_by_name("age"), Some(Value::Number(34.0)));

    assert!(table.next());
    assert_eq!(
        table.value_by_name("name"),
        Some(Value::Character("Metro Center".to_string()))
    );
    assert!(!table.next());
}

#[test]
fn append_record_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stations_rw.dbf");
    write_dbase_iii_fixture(&path);

    {
        let mut table = Table::open_read_write(&path).unwrap();
        assert_eq!(table.size(), 2);
        table.add_record().unwrap();
        table
            .set_value_by_name("name", Value::Character("Dalaran".to_string()))
            .unwrap();
        table.set_value_by_name("age", Value::Number(12.0)).unwrap();
        assert_eq!(table.size(), 3);
    }

    let mut reopened = Table::open_read_write(&path).unwrap();
    assert_eq!(reopened.size(), 3);
    reopened.seek(2);
    assert_eq!(
        reopened.value_by_name("name"),
        Some(Value::Character("Dalaran".to_string()))
    );
}

#[test]
fn delete_record_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stations_deleted.dbf");
    write_dbase_iii_fixture(&path);

    {
        let mut table = Table::open_read_write(&path).unwrap();
        table.seek(0);
        table.remove_record(0).unwrap();
    }

    let mut reopened = Table::open_read_only(&path).unwrap();
    reopened.seek(0);
    assert!(reopened.record().is_deleted());
    reopened.seek(1);
    assert!(!reopened.record().is_deleted());
}

#[test]
fn set_codepage_changes_the_active_translator() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("codepage.dbf");
    write_dbase_iii_fixture(&path);

    let mut table = Table::open_with_options(
        &path,
        Options {
            read_only: false,
            default_codepage: None,
        },
    )
    .unwrap();
    assert_eq!(table.codepage(), Codepage::NotSet);
    table.set_codepage(Codepage::Windows1252).unwrap();
    assert_eq!(table.codepage(), Codepage::Windows1252);

    let reopened = Table::open_read_only(&path).unwrap();
    assert_eq!(reopened.codepage(), Codepage::Windows1252);
}

#[test]
fn table_with_no_memo_field_opens_without_a_companion_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no_memo.dbf");
    let _table = TableWriterBuilder::new()
        .add_character_field("NAME", 10)
        .build(open_for_create(&path))
        .unwrap();
    drop(_table);

    let table = Table::open_read_only(&path).unwrap();
    assert_eq!(table.size(), 0);
}

#[test]
fn new_table_with_memo_field_creates_a_readable_companion_file() {
    let dir = tempfile::tempdir().unwrap();
    let dbf_path = dir.path().join("notes.dbf");
    let dbt_path = dir.path().join("notes.dbt");

    {
        let mut table = TableWriterBuilder::new()
            .add_character_field("NAME", 10)
            .add_memo_field("NOTES", 10, MemoFileType::DbaseMemo)
            .build_with_memo(open_for_create(&dbf_path), Some(open_for_create(&dbt_path)))
            .unwrap();

        table.add_record().unwrap();
        table
            .set_value_by_name("name", Value::Character("Gallery Pl".to_string()))
            .unwrap();
        table
            .set_value_by_name(
                "notes",
                Value::Memo(xbase_table::MemoValue::Text("transfer station".to_string())),
            )
            .unwrap();
    }

    let mut reopened = Table::open_read_write(&dbf_path).unwrap();
    assert_eq!(reopened.size(), 1);
    reopened.seek(0);
    assert_eq!(
        reopened.value_by_name("notes"),
        Some(Value::Memo(xbase_table::MemoValue::Text(
            "transfer station".to_string()
        )))
    );
}
