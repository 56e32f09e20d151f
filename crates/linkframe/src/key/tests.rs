use crate::{
    column::Column,
    error::{LinkageSpecificationError, TableError},
    key::{Key, KeyPositions, KeySelector, RowIndex, factorize, is_unique},
    table::Table,
    value::Value,
};

// ---- helpers -----------------------------------------------------------

fn households() -> Table {
    let index = RowIndex::from_levels(vec![
        (
            "zone".to_string(),
            vec![Value::Int(1), Value::Int(1), Value::Int(2)],
        ),
        (
            "hh".to_string(),
            vec![Value::Int(10), Value::Int(11), Value::Int(10)],
        ),
    ])
    .expect("index");

    Table::new(
        index,
        [
            ("region", Column::texts(["n", "n", "s"])),
            ("size", Column::ints([2, 4, 1])),
        ],
    )
    .expect("table")
}

// ---- selectors ---------------------------------------------------------

#[test]
fn index_selector_reads_every_level() {
    let table = households();
    let keys = KeySelector::Index.resolve(&table).expect("keys");

    assert_eq!(keys[1], Key::new(vec![Value::Int(1), Value::Int(11)]));
    assert_eq!(KeySelector::Index.nlevels(&table), 2);
}

#[test]
fn level_selector_picks_named_levels_in_request_order() {
    let table = households();
    let selector = KeySelector::Levels(vec!["hh".into(), "zone".into()]);
    let keys = selector.resolve(&table).expect("keys");

    assert_eq!(keys[2], Key::new(vec![Value::Int(10), Value::Int(2)]));
}

#[test]
fn column_selector_builds_composite_keys() {
    let table = households();
    let selector = KeySelector::Columns(vec!["region".into(), "size".into()]);
    let keys = selector.resolve(&table).expect("keys");

    assert_eq!(keys[0], Key::new(vec![Value::text("n"), Value::Int(2)]));
    assert_eq!(selector.depends_on_columns(), ["region", "size"]);
}

#[test]
fn missing_labels_are_specification_errors() {
    let table = households();

    assert_eq!(
        KeySelector::Columns(vec!["nope".into()]).resolve(&table),
        Err(LinkageSpecificationError::MissingColumn("nope".into()))
    );
    assert_eq!(
        KeySelector::Levels(vec!["nope".into()]).resolve(&table),
        Err(LinkageSpecificationError::MissingLevel("nope".into()))
    );
    assert_eq!(
        KeySelector::Levels(vec!["zone".into(), "hh".into(), "x".into()]).resolve(&table),
        Err(LinkageSpecificationError::TooManyLevels {
            requested: 3,
            available: 2
        })
    );
}

#[test]
fn selector_without_labels_reads_row_identity() {
    let selector = KeySelector::from_labels(None, false);

    assert_eq!(selector, KeySelector::Index);
    assert!(selector.from_row_identity());
    assert_eq!(selector.labels(), None);
}

#[test]
fn selector_display_names_its_source() {
    assert_eq!(
        KeySelector::Columns(vec!["a".into()]).to_string(),
        "From columns: [\"a\"]"
    );
    assert_eq!(KeySelector::Index.to_string(), "From index: all levels");
}

// ---- positions ---------------------------------------------------------

#[test]
fn factorize_uses_first_appearance_order() {
    let keys = vec![Key::from("b"), Key::from("a"), Key::from("b")];
    let (codes, uniques) = factorize(&keys);

    assert_eq!(codes, vec![0, 1, 0]);
    assert_eq!(uniques, vec![Key::from("b"), Key::from("a")]);
}

#[test]
fn key_positions_return_the_first_match() {
    let keys = vec![Key::from(1), Key::from(2), Key::from(1)];
    let positions = KeyPositions::first_positions(&keys);

    assert_eq!(positions.get(&Key::from(1)), Some(0));
    assert_eq!(positions.get(&Key::from(3)), None);
    assert!(!is_unique(&keys));
    assert!(is_unique(&keys[..2]));
}

// ---- row index ---------------------------------------------------------

#[test]
fn row_index_rejects_ragged_keys() {
    let err = RowIndex::new(
        vec![Some("a".into())],
        vec![Key::from(1), Key::new(vec![Value::Int(1), Value::Int(2)])],
    )
    .unwrap_err();

    assert_eq!(
        err,
        TableError::IndexLevelMismatch {
            row: 1,
            expected: 1,
            actual: 2
        }
    );
}

#[test]
fn range_index_matches_signed_labels() {
    let index = RowIndex::range(3);

    assert_eq!(index.positions_of(&Key::from(2)), vec![2]);
    assert_eq!(index.names().to_vec(), vec![None::<String>]);
}

#[test]
fn composite_keys_display_as_tuples() {
    let key = Key::new(vec![Value::text("A"), Value::Int(1)]);

    assert_eq!(key.to_string(), "(\"A\", 1)");
    assert_eq!(Key::from(5).to_string(), "5");
}

#[test]
fn level_values_are_read_by_name() {
    let table = households();
    let index = table.index();

    assert_eq!(
        index.level_values("hh"),
        Some(vec![&Value::Int(10), &Value::Int(11), &Value::Int(10)])
    );
    assert_eq!(index.level_values("taz"), None);
}
