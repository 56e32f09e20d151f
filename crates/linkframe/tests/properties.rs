use linkframe::{Error, error::LinkageSpecificationError, prelude::*};
use proptest::prelude::*;
use std::{collections::BTreeSet, rc::Rc};

const COLUMNS: [&str; 4] = ["a", "b", "c", "d"];

// ---- strategies --------------------------------------------------------

fn arb_keys() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::btree_set(0i64..30, 1..12).prop_map(|keys| keys.into_iter().collect())
}

fn arb_level_names() -> impl Strategy<Value = (Vec<&'static str>, Vec<&'static str>)> {
    (
        prop::sample::subsequence(COLUMNS.to_vec(), 1..=4),
        prop::sample::subsequence(COLUMNS.to_vec(), 1..=4),
    )
        .prop_filter("level counts differ", |(owner, target)| {
            owner.len() != target.len()
        })
}

// ---- helpers -----------------------------------------------------------

fn keyed(keys: &[i64]) -> Table {
    let values = keys.iter().map(|key| key * 10);

    Table::new(RowIndex::named("id", keys.iter().copied()), [("x", Column::ints(values))])
        .expect("table")
}

fn wide(rows: usize) -> Table {
    let column = || Column::ints((0i64..3).cycle().take(rows));

    Table::from_columns(COLUMNS.map(|name| (name, column()))).expect("table")
}

proptest! {
    #[test]
    fn one_to_one_round_trip_restores_present_rows(
        owner_keys in arb_keys(),
        target_keys in arb_keys(),
    ) {
        let mut back = keyed(&owner_keys);
        back.set_column_fill("x", -1).expect("fill");
        let back = Rc::new(back);

        let mut target = keyed(&target_keys);
        target.link_to(&back, "back", LinkOptions::new()).expect("back link");
        let target = Rc::new(target);

        let mut owner = keyed(&owner_keys);
        owner.link_to(&target, "target", LinkOptions::new()).expect("link");

        let resolved = owner.resolve_chain("target", &["back", "x"]).expect("resolve");
        let present: BTreeSet<i64> = target_keys.iter().copied().collect();
        let expected: Vec<Value> = owner_keys
            .iter()
            .map(|key| Value::Int(if present.contains(key) { key * 10 } else { -1 }))
            .collect();

        prop_assert_eq!(resolved.values(), expected.as_slice());
    }

    #[test]
    fn level_count_mismatch_always_fails(
        (owner_names, target_names) in arb_level_names(),
    ) {
        let target = Rc::new(wide(3));
        let mut owner = wide(3);

        let err = owner
            .link_to(
                &target,
                "link",
                LinkOptions::new().on_self(owner_names.clone()).on_other(target_names.clone()),
            )
            .unwrap_err();

        prop_assert_eq!(
            err,
            Error::Specification(LinkageSpecificationError::LevelCountMismatch {
                owner: owner_names.len(),
                target: target_names.len(),
            })
        );
    }

    #[test]
    fn sum_of_one_matches_count(
        owner_keys in arb_keys(),
        target_keys in prop::collection::vec(0i64..30, 1..20),
    ) {
        // guarantee a repeated target key
        let mut target_keys = target_keys;
        target_keys.push(target_keys[0]);
        let target = Rc::new(
            Table::from_columns([
                ("id", Column::ints(target_keys.clone())),
                ("v", Column::ints(target_keys.clone())),
            ])
            .expect("target"),
        );
        let mut owner = keyed(&owner_keys);
        owner
            .link_to(&target, "items", LinkOptions::new().self_levels(["id"]).on_other(["id"]))
            .expect("link");
        let options = AggregateOptions::default();
        let sum = owner.resolve_aggregate("items", &[], "sum", "1", &options).expect("sum");
        let count = owner.resolve_aggregate("items", &[], "count", "v", &options).expect("count");

        let expected: Vec<Value> = owner_keys
            .iter()
            .map(|key| {
                let matches = i64::try_from(target_keys.iter().filter(|&id| id == key).count())
                    .expect("count");
                Value::Int(if matches == 0 { -1 } else { matches })
            })
            .collect();

        prop_assert_eq!(&sum, &count);
        prop_assert_eq!(sum.values(), expected.as_slice());
    }

    #[test]
    fn take_reslices_the_cached_indexer(
        owner_keys in prop::collection::vec(0i64..10, 1..15),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..15),
    ) {
        let target = Rc::new(keyed(&[1, 3, 5, 7]));
        let mut owner = Table::from_columns([("id", Column::ints(owner_keys.clone()))])
            .expect("owner");
        owner
            .link_to(&target, "target", LinkOptions::new().on_self(["id"]))
            .expect("link");

        let positions: Vec<usize> = picks.iter().map(|pick| pick.index(owner_keys.len())).collect();
        let full = owner
            .link("target")
            .expect("link")
            .indexer(&owner)
            .expect("indexer")
            .as_slice()
            .to_vec();
        let subset = owner.take(&positions).expect("rows");
        let resliced = subset
            .link("target")
            .expect("link")
            .indexer(&subset)
            .expect("indexer")
            .as_slice()
            .to_vec();

        let expected: Vec<i64> = positions.iter().map(|&position| full[position]).collect();
        prop_assert_eq!(resliced, expected);
    }
}
