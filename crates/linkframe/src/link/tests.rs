use crate::{
    column::Column,
    error::{CardinalityError, Error, LinkageSpecificationError, ResolutionError},
    key::{KeySelector, RowIndex},
    link::{AggregationRequired, Cardinality, LinkOptions, LinkSummaryTable},
    table::Table,
};
use std::rc::Rc;

// ---- helpers -----------------------------------------------------------

fn zones() -> Rc<Table> {
    Rc::new(
        Table::new(
            RowIndex::named("zone", [1i64, 2, 3]),
            [("area", Column::floats([10.0, 20.0, 30.0]))],
        )
        .expect("zones")
        .with_name("zones"),
    )
}

fn households() -> Table {
    Table::new(
        RowIndex::named("hh", [100i64, 101, 102, 103]),
        [
            ("zone", Column::ints([1, 3, 4, 1])),
            ("cars", Column::ints([0, 1, 2, 1])),
        ],
    )
    .expect("households")
    .with_name("households")
}

fn persons() -> Rc<Table> {
    Rc::new(
        Table::new(
            RowIndex::range(5),
            [
                ("hh", Column::ints([100, 100, 101, 103, 103])),
                ("age", Column::ints([40, 12, 33, 70, 68])),
            ],
        )
        .expect("persons"),
    )
}

fn zone_link() -> LinkOptions {
    LinkOptions::new().on_self(["zone"]).other_levels(["zone"])
}

// ---- cardinality -------------------------------------------------------

#[test]
fn cardinality_follows_uniqueness_of_each_side() {
    assert_eq!(Cardinality::detect(true, true), Some(Cardinality::OneToOne));
    assert_eq!(
        Cardinality::detect(false, true),
        Some(Cardinality::RepeatedOwner)
    );
    assert_eq!(Cardinality::detect(true, false), Some(Cardinality::ManyToOne));
    assert_eq!(Cardinality::detect(false, false), None);

    assert!(Cardinality::ManyToOne.requires_aggregation());
    assert!(!Cardinality::RepeatedOwner.requires_aggregation());
}

#[test]
fn repeated_owner_keys_gather_without_aggregation() {
    let zones = zones();
    let mut households = households();

    let required = households
        .link_to(&zones, "zone", zone_link())
        .expect("link");
    let spec = households.link("zone").expect("registered");

    assert_eq!(required, AggregationRequired::No);
    assert_eq!(spec.cardinality(), Cardinality::RepeatedOwner);
    assert_eq!(
        spec.indexer(&households).expect("indexer").as_slice(),
        &[0, 2, -1, 0]
    );
}

#[test]
fn unique_owner_with_repeated_target_requires_aggregation() {
    let persons = persons();
    let mut households = households();

    let required = households
        .link_to(
            &persons,
            "persons",
            LinkOptions::new().self_levels(["hh"]).on_other(["hh"]),
        )
        .expect("link");
    let spec = households.link("persons").expect("registered");
    let index = spec.index(&households).expect("index");
    let grouping = index.grouping().expect("grouping");

    assert!(required.is_required());
    assert_eq!(grouping.groups(), 3);
    assert_eq!(grouping.codes(), &[0, 0, 1, 2, 2]);
    assert_eq!(index.indexer().as_slice(), &[0, 1, -1, 2]);
}

#[test]
fn many_to_many_fails_at_creation() {
    let zones = Rc::new(
        Table::from_columns([("zone", Column::ints([1, 1, 2]))]).expect("zones"),
    );
    let mut households = households();

    let err = households
        .link_to(&zones, "zone", LinkOptions::new().on(["zone"]))
        .unwrap_err();

    assert_eq!(
        err,
        Error::Cardinality(CardinalityError {
            link: "zone".into()
        })
    );
    assert!(!households.has_link("zone"));
}

// ---- declaration errors ------------------------------------------------

#[test]
fn level_counts_must_match() {
    let zones = zones();
    let mut households = households();

    let err = households
        .link_to(
            &zones,
            "zone",
            LinkOptions::new().on_self(["zone", "cars"]),
        )
        .unwrap_err();

    assert_eq!(
        err,
        Error::Specification(LinkageSpecificationError::LevelCountMismatch {
            owner: 2,
            target: 1
        })
    );
}

#[test]
fn missing_columns_fail_at_declaration() {
    let zones = zones();
    let mut households = households();

    let err = households
        .link_to(
            &zones,
            "zone",
            LinkOptions::new().on_self(["taz"]).other_levels(["zone"]),
        )
        .unwrap_err();

    assert_eq!(
        err,
        Error::Specification(LinkageSpecificationError::MissingColumn("taz".into()))
    );
}

#[test]
fn option_conflicts_are_specification_errors() {
    let cases = [
        (
            LinkOptions::new().on(["a"]).levels(["a"]),
            LinkageSpecificationError::OnAndLevels,
        ),
        (
            LinkOptions::new().on(["a"]).on_self(["b"]),
            LinkageSpecificationError::SharedAndSplit { shared: "on" },
        ),
        (
            LinkOptions::new().levels(["a"]).other_levels(["b"]),
            LinkageSpecificationError::SharedAndSplit { shared: "levels" },
        ),
        (
            LinkOptions::new().on_self(["a"]).self_levels(["a"]),
            LinkageSpecificationError::SelfColumnsAndLevels,
        ),
        (
            LinkOptions::new().on_other(["a"]).other_levels(["a"]),
            LinkageSpecificationError::OtherColumnsAndLevels,
        ),
        (
            LinkOptions::new().on(Vec::<String>::new()),
            LinkageSpecificationError::EmptyLabels { argument: "on" },
        ),
    ];

    for (options, expected) in cases {
        assert_eq!(options.resolve(), Err(expected));
    }
}

#[test]
fn unset_sides_join_on_the_row_identity() {
    let (owner, target) = LinkOptions::new()
        .on_self(["zone"])
        .resolve()
        .expect("selectors");

    assert_eq!(owner, KeySelector::Columns(vec!["zone".into()]));
    assert_eq!(target, KeySelector::Index);
}

#[test]
fn options_deserialize_with_defaults() {
    let options: LinkOptions =
        serde_json::from_str(r#"{ "on_self": ["zone"] }"#).expect("options");

    assert!(options.precompute);
    assert_eq!(options.on_self, Some(vec!["zone".to_string()]));
}

// ---- indexer lifecycle -------------------------------------------------

#[test]
fn lazy_links_compute_on_first_access() {
    let zones = zones();
    let mut households = households();
    households
        .link_to(&zones, "zone", zone_link().lazy())
        .expect("link");
    let spec = households.link("zone").expect("registered");

    assert!(!spec.is_precomputed());
    spec.precompute(&households).expect("precompute");
    assert!(spec.is_precomputed());
}

#[test]
fn compute_indexers_fills_missing_and_refreshes_changed_keys() {
    let zones = zones();
    let mut households = households();
    households
        .link_to(&zones, "zone", zone_link().lazy())
        .expect("link");

    households.compute_indexers(false).expect("compute");
    assert!(households.link("zone").expect("link").is_precomputed());

    households
        .insert_column("zone", Column::ints([2, 2, 3, 9]))
        .expect("column");
    let stale = households
        .link("zone")
        .expect("link")
        .indexer(&households)
        .expect("indexer")
        .clone();
    assert_eq!(stale.as_slice(), &[0, 2, -1, 0]);

    households.compute_indexers(true).expect("refresh");
    let fresh = households
        .link("zone")
        .expect("link")
        .indexer(&households)
        .expect("indexer");
    assert_eq!(fresh.as_slice(), &[1, 1, 2, -1]);
}

#[test]
fn dropped_targets_surface_on_lazy_access() {
    let zones = zones();
    let mut households = households();
    households
        .link_to(&zones, "zone", zone_link().lazy())
        .expect("link");
    drop(zones);

    let err = households
        .link("zone")
        .expect("link")
        .index(&households)
        .unwrap_err();

    assert_eq!(
        err,
        Error::Resolution(ResolutionError::TargetDropped("zone".into()))
    );
}

#[test]
fn copy_reslices_a_cached_indexer() {
    let zones = zones();
    let mut households = households();
    households
        .link_to(&zones, "zone", zone_link())
        .expect("link");
    let spec = households.link("zone").expect("link");

    let copy = spec.copy(Some(&[3, 2, 1]));

    assert_eq!(copy.cardinality(), spec.cardinality());
    assert_eq!(
        copy.indexer(&households.take(&[3, 2, 1]).expect("rows"))
            .expect("indexer")
            .as_slice(),
        &[0, -1, 2]
    );
}

#[test]
fn copy_of_an_uncomputed_link_stays_uncomputed() {
    let zones = zones();
    let mut households = households();
    households
        .link_to(&zones, "zone", zone_link().lazy())
        .expect("link");

    let copy = households.link("zone").expect("link").copy(Some(&[0]));

    assert!(!copy.is_precomputed());
}

#[test]
fn full_copy_carries_the_cached_indexer() {
    let zones = zones();
    let mut households = households();
    households
        .link_to(&zones, "zone", zone_link())
        .expect("link");

    let copy = households.link("zone").expect("link").copy(None);

    assert!(copy.is_precomputed());
    assert_eq!(
        copy.indexer(&households).expect("indexer").as_slice(),
        &[0, 2, -1, 0]
    );
}

#[test]
fn relinking_a_name_replaces_the_entry() {
    let zones = zones();
    let persons = persons();
    let mut households = households();
    households
        .link_to(&zones, "rel", zone_link())
        .expect("link");
    households
        .link_to(
            &persons,
            "rel",
            LinkOptions::new().self_levels(["hh"]).on_other(["hh"]),
        )
        .expect("relink");

    assert_eq!(households.links().len(), 1);
    assert!(households.link("rel").expect("link").requires_aggregation());
}

// ---- summary -----------------------------------------------------------

#[test]
fn summary_describes_each_link() {
    let zones = zones();
    let persons = persons();
    let mut households = households();
    households
        .link_to(&zones, "zone", zone_link().lazy())
        .expect("link");
    households
        .link_to(
            &persons,
            "persons",
            LinkOptions::new().self_levels(["hh"]).on_other(["hh"]),
        )
        .expect("link");

    let summary = households.link_summary();
    let names: Vec<&str> = summary.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names, ["persons", "zone"]);

    let zone = &summary[1];
    assert_eq!(zone.target_shape, Some((3, 1)));
    assert_eq!(zone.on_self, "From columns: [\"zone\"]");
    assert_eq!(zone.on_other, "From index: [\"zone\"]");
    assert!(!zone.chained);
    assert!(!zone.aggregation);
    assert!(!zone.preindexed);
    assert!(summary[0].aggregation);

    let rendered = summary.to_string();
    assert!(rendered.starts_with("name"));
    assert_eq!(rendered.lines().count(), 3);

    let json = serde_json::to_string(&summary).expect("serialize");
    let back: LinkSummaryTable = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, summary);
}

#[test]
fn chained_flag_reflects_target_links() {
    let zones = zones();
    let mut households = households();
    households
        .link_to(&zones, "zone", zone_link())
        .expect("link");
    let households = Rc::new(households);

    let mut persons = Table::from_columns([("hh", Column::ints([100, 101]))]).expect("persons");
    persons
        .link_to(
            &households,
            "household",
            LinkOptions::new().on_self(["hh"]).other_levels(["hh"]),
        )
        .expect("link");

    assert!(persons.link("household").expect("link").is_chainable());
}
