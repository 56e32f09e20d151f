use crate::{
    column::Column,
    error::{
        AggregateOptionError, AggregationTypeError, Error, UnresolvedSymbolError,
        UnsupportedReductionError,
    },
    key::RowIndex,
    link::LinkOptions,
    obs::sink::{EventSink, LinkEvent, with_event_sink},
    resolve::{AggregateKind, AggregateOptions, Aggregation, Attribute, LinkHandle},
    table::{FillDefaults, Table},
    value::{Value, ValueFamily},
};
use std::{cell::RefCell, rc::Rc};

// ---- helpers -----------------------------------------------------------

struct World {
    _regions: Rc<Table>,
    _zones: Rc<Table>,
    _persons: Rc<Table>,
    households: Table,
}

fn world() -> World {
    let mut regions = Table::new(
        RowIndex::named("region", ["N", "S"]),
        [("tax", Column::floats([0.1, 0.2]))],
    )
    .expect("regions");
    regions.set_column_fill("tax", -1.0).expect("fill");
    let regions = Rc::new(regions);

    let mut zones = Table::new(
        RowIndex::named("zone", [1i64, 2, 3]),
        [
            ("region", Column::texts(["N", "S", "X"])),
            ("area", Column::ints([10, 20, 30])),
        ],
    )
    .expect("zones");
    zones.set_fill_defaults(FillDefaults::new().with(ValueFamily::Float, 99.0));
    zones
        .link_to(
            &regions,
            "regions",
            LinkOptions::new().on_self(["region"]).other_levels(["region"]),
        )
        .expect("regions link");
    let zones = Rc::new(zones);

    let mut persons = Table::new(
        RowIndex::range(5),
        [
            ("hh", Column::ints([100, 100, 101, 103, 103])),
            ("age", Column::ints([40, 12, 33, 70, 68])),
            ("name", Column::texts(["a", "b", "c", "d", "e"])),
            ("born", Column::timestamps([0, 1, 2, 3, 4])),
            ("work_zone", Column::ints([1, 2, 2, 3, 9])),
        ],
    )
    .expect("persons");
    persons
        .link_to(
            &zones,
            "work",
            LinkOptions::new().on_self(["work_zone"]).other_levels(["zone"]),
        )
        .expect("work link");
    let persons = Rc::new(persons);

    let mut households = Table::new(
        RowIndex::named("hh", [100i64, 101, 102, 103]),
        [("zone", Column::ints([1, 3, 4, 2]))],
    )
    .expect("households");
    households
        .link_to(
            &zones,
            "home",
            LinkOptions::new().on_self(["zone"]).other_levels(["zone"]),
        )
        .expect("home link");
    households
        .link_to(
            &persons,
            "persons",
            LinkOptions::new().self_levels(["hh"]).on_other(["hh"]),
        )
        .expect("persons link");

    World {
        _regions: regions,
        _zones: zones,
        _persons: persons,
        households,
    }
}

fn aggregate(world: &World, function: &str, expression: &str) -> Result<Column, Error> {
    world.households.resolve_aggregate(
        "persons",
        &[],
        function,
        expression,
        &AggregateOptions::default(),
    )
}

fn persons_handle(world: &World) -> Aggregation<'_> {
    match world.households.get("persons").expect("attribute") {
        Attribute::Link(LinkHandle::Aggregation(aggregation)) => aggregation,
        other => panic!("expected an aggregation handle, got {other:?}"),
    }
}

#[derive(Default)]
struct Recorder {
    chains: RefCell<Vec<(u64, u64)>>,
}

impl EventSink for Recorder {
    fn record(&self, event: &LinkEvent<'_>) {
        if let LinkEvent::ChainResolved {
            hops, unmatched, ..
        } = *event
        {
            self.chains.borrow_mut().push((hops, unmatched));
        }
    }
}

// ---- handle dispatch ---------------------------------------------------

#[test]
fn handle_variant_follows_the_link() {
    let world = world();
    let households = &world.households;

    let home = households.get("home").expect("home").into_link().expect("link");
    assert!(matches!(home, LinkHandle::Relay(_)));
    assert_eq!(home.attributes(), ["area", "region", "regions"]);

    let regions = home.get("regions").expect("regions").into_link().expect("link");
    assert!(matches!(regions, LinkHandle::Leaf(_)));
    assert_eq!(regions.attributes(), ["tax"]);

    let persons = households.get("persons").expect("persons").into_link().expect("link");
    assert!(persons.requires_aggregation());
    assert_eq!(persons.attributes().len(), AggregateKind::ALL.len());
}

#[test]
fn relay_columns_resolve_with_the_target_fill() {
    let world = world();

    let area = world
        .households
        .resolve_chain("home", &["area"])
        .expect("area");

    assert_eq!(area, Column::ints([10, 30, 0, 20]));
}

#[test]
fn two_hop_chain_uses_the_final_fill_at_every_hop() {
    let world = world();

    let tax = world
        .households
        .resolve_chain("home", &["regions", "tax"])
        .expect("tax");

    // zone 3 breaks at the outer hop (region X), zone 4 at the first hop.
    assert_eq!(tax, Column::floats([0.1, -1.0, -1.0, 0.2]));
}

#[test]
fn leaf_rejects_unknown_columns() {
    let world = world();

    let err = world
        .households
        .resolve_chain("home", &["regions", "vat"])
        .unwrap_err();

    assert_eq!(
        err,
        Error::UnresolvedSymbol(UnresolvedSymbolError::Attribute {
            name: "vat".into(),
            scope: "link 'regions'".into()
        })
    );
}

#[test]
fn chains_must_end_at_a_column() {
    let world = world();
    let households = &world.households;

    assert_eq!(
        households.resolve_chain("home", &[]).unwrap_err(),
        Error::UnresolvedSymbol(UnresolvedSymbolError::ChainIncomplete("home".into()))
    );
    assert_eq!(
        households.resolve_chain("home", &["area", "x"]).unwrap_err(),
        Error::UnresolvedSymbol(UnresolvedSymbolError::ChainPastColumn("area".into()))
    );
    assert_eq!(
        households.resolve_chain("zone", &["x"]).unwrap_err(),
        Error::UnresolvedSymbol(UnresolvedSymbolError::NotALink("zone".into()))
    );
    assert_eq!(
        households.resolve_chain("persons", &["age"]).unwrap_err(),
        Error::UnresolvedSymbol(UnresolvedSymbolError::AggregationRequired(
            "persons".into()
        ))
    );
}

#[test]
fn resolution_emits_chain_events() {
    let world = world();
    let recorder = Rc::new(Recorder::default());

    with_event_sink(recorder.clone(), || {
        world
            .households
            .resolve_chain("home", &["regions", "tax"])
            .expect("tax");
    });

    assert_eq!(*recorder.chains.borrow(), vec![(2, 2)]);
}

// ---- aggregation -------------------------------------------------------

#[test]
fn aggregation_handle_lists_functions_and_rejects_others() {
    let world = world();
    let handle = persons_handle(&world);

    assert_eq!(Aggregation::functions()[0], "count");
    assert_eq!(handle.aggregator("sum").expect("sum").kind(), AggregateKind::Sum);
    assert!(matches!(
        handle.aggregator("avg").unwrap_err(),
        Error::UnresolvedSymbol(UnresolvedSymbolError::Aggregation { .. })
    ));
}

#[test]
fn sum_of_one_equals_count() {
    let world = world();

    let sum = aggregate(&world, "sum", "1").expect("sum");
    let count = aggregate(&world, "count", "age").expect("count");

    assert_eq!(sum, Column::ints([2, 1, -1, 2]));
    assert_eq!(sum, count);
}

#[test]
fn mean_fills_unmatched_rows_with_the_integer_fill() {
    let world = world();

    let mean = aggregate(&world, "mean", "age").expect("mean");

    assert_eq!(mean, Column::floats([26.0, 33.0, -1.0, 69.0]));
}

#[test]
fn int_fill_is_configurable() {
    let world = world();

    let max = world
        .households
        .resolve_aggregate(
            "persons",
            &[],
            "max",
            "age",
            &AggregateOptions::new().int_fill(0),
        )
        .expect("max");

    assert_eq!(max, Column::ints([40, 33, 0, 70]));
}

#[test]
fn nth_counts_from_either_end() {
    let world = world();
    let handle = persons_handle(&world);

    let last = handle
        .aggregate(AggregateKind::Nth)
        .call("age", &AggregateOptions::new().n(-1))
        .expect("nth");
    let second = handle
        .aggregate(AggregateKind::Nth)
        .call("age", &AggregateOptions::new().n(1))
        .expect("nth");

    assert_eq!(last, Column::ints([12, 33, -1, 68]));
    assert_eq!(
        second.values(),
        &[Value::Int(12), Value::Null, Value::Int(-1), Value::Int(68)]
    );
}

#[test]
fn non_numeric_input_is_allowed_for_first() {
    let world = world();

    let first = aggregate(&world, "first", "name").expect("first");

    assert_eq!(
        first.values(),
        &[
            Value::text("a"),
            Value::text("c"),
            Value::Null,
            Value::text("d")
        ]
    );
}

#[test]
fn numeric_functions_reject_text() {
    let world = world();

    assert_eq!(
        aggregate(&world, "sum", "name").unwrap_err(),
        Error::AggregationType(AggregationTypeError {
            expression: "name".into(),
            family: ValueFamily::Other,
            function: AggregateKind::Sum
        })
    );
}

#[test]
fn time_results_have_no_fill() {
    let world = world();

    assert_eq!(
        aggregate(&world, "first", "born").unwrap_err(),
        Error::UnsupportedReduction(UnsupportedReductionError {
            expression: "born".into(),
            function: AggregateKind::First
        })
    );
    assert!(matches!(
        aggregate(&world, "max", "born").unwrap_err(),
        Error::AggregationType(_)
    ));
}

#[test]
fn quantile_checks_its_argument() {
    let world = world();
    let options = AggregateOptions::new().q(1.5);

    let err = world
        .households
        .resolve_aggregate("persons", &[], "quantile", "age", &options)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::AggregateOption(AggregateOptionError {
            function: AggregateKind::Quantile,
            option: "q",
            ..
        })
    ));
}

#[test]
fn expressions_can_follow_links_of_the_target() {
    let world = world();

    let total = aggregate(&world, "sum", "work.area").expect("sum");

    // person 4 works in zone 9, which has no match and fills with 0.
    assert_eq!(total, Column::ints([30, 20, -1, 30]));
}

#[test]
fn aggregating_a_plain_link_is_rejected() {
    let world = world();

    assert_eq!(
        world
            .households
            .resolve_aggregate("home", &[], "sum", "area", &AggregateOptions::default())
            .unwrap_err(),
        Error::UnresolvedSymbol(UnresolvedSymbolError::AggregationNotRequired(
            "home".into()
        ))
    );
}
