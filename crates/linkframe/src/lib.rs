//! Linked tables: named, key-based links between tabular datasets, cached
//! positional indexers, and chain resolution that pulls attributes from
//! related tables back onto an origin table's rows without materializing joins.
//!
//! A [`table::Table`] declares links with [`table::Table::link_to`]. Named
//! access through [`table::Table::get`] yields either a column or a
//! [`resolve::LinkHandle`] that can be walked further, reduced with an
//! aggregate function, or resolved into a [`column::Column`] aligned with the
//! origin rows.
#![warn(unreachable_pub)]

pub mod column;
pub mod error;
pub mod eval;
pub mod key;
pub mod link;
pub mod obs;
pub mod resolve;
pub mod table;
pub mod value;

// re-exports
pub use error::{Error, ErrorClass};

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// Errors, evaluators and observability hooks are imported from their modules.
///

pub mod prelude {
    pub use crate::{
        column::Column,
        key::{Key, KeySelector, RowIndex},
        link::{AggregationRequired, Cardinality, LinkOptions},
        resolve::{AggregateKind, AggregateOptions, Attribute, LinkHandle},
        table::{FillDefaults, Table},
        value::{Value, ValueFamily},
    };
}
