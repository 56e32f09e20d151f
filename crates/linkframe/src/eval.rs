//! Expression evaluation seam.
//!
//! Aggregators hand an expression string and the aggregating link's target
//! to an [`Evaluator`]. Parsing and arithmetic belong to the host; the
//! [`BasicEvaluator`] covers literals, column names, dotted link chains and
//! a trailing aggregate call such as `persons.sum(1)`.

use crate::{
    column::Column,
    error::{Error, UnresolvedSymbolError},
    resolve::AggregateOptions,
    table::Table,
    value::Value,
};

///
/// Evaluator
///
/// Produces one value per row of `table`.
///

pub trait Evaluator {
    fn evaluate(&self, table: &Table, expression: &str) -> Result<Column, Error>;
}

///
/// BasicEvaluator
///

#[derive(Clone, Copy, Debug, Default)]
pub struct BasicEvaluator;

impl Evaluator for BasicEvaluator {
    fn evaluate(&self, table: &Table, expression: &str) -> Result<Column, Error> {
        let expression = expression.trim();
        let rows = table.row_count();

        if let Some(value) = literal(expression) {
            return Ok(Column::constant(value, rows));
        }
        if let Some(column) = table.column(expression) {
            return Ok(column.clone());
        }
        if let Some((path, args)) = aggregate_call(expression) {
            let segments: Vec<&str> = path.split('.').map(str::trim).collect();
            if let Some((function, [link, chain @ ..])) = segments.split_last()
                && table.has_link(link)
            {
                return table.resolve_aggregate(
                    link,
                    chain,
                    function,
                    args,
                    &AggregateOptions::default(),
                );
            }
        } else if let Some((link, rest)) = expression.split_once('.') {
            let chain: Vec<&str> = rest.split('.').map(str::trim).collect();
            if table.has_link(link.trim()) {
                return table.resolve_chain(link.trim(), &chain);
            }
        }

        Err(UnresolvedSymbolError::Expression(expression.to_string()).into())
    }
}

// `link.chain.func(args)` split into the dotted path and the argument text.
// Dots inside the arguments belong to the inner expression.
fn aggregate_call(expression: &str) -> Option<(&str, &str)> {
    let inner = expression.strip_suffix(')')?;
    let (path, args) = inner.split_once('(')?;

    path.contains('.').then_some((path, args))
}

fn literal(expression: &str) -> Option<Value> {
    match expression {
        "True" | "true" => return Some(Value::Bool(true)),
        "False" | "false" => return Some(Value::Bool(false)),
        _ => {}
    }

    if let Ok(value) = expression.parse::<i64>() {
        return Some(Value::Int(value));
    }

    // Only plain decimal forms; `nan`/`inf` stay symbols.
    if expression.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
    {
        return expression.parse::<f64>().ok().map(Value::Float);
    }

    None
}
