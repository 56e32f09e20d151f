//! Group reductions behind the aggregators.
//!
//! Nulls and NaN are missing values. Every function skips them except `nth`,
//! which addresses rows by position inside the group.

use crate::{
    column::Column,
    link::GroupingKey,
    resolve::{AggregateKind, AggregateOptions},
    value::{Value, ValueFamily},
};

/// Reduce `column` (one value per target row) to one value per group.
pub(crate) fn reduce_groups(
    kind: AggregateKind,
    column: &Column,
    grouping: &GroupingKey,
    options: &AggregateOptions,
) -> Column {
    let mut members: Vec<Vec<&Value>> = vec![Vec::new(); grouping.groups()];
    for (value, &code) in column.iter().zip(grouping.codes()) {
        if let Some(group) = members.get_mut(code) {
            group.push(value);
        }
    }

    let input = column.family();
    let values = members
        .iter()
        .map(|group| reduce(kind, input, group, options))
        .collect();

    Column::with_family(result_family(kind, input), values)
}

/// Family of the reduced column for an input of `input`.
pub(crate) const fn result_family(kind: AggregateKind, input: ValueFamily) -> ValueFamily {
    match kind {
        AggregateKind::Count => ValueFamily::Integer,
        AggregateKind::Sum | AggregateKind::Prod => match input {
            ValueFamily::Integer | ValueFamily::Boolean => ValueFamily::Integer,
            other => other,
        },
        AggregateKind::Mean
        | AggregateKind::Median
        | AggregateKind::Quantile
        | AggregateKind::Std
        | AggregateKind::Var => ValueFamily::Float,
        AggregateKind::First
        | AggregateKind::Last
        | AggregateKind::Max
        | AggregateKind::Min
        | AggregateKind::Nth => input,
    }
}

fn reduce(
    kind: AggregateKind,
    input: ValueFamily,
    group: &[&Value],
    options: &AggregateOptions,
) -> Value {
    let present = || group.iter().copied().filter(|value| !value.is_missing());
    let floats = || present().filter_map(Value::as_f64);

    match kind {
        AggregateKind::Count => Value::Int(i64::try_from(present().count()).unwrap_or(i64::MAX)),
        AggregateKind::First => present().next().cloned().unwrap_or(Value::Null),
        AggregateKind::Last => present().last().cloned().unwrap_or(Value::Null),
        AggregateKind::Nth => nth(group, options.n).cloned().unwrap_or(Value::Null),
        AggregateKind::Min => present().min().cloned().unwrap_or(Value::Null),
        AggregateKind::Max => present().max().cloned().unwrap_or(Value::Null),
        AggregateKind::Sum => fold_integral(input, present(), 0, i128::saturating_add)
            .unwrap_or_else(|| Value::Float(floats().sum())),
        AggregateKind::Prod => fold_integral(input, present(), 1, i128::saturating_mul)
            .unwrap_or_else(|| Value::Float(floats().product())),
        AggregateKind::Mean => Value::Float(mean(&floats().collect::<Vec<_>>())),
        AggregateKind::Median => Value::Float(quantile(floats().collect(), 0.5)),
        AggregateKind::Quantile => Value::Float(quantile(floats().collect(), options.q)),
        AggregateKind::Var => Value::Float(variance(&floats().collect::<Vec<_>>(), options.ddof)),
        AggregateKind::Std => {
            Value::Float(variance(&floats().collect::<Vec<_>>(), options.ddof).sqrt())
        }
    }
}

// Integral fold for sum/prod; `None` means the input is not integral and the
// caller falls back to floats.
fn fold_integral<'a>(
    input: ValueFamily,
    values: impl Iterator<Item = &'a Value>,
    init: i128,
    op: fn(i128, i128) -> i128,
) -> Option<Value> {
    if !matches!(
        input,
        ValueFamily::Integer | ValueFamily::Unsigned | ValueFamily::Boolean
    ) {
        return None;
    }

    let total = values.filter_map(Value::as_i128).fold(init, op);
    let value = if input == ValueFamily::Unsigned {
        Value::Uint(u64::try_from(total.max(0)).unwrap_or(u64::MAX))
    } else {
        Value::Int(i64::try_from(total).unwrap_or(if total < 0 { i64::MIN } else { i64::MAX }))
    };

    Some(value)
}

fn nth<'a>(group: &[&'a Value], n: i64) -> Option<&'a Value> {
    let position = if n >= 0 {
        usize::try_from(n).ok()?
    } else {
        let back = usize::try_from(n.unsigned_abs()).ok()?;
        group.len().checked_sub(back)?
    };

    group.get(position).copied()
}

#[expect(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    values.iter().sum::<f64>() / values.len() as f64
}

#[expect(clippy::cast_precision_loss)]
fn variance(values: &[f64], ddof: u32) -> f64 {
    let ddof = ddof as usize;
    if values.len() <= ddof {
        return f64::NAN;
    }

    let mean = mean(values);
    let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();

    squares / (values.len() - ddof) as f64
}

// Linear interpolation between the closest ranks.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn quantile(mut values: Vec<f64>, q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(f64::total_cmp);

    let rank = q * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let (Some(&low), Some(&high)) = (values.get(lo), values.get(hi)) else {
        return f64::NAN;
    };

    low + (high - low) * (rank - rank.floor())
}
