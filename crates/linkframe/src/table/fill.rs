use crate::value::{Value, ValueFamily};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, rc::Rc};

///
/// FillDefaults
///
/// Optional fill value per value family. Unset families fall through to the
/// next tier of the owning table's `FillPolicy`.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct FillDefaults {
    pub integer: Option<Value>,
    pub unsigned: Option<Value>,
    pub float: Option<Value>,
    pub boolean: Option<Value>,
    pub time: Option<Value>,
    pub other: Option<Value>,
}

impl FillDefaults {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FillDefaults::set`].
    #[must_use]
    pub fn with(mut self, family: ValueFamily, value: impl Into<Value>) -> Self {
        self.set(family, value);
        self
    }

    pub fn set(&mut self, family: ValueFamily, value: impl Into<Value>) {
        *self.slot_mut(family) = Some(value.into());
    }

    #[must_use]
    pub const fn get(&self, family: ValueFamily) -> Option<&Value> {
        match family {
            ValueFamily::Integer => self.integer.as_ref(),
            ValueFamily::Unsigned => self.unsigned.as_ref(),
            ValueFamily::Float => self.float.as_ref(),
            ValueFamily::Boolean => self.boolean.as_ref(),
            ValueFamily::Time => self.time.as_ref(),
            ValueFamily::Other => self.other.as_ref(),
        }
    }

    /// Type-inferred default used when no tier sets a value.
    #[must_use]
    pub const fn inferred(family: ValueFamily) -> Value {
        match family {
            ValueFamily::Integer => Value::Int(0),
            ValueFamily::Unsigned => Value::Uint(0),
            ValueFamily::Float => Value::NAN,
            ValueFamily::Boolean => Value::Bool(false),
            ValueFamily::Time | ValueFamily::Other => Value::Null,
        }
    }

    const fn slot_mut(&mut self, family: ValueFamily) -> &mut Option<Value> {
        match family {
            ValueFamily::Integer => &mut self.integer,
            ValueFamily::Unsigned => &mut self.unsigned,
            ValueFamily::Float => &mut self.float,
            ValueFamily::Boolean => &mut self.boolean,
            ValueFamily::Time => &mut self.time,
            ValueFamily::Other => &mut self.other,
        }
    }
}

///
/// FillPolicy
///
/// Fill-value lookup attached to one table. Precedence: per-column override,
/// then instance defaults, then shared class defaults, then the inferred
/// default of the column's family.
///

#[derive(Clone, Debug, Default)]
pub struct FillPolicy {
    columns: BTreeMap<String, Value>,
    instance: Option<FillDefaults>,
    class: Option<Rc<FillDefaults>>,
}

impl FillPolicy {
    #[must_use]
    pub fn fill_for(&self, column: &str, family: ValueFamily) -> Value {
        if let Some(value) = self.columns.get(column) {
            return value.clone();
        }

        self.family_default(family)
    }

    /// Instance and class tiers only; used where no column name applies.
    #[must_use]
    pub fn family_default(&self, family: ValueFamily) -> Value {
        self.instance
            .as_ref()
            .and_then(|defaults| defaults.get(family))
            .or_else(|| self.class.as_deref().and_then(|defaults| defaults.get(family)))
            .cloned()
            .unwrap_or_else(|| FillDefaults::inferred(family))
    }

    #[must_use]
    pub fn column_fill(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    #[must_use]
    pub const fn instance(&self) -> Option<&FillDefaults> {
        self.instance.as_ref()
    }

    #[must_use]
    pub fn class(&self) -> Option<&FillDefaults> {
        self.class.as_deref()
    }

    pub(crate) fn set_column(&mut self, column: String, value: Value) {
        self.columns.insert(column, value);
    }

    pub(crate) fn replace_instance(&mut self, defaults: Option<FillDefaults>) -> Option<FillDefaults> {
        std::mem::replace(&mut self.instance, defaults)
    }

    pub(crate) fn set_class(&mut self, defaults: Rc<FillDefaults>) {
        self.class = Some(defaults);
    }

    /// Drop per-column overrides for columns that are gone.
    pub(crate) fn retain_columns(&mut self, keep: impl Fn(&str) -> bool) {
        self.columns.retain(|column, _| keep(column));
    }
}
