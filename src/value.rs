//! The dynamic result of binding one parameter.
//!
//! The binder never builds typed values directly. It walks the shape
//! descriptions and produces a [`BoundValue`] tree, which [`Bindable::from_bound`]
//! then turns into the caller's types. Every variant has value equality so
//! set-shaped containers can be deduplicated before they are materialized.
//!
//! [`Bindable::from_bound`]: crate::Bindable::from_bound

use chrono::{DateTime, FixedOffset};
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;
use url::Url;

use crate::error::BindError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BoundValue {
    /// Absent value for a nullable parameter or a nullable nested shape.
    Null,
    String(String),
    Char(char),
    /// Wide enough for every supported integer width; range was checked at conversion.
    Integer(i128),
    Boolean(bool),
    Decimal(Decimal),
    Float(OrderedFloat<f64>),
    /// Inputs without an offset are stored at UTC.
    DateTime(DateTime<FixedOffset>),
    Uri(Url),
    Record(Record),
    /// Elements in store order.
    Sequence(Vec<BoundValue>),
    /// Elements deduplicated by value equality, first occurrence kept.
    Set(Vec<BoundValue>),
}

/// A constructor invocation captured in dynamic form: which constructor of
/// which shape, and its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub type_name: &'static str,
    pub constructor: usize,
    pub arguments: Vec<BoundValue>,
}

impl BoundValue {
    pub fn is_null(&self) -> bool {
        matches!(self, BoundValue::Null)
    }

    /// Short variant name used in mismatch diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            BoundValue::Null => "null",
            BoundValue::String(_) => "string",
            BoundValue::Char(_) => "char",
            BoundValue::Integer(_) => "integer",
            BoundValue::Boolean(_) => "boolean",
            BoundValue::Decimal(_) => "decimal",
            BoundValue::Float(_) => "float",
            BoundValue::DateTime(_) => "date-time",
            BoundValue::Uri(_) => "uri",
            BoundValue::Record(_) => "record",
            BoundValue::Sequence(_) => "sequence",
            BoundValue::Set(_) => "set",
        }
    }

    pub(crate) fn into_record(self, expected: &'static str) -> Result<Record, BindError> {
        match self {
            BoundValue::Record(record) if record.type_name == expected => Ok(record),
            BoundValue::Record(record) => Err(BindError::mismatch(
                expected,
                format!("received a record of '{}'", record.type_name),
            )),
            other => Err(BindError::mismatch(
                expected,
                format!("expected a record, received {}", other.kind()),
            )),
        }
    }

    pub(crate) fn into_elements(self, container: &str) -> Result<Vec<BoundValue>, BindError> {
        match self {
            BoundValue::Sequence(items) | BoundValue::Set(items) => Ok(items),
            other => Err(BindError::mismatch(
                container,
                format!("expected a collection, received {}", other.kind()),
            )),
        }
    }
}

/// Positional constructor arguments handed to [`Shape::construct`](crate::Shape::construct).
///
/// Arguments are consumed front to back in declaration order.
#[derive(Debug)]
pub struct Arguments {
    type_name: &'static str,
    values: std::vec::IntoIter<BoundValue>,
}

impl Arguments {
    pub(crate) fn new(record: Record) -> Self {
        Self {
            type_name: record.type_name,
            values: record.arguments.into_iter(),
        }
    }

    /// Take the next argument and materialize it as `T`.
    pub fn next<T: crate::Bindable>(&mut self) -> Result<T, BindError> {
        let value = self.values.next().ok_or_else(|| {
            BindError::mismatch(self.type_name, "constructor received too few arguments")
        })?;
        T::from_bound(value)
    }

    /// Number of arguments not yet consumed.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}
