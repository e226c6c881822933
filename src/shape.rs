//! Shape descriptions: the static metadata the binder walks.
//!
//! A type takes part in binding by implementing [`Bindable`], which classifies
//! it as a scalar, a nested shape, or a collection. Record types additionally
//! implement [`Shape`] to expose their constructor parameter lists. The
//! [`shape!`](crate::shape!) macro writes both for a plain struct.
//!
//! Descriptions are derived once per type and memoized by [`describe`].

use std::any::TypeId;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::error::BindError;
use crate::value::{Arguments, BoundValue};

/// A type that can be produced for a constructor parameter.
pub trait Bindable: Sized {
    fn descriptor() -> TypeDescriptor;

    /// Whether an absent value binds to [`BoundValue::Null`] instead of failing.
    fn is_nullable() -> bool {
        false
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError>;
}

/// A record type with one or more constructor parameter lists.
pub trait Shape: Sized + 'static {
    fn describe() -> ShapeDescription;

    /// Invoke the constructor at `constructor` (an index into
    /// [`ShapeDescription::constructors`]) with its bound arguments.
    fn construct(constructor: usize, args: Arguments) -> Result<Self, BindError>;
}

#[derive(Debug, Clone)]
pub struct ShapeDescription {
    pub type_name: &'static str,
    pub constructors: Vec<Constructor>,
}

impl ShapeDescription {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            constructors: Vec::new(),
        }
    }

    pub fn constructor(mut self, parameters: Vec<Parameter>) -> Self {
        self.constructors.push(Constructor { parameters });
        self
    }

    /// The constructor with the most parameters. Among equals the first
    /// declared wins.
    pub fn select_constructor(&self) -> Option<(usize, &Constructor)> {
        let mut selected: Option<(usize, &Constructor)> = None;
        for (index, ctor) in self.constructors.iter().enumerate() {
            match selected {
                Some((_, best)) if best.parameters.len() >= ctor.parameters.len() => {}
                _ => selected = Some((index, ctor)),
            }
        }
        selected
    }
}

#[derive(Debug, Clone)]
pub struct Constructor {
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: &'static str,
    pub descriptor: TypeDescriptor,
    pub nullable: bool,
}

impl Parameter {
    pub fn of<T: Bindable>(name: &'static str) -> Self {
        Self {
            name,
            descriptor: T::descriptor(),
            nullable: T::is_nullable(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    Scalar(ScalarKind),
    Nested(ShapeRef),
    Collection(CollectionDescriptor),
}

impl TypeDescriptor {
    /// Human-readable type name for diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            TypeDescriptor::Scalar(kind) => kind.to_string(),
            TypeDescriptor::Nested(shape) => shape.get().type_name.to_string(),
            TypeDescriptor::Collection(c) => c.container.type_name.to_string(),
        }
    }
}

/// Lazy handle to a memoized shape description.
///
/// Keeping nested shapes behind a function pointer lets a shape mention
/// itself (through an `Option` or a collection) without recursing while its
/// own description is being built.
#[derive(Clone, Copy)]
pub struct ShapeRef(fn() -> &'static ShapeDescription);

impl ShapeRef {
    pub fn of<T: Shape>() -> Self {
        ShapeRef(describe::<T>)
    }

    pub fn get(&self) -> &'static ShapeDescription {
        (self.0)()
    }
}

impl fmt::Debug for ShapeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ShapeRef").field(&self.get().type_name).finish()
    }
}

#[derive(Debug, Clone)]
pub struct CollectionDescriptor {
    pub element: Box<TypeDescriptor>,
    pub element_nullable: bool,
    pub container: ContainerDescriptor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerDescriptor {
    pub type_name: &'static str,
    pub capability: ContainerCapability,
}

/// The semantic contract a container type offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerCapability {
    OrderedSequence,
    Set,
    GenericEnumerable,
    MutableList,
}

/// Leaf value kinds with a registered string converter, plus [`Other`](Self::Other)
/// for scalars that have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Char,
    Integer(IntegerRange),
    Boolean,
    Decimal,
    Float(FloatWidth),
    DateTime,
    Uri,
    Other(&'static str),
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::String => f.write_str("String"),
            ScalarKind::Char => f.write_str("char"),
            ScalarKind::Integer(range) => f.write_str(range.name),
            ScalarKind::Boolean => f.write_str("bool"),
            ScalarKind::Decimal => f.write_str("Decimal"),
            ScalarKind::Float(width) => f.write_str(width.name()),
            ScalarKind::DateTime => f.write_str("DateTime"),
            ScalarKind::Uri => f.write_str("Uri"),
            ScalarKind::Other(name) => f.write_str(name),
        }
    }
}

/// Inclusive bounds of a fixed-width integer target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerRange {
    pub name: &'static str,
    pub min: i128,
    pub max: i128,
}

/// Floating-point target width. Values are carried as `f64` and must stay
/// finite at the target width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    F32,
    F64,
}

impl FloatWidth {
    pub fn name(self) -> &'static str {
        match self {
            FloatWidth::F32 => "f32",
            FloatWidth::F64 => "f64",
        }
    }

    pub(crate) fn fits(self, value: f64) -> bool {
        match self {
            FloatWidth::F32 => (value as f32).is_finite(),
            FloatWidth::F64 => value.is_finite(),
        }
    }
}

static REGISTRY: OnceLock<RwLock<HashMap<TypeId, &'static ShapeDescription>>> = OnceLock::new();

/// The memoized description of `T`.
///
/// Populated at most once per type. The description is computed outside the
/// lock; if two threads race on first use the first insert wins and both
/// observe the same `'static` reference.
pub fn describe<T: Shape>() -> &'static ShapeDescription {
    let registry = REGISTRY.get_or_init(|| RwLock::new(HashMap::new()));
    let id = TypeId::of::<T>();

    if let Some(found) = registry
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .copied()
    {
        return found;
    }

    let description = T::describe();
    let mut map = registry.write().unwrap_or_else(PoisonError::into_inner);
    match map.entry(id) {
        Entry::Occupied(entry) => *entry.get(),
        Entry::Vacant(entry) => {
            tracing::trace!(shape = description.type_name, "describing shape");
            *entry.insert(Box::leak(Box::new(description)))
        }
    }
}

/// [`Bindable::descriptor`] for a [`Shape`].
pub fn nested<T: Shape>() -> TypeDescriptor {
    TypeDescriptor::Nested(ShapeRef::of::<T>())
}

/// [`Bindable::from_bound`] for a [`Shape`]: dispatch the captured record to
/// its constructor.
pub fn construct<T: Shape>(value: BoundValue) -> Result<T, BindError> {
    let record = value.into_record(describe::<T>().type_name)?;
    let constructor = record.constructor;
    T::construct(constructor, Arguments::new(record))
}

impl<T: Bindable> Bindable for Option<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor()
    }

    fn is_nullable() -> bool {
        true
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        match value {
            BoundValue::Null => Ok(None),
            other => T::from_bound(other).map(Some),
        }
    }
}
