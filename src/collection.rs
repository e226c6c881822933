//! Collection building.
//!
//! A collection section is bound in two phases. The store is first asked to
//! materialize the whole collection natively; a non-empty answer is used as
//! is. Otherwise (an empty answer, or any error) the binder falls back to
//! walking the section's children one by one. Empty collections therefore
//! always go through the fallback, which yields empty again when there are
//! no children.
//!
//! Container types take part through [`Container`]. The bundled impls:
//!
//! | Container      | Capability        | Assembly           |
//! |----------------|-------------------|--------------------|
//! | `Vec<T>`       | MutableList       | from full sequence |
//! | `Box<[T]>`     | OrderedSequence   | from full sequence |
//! | `VecDeque<T>`  | OrderedSequence   | empty + append     |
//! | `Arc<[T]>`     | GenericEnumerable | from full sequence |
//! | `HashSet<T>`   | Set               | from full sequence |
//! | `BTreeSet<T>`  | Set               | empty + append     |
//! | `IndexSet<T>`  | Set               | from full sequence |

use std::any::type_name;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexSet;

use crate::binder::Binder;
use crate::error::{BindError, ConfigurationBindError};
use crate::shape::{
    Bindable, CollectionDescriptor, ContainerCapability, ContainerDescriptor, TypeDescriptor,
};
use crate::store::{Child, ConfigStore};
use crate::value::BoundValue;

/// A type that can be assembled from bound elements.
///
/// Implement at least one of the two assembly strategies. [`from_sequence`]
/// is tried first; when it hands the items back, the container is built
/// with [`empty`] and [`append`]. A container offering neither fails with
/// [`ConfigurationBindError::UnhandledType`].
///
/// [`from_sequence`]: Container::from_sequence
/// [`empty`]: Container::empty
/// [`append`]: Container::append
pub trait Container: Sized {
    type Item: Bindable;

    const CAPABILITY: ContainerCapability;

    /// Build the container from every element at once.
    fn from_sequence(items: Vec<Self::Item>) -> Result<Self, Vec<Self::Item>> {
        Err(items)
    }

    fn empty() -> Option<Self> {
        None
    }

    /// Add one element, or give it back if the container cannot grow.
    fn append(&mut self, item: Self::Item) -> Result<(), Self::Item> {
        Err(item)
    }
}

/// [`Bindable::descriptor`] for a [`Container`].
pub fn descriptor_of<C: Container>() -> TypeDescriptor {
    TypeDescriptor::Collection(CollectionDescriptor {
        element: Box::new(C::Item::descriptor()),
        element_nullable: C::Item::is_nullable(),
        container: ContainerDescriptor {
            type_name: type_name::<C>(),
            capability: C::CAPABILITY,
        },
    })
}

/// [`Bindable::from_bound`] for a [`Container`].
pub fn assemble<C: Container>(value: BoundValue) -> Result<C, BindError> {
    let name = type_name::<C>();
    let items = value
        .into_elements(name)?
        .into_iter()
        .map(C::Item::from_bound)
        .collect::<Result<Vec<_>, _>>()?;

    let items = match C::from_sequence(items) {
        Ok(container) => return Ok(container),
        Err(items) => items,
    };

    let unhandled = || BindError::from(ConfigurationBindError::UnhandledType(name.to_string()));
    let mut container = C::empty().ok_or_else(unhandled)?;
    for item in items {
        container.append(item).map_err(|_| unhandled())?;
    }
    Ok(container)
}

impl<S: ConfigStore + ?Sized> Binder<'_, S> {
    pub(crate) fn build_collection(
        &self,
        key: &str,
        collection: &CollectionDescriptor,
    ) -> Result<BoundValue, BindError> {
        let capability = collection.container.capability;

        match self.store.try_bulk_get(key, &collection.element) {
            Ok(Some(items)) if !items.is_empty() => {
                tracing::trace!(key, count = items.len(), "bulk read materialized collection");
                return Ok(adapt(items, capability));
            }
            Ok(_) => tracing::debug!(key, "bulk read empty, binding elements one by one"),
            Err(error) => {
                tracing::debug!(key, %error, "bulk read failed, binding elements one by one");
            }
        }

        let mut items = Vec::new();
        for child in self.store.get_children(key) {
            items.push(self.bind_element(&child, collection)?);
        }
        Ok(adapt(items, capability))
    }

    fn bind_element(
        &self,
        child: &Child,
        collection: &CollectionDescriptor,
    ) -> Result<BoundValue, BindError> {
        let nullable = collection.element_nullable;
        match collection.element.as_ref() {
            TypeDescriptor::Scalar(kind) => {
                self.resolve_scalar(*kind, &child.key, &child.segment, nullable)
            }
            // Each element lives under its own child key, so the element
            // count bounds the recursion.
            TypeDescriptor::Nested(shape) => {
                self.bind_shape(shape.get(), Some(&child.key), nullable, None)
            }
            TypeDescriptor::Collection(inner) => self.build_collection(&child.key, inner),
        }
    }
}

fn adapt(items: Vec<BoundValue>, capability: ContainerCapability) -> BoundValue {
    match capability {
        ContainerCapability::Set => {
            BoundValue::Set(items.into_iter().collect::<IndexSet<_>>().into_iter().collect())
        }
        ContainerCapability::OrderedSequence
        | ContainerCapability::MutableList
        | ContainerCapability::GenericEnumerable => BoundValue::Sequence(items),
    }
}

impl<T: Bindable> Container for Vec<T> {
    type Item = T;
    const CAPABILITY: ContainerCapability = ContainerCapability::MutableList;

    fn from_sequence(items: Vec<T>) -> Result<Self, Vec<T>> {
        Ok(items)
    }
}

impl<T: Bindable> Container for Box<[T]> {
    type Item = T;
    const CAPABILITY: ContainerCapability = ContainerCapability::OrderedSequence;

    fn from_sequence(items: Vec<T>) -> Result<Self, Vec<T>> {
        Ok(items.into_boxed_slice())
    }
}

impl<T: Bindable> Container for VecDeque<T> {
    type Item = T;
    const CAPABILITY: ContainerCapability = ContainerCapability::OrderedSequence;

    fn empty() -> Option<Self> {
        Some(VecDeque::new())
    }

    fn append(&mut self, item: T) -> Result<(), T> {
        self.push_back(item);
        Ok(())
    }
}

impl<T: Bindable> Container for Arc<[T]> {
    type Item = T;
    const CAPABILITY: ContainerCapability = ContainerCapability::GenericEnumerable;

    fn from_sequence(items: Vec<T>) -> Result<Self, Vec<T>> {
        Ok(Arc::from(items))
    }
}

impl<T: Bindable + Eq + Hash> Container for HashSet<T> {
    type Item = T;
    const CAPABILITY: ContainerCapability = ContainerCapability::Set;

    fn from_sequence(items: Vec<T>) -> Result<Self, Vec<T>> {
        Ok(items.into_iter().collect())
    }
}

impl<T: Bindable + Ord> Container for BTreeSet<T> {
    type Item = T;
    const CAPABILITY: ContainerCapability = ContainerCapability::Set;

    fn empty() -> Option<Self> {
        Some(BTreeSet::new())
    }

    fn append(&mut self, item: T) -> Result<(), T> {
        self.insert(item);
        Ok(())
    }
}

impl<T: Bindable + Eq + Hash> Container for IndexSet<T> {
    type Item = T;
    const CAPABILITY: ContainerCapability = ContainerCapability::Set;

    fn from_sequence(items: Vec<T>) -> Result<Self, Vec<T>> {
        Ok(items.into_iter().collect())
    }
}

macro_rules! bindable_containers {
    ($([$($generics:tt)*] $ty:ty),* $(,)?) => {$(
        impl<$($generics)*> Bindable for $ty {
            fn descriptor() -> TypeDescriptor {
                descriptor_of::<Self>()
            }

            fn from_bound(value: BoundValue) -> Result<Self, BindError> {
                assemble(value)
            }
        }
    )*};
}

bindable_containers!(
    [T: Bindable] Vec<T>,
    [T: Bindable] Box<[T]>,
    [T: Bindable] VecDeque<T>,
    [T: Bindable] Arc<[T]>,
    [T: Bindable + Eq + Hash] HashSet<T>,
    [T: Bindable + Ord] BTreeSet<T>,
    [T: Bindable + Eq + Hash] IndexSet<T>,
);
