//! The object binder: walks a shape description against a store and
//! produces the constructor arguments for it.
//!
//! Binding is depth first and fail fast. Parameters are resolved in
//! declaration order and the first error aborts the whole bind.

use std::ptr;

use crate::error::{BindError, ConfigurationBindError, ShapeError};
use crate::scalar;
use crate::shape::{self, Parameter, ScalarKind, Shape, ShapeDescription, TypeDescriptor};
use crate::store::{ConfigStore, child_key};
use crate::value::{BoundValue, Record};

/// Shapes entered through non-nullable nested parameters on the way down to
/// the shape currently being bound.
pub(crate) struct Chain<'c> {
    shape: &'static ShapeDescription,
    parent: Option<&'c Chain<'c>>,
}

impl Chain<'_> {
    fn contains(&self, shape: &ShapeDescription) -> bool {
        let mut link = Some(self);
        while let Some(current) = link {
            if ptr::eq(current.shape, shape) {
                return true;
            }
            link = current.parent;
        }
        false
    }
}

/// Binds shapes against one store.
///
/// ```ignore
/// let store: MemoryStore = [("Server:host", "localhost")].into_iter().collect();
/// let server: Server = Binder::new(&store).bind(None)?;
/// ```
pub struct Binder<'s, S: ConfigStore + ?Sized> {
    pub(crate) store: &'s S,
}

impl<'s, S: ConfigStore + ?Sized> Binder<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Bind `T` from `section`, or from the section named after the type.
    pub fn bind<T: Shape>(&self, section: Option<&str>) -> Result<T, BindError> {
        let value = self.bind_value(shape::describe::<T>(), section, false)?;
        shape::construct::<T>(value)
    }

    /// Bind a shape into its dynamic form.
    ///
    /// With `nullable` set, a missing section yields [`BoundValue::Null`]
    /// instead of per-field failures.
    pub fn bind_value(
        &self,
        shape: &'static ShapeDescription,
        key: Option<&str>,
        nullable: bool,
    ) -> Result<BoundValue, BindError> {
        self.bind_shape(shape, key, nullable, None)
    }

    pub(crate) fn bind_shape(
        &self,
        shape: &'static ShapeDescription,
        key: Option<&str>,
        nullable: bool,
        chain: Option<&Chain<'_>>,
    ) -> Result<BoundValue, BindError> {
        let key = key.unwrap_or(shape.type_name);

        let Some((index, constructor)) = shape.select_constructor() else {
            return Err(ShapeError::NoPublicConstructor(shape.type_name.to_string()).into());
        };
        if chain.is_some_and(|c| c.contains(shape)) {
            return Err(ShapeError::RecursiveShape(shape.type_name.to_string()).into());
        }

        if nullable && !constructor.parameters.is_empty() && !self.store.exists(key) {
            tracing::debug!(shape = shape.type_name, key, "section absent, binding null");
            return Ok(BoundValue::Null);
        }

        tracing::trace!(
            shape = shape.type_name,
            key,
            constructor = index,
            parameters = constructor.parameters.len(),
            "binding shape"
        );

        let link = Chain {
            shape,
            parent: chain,
        };
        let mut arguments = Vec::with_capacity(constructor.parameters.len());
        for parameter in &constructor.parameters {
            let param_key = child_key(key, parameter.name);
            arguments.push(self.bind_parameter(parameter, &param_key, &link)?);
        }

        Ok(BoundValue::Record(Record {
            type_name: shape.type_name,
            constructor: index,
            arguments,
        }))
    }

    fn bind_parameter(
        &self,
        parameter: &Parameter,
        key: &str,
        chain: &Chain<'_>,
    ) -> Result<BoundValue, BindError> {
        match &parameter.descriptor {
            TypeDescriptor::Scalar(kind) => {
                self.resolve_scalar(*kind, key, parameter.name, parameter.nullable)
            }
            TypeDescriptor::Nested(nested) => {
                // A nullable edge ends at the first missing section, so only
                // required edges can recurse without bound.
                let chain = (!parameter.nullable).then_some(chain);
                self.bind_shape(nested.get(), Some(key), parameter.nullable, chain)
            }
            TypeDescriptor::Collection(collection) => self.build_collection(key, collection),
        }
    }

    /// Read and convert a single value. `param` names the target in the
    /// missing-key message.
    ///
    /// For nullable targets other than strings an empty value reads as
    /// absent, which is how a null list element is stored.
    pub(crate) fn resolve_scalar(
        &self,
        kind: ScalarKind,
        key: &str,
        param: &str,
        nullable: bool,
    ) -> Result<BoundValue, BindError> {
        let Some(raw) = self.store.get_scalar(key) else {
            if nullable {
                return Ok(BoundValue::Null);
            }
            return Err(ConfigurationBindError::MissingKey {
                key: key.to_string(),
                param: param.to_string(),
            }
            .into());
        };
        if nullable && raw.is_empty() && kind != ScalarKind::String {
            return Ok(BoundValue::Null);
        }
        Ok(scalar::convert(raw, key, kind)?)
    }
}
