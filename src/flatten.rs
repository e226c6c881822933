//! Serde serializer that flattens any `Serialize` value into the
//! colon-delimited pairs a [`MemoryStore`] holds.
//!
//! | Input                | Output                                   |
//! |----------------------|------------------------------------------|
//! | struct field, map key | `parent:name`                           |
//! | sequence element     | `parent:0`, `parent:1`, ...              |
//! | scalar               | its `Display` form                       |
//! | `None` / unit        | nothing, or an empty value inside a list |
//!
//! A null list element keeps its slot as an empty value so later elements
//! keep their index. Nullable element types bind it as `None`.
//!
//! [`MemoryStore`]: crate::MemoryStore

use std::fmt::Display;

use serde::ser::{self, Impossible, Serialize};
use thiserror::Error;

use crate::store::child_key;

/// Field name toml uses to smuggle datetimes through serde.
const TOML_DATETIME_FIELD: &str = "$__toml_private_datetime";

/// Flatten `source` into `(key, value)` pairs, in serialization order.
pub fn flatten<S: Serialize + ?Sized>(source: &S) -> Result<Vec<(String, String)>, FlattenError> {
    let mut out = Vec::new();
    source.serialize(Flattener {
        prefix: String::new(),
        out: &mut out,
        element: false,
    })?;
    Ok(out)
}

#[derive(Debug, Error)]
#[error("flatten error: {0}")]
pub struct FlattenError(String);

impl ser::Error for FlattenError {
    fn custom<T: Display>(msg: T) -> Self {
        FlattenError(msg.to_string())
    }
}

/// Serializes one value at `prefix`.
struct Flattener<'a> {
    prefix: String,
    out: &'a mut Vec<(String, String)>,
    /// The value is a list element, so absence must still hold its slot.
    element: bool,
}

impl<'a> Flattener<'a> {
    fn emit(self, value: impl Display) -> Result<(), FlattenError> {
        self.out.push((self.prefix, value.to_string()));
        Ok(())
    }

    fn absent(self) -> Result<(), FlattenError> {
        if self.element {
            self.out.push((self.prefix, String::new()));
        }
        Ok(())
    }

    fn nest(self) -> Compound<'a> {
        Compound {
            prefix: self.prefix,
            out: self.out,
            next_index: 0,
            pending_key: None,
        }
    }
}

macro_rules! leaves {
    ($($method:ident: $ty:ty),* $(,)?) => {$(
        fn $method(self, v: $ty) -> Result<(), FlattenError> {
            self.emit(v)
        }
    )*};
}

impl<'a> ser::Serializer for Flattener<'a> {
    type Ok = ();
    type Error = FlattenError;
    type SerializeSeq = Compound<'a>;
    type SerializeTuple = Compound<'a>;
    type SerializeTupleStruct = Compound<'a>;
    type SerializeTupleVariant = Compound<'a>;
    type SerializeMap = Compound<'a>;
    type SerializeStruct = Compound<'a>;
    type SerializeStructVariant = Compound<'a>;

    leaves!(
        serialize_bool: bool,
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_i128: i128,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_u128: u128,
        serialize_f32: f32,
        serialize_f64: f64,
        serialize_char: char,
        serialize_str: &str,
    );

    fn serialize_bytes(self, _: &[u8]) -> Result<(), FlattenError> {
        Err(FlattenError("bytes not supported".into()))
    }

    fn serialize_none(self) -> Result<(), FlattenError> {
        self.absent()
    }

    fn serialize_unit(self) -> Result<(), FlattenError> {
        self.absent()
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result<(), FlattenError> {
        self.absent()
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), FlattenError> {
        value.serialize(self)
    }

    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
    ) -> Result<(), FlattenError> {
        self.emit(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<(), FlattenError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> Result<(), FlattenError> {
        value.serialize(self)
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Compound<'a>, FlattenError> {
        Ok(self.nest())
    }

    fn serialize_tuple(self, _: usize) -> Result<Compound<'a>, FlattenError> {
        Ok(self.nest())
    }

    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> Result<Compound<'a>, FlattenError> {
        Ok(self.nest())
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Compound<'a>, FlattenError> {
        Ok(self.nest())
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Compound<'a>, FlattenError> {
        Ok(self.nest())
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Compound<'a>, FlattenError> {
        Ok(self.nest())
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Compound<'a>, FlattenError> {
        Ok(self.nest())
    }
}

/// Children of one section: indexed elements or named fields.
struct Compound<'a> {
    prefix: String,
    out: &'a mut Vec<(String, String)>,
    next_index: usize,
    pending_key: Option<String>,
}

impl Compound<'_> {
    fn element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), FlattenError> {
        let prefix = child_key(&self.prefix, &self.next_index.to_string());
        self.next_index += 1;
        value.serialize(Flattener {
            prefix,
            out: self.out,
            element: true,
        })
    }

    fn field<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<(), FlattenError> {
        // A toml datetime is a one-field struct whose value belongs at the
        // enclosing key.
        let prefix = if name == TOML_DATETIME_FIELD {
            self.prefix.clone()
        } else {
            child_key(&self.prefix, name)
        };
        value.serialize(Flattener {
            prefix,
            out: self.out,
            element: false,
        })
    }
}

macro_rules! compound_impls {
    ($($trait:ident :: $method:ident),* $(,)?) => {$(
        impl ser::$trait for Compound<'_> {
            type Ok = ();
            type Error = FlattenError;

            fn $method<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), FlattenError> {
                self.element(value)
            }

            fn end(self) -> Result<(), FlattenError> {
                Ok(())
            }
        }
    )*};
}

compound_impls!(
    SerializeSeq::serialize_element,
    SerializeTuple::serialize_element,
    SerializeTupleStruct::serialize_field,
    SerializeTupleVariant::serialize_field,
);

impl ser::SerializeStruct for Compound<'_> {
    type Ok = ();
    type Error = FlattenError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), FlattenError> {
        self.field(key, value)
    }

    fn end(self) -> Result<(), FlattenError> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for Compound<'_> {
    type Ok = ();
    type Error = FlattenError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), FlattenError> {
        self.field(key, value)
    }

    fn end(self) -> Result<(), FlattenError> {
        Ok(())
    }
}

impl ser::SerializeMap for Compound<'_> {
    type Ok = ();
    type Error = FlattenError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), FlattenError> {
        self.pending_key = Some(key.serialize(KeySegment)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), FlattenError> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| FlattenError("map value without a key".into()))?;
        self.field(&key, value)
    }

    fn end(self) -> Result<(), FlattenError> {
        Ok(())
    }
}

/// Turns a map key into one key segment.
struct KeySegment;

fn key_error() -> FlattenError {
    FlattenError("map keys must be strings, integers or booleans".into())
}

macro_rules! segments {
    ($($method:ident: $ty:ty),* $(,)?) => {$(
        fn $method(self, v: $ty) -> Result<String, FlattenError> {
            Ok(v.to_string())
        }
    )*};
}

macro_rules! rejected {
    ($($method:ident($($arg:ty),*)),* $(,)?) => {$(
        fn $method(self, $(_: $arg),*) -> Result<String, FlattenError> {
            Err(key_error())
        }
    )*};
}

type NoKey = Impossible<String, FlattenError>;

impl ser::Serializer for KeySegment {
    type Ok = String;
    type Error = FlattenError;
    type SerializeSeq = NoKey;
    type SerializeTuple = NoKey;
    type SerializeTupleStruct = NoKey;
    type SerializeTupleVariant = NoKey;
    type SerializeMap = NoKey;
    type SerializeStruct = NoKey;
    type SerializeStructVariant = NoKey;

    segments!(
        serialize_bool: bool,
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_char: char,
        serialize_str: &str,
    );

    rejected!(
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_bytes(&[u8]),
        serialize_none(),
        serialize_unit(),
        serialize_unit_struct(&'static str),
    );

    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
    ) -> Result<String, FlattenError> {
        Ok(variant.to_string())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, v: &T) -> Result<String, FlattenError> {
        v.serialize(self)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        v: &T,
    ) -> Result<String, FlattenError> {
        v.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<String, FlattenError> {
        Err(key_error())
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<NoKey, FlattenError> {
        Err(key_error())
    }

    fn serialize_tuple(self, _: usize) -> Result<NoKey, FlattenError> {
        Err(key_error())
    }

    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> Result<NoKey, FlattenError> {
        Err(key_error())
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<NoKey, FlattenError> {
        Err(key_error())
    }

    fn serialize_map(self, _: Option<usize>) -> Result<NoKey, FlattenError> {
        Err(key_error())
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<NoKey, FlattenError> {
        Err(key_error())
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<NoKey, FlattenError> {
        Err(key_error())
    }
}
