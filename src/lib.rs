//! Bind layered configuration onto plain Rust types. Describe a type's
//! constructor, point at your files, and go.
//!
//! Confbind resolves configuration from config files, environment variables
//! and programmatic overrides into one flat, colon-delimited key space, then
//! builds typed values out of it by walking each type's constructor
//! parameters.
//!
//! ```ignore
//! let config: AppConfig = Confbind::builder()
//!     .app_name("myapp")
//!     .bind(None)?;
//! ```
//!
//! That single call searches the platform config directory for `myapp.toml`,
//! layers `MYAPP__*` environment variables on top, and binds `AppConfig` from
//! the `AppConfig` section.
//!
//! # Describing a type
//!
//! A bindable record implements [`Shape`]: it lists one or more constructors
//! (parameter name plus declared type) and builds itself from the bound
//! arguments. The [`shape!`] macro writes both halves for the common case of
//! a struct with one field per parameter:
//!
//! ```
//! use confbind::MemoryStore;
//!
//! confbind::shape! {
//!     struct Server {
//!         host: String,
//!         port: u16,
//!         tls: Option<bool>,
//!     }
//! }
//!
//! let mut store = MemoryStore::new();
//! store.insert("Server:host", "localhost");
//! store.insert("Server:port", "8080");
//!
//! let server: Server = confbind::bind(&store, None).unwrap();
//! assert_eq!(server.port, 8080);
//! assert_eq!(server.tls, None);
//! ```
//!
//! Hand-written [`Shape`] impls can declare several constructors. The binder
//! picks the one with the most parameters, and the first declared among
//! equals.
//!
//! # Binding rules
//!
//! - **Scalars** (integers, floats, [`rust_decimal::Decimal`], `bool`,
//!   `char`, `String`, chrono dates and times, [`url::Url`]) are read from
//!   the key `section:param` and converted from text.
//! - **`Option<T>`** marks a parameter nullable. A missing scalar becomes
//!   `None`; a nested record whose whole section is absent becomes `None`.
//!   Required parameters fail with a missing-key error naming the key.
//! - **Nested records** bind from the child section `section:param`.
//! - **Collections** (`Vec`, `Box<[T]>`, `Arc<[T]>`, `VecDeque`, `HashSet`,
//!   `BTreeSet`, `IndexSet`) bind from indexed children `param:0`,
//!   `param:1`, ... and are never `None`; an absent collection is empty.
//!   Sets keep the first occurrence of each element. Custom containers
//!   implement [`Container`] and register with [`bindable_container!`].
//! - **Self-reference** through non-nullable parameters can never terminate
//!   and is reported as an error instead of recursing forever.
//!
//! # Layer precedence
//!
//! ```text
//! Config files          search paths in order, later paths win
//!        ↑ overridden by
//! Environment vars      PREFIX__Section__Key
//!        ↑ overridden by
//! Overrides             .set() / .overrides_from()
//! ```
//!
//! Every layer is **sparse**: a key replaces the same key below it and leaves
//! everything else alone. Config files don't need to be complete, and an env
//! var can target a single key.
//!
//! # File discovery
//!
//! [`search_paths()`](ConfbindBuilder::search_paths) accepts a list of
//! [`SearchPath`] variants in **priority-ascending** order (last = highest).
//! `Ancestors` walks up from the working directory until a [`Boundary`].
//! Missing files are skipped. [`search_mode()`](ConfbindBuilder::search_mode)
//! decides whether every file found is layered ([`SearchMode::Merge`]) or only
//! the highest-priority one is read ([`SearchMode::FirstMatch`]).
//!
//! TOML and JSON files are supported, chosen by extension. Tables nest with
//! `:` and arrays become indexed children, so
//!
//! ```toml
//! [AppConfig]
//! tags = ["a", "b"]
//! ```
//!
//! resolves to `AppConfig:tags:0 = a` and `AppConfig:tags:1 = b`.
//!
//! # Environment variables
//!
//! With env prefix `MYAPP`, `__` separates nesting levels:
//!
//! | Env var | Config key |
//! |---------|------------|
//! | `MYAPP__AppConfig__host` | `AppConfig:host` |
//! | `MYAPP__AppConfig__tags__0` | `AppConfig:tags:0` |
//!
//! Keys are case-sensitive and segments are kept verbatim.
//!
//! # Without the builder
//!
//! Anything implementing [`ConfigStore`] can be bound directly with
//! [`bind`] or a [`Binder`]. [`ResolveInput`] and [`resolve::resolve`] run
//! the layering on pre-loaded data with no I/O.
//!
//! # Error handling
//!
//! Binding returns [`BindError`], which separates shape problems (a type that
//! can never be bound), configuration problems (missing keys, unparsable
//! values) and source problems (unreadable or malformed files). See the
//! [`error`] module for the full set.

pub mod binder;
pub mod collection;
pub mod env;
pub mod error;
pub mod file;
pub mod flatten;
pub mod resolve;
pub mod scalar;
pub mod shape;
pub mod store;
pub mod types;
pub mod value;

mod builder;
mod macros;

#[cfg(test)]
mod fixtures;

pub use binder::Binder;
pub use builder::{Confbind, ConfbindBuilder};
pub use collection::Container;
pub use error::{BindError, ConfigurationBindError, ParseFailure, ShapeError, SourceError};
pub use resolve::ResolveInput;
pub use shape::{
    Bindable, ContainerCapability, Parameter, ScalarKind, Shape, ShapeDescription,
    TypeDescriptor, describe,
};
pub use store::{Child, ConfigStore, MemoryStore};
pub use types::{Boundary, SearchMode, SearchPath};
pub use value::{Arguments, BoundValue, Record};

/// Bind `T` from `store`, reading `section` or the section named after the type.
pub fn bind<T: Shape, S: ConfigStore + ?Sized>(
    store: &S,
    section: Option<&str>,
) -> Result<T, BindError> {
    Binder::new(store).bind(section)
}

/// Method-call form of [`bind`] for any store.
pub trait BindStoreExt: ConfigStore {
    fn bind<T: Shape>(&self, section: Option<&str>) -> Result<T, BindError> {
        Binder::new(self).bind(section)
    }
}

impl<S: ConfigStore + ?Sized> BindStoreExt for S {}
