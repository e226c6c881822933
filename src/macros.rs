/// Declare a record struct and make it bindable.
///
/// Field order is the order of the single constructor's parameters, and each
/// field name is the key segment it binds from.
///
/// ```
/// confbind::shape! {
///     #[derive(Debug)]
///     pub struct Server {
///         pub host: String,
///         pub port: u16,
///         pub tls: Option<bool>,
///     }
/// }
///
/// let store: confbind::MemoryStore =
///     [("Server:host", "localhost"), ("Server:port", "8080")].into_iter().collect();
/// let server: Server = confbind::bind(&store, None).unwrap();
/// assert_eq!(server.port, 8080);
/// assert_eq!(server.tls, None);
/// ```
#[macro_export]
macro_rules! shape {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$field_meta:meta])* $field_vis:vis $field:ident : $ty:ty),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($(#[$field_meta])* $field_vis $field: $ty),*
        }

        impl $crate::Shape for $name {
            fn describe() -> $crate::ShapeDescription {
                $crate::ShapeDescription::new(::core::stringify!($name)).constructor(
                    ::std::vec![$($crate::Parameter::of::<$ty>(::core::stringify!($field))),*],
                )
            }

            fn construct(
                _constructor: usize,
                #[allow(unused_mut, unused_variables)] mut args: $crate::Arguments,
            ) -> ::core::result::Result<Self, $crate::BindError> {
                ::core::result::Result::Ok(Self {
                    $($field: args.next::<$ty>()?),*
                })
            }
        }

        $crate::bindable_shape!($name);
    };
}

/// Implement [`Bindable`](crate::Bindable) for types that already implement
/// [`Shape`](crate::Shape) by hand.
#[macro_export]
macro_rules! bindable_shape {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Bindable for $ty {
            fn descriptor() -> $crate::TypeDescriptor {
                $crate::shape::nested::<Self>()
            }

            fn from_bound(
                value: $crate::BoundValue,
            ) -> ::core::result::Result<Self, $crate::BindError> {
                $crate::shape::construct::<Self>(value)
            }
        }
    )+};
}

/// Implement [`Bindable`](crate::Bindable) for custom
/// [`Container`](crate::Container) types.
#[macro_export]
macro_rules! bindable_container {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Bindable for $ty {
            fn descriptor() -> $crate::TypeDescriptor {
                $crate::collection::descriptor_of::<Self>()
            }

            fn from_bound(
                value: $crate::BoundValue,
            ) -> ::core::result::Result<Self, $crate::BindError> {
                $crate::collection::assemble::<Self>(value)
            }
        }
    )+};
}
