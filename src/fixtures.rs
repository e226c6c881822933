#[cfg(test)]
pub mod test {
    use std::collections::{BTreeSet, HashSet, VecDeque};
    use std::sync::Arc;

    use chrono::NaiveDateTime;
    use indexmap::IndexSet;
    use rust_decimal::Decimal;
    use url::Url;

    use crate::collection::Container;
    use crate::shape::{Parameter, ScalarKind, Shape, ShapeDescription, TypeDescriptor, nested};
    use crate::{Arguments, BindError, Bindable, BoundValue, ContainerCapability};

    // -- Scalar records ----------------------------------------------------------

    crate::shape! {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct RequiredString {
            pub foo: String,
        }
    }

    crate::shape! {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct OptionalString {
            pub foo: Option<String>,
        }
    }

    crate::shape! {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct MultipleTypes {
            pub foo: String,
            pub bar: i32,
            pub other: bool,
            pub misc: Decimal,
            pub blah: NaiveDateTime,
            pub url: Url,
        }
    }

    crate::shape! {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct MultipleOptionalTypes {
            pub foo: Option<String>,
            pub bar: Option<i32>,
            pub other: Option<bool>,
            pub misc: Option<Decimal>,
            pub blah: Option<NaiveDateTime>,
            pub url: Option<Url>,
        }
    }

    crate::shape! {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct Empty {}
    }

    // -- Hand-written shapes -----------------------------------------------------

    /// Two constructors; the wider one is declared second.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Overloaded {
        pub name: String,
        pub size: u32,
    }

    impl Shape for Overloaded {
        fn describe() -> ShapeDescription {
            ShapeDescription::new("Overloaded")
                .constructor(vec![Parameter::of::<String>("name")])
                .constructor(vec![
                    Parameter::of::<String>("name"),
                    Parameter::of::<u32>("size"),
                ])
        }

        fn construct(constructor: usize, mut args: Arguments) -> Result<Self, BindError> {
            let name = args.next()?;
            let size = if constructor == 1 { args.next()? } else { 0 };
            Ok(Self { name, size })
        }
    }

    #[derive(Debug)]
    pub struct NoPublicConstructor;

    impl Shape for NoPublicConstructor {
        fn describe() -> ShapeDescription {
            ShapeDescription::new("NoPublicConstructor")
        }

        fn construct(_: usize, _: Arguments) -> Result<Self, BindError> {
            Ok(NoPublicConstructor)
        }
    }

    /// Requires itself, so no finite configuration can satisfy it.
    #[derive(Debug)]
    pub struct Ouroboros {
        pub tail: Box<Ouroboros>,
    }

    impl Shape for Ouroboros {
        fn describe() -> ShapeDescription {
            ShapeDescription::new("Ouroboros").constructor(vec![Parameter {
                name: "tail",
                descriptor: nested::<Ouroboros>(),
                nullable: false,
            }])
        }

        fn construct(_: usize, mut args: Arguments) -> Result<Self, BindError> {
            Ok(Self {
                tail: Box::new(args.next()?),
            })
        }
    }

    #[derive(Debug)]
    pub struct LinkedNode {
        pub value: i32,
        pub next: Option<Box<LinkedNode>>,
    }

    impl Shape for LinkedNode {
        fn describe() -> ShapeDescription {
            ShapeDescription::new("LinkedNode").constructor(vec![
                Parameter::of::<i32>("value"),
                Parameter::of::<Option<LinkedNode>>("next"),
            ])
        }

        fn construct(_: usize, mut args: Arguments) -> Result<Self, BindError> {
            Ok(Self {
                value: args.next()?,
                next: args.next::<Option<LinkedNode>>()?.map(Box::new),
            })
        }
    }

    crate::bindable_shape!(Overloaded, NoPublicConstructor, Ouroboros, LinkedNode);

    crate::shape! {
        #[derive(Debug)]
        pub struct NestedNoPublicConstructor {
            pub inner: Option<NoPublicConstructor>,
        }
    }

    /// A scalar with no registered converter.
    #[derive(Debug)]
    pub struct Handle;

    impl Bindable for Handle {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::Scalar(ScalarKind::Other("Handle"))
        }

        fn from_bound(_: BoundValue) -> Result<Self, BindError> {
            Ok(Handle)
        }
    }

    crate::shape! {
        #[derive(Debug)]
        pub struct Opaque {
            pub handle: Handle,
        }
    }

    // -- Nested records ----------------------------------------------------------

    crate::shape! {
        #[derive(Debug)]
        pub struct NestedRequired {
            pub inner: RequiredString,
        }
    }

    crate::shape! {
        #[derive(Debug)]
        pub struct NestedOptional {
            pub name: String,
            pub inner: Option<OptionalString>,
        }
    }

    crate::shape! {
        #[derive(Debug)]
        pub struct NestedOptionalRequired {
            pub inner: Option<MultipleTypes>,
        }
    }

    crate::shape! {
        #[derive(Debug)]
        pub struct NestedEmpty {
            pub inner: Option<Empty>,
        }
    }

    // -- Collections -------------------------------------------------------------

    crate::shape! {
        #[derive(Debug)]
        pub struct ListOfInt {
            pub ints: Vec<i32>,
        }
    }

    crate::shape! {
        #[derive(Debug)]
        pub struct SetOfInt {
            pub ints: HashSet<i32>,
        }
    }

    crate::shape! {
        #[derive(Debug)]
        pub struct EnumerableOfInt {
            pub ints: Arc<[i32]>,
        }
    }

    crate::shape! {
        #[derive(Debug)]
        pub struct ListOfString {
            pub strings: Vec<String>,
        }
    }

    crate::shape! {
        #[derive(Debug)]
        pub struct OptionalList {
            pub ints: Option<Vec<i32>>,
        }
    }

    crate::shape! {
        #[derive(Debug)]
        pub struct ListOfOptional {
            pub items: Vec<Option<i32>>,
        }
    }

    crate::shape! {
        #[derive(Debug)]
        pub struct Containers {
            pub boxed: Box<[String]>,
            pub deque: VecDeque<u8>,
            pub ordered: BTreeSet<String>,
            pub indexed: IndexSet<String>,
        }
    }

    crate::shape! {
        #[derive(Debug)]
        pub struct ListOfLists {
            pub lists: Vec<Vec<String>>,
        }
    }

    crate::shape! {
        #[derive(Debug)]
        pub struct ListOfSets {
            pub sets: Vec<HashSet<i32>>,
        }
    }

    crate::shape! {
        #[derive(Debug)]
        pub struct ListOfMultipleTypes {
            pub items: Vec<MultipleTypes>,
        }
    }

    crate::shape! {
        #[derive(Debug)]
        pub struct ComplexType {
            pub name: String,
            pub strings: HashSet<String>,
            pub records: HashSet<MultipleTypes>,
        }
    }

    crate::shape! {
        #[derive(Debug)]
        pub struct ListOfComplexTypes {
            pub items: Box<[ComplexType]>,
        }
    }

    /// Offers no way to be assembled.
    #[derive(Debug)]
    pub struct Frozen;

    impl Container for Frozen {
        type Item = i32;
        const CAPABILITY: ContainerCapability = ContainerCapability::OrderedSequence;
    }

    crate::bindable_container!(Frozen);

    crate::shape! {
        #[derive(Debug)]
        pub struct HoldsFrozen {
            pub frozen: Frozen,
        }
    }

    // -- Sources -----------------------------------------------------------------

    crate::shape! {
        #[derive(Debug, PartialEq)]
        pub struct AppConfig {
            pub host: String,
            pub port: u16,
            pub debug: Option<bool>,
            pub database: Database,
            pub tags: Vec<String>,
        }
    }

    crate::shape! {
        #[derive(Debug, PartialEq)]
        pub struct Database {
            pub url: Option<String>,
            pub pool_size: usize,
        }
    }
}
