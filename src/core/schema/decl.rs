//! Type declarations as seen by the schema translator.
//!
//! Rust has no runtime type introspection, so declared types are described
//! explicitly with [`TypeDecl`]. The [`Describe`] trait produces the
//! declaration for common standard library types, and [`describe_record!`]
//! declares one for a user struct.
//!
//! [`describe_record!`]: crate::describe_record

use super::PrimitiveKind;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

/// A single named field of a structured record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeDecl,
    /// The declared default, if the field has one.
    pub default: Option<Value>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeDecl) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// A structured type whose fields are individually declared.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    /// Set when the fields could not be introspected.
    pub opaque: bool,
}

impl RecordDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            opaque: false,
        }
    }

    /// A record known only by name.
    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            opaque: true,
        }
    }

    /// Adds a required field of type `T`.
    pub fn field<T: Describe + ?Sized>(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldDecl::new(name, T::type_decl()));
        self
    }

    /// Adds a field of type `T` with a declared default.
    pub fn field_with_default<T: Describe + ?Sized>(
        mut self,
        name: impl Into<String>,
        default: Value,
    ) -> Self {
        self.fields
            .push(FieldDecl::new(name, T::type_decl()).with_default(default));
        self
    }

    pub fn push(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }
}

/// A declared type, before translation.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDecl {
    /// No declaration at all.
    Empty,
    /// The null/absence type.
    Null,
    Primitive(PrimitiveKind),
    Record(RecordDecl),
    Union(Vec<TypeDecl>),
    /// A homogeneous sequence with its element type, if declared.
    Sequence(Option<Box<TypeDecl>>),
    /// A key/value mapping; only the value type is represented in schemas.
    Mapping {
        key: Option<Box<TypeDecl>>,
        value: Option<Box<TypeDecl>>,
    },
    /// A fixed-arity heterogeneous sequence.
    Tuple(Vec<TypeDecl>),
    /// A sequence container named without parameters.
    BareSequence,
    /// A mapping container named without parameters.
    BareMapping,
    /// Any other declared type, by name.
    Named(String),
    /// Something the translator has no rule for, by its string form.
    Unknown(String),
}

impl TypeDecl {
    pub fn of<T: Describe + ?Sized>() -> Self {
        T::type_decl()
    }

    pub fn optional(inner: TypeDecl) -> Self {
        TypeDecl::Union(vec![inner, TypeDecl::Null])
    }

    pub fn union(branches: impl IntoIterator<Item = TypeDecl>) -> Self {
        TypeDecl::Union(branches.into_iter().collect())
    }

    pub fn sequence(item: TypeDecl) -> Self {
        TypeDecl::Sequence(Some(Box::new(item)))
    }

    pub fn mapping(key: TypeDecl, value: TypeDecl) -> Self {
        TypeDecl::Mapping {
            key: Some(Box::new(key)),
            value: Some(Box::new(value)),
        }
    }

    /// A type known only by its Rust name.
    pub fn named<T: ?Sized>() -> Self {
        TypeDecl::Named(short_type_name::<T>())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TypeDecl::Null)
    }
}

impl From<RecordDecl> for TypeDecl {
    fn from(record: RecordDecl) -> Self {
        TypeDecl::Record(record)
    }
}

/// The last path segment of a Rust type name, without generic arguments.
pub fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Serializes a declared default, falling back to null.
pub fn default_value<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Types that can report their own declaration.
pub trait Describe {
    fn type_decl() -> TypeDecl;
}

macro_rules! describe_primitive {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Describe for $ty {
                fn type_decl() -> TypeDecl {
                    TypeDecl::Primitive($kind)
                }
            }
        )+
    };
}

describe_primitive!(PrimitiveKind::String => String, str, char);
describe_primitive!(PrimitiveKind::Integer => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
describe_primitive!(PrimitiveKind::Number => f32, f64);
describe_primitive!(PrimitiveKind::Boolean => bool);

impl Describe for () {
    fn type_decl() -> TypeDecl {
        TypeDecl::Null
    }
}

impl Describe for Value {
    fn type_decl() -> TypeDecl {
        TypeDecl::Empty
    }
}

impl Describe for serde_json::Map<String, Value> {
    fn type_decl() -> TypeDecl {
        TypeDecl::BareMapping
    }
}

impl<T: Describe + ?Sized> Describe for &T {
    fn type_decl() -> TypeDecl {
        T::type_decl()
    }
}

impl<T: Describe + ?Sized> Describe for Box<T> {
    fn type_decl() -> TypeDecl {
        T::type_decl()
    }
}

impl<T: Describe + ?Sized> Describe for Arc<T> {
    fn type_decl() -> TypeDecl {
        T::type_decl()
    }
}

impl<T: Describe + ?Sized> Describe for Rc<T> {
    fn type_decl() -> TypeDecl {
        T::type_decl()
    }
}

impl<T: Describe> Describe for Option<T> {
    fn type_decl() -> TypeDecl {
        TypeDecl::optional(T::type_decl())
    }
}

macro_rules! describe_sequence {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl<T: Describe> Describe for $ty<T> {
                fn type_decl() -> TypeDecl {
                    TypeDecl::sequence(T::type_decl())
                }
            }
        )+
    };
}

describe_sequence!(Vec, VecDeque, HashSet, BTreeSet);

impl<T: Describe> Describe for [T] {
    fn type_decl() -> TypeDecl {
        TypeDecl::sequence(T::type_decl())
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn type_decl() -> TypeDecl {
        TypeDecl::sequence(T::type_decl())
    }
}

impl<K: Describe, V: Describe> Describe for HashMap<K, V> {
    fn type_decl() -> TypeDecl {
        TypeDecl::mapping(K::type_decl(), V::type_decl())
    }
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn type_decl() -> TypeDecl {
        TypeDecl::mapping(K::type_decl(), V::type_decl())
    }
}

macro_rules! describe_tuple {
    ($($name:ident),+) => {
        impl<$($name: Describe),+> Describe for ($($name,)+) {
            fn type_decl() -> TypeDecl {
                TypeDecl::Tuple(vec![$($name::type_decl()),+])
            }
        }
    };
}

describe_tuple!(A);
describe_tuple!(A, B);
describe_tuple!(A, B, C);
describe_tuple!(A, B, C, D);
describe_tuple!(A, B, C, D, E);
describe_tuple!(A, B, C, D, E, F);

/// Implements [`Describe`] for a struct from its field list.
///
/// Fields followed by `= <expr>` are declared with a default and are
/// therefore not required.
///
/// ```rust
/// use blackbox::describe_record;
///
/// #[derive(serde::Serialize)]
/// struct Reply {
///     response: String,
///     tokens_used: i64,
///     tone: Option<String>,
/// }
///
/// describe_record!(Reply {
///     response: String,
///     tokens_used: i64,
///     tone: Option<String> = None::<String>,
/// });
/// ```
#[macro_export]
macro_rules! describe_record {
    ($name:ident { $($field:ident : $ty:ty $(= $default:expr)?),* $(,)? }) => {
        impl $crate::Describe for $name {
            fn type_decl() -> $crate::TypeDecl {
                #[allow(unused_mut)]
                let mut record = $crate::RecordDecl::new(stringify!($name));
                $(
                    #[allow(unused_mut)]
                    let mut field = $crate::FieldDecl::new(
                        stringify!($field),
                        <$ty as $crate::Describe>::type_decl(),
                    );
                    $(
                        field = field.with_default($crate::default_value(&$default));
                    )?
                    record = record.push(field);
                )*
                $crate::TypeDecl::Record(record)
            }
        }
    };
}
