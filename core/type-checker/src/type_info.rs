//! Type Information
//!
//! This module defines the semantic type representation used by the type
//! checker, the monomorphization collector and both code generators.
//!
//! PawLang types are:
//! - primitives: `i8`..`i128`, `u8`..`u128`, `f32`, `f64`, `bool`, `char`,
//!   `string`, `void`
//! - named nominal types (structs, enums, aliases)
//! - generic parameters (`T`) and generic instances (`Vec<i32>`)
//! - pointers, arrays and function types
//!
//! After monomorphization no reachable type may contain [`TypeInfo::Generic`];
//! [`TypeInfo::substitute`] performs the replacement and
//! [`TypeInfo::has_generics`] checks the invariant.

use core::fmt;
use std::fmt::{Display, Formatter};

use paw_ast::nodes::TypeExpr;
use rustc_hash::FxHashMap;

/// The closed set of primitive types.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
pub enum Primitive {
    I8,
    I16,
    I32,
    I64,
    I128,
    U8,
    U16,
    U32,
    U64,
    U128,
    F32,
    F64,
    Bool,
    Char,
    Str,
    Void,
}

impl Primitive {
    /// All primitive variants for iteration.
    pub const ALL: &'static [Primitive] = &[
        Primitive::I8,
        Primitive::I16,
        Primitive::I32,
        Primitive::I64,
        Primitive::I128,
        Primitive::U8,
        Primitive::U16,
        Primitive::U32,
        Primitive::U64,
        Primitive::U128,
        Primitive::F32,
        Primitive::F64,
        Primitive::Bool,
        Primitive::Char,
        Primitive::Str,
        Primitive::Void,
    ];

    /// Canonical source spelling (`i32`, `string`, ...). Also the mangled
    /// form used in instance symbol names.
    #[must_use = "returns the string representation without modifying self"]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::I128 => "i128",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::U128 => "u128",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::Str => "string",
            Primitive::Void => "void",
        }
    }

    #[must_use = "this is a pure check with no side effects"]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Primitive::I8
                | Primitive::I16
                | Primitive::I32
                | Primitive::I64
                | Primitive::I128
                | Primitive::U8
                | Primitive::U16
                | Primitive::U32
                | Primitive::U64
                | Primitive::U128
        )
    }

    #[must_use = "this is a pure check with no side effects"]
    pub const fn is_signed(&self) -> bool {
        matches!(
            self,
            Primitive::I8 | Primitive::I16 | Primitive::I32 | Primitive::I64 | Primitive::I128
        )
    }

    #[must_use = "this is a pure check with no side effects"]
    pub const fn is_float(&self) -> bool {
        matches!(self, Primitive::F32 | Primitive::F64)
    }

    #[must_use = "this is a pure check with no side effects"]
    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Bit width of integer and float primitives; `bool` and `char` are 8,
    /// `string` and `void` have none.
    #[must_use]
    pub const fn bit_width(&self) -> Option<u32> {
        match self {
            Primitive::I8 | Primitive::U8 | Primitive::Bool | Primitive::Char => Some(8),
            Primitive::I16 | Primitive::U16 => Some(16),
            Primitive::I32 | Primitive::U32 | Primitive::F32 => Some(32),
            Primitive::I64 | Primitive::U64 | Primitive::F64 => Some(64),
            Primitive::I128 | Primitive::U128 => Some(128),
            Primitive::Str | Primitive::Void => None,
        }
    }
}

impl std::str::FromStr for Primitive {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|p| p.as_str() == s)
            .copied()
            .ok_or(())
    }
}

impl Display for Primitive {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A semantic type.
#[derive(Debug, Eq, PartialEq, Clone, Hash)]
pub enum TypeInfo {
    Primitive(Primitive),
    /// A nominal reference to a struct, enum or alias.
    Named(String),
    /// An in-scope type parameter, e.g. `T`.
    Generic(String),
    /// A parameterized nominal applied to arguments, e.g. `Vec<i32>`.
    GenericInstance(String, Vec<TypeInfo>),
    Pointer(Box<TypeInfo>),
    Array {
        element: Box<TypeInfo>,
        size: Option<u32>,
    },
    Function {
        params: Vec<TypeInfo>,
        ret: Box<TypeInfo>,
    },
}

impl Default for TypeInfo {
    fn default() -> Self {
        TypeInfo::Primitive(Primitive::Void)
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            TypeInfo::Primitive(p) => write!(f, "{p}"),
            TypeInfo::Named(name) | TypeInfo::Generic(name) => write!(f, "{name}"),
            TypeInfo::GenericInstance(name, args) => {
                let args = args
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{name}<{args}>")
            }
            TypeInfo::Pointer(inner) => write!(f, "&{inner}"),
            TypeInfo::Array {
                element,
                size: Some(size),
            } => write!(f, "[{element}; {size}]"),
            TypeInfo::Array {
                element,
                size: None,
            } => write!(f, "[{element}]"),
            TypeInfo::Function { params, ret } => {
                let params = params
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "fn({params}) -> {ret}")
            }
        }
    }
}

impl TypeInfo {
    #[must_use]
    pub fn void() -> Self {
        TypeInfo::Primitive(Primitive::Void)
    }

    #[must_use]
    pub fn bool() -> Self {
        TypeInfo::Primitive(Primitive::Bool)
    }

    #[must_use]
    pub fn i32() -> Self {
        TypeInfo::Primitive(Primitive::I32)
    }

    #[must_use]
    pub fn string() -> Self {
        TypeInfo::Primitive(Primitive::Str)
    }

    /// Converts a syntactic type, resolving primitive names and in-scope
    /// type parameters. `self_type` substitutes the written `Self`.
    #[must_use]
    pub fn from_type_expr(
        ty: &TypeExpr,
        type_params: &[String],
        self_type: Option<&TypeInfo>,
    ) -> Self {
        match ty {
            TypeExpr::Named(named) => {
                if type_params.contains(&named.name) {
                    return TypeInfo::Generic(named.name.clone());
                }
                named
                    .name
                    .parse::<Primitive>()
                    .map_or_else(|()| TypeInfo::Named(named.name.clone()), TypeInfo::Primitive)
            }
            TypeExpr::Instance(instance) => TypeInfo::GenericInstance(
                instance.name.clone(),
                instance
                    .args
                    .iter()
                    .map(|arg| Self::from_type_expr(arg, type_params, self_type))
                    .collect(),
            ),
            TypeExpr::Pointer(pointer) => TypeInfo::Pointer(Box::new(Self::from_type_expr(
                &pointer.inner,
                type_params,
                self_type,
            ))),
            TypeExpr::Array(array) => TypeInfo::Array {
                element: Box::new(Self::from_type_expr(&array.element, type_params, self_type)),
                size: array.size,
            },
            TypeExpr::Function(function) => TypeInfo::Function {
                params: function
                    .params
                    .iter()
                    .map(|p| Self::from_type_expr(p, type_params, self_type))
                    .collect(),
                ret: Box::new(function.ret.as_ref().map_or_else(TypeInfo::void, |r| {
                    Self::from_type_expr(r, type_params, self_type)
                })),
            },
            TypeExpr::SelfType(_) => self_type.cloned().unwrap_or_default(),
        }
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeInfo::Primitive(p) if p.is_numeric())
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_integer(&self) -> bool {
        matches!(self, TypeInfo::Primitive(p) if p.is_integer())
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_bool(&self) -> bool {
        matches!(self, TypeInfo::Primitive(Primitive::Bool))
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_void(&self) -> bool {
        matches!(self, TypeInfo::Primitive(Primitive::Void))
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_string(&self) -> bool {
        matches!(self, TypeInfo::Primitive(Primitive::Str))
    }

    /// Strips reference aliasing: `&T` behaves as `T` everywhere in the
    /// type system.
    #[must_use]
    pub fn deref_alias(&self) -> &TypeInfo {
        match self {
            TypeInfo::Pointer(inner) => inner.deref_alias(),
            other => other,
        }
    }

    /// The nominal name of a struct/enum type, through generic instances
    /// and references.
    #[must_use]
    pub fn nominal_name(&self) -> Option<&str> {
        match self.deref_alias() {
            TypeInfo::Named(name) | TypeInfo::GenericInstance(name, _) => Some(name),
            _ => None,
        }
    }

    /// Type arguments of a generic instance; empty for plain named types.
    #[must_use]
    pub fn type_args(&self) -> &[TypeInfo] {
        match self.deref_alias() {
            TypeInfo::GenericInstance(_, args) => args,
            _ => &[],
        }
    }

    /// Check if this type contains any unresolved type parameters.
    #[must_use = "this is a pure check with no side effects"]
    pub fn has_generics(&self) -> bool {
        match self {
            TypeInfo::Generic(_) => true,
            TypeInfo::GenericInstance(_, args) => args.iter().any(TypeInfo::has_generics),
            TypeInfo::Pointer(inner) => inner.has_generics(),
            TypeInfo::Array { element, .. } => element.has_generics(),
            TypeInfo::Function { params, ret } => {
                params.iter().any(TypeInfo::has_generics) || ret.has_generics()
            }
            TypeInfo::Primitive(_) | TypeInfo::Named(_) => false,
        }
    }

    /// Substitute type parameters using the given mapping. Unbound
    /// parameters are left in place.
    #[must_use = "substitution returns a new TypeInfo, original is unchanged"]
    pub fn substitute(&self, substitutions: &FxHashMap<String, TypeInfo>) -> TypeInfo {
        match self {
            TypeInfo::Generic(name) => substitutions
                .get(name)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeInfo::GenericInstance(name, args) => TypeInfo::GenericInstance(
                name.clone(),
                args.iter().map(|a| a.substitute(substitutions)).collect(),
            ),
            TypeInfo::Pointer(inner) => TypeInfo::Pointer(Box::new(inner.substitute(substitutions))),
            TypeInfo::Array { element, size } => TypeInfo::Array {
                element: Box::new(element.substitute(substitutions)),
                size: *size,
            },
            TypeInfo::Function { params, ret } => TypeInfo::Function {
                params: params.iter().map(|p| p.substitute(substitutions)).collect(),
                ret: Box::new(ret.substitute(substitutions)),
            },
            TypeInfo::Primitive(_) | TypeInfo::Named(_) => self.clone(),
        }
    }

    /// Structural compatibility check with reference aliasing. Generic
    /// parameters unify with anything (binding is handled separately by
    /// [`TypeInfo::bind_generics`]).
    #[must_use = "this is a pure check with no side effects"]
    pub fn unifies_with(&self, other: &TypeInfo) -> bool {
        let a = self.deref_alias();
        let b = other.deref_alias();
        match (a, b) {
            (TypeInfo::Generic(_), _) | (_, TypeInfo::Generic(_)) => true,
            (TypeInfo::Primitive(x), TypeInfo::Primitive(y)) => x == y,
            (TypeInfo::Named(x), TypeInfo::Named(y)) => x == y,
            (TypeInfo::GenericInstance(x, xs), TypeInfo::GenericInstance(y, ys)) => {
                x == y && xs.len() == ys.len() && xs.iter().zip(ys).all(|(l, r)| l.unifies_with(r))
            }
            // A bare name and its instance unify when they refer to the same
            // nominal (inference fills the arguments elsewhere).
            (TypeInfo::Named(x), TypeInfo::GenericInstance(y, _))
            | (TypeInfo::GenericInstance(x, _), TypeInfo::Named(y)) => x == y,
            (
                TypeInfo::Array {
                    element: ex,
                    size: sx,
                },
                TypeInfo::Array {
                    element: ey,
                    size: sy,
                },
            ) => ex.unifies_with(ey) && (sx.is_none() || sy.is_none() || sx == sy),
            (
                TypeInfo::Function {
                    params: px,
                    ret: rx,
                },
                TypeInfo::Function {
                    params: py,
                    ret: ry,
                },
            ) => {
                px.len() == py.len()
                    && px.iter().zip(py).all(|(l, r)| l.unifies_with(r))
                    && rx.unifies_with(ry)
            }
            _ => false,
        }
    }

    /// Walks `self` (a declared type possibly containing generic
    /// parameters) against `concrete`, binding every parameter it meets.
    /// Returns the conflicting `(param, first, second)` triple when one
    /// parameter would bind to two different types.
    pub fn bind_generics(
        &self,
        concrete: &TypeInfo,
        bindings: &mut FxHashMap<String, TypeInfo>,
    ) -> Result<(), (String, TypeInfo, TypeInfo)> {
        let declared = self;
        let concrete = concrete.deref_alias();
        match (declared, concrete) {
            (TypeInfo::Generic(name), _) => {
                if let Some(existing) = bindings.get(name) {
                    if existing != concrete {
                        return Err((name.clone(), existing.clone(), concrete.clone()));
                    }
                } else {
                    bindings.insert(name.clone(), concrete.clone());
                }
                Ok(())
            }
            (TypeInfo::GenericInstance(_, xs), TypeInfo::GenericInstance(_, ys))
                if xs.len() == ys.len() =>
            {
                for (x, y) in xs.iter().zip(ys) {
                    x.bind_generics(y, bindings)?;
                }
                Ok(())
            }
            (TypeInfo::Pointer(x), _) => x.bind_generics(concrete, bindings),
            (TypeInfo::Array { element: x, .. }, TypeInfo::Array { element: y, .. }) => {
                x.bind_generics(y, bindings)
            }
            (
                TypeInfo::Function {
                    params: px,
                    ret: rx,
                },
                TypeInfo::Function {
                    params: py,
                    ret: ry,
                },
            ) if px.len() == py.len() => {
                for (x, y) in px.iter().zip(py) {
                    x.bind_generics(y, bindings)?;
                }
                rx.bind_generics(ry, bindings)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_round_trip() {
        for p in Primitive::ALL {
            assert_eq!(p.as_str().parse::<Primitive>().as_ref(), Ok(p));
        }
    }

    #[test]
    fn display_generic_instance() {
        let ty = TypeInfo::GenericInstance(
            "Vec".to_string(),
            vec![TypeInfo::GenericInstance(
                "Pair".to_string(),
                vec![TypeInfo::i32(), TypeInfo::Primitive(Primitive::F64)],
            )],
        );
        assert_eq!(ty.to_string(), "Vec<Pair<i32, f64>>");
    }

    #[test]
    fn substitute_replaces_generics() {
        let mut subs = FxHashMap::default();
        subs.insert("T".to_string(), TypeInfo::i32());
        let ty = TypeInfo::GenericInstance(
            "Vec".to_string(),
            vec![TypeInfo::Generic("T".to_string())],
        );
        let result = ty.substitute(&subs);
        assert_eq!(result.to_string(), "Vec<i32>");
        assert!(!result.has_generics());
    }

    #[test]
    fn bind_generics_detects_conflict() {
        let declared = TypeInfo::Generic("T".to_string());
        let mut bindings = FxHashMap::default();
        declared.bind_generics(&TypeInfo::i32(), &mut bindings).unwrap();
        let err = declared
            .bind_generics(&TypeInfo::Primitive(Primitive::F64), &mut bindings)
            .unwrap_err();
        assert_eq!(err.0, "T");
        assert_eq!(err.1, TypeInfo::i32());
        assert_eq!(err.2, TypeInfo::Primitive(Primitive::F64));
    }

    #[test]
    fn pointer_aliases_inner_type() {
        let ptr = TypeInfo::Pointer(Box::new(TypeInfo::i32()));
        assert!(ptr.unifies_with(&TypeInfo::i32()));
        assert!(TypeInfo::i32().unifies_with(&ptr));
    }

    #[test]
    fn array_sizes_must_match_when_both_known() {
        let a = TypeInfo::Array {
            element: Box::new(TypeInfo::i32()),
            size: Some(3),
        };
        let b = TypeInfo::Array {
            element: Box::new(TypeInfo::i32()),
            size: Some(4),
        };
        let open = TypeInfo::Array {
            element: Box::new(TypeInfo::i32()),
            size: None,
        };
        assert!(!a.unifies_with(&b));
        assert!(a.unifies_with(&open));
    }
}
