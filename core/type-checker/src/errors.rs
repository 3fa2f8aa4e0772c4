//! Error types for the type checker.
//!
//! All semantic errors carry a source [`Location`]; Display strings follow
//! the `line:column: message` convention the driver expects.

use paw_ast::nodes::{BinaryOp, Location, UnaryOp};
use thiserror::Error;

use crate::type_info::TypeInfo;

/// Represents a type checking error with source location.
#[derive(Debug, Clone, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum TypeCheckError {
    #[error("{location}: type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        expected: TypeInfo,
        found: TypeInfo,
        location: Location,
    },

    #[error("{location}: `{name}` expects {expected} arguments, but {found} provided")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        location: Location,
    },

    #[error(
        "{location}: conflicting types for type parameter `{param}`: inferred `{first}` and `{second}`"
    )]
    GenericConflict {
        param: String,
        first: TypeInfo,
        second: TypeInfo,
        location: Location,
    },

    #[error("{location}: unknown identifier `{name}`")]
    UnknownIdentifier { name: String, location: Location },

    #[error("{location}: unknown type `{name}`")]
    UnknownType { name: String, location: Location },

    #[error("{location}: call to undefined function `{name}`")]
    UnknownFunction { name: String, location: Location },

    #[error("{location}: field `{field}` not found on type `{type_name}`")]
    UnknownField {
        type_name: String,
        field: String,
        location: Location,
    },

    #[error("{location}: missing field `{field}` in initializer of `{type_name}`")]
    MissingField {
        type_name: String,
        field: String,
        location: Location,
    },

    #[error("{location}: method `{method}` not found on type `{type_name}`")]
    MethodNotFound {
        type_name: String,
        method: String,
        location: Location,
    },

    #[error("{location}: variant `{variant}` not found on enum `{enum_name}`")]
    VariantNotFound {
        enum_name: String,
        variant: String,
        location: Location,
    },

    #[error("{location}: cannot assign to immutable binding `{name}`")]
    ImmutableAssignment { name: String, location: Location },

    #[error(
        "{location}: instance method `{type_name}::{method}` requires a receiver, use `instance.{method}()` instead"
    )]
    InstanceMethodCalledAsAssociated {
        type_name: String,
        method: String,
        location: Location,
    },

    #[error("{location}: operator `{operator}` cannot be applied to `{left}` and `{right}`")]
    InvalidBinaryOperands {
        operator: BinaryOp,
        left: TypeInfo,
        right: TypeInfo,
        location: Location,
    },

    #[error("{location}: unary operator `{operator}` cannot be applied to `{operand}`")]
    InvalidUnaryOperand {
        operator: UnaryOp,
        operand: TypeInfo,
        location: Location,
    },

    #[error(
        "{location}: integer literal `{literal}` does not fit `i32`; add a type suffix or annotation"
    )]
    IntLiteralOutOfRange { literal: String, location: Location },

    #[error("{location}: `?` requires a `Result`-like enum, found `{found}`")]
    InvalidTryOperand { found: TypeInfo, location: Location },

    /// Traits, impl blocks and async functions parse but are not part of
    /// the checked language; they are rejected here rather than silently
    /// ignored.
    #[error("{location}: `{kind}` declarations are not supported ({name})")]
    UnsupportedDeclaration {
        kind: &'static str,
        name: String,
        location: Location,
    },
}

impl TypeCheckError {
    /// Returns the source location associated with this error.
    #[must_use]
    pub fn location(&self) -> &Location {
        match self {
            TypeCheckError::TypeMismatch { location, .. }
            | TypeCheckError::ArityMismatch { location, .. }
            | TypeCheckError::GenericConflict { location, .. }
            | TypeCheckError::UnknownIdentifier { location, .. }
            | TypeCheckError::UnknownType { location, .. }
            | TypeCheckError::UnknownFunction { location, .. }
            | TypeCheckError::UnknownField { location, .. }
            | TypeCheckError::MissingField { location, .. }
            | TypeCheckError::MethodNotFound { location, .. }
            | TypeCheckError::VariantNotFound { location, .. }
            | TypeCheckError::ImmutableAssignment { location, .. }
            | TypeCheckError::InstanceMethodCalledAsAssociated { location, .. }
            | TypeCheckError::InvalidBinaryOperands { location, .. }
            | TypeCheckError::InvalidUnaryOperand { location, .. }
            | TypeCheckError::IntLiteralOutOfRange { location, .. }
            | TypeCheckError::InvalidTryOperand { location, .. }
            | TypeCheckError::UnsupportedDeclaration { location, .. } => location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_location() -> Location {
        Location::new(1, 5, "test.paw")
    }

    #[test]
    fn display_type_mismatch() {
        let err = TypeCheckError::TypeMismatch {
            expected: TypeInfo::i32(),
            found: TypeInfo::bool(),
            location: test_location(),
        };
        assert_eq!(
            err.to_string(),
            "test.paw:1:5: type mismatch: expected `i32`, found `bool`"
        );
    }

    #[test]
    fn display_arity_mismatch() {
        let err = TypeCheckError::ArityMismatch {
            name: "add".to_string(),
            expected: 2,
            found: 3,
            location: test_location(),
        };
        assert_eq!(
            err.to_string(),
            "test.paw:1:5: `add` expects 2 arguments, but 3 provided"
        );
    }

    #[test]
    fn display_generic_conflict() {
        let err = TypeCheckError::GenericConflict {
            param: "T".to_string(),
            first: TypeInfo::i32(),
            second: TypeInfo::string(),
            location: test_location(),
        };
        assert_eq!(
            err.to_string(),
            "test.paw:1:5: conflicting types for type parameter `T`: inferred `i32` and `string`"
        );
    }

    #[test]
    fn display_immutable_assignment() {
        let err = TypeCheckError::ImmutableAssignment {
            name: "x".to_string(),
            location: test_location(),
        };
        assert_eq!(
            err.to_string(),
            "test.paw:1:5: cannot assign to immutable binding `x`"
        );
    }

    #[test]
    fn display_unsupported_declaration() {
        let err = TypeCheckError::UnsupportedDeclaration {
            kind: "trait",
            name: "Printable".to_string(),
            location: test_location(),
        };
        assert_eq!(
            err.to_string(),
            "test.paw:1:5: `trait` declarations are not supported (Printable)"
        );
    }

    #[test]
    fn display_unknown_field() {
        let err = TypeCheckError::UnknownField {
            type_name: "Point".to_string(),
            field: "z".to_string(),
            location: test_location(),
        };
        assert_eq!(
            err.to_string(),
            "test.paw:1:5: field `z` not found on type `Point`"
        );
    }

    #[test]
    fn error_location_accessor() {
        let loc = test_location();
        let err = TypeCheckError::UnknownType {
            name: "Foo".to_string(),
            location: loc.clone(),
        };
        assert_eq!(err.location(), &loc);
    }
}
