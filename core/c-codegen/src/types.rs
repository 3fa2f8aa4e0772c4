//! PawLang-to-C type mapping.
//!
//! Primitive widths map to `<stdint.h>` fixed types; `i128`/`u128` fall
//! back to the compiler-extension `__int128_t` family, emitted behind a
//! guard in the header section. Nominal types map to their (mangled)
//! typedef names.

use paw_mono::mangle::mangle_type;
use paw_type_checker::type_info::{Primitive, TypeInfo};

/// The C spelling of a primitive.
#[must_use]
pub fn c_primitive(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::I8 => "int8_t",
        Primitive::I16 => "int16_t",
        Primitive::I32 => "int32_t",
        Primitive::I64 => "int64_t",
        Primitive::I128 => "__int128_t",
        Primitive::U8 => "uint8_t",
        Primitive::U16 => "uint16_t",
        Primitive::U32 => "uint32_t",
        Primitive::U64 => "uint64_t",
        Primitive::U128 => "__uint128_t",
        Primitive::F32 => "float",
        Primitive::F64 => "double",
        Primitive::Bool => "bool",
        Primitive::Char => "char",
        Primitive::Str => "char*",
        Primitive::Void => "void",
    }
}

/// The C type expression for a value of `ty` (no declarator name).
#[must_use]
pub fn c_type(ty: &TypeInfo) -> String {
    match ty {
        TypeInfo::Primitive(p) => c_primitive(*p).to_string(),
        TypeInfo::Named(name) => name.clone(),
        TypeInfo::GenericInstance(..) => mangle_type(ty),
        TypeInfo::Pointer(inner) => format!("{}*", c_type(inner)),
        // Arrays decay to element pointers outside declarators.
        TypeInfo::Array { element, .. } => format!("{}*", c_type(element)),
        TypeInfo::Function { .. } => "void*".to_string(),
        TypeInfo::Generic(name) => name.clone(),
    }
}

/// A C declarator: type plus name, handling array and function-pointer
/// spellings (`int32_t xs[4]`, `int32_t (*f)(int32_t)`).
#[must_use]
pub fn c_decl(ty: &TypeInfo, name: &str) -> String {
    match ty {
        TypeInfo::Array {
            element,
            size: Some(size),
        } => format!("{} {name}[{size}]", c_type(element)),
        TypeInfo::Array {
            element,
            size: None,
        } => format!("{}* {name}", c_type(element)),
        TypeInfo::Function { params, ret } => {
            let params = if params.is_empty() {
                "void".to_string()
            } else {
                params.iter().map(c_type).collect::<Vec<_>>().join(", ")
            };
            format!("{} (*{name})({params})", c_type(ret))
        }
        other => format!("{} {name}", c_type(other)),
    }
}

/// `printf`/`sprintf` conversion for a primitive, used by string
/// interpolation. Booleans are handled separately (no standard spec).
#[must_use]
pub fn c_format_spec(ty: &TypeInfo) -> Option<&'static str> {
    match ty {
        TypeInfo::Primitive(p) => Some(match p {
            Primitive::I8 | Primitive::I16 | Primitive::I32 => "%d",
            Primitive::I64 | Primitive::I128 => "%lld",
            Primitive::U8 | Primitive::U16 | Primitive::U32 => "%u",
            Primitive::U64 | Primitive::U128 => "%llu",
            Primitive::F32 | Primitive::F64 => "%g",
            Primitive::Char => "%c",
            Primitive::Str => "%s",
            Primitive::Bool | Primitive::Void => return None,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_mapping() {
        assert_eq!(c_type(&TypeInfo::i32()), "int32_t");
        assert_eq!(c_type(&TypeInfo::string()), "char*");
        assert_eq!(c_type(&TypeInfo::Primitive(Primitive::I128)), "__int128_t");
        assert_eq!(c_type(&TypeInfo::Primitive(Primitive::Bool)), "bool");
    }

    #[test]
    fn instance_types_use_mangled_names() {
        let ty = TypeInfo::GenericInstance("Vec".to_string(), vec![TypeInfo::i32()]);
        assert_eq!(c_type(&ty), "Vec_i32");
    }

    #[test]
    fn array_declarator() {
        let ty = TypeInfo::Array {
            element: Box::new(TypeInfo::i32()),
            size: Some(4),
        };
        assert_eq!(c_decl(&ty, "xs"), "int32_t xs[4]");
    }

    #[test]
    fn function_pointer_declarator() {
        let ty = TypeInfo::Function {
            params: vec![TypeInfo::i32()],
            ret: Box::new(TypeInfo::i32()),
        };
        assert_eq!(c_decl(&ty, "f"), "int32_t (*f)(int32_t)");
    }
}
