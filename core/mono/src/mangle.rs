//! Name mangling for monomorphized instances.
//!
//! Mangled names are the unique exported symbols both backends emit. The
//! scheme is deterministic and re-derivable from the AST:
//!
//! - primitives keep their keyword spelling (`i32`, `f64`, ...)
//! - named types keep their name
//! - generic instances flatten recursively: `Vec<Pair<i32, f64>>` becomes
//!   `Vec_Pair_i32_f64`
//! - function instance: `name_T1_T2`
//! - struct instance: `Name_T1_T2`
//! - method instance: `Name_T1_T2_method`

use paw_type_checker::type_info::TypeInfo;

/// Mangles a single type into its symbol fragment.
#[must_use]
pub fn mangle_type(ty: &TypeInfo) -> String {
    match ty {
        TypeInfo::Primitive(p) => p.as_str().to_string(),
        TypeInfo::Named(name) | TypeInfo::Generic(name) => name.clone(),
        TypeInfo::GenericInstance(name, args) => {
            let mut out = name.clone();
            for arg in args {
                out.push('_');
                out.push_str(&mangle_type(arg));
            }
            out
        }
        TypeInfo::Pointer(inner) => format!("ptr_{}", mangle_type(inner)),
        TypeInfo::Array { element, .. } => format!("arr_{}", mangle_type(element)),
        TypeInfo::Function { params, ret } => {
            let mut out = "fn".to_string();
            for param in params {
                out.push('_');
                out.push_str(&mangle_type(param));
            }
            out.push_str("_ret_");
            out.push_str(&mangle_type(ret));
            out
        }
    }
}

/// Mangles a base name with a list of concrete type arguments.
#[must_use]
pub fn mangle(base: &str, type_args: &[TypeInfo]) -> String {
    let mut out = base.to_string();
    for arg in type_args {
        out.push('_');
        out.push_str(&mangle_type(arg));
    }
    out
}

/// Mangles a method instance: `Name_T1_T2_method`.
#[must_use]
pub fn mangle_method(type_name: &str, type_args: &[TypeInfo], method: &str) -> String {
    let mut out = mangle(type_name, type_args);
    out.push('_');
    out.push_str(method);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use paw_type_checker::type_info::Primitive;

    #[test]
    fn primitives_keep_keyword_spelling() {
        assert_eq!(mangle_type(&TypeInfo::i32()), "i32");
        assert_eq!(mangle_type(&TypeInfo::Primitive(Primitive::F64)), "f64");
    }

    #[test]
    fn nested_instances_flatten() {
        let ty = TypeInfo::GenericInstance(
            "Vec".to_string(),
            vec![TypeInfo::GenericInstance(
                "Pair".to_string(),
                vec![TypeInfo::i32(), TypeInfo::Primitive(Primitive::F64)],
            )],
        );
        assert_eq!(mangle_type(&ty), "Vec_Pair_i32_f64");
    }

    #[test]
    fn function_and_method_instances() {
        assert_eq!(mangle("add", &[TypeInfo::i32()]), "add_i32");
        assert_eq!(mangle("Box", &[TypeInfo::i32()]), "Box_i32");
        assert_eq!(mangle_method("Box", &[TypeInfo::i32()], "get"), "Box_i32_get");
    }

    #[test]
    fn mangle_is_deterministic() {
        let args = vec![TypeInfo::i32(), TypeInfo::string()];
        assert_eq!(mangle("f", &args), mangle("f", &args));
        assert_eq!(mangle("f", &[]), "f");
    }
}
