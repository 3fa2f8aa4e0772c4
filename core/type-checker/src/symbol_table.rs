//! Symbol Table
//!
//! Global symbol information collected before bodies are checked: function
//! signatures, struct layouts, enum variants and methods. Field and variant
//! order is preserved — both backends depend on declaration order for
//! layout and tag values.
//!
//! The `enum_variants` map is the short-name resolution table: a bare
//! variant constructor call (`Ok(100)`) resolves through it to its owning
//! enum and tag index.

use rustc_hash::FxHashMap;

use crate::type_info::TypeInfo;
use paw_ast::nodes::Visibility;

/// Signature of a free function, method or associated function.
#[derive(Debug, Clone)]
pub struct FuncInfo {
    pub name: String,
    pub type_params: Vec<String>,
    pub param_names: Vec<String>,
    pub param_types: Vec<TypeInfo>,
    pub param_mutable: Vec<bool>,
    pub return_type: TypeInfo,
    pub visibility: Visibility,
}

impl FuncInfo {
    #[must_use = "this is a pure check with no side effects"]
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}

/// A struct field, in declaration order.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub ty: TypeInfo,
    pub visibility: Visibility,
}

#[derive(Debug, Clone)]
pub struct StructInfo {
    pub name: String,
    pub type_params: Vec<String>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
}

impl StructInfo {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.signature.name == name)
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}

/// An enum variant with its payload types; `tag` is the declaration index,
/// which both backends use as the discriminant value.
#[derive(Debug, Clone)]
pub struct VariantInfo {
    pub name: String,
    pub payloads: Vec<TypeInfo>,
    pub tag: usize,
}

#[derive(Debug, Clone)]
pub struct EnumInfo {
    pub name: String,
    pub type_params: Vec<String>,
    pub variants: Vec<VariantInfo>,
    pub methods: Vec<MethodInfo>,
}

impl EnumInfo {
    #[must_use]
    pub fn variant(&self, name: &str) -> Option<&VariantInfo> {
        self.variants.iter().find(|v| v.name == name)
    }

    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.signature.name == name)
    }
}

/// A method attached to a struct or enum. Instance methods take `self`;
/// associated functions (constructors) do not.
#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub signature: FuncInfo,
    pub has_self: bool,
    pub self_mutable: bool,
}

impl MethodInfo {
    #[must_use = "this is a pure check with no side effects"]
    pub fn is_instance_method(&self) -> bool {
        self.has_self
    }
}

/// Global symbols of the merged program.
#[derive(Debug, Default)]
pub struct SymbolTable {
    functions: FxHashMap<String, FuncInfo>,
    structs: FxHashMap<String, StructInfo>,
    enums: FxHashMap<String, EnumInfo>,
    aliases: FxHashMap<String, TypeInfo>,
    /// Short variant name -> owning enum name. Variant names are unique
    /// across enums, which is what lets `Ok(1)` resolve without a qualifier.
    enum_variants: FxHashMap<String, String>,
}

impl SymbolTable {
    pub fn insert_function(&mut self, info: FuncInfo) {
        self.functions.insert(info.name.clone(), info);
    }

    pub fn insert_struct(&mut self, info: StructInfo) {
        self.structs.insert(info.name.clone(), info);
    }

    pub fn insert_enum(&mut self, info: EnumInfo) {
        for variant in &info.variants {
            self.enum_variants
                .insert(variant.name.clone(), info.name.clone());
        }
        self.enums.insert(info.name.clone(), info);
    }

    pub fn insert_alias(&mut self, name: &str, target: TypeInfo) {
        self.aliases.insert(name.to_string(), target);
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn function(&self, name: &str) -> Option<&FuncInfo> {
        self.functions.get(name)
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn struct_info(&self, name: &str) -> Option<&StructInfo> {
        self.structs.get(name)
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn enum_info(&self, name: &str) -> Option<&EnumInfo> {
        self.enums.get(name)
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn alias(&self, name: &str) -> Option<&TypeInfo> {
        self.aliases.get(name)
    }

    /// Resolves a bare variant constructor name to its owning enum.
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn enum_of_variant(&self, variant: &str) -> Option<&EnumInfo> {
        self.enum_variants
            .get(variant)
            .and_then(|enum_name| self.enums.get(enum_name))
    }

    /// Resolves a nominal name through aliases to its final type. Struct
    /// and enum names resolve to themselves.
    #[must_use]
    pub fn resolve_alias(&self, ty: &TypeInfo) -> TypeInfo {
        if let TypeInfo::Named(name) = ty {
            if let Some(target) = self.aliases.get(name) {
                return self.resolve_alias(target);
            }
        }
        ty.clone()
    }

    /// Like [`SymbolTable::resolve_alias`], but recursing through compound
    /// types; code generators use this so no alias name survives into an
    /// emitted type.
    #[must_use]
    pub fn resolve_alias_deep(&self, ty: &TypeInfo) -> TypeInfo {
        match self.resolve_alias(ty) {
            TypeInfo::GenericInstance(name, args) => TypeInfo::GenericInstance(
                name,
                args.iter().map(|a| self.resolve_alias_deep(a)).collect(),
            ),
            TypeInfo::Pointer(inner) => {
                TypeInfo::Pointer(Box::new(self.resolve_alias_deep(&inner)))
            }
            TypeInfo::Array { element, size } => TypeInfo::Array {
                element: Box::new(self.resolve_alias_deep(&element)),
                size,
            },
            TypeInfo::Function { params, ret } => TypeInfo::Function {
                params: params.iter().map(|p| self.resolve_alias_deep(p)).collect(),
                ret: Box::new(self.resolve_alias_deep(&ret)),
            },
            other => other,
        }
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_type_name(&self, name: &str) -> bool {
        self.structs.contains_key(name)
            || self.enums.contains_key(name)
            || self.aliases.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_info::Primitive;

    fn sample_enum() -> EnumInfo {
        EnumInfo {
            name: "Result".to_string(),
            type_params: vec![],
            variants: vec![
                VariantInfo {
                    name: "Ok".to_string(),
                    payloads: vec![TypeInfo::i32()],
                    tag: 0,
                },
                VariantInfo {
                    name: "Err".to_string(),
                    payloads: vec![TypeInfo::i32()],
                    tag: 1,
                },
            ],
            methods: vec![],
        }
    }

    #[test]
    fn variant_lookup_by_short_name() {
        let mut table = SymbolTable::default();
        table.insert_enum(sample_enum());
        let owner = table.enum_of_variant("Ok").expect("Ok resolves");
        assert_eq!(owner.name, "Result");
        assert!(table.enum_of_variant("Nope").is_none());
    }

    #[test]
    fn variant_tags_follow_declaration_order() {
        let info = sample_enum();
        assert_eq!(info.variant("Ok").unwrap().tag, 0);
        assert_eq!(info.variant("Err").unwrap().tag, 1);
    }

    #[test]
    fn alias_resolution_is_transitive() {
        let mut table = SymbolTable::default();
        table.insert_alias("Meters", TypeInfo::Named("Distance".to_string()));
        table.insert_alias("Distance", TypeInfo::Primitive(Primitive::F64));
        let resolved = table.resolve_alias(&TypeInfo::Named("Meters".to_string()));
        assert_eq!(resolved, TypeInfo::Primitive(Primitive::F64));
    }
}
