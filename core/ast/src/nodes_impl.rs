use std::rc::Rc;

use crate::nodes::{
    Declaration, FunctionDecl, ImportDecl, ModuleAst, TypeDecl, TypeDeclKind, Visibility,
};

impl FunctionDecl {
    #[must_use]
    pub fn name(&self) -> String {
        self.name.name.clone()
    }

    /// True when the first parameter is a `self` receiver.
    #[must_use = "this is a pure check with no side effects"]
    pub fn has_self(&self) -> bool {
        self.params.first().is_some_and(|p| p.is_self)
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

impl TypeDecl {
    #[must_use]
    pub fn name(&self) -> String {
        self.name.name.clone()
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Methods declared inside a struct or enum body; empty for traits and
    /// aliases.
    #[must_use]
    pub fn methods(&self) -> &[Rc<FunctionDecl>] {
        match &self.kind {
            TypeDeclKind::Struct { methods, .. } | TypeDeclKind::Enum { methods, .. } => methods,
            TypeDeclKind::Trait { .. } | TypeDeclKind::Alias(_) => &[],
        }
    }
}

impl ModuleAst {
    #[must_use]
    pub fn functions(&self) -> Vec<Rc<FunctionDecl>> {
        self.declarations
            .iter()
            .filter_map(|decl| match decl {
                Declaration::Function(func) => Some(func.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn type_declarations(&self) -> Vec<Rc<TypeDecl>> {
        self.declarations
            .iter()
            .filter_map(|decl| match decl {
                Declaration::Type(decl) => Some(decl.clone()),
                _ => None,
            })
            .collect()
    }

    /// Names of all `pub` top-level items, in declaration order.
    #[must_use]
    pub fn exported_names(&self) -> Vec<String> {
        self.declarations
            .iter()
            .filter_map(|decl| match decl {
                Declaration::Function(func) if func.is_public() => Some(func.name()),
                Declaration::Type(ty) if ty.is_public() => Some(ty.name()),
                _ => None,
            })
            .collect()
    }

    /// All top-level item names, regardless of visibility.
    #[must_use]
    pub fn declared_names(&self) -> Vec<String> {
        self.declarations
            .iter()
            .filter_map(|decl| match decl {
                Declaration::Function(func) => Some(func.name()),
                Declaration::Type(ty) => Some(ty.name()),
                _ => None,
            })
            .collect()
    }
}

impl ImportDecl {
    /// Dotted form of the import path, e.g. `math.vec`.
    #[must_use]
    pub fn dotted_path(&self) -> String {
        self.segments.join(".")
    }
}
