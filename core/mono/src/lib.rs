#![warn(clippy::pedantic)]
//! Monomorphization Collector Crate
//!
//! Walks the typed program and records every concrete instantiation of each
//! generic function, struct and method into a [`MonoDatabase`]. The walk is
//! a fixed point: the body of every newly discovered instance is visited in
//! turn (with its type bindings applied) until no new entries appear.
//! Termination is guaranteed because the set of reachable
//! `(name, type_args)` pairs is finite for a given program.
//!
//! Entries are keyed by their mangled name (see [`mangle`]) and preserved
//! in insertion order, which both backends rely on for deterministic
//! output. The database is written only here and read-only during code
//! generation.

pub mod collector;
pub mod mangle;

use paw_type_checker::type_info::TypeInfo;
use paw_type_checker::typed_context::TypedContext;
use rustc_hash::FxHashSet;

use crate::collector::Collector;

/// A concrete instantiation of a generic function.
#[derive(Debug, Clone)]
pub struct FunctionInstance {
    pub name: String,
    pub type_args: Vec<TypeInfo>,
    pub mangled: String,
}

/// A concrete instantiation of a generic struct or enum.
#[derive(Debug, Clone)]
pub struct StructInstance {
    pub name: String,
    pub type_args: Vec<TypeInfo>,
    pub mangled: String,
}

/// A concrete instantiation of a method on a generic type.
#[derive(Debug, Clone)]
pub struct MethodInstance {
    pub type_name: String,
    pub method: String,
    pub type_args: Vec<TypeInfo>,
    pub mangled: String,
}

/// The three instance sets, deduplicated by mangled name and kept in
/// insertion order. Immutable once the collector finishes.
#[derive(Debug, Default)]
pub struct MonoDatabase {
    function_instances: Vec<FunctionInstance>,
    struct_instances: Vec<StructInstance>,
    method_instances: Vec<MethodInstance>,
    seen: FxHashSet<String>,
}

impl MonoDatabase {
    /// Records a function instance. Returns true when the entry is new.
    pub fn insert_function(&mut self, name: &str, type_args: Vec<TypeInfo>) -> bool {
        let mangled = mangle::mangle(name, &type_args);
        if !self.seen.insert(format!("fn:{mangled}")) {
            return false;
        }
        self.function_instances.push(FunctionInstance {
            name: name.to_string(),
            type_args,
            mangled,
        });
        true
    }

    /// Records a struct (or enum) instance. Returns true when new.
    pub fn insert_struct(&mut self, name: &str, type_args: Vec<TypeInfo>) -> bool {
        let mangled = mangle::mangle(name, &type_args);
        if !self.seen.insert(format!("ty:{mangled}")) {
            return false;
        }
        self.struct_instances.push(StructInstance {
            name: name.to_string(),
            type_args,
            mangled,
        });
        true
    }

    /// Records a method instance. Returns true when new.
    pub fn insert_method(&mut self, type_name: &str, method: &str, type_args: Vec<TypeInfo>) -> bool {
        let mangled = mangle::mangle_method(type_name, &type_args, method);
        if !self.seen.insert(format!("m:{mangled}")) {
            return false;
        }
        self.method_instances.push(MethodInstance {
            type_name: type_name.to_string(),
            method: method.to_string(),
            type_args,
            mangled,
        });
        true
    }

    #[must_use]
    pub fn function_instances(&self) -> &[FunctionInstance] {
        &self.function_instances
    }

    #[must_use]
    pub fn struct_instances(&self) -> &[StructInstance] {
        &self.struct_instances
    }

    #[must_use]
    pub fn method_instances(&self) -> &[MethodInstance] {
        &self.method_instances
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn has_symbol(&self, mangled: &str) -> bool {
        self.seen.contains(&format!("fn:{mangled}"))
            || self.seen.contains(&format!("ty:{mangled}"))
            || self.seen.contains(&format!("m:{mangled}"))
    }
}

/// Runs the collector over a type-checked program.
#[must_use = "the database is required by both code generators"]
pub fn collect_instances(ctx: &TypedContext) -> MonoDatabase {
    let mut db = MonoDatabase::default();
    Collector::new(ctx).run(&mut db);
    db
}

/// One function body a backend must emit: a free function, a method of a
/// non-generic type, or a monomorphized instance of either. `owner` is the
/// mangled receiver type name for methods; `bindings` are the generic
/// substitutions active inside the body.
pub struct FunctionWork {
    pub decl: std::rc::Rc<paw_ast::nodes::FunctionDecl>,
    pub owner: Option<String>,
    pub mangled: String,
    pub bindings: rustc_hash::FxHashMap<String, TypeInfo>,
}

/// The full, ordered list of function bodies to emit: free functions and
/// methods of non-generic types first (in declaration order), then
/// monomorphized function instances, then method instances. Both backends
/// derive their output from this single list so their symbol sets agree.
#[must_use]
pub fn function_worklist(ctx: &TypedContext, db: &MonoDatabase) -> Vec<FunctionWork> {
    use paw_ast::nodes::Declaration;
    use rustc_hash::FxHashMap;

    let mut work = Vec::new();
    let type_decls: FxHashMap<String, std::rc::Rc<paw_ast::nodes::TypeDecl>> = ctx
        .type_declarations()
        .into_iter()
        .map(|d| (d.name(), d))
        .collect();

    for decl in ctx.declarations() {
        match decl {
            Declaration::Function(func) if !func.is_generic() => {
                work.push(FunctionWork {
                    decl: func.clone(),
                    owner: None,
                    mangled: func.name(),
                    bindings: FxHashMap::default(),
                });
            }
            Declaration::Type(ty) if !ty.is_generic() => {
                for method in ty.methods() {
                    work.push(FunctionWork {
                        decl: method.clone(),
                        owner: Some(ty.name()),
                        mangled: format!("{}_{}", ty.name(), method.name()),
                        bindings: FxHashMap::default(),
                    });
                }
            }
            _ => {}
        }
    }
    for instance in db.function_instances() {
        let Some(func) = ctx.declarations().iter().find_map(|d| match d {
            Declaration::Function(f) if f.name() == instance.name => Some(f.clone()),
            _ => None,
        }) else {
            continue;
        };
        let bindings: rustc_hash::FxHashMap<String, TypeInfo> = func
            .type_params
            .iter()
            .map(|p| p.name.clone())
            .zip(instance.type_args.iter().cloned())
            .collect();
        work.push(FunctionWork {
            decl: func,
            owner: None,
            mangled: instance.mangled.clone(),
            bindings,
        });
    }
    for instance in db.method_instances() {
        let Some(type_decl) = type_decls.get(&instance.type_name) else {
            continue;
        };
        let Some(method) = type_decl
            .methods()
            .iter()
            .find(|m| m.name() == instance.method)
            .cloned()
        else {
            continue;
        };
        let bindings: rustc_hash::FxHashMap<String, TypeInfo> = type_decl
            .type_params
            .iter()
            .map(|p| p.name.clone())
            .zip(instance.type_args.iter().cloned())
            .collect();
        work.push(FunctionWork {
            decl: method,
            owner: Some(mangle::mangle(&instance.type_name, &instance.type_args)),
            mangled: instance.mangled.clone(),
            bindings,
        });
    }
    work
}

/// Infers the ordered type arguments of a generic call site from the
/// declared signature, the concrete argument types and (optionally) the
/// concrete result type. Returns `None` when any parameter stays unbound
/// or non-concrete. Shared by the collector and both code generators so
/// they always agree on the instance a call site refers to.
#[must_use]
pub fn infer_call_type_args(
    info: &paw_type_checker::symbol_table::FuncInfo,
    arg_types: &[TypeInfo],
    result_type: Option<&TypeInfo>,
) -> Option<Vec<TypeInfo>> {
    use rustc_hash::FxHashMap;

    let mut bindings: FxHashMap<String, TypeInfo> = FxHashMap::default();
    for (param_ty, arg_ty) in info.param_types.iter().zip(arg_types) {
        let _ = param_ty.bind_generics(arg_ty, &mut bindings);
    }
    if let Some(result_ty) = result_type {
        let _ = info.return_type.bind_generics(result_ty, &mut bindings);
    }
    let type_args: Option<Vec<TypeInfo>> = info
        .type_params
        .iter()
        .map(|p| bindings.get(p).cloned())
        .collect();
    let type_args = type_args?;
    if type_args.iter().any(TypeInfo::has_generics) {
        return None;
    }
    Some(type_args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_instances_are_deduplicated() {
        let mut db = MonoDatabase::default();
        assert!(db.insert_function("add", vec![TypeInfo::i32()]));
        assert!(!db.insert_function("add", vec![TypeInfo::i32()]));
        assert_eq!(db.function_instances().len(), 1);
        assert_eq!(db.function_instances()[0].mangled, "add_i32");
    }

    #[test]
    fn kinds_do_not_collide() {
        let mut db = MonoDatabase::default();
        assert!(db.insert_function("Box_i32", vec![]));
        assert!(db.insert_struct("Box", vec![TypeInfo::i32()]));
        assert!(db.has_symbol("Box_i32"));
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut db = MonoDatabase::default();
        db.insert_struct("Box", vec![TypeInfo::i32()]);
        db.insert_struct("Box", vec![TypeInfo::string()]);
        let names: Vec<_> = db.struct_instances().iter().map(|s| s.mangled.as_str()).collect();
        assert_eq!(names, vec!["Box_i32", "Box_string"]);
    }
}
