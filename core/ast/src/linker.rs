//! Module linker: merges per-module ASTs into a single program.
//!
//! Each module's `pub` items form its export table. Imports are resolved
//! against those tables — brace lists expand to single items, `*` takes the
//! whole table — and every resolved name becomes visible in the consuming
//! module. The prelude (`std.prelude`), when loaded, is implicitly imported
//! by every other module.
//!
//! The output is one flat [`Program`]: all declarations of all modules in
//! dependency order, sharing the parser's arena. Name collisions anywhere in
//! the merged scope fail with `NameConflict`; private items of one module
//! cannot be imported by another (`UnresolvedImport`).

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::arena::Arena;
use crate::errors::LinkError;
use crate::loader::PRELUDE_PATH;
use crate::nodes::{Declaration, ImportItems, Location, ModuleAst};

/// The merged compilation unit every later phase consumes.
pub struct Program {
    /// Top-level declarations of all modules, leaves first.
    pub declarations: Vec<Declaration>,
    /// The modules the program was linked from, in input order.
    pub modules: Vec<Rc<ModuleAst>>,
    /// Arena owning every AST node.
    pub arena: Arena,
}

impl Program {
    /// Links a single already-parsed module without imports; used by tests
    /// and by single-file compilation.
    ///
    /// # Errors
    ///
    /// Fails with `NameConflict` on duplicate top-level names.
    pub fn from_single_module(module: Rc<ModuleAst>, arena: Arena) -> Result<Self, LinkError> {
        link(vec![module], arena)
    }
}

/// Merges modules (ordered leaves-first, as the loader returns them) into a
/// single program.
///
/// # Errors
///
/// `UnresolvedImport` when an import names a missing or private item;
/// `NameConflict` when two items with the same name become visible in one
/// scope.
pub fn link(modules: Vec<Rc<ModuleAst>>, arena: Arena) -> Result<Program, LinkError> {
    let mut exports: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();
    for module in &modules {
        exports.insert(
            module.path.clone(),
            module.exported_names().into_iter().collect(),
        );
    }
    let module_paths: FxHashSet<String> = modules.iter().map(|m| m.path.clone()).collect();

    for module in &modules {
        let mut visible: FxHashMap<String, Location> = FxHashMap::default();
        for decl in &module.declarations {
            let (name, location) = match decl {
                Declaration::Function(func) => (func.name(), func.location.clone()),
                Declaration::Type(ty) => (ty.name(), ty.location.clone()),
                _ => continue,
            };
            if let Some(_previous) = visible.insert(name.clone(), location.clone()) {
                return Err(LinkError::NameConflict { name, location });
            }
        }

        // Implicit prelude import.
        if module.path != PRELUDE_PATH {
            if let Some(prelude_exports) = exports.get(PRELUDE_PATH) {
                for name in prelude_exports {
                    if let Some(location) = visible.get(name) {
                        return Err(LinkError::NameConflict {
                            name: name.clone(),
                            location: location.clone(),
                        });
                    }
                    visible.insert(name.clone(), Location::default());
                }
            }
        }

        for import in &module.imports {
            resolve_import(import.dotted_path(), import, &module_paths, &exports, &mut visible)?;
        }
    }

    // The merged program is one flat namespace; a collision between two
    // modules' top-level items is an error even when neither imports the
    // other, because both backends emit unqualified symbols.
    let mut merged: FxHashMap<String, Location> = FxHashMap::default();
    let mut declarations = Vec::new();
    for module in &modules {
        for decl in &module.declarations {
            let (name, location) = match decl {
                Declaration::Function(func) => (func.name(), func.location.clone()),
                Declaration::Type(ty) => (ty.name(), ty.location.clone()),
                _ => {
                    declarations.push(decl.clone());
                    continue;
                }
            };
            if merged.insert(name.clone(), location.clone()).is_some() {
                return Err(LinkError::NameConflict { name, location });
            }
            declarations.push(decl.clone());
        }
    }

    Ok(Program {
        declarations,
        modules,
        arena,
    })
}

fn resolve_import(
    dotted: String,
    import: &Rc<crate::nodes::ImportDecl>,
    module_paths: &FxHashSet<String>,
    exports: &FxHashMap<String, FxHashSet<String>>,
    visible: &mut FxHashMap<String, Location>,
) -> Result<(), LinkError> {
    let location = import.location.clone();
    let mut bring = |module: &str, item: &str| -> Result<(), LinkError> {
        let exported = exports
            .get(module)
            .is_some_and(|table| table.contains(item));
        if !exported {
            return Err(LinkError::UnresolvedImport {
                path: module.to_string(),
                item: item.to_string(),
                location: location.clone(),
            });
        }
        if visible.contains_key(item) {
            return Err(LinkError::NameConflict {
                name: item.to_string(),
                location: location.clone(),
            });
        }
        visible.insert(item.to_string(), location.clone());
        Ok(())
    };

    match &import.items {
        ImportItems::Single(item) => {
            // `import a.b.c` is a module import when `a.b.c` is itself a
            // loaded module; otherwise `c` is an item of module `a.b`.
            if module_paths.contains(&dotted) {
                let names: Vec<String> = exports
                    .get(&dotted)
                    .map(|t| t.iter().cloned().collect())
                    .unwrap_or_default();
                for name in names {
                    bring(&dotted, &name)?;
                }
            } else {
                let module = import.segments[..import.segments.len() - 1].join(".");
                bring(&module, item)?;
            }
        }
        ImportItems::List(items) => {
            for item in items {
                bring(&dotted, item)?;
            }
        }
        ImportItems::Glob => {
            let names: Vec<String> = exports
                .get(&dotted)
                .map(|t| t.iter().cloned().collect())
                .unwrap_or_default();
            if names.is_empty() && !module_paths.contains(&dotted) {
                return Err(LinkError::UnresolvedImport {
                    path: dotted,
                    item: "*".to_string(),
                    location,
                });
            }
            for name in names {
                bring(&dotted, &name)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_module;
    use crate::parser_context::ParserContext;

    fn parse_many(sources: &[(&str, &str)]) -> (Vec<Rc<ModuleAst>>, Arena) {
        let mut ctx = ParserContext::new();
        let mut arena = Arena::default();
        let mut modules = Vec::new();
        for (path, text) in sources {
            let module = parse_module(text, &format!("{path}.paw"), path, &mut ctx, &mut arena)
                .expect("parsing should succeed");
            modules.push(module);
        }
        (modules, arena)
    }

    #[test]
    fn links_single_import() {
        let (modules, arena) = parse_many(&[
            ("math", "pub fn add(a: i32, b: i32) -> i32 { a + b }"),
            ("main", "import math.add\nfn main() -> i32 { add(1, 2) }"),
        ]);
        let program = link(modules, arena).expect("link should succeed");
        assert_eq!(program.modules.len(), 2);
        assert_eq!(program.declarations.len(), 3);
    }

    #[test]
    fn braced_and_single_imports_are_equivalent() {
        let lib = "pub fn f() -> i32 { 1 }\npub fn g() -> i32 { 2 }";
        let (modules_a, arena_a) = parse_many(&[
            ("lib", lib),
            ("main", "import lib.f\nimport lib.g\nfn main() -> i32 { f() + g() }"),
        ]);
        let (modules_b, arena_b) = parse_many(&[
            ("lib", lib),
            ("main", "import lib.{f, g}\nfn main() -> i32 { f() + g() }"),
        ]);
        let program_a = link(modules_a, arena_a).expect("single-form link");
        let program_b = link(modules_b, arena_b).expect("braced-form link");
        assert_eq!(program_a.declarations.len(), program_b.declarations.len());
    }

    #[test]
    fn private_item_is_not_importable() {
        let (modules, arena) = parse_many(&[
            ("lib", "fn hidden() -> i32 { 1 }"),
            ("main", "import lib.hidden\nfn main() -> i32 { hidden() }"),
        ]);
        let err = link(modules, arena).unwrap_err();
        let LinkError::UnresolvedImport { path, item, .. } = err else {
            panic!("expected UnresolvedImport");
        };
        assert_eq!(path, "lib");
        assert_eq!(item, "hidden");
    }

    #[test]
    fn glob_import_brings_all_exports() {
        let (modules, arena) = parse_many(&[
            ("lib", "pub fn f() -> i32 { 1 }\npub fn g() -> i32 { 2 }"),
            ("main", "import lib.*\nfn main() -> i32 { f() + g() }"),
        ]);
        assert!(link(modules, arena).is_ok());
    }

    #[test]
    fn import_collision_with_local_fails() {
        let (modules, arena) = parse_many(&[
            ("lib", "pub fn f() -> i32 { 1 }"),
            ("main", "import lib.f\nfn f() -> i32 { 2 }\nfn main() -> i32 { f() }"),
        ]);
        let err = link(modules, arena).unwrap_err();
        assert!(matches!(err, LinkError::NameConflict { name, .. } if name == "f"));
    }

    #[test]
    fn cross_module_top_level_collision_fails() {
        let (modules, arena) = parse_many(&[
            ("a", "pub fn same() -> i32 { 1 }"),
            ("b", "pub fn same() -> i32 { 2 }"),
            ("main", "fn main() -> i32 { 0 }"),
        ]);
        let err = link(modules, arena).unwrap_err();
        assert!(matches!(err, LinkError::NameConflict { .. }));
    }

    #[test]
    fn prelude_is_implicitly_visible() {
        let (modules, arena) = parse_many(&[
            ("std.prelude", "pub fn print(s: string) { }"),
            ("main", "fn main() -> i32 { print(\"hi\"); 0 }"),
        ]);
        let program = link(modules, arena).expect("link should succeed");
        assert_eq!(program.modules[0].path, "std.prelude");
    }
}
