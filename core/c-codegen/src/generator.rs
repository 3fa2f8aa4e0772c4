//! Program-level C emission: headers, type definitions, enum constructors,
//! prototypes and function bodies.

use std::fmt::Write as _;
use std::rc::Rc;

use paw_ast::nodes::{FunctionDecl, TypeDeclKind};
use paw_mono::{MonoDatabase, function_worklist};
use paw_type_checker::symbol_table::{EnumInfo, StructInfo};
use paw_type_checker::type_info::TypeInfo;
use paw_type_checker::typed_context::TypedContext;
use rustc_hash::FxHashMap;

use crate::CodegenError;
use crate::types::{c_decl, c_type};

/// An enum to materialize: its C name and variant payload types after
/// substitution.
pub(crate) struct EnumLayout {
    pub(crate) c_name: String,
    pub(crate) info: EnumInfo,
    pub(crate) bindings: FxHashMap<String, TypeInfo>,
}

/// A struct to materialize.
pub(crate) struct StructLayout {
    pub(crate) c_name: String,
    pub(crate) info: StructInfo,
    pub(crate) bindings: FxHashMap<String, TypeInfo>,
}

pub struct CGenerator<'a> {
    pub(crate) ctx: &'a TypedContext,
    pub(crate) db: &'a MonoDatabase,
    pub(crate) out: String,

    /// Generic substitutions of the function instance being emitted.
    pub(crate) bindings: FxHashMap<String, TypeInfo>,
    /// Type parameter names in scope in the current function.
    pub(crate) type_params: Vec<String>,
    /// Set while emitting a method body: `self` is a pointer parameter.
    pub(crate) in_method: bool,
    /// Counter for compiler-introduced local names.
    pub(crate) tmp: u32,
}

impl<'a> CGenerator<'a> {
    #[must_use]
    pub fn new(ctx: &'a TypedContext, db: &'a MonoDatabase) -> Self {
        Self {
            ctx,
            db,
            out: String::new(),
            bindings: FxHashMap::default(),
            type_params: vec![],
            in_method: false,
            tmp: 0,
        }
    }

    #[must_use]
    pub fn finish(self) -> String {
        self.out
    }

    pub(crate) fn fresh_tmp(&mut self, base: &str) -> String {
        self.tmp += 1;
        format!("__{base}{}", self.tmp)
    }

    /// The recorded type of a node, with the current instance bindings
    /// applied and aliases fully resolved.
    pub(crate) fn ty_of(&self, node_id: u32) -> TypeInfo {
        let ty = self
            .ctx
            .node_type_or_void(node_id)
            .substitute(&self.bindings);
        self.ctx.symbols().resolve_alias_deep(&ty)
    }

    /// Alias-free view of a declared type.
    pub(crate) fn resolved(&self, ty: &TypeInfo) -> TypeInfo {
        self.ctx.symbols().resolve_alias_deep(ty)
    }

    // ---- program assembly ----

    /// Emits the whole translation unit.
    ///
    /// # Errors
    ///
    /// Propagates `UnsupportedConstruct` from body lowering.
    pub fn emit_program(&mut self) -> Result<(), CodegenError> {
        let structs = self.struct_layouts();
        let enums = self.enum_layouts();

        self.emit_header();
        for layout in &structs {
            let _ = writeln!(self.out, "typedef struct {0} {0};", layout.c_name);
        }
        for layout in &enums {
            let _ = writeln!(self.out, "typedef struct {0} {0};", layout.c_name);
        }
        self.out.push('\n');

        for layout in &enums {
            self.emit_enum_tag(layout);
        }
        for layout in &structs {
            self.emit_struct_definition(layout);
        }
        for layout in &enums {
            self.emit_enum_definition(layout);
        }

        self.emit_prototypes(&enums)?;
        for layout in &enums {
            self.emit_enum_constructors(layout);
        }
        self.emit_bodies()?;
        Ok(())
    }

    fn emit_header(&mut self) {
        self.out.push_str(
            "#include <stdio.h>\n#include <stdlib.h>\n#include <stdint.h>\n#include <stdbool.h>\n#include <string.h>\n\n",
        );
        self.out.push_str(
            "#if !defined(__SIZEOF_INT128__)\ntypedef long long __int128_t;\ntypedef unsigned long long __uint128_t;\n#endif\n\n",
        );
    }

    /// Non-generic struct declarations in source order, then one layout
    /// per struct instance from the database.
    fn struct_layouts(&self) -> Vec<StructLayout> {
        let mut layouts = Vec::new();
        for decl in self.ctx.type_declarations() {
            if decl.is_generic() {
                continue;
            }
            if !matches!(decl.kind, TypeDeclKind::Struct { .. }) {
                continue;
            }
            if let Some(info) = self.ctx.symbols().struct_info(&decl.name()) {
                layouts.push(StructLayout {
                    c_name: decl.name(),
                    info: info.clone(),
                    bindings: FxHashMap::default(),
                });
            }
        }
        for instance in self.db.struct_instances() {
            let Some(info) = self.ctx.symbols().struct_info(&instance.name) else {
                continue;
            };
            let bindings: FxHashMap<String, TypeInfo> = info
                .type_params
                .iter()
                .cloned()
                .zip(instance.type_args.iter().cloned())
                .collect();
            layouts.push(StructLayout {
                c_name: instance.mangled.clone(),
                info: info.clone(),
                bindings,
            });
        }
        self.sort_by_field_dependencies(layouts)
    }

    /// Orders struct layouts so that every by-value field type is defined
    /// before the struct that embeds it. Pointer fields do not constrain
    /// the order.
    fn sort_by_field_dependencies(&self, layouts: Vec<StructLayout>) -> Vec<StructLayout> {
        fn value_dependencies(ty: &TypeInfo, out: &mut Vec<String>) {
            match ty {
                TypeInfo::Named(name) => out.push(name.clone()),
                TypeInfo::GenericInstance(..) => {
                    out.push(paw_mono::mangle::mangle_type(ty));
                }
                TypeInfo::Array { element, .. } => value_dependencies(element, out),
                _ => {}
            }
        }

        let mut remaining = layouts;
        let mut sorted: Vec<StructLayout> = Vec::with_capacity(remaining.len());
        let mut emitted: std::collections::HashSet<String> = std::collections::HashSet::new();
        while !remaining.is_empty() {
            let mut progressed = false;
            let mut deferred = Vec::new();
            let names: std::collections::HashSet<String> =
                remaining.iter().map(|l| l.c_name.clone()).collect();
            for layout in remaining {
                let mut deps = Vec::new();
                for field in &layout.info.fields {
                    let ty = self.resolved(&field.ty.substitute(&layout.bindings));
                    value_dependencies(&ty, &mut deps);
                }
                let blocked = deps
                    .iter()
                    .any(|d| names.contains(d) && !emitted.contains(d) && *d != layout.c_name);
                if blocked {
                    deferred.push(layout);
                } else {
                    emitted.insert(layout.c_name.clone());
                    sorted.push(layout);
                    progressed = true;
                }
            }
            if !progressed {
                // A definition cycle (only possible through invalid
                // source); emit in the order we have.
                sorted.extend(deferred);
                break;
            }
            remaining = deferred;
        }
        sorted
    }

    fn enum_layouts(&self) -> Vec<EnumLayout> {
        let mut layouts = Vec::new();
        for decl in self.ctx.type_declarations() {
            if decl.is_generic() {
                continue;
            }
            if !matches!(decl.kind, TypeDeclKind::Enum { .. }) {
                continue;
            }
            if let Some(info) = self.ctx.symbols().enum_info(&decl.name()) {
                layouts.push(EnumLayout {
                    c_name: decl.name(),
                    info: info.clone(),
                    bindings: FxHashMap::default(),
                });
            }
        }
        for instance in self.db.struct_instances() {
            let Some(info) = self.ctx.symbols().enum_info(&instance.name) else {
                continue;
            };
            let bindings: FxHashMap<String, TypeInfo> = info
                .type_params
                .iter()
                .cloned()
                .zip(instance.type_args.iter().cloned())
                .collect();
            layouts.push(EnumLayout {
                c_name: instance.mangled.clone(),
                info: info.clone(),
                bindings,
            });
        }
        layouts
    }

    fn emit_enum_tag(&mut self, layout: &EnumLayout) {
        let tags = layout
            .info
            .variants
            .iter()
            .map(|v| format!("{}_TAG_{}", layout.c_name, v.name))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(self.out, "typedef enum {{ {tags} }} {}_Tag;", layout.c_name);
    }

    fn emit_struct_definition(&mut self, layout: &StructLayout) {
        let _ = writeln!(self.out, "\nstruct {} {{", layout.c_name);
        for field in &layout.info.fields {
            let ty = self.resolved(&field.ty.substitute(&layout.bindings));
            let _ = writeln!(self.out, "    {};", c_decl(&ty, &field.name));
        }
        if layout.info.fields.is_empty() {
            self.out.push_str("    char __empty;\n");
        }
        self.out.push_str("};\n");
    }

    fn emit_enum_definition(&mut self, layout: &EnumLayout) {
        let _ = writeln!(self.out, "\nstruct {} {{", layout.c_name);
        let _ = writeln!(self.out, "    {}_Tag tag;", layout.c_name);
        let payload_variants: Vec<_> = layout
            .info
            .variants
            .iter()
            .filter(|v| !v.payloads.is_empty())
            .collect();
        if !payload_variants.is_empty() {
            self.out.push_str("    union {\n");
            for variant in payload_variants {
                if variant.payloads.len() == 1 {
                    let ty = self.resolved(&variant.payloads[0].substitute(&layout.bindings));
                    let _ = writeln!(
                        self.out,
                        "        {};",
                        c_decl(&ty, &format!("{}_value", variant.name))
                    );
                } else {
                    self.out.push_str("        struct {\n");
                    for (index, payload) in variant.payloads.iter().enumerate() {
                        let ty = self.resolved(&payload.substitute(&layout.bindings));
                        let _ = writeln!(
                            self.out,
                            "            {};",
                            c_decl(&ty, &format!("field{index}"))
                        );
                    }
                    let _ = writeln!(self.out, "        }} {}_value;", variant.name);
                }
            }
            self.out.push_str("    } data;\n");
        }
        self.out.push_str("};\n");
    }

    fn emit_enum_constructors(&mut self, layout: &EnumLayout) {
        for variant in &layout.info.variants {
            let signature = self.enum_constructor_signature(layout, &variant.name);
            let _ = writeln!(self.out, "\n{signature} {{");
            let _ = writeln!(self.out, "    {} __e;", layout.c_name);
            let _ = writeln!(
                self.out,
                "    __e.tag = {}_TAG_{};",
                layout.c_name, variant.name
            );
            if variant.payloads.len() == 1 {
                let _ = writeln!(self.out, "    __e.data.{}_value = v0;", variant.name);
            } else {
                for index in 0..variant.payloads.len() {
                    let _ = writeln!(
                        self.out,
                        "    __e.data.{}_value.field{index} = v{index};",
                        variant.name
                    );
                }
            }
            self.out.push_str("    return __e;\n}\n");
        }
    }

    fn enum_constructor_signature(&self, layout: &EnumLayout, variant_name: &str) -> String {
        let variant = layout
            .info
            .variant(variant_name)
            .expect("constructor for declared variant");
        let params = if variant.payloads.is_empty() {
            "void".to_string()
        } else {
            variant
                .payloads
                .iter()
                .enumerate()
                .map(|(index, payload)| {
                    c_decl(
                        &self.resolved(&payload.substitute(&layout.bindings)),
                        &format!("v{index}"),
                    )
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!("{} {}_{}({})", layout.c_name, layout.c_name, variant_name, params)
    }

    // ---- function emission ----

    fn emit_prototypes(&mut self, enums: &[EnumLayout]) -> Result<(), CodegenError> {
        self.out.push('\n');
        for layout in enums {
            for variant in layout.info.variants.clone() {
                let signature = self.enum_constructor_signature(layout, &variant.name);
                let _ = writeln!(self.out, "{signature};");
            }
        }
        for work in function_worklist(self.ctx, self.db) {
            let signature = self.function_signature(
                &work.decl,
                work.owner.as_deref(),
                &work.mangled,
                &work.bindings,
            );
            let _ = writeln!(self.out, "{signature};");
        }
        Ok(())
    }

    fn emit_bodies(&mut self) -> Result<(), CodegenError> {
        for work in function_worklist(self.ctx, self.db) {
            self.emit_function(&work.decl, work.owner.as_deref(), &work.mangled, &work.bindings)?;
        }
        Ok(())
    }

    pub(crate) fn return_type_of(
        &self,
        decl: &FunctionDecl,
        bindings: &FxHashMap<String, TypeInfo>,
    ) -> TypeInfo {
        let ty = decl
            .return_type
            .as_ref()
            .map(|t| {
                TypeInfo::from_type_expr(t, &self.decl_type_params(decl), None)
                    .substitute(bindings)
            })
            .unwrap_or_default();
        self.resolved(&ty)
    }

    fn decl_type_params(&self, decl: &FunctionDecl) -> Vec<String> {
        let mut names: Vec<String> = decl.type_params.iter().map(|p| p.name.clone()).collect();
        for key in self.bindings.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
        for param in &self.type_params {
            if !names.contains(param) {
                names.push(param.clone());
            }
        }
        names
    }

    fn function_signature(
        &self,
        decl: &FunctionDecl,
        owner_c_name: Option<&str>,
        mangled: &str,
        bindings: &FxHashMap<String, TypeInfo>,
    ) -> String {
        let mut type_params: Vec<String> =
            decl.type_params.iter().map(|p| p.name.clone()).collect();
        for key in bindings.keys() {
            if !type_params.contains(key) {
                type_params.push(key.clone());
            }
        }
        let ret = if mangled == "main" {
            "int".to_string()
        } else {
            let ty = decl
                .return_type
                .as_ref()
                .map(|t| TypeInfo::from_type_expr(t, &type_params, None).substitute(bindings))
                .unwrap_or_default();
            c_type(&self.resolved(&ty))
        };
        let mut params = Vec::new();
        if let (Some(owner), true) = (owner_c_name, decl.has_self()) {
            params.push(format!("{owner}* self"));
        }
        for param in decl.params.iter().filter(|p| !p.is_self) {
            let ty = param
                .ty
                .as_ref()
                .map(|t| TypeInfo::from_type_expr(t, &type_params, None).substitute(bindings))
                .unwrap_or_default();
            params.push(c_decl(&self.resolved(&ty), &param.name));
        }
        let params = if params.is_empty() {
            "void".to_string()
        } else {
            params.join(", ")
        };
        format!("{ret} {mangled}({params})")
    }

    fn emit_function(
        &mut self,
        decl: &Rc<FunctionDecl>,
        owner_c_name: Option<&str>,
        mangled: &str,
        bindings: &FxHashMap<String, TypeInfo>,
    ) -> Result<(), CodegenError> {
        self.bindings = bindings.clone();
        self.type_params = decl.type_params.iter().map(|p| p.name.clone()).collect();
        for key in bindings.keys() {
            if !self.type_params.contains(key) {
                self.type_params.push(key.clone());
            }
        }
        self.in_method = owner_c_name.is_some() && decl.has_self();
        self.tmp = 0;

        let signature = self.function_signature(decl, owner_c_name, mangled, bindings);
        let _ = writeln!(self.out, "\n{signature} {{");
        let return_type = self.return_type_of(decl, bindings);
        self.emit_function_body(decl, &return_type, mangled == "main")?;
        self.out.push_str("}\n");
        Ok(())
    }
}
