//! The fixed-point instance collector.
//!
//! Seeds the worklist with every non-generic function and every method of a
//! non-generic type, then drains it: each work item is one function body
//! walked under a set of type bindings. Call sites of generic functions,
//! struct literals of generic types, and method/static calls contribute new
//! instances; each new instance pushes its own body onto the worklist.
//!
//! A struct-instance insertion also inserts one method instance per method
//! declared on that struct, because any of them might be invoked later on a
//! value of the concrete type.

use std::rc::Rc;

use paw_ast::nodes::{
    Declaration, Expression, FunctionDecl, InterpSegment, Statement, TypeDecl,
};
use paw_type_checker::type_info::TypeInfo;
use paw_type_checker::typed_context::TypedContext;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{MonoDatabase, mangle};

struct WorkItem {
    decl: Rc<FunctionDecl>,
    /// Type parameter names in scope inside this body (function's own plus
    /// its owner's, for methods).
    type_param_names: Vec<String>,
    bindings: FxHashMap<String, TypeInfo>,
}

pub(crate) struct Collector<'a> {
    ctx: &'a TypedContext,
    functions: FxHashMap<String, Rc<FunctionDecl>>,
    type_decls: FxHashMap<String, Rc<TypeDecl>>,
    methods: FxHashMap<(String, String), Rc<FunctionDecl>>,
    visited: FxHashSet<String>,
    worklist: Vec<WorkItem>,
}

impl<'a> Collector<'a> {
    pub(crate) fn new(ctx: &'a TypedContext) -> Self {
        let mut functions = FxHashMap::default();
        let mut type_decls = FxHashMap::default();
        let mut methods = FxHashMap::default();
        for decl in ctx.declarations() {
            match decl {
                Declaration::Function(func) => {
                    functions.insert(func.name(), func.clone());
                }
                Declaration::Type(ty) => {
                    for method in ty.methods() {
                        methods.insert((ty.name(), method.name()), method.clone());
                    }
                    type_decls.insert(ty.name(), ty.clone());
                }
                _ => {}
            }
        }
        Self {
            ctx,
            functions,
            type_decls,
            methods,
            visited: FxHashSet::default(),
            worklist: Vec::new(),
        }
    }

    pub(crate) fn run(mut self, db: &mut MonoDatabase) {
        // Seed: every non-generic function and every method of a
        // non-generic type is live from the start.
        for func in self.functions.values() {
            if !func.is_generic() {
                self.worklist.push(WorkItem {
                    decl: func.clone(),
                    type_param_names: vec![],
                    bindings: FxHashMap::default(),
                });
            }
        }
        for ty in self.type_decls.values() {
            if ty.is_generic() {
                continue;
            }
            for method in ty.methods() {
                self.worklist.push(WorkItem {
                    decl: method.clone(),
                    type_param_names: vec![],
                    bindings: FxHashMap::default(),
                });
            }
        }

        while let Some(item) = self.worklist.pop() {
            self.visit_function(&item, db);
        }
    }

    fn visit_function(&mut self, item: &WorkItem, db: &mut MonoDatabase) {
        for statement in &item.decl.body.statements {
            self.visit_statement(statement, item, db);
        }
        if let Some(tail) = &item.decl.body.tail {
            self.visit_expression(tail, item, db);
        }
    }

    fn visit_statement(&mut self, statement: &Statement, item: &WorkItem, db: &mut MonoDatabase) {
        match statement {
            Statement::Let(let_stmt) => {
                if let Some(ty) = self.resolve(let_stmt.id, item) {
                    self.register_type_instance(&ty, db);
                }
                if let Some(value) = &let_stmt.value {
                    self.visit_expression(value, item, db);
                }
            }
            Statement::Assign(assign) => {
                self.visit_expression(&assign.target, item, db);
                self.visit_expression(&assign.value, item, db);
            }
            Statement::CompoundAssign(assign) => {
                self.visit_expression(&assign.target, item, db);
                self.visit_expression(&assign.value, item, db);
            }
            Statement::Return(ret) => {
                if let Some(value) = &ret.value {
                    self.visit_expression(value, item, db);
                }
            }
            Statement::Loop(loop_stmt) => {
                if let Some(condition) = &loop_stmt.condition {
                    self.visit_expression(condition, item, db);
                }
                if let Some(iterable) = &loop_stmt.iterable {
                    self.visit_expression(iterable, item, db);
                }
                for statement in &loop_stmt.body.statements {
                    self.visit_statement(statement, item, db);
                }
                if let Some(tail) = &loop_stmt.body.tail {
                    self.visit_expression(tail, item, db);
                }
            }
            Statement::Break(brk) => {
                if let Some(value) = &brk.value {
                    self.visit_expression(value, item, db);
                }
            }
            Statement::Continue(_) => {}
            Statement::Expression(expr) => self.visit_expression(expr, item, db),
        }
    }

    #[allow(clippy::too_many_lines)]
    fn visit_expression(&mut self, expr: &Expression, item: &WorkItem, db: &mut MonoDatabase) {
        match expr {
            Expression::Call(call) => {
                for arg in &call.args {
                    self.visit_expression(arg, item, db);
                }
                self.collect_call_instance(call, item, db);
            }
            Expression::MethodCall(call) => {
                self.visit_expression(&call.receiver, item, db);
                for arg in &call.args {
                    self.visit_expression(arg, item, db);
                }
                if let Some(receiver_ty) = self.resolve(call.receiver.id(), item) {
                    self.register_type_instance(&receiver_ty, db);
                    if let TypeInfo::GenericInstance(name, args) = receiver_ty {
                        self.add_method_instance(&name, &call.method, args, db);
                    }
                }
            }
            Expression::StaticCall(call) => {
                for arg in &call.args {
                    self.visit_expression(arg, item, db);
                }
                let type_args: Vec<TypeInfo> = call
                    .type_args
                    .iter()
                    .map(|t| {
                        let ty = TypeInfo::from_type_expr(t, &item.type_param_names, None)
                            .substitute(&item.bindings);
                        self.ctx.symbols().resolve_alias_deep(&ty)
                    })
                    .collect();
                if !type_args.is_empty() && !type_args.iter().any(TypeInfo::has_generics) {
                    let instance =
                        TypeInfo::GenericInstance(call.type_name.clone(), type_args.clone());
                    self.register_type_instance(&instance, db);
                    self.add_method_instance(&call.type_name, &call.method, type_args, db);
                }
            }
            Expression::StructInit(init) => {
                for (_, value) in &init.fields {
                    self.visit_expression(value, item, db);
                }
                if let Some(ty) = self.resolve(init.id, item) {
                    self.register_type_instance(&ty, db);
                }
            }
            Expression::Binary(binary) => {
                self.visit_expression(&binary.left, item, db);
                self.visit_expression(&binary.right, item, db);
            }
            Expression::Unary(unary) => self.visit_expression(&unary.operand, item, db),
            Expression::FieldAccess(access) => self.visit_expression(&access.object, item, db),
            Expression::Index(index) => {
                self.visit_expression(&index.object, item, db);
                self.visit_expression(&index.index, item, db);
            }
            Expression::Array(array) => {
                for element in &array.elements {
                    self.visit_expression(element, item, db);
                }
            }
            Expression::Range(range) => {
                self.visit_expression(&range.start, item, db);
                self.visit_expression(&range.end, item, db);
            }
            Expression::If(if_expr) => {
                self.visit_expression(&if_expr.condition, item, db);
                for statement in &if_expr.then_branch.statements {
                    self.visit_statement(statement, item, db);
                }
                if let Some(tail) = &if_expr.then_branch.tail {
                    self.visit_expression(tail, item, db);
                }
                if let Some(else_branch) = &if_expr.else_branch {
                    self.visit_expression(else_branch, item, db);
                }
            }
            Expression::Block(block) => {
                for statement in &block.statements {
                    self.visit_statement(statement, item, db);
                }
                if let Some(tail) = &block.tail {
                    self.visit_expression(tail, item, db);
                }
            }
            Expression::Is(is_expr) => {
                self.visit_expression(&is_expr.scrutinee, item, db);
                for arm in &is_expr.arms {
                    if let Some(guard) = &arm.guard {
                        self.visit_expression(guard, item, db);
                    }
                    self.visit_expression(&arm.body, item, db);
                }
            }
            Expression::Try(try_expr) => self.visit_expression(&try_expr.inner, item, db),
            Expression::Cast(cast) => self.visit_expression(&cast.value, item, db),
            Expression::Interp(interp) => {
                for segment in &interp.segments {
                    if let InterpSegment::Expr(segment_expr) = segment {
                        self.visit_expression(segment_expr, item, db);
                    }
                }
            }
            Expression::Reference(reference) => self.visit_expression(&reference.inner, item, db),
            Expression::Literal(_) | Expression::Identifier(_) => {}
        }

        // Catch-all: any expression whose type is a concrete generic
        // instance requires that instance's type to exist.
        if let Some(ty) = self.resolve(expr.id(), item) {
            self.register_type_instance(&ty, db);
        }
    }

    /// Contributes a function instance for a call to a generic function,
    /// inferring the type arguments from the recorded argument types.
    fn collect_call_instance(
        &mut self,
        call: &Rc<paw_ast::nodes::CallExpression>,
        item: &WorkItem,
        db: &mut MonoDatabase,
    ) {
        let Expression::Identifier(callee) = &call.callee else {
            return;
        };
        let Some(info) = self.ctx.symbols().function(&callee.name) else {
            return;
        };
        if !info.is_generic() {
            return;
        }
        let arg_types: Vec<TypeInfo> = call
            .args
            .iter()
            .map(|arg| self.resolve(arg.id(), item).unwrap_or_default())
            .collect();
        let result_ty = self.resolve(call.id, item);
        let Some(type_args) = crate::infer_call_type_args(info, &arg_types, result_ty.as_ref())
        else {
            return;
        };
        let name = callee.name.clone();
        let type_params = info.type_params.clone();
        if db.insert_function(&name, type_args.clone()) {
            if let Some(decl) = self.functions.get(&name).cloned() {
                let key = format!("wi:fn:{}", mangle::mangle(&name, &type_args));
                let bound: FxHashMap<String, TypeInfo> =
                    type_params.iter().cloned().zip(type_args).collect();
                if self.visited.insert(key) {
                    self.worklist.push(WorkItem {
                        decl,
                        type_param_names: type_params,
                        bindings: bound,
                    });
                }
            }
        }
    }

    /// Registers a concrete generic-instance type, its nested instances,
    /// its substituted field types, and one method instance per declared
    /// method.
    fn register_type_instance(&mut self, ty: &TypeInfo, db: &mut MonoDatabase) {
        match ty {
            TypeInfo::GenericInstance(name, args) => {
                if args.iter().any(TypeInfo::has_generics) {
                    return;
                }
                for arg in args {
                    self.register_type_instance(arg, db);
                }
                if !db.insert_struct(name, args.clone()) {
                    return;
                }
                let owner_params = self.owner_type_params(name);
                let bindings: FxHashMap<String, TypeInfo> = owner_params
                    .iter()
                    .cloned()
                    .zip(args.iter().cloned())
                    .collect();
                // Substituted field and payload types may themselves be
                // generic instances.
                if let Some(info) = self.ctx.symbols().struct_info(name) {
                    let field_types: Vec<TypeInfo> = info
                        .fields
                        .iter()
                        .map(|f| f.ty.substitute(&bindings))
                        .collect();
                    for field_ty in field_types {
                        self.register_type_instance(&field_ty, db);
                    }
                } else if let Some(info) = self.ctx.symbols().enum_info(name) {
                    let payload_types: Vec<TypeInfo> = info
                        .variants
                        .iter()
                        .flat_map(|v| v.payloads.iter().map(|p| p.substitute(&bindings)))
                        .collect();
                    for payload_ty in payload_types {
                        self.register_type_instance(&payload_ty, db);
                    }
                }
                // Every declared method might be invoked on a value of
                // this concrete type.
                let method_names: Vec<String> = self
                    .type_decls
                    .get(name)
                    .map(|decl| decl.methods().iter().map(|m| m.name()).collect())
                    .unwrap_or_default();
                for method in method_names {
                    self.add_method_instance(name, &method, args.clone(), db);
                }
            }
            TypeInfo::Pointer(inner) => self.register_type_instance(inner, db),
            TypeInfo::Array { element, .. } => self.register_type_instance(element, db),
            TypeInfo::Function { params, ret } => {
                for param in params {
                    self.register_type_instance(param, db);
                }
                self.register_type_instance(ret, db);
            }
            TypeInfo::Primitive(_) | TypeInfo::Named(_) | TypeInfo::Generic(_) => {}
        }
    }

    fn add_method_instance(
        &mut self,
        type_name: &str,
        method: &str,
        type_args: Vec<TypeInfo>,
        db: &mut MonoDatabase,
    ) {
        if type_args.is_empty() || type_args.iter().any(TypeInfo::has_generics) {
            return;
        }
        if !db.insert_method(type_name, method, type_args.clone()) {
            return;
        }
        let Some(decl) = self
            .methods
            .get(&(type_name.to_string(), method.to_string()))
            .cloned()
        else {
            return;
        };
        let owner_params = self.owner_type_params(type_name);
        let mut type_param_names = owner_params.clone();
        for own in decl.type_params.iter().map(|p| p.name.clone()) {
            if !type_param_names.contains(&own) {
                type_param_names.push(own);
            }
        }
        let bindings: FxHashMap<String, TypeInfo> =
            owner_params.into_iter().zip(type_args.clone()).collect();
        let key = format!(
            "wi:m:{}",
            mangle::mangle_method(type_name, &type_args, method)
        );
        if self.visited.insert(key) {
            self.worklist.push(WorkItem {
                decl,
                type_param_names,
                bindings,
            });
        }
    }

    fn owner_type_params(&self, type_name: &str) -> Vec<String> {
        if let Some(info) = self.ctx.symbols().struct_info(type_name) {
            return info.type_params.clone();
        }
        if let Some(info) = self.ctx.symbols().enum_info(type_name) {
            return info.type_params.clone();
        }
        vec![]
    }

    fn resolve(&self, node_id: u32, item: &WorkItem) -> Option<TypeInfo> {
        self.ctx.get_node_typeinfo(node_id).map(|ty| {
            self.ctx
                .symbols()
                .resolve_alias_deep(&ty.substitute(&item.bindings))
        })
    }
}
