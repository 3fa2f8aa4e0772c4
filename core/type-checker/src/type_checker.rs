//! Type Checker Implementation
//!
//! Local, forward-only inference over the linked program — deliberately not
//! full Hindley-Milner. The checker runs in three phases:
//!
//! 1. **Register types**: structs, enums and aliases into the symbol table;
//!    traits and impl blocks are rejected here.
//! 2. **Register functions**: signatures of all free functions; async
//!    functions are rejected.
//! 3. **Check bodies**: every function and method body, inferring `let`
//!    types, validating calls and unifying generic parameters across each
//!    call site.
//!
//! Every visited expression gets its inferred type recorded in the
//! [`TypedContext`] under the expression's node id; the monomorphization
//! collector and both backends read types exclusively from there.

use rustc_hash::FxHashMap;

use paw_ast::nodes::{
    BinaryOp, Declaration, Expression, FunctionDecl, ImplBlock, InterpSegment, IntLiteral,
    Literal, Location, Parameter, Pattern, Statement, TypeDecl, TypeDeclKind, UnaryOp,
};
use std::rc::Rc;

use crate::errors::TypeCheckError;
use crate::symbol_table::{EnumInfo, FieldInfo, FuncInfo, MethodInfo, StructInfo, VariantInfo};
use crate::type_info::{Primitive, TypeInfo};
use crate::typed_context::TypedContext;

#[derive(Clone)]
struct VarBinding {
    ty: TypeInfo,
    mutable: bool,
}

#[derive(Default)]
pub(crate) struct TypeChecker {
    scopes: Vec<FxHashMap<String, VarBinding>>,
    current_return: TypeInfo,
    current_self: Option<TypeInfo>,
    current_type_params: Vec<String>,
}

impl TypeChecker {
    pub(crate) fn check(&mut self, ctx: &mut TypedContext) -> Result<(), TypeCheckError> {
        let declarations = ctx.declarations().to_vec();

        for decl in &declarations {
            match decl {
                Declaration::Type(type_decl) => self.register_type(type_decl, ctx)?,
                Declaration::Impl(impl_block) => return Err(Self::reject_impl(impl_block)),
                _ => {}
            }
        }
        for decl in &declarations {
            if let Declaration::Function(func) = decl {
                let info = self.function_info(func, &[], None)?;
                ctx.symbol_table.insert_function(info);
            }
        }

        for decl in &declarations {
            match decl {
                Declaration::Function(func) => self.check_function(func, None, ctx)?,
                Declaration::Type(type_decl) => {
                    for method in type_decl.methods() {
                        self.check_function(method, Some(type_decl), ctx)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn reject_impl(impl_block: &Rc<ImplBlock>) -> TypeCheckError {
        TypeCheckError::UnsupportedDeclaration {
            kind: "impl",
            name: impl_block.target.clone(),
            location: impl_block.location.clone(),
        }
    }

    // ---- phase 1: type registration ----

    fn register_type(
        &mut self,
        decl: &Rc<TypeDecl>,
        ctx: &mut TypedContext,
    ) -> Result<(), TypeCheckError> {
        let type_params: Vec<String> = decl.type_params.iter().map(|p| p.name.clone()).collect();
        let self_ty = Self::self_type_of(&decl.name(), &type_params);

        match &decl.kind {
            TypeDeclKind::Struct { fields, methods } => {
                let field_infos = fields
                    .iter()
                    .map(|field| FieldInfo {
                        name: field.name.clone(),
                        ty: TypeInfo::from_type_expr(&field.ty, &type_params, Some(&self_ty)),
                        visibility: field.visibility.clone(),
                    })
                    .collect();
                let method_infos = methods
                    .iter()
                    .map(|m| self.method_info(m, &type_params, &self_ty))
                    .collect::<Result<Vec<_>, _>>()?;
                ctx.symbol_table.insert_struct(StructInfo {
                    name: decl.name(),
                    type_params,
                    fields: field_infos,
                    methods: method_infos,
                });
            }
            TypeDeclKind::Enum { variants, methods } => {
                let variant_infos = variants
                    .iter()
                    .enumerate()
                    .map(|(tag, variant)| VariantInfo {
                        name: variant.name.clone(),
                        payloads: variant
                            .payloads
                            .iter()
                            .map(|p| TypeInfo::from_type_expr(p, &type_params, Some(&self_ty)))
                            .collect(),
                        tag,
                    })
                    .collect();
                let method_infos = methods
                    .iter()
                    .map(|m| self.method_info(m, &type_params, &self_ty))
                    .collect::<Result<Vec<_>, _>>()?;
                ctx.symbol_table.insert_enum(EnumInfo {
                    name: decl.name(),
                    type_params,
                    variants: variant_infos,
                    methods: method_infos,
                });
            }
            TypeDeclKind::Trait { .. } => {
                return Err(TypeCheckError::UnsupportedDeclaration {
                    kind: "trait",
                    name: decl.name(),
                    location: decl.location.clone(),
                });
            }
            TypeDeclKind::Alias(target) => {
                ctx.symbol_table.insert_alias(
                    &decl.name(),
                    TypeInfo::from_type_expr(target, &type_params, None),
                );
            }
        }
        Ok(())
    }

    fn self_type_of(name: &str, type_params: &[String]) -> TypeInfo {
        if type_params.is_empty() {
            TypeInfo::Named(name.to_string())
        } else {
            TypeInfo::GenericInstance(
                name.to_string(),
                type_params
                    .iter()
                    .map(|p| TypeInfo::Generic(p.clone()))
                    .collect(),
            )
        }
    }

    fn method_info(
        &self,
        method: &Rc<FunctionDecl>,
        owner_params: &[String],
        self_ty: &TypeInfo,
    ) -> Result<MethodInfo, TypeCheckError> {
        let info = self.function_info(method, owner_params, Some(self_ty))?;
        let has_self = method.has_self();
        let self_mutable = method.params.first().is_some_and(|p| p.is_self && p.is_mut);
        Ok(MethodInfo {
            signature: info,
            has_self,
            self_mutable,
        })
    }

    fn function_info(
        &self,
        func: &Rc<FunctionDecl>,
        owner_params: &[String],
        self_ty: Option<&TypeInfo>,
    ) -> Result<FuncInfo, TypeCheckError> {
        if func.is_async {
            return Err(TypeCheckError::UnsupportedDeclaration {
                kind: "async fn",
                name: func.name(),
                location: func.location.clone(),
            });
        }
        let mut type_params: Vec<String> =
            func.type_params.iter().map(|p| p.name.clone()).collect();
        for owner_param in owner_params {
            if !type_params.contains(owner_param) {
                type_params.push(owner_param.clone());
            }
        }
        let mut param_names = Vec::new();
        let mut param_types = Vec::new();
        let mut param_mutable = Vec::new();
        for param in &func.params {
            if param.is_self {
                continue;
            }
            param_names.push(param.name.clone());
            param_types.push(
                param
                    .ty
                    .as_ref()
                    .map(|t| TypeInfo::from_type_expr(t, &type_params, self_ty))
                    .unwrap_or_default(),
            );
            param_mutable.push(param.is_mut);
        }
        let return_type = func
            .return_type
            .as_ref()
            .map(|t| TypeInfo::from_type_expr(t, &type_params, self_ty))
            .unwrap_or_default();
        Ok(FuncInfo {
            name: func.name(),
            type_params,
            param_names,
            param_types,
            param_mutable,
            return_type,
            visibility: func.visibility.clone(),
        })
    }

    // ---- phase 3: body checking ----

    fn check_function(
        &mut self,
        func: &Rc<FunctionDecl>,
        owner: Option<&Rc<TypeDecl>>,
        ctx: &mut TypedContext,
    ) -> Result<(), TypeCheckError> {
        let owner_params: Vec<String> = owner
            .map(|o| o.type_params.iter().map(|p| p.name.clone()).collect())
            .unwrap_or_default();
        let self_ty = owner.map(|o| Self::self_type_of(&o.name(), &owner_params));
        let info = self.function_info(func, &owner_params, self_ty.as_ref())?;

        self.scopes = vec![FxHashMap::default()];
        self.current_type_params = info.type_params.clone();
        self.current_return = info.return_type.clone();
        self.current_self = self_ty.clone();

        if let (Some(self_ty), Some(receiver)) = (&self_ty, func.params.first()) {
            if receiver.is_self {
                self.bind(
                    "self",
                    VarBinding {
                        ty: self_ty.clone(),
                        mutable: receiver.is_mut,
                    },
                );
                ctx.set_node_typeinfo(receiver.id, self_ty.clone());
            }
        }
        let value_params: Vec<&Rc<Parameter>> =
            func.params.iter().filter(|p| !p.is_self).collect();
        for (param, ty) in value_params.iter().zip(&info.param_types) {
            self.bind(
                &param.name,
                VarBinding {
                    ty: ty.clone(),
                    mutable: param.is_mut,
                },
            );
            ctx.set_node_typeinfo(param.id, ty.clone());
        }

        let body_ty = self.infer_block_parts(
            &func.body.statements,
            func.body.tail.as_ref(),
            Some(&info.return_type.clone()),
            ctx,
        )?;
        if let Some(tail) = &func.body.tail {
            self.unify(&info.return_type, &body_ty, &tail.location())?;
        } else if func.return_type.is_none() {
            // Void function without a tail: nothing to check.
        }
        ctx.set_node_typeinfo(func.body.id, body_ty);
        Ok(())
    }

    // ---- scopes ----

    fn bind(&mut self, name: &str, binding: VarBinding) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name.to_string(), binding);
    }

    fn lookup(&self, name: &str) -> Option<&VarBinding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    // ---- statements ----

    fn infer_block_parts(
        &mut self,
        statements: &[Statement],
        tail: Option<&Expression>,
        expected: Option<&TypeInfo>,
        ctx: &mut TypedContext,
    ) -> Result<TypeInfo, TypeCheckError> {
        self.push_scope();
        let result = (|| {
            for statement in statements {
                self.infer_statement(statement, ctx)?;
            }
            match tail {
                Some(expr) => self.infer_expression(expr, expected, ctx),
                None => Ok(TypeInfo::void()),
            }
        })();
        self.pop_scope();
        result
    }

    fn infer_statement(
        &mut self,
        statement: &Statement,
        ctx: &mut TypedContext,
    ) -> Result<(), TypeCheckError> {
        match statement {
            Statement::Let(let_stmt) => {
                let annotated = let_stmt.ty.as_ref().map(|t| {
                    let ty = TypeInfo::from_type_expr(
                        t,
                        &self.current_type_params,
                        self.current_self.as_ref(),
                    );
                    ctx.symbol_table.resolve_alias(&ty)
                });
                let value_ty = match &let_stmt.value {
                    Some(value) => Some(self.infer_expression(value, annotated.as_ref(), ctx)?),
                    None => None,
                };
                if let (Some(annotated), Some(value_ty)) = (&annotated, &value_ty) {
                    self.unify(annotated, value_ty, &let_stmt.location)?;
                }
                let ty = annotated
                    .or(value_ty)
                    .unwrap_or_default();
                ctx.set_node_typeinfo(let_stmt.id, ty.clone());
                self.bind(
                    &let_stmt.name,
                    VarBinding {
                        ty,
                        mutable: let_stmt.mutable,
                    },
                );
            }
            Statement::Assign(assign) => {
                let target_ty = self.infer_expression(&assign.target, None, ctx)?;
                self.require_mutable_target(&assign.target)?;
                let value_ty = self.infer_expression(&assign.value, Some(&target_ty), ctx)?;
                self.unify(&target_ty, &value_ty, &assign.location)?;
            }
            Statement::CompoundAssign(assign) => {
                let target_ty = self.infer_expression(&assign.target, None, ctx)?;
                self.require_mutable_target(&assign.target)?;
                if !target_ty.deref_alias().is_numeric()
                    && !matches!(target_ty.deref_alias(), TypeInfo::Generic(_))
                {
                    return Err(TypeCheckError::InvalidBinaryOperands {
                        operator: assign.op,
                        left: target_ty.clone(),
                        right: target_ty,
                        location: assign.location.clone(),
                    });
                }
                let value_ty = self.infer_expression(&assign.value, Some(&target_ty), ctx)?;
                self.unify(&target_ty, &value_ty, &assign.location)?;
            }
            Statement::Return(ret) => {
                let expected = self.current_return.clone();
                let found = match &ret.value {
                    Some(value) => self.infer_expression(value, Some(&expected), ctx)?,
                    None => TypeInfo::void(),
                };
                self.unify(&expected, &found, &ret.location)?;
            }
            Statement::Loop(loop_stmt) => {
                self.push_scope();
                let result = (|| {
                    if let Some(condition) = &loop_stmt.condition {
                        let cond_ty = self.infer_expression(condition, Some(&TypeInfo::bool()), ctx)?;
                        self.unify(&TypeInfo::bool(), &cond_ty, &condition.location())?;
                    }
                    if let Some(iterable) = &loop_stmt.iterable {
                        let element = self.iterable_element_type(iterable, ctx)?;
                        ctx.set_node_typeinfo(loop_stmt.id, element.clone());
                        if let Some(binder) = &loop_stmt.binder {
                            self.bind(
                                binder,
                                VarBinding {
                                    ty: element,
                                    mutable: false,
                                },
                            );
                        }
                    }
                    self.infer_block_parts(
                        &loop_stmt.body.statements,
                        loop_stmt.body.tail.as_ref(),
                        None,
                        ctx,
                    )
                })();
                self.pop_scope();
                result?;
            }
            Statement::Break(brk) => {
                if let Some(value) = &brk.value {
                    self.infer_expression(value, None, ctx)?;
                }
            }
            Statement::Continue(_) => {}
            Statement::Expression(expr) => {
                self.infer_expression(expr, None, ctx)?;
            }
        }
        Ok(())
    }

    fn iterable_element_type(
        &mut self,
        iterable: &Expression,
        ctx: &mut TypedContext,
    ) -> Result<TypeInfo, TypeCheckError> {
        let ty = self.infer_expression(iterable, None, ctx)?;
        if matches!(iterable, Expression::Range(_)) {
            return Ok(ty);
        }
        match ty.deref_alias() {
            TypeInfo::Array { element, .. } => Ok((**element).clone()),
            other => Err(TypeCheckError::TypeMismatch {
                expected: TypeInfo::Array {
                    element: Box::new(TypeInfo::default()),
                    size: None,
                },
                found: other.clone(),
                location: iterable.location(),
            }),
        }
    }

    fn require_mutable_target(&self, target: &Expression) -> Result<(), TypeCheckError> {
        let Some((name, location)) = Self::assignment_root(target) else {
            return Ok(());
        };
        match self.lookup(&name) {
            Some(binding) if binding.mutable => Ok(()),
            Some(_) => Err(TypeCheckError::ImmutableAssignment { name, location }),
            None => Err(TypeCheckError::UnknownIdentifier { name, location }),
        }
    }

    fn assignment_root(expr: &Expression) -> Option<(String, Location)> {
        match expr {
            Expression::Identifier(identifier) => {
                Some((identifier.name.clone(), identifier.location.clone()))
            }
            Expression::FieldAccess(access) => Self::assignment_root(&access.object),
            Expression::Index(index) => Self::assignment_root(&index.object),
            _ => None,
        }
    }

    // ---- expressions ----

    fn infer_expression(
        &mut self,
        expr: &Expression,
        expected: Option<&TypeInfo>,
        ctx: &mut TypedContext,
    ) -> Result<TypeInfo, TypeCheckError> {
        let ty = self.infer_expression_inner(expr, expected, ctx)?;
        ctx.set_node_typeinfo(expr.id(), ty.clone());
        Ok(ty)
    }

    #[allow(clippy::too_many_lines)]
    fn infer_expression_inner(
        &mut self,
        expr: &Expression,
        expected: Option<&TypeInfo>,
        ctx: &mut TypedContext,
    ) -> Result<TypeInfo, TypeCheckError> {
        match expr {
            Expression::Literal(literal) => self.infer_literal(literal, expected, ctx),
            Expression::Identifier(identifier) => {
                if let Some(binding) = self.lookup(&identifier.name) {
                    return Ok(binding.ty.clone());
                }
                if let Some(info) = ctx.symbol_table.function(&identifier.name) {
                    return Ok(TypeInfo::Function {
                        params: info.param_types.clone(),
                        ret: Box::new(info.return_type.clone()),
                    });
                }
                Err(TypeCheckError::UnknownIdentifier {
                    name: identifier.name.clone(),
                    location: identifier.location.clone(),
                })
            }
            Expression::Binary(binary) => {
                let left = self.infer_expression(&binary.left, None, ctx)?;
                let right = self.infer_expression(&binary.right, Some(&left), ctx)?;
                self.infer_binary(binary.op, &left, &right, &binary.location)
            }
            Expression::Unary(unary) => {
                let operand = self.infer_expression(&unary.operand, expected, ctx)?;
                match unary.op {
                    UnaryOp::Neg
                        if operand.is_numeric() || matches!(operand, TypeInfo::Generic(_)) =>
                    {
                        Ok(operand)
                    }
                    UnaryOp::Not if operand.is_bool() => Ok(operand),
                    _ => Err(TypeCheckError::InvalidUnaryOperand {
                        operator: unary.op,
                        operand,
                        location: unary.location.clone(),
                    }),
                }
            }
            Expression::Call(call) => self.infer_call(call, ctx),
            Expression::MethodCall(call) => self.infer_method_call(call, ctx),
            Expression::StaticCall(call) => self.infer_static_call(call, ctx),
            Expression::FieldAccess(access) => {
                let object_ty = self.infer_expression(&access.object, None, ctx)?;
                self.infer_field_access(&object_ty, &access.field, &access.location, ctx)
            }
            Expression::Index(index) => {
                let object_ty = self.infer_expression(&index.object, None, ctx)?;
                let index_ty = self.infer_expression(&index.index, Some(&TypeInfo::i32()), ctx)?;
                if !index_ty.is_integer() {
                    return Err(TypeCheckError::TypeMismatch {
                        expected: TypeInfo::i32(),
                        found: index_ty,
                        location: index.index.location(),
                    });
                }
                match object_ty.deref_alias() {
                    TypeInfo::Array { element, .. } => Ok((**element).clone()),
                    other => Err(TypeCheckError::TypeMismatch {
                        expected: TypeInfo::Array {
                            element: Box::new(TypeInfo::default()),
                            size: None,
                        },
                        found: other.clone(),
                        location: index.object.location(),
                    }),
                }
            }
            Expression::Array(array) => {
                let expected_element = expected.and_then(|e| match e.deref_alias() {
                    TypeInfo::Array { element, .. } => Some((**element).clone()),
                    _ => None,
                });
                let mut element_ty = expected_element;
                for element in &array.elements {
                    let ty = self.infer_expression(element, element_ty.as_ref(), ctx)?;
                    if let Some(previous) = &element_ty {
                        self.unify(previous, &ty, &element.location())?;
                    } else {
                        element_ty = Some(ty);
                    }
                }
                Ok(TypeInfo::Array {
                    element: Box::new(element_ty.unwrap_or_default()),
                    size: Some(u32::try_from(array.elements.len()).unwrap_or(u32::MAX)),
                })
            }
            Expression::Range(range) => {
                let start = self.infer_expression(&range.start, None, ctx)?;
                let end = self.infer_expression(&range.end, Some(&start), ctx)?;
                if !start.is_integer() {
                    return Err(TypeCheckError::TypeMismatch {
                        expected: TypeInfo::i32(),
                        found: start,
                        location: range.start.location(),
                    });
                }
                self.unify(&start, &end, &range.location)?;
                Ok(start)
            }
            Expression::StructInit(init) => self.infer_struct_init(init, ctx),
            Expression::If(if_expr) => {
                let cond = self.infer_expression(&if_expr.condition, Some(&TypeInfo::bool()), ctx)?;
                self.unify(&TypeInfo::bool(), &cond, &if_expr.condition.location())?;
                let then_ty = self.infer_block_parts(
                    &if_expr.then_branch.statements,
                    if_expr.then_branch.tail.as_ref(),
                    expected,
                    ctx,
                )?;
                ctx.set_node_typeinfo(if_expr.then_branch.id, then_ty.clone());
                match &if_expr.else_branch {
                    Some(else_branch) => {
                        let else_ty =
                            self.infer_expression(else_branch, Some(&then_ty), ctx)?;
                        self.unify(&then_ty, &else_ty, &else_branch.location())?;
                        Ok(then_ty)
                    }
                    None => Ok(TypeInfo::void()),
                }
            }
            Expression::Block(block) => self.infer_block_parts(
                &block.statements,
                block.tail.as_ref(),
                expected,
                ctx,
            ),
            Expression::Is(is_expr) => self.infer_is(is_expr, expected, ctx),
            Expression::Try(try_expr) => self.infer_try(try_expr, ctx),
            Expression::Cast(cast) => {
                let value_ty = self.infer_expression(&cast.value, None, ctx)?;
                let target = TypeInfo::from_type_expr(
                    &cast.target,
                    &self.current_type_params,
                    self.current_self.as_ref(),
                );
                let castable = |t: &TypeInfo| {
                    t.is_numeric()
                        || matches!(
                            t.deref_alias(),
                            TypeInfo::Primitive(Primitive::Bool | Primitive::Char)
                        )
                };
                if castable(&value_ty) && castable(&target) {
                    Ok(target)
                } else {
                    Err(TypeCheckError::TypeMismatch {
                        expected: target,
                        found: value_ty,
                        location: cast.location.clone(),
                    })
                }
            }
            Expression::Interp(interp) => {
                for segment in &interp.segments {
                    if let InterpSegment::Expr(segment_expr) = segment {
                        let ty = self.infer_expression(segment_expr, None, ctx)?;
                        let printable = ty.is_numeric()
                            || ty.is_bool()
                            || ty.is_string()
                            || matches!(
                                ty.deref_alias(),
                                TypeInfo::Primitive(Primitive::Char)
                            );
                        if !printable {
                            return Err(TypeCheckError::TypeMismatch {
                                expected: TypeInfo::string(),
                                found: ty,
                                location: segment_expr.location(),
                            });
                        }
                    }
                }
                Ok(TypeInfo::string())
            }
            Expression::Reference(reference) => {
                let inner = self.infer_expression(&reference.inner, None, ctx)?;
                Ok(TypeInfo::Pointer(Box::new(inner)))
            }
        }
    }

    fn infer_literal(
        &mut self,
        literal: &Literal,
        expected: Option<&TypeInfo>,
        _ctx: &mut TypedContext,
    ) -> Result<TypeInfo, TypeCheckError> {
        let ty = match literal {
            Literal::Int(int) => self.int_literal_type(int, expected)?,
            Literal::Float(_) => match expected.map(TypeInfo::deref_alias) {
                Some(TypeInfo::Primitive(Primitive::F32)) => TypeInfo::Primitive(Primitive::F32),
                _ => TypeInfo::Primitive(Primitive::F64),
            },
            Literal::Bool(_) => TypeInfo::bool(),
            Literal::Char(_) => TypeInfo::Primitive(Primitive::Char),
            Literal::Str(_) => TypeInfo::string(),
        };
        Ok(ty)
    }

    fn int_literal_type(
        &self,
        literal: &Rc<IntLiteral>,
        expected: Option<&TypeInfo>,
    ) -> Result<TypeInfo, TypeCheckError> {
        if let Some(suffix) = &literal.suffix {
            let primitive = suffix
                .parse::<Primitive>()
                .map_err(|()| TypeCheckError::UnknownType {
                    name: suffix.clone(),
                    location: literal.location.clone(),
                })?;
            return Ok(TypeInfo::Primitive(primitive));
        }
        let value = i128::from_str_radix(&literal.digits, literal.radix).unwrap_or(i128::MAX);
        if let Some(TypeInfo::Primitive(p)) = expected.map(TypeInfo::deref_alias) {
            if p.is_integer() && int_fits(value, *p) {
                return Ok(TypeInfo::Primitive(*p));
            }
            if p.is_float() {
                return Ok(TypeInfo::Primitive(*p));
            }
        }
        if int_fits(value, Primitive::I32) {
            return Ok(TypeInfo::i32());
        }
        Err(TypeCheckError::IntLiteralOutOfRange {
            literal: literal.digits.clone(),
            location: literal.location.clone(),
        })
    }

    fn infer_binary(
        &self,
        op: BinaryOp,
        left: &TypeInfo,
        right: &TypeInfo,
        location: &Location,
    ) -> Result<TypeInfo, TypeCheckError> {
        // References alias their pointee throughout the type system.
        let left = left.deref_alias();
        let right = right.deref_alias();
        let generic = matches!(left, TypeInfo::Generic(_)) || matches!(right, TypeInfo::Generic(_));
        if op.is_logical() {
            if (left.is_bool() && right.is_bool()) || generic {
                return Ok(TypeInfo::bool());
            }
        } else if op.is_comparison() {
            if (generic || matches!(left.deref_alias(), TypeInfo::Primitive(_)))
                && left.unifies_with(right)
            {
                return Ok(TypeInfo::bool());
            }
        } else {
            // Arithmetic: both operands numeric and of one type. Generic
            // operands are accepted; the instance check happens after
            // substitution in the body of each monomorphized copy.
            if generic && left.unifies_with(right) {
                return Ok(if matches!(left.deref_alias(), TypeInfo::Generic(_)) {
                    right.clone()
                } else {
                    left.clone()
                });
            }
            if left.is_numeric() && left.unifies_with(right) {
                return Ok(left.clone());
            }
        }
        Err(TypeCheckError::InvalidBinaryOperands {
            operator: op,
            left: left.clone(),
            right: right.clone(),
            location: location.clone(),
        })
    }

    fn infer_call(
        &mut self,
        call: &Rc<paw_ast::nodes::CallExpression>,
        ctx: &mut TypedContext,
    ) -> Result<TypeInfo, TypeCheckError> {
        let Expression::Identifier(callee) = &call.callee else {
            // Calls through arbitrary expressions require a function type.
            let callee_ty = self.infer_expression(&call.callee, None, ctx)?;
            let TypeInfo::Function { params, ret } = callee_ty.deref_alias().clone() else {
                return Err(TypeCheckError::UnknownFunction {
                    name: "<expression>".to_string(),
                    location: call.location.clone(),
                });
            };
            if params.len() != call.args.len() {
                return Err(TypeCheckError::ArityMismatch {
                    name: "<expression>".to_string(),
                    expected: params.len(),
                    found: call.args.len(),
                    location: call.location.clone(),
                });
            }
            for (param, arg) in params.iter().zip(&call.args) {
                let arg_ty = self.infer_expression(arg, Some(param), ctx)?;
                self.unify(param, &arg_ty, &arg.location())?;
            }
            return Ok((*ret).clone());
        };

        // Local function-typed bindings shadow global functions.
        if let Some(binding) = self.lookup(&callee.name).cloned() {
            if let TypeInfo::Function { params, ret } = binding.ty.deref_alias().clone() {
                ctx.set_node_typeinfo(callee.id, binding.ty.clone());
                if params.len() != call.args.len() {
                    return Err(TypeCheckError::ArityMismatch {
                        name: callee.name.clone(),
                        expected: params.len(),
                        found: call.args.len(),
                        location: call.location.clone(),
                    });
                }
                for (param, arg) in params.iter().zip(&call.args) {
                    let arg_ty = self.infer_expression(arg, Some(param), ctx)?;
                    self.unify(param, &arg_ty, &arg.location())?;
                }
                return Ok((*ret).clone());
            }
        }

        if let Some(info) = ctx.symbol_table.function(&callee.name).cloned() {
            return self.check_invocation(&info, &call.args, &FxHashMap::default(), &call.location, ctx);
        }

        if let Some(enum_info) = ctx.symbol_table.enum_of_variant(&callee.name).cloned() {
            return self.infer_variant_construction(&enum_info, &callee.name, &call.args, &call.location, ctx);
        }

        Err(TypeCheckError::UnknownFunction {
            name: callee.name.clone(),
            location: call.location.clone(),
        })
    }

    /// Checks argument arity and types against a signature, inferring
    /// generic bindings across the call site, and returns the substituted
    /// return type.
    fn check_invocation(
        &mut self,
        info: &FuncInfo,
        args: &[Expression],
        seed_bindings: &FxHashMap<String, TypeInfo>,
        location: &Location,
        ctx: &mut TypedContext,
    ) -> Result<TypeInfo, TypeCheckError> {
        if info.param_types.len() != args.len() {
            return Err(TypeCheckError::ArityMismatch {
                name: info.name.clone(),
                expected: info.param_types.len(),
                found: args.len(),
                location: location.clone(),
            });
        }
        let mut bindings = seed_bindings.clone();
        for (param_ty, arg) in info.param_types.iter().zip(args) {
            let hinted = param_ty.substitute(&bindings);
            let expected = if hinted.has_generics() {
                None
            } else {
                Some(hinted.clone())
            };
            let arg_ty = self.infer_expression(arg, expected.as_ref(), ctx)?;
            param_ty
                .bind_generics(&arg_ty, &mut bindings)
                .map_err(|(param, first, second)| TypeCheckError::GenericConflict {
                    param,
                    first,
                    second,
                    location: arg.location(),
                })?;
            let concrete_param = param_ty.substitute(&bindings);
            self.unify(&concrete_param, &arg_ty, &arg.location())?;
        }
        Ok(info.return_type.substitute(&bindings))
    }

    fn infer_variant_construction(
        &mut self,
        enum_info: &EnumInfo,
        variant_name: &str,
        args: &[Expression],
        location: &Location,
        ctx: &mut TypedContext,
    ) -> Result<TypeInfo, TypeCheckError> {
        let variant = enum_info
            .variant(variant_name)
            .ok_or_else(|| TypeCheckError::VariantNotFound {
                enum_name: enum_info.name.clone(),
                variant: variant_name.to_string(),
                location: location.clone(),
            })?
            .clone();
        if variant.payloads.len() != args.len() {
            return Err(TypeCheckError::ArityMismatch {
                name: variant_name.to_string(),
                expected: variant.payloads.len(),
                found: args.len(),
                location: location.clone(),
            });
        }
        let mut bindings = FxHashMap::default();
        for (payload_ty, arg) in variant.payloads.iter().zip(args) {
            let expected = if payload_ty.has_generics() {
                None
            } else {
                Some(payload_ty.clone())
            };
            let arg_ty = self.infer_expression(arg, expected.as_ref(), ctx)?;
            payload_ty
                .bind_generics(&arg_ty, &mut bindings)
                .map_err(|(param, first, second)| TypeCheckError::GenericConflict {
                    param,
                    first,
                    second,
                    location: arg.location(),
                })?;
            let concrete = payload_ty.substitute(&bindings);
            self.unify(&concrete, &arg_ty, &arg.location())?;
        }
        if enum_info.type_params.is_empty() {
            Ok(TypeInfo::Named(enum_info.name.clone()))
        } else {
            let args: Vec<TypeInfo> = enum_info
                .type_params
                .iter()
                .map(|p| {
                    bindings
                        .get(p)
                        .cloned()
                        .unwrap_or_else(|| TypeInfo::Generic(p.clone()))
                })
                .collect();
            Ok(TypeInfo::GenericInstance(enum_info.name.clone(), args))
        }
    }

    fn infer_method_call(
        &mut self,
        call: &Rc<paw_ast::nodes::MethodCallExpression>,
        ctx: &mut TypedContext,
    ) -> Result<TypeInfo, TypeCheckError> {
        let receiver_ty = self.infer_expression(&call.receiver, None, ctx)?;
        let resolved = ctx.symbol_table.resolve_alias(&receiver_ty);
        let Some(type_name) = resolved.nominal_name().map(str::to_string) else {
            return Err(TypeCheckError::MethodNotFound {
                type_name: resolved.to_string(),
                method: call.method.clone(),
                location: call.location.clone(),
            });
        };
        let (method, owner_params) =
            self.lookup_method(&type_name, &call.method, &call.location, ctx)?;
        if !method.has_self {
            return Err(TypeCheckError::MethodNotFound {
                type_name,
                method: call.method.clone(),
                location: call.location.clone(),
            });
        }
        let mut bindings = FxHashMap::default();
        for (param, arg) in owner_params.iter().zip(resolved.type_args()) {
            bindings.insert(param.clone(), arg.clone());
        }
        self.check_invocation(&method.signature, &call.args, &bindings, &call.location, ctx)
    }

    fn infer_static_call(
        &mut self,
        call: &Rc<paw_ast::nodes::StaticCallExpression>,
        ctx: &mut TypedContext,
    ) -> Result<TypeInfo, TypeCheckError> {
        let (method, owner_params) =
            self.lookup_method(&call.type_name, &call.method, &call.location, ctx)?;
        if method.has_self {
            return Err(TypeCheckError::InstanceMethodCalledAsAssociated {
                type_name: call.type_name.clone(),
                method: call.method.clone(),
                location: call.location.clone(),
            });
        }
        let explicit: Vec<TypeInfo> = call
            .type_args
            .iter()
            .map(|t| {
                TypeInfo::from_type_expr(t, &self.current_type_params, self.current_self.as_ref())
            })
            .collect();
        if !explicit.is_empty() && explicit.len() != owner_params.len() {
            return Err(TypeCheckError::ArityMismatch {
                name: call.type_name.clone(),
                expected: owner_params.len(),
                found: explicit.len(),
                location: call.location.clone(),
            });
        }
        let mut bindings = FxHashMap::default();
        for (param, arg) in owner_params.iter().zip(&explicit) {
            bindings.insert(param.clone(), arg.clone());
        }
        self.check_invocation(&method.signature, &call.args, &bindings, &call.location, ctx)
    }

    fn lookup_method(
        &self,
        type_name: &str,
        method: &str,
        location: &Location,
        ctx: &TypedContext,
    ) -> Result<(MethodInfo, Vec<String>), TypeCheckError> {
        if let Some(info) = ctx.symbol_table.struct_info(type_name) {
            if let Some(found) = info.method(method) {
                return Ok((found.clone(), info.type_params.clone()));
            }
        }
        if let Some(info) = ctx.symbol_table.enum_info(type_name) {
            if let Some(found) = info.method(method) {
                return Ok((found.clone(), info.type_params.clone()));
            }
        }
        if !ctx.symbol_table.is_type_name(type_name) {
            return Err(TypeCheckError::UnknownType {
                name: type_name.to_string(),
                location: location.clone(),
            });
        }
        Err(TypeCheckError::MethodNotFound {
            type_name: type_name.to_string(),
            method: method.to_string(),
            location: location.clone(),
        })
    }

    fn infer_field_access(
        &mut self,
        object_ty: &TypeInfo,
        field: &str,
        location: &Location,
        ctx: &mut TypedContext,
    ) -> Result<TypeInfo, TypeCheckError> {
        let resolved = ctx.symbol_table.resolve_alias(object_ty);
        let Some(type_name) = resolved.nominal_name().map(str::to_string) else {
            return Err(TypeCheckError::UnknownField {
                type_name: resolved.to_string(),
                field: field.to_string(),
                location: location.clone(),
            });
        };
        let Some(info) = ctx.symbol_table.struct_info(&type_name) else {
            return Err(TypeCheckError::UnknownField {
                type_name,
                field: field.to_string(),
                location: location.clone(),
            });
        };
        let Some(field_info) = info.field(field) else {
            return Err(TypeCheckError::UnknownField {
                type_name,
                field: field.to_string(),
                location: location.clone(),
            });
        };
        let mut bindings = FxHashMap::default();
        for (param, arg) in info.type_params.iter().zip(resolved.type_args()) {
            bindings.insert(param.clone(), arg.clone());
        }
        Ok(field_info.ty.substitute(&bindings))
    }

    fn infer_struct_init(
        &mut self,
        init: &Rc<paw_ast::nodes::StructInitExpression>,
        ctx: &mut TypedContext,
    ) -> Result<TypeInfo, TypeCheckError> {
        let Some(info) = ctx.symbol_table.struct_info(&init.type_name).cloned() else {
            return Err(TypeCheckError::UnknownType {
                name: init.type_name.clone(),
                location: init.location.clone(),
            });
        };
        for (field_name, _) in &init.fields {
            if info.field(field_name).is_none() {
                return Err(TypeCheckError::UnknownField {
                    type_name: info.name.clone(),
                    field: field_name.clone(),
                    location: init.location.clone(),
                });
            }
        }
        let mut bindings: FxHashMap<String, TypeInfo> = FxHashMap::default();
        for declared in &info.fields {
            let Some((_, value)) = init.fields.iter().find(|(n, _)| n == &declared.name) else {
                return Err(TypeCheckError::MissingField {
                    type_name: info.name.clone(),
                    field: declared.name.clone(),
                    location: init.location.clone(),
                });
            };
            let hinted = declared.ty.substitute(&bindings);
            let expected = if hinted.has_generics() {
                None
            } else {
                Some(hinted)
            };
            let value_ty = self.infer_expression(value, expected.as_ref(), ctx)?;
            declared
                .ty
                .bind_generics(&value_ty, &mut bindings)
                .map_err(|(param, first, second)| TypeCheckError::GenericConflict {
                    param,
                    first,
                    second,
                    location: value.location(),
                })?;
            let concrete = declared.ty.substitute(&bindings);
            self.unify(&concrete, &value_ty, &value.location())?;
        }
        if info.type_params.is_empty() {
            return Ok(TypeInfo::Named(info.name.clone()));
        }
        let mut args = Vec::new();
        for param in &info.type_params {
            match bindings.get(param) {
                Some(bound) => args.push(bound.clone()),
                None if self.current_type_params.contains(param) => {
                    args.push(TypeInfo::Generic(param.clone()));
                }
                None => {
                    return Err(TypeCheckError::GenericConflict {
                        param: param.clone(),
                        first: TypeInfo::default(),
                        second: TypeInfo::default(),
                        location: init.location.clone(),
                    });
                }
            }
        }
        Ok(TypeInfo::GenericInstance(info.name.clone(), args))
    }

    fn infer_is(
        &mut self,
        is_expr: &Rc<paw_ast::nodes::IsExpression>,
        expected: Option<&TypeInfo>,
        ctx: &mut TypedContext,
    ) -> Result<TypeInfo, TypeCheckError> {
        let scrutinee_ty = self.infer_expression(&is_expr.scrutinee, None, ctx)?;
        let resolved = ctx.symbol_table.resolve_alias(&scrutinee_ty);
        let mut result: Option<TypeInfo> = expected.cloned();

        for arm in &is_expr.arms {
            self.push_scope();
            let arm_result = (|| {
                self.bind_pattern(&arm.pattern, &resolved, &arm.location, ctx)?;
                if let Some(guard) = &arm.guard {
                    let guard_ty = self.infer_expression(guard, Some(&TypeInfo::bool()), ctx)?;
                    self.unify(&TypeInfo::bool(), &guard_ty, &guard.location())?;
                }
                let body_ty = self.infer_expression(&arm.body, result.as_ref(), ctx)?;
                if let Some(previous) = &result {
                    self.unify(previous, &body_ty, &arm.body.location())?;
                } else {
                    result = Some(body_ty);
                }
                Ok(())
            })();
            self.pop_scope();
            arm_result?;
        }
        Ok(result.unwrap_or_default())
    }

    fn bind_pattern(
        &mut self,
        pattern: &Pattern,
        scrutinee: &TypeInfo,
        location: &Location,
        ctx: &mut TypedContext,
    ) -> Result<(), TypeCheckError> {
        match pattern {
            Pattern::Wildcard => Ok(()),
            Pattern::Binding(name) => {
                self.bind(
                    name,
                    VarBinding {
                        ty: scrutinee.clone(),
                        mutable: false,
                    },
                );
                Ok(())
            }
            Pattern::Literal(literal) => {
                let lit_ty = self.infer_literal(literal, Some(scrutinee), ctx)?;
                ctx.set_node_typeinfo(literal.id(), lit_ty.clone());
                self.unify(scrutinee, &lit_ty, location)
            }
            Pattern::Variant { name, binders } => {
                let Some(enum_name) = scrutinee.nominal_name().map(str::to_string) else {
                    return Err(TypeCheckError::VariantNotFound {
                        enum_name: scrutinee.to_string(),
                        variant: name.clone(),
                        location: location.clone(),
                    });
                };
                let Some(enum_info) = ctx.symbol_table.enum_info(&enum_name).cloned() else {
                    return Err(TypeCheckError::VariantNotFound {
                        enum_name,
                        variant: name.clone(),
                        location: location.clone(),
                    });
                };
                let Some(variant) = enum_info.variant(name).cloned() else {
                    return Err(TypeCheckError::VariantNotFound {
                        enum_name,
                        variant: name.clone(),
                        location: location.clone(),
                    });
                };
                if variant.payloads.len() != binders.len() {
                    return Err(TypeCheckError::ArityMismatch {
                        name: name.clone(),
                        expected: variant.payloads.len(),
                        found: binders.len(),
                        location: location.clone(),
                    });
                }
                let mut bindings = FxHashMap::default();
                for (param, arg) in enum_info.type_params.iter().zip(scrutinee.type_args()) {
                    bindings.insert(param.clone(), arg.clone());
                }
                for (binder, payload) in binders.iter().zip(&variant.payloads) {
                    if binder == "_" {
                        continue;
                    }
                    self.bind(
                        binder,
                        VarBinding {
                            ty: payload.substitute(&bindings),
                            mutable: false,
                        },
                    );
                }
                Ok(())
            }
        }
    }

    fn infer_try(
        &mut self,
        try_expr: &Rc<paw_ast::nodes::TryExpression>,
        ctx: &mut TypedContext,
    ) -> Result<TypeInfo, TypeCheckError> {
        let inner_ty = self.infer_expression(&try_expr.inner, None, ctx)?;
        let resolved = ctx.symbol_table.resolve_alias(&inner_ty);
        let Some(enum_name) = resolved.nominal_name().map(str::to_string) else {
            return Err(TypeCheckError::InvalidTryOperand {
                found: resolved,
                location: try_expr.location.clone(),
            });
        };
        let Some(enum_info) = ctx.symbol_table.enum_info(&enum_name).cloned() else {
            return Err(TypeCheckError::InvalidTryOperand {
                found: resolved,
                location: try_expr.location.clone(),
            });
        };
        let Some(ok_variant) = enum_info.variant("Ok").cloned() else {
            return Err(TypeCheckError::InvalidTryOperand {
                found: resolved,
                location: try_expr.location.clone(),
            });
        };
        if enum_info.variant("Err").is_none() || ok_variant.payloads.len() != 1 {
            return Err(TypeCheckError::InvalidTryOperand {
                found: resolved,
                location: try_expr.location.clone(),
            });
        }
        // The early return re-raises the whole result value, so the
        // enclosing function must return the same enum.
        self.unify(&self.current_return.clone(), &resolved, &try_expr.location)?;
        let mut bindings = FxHashMap::default();
        for (param, arg) in enum_info.type_params.iter().zip(resolved.type_args()) {
            bindings.insert(param.clone(), arg.clone());
        }
        Ok(ok_variant.payloads[0].substitute(&bindings))
    }

    // ---- helpers ----

    fn unify(
        &self,
        expected: &TypeInfo,
        found: &TypeInfo,
        location: &Location,
    ) -> Result<(), TypeCheckError> {
        if expected.unifies_with(found) {
            Ok(())
        } else {
            Err(TypeCheckError::TypeMismatch {
                expected: expected.clone(),
                found: found.clone(),
                location: location.clone(),
            })
        }
    }
}

/// Range check for unsuffixed integer literals.
fn int_fits(value: i128, primitive: Primitive) -> bool {
    match primitive {
        Primitive::I8 => i8::try_from(value).is_ok(),
        Primitive::I16 => i16::try_from(value).is_ok(),
        Primitive::I32 => i32::try_from(value).is_ok(),
        Primitive::I64 => i64::try_from(value).is_ok(),
        Primitive::I128 => true,
        Primitive::U8 => u8::try_from(value).is_ok(),
        Primitive::U16 => u16::try_from(value).is_ok(),
        Primitive::U32 => u32::try_from(value).is_ok(),
        Primitive::U64 => u64::try_from(value).is_ok(),
        Primitive::U128 => u128::try_from(value).is_ok(),
        _ => false,
    }
}
