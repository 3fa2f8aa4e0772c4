//! LLVM IR generation through the inkwell binding.
//!
//! The compiler keeps the LLVM context, module and builder for the whole
//! run. Per-function state (variable slots, the loop-context stack, generic
//! bindings) lives in `RefCell`s so the visitor methods can share `&self`.
//!
//! Value representation rules:
//! - SSA values use `i1` for `bool`; memory slots, aggregate fields and
//!   function ABI boundaries use `i8`. `coerce_to_memory` /
//!   `coerce_from_memory` convert at the seams.
//! - every local (parameter or `let`) gets an `alloca` slot in the entry
//!   sequence and is read through `load`, which is what makes source-level
//!   reassignment legal under SSA.
//! - enums are `{ i32, [32 x i8] }`; constructors store the tag, then the
//!   payload fields through a pointer into the buffer, and return the
//!   struct by value. Pattern matches compare the tag with `icmp eq` and
//!   branch to a per-variant block that loads the binders.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use inkwell::AddressSpace;
use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, StructType};
use inkwell::values::{
    BasicMetadataValueEnum, BasicValue, BasicValueEnum, FunctionValue, PointerValue,
};
use inkwell::{FloatPredicate, IntPredicate};

use paw_ast::nodes::{
    BinaryOp, BlockExpression, Expression, FunctionDecl, InterpSegment, IsExpression, Literal,
    LoopStatement, Pattern, Statement, TypeDeclKind, UnaryOp,
};
use paw_mono::mangle::{mangle, mangle_type};
use paw_mono::{MonoDatabase, function_worklist, infer_call_type_args};
use paw_type_checker::symbol_table::{EnumInfo, VariantInfo};
use paw_type_checker::type_info::{Primitive, TypeInfo};
use paw_type_checker::typed_context::TypedContext;
use rustc_hash::FxHashMap;

use crate::CodegenError;

/// Payload buffer size of every lowered enum, in bytes.
const ENUM_PAYLOAD_BYTES: u32 = 32;

type CompiledValue<'ctx> = Option<BasicValueEnum<'ctx>>;

pub(crate) struct Compiler<'a, 'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    ctx: &'a TypedContext,
    db: &'a MonoDatabase,

    /// Registered struct/enum types by (mangled) name.
    struct_types: RefCell<FxHashMap<String, StructType<'ctx>>>,
    /// Variable slots of the function being emitted: name -> (alloca,
    /// semantic type).
    variables: RefCell<FxHashMap<String, (PointerValue<'ctx>, TypeInfo)>>,
    /// The `self` pointer parameter inside method bodies.
    self_param: RefCell<Option<(PointerValue<'ctx>, TypeInfo)>>,
    /// (continue target, break target) per enclosing loop.
    loop_stack: RefCell<Vec<(BasicBlock<'ctx>, BasicBlock<'ctx>)>>,
    /// Generic substitutions of the instance being emitted.
    bindings: RefCell<FxHashMap<String, TypeInfo>>,
    /// Type parameter names in scope in the current function.
    type_params: RefCell<Vec<String>>,
    current_fn: RefCell<Option<FunctionValue<'ctx>>>,
    current_return: RefCell<TypeInfo>,
    tmp: Cell<u32>,
}

impl<'a, 'ctx> Compiler<'a, 'ctx> {
    pub(crate) fn new(
        context: &'ctx Context,
        module_name: &str,
        ctx: &'a TypedContext,
        db: &'a MonoDatabase,
    ) -> Self {
        let module = context.create_module(module_name);
        let builder = context.create_builder();
        Self {
            context,
            module,
            builder,
            ctx,
            db,
            struct_types: RefCell::new(FxHashMap::default()),
            variables: RefCell::new(FxHashMap::default()),
            self_param: RefCell::new(None),
            loop_stack: RefCell::new(Vec::new()),
            bindings: RefCell::new(FxHashMap::default()),
            type_params: RefCell::new(Vec::new()),
            current_fn: RefCell::new(None),
            current_return: RefCell::new(TypeInfo::void()),
            tmp: Cell::new(0),
        }
    }

    pub(crate) fn print_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    fn fresh_name(&self, base: &str) -> String {
        let n = self.tmp.get() + 1;
        self.tmp.set(n);
        format!("{base}{n}")
    }

    // ---- program assembly ----

    pub(crate) fn emit_program(&self) -> Result<(), CodegenError> {
        self.register_types()?;
        self.emit_enum_constructors();

        let work = function_worklist(self.ctx, self.db);
        for item in &work {
            self.declare_function(&item.decl, item.owner.as_deref(), &item.mangled, &item.bindings);
        }
        for item in &work {
            self.emit_function(&item.decl, item.owner.as_deref(), &item.mangled, &item.bindings)?;
        }
        Ok(())
    }

    /// Registers every struct and enum layout: non-generic declarations in
    /// source order plus one layout per database instance. Opaque types are
    /// created first so bodies may reference each other.
    fn register_types(&self) -> Result<(), CodegenError> {
        let mut layouts: Vec<(String, String, FxHashMap<String, TypeInfo>)> = Vec::new();
        for decl in self.ctx.type_declarations() {
            if decl.is_generic() {
                continue;
            }
            if matches!(
                decl.kind,
                TypeDeclKind::Struct { .. } | TypeDeclKind::Enum { .. }
            ) {
                layouts.push((decl.name(), decl.name(), FxHashMap::default()));
            }
        }
        for instance in self.db.struct_instances() {
            let params = self.owner_type_params(&instance.name);
            let bindings: FxHashMap<String, TypeInfo> = params
                .into_iter()
                .zip(instance.type_args.iter().cloned())
                .collect();
            layouts.push((instance.mangled.clone(), instance.name.clone(), bindings));
        }

        for (llvm_name, _, _) in &layouts {
            let ty = self.context.opaque_struct_type(llvm_name);
            self.struct_types.borrow_mut().insert(llvm_name.clone(), ty);
        }
        for (llvm_name, source_name, bindings) in &layouts {
            let ty = self.struct_types.borrow()[llvm_name];
            if let Some(info) = self.ctx.symbols().struct_info(source_name) {
                let fields: Vec<BasicTypeEnum> = info
                    .fields
                    .iter()
                    .map(|f| self.llvm_type(&f.ty.substitute(bindings)))
                    .collect();
                ty.set_body(&fields, false);
            } else if let Some(info) = self.ctx.symbols().enum_info(source_name) {
                for variant in &info.variants {
                    let size: u32 = variant
                        .payloads
                        .iter()
                        .map(|p| self.size_of(&p.substitute(bindings)))
                        .sum();
                    if size > ENUM_PAYLOAD_BYTES {
                        return Err(CodegenError::UnsupportedConstruct {
                            name: format!(
                                "enum variant `{}::{}` payload exceeds {ENUM_PAYLOAD_BYTES} bytes",
                                source_name, variant.name
                            ),
                            location: paw_ast::nodes::Location::default(),
                        });
                    }
                }
                ty.set_body(
                    &[
                        self.context.i32_type().into(),
                        self.context
                            .i8_type()
                            .array_type(ENUM_PAYLOAD_BYTES)
                            .into(),
                    ],
                    false,
                );
            }
        }
        Ok(())
    }

    /// One constructor per enum variant: allocate the enum struct, store
    /// the tag, store the payload fields through the buffer pointer, and
    /// return the struct by value.
    fn emit_enum_constructors(&self) {
        let mut enum_layouts: Vec<(String, EnumInfo, FxHashMap<String, TypeInfo>)> = Vec::new();
        for decl in self.ctx.type_declarations() {
            if decl.is_generic() || !matches!(decl.kind, TypeDeclKind::Enum { .. }) {
                continue;
            }
            if let Some(info) = self.ctx.symbols().enum_info(&decl.name()) {
                enum_layouts.push((decl.name(), info.clone(), FxHashMap::default()));
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
            enum_layouts.push((instance.mangled.clone(), info.clone(), bindings));
        }

        for (llvm_name, info, bindings) in &enum_layouts {
            let enum_ty = self.struct_types.borrow()[llvm_name];
            for variant in &info.variants {
                let payloads: Vec<TypeInfo> = variant
                    .payloads
                    .iter()
                    .map(|p| p.substitute(bindings))
                    .collect();
                self.emit_enum_constructor(llvm_name, enum_ty, variant, &payloads);
            }
        }
    }

    fn emit_enum_constructor(
        &self,
        enum_name: &str,
        enum_ty: StructType<'ctx>,
        variant: &VariantInfo,
        payloads: &[TypeInfo],
    ) {
        let param_types: Vec<BasicMetadataTypeEnum> = payloads
            .iter()
            .map(|p| BasicMetadataTypeEnum::from(self.llvm_type(p)))
            .collect();
        let fn_ty = enum_ty.fn_type(&param_types, false);
        let function = self
            .module
            .add_function(&format!("{enum_name}_{}", variant.name), fn_ty, None);
        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        let slot = self
            .builder
            .build_alloca(enum_ty, "enum.addr")
            .expect("alloca for enum constructor");
        let tag_ptr = self
            .builder
            .build_struct_gep(slot, 0, "tag.ptr")
            .expect("tag field pointer");
        let tag = self
            .context
            .i32_type()
            .const_int(variant.tag as u64, false);
        self.builder.build_store(tag_ptr, tag).expect("store tag");

        if !payloads.is_empty() {
            let data_ptr = self
                .builder
                .build_struct_gep(slot, 1, "data.ptr")
                .expect("payload buffer pointer");
            let _payload_ty = self.payload_struct_type(payloads);
            for (index, _) in payloads.iter().enumerate() {
                let field_ptr = self
                    .builder
                    .build_struct_gep(
                        data_ptr,
                        u32::try_from(index).expect("payload index fits u32"),
                        "payload.ptr",
                    )
                    .expect("payload field pointer");
                let arg = function
                    .get_nth_param(u32::try_from(index).expect("payload index fits u32"))
                    .expect("constructor parameter");
                self.builder.build_store(field_ptr, arg).expect("store payload");
            }
        }
        let value = self
            .builder
            .build_load(slot, "enum.value")
            .expect("load constructed enum");
        self.builder.build_return(Some(&value)).expect("return enum");
    }

    fn payload_struct_type(&self, payloads: &[TypeInfo]) -> StructType<'ctx> {
        let fields: Vec<BasicTypeEnum> = payloads.iter().map(|p| self.llvm_type(p)).collect();
        self.context.struct_type(&fields, false)
    }

    // ---- type mapping ----

    /// The LLVM type of a semantic type in memory and aggregate positions
    /// (`bool` is `i8` here; it is `i1` only as an SSA value).
    fn llvm_type(&self, ty: &TypeInfo) -> BasicTypeEnum<'ctx> {
        let resolved = self.ctx.symbols().resolve_alias(ty);
        match &resolved {
            TypeInfo::Primitive(p) => match p {
                Primitive::I8 | Primitive::U8 | Primitive::Char | Primitive::Bool => {
                    self.context.i8_type().into()
                }
                Primitive::I16 | Primitive::U16 => self.context.i16_type().into(),
                Primitive::I32 | Primitive::U32 => self.context.i32_type().into(),
                Primitive::I64 | Primitive::U64 => self.context.i64_type().into(),
                Primitive::I128 | Primitive::U128 => {
                    self.context.custom_width_int_type(128).into()
                }
                Primitive::F32 => self.context.f32_type().into(),
                Primitive::F64 => self.context.f64_type().into(),
                Primitive::Str | Primitive::Void => {
                    self.context.i8_type().ptr_type(AddressSpace::default()).into()
                }
            },
            TypeInfo::Named(name) => self
                .struct_types
                .borrow()
                .get(name)
                .copied()
                .map_or_else(|| self.context.i32_type().into(), Into::into),
            TypeInfo::GenericInstance(..) => {
                let mangled = mangle_type(&resolved);
                self.struct_types
                    .borrow()
                    .get(&mangled)
                    .copied()
                    .map_or_else(|| self.context.i32_type().into(), Into::into)
            }
            TypeInfo::Pointer(_) | TypeInfo::Function { .. } => {
                self.context.i8_type().ptr_type(AddressSpace::default()).into()
            }
            TypeInfo::Array { element, size } => {
                let element = self.llvm_type(element);
                element.array_type(size.unwrap_or(0)).into()
            }
            TypeInfo::Generic(_) => self.context.i32_type().into(),
        }
    }

    /// Approximate unpadded byte size, used for the 32-byte enum payload
    /// limit.
    fn size_of(&self, ty: &TypeInfo) -> u32 {
        let resolved = self.ctx.symbols().resolve_alias(ty);
        match &resolved {
            TypeInfo::Primitive(p) => p.bit_width().map_or(8, |bits| bits / 8),
            TypeInfo::Pointer(_) | TypeInfo::Function { .. } => 8,
            TypeInfo::Array { element, size } => self.size_of(element) * size.unwrap_or(0),
            TypeInfo::Named(name) | TypeInfo::GenericInstance(name, _) => {
                let args = resolved.type_args().to_vec();
                if let Some(info) = self.ctx.symbols().struct_info(name) {
                    let bindings: FxHashMap<String, TypeInfo> = info
                        .type_params
                        .iter()
                        .cloned()
                        .zip(args)
                        .collect();
                    info.fields
                        .iter()
                        .map(|f| self.size_of(&f.ty.substitute(&bindings)))
                        .sum()
                } else if self.ctx.symbols().enum_info(name).is_some() {
                    4 + ENUM_PAYLOAD_BYTES
                } else {
                    8
                }
            }
            TypeInfo::Generic(_) => 0,
        }
    }

    /// Narrowing from memory/ABI representation to SSA: `bool` loads as
    /// `i8` and is truncated to `i1`.
    fn coerce_from_memory(&self, value: BasicValueEnum<'ctx>, ty: &TypeInfo) -> BasicValueEnum<'ctx> {
        if ty.is_bool() {
            return self
                .builder
                .build_int_truncate(value.into_int_value(), self.context.bool_type(), "tobool")
                .expect("bool truncation")
                .into();
        }
        value
    }

    /// Widening from SSA to memory/ABI representation: `i1` stores as `i8`.
    fn coerce_to_memory(&self, value: BasicValueEnum<'ctx>, ty: &TypeInfo) -> BasicValueEnum<'ctx> {
        if ty.is_bool() && value.is_int_value() && value.into_int_value().get_type().get_bit_width() == 1
        {
            return self
                .builder
                .build_int_z_extend(value.into_int_value(), self.context.i8_type(), "frombool")
                .expect("bool extension")
                .into();
        }
        value
    }

    fn ty_of(&self, node_id: u32) -> TypeInfo {
        let ty = self
            .ctx
            .node_type_or_void(node_id)
            .substitute(&self.bindings.borrow());
        self.ctx.symbols().resolve_alias_deep(&ty)
    }

    // ---- function emission ----

    fn signature_types(
        &self,
        decl: &FunctionDecl,
        bindings: &FxHashMap<String, TypeInfo>,
    ) -> (Vec<TypeInfo>, TypeInfo) {
        let mut type_params: Vec<String> =
            decl.type_params.iter().map(|p| p.name.clone()).collect();
        for key in bindings.keys() {
            if !type_params.contains(key) {
                type_params.push(key.clone());
            }
        }
        let params: Vec<TypeInfo> = decl
            .params
            .iter()
            .filter(|p| !p.is_self)
            .map(|p| {
                let ty = p
                    .ty
                    .as_ref()
                    .map(|t| TypeInfo::from_type_expr(t, &type_params, None).substitute(bindings))
                    .unwrap_or_default();
                self.ctx.symbols().resolve_alias_deep(&ty)
            })
            .collect();
        let ret = decl
            .return_type
            .as_ref()
            .map(|t| TypeInfo::from_type_expr(t, &type_params, None).substitute(bindings))
            .unwrap_or_default();
        let ret = self.ctx.symbols().resolve_alias_deep(&ret);
        (params, ret)
    }

    fn declare_function(
        &self,
        decl: &Rc<FunctionDecl>,
        owner: Option<&str>,
        mangled: &str,
        bindings: &FxHashMap<String, TypeInfo>,
    ) {
        let (params, ret) = self.signature_types(decl, bindings);
        let mut param_types: Vec<BasicMetadataTypeEnum> = Vec::new();
        if owner.is_some() && decl.has_self() {
            param_types.push(self.context.i8_type().ptr_type(AddressSpace::default()).into());
        }
        for param in &params {
            param_types.push(self.llvm_type(param).into());
        }
        let fn_ty = if ret.is_void() {
            self.context.void_type().fn_type(&param_types, false)
        } else {
            self.llvm_type(&ret).fn_type(&param_types, false)
        };
        self.module.add_function(mangled, fn_ty, None);
    }

    fn emit_function(
        &self,
        decl: &Rc<FunctionDecl>,
        owner: Option<&str>,
        mangled: &str,
        bindings: &FxHashMap<String, TypeInfo>,
    ) -> Result<(), CodegenError> {
        let function = self
            .module
            .get_function(mangled)
            .expect("function was declared");
        let (param_infos, ret) = self.signature_types(decl, bindings);

        *self.bindings.borrow_mut() = bindings.clone();
        let mut type_params: Vec<String> =
            decl.type_params.iter().map(|p| p.name.clone()).collect();
        for key in bindings.keys() {
            if !type_params.contains(key) {
                type_params.push(key.clone());
            }
        }
        *self.type_params.borrow_mut() = type_params;
        *self.current_fn.borrow_mut() = Some(function);
        *self.current_return.borrow_mut() = ret.clone();
        self.variables.borrow_mut().clear();
        *self.self_param.borrow_mut() = None;

        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        let mut param_index = 0u32;
        if let (Some(owner_name), true) = (owner, decl.has_self()) {
            let self_ptr = function
                .get_nth_param(0)
                .expect("self parameter")
                .into_pointer_value();
            let owner_ty = self.owner_type_info(owner_name);
            *self.self_param.borrow_mut() = Some((self_ptr, owner_ty));
            param_index = 1;
        }
        for (param, ty) in decl.params.iter().filter(|p| !p.is_self).zip(&param_infos) {
            let value = function
                .get_nth_param(param_index)
                .expect("declared parameter");
            param_index += 1;
            let slot = self
                .builder
                .build_alloca(self.llvm_type(ty), &format!("{}.addr", param.name))
                .expect("parameter slot");
            self.builder.build_store(slot, value).expect("spill parameter");
            self.variables
                .borrow_mut()
                .insert(param.name.clone(), (slot, ty.clone()));
        }

        self.emit_block_body(&decl.body, &ret)?;

        let block = self
            .builder
            .get_insert_block()
            .expect("builder is positioned");
        if block.get_terminator().is_none() {
            if ret.is_void() {
                self.builder.build_return(None).expect("implicit void return");
            } else {
                self.builder.build_unreachable().expect("unreachable tail");
            }
        }
        Ok(())
    }

    /// The semantic type behind a mangled owner name.
    fn owner_type_info(&self, owner_mangled: &str) -> TypeInfo {
        for instance in self.db.struct_instances() {
            if instance.mangled == owner_mangled {
                return TypeInfo::GenericInstance(
                    instance.name.clone(),
                    instance.type_args.clone(),
                );
            }
        }
        TypeInfo::Named(owner_mangled.to_string())
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

    /// Emits a function body block: statements, then either `ret <tail>` or
    /// the fallthrough handled by the caller.
    fn emit_block_body(
        &self,
        block: &Rc<BlockExpression>,
        ret: &TypeInfo,
    ) -> Result<(), CodegenError> {
        for statement in &block.statements {
            if self.block_terminated() {
                return Ok(());
            }
            self.emit_statement(statement)?;
        }
        if self.block_terminated() {
            return Ok(());
        }
        if let Some(tail) = &block.tail {
            let value = self.emit_expression(tail)?;
            if self.block_terminated() {
                return Ok(());
            }
            if ret.is_void() {
                self.builder.build_return(None).expect("void return");
            } else if let Some(value) = value {
                let value = self.coerce_to_memory(value, ret);
                self.builder.build_return(Some(&value)).expect("tail return");
            } else {
                // Every path through the tail already returned.
                self.builder.build_unreachable().expect("diverged tail");
            }
        }
        Ok(())
    }

    fn block_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .is_some_and(|b| b.get_terminator().is_some())
    }

    // ---- statements ----

    fn emit_statement(&self, statement: &Statement) -> Result<(), CodegenError> {
        match statement {
            Statement::Let(let_stmt) => {
                let ty = self.ty_of(let_stmt.id);
                if ty.is_void() {
                    if let Some(value) = &let_stmt.value {
                        self.emit_expression(value)?;
                    }
                    return Ok(());
                }
                let slot = self
                    .builder
                    .build_alloca(self.llvm_type(&ty), &format!("{}.addr", let_stmt.name))
                    .expect("local slot");
                if let Some(value) = &let_stmt.value {
                    if let Some(value) = self.emit_expression(value)? {
                        let value = self.coerce_to_memory(value, &ty);
                        self.builder.build_store(slot, value).expect("init local");
                    }
                }
                self.variables
                    .borrow_mut()
                    .insert(let_stmt.name.clone(), (slot, ty));
            }
            Statement::Assign(assign) => {
                let value = self
                    .emit_expression(&assign.value)?
                    .expect("assigned value");
                let (ptr, ty) = self.lvalue_pointer(&assign.target)?;
                let value = self.coerce_to_memory(value, &ty);
                self.builder.build_store(ptr, value).expect("store assignment");
            }
            Statement::CompoundAssign(assign) => {
                let (ptr, ty) = self.lvalue_pointer(&assign.target)?;
                let current = self
                    .builder
                    .build_load(ptr, "load.compound")
                    .expect("load for compound assignment");
                let current = self.coerce_from_memory(current, &ty);
                let rhs = self
                    .emit_expression(&assign.value)?
                    .expect("compound value");
                let combined = self.emit_binary_op(assign.op, current, rhs, &ty);
                let combined = self.coerce_to_memory(combined, &ty);
                self.builder
                    .build_store(ptr, combined)
                    .expect("store compound assignment");
            }
            Statement::Return(ret) => {
                let expected = self.current_return.borrow().clone();
                match &ret.value {
                    Some(value) => {
                        let value = self.emit_expression(value)?;
                        if self.block_terminated() {
                            return Ok(());
                        }
                        if expected.is_void() {
                            self.builder.build_return(None).expect("void return");
                        } else {
                            let value = value.expect("return value");
                            let value = self.coerce_to_memory(value, &expected);
                            self.builder.build_return(Some(&value)).expect("return");
                        }
                    }
                    None => {
                        self.builder.build_return(None).expect("void return");
                    }
                }
            }
            Statement::Loop(loop_stmt) => self.emit_loop(loop_stmt)?,
            Statement::Break(_) => {
                let target = self.loop_stack.borrow().last().map(|(_, brk)| *brk);
                if let Some(target) = target {
                    self.builder
                        .build_unconditional_branch(target)
                        .expect("break branch");
                }
            }
            Statement::Continue(_) => {
                let target = self.loop_stack.borrow().last().map(|(cont, _)| *cont);
                if let Some(target) = target {
                    self.builder
                        .build_unconditional_branch(target)
                        .expect("continue branch");
                }
            }
            Statement::Expression(expr) => {
                self.emit_expression(expr)?;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn emit_loop(&self, loop_stmt: &Rc<LoopStatement>) -> Result<(), CodegenError> {
        let function = self.current_fn.borrow().expect("inside a function");

        if let Some(iterable) = &loop_stmt.iterable {
            return self.emit_iterator_loop(loop_stmt, iterable, function);
        }

        let header = self.context.append_basic_block(function, "loop.header");
        let body = self.context.append_basic_block(function, "loop.body");
        let exit = self.context.append_basic_block(function, "loop.exit");

        self.builder
            .build_unconditional_branch(header)
            .expect("enter loop");
        self.builder.position_at_end(header);
        if let Some(condition) = &loop_stmt.condition {
            let cond = self
                .emit_expression(condition)?
                .expect("loop condition value")
                .into_int_value();
            self.builder
                .build_conditional_branch(cond, body, exit)
                .expect("loop branch");
        } else {
            self.builder
                .build_unconditional_branch(body)
                .expect("infinite loop branch");
        }

        self.builder.position_at_end(body);
        self.loop_stack.borrow_mut().push((header, exit));
        for statement in &loop_stmt.body.statements {
            if self.block_terminated() {
                break;
            }
            self.emit_statement(statement)?;
        }
        if !self.block_terminated() {
            if let Some(tail) = &loop_stmt.body.tail {
                self.emit_expression(tail)?;
            }
        }
        if !self.block_terminated() {
            self.builder
                .build_unconditional_branch(header)
                .expect("loop back edge");
        }
        self.loop_stack.borrow_mut().pop();
        self.builder.position_at_end(exit);
        Ok(())
    }

    fn emit_iterator_loop(
        &self,
        loop_stmt: &Rc<LoopStatement>,
        iterable: &Expression,
        function: FunctionValue<'ctx>,
    ) -> Result<(), CodegenError> {
        let element_ty = self.ty_of(loop_stmt.id);
        let element_llvm = self.llvm_type(&element_ty);
        let binder = loop_stmt.binder.clone().unwrap_or_else(|| "_".to_string());

        // Normalize the source into (base pointer, length, index type) and
        // iterate by index; ranges instead drive the induction variable
        // directly.
        match iterable {
            Expression::Range(range) => {
                let start = self
                    .emit_expression(&range.start)?
                    .expect("range start")
                    .into_int_value();
                let end = self
                    .emit_expression(&range.end)?
                    .expect("range end")
                    .into_int_value();

                let slot = self
                    .builder
                    .build_alloca(element_llvm, &format!("{binder}.addr"))
                    .expect("induction slot");
                self.builder.build_store(slot, start).expect("init induction");
                self.variables
                    .borrow_mut()
                    .insert(binder.clone(), (slot, element_ty.clone()));

                let header = self.context.append_basic_block(function, "loop.header");
                let body = self.context.append_basic_block(function, "loop.body");
                let step = self.context.append_basic_block(function, "loop.step");
                let exit = self.context.append_basic_block(function, "loop.exit");

                self.builder.build_unconditional_branch(header).expect("enter loop");
                self.builder.position_at_end(header);
                let current = self
                    .builder
                    .build_load(slot, &binder)
                    .expect("load induction")
                    .into_int_value();
                let predicate = if range.inclusive {
                    IntPredicate::SLE
                } else {
                    IntPredicate::SLT
                };
                let cond = self
                    .builder
                    .build_int_compare(predicate, current, end, "loop.cond")
                    .expect("range comparison");
                self.builder
                    .build_conditional_branch(cond, body, exit)
                    .expect("loop branch");

                self.builder.position_at_end(body);
                self.loop_stack.borrow_mut().push((step, exit));
                for statement in &loop_stmt.body.statements {
                    if self.block_terminated() {
                        break;
                    }
                    self.emit_statement(statement)?;
                }
                if !self.block_terminated() {
                    if let Some(tail) = &loop_stmt.body.tail {
                        self.emit_expression(tail)?;
                    }
                }
                if !self.block_terminated() {
                    self.builder.build_unconditional_branch(step).expect("to step");
                }
                self.loop_stack.borrow_mut().pop();

                self.builder.position_at_end(step);
                let current = self
                    .builder
                    .build_load(slot, &binder)
                    .expect("reload induction")
                    .into_int_value();
                let one = current.get_type().const_int(1, false);
                let next = self
                    .builder
                    .build_int_add(current, one, "loop.next")
                    .expect("step induction");
                self.builder.build_store(slot, next).expect("store induction");
                self.builder.build_unconditional_branch(header).expect("back edge");

                self.builder.position_at_end(exit);
                Ok(())
            }
            _ => {
                let iter_ty = self.ty_of(iterable.id());
                let TypeInfo::Array {
                    element: _,
                    size: Some(length),
                } = self.ctx.symbols().resolve_alias(&iter_ty)
                else {
                    return Err(CodegenError::UnsupportedConstruct {
                        name: "iteration over an unsized array".to_string(),
                        location: iterable.location(),
                    });
                };
                let array_ty = self.llvm_type(&iter_ty);
                let base = match self.try_lvalue_pointer(iterable)? {
                    Some((ptr, _)) => ptr,
                    None => {
                        let value = self
                            .emit_expression(iterable)?
                            .expect("array iterable value");
                        let slot = self
                            .builder
                            .build_alloca(array_ty, "iter.array")
                            .expect("iterable spill");
                        self.builder.build_store(slot, value).expect("spill iterable");
                        slot
                    }
                };

                let index_ty = self.context.i32_type();
                let index_slot = self
                    .builder
                    .build_alloca(index_ty, "iter.idx")
                    .expect("index slot");
                self.builder
                    .build_store(index_slot, index_ty.const_zero())
                    .expect("init index");
                let binder_slot = self
                    .builder
                    .build_alloca(element_llvm, &format!("{binder}.addr"))
                    .expect("binder slot");
                self.variables
                    .borrow_mut()
                    .insert(binder.clone(), (binder_slot, element_ty.clone()));

                let header = self.context.append_basic_block(function, "loop.header");
                let body = self.context.append_basic_block(function, "loop.body");
                let step = self.context.append_basic_block(function, "loop.step");
                let exit = self.context.append_basic_block(function, "loop.exit");

                self.builder.build_unconditional_branch(header).expect("enter loop");
                self.builder.position_at_end(header);
                let index = self
                    .builder
                    .build_load(index_slot, "idx")
                    .expect("load index")
                    .into_int_value();
                let bound = index_ty.const_int(u64::from(length), false);
                let cond = self
                    .builder
                    .build_int_compare(IntPredicate::ULT, index, bound, "loop.cond")
                    .expect("bound comparison");
                self.builder
                    .build_conditional_branch(cond, body, exit)
                    .expect("loop branch");

                self.builder.position_at_end(body);
                let element_ptr = unsafe {
                    self.builder.build_in_bounds_gep(
                        base,
                        &[index_ty.const_zero(), index],
                        "elem.ptr",
                    )
                }
                .expect("element pointer");
                let element = self
                    .builder
                    .build_load(element_ptr, &binder)
                    .expect("load element");
                self.builder
                    .build_store(binder_slot, element)
                    .expect("bind element");

                self.loop_stack.borrow_mut().push((step, exit));
                for statement in &loop_stmt.body.statements {
                    if self.block_terminated() {
                        break;
                    }
                    self.emit_statement(statement)?;
                }
                if !self.block_terminated() {
                    if let Some(tail) = &loop_stmt.body.tail {
                        self.emit_expression(tail)?;
                    }
                }
                if !self.block_terminated() {
                    self.builder.build_unconditional_branch(step).expect("to step");
                }
                self.loop_stack.borrow_mut().pop();

                self.builder.position_at_end(step);
                let index = self
                    .builder
                    .build_load(index_slot, "idx")
                    .expect("reload index")
                    .into_int_value();
                let next = self
                    .builder
                    .build_int_add(index, index_ty.const_int(1, false), "idx.next")
                    .expect("step index");
                self.builder.build_store(index_slot, next).expect("store index");
                self.builder.build_unconditional_branch(header).expect("back edge");

                self.builder.position_at_end(exit);
                Ok(())
            }
        }
    }

    // ---- lvalues ----

    fn lvalue_pointer(
        &self,
        expr: &Expression,
    ) -> Result<(PointerValue<'ctx>, TypeInfo), CodegenError> {
        self.try_lvalue_pointer(expr)?.ok_or_else(|| {
            CodegenError::UnsupportedConstruct {
                name: "assignment to a non-lvalue".to_string(),
                location: expr.location(),
            }
        })
    }

    fn try_lvalue_pointer(
        &self,
        expr: &Expression,
    ) -> Result<Option<(PointerValue<'ctx>, TypeInfo)>, CodegenError> {
        match expr {
            Expression::Identifier(identifier) => {
                if identifier.name == "self" {
                    if let Some((ptr, ty)) = self.self_param.borrow().clone() {
                        return Ok(Some((ptr, ty)));
                    }
                }
                Ok(self.variables.borrow().get(&identifier.name).cloned())
            }
            Expression::FieldAccess(access) => {
                let Some((base_ptr, base_ty)) = self.try_lvalue_pointer(&access.object)? else {
                    return Ok(None);
                };
                let resolved = self.ctx.symbols().resolve_alias(&base_ty);
                let Some(name) = resolved.nominal_name() else {
                    return Ok(None);
                };
                let Some(info) = self.ctx.symbols().struct_info(name) else {
                    return Ok(None);
                };
                let Some(index) = info.fields.iter().position(|f| f.name == access.field) else {
                    return Ok(None);
                };
                let mut field_bindings: FxHashMap<String, TypeInfo> = FxHashMap::default();
                for (param, arg) in info.type_params.iter().zip(resolved.type_args()) {
                    field_bindings.insert(param.clone(), arg.clone());
                }
                let field_ty = info.fields[index].ty.substitute(&field_bindings);
                let _struct_ty = self.llvm_type(&resolved).into_struct_type();
                let ptr = self
                    .builder
                    .build_struct_gep(
                        base_ptr,
                        u32::try_from(index).expect("field index fits u32"),
                        &format!("{}.ptr", access.field),
                    )
                    .expect("field pointer");
                Ok(Some((ptr, field_ty)))
            }
            Expression::Index(index_expr) => {
                let Some((base_ptr, base_ty)) = self.try_lvalue_pointer(&index_expr.object)?
                else {
                    return Ok(None);
                };
                let resolved = self.ctx.symbols().resolve_alias(&base_ty);
                let TypeInfo::Array { element, .. } = &resolved else {
                    return Ok(None);
                };
                let index = self
                    .emit_expression(&index_expr.index)?
                    .expect("index value")
                    .into_int_value();
                let _array_ty = self.llvm_type(&resolved);
                let zero = self.context.i32_type().const_zero();
                let ptr = unsafe {
                    self.builder
                        .build_in_bounds_gep(base_ptr, &[zero, index], "index.ptr")
                }
                .expect("index pointer");
                Ok(Some((ptr, (**element).clone())))
            }
            _ => Ok(None),
        }
    }

    /// A pointer to the value of `expr`, spilling rvalues to a fresh stack
    /// slot. Used for method receivers and payload extraction.
    fn pointer_to(&self, expr: &Expression) -> Result<(PointerValue<'ctx>, TypeInfo), CodegenError> {
        if let Some(found) = self.try_lvalue_pointer(expr)? {
            return Ok(found);
        }
        let ty = self.ty_of(expr.id());
        let value = self.emit_expression(expr)?.expect("spilled value");
        let value = self.coerce_to_memory(value, &ty);
        let slot = self
            .builder
            .build_alloca(self.llvm_type(&ty), &self.fresh_name("spill"))
            .expect("spill slot");
        self.builder.build_store(slot, value).expect("spill store");
        Ok((slot, ty))
    }

    // ---- expressions ----

    #[allow(clippy::too_many_lines)]
    fn emit_expression(&self, expr: &Expression) -> Result<CompiledValue<'ctx>, CodegenError> {
        match expr {
            Expression::Literal(literal) => Ok(Some(self.emit_literal(literal))),
            Expression::Identifier(identifier) => {
                if identifier.name == "self" {
                    if let Some((ptr, _ty)) = self.self_param.borrow().clone() {
                        let value = self
                            .builder
                            .build_load(ptr, "self.value")
                            .expect("load self");
                        return Ok(Some(value));
                    }
                }
                if let Some((ptr, ty)) = self.variables.borrow().get(&identifier.name).cloned() {
                    let value = self
                        .builder
                        .build_load(ptr, &identifier.name)
                        .expect("load local");
                    return Ok(Some(self.coerce_from_memory(value, &ty)));
                }
                if let Some(function) = self.module.get_function(&identifier.name) {
                    return Ok(Some(
                        function.as_global_value().as_pointer_value().into(),
                    ));
                }
                Err(CodegenError::UnsupportedConstruct {
                    name: format!("reference to unknown binding `{}`", identifier.name),
                    location: identifier.location.clone(),
                })
            }
            Expression::Binary(binary) => {
                let ty = self.ty_of(binary.left.id());
                let left = self.emit_expression(&binary.left)?.expect("left operand");
                let right = self.emit_expression(&binary.right)?.expect("right operand");
                Ok(Some(self.emit_binary_op(binary.op, left, right, &ty)))
            }
            Expression::Unary(unary) => {
                let operand = self.emit_expression(&unary.operand)?.expect("operand");
                let value: BasicValueEnum = match unary.op {
                    UnaryOp::Neg => {
                        if operand.is_float_value() {
                            self.builder
                                .build_float_neg(operand.into_float_value(), "neg")
                                .expect("float negation")
                                .into()
                        } else {
                            self.builder
                                .build_int_neg(operand.into_int_value(), "neg")
                                .expect("int negation")
                                .into()
                        }
                    }
                    UnaryOp::Not => self
                        .builder
                        .build_not(operand.into_int_value(), "not")
                        .expect("boolean not")
                        .into(),
                };
                Ok(Some(value))
            }
            Expression::Call(call) => self.emit_call(call),
            Expression::MethodCall(call) => self.emit_method_call(call),
            Expression::StaticCall(call) => self.emit_static_call(call),
            Expression::FieldAccess(access) => {
                if let Some((ptr, ty)) = self.try_lvalue_pointer(expr)? {
                    let value = self
                        .builder
                        .build_load(ptr, &access.field)
                        .expect("load field");
                    return Ok(Some(self.coerce_from_memory(value, &ty)));
                }
                // Rvalue base: extract directly from the aggregate.
                let base_ty = self.ty_of(access.object.id());
                let resolved = self.ctx.symbols().resolve_alias(&base_ty);
                let base = self
                    .emit_expression(&access.object)?
                    .expect("aggregate value");
                let Some(name) = resolved.nominal_name() else {
                    return Err(CodegenError::UnsupportedConstruct {
                        name: format!("field access on `{base_ty}`"),
                        location: access.location.clone(),
                    });
                };
                let info = self
                    .ctx
                    .symbols()
                    .struct_info(name)
                    .expect("checked struct type");
                let index = info
                    .fields
                    .iter()
                    .position(|f| f.name == access.field)
                    .expect("checked field");
                let field_ty = self.ty_of(access.id);
                let value = self
                    .builder
                    .build_extract_value(
                        base.into_struct_value(),
                        u32::try_from(index).expect("field index fits u32"),
                        &access.field,
                    )
                    .expect("extract field");
                Ok(Some(self.coerce_from_memory(value, &field_ty)))
            }
            Expression::Index(_) => {
                let (ptr, ty) = self.pointer_to(expr)?;
                let value = self
                    .builder
                    .build_load(ptr, "indexed")
                    .expect("load element");
                Ok(Some(self.coerce_from_memory(value, &ty)))
            }
            Expression::Array(array) => {
                let ty = self.ty_of(array.id);
                let array_ty = self.llvm_type(&ty).into_array_type();
                let slot = self
                    .builder
                    .build_alloca(array_ty, &self.fresh_name("array"))
                    .expect("array slot");
                let element_info = match &ty {
                    TypeInfo::Array { element, .. } => (**element).clone(),
                    _ => TypeInfo::default(),
                };
                let index_ty = self.context.i32_type();
                for (index, element) in array.elements.iter().enumerate() {
                    let value = self.emit_expression(element)?.expect("array element");
                    let value = self.coerce_to_memory(value, &element_info);
                    let ptr = unsafe {
                        self.builder.build_in_bounds_gep(
                            slot,
                            &[
                                index_ty.const_zero(),
                                index_ty
                                    .const_int(index as u64, false),
                            ],
                            "elem.init",
                        )
                    }
                    .expect("element pointer");
                    self.builder.build_store(ptr, value).expect("store element");
                }
                let value = self
                    .builder
                    .build_load(slot, "array.value")
                    .expect("load array");
                Ok(Some(value))
            }
            Expression::Range(range) => Err(CodegenError::UnsupportedConstruct {
                name: "range expression outside a loop".to_string(),
                location: range.location.clone(),
            }),
            Expression::StructInit(init) => {
                let ty = self.ty_of(init.id);
                let resolved = self.ctx.symbols().resolve_alias(&ty);
                let struct_ty = self.llvm_type(&resolved).into_struct_type();
                let info = resolved
                    .nominal_name()
                    .and_then(|n| self.ctx.symbols().struct_info(n))
                    .expect("checked struct type")
                    .clone();
                let mut aggregate = struct_ty.get_undef();
                for (index, field) in info.fields.iter().enumerate() {
                    let (_, value_expr) = init
                        .fields
                        .iter()
                        .find(|(n, _)| n == &field.name)
                        .expect("checked field initializer");
                    let field_ty = self.ty_of(value_expr.id());
                    let value = self.emit_expression(value_expr)?.expect("field value");
                    let value = self.coerce_to_memory(value, &field_ty);
                    aggregate = self
                        .builder
                        .build_insert_value(
                            aggregate,
                            value,
                            u32::try_from(index).expect("field index fits u32"),
                            &field.name,
                        )
                        .expect("insert field")
                        .into_struct_value();
                }
                Ok(Some(aggregate.as_basic_value_enum()))
            }
            Expression::If(if_expr) => self.emit_if(if_expr),
            Expression::Block(block) => {
                for statement in &block.statements {
                    if self.block_terminated() {
                        return Ok(None);
                    }
                    self.emit_statement(statement)?;
                }
                if self.block_terminated() {
                    return Ok(None);
                }
                match &block.tail {
                    Some(tail) => self.emit_expression(tail),
                    None => Ok(None),
                }
            }
            Expression::Is(is_expr) => self.emit_is(is_expr),
            Expression::Try(try_expr) => self.emit_try(try_expr),
            Expression::Cast(cast) => self.emit_cast(cast),
            Expression::Interp(interp) => self.emit_interpolation(interp),
            Expression::Reference(reference) => {
                let (ptr, _) = self.pointer_to(&reference.inner)?;
                Ok(Some(ptr.into()))
            }
        }
    }

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn emit_literal(&self, literal: &Literal) -> BasicValueEnum<'ctx> {
        match literal {
            Literal::Int(int) => {
                let ty = self.ty_of(int.id);
                let int_ty = self.llvm_type(&ty).into_int_type();
                let negative = int.digits.starts_with('-');
                let digits = int.digits.trim_start_matches('-');
                let value = i128::from_str_radix(digits, int.radix).unwrap_or(0);
                let value = if negative { -value } else { value };
                int_ty.const_int(value as u64, negative).into()
            }
            Literal::Float(float) => {
                let ty = self.ty_of(float.id);
                let value = float.value.parse::<f64>().unwrap_or(0.0);
                match self.llvm_type(&ty) {
                    BasicTypeEnum::FloatType(float_ty) => float_ty.const_float(value).into(),
                    _ => self.context.f64_type().const_float(value).into(),
                }
            }
            Literal::Bool(b) => self
                .context
                .bool_type()
                .const_int(u64::from(b.value), false)
                .into(),
            Literal::Char(c) => self
                .context
                .i8_type()
                .const_int(u64::from(c.value as u8), false)
                .into(),
            Literal::Str(s) => {
                let name = self.fresh_name("str");
                self.builder
                    .build_global_string_ptr(&s.value, &name)
                    .expect("string constant")
                    .as_pointer_value()
                    .into()
            }
        }
    }

    fn emit_binary_op(
        &self,
        op: BinaryOp,
        left: BasicValueEnum<'ctx>,
        right: BasicValueEnum<'ctx>,
        operand_ty: &TypeInfo,
    ) -> BasicValueEnum<'ctx> {
        let signed = matches!(operand_ty, TypeInfo::Primitive(p) if p.is_signed());
        if left.is_float_value() {
            let l = left.into_float_value();
            let r = right.into_float_value();
            return match op {
                BinaryOp::Add => self.builder.build_float_add(l, r, "fadd").expect("fadd").into(),
                BinaryOp::Sub => self.builder.build_float_sub(l, r, "fsub").expect("fsub").into(),
                BinaryOp::Mul => self.builder.build_float_mul(l, r, "fmul").expect("fmul").into(),
                BinaryOp::Div => self.builder.build_float_div(l, r, "fdiv").expect("fdiv").into(),
                BinaryOp::Mod => self.builder.build_float_rem(l, r, "frem").expect("frem").into(),
                BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt
                | BinaryOp::Ge => {
                    let predicate = match op {
                        BinaryOp::Eq => FloatPredicate::OEQ,
                        BinaryOp::Ne => FloatPredicate::ONE,
                        BinaryOp::Lt => FloatPredicate::OLT,
                        BinaryOp::Le => FloatPredicate::OLE,
                        BinaryOp::Gt => FloatPredicate::OGT,
                        _ => FloatPredicate::OGE,
                    };
                    self.builder
                        .build_float_compare(predicate, l, r, "fcmp")
                        .expect("fcmp")
                        .into()
                }
                BinaryOp::And | BinaryOp::Or => unreachable!("logical ops are boolean"),
            };
        }
        if left.is_pointer_value() {
            // String equality compares the pointers.
            let int_ty = self.context.i64_type();
            let l = self
                .builder
                .build_ptr_to_int(left.into_pointer_value(), int_ty, "ptl")
                .expect("ptrtoint");
            let r = self
                .builder
                .build_ptr_to_int(right.into_pointer_value(), int_ty, "ptr")
                .expect("ptrtoint");
            let predicate = if op == BinaryOp::Ne {
                IntPredicate::NE
            } else {
                IntPredicate::EQ
            };
            return self
                .builder
                .build_int_compare(predicate, l, r, "pcmp")
                .expect("pointer comparison")
                .into();
        }
        let l = left.into_int_value();
        let r = right.into_int_value();
        match op {
            BinaryOp::Add => self.builder.build_int_add(l, r, "add").expect("add").into(),
            BinaryOp::Sub => self.builder.build_int_sub(l, r, "sub").expect("sub").into(),
            BinaryOp::Mul => self.builder.build_int_mul(l, r, "mul").expect("mul").into(),
            BinaryOp::Div => if signed {
                self.builder.build_int_signed_div(l, r, "sdiv").expect("sdiv")
            } else {
                self.builder.build_int_unsigned_div(l, r, "udiv").expect("udiv")
            }
            .into(),
            BinaryOp::Mod => if signed {
                self.builder.build_int_signed_rem(l, r, "srem").expect("srem")
            } else {
                self.builder.build_int_unsigned_rem(l, r, "urem").expect("urem")
            }
            .into(),
            BinaryOp::And => self.builder.build_and(l, r, "and").expect("and").into(),
            BinaryOp::Or => self.builder.build_or(l, r, "or").expect("or").into(),
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt
            | BinaryOp::Ge => {
                let predicate = match (op, signed) {
                    (BinaryOp::Eq, _) => IntPredicate::EQ,
                    (BinaryOp::Ne, _) => IntPredicate::NE,
                    (BinaryOp::Lt, true) => IntPredicate::SLT,
                    (BinaryOp::Lt, false) => IntPredicate::ULT,
                    (BinaryOp::Le, true) => IntPredicate::SLE,
                    (BinaryOp::Le, false) => IntPredicate::ULE,
                    (BinaryOp::Gt, true) => IntPredicate::SGT,
                    (BinaryOp::Gt, false) => IntPredicate::UGT,
                    (BinaryOp::Ge, true) => IntPredicate::SGE,
                    (BinaryOp::Ge, false) => IntPredicate::UGE,
                    _ => unreachable!("non-comparison BinaryOp filtered out by outer match"),
                };
                self.builder
                    .build_int_compare(predicate, l, r, "cmp")
                    .expect("icmp")
                    .into()
            }
        }
    }

    fn emit_arguments(
        &self,
        args: &[Expression],
        param_types: &[TypeInfo],
    ) -> Result<Vec<BasicMetadataValueEnum<'ctx>>, CodegenError> {
        let mut out = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            let value = self.emit_expression(arg)?.expect("argument value");
            let ty = param_types
                .get(index)
                .cloned()
                .unwrap_or_else(|| self.ty_of(arg.id()));
            out.push(BasicMetadataValueEnum::from(
                self.coerce_to_memory(value, &ty),
            ));
        }
        Ok(out)
    }

    fn finish_call(
        &self,
        function: FunctionValue<'ctx>,
        args: &[BasicMetadataValueEnum<'ctx>],
        result_ty: &TypeInfo,
    ) -> CompiledValue<'ctx> {
        let call = self
            .builder
            .build_call(function, args, "call")
            .expect("call instruction");
        let value = call.try_as_basic_value().basic()?;
        Some(self.coerce_from_memory(value, result_ty))
    }

    fn emit_call(
        &self,
        call: &Rc<paw_ast::nodes::CallExpression>,
    ) -> Result<CompiledValue<'ctx>, CodegenError> {
        let Expression::Identifier(callee) = &call.callee else {
            return Err(CodegenError::UnsupportedConstruct {
                name: "indirect call".to_string(),
                location: call.location.clone(),
            });
        };
        let result_ty = self.ty_of(call.id);

        if let Some(info) = self.ctx.symbols().function(&callee.name) {
            let mangled = if info.is_generic() {
                let arg_types: Vec<TypeInfo> =
                    call.args.iter().map(|a| self.ty_of(a.id())).collect();
                let Some(type_args) = infer_call_type_args(info, &arg_types, Some(&result_ty))
                else {
                    return Err(CodegenError::UnsupportedConstruct {
                        name: format!("unresolved generic call to `{}`", callee.name),
                        location: call.location.clone(),
                    });
                };
                mangle(&callee.name, &type_args)
            } else {
                callee.name.clone()
            };
            let substituted: Vec<TypeInfo> = call
                .args
                .iter()
                .map(|a| self.ty_of(a.id()))
                .collect();
            let args = self.emit_arguments(&call.args, &substituted)?;
            let function = self
                .module
                .get_function(&mangled)
                .expect("declared function");
            return Ok(self.finish_call(function, &args, &result_ty));
        }

        if self.ctx.symbols().enum_of_variant(&callee.name).is_some() {
            let Some(enum_c) = nominal_mangled_name(&result_ty) else {
                return Err(CodegenError::UnsupportedConstruct {
                    name: format!("variant constructor `{}`", callee.name),
                    location: call.location.clone(),
                });
            };
            let substituted: Vec<TypeInfo> =
                call.args.iter().map(|a| self.ty_of(a.id())).collect();
            let args = self.emit_arguments(&call.args, &substituted)?;
            let function = self
                .module
                .get_function(&format!("{enum_c}_{}", callee.name))
                .expect("declared enum constructor");
            return Ok(self.finish_call(function, &args, &result_ty));
        }

        Err(CodegenError::UnsupportedConstruct {
            name: format!("call to `{}`", callee.name),
            location: call.location.clone(),
        })
    }

    fn emit_method_call(
        &self,
        call: &Rc<paw_ast::nodes::MethodCallExpression>,
    ) -> Result<CompiledValue<'ctx>, CodegenError> {
        let receiver_ty = self.ty_of(call.receiver.id());
        let resolved = self.ctx.symbols().resolve_alias(&receiver_ty);
        let Some(owner) = nominal_mangled_name(&resolved) else {
            return Err(CodegenError::UnsupportedConstruct {
                name: format!("method call on `{receiver_ty}`"),
                location: call.location.clone(),
            });
        };
        let (receiver_ptr, _) = self.pointer_to(&call.receiver)?;
        let result_ty = self.ty_of(call.id);
        let substituted: Vec<TypeInfo> = call.args.iter().map(|a| self.ty_of(a.id())).collect();
        let mut args: Vec<BasicMetadataValueEnum> = vec![receiver_ptr.into()];
        args.extend(self.emit_arguments(&call.args, &substituted)?);
        let function = self
            .module
            .get_function(&format!("{owner}_{}", call.method))
            .expect("declared method");
        Ok(self.finish_call(function, &args, &result_ty))
    }

    fn emit_static_call(
        &self,
        call: &Rc<paw_ast::nodes::StaticCallExpression>,
    ) -> Result<CompiledValue<'ctx>, CodegenError> {
        let type_args: Vec<TypeInfo> = call
            .type_args
            .iter()
            .map(|t| {
                let ty = TypeInfo::from_type_expr(t, &self.type_params.borrow(), None)
                    .substitute(&self.bindings.borrow());
                self.ctx.symbols().resolve_alias_deep(&ty)
            })
            .collect();
        let owner = if type_args.is_empty() {
            call.type_name.clone()
        } else {
            mangle(&call.type_name, &type_args)
        };
        let result_ty = self.ty_of(call.id);
        let substituted: Vec<TypeInfo> = call.args.iter().map(|a| self.ty_of(a.id())).collect();
        let args = self.emit_arguments(&call.args, &substituted)?;
        let function = self
            .module
            .get_function(&format!("{owner}_{}", call.method))
            .expect("declared associated function");
        Ok(self.finish_call(function, &args, &result_ty))
    }

    /// Classic three-block lowering; a `phi` joins the branch values when
    /// the `if` is used as an expression.
    fn emit_if(
        &self,
        if_expr: &Rc<paw_ast::nodes::IfExpression>,
    ) -> Result<CompiledValue<'ctx>, CodegenError> {
        let function = self.current_fn.borrow().expect("inside a function");
        let result_ty = self.ty_of(if_expr.id);

        let condition = self
            .emit_expression(&if_expr.condition)?
            .expect("condition value")
            .into_int_value();
        let then_block = self.context.append_basic_block(function, "if.then");
        let else_block = self.context.append_basic_block(function, "if.else");
        let merge_block = self.context.append_basic_block(function, "if.merge");
        self.builder
            .build_conditional_branch(condition, then_block, else_block)
            .expect("if branch");

        self.builder.position_at_end(then_block);
        let then_value = self.emit_block_value(&if_expr.then_branch)?;
        let then_end = self.builder.get_insert_block().expect("then block");
        let then_reaches_merge = then_end.get_terminator().is_none();
        if then_reaches_merge {
            self.builder
                .build_unconditional_branch(merge_block)
                .expect("then to merge");
        }

        self.builder.position_at_end(else_block);
        let else_value = match &if_expr.else_branch {
            Some(else_branch) => self.emit_expression(else_branch)?,
            None => None,
        };
        let else_end = self.builder.get_insert_block().expect("else block");
        let else_reaches_merge = else_end.get_terminator().is_none();
        if else_reaches_merge {
            self.builder
                .build_unconditional_branch(merge_block)
                .expect("else to merge");
        }

        self.builder.position_at_end(merge_block);
        if result_ty.is_void() {
            if !then_reaches_merge && !else_reaches_merge {
                self.builder.build_unreachable().expect("dead merge");
            }
            return Ok(None);
        }
        let llvm_ty = if result_ty.is_bool() {
            self.context.bool_type().into()
        } else {
            self.llvm_type(&result_ty)
        };
        let phi = self
            .builder
            .build_phi(llvm_ty, "if.result")
            .expect("merge phi");
        if let (true, Some(value)) = (then_reaches_merge, then_value) {
            phi.add_incoming(&[(&value, then_end)]);
        }
        if let (true, Some(value)) = (else_reaches_merge, else_value) {
            phi.add_incoming(&[(&value, else_end)]);
        }
        Ok(Some(phi.as_basic_value()))
    }

    fn emit_block_value(
        &self,
        block: &Rc<BlockExpression>,
    ) -> Result<CompiledValue<'ctx>, CodegenError> {
        for statement in &block.statements {
            if self.block_terminated() {
                return Ok(None);
            }
            self.emit_statement(statement)?;
        }
        if self.block_terminated() {
            return Ok(None);
        }
        match &block.tail {
            Some(tail) => self.emit_expression(tail),
            None => Ok(None),
        }
    }

    /// `is` lowering: the scrutinee is spilled to a slot, the tag is
    /// compared per arm, and each matching block loads its binders from the
    /// payload buffer before evaluating the arm body.
    #[allow(clippy::too_many_lines)]
    fn emit_is(&self, is_expr: &Rc<IsExpression>) -> Result<CompiledValue<'ctx>, CodegenError> {
        let function = self.current_fn.borrow().expect("inside a function");
        let scrutinee_ty = self.ty_of(is_expr.scrutinee.id());
        let resolved = self.ctx.symbols().resolve_alias(&scrutinee_ty);
        let result_ty = self.ty_of(is_expr.id);

        let scrutinee = self
            .emit_expression(&is_expr.scrutinee)?
            .expect("scrutinee value");
        let scrutinee_llvm = self.llvm_type(&resolved);
        let slot = self
            .builder
            .build_alloca(scrutinee_llvm, "match.value")
            .expect("scrutinee slot");
        self.builder
            .build_store(slot, self.coerce_to_memory(scrutinee, &resolved))
            .expect("spill scrutinee");

        let enum_info = resolved
            .nominal_name()
            .and_then(|n| self.ctx.symbols().enum_info(n))
            .cloned();
        let enum_bindings: FxHashMap<String, TypeInfo> = enum_info
            .as_ref()
            .map(|info| {
                info.type_params
                    .iter()
                    .cloned()
                    .zip(resolved.type_args().iter().cloned())
                    .collect()
            })
            .unwrap_or_default();

        let merge_block = self.context.append_basic_block(function, "match.merge");
        let mut incoming: Vec<(BasicValueEnum<'ctx>, BasicBlock<'ctx>)> = Vec::new();

        for arm in &is_expr.arms {
            let body_block = self.context.append_basic_block(function, "match.arm");
            let next_block = self.context.append_basic_block(function, "match.next");

            match &arm.pattern {
                Pattern::Wildcard => {
                    self.builder
                        .build_unconditional_branch(body_block)
                        .expect("wildcard branch");
                }
                Pattern::Binding(name) => {
                    let binder_slot = self
                        .builder
                        .build_alloca(scrutinee_llvm, &format!("{name}.addr"))
                        .expect("binding slot");
                    let value = self
                        .builder
                        .build_load(slot, name)
                        .expect("reload scrutinee");
                    self.builder.build_store(binder_slot, value).expect("bind value");
                    self.variables
                        .borrow_mut()
                        .insert(name.clone(), (binder_slot, resolved.clone()));
                    match &arm.guard {
                        Some(guard) => {
                            let guard_value = self
                                .emit_expression(guard)?
                                .expect("guard value")
                                .into_int_value();
                            self.builder
                                .build_conditional_branch(guard_value, body_block, next_block)
                                .expect("guard branch");
                        }
                        None => {
                            self.builder
                                .build_unconditional_branch(body_block)
                                .expect("binding branch");
                        }
                    }
                }
                Pattern::Literal(literal) => {
                    let value = self
                        .builder
                        .build_load(slot, "match.load")
                        .expect("reload scrutinee");
                    let value = self.coerce_from_memory(value, &resolved);
                    let expected = self.emit_literal(literal);
                    let mut cond = self
                        .emit_binary_op(BinaryOp::Eq, value, expected, &resolved)
                        .into_int_value();
                    if let Some(guard) = &arm.guard {
                        let guard_value = self
                            .emit_expression(guard)?
                            .expect("guard value")
                            .into_int_value();
                        cond = self
                            .builder
                            .build_and(cond, guard_value, "guarded")
                            .expect("guard conjunction");
                    }
                    self.builder
                        .build_conditional_branch(cond, body_block, next_block)
                        .expect("literal branch");
                }
                Pattern::Variant { name, binders } => {
                    let Some(info) = enum_info.as_ref() else {
                        return Err(CodegenError::UnsupportedConstruct {
                            name: format!("variant pattern on `{scrutinee_ty}`"),
                            location: arm.location.clone(),
                        });
                    };
                    let variant = info.variant(name).expect("checked variant").clone();
                    let _enum_struct = scrutinee_llvm.into_struct_type();
                    let tag_ptr = self
                        .builder
                        .build_struct_gep(slot, 0, "tag.ptr")
                        .expect("tag pointer");
                    let tag = self
                        .builder
                        .build_load(tag_ptr, "tag")
                        .expect("load tag")
                        .into_int_value();
                    let expected = self
                        .context
                        .i32_type()
                        .const_int(variant.tag as u64, false);
                    let matches = self
                        .builder
                        .build_int_compare(IntPredicate::EQ, tag, expected, "tag.eq")
                        .expect("tag comparison");

                    let bind_block = self.context.append_basic_block(function, "match.bind");
                    self.builder
                        .build_conditional_branch(matches, bind_block, next_block)
                        .expect("tag branch");
                    self.builder.position_at_end(bind_block);

                    if !variant.payloads.is_empty() {
                        let payloads: Vec<TypeInfo> = variant
                            .payloads
                            .iter()
                            .map(|p| p.substitute(&enum_bindings))
                            .collect();
                        let _payload_struct = self.payload_struct_type(&payloads);
                        let data_ptr = self
                            .builder
                            .build_struct_gep(slot, 1, "data.ptr")
                            .expect("payload buffer pointer");
                        for (index, (binder, payload_ty)) in
                            binders.iter().zip(&payloads).enumerate()
                        {
                            if binder == "_" {
                                continue;
                            }
                            let field_ptr = self
                                .builder
                                .build_struct_gep(
                                    data_ptr,
                                    u32::try_from(index).expect("payload index fits u32"),
                                    &format!("{binder}.ptr"),
                                )
                                .expect("payload field pointer");
                            let value = self
                                .builder
                                .build_load(field_ptr, binder)
                                .expect("load payload");
                            let binder_slot = self
                                .builder
                                .build_alloca(
                                    self.llvm_type(payload_ty),
                                    &format!("{binder}.addr"),
                                )
                                .expect("binder slot");
                            self.builder
                                .build_store(binder_slot, value)
                                .expect("bind payload");
                            self.variables
                                .borrow_mut()
                                .insert(binder.clone(), (binder_slot, payload_ty.clone()));
                        }
                    }
                    match &arm.guard {
                        Some(guard) => {
                            let guard_value = self
                                .emit_expression(guard)?
                                .expect("guard value")
                                .into_int_value();
                            self.builder
                                .build_conditional_branch(guard_value, body_block, next_block)
                                .expect("guard branch");
                        }
                        None => {
                            self.builder
                                .build_unconditional_branch(body_block)
                                .expect("variant branch");
                        }
                    }
                }
            }

            self.builder.position_at_end(body_block);
            let value = self.emit_expression(&arm.body)?;
            let body_end = self.builder.get_insert_block().expect("arm body block");
            if body_end.get_terminator().is_none() {
                self.builder
                    .build_unconditional_branch(merge_block)
                    .expect("arm to merge");
                if let Some(value) = value {
                    incoming.push((value, body_end));
                }
            }
            self.builder.position_at_end(next_block);
        }

        // Fallthrough when no arm matched.
        self.builder
            .build_unconditional_branch(merge_block)
            .expect("exhausted match");
        let fall_block = self.builder.get_insert_block().expect("fall block");

        self.builder.position_at_end(merge_block);
        if result_ty.is_void() || incoming.is_empty() {
            return Ok(None);
        }
        let llvm_ty = if result_ty.is_bool() {
            self.context.bool_type().into()
        } else {
            self.llvm_type(&result_ty)
        };
        let phi = self.builder.build_phi(llvm_ty, "match.result").expect("match phi");
        for (value, block) in &incoming {
            phi.add_incoming(&[(value, *block)]);
        }
        // The unmatched fallthrough contributes a zero value; diagnostics
        // recommend a trailing wildcard arm.
        let zero: BasicValueEnum = match llvm_ty {
            BasicTypeEnum::IntType(t) => t.const_zero().into(),
            BasicTypeEnum::FloatType(t) => t.const_zero().into(),
            BasicTypeEnum::PointerType(t) => t.const_null().into(),
            BasicTypeEnum::StructType(t) => t.const_zero().into(),
            BasicTypeEnum::ArrayType(t) => t.const_zero().into(),
            BasicTypeEnum::VectorType(t) => t.const_zero().into(),
            BasicTypeEnum::ScalableVectorType(t) => t.const_zero().into(),
        };
        phi.add_incoming(&[(&zero, fall_block)]);
        Ok(Some(phi.as_basic_value()))
    }

    /// `expr?`: extract the tag, branch to an early-return block when it is
    /// the `Err` tag, continue with the `Ok` payload otherwise.
    fn emit_try(
        &self,
        try_expr: &Rc<paw_ast::nodes::TryExpression>,
    ) -> Result<CompiledValue<'ctx>, CodegenError> {
        let function = self.current_fn.borrow().expect("inside a function");
        let inner_ty = self.ty_of(try_expr.inner.id());
        let resolved = self.ctx.symbols().resolve_alias(&inner_ty);
        let enum_info = resolved
            .nominal_name()
            .and_then(|n| self.ctx.symbols().enum_info(n))
            .cloned()
            .ok_or_else(|| CodegenError::UnsupportedConstruct {
                name: "`?` on a non-enum value".to_string(),
                location: try_expr.location.clone(),
            })?;
        let err_tag = enum_info.variant("Err").map_or(1, |v| v.tag);
        let ok_variant = enum_info
            .variant("Ok")
            .cloned()
            .ok_or_else(|| CodegenError::UnsupportedConstruct {
                name: "`?` on an enum without `Ok`".to_string(),
                location: try_expr.location.clone(),
            })?;

        let value = self
            .emit_expression(&try_expr.inner)?
            .expect("try operand");
        let enum_struct = self.llvm_type(&resolved).into_struct_type();
        let slot = self
            .builder
            .build_alloca(enum_struct, "try.value")
            .expect("try slot");
        self.builder.build_store(slot, value).expect("spill try value");

        let tag = self
            .builder
            .build_extract_value(value.into_struct_value(), 0, "tag")
            .expect("extract tag")
            .into_int_value();
        let is_err = self
            .builder
            .build_int_compare(
                IntPredicate::EQ,
                tag,
                self.context.i32_type().const_int(err_tag as u64, false),
                "is.err",
            )
            .expect("err comparison");

        let err_block = self.context.append_basic_block(function, "try.err");
        let ok_block = self.context.append_basic_block(function, "try.ok");
        self.builder
            .build_conditional_branch(is_err, err_block, ok_block)
            .expect("try branch");

        self.builder.position_at_end(err_block);
        self.builder
            .build_return(Some(&value))
            .expect("propagate error");

        self.builder.position_at_end(ok_block);
        let mut enum_bindings: FxHashMap<String, TypeInfo> = FxHashMap::default();
        for (param, arg) in enum_info.type_params.iter().zip(resolved.type_args()) {
            enum_bindings.insert(param.clone(), arg.clone());
        }
        let payload_ty = ok_variant.payloads[0].substitute(&enum_bindings);
        let _payload_struct = self.payload_struct_type(&[payload_ty.clone()]);
        let data_ptr = self
            .builder
            .build_struct_gep(slot, 1, "data.ptr")
            .expect("payload buffer pointer");
        let field_ptr = self
            .builder
            .build_struct_gep(data_ptr, 0, "ok.ptr")
            .expect("payload pointer");
        let payload = self
            .builder
            .build_load(field_ptr, "ok.value")
            .expect("load payload");
        Ok(Some(self.coerce_from_memory(payload, &payload_ty)))
    }

    fn emit_cast(
        &self,
        cast: &Rc<paw_ast::nodes::CastExpression>,
    ) -> Result<CompiledValue<'ctx>, CodegenError> {
        let value = self.emit_expression(&cast.value)?.expect("cast operand");
        let source_ty = self.ty_of(cast.value.id());
        let target_ty = self.ty_of(cast.id);
        let source_signed = matches!(&source_ty, TypeInfo::Primitive(p) if p.is_signed());
        let target_signed = matches!(&target_ty, TypeInfo::Primitive(p) if p.is_signed());

        let result: BasicValueEnum = match (value, self.llvm_type(&target_ty)) {
            (BasicValueEnum::IntValue(int), BasicTypeEnum::IntType(target)) => self
                .builder
                .build_int_cast_sign_flag(int, target, source_signed, "cast")
                .expect("int cast")
                .into(),
            (BasicValueEnum::IntValue(int), BasicTypeEnum::FloatType(target)) => {
                if source_signed {
                    self.builder
                        .build_signed_int_to_float(int, target, "cast")
                        .expect("sitofp")
                        .into()
                } else {
                    self.builder
                        .build_unsigned_int_to_float(int, target, "cast")
                        .expect("uitofp")
                        .into()
                }
            }
            (BasicValueEnum::FloatValue(float), BasicTypeEnum::IntType(target)) => {
                if target_signed {
                    self.builder
                        .build_float_to_signed_int(float, target, "cast")
                        .expect("fptosi")
                        .into()
                } else {
                    self.builder
                        .build_float_to_unsigned_int(float, target, "cast")
                        .expect("fptoui")
                        .into()
                }
            }
            (BasicValueEnum::FloatValue(float), BasicTypeEnum::FloatType(target)) => {
                let source_bits = primitive_bits(&source_ty);
                let target_bits = primitive_bits(&target_ty);
                if source_bits < target_bits {
                    self.builder
                        .build_float_ext(float, target, "cast")
                        .expect("fpext")
                        .into()
                } else if source_bits > target_bits {
                    self.builder
                        .build_float_trunc(float, target, "cast")
                        .expect("fptrunc")
                        .into()
                } else {
                    float.into()
                }
            }
            _ => {
                return Err(CodegenError::UnsupportedConstruct {
                    name: format!("cast from `{source_ty}` to `{target_ty}`"),
                    location: cast.location.clone(),
                });
            }
        };
        Ok(Some(result))
    }

    /// String interpolation through libc: segments accumulate into a
    /// module-global buffer with `strcat`, numbers format through
    /// `sprintf`.
    fn emit_interpolation(
        &self,
        interp: &Rc<paw_ast::nodes::StringInterpolation>,
    ) -> Result<CompiledValue<'ctx>, CodegenError> {
        let buffer_ty = self.context.i8_type().array_type(1024);
        let buffer = self.module.add_global(buffer_ty, None, &self.fresh_name("interp.buf"));
        buffer.set_initializer(&buffer_ty.const_zero());
        let buffer_ptr = buffer.as_pointer_value();

        let zero8 = self.context.i8_type().const_zero();
        self.builder
            .build_store(buffer_ptr, zero8)
            .expect("reset buffer");

        let ptr_ty = self.context.i8_type().ptr_type(AddressSpace::default());
        let strcat = self.module.get_function("strcat").unwrap_or_else(|| {
            let fn_ty = ptr_ty.fn_type(&[ptr_ty.into(), ptr_ty.into()], false);
            self.module.add_function("strcat", fn_ty, None)
        });
        let sprintf = self.module.get_function("sprintf").unwrap_or_else(|| {
            let fn_ty = self
                .context
                .i32_type()
                .fn_type(&[ptr_ty.into(), ptr_ty.into()], true);
            self.module.add_function("sprintf", fn_ty, None)
        });

        for segment in &interp.segments {
            match segment {
                InterpSegment::Literal(text) => {
                    let constant = self
                        .builder
                        .build_global_string_ptr(text, &self.fresh_name("seg"))
                        .expect("segment constant");
                    self.builder
                        .build_call(
                            strcat,
                            &[buffer_ptr.into(), constant.as_pointer_value().into()],
                            "",
                        )
                        .expect("append literal segment");
                }
                InterpSegment::Expr(expr) => {
                    let ty = self.ty_of(expr.id());
                    let value = self.emit_expression(expr)?.expect("segment value");
                    if ty.is_string() {
                        self.builder
                            .build_call(strcat, &[buffer_ptr.into(), value.into()], "")
                            .expect("append string segment");
                        continue;
                    }
                    let scratch = self
                        .builder
                        .build_alloca(self.context.i8_type().array_type(64), "seg.tmp")
                        .expect("segment scratch");
                    let format = interp_format(&ty);
                    let format_ptr = self
                        .builder
                        .build_global_string_ptr(format, &self.fresh_name("fmt"))
                        .expect("format constant");
                    let value = self.coerce_to_memory(value, &ty);
                    self.builder
                        .build_call(
                            sprintf,
                            &[
                                scratch.into(),
                                format_ptr.as_pointer_value().into(),
                                value.into(),
                            ],
                            "",
                        )
                        .expect("format segment");
                    self.builder
                        .build_call(strcat, &[buffer_ptr.into(), scratch.into()], "")
                        .expect("append formatted segment");
                }
            }
        }
        Ok(Some(buffer_ptr.into()))
    }
}

/// Bit width of a primitive type, 0 for anything else.
fn primitive_bits(ty: &TypeInfo) -> u32 {
    match ty {
        TypeInfo::Primitive(p) => p.bit_width().unwrap_or(0),
        _ => 0,
    }
}

/// The registered LLVM type name of a nominal type.
fn nominal_mangled_name(ty: &TypeInfo) -> Option<String> {
    match ty.deref_alias() {
        TypeInfo::Named(name) => Some(name.clone()),
        TypeInfo::GenericInstance(..) => Some(mangle_type(ty.deref_alias())),
        _ => None,
    }
}

/// `sprintf` conversion for interpolated non-string segments.
fn interp_format(ty: &TypeInfo) -> &'static str {
    match ty {
        TypeInfo::Primitive(p) => match p {
            Primitive::I8 | Primitive::I16 | Primitive::I32 => "%d",
            Primitive::I64 | Primitive::I128 => "%lld",
            Primitive::U8 | Primitive::U16 | Primitive::U32 => "%u",
            Primitive::U64 | Primitive::U128 => "%llu",
            Primitive::F32 | Primitive::F64 => "%g",
            Primitive::Char => "%c",
            Primitive::Bool => "%d",
            _ => "%d",
        },
        _ => "%d",
    }
}
