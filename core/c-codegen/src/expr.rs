//! Expression lowering for the C backend.
//!
//! Value-position blocks, `if` expressions, `is` matches and `?` all lower
//! to GCC/Clang statement expressions (`({ ... })`), which keeps the
//! generated code a direct transcription of the source structure. Variant
//! payloads are extracted by direct union-member access into locally
//! declared variables named after the binders.

use std::fmt::Write as _;
use std::rc::Rc;

use paw_ast::nodes::{
    BlockExpression, Expression, InterpSegment, IsExpression, Literal, Pattern,
};
use paw_mono::infer_call_type_args;
use paw_mono::mangle::{mangle, mangle_type};
use paw_type_checker::type_info::TypeInfo;
use rustc_hash::FxHashMap;

use crate::CodegenError;
use crate::generator::CGenerator;
use crate::types::{c_decl, c_format_spec, c_type};

impl CGenerator<'_> {
    /// Redirects emission into a scratch buffer; used to build the inner
    /// statements of statement expressions.
    fn capture<F>(&mut self, f: F) -> Result<String, CodegenError>
    where
        F: FnOnce(&mut Self) -> Result<(), CodegenError>,
    {
        let saved = std::mem::take(&mut self.out);
        let result = f(self);
        let captured = std::mem::replace(&mut self.out, saved);
        result?;
        Ok(captured)
    }

    #[allow(clippy::too_many_lines)]
    pub(crate) fn emit_expr(&mut self, expr: &Expression) -> Result<String, CodegenError> {
        match expr {
            Expression::Literal(literal) => Ok(self.emit_literal(literal)),
            Expression::Identifier(identifier) => Ok(identifier.name.clone()),
            Expression::Binary(binary) => {
                let left = self.emit_expr(&binary.left)?;
                let right = self.emit_expr(&binary.right)?;
                Ok(format!("({left} {} {right})", binary.op.as_str()))
            }
            Expression::Unary(unary) => {
                let operand = self.emit_expr(&unary.operand)?;
                Ok(format!("({}{operand})", unary.op))
            }
            Expression::Call(call) => self.emit_call(call),
            Expression::MethodCall(call) => self.emit_method_call(call),
            Expression::StaticCall(call) => self.emit_static_call(call),
            Expression::FieldAccess(access) => {
                let object = self.emit_expr(&access.object)?;
                if self.in_method && object == "self" {
                    Ok(format!("self->{}", access.field))
                } else if matches!(access.object, Expression::Identifier(_)) {
                    Ok(format!("{object}.{}", access.field))
                } else {
                    Ok(format!("({object}).{}", access.field))
                }
            }
            Expression::Index(index) => {
                let object = self.emit_expr(&index.object)?;
                let idx = self.emit_expr(&index.index)?;
                Ok(format!("{object}[{idx}]"))
            }
            Expression::Array(array) => {
                let element_ty = match self.ty_of(array.id) {
                    TypeInfo::Array { element, .. } => *element,
                    other => other,
                };
                let elements = array
                    .elements
                    .iter()
                    .map(|e| self.emit_expr(e))
                    .collect::<Result<Vec<_>, _>>()?
                    .join(", ");
                Ok(format!("({}[]){{ {elements} }}", c_type(&element_ty)))
            }
            Expression::Range(range) => Err(CodegenError::UnsupportedConstruct {
                name: "range expression outside a loop".to_string(),
                location: range.location.clone(),
            }),
            Expression::StructInit(init) => {
                let c_name = c_type(&self.ty_of(init.id));
                if init.fields.is_empty() {
                    return Ok(format!("(({c_name}){{0}})"));
                }
                let fields = init
                    .fields
                    .iter()
                    .map(|(name, value)| Ok(format!(".{name} = {}", self.emit_expr(value)?)))
                    .collect::<Result<Vec<_>, CodegenError>>()?
                    .join(", ");
                Ok(format!("(({c_name}){{ {fields} }})"))
            }
            Expression::If(if_expr) => self.emit_if(if_expr),
            Expression::Block(block) => self.emit_block_expr(block),
            Expression::Is(is_expr) => self.emit_is(is_expr),
            Expression::Try(try_expr) => {
                let inner_ty = self.ty_of(try_expr.inner.id());
                let inner = self.emit_expr(&try_expr.inner)?;
                let Some(enum_c) = nominal_c_name(&inner_ty) else {
                    return Err(CodegenError::UnsupportedConstruct {
                        name: "`?` on a non-enum value".to_string(),
                        location: try_expr.location.clone(),
                    });
                };
                let tmp = self.fresh_tmp("r");
                Ok(format!(
                    "({{ {enum_c} {tmp} = {inner}; if ({tmp}.tag == {enum_c}_TAG_Err) return {tmp}; {tmp}.data.Ok_value; }})"
                ))
            }
            Expression::Cast(cast) => {
                let target = self.resolved(
                    &TypeInfo::from_type_expr(&cast.target, &self.type_params, None)
                        .substitute(&self.bindings),
                );
                let value = self.emit_expr(&cast.value)?;
                Ok(format!("(({})({value}))", c_type(&target)))
            }
            Expression::Interp(interp) => self.emit_interpolation(interp),
            Expression::Reference(reference) => {
                let inner = self.emit_expr(&reference.inner)?;
                if is_lvalue(&reference.inner) {
                    Ok(format!("(&{inner})"))
                } else {
                    Ok(inner)
                }
            }
        }
    }

    fn emit_literal(&mut self, literal: &Literal) -> String {
        match literal {
            Literal::Int(int) => {
                let body = match int.radix {
                    16 => format!("0x{}", int.digits),
                    2 => {
                        // C has no binary literals; re-emit in decimal.
                        i128::from_str_radix(&int.digits, 2)
                            .map(|v| v.to_string())
                            .unwrap_or_else(|_| int.digits.clone())
                    }
                    _ => int.digits.clone(),
                };
                let suffix = match int.suffix.as_deref() {
                    Some("i64" | "i128") => "LL",
                    Some("u64" | "u128") => "ULL",
                    Some("u8" | "u16" | "u32") => "U",
                    _ => "",
                };
                format!("{body}{suffix}")
            }
            Literal::Float(float) => float.value.clone(),
            Literal::Bool(b) => if b.value { "true" } else { "false" }.to_string(),
            Literal::Char(c) => format!("'{}'", escape_char(c.value)),
            Literal::Str(s) => format!("\"{}\"", escape_string(&s.value)),
        }
    }

    fn emit_call(
        &mut self,
        call: &Rc<paw_ast::nodes::CallExpression>,
    ) -> Result<String, CodegenError> {
        let args = call
            .args
            .iter()
            .map(|a| self.emit_expr(a))
            .collect::<Result<Vec<_>, _>>()?
            .join(", ");

        if let Expression::Identifier(callee) = &call.callee {
            if let Some(info) = self.ctx.symbols().function(&callee.name) {
                if info.is_generic() {
                    let arg_types: Vec<TypeInfo> =
                        call.args.iter().map(|a| self.ty_of(a.id())).collect();
                    let result_ty = self.ty_of(call.id);
                    let Some(type_args) =
                        infer_call_type_args(info, &arg_types, Some(&result_ty))
                    else {
                        return Err(CodegenError::UnsupportedConstruct {
                            name: format!("unresolved generic call to `{}`", callee.name),
                            location: call.location.clone(),
                        });
                    };
                    return Ok(format!("{}({args})", mangle(&callee.name, &type_args)));
                }
                return Ok(format!("{}({args})", callee.name));
            }
            // Short variant constructors resolve through the enum_variants
            // symbol map to the mangled constructor.
            if self.ctx.symbols().enum_of_variant(&callee.name).is_some() {
                let enum_ty = self.ty_of(call.id);
                let Some(enum_c) = nominal_c_name(&enum_ty) else {
                    return Err(CodegenError::UnsupportedConstruct {
                        name: format!("variant constructor `{}`", callee.name),
                        location: call.location.clone(),
                    });
                };
                return Ok(format!("{enum_c}_{}({args})", callee.name));
            }
            return Ok(format!("{}({args})", callee.name));
        }
        let callee = self.emit_expr(&call.callee)?;
        Ok(format!("({callee})({args})"))
    }

    fn emit_method_call(
        &mut self,
        call: &Rc<paw_ast::nodes::MethodCallExpression>,
    ) -> Result<String, CodegenError> {
        let receiver_ty = self.ty_of(call.receiver.id());
        let Some(owner_c) = nominal_c_name(&receiver_ty) else {
            return Err(CodegenError::UnsupportedConstruct {
                name: format!("method call on `{receiver_ty}`"),
                location: call.location.clone(),
            });
        };
        let mut args = call
            .args
            .iter()
            .map(|a| self.emit_expr(a))
            .collect::<Result<Vec<_>, _>>()?;
        let receiver = self.emit_expr(&call.receiver)?;
        let function = format!("{owner_c}_{}", call.method);
        if is_lvalue(&call.receiver) {
            let receiver = if self.in_method && receiver == "self" {
                "self".to_string()
            } else {
                format!("&{receiver}")
            };
            args.insert(0, receiver);
            Ok(format!("{function}({})", args.join(", ")))
        } else {
            // Rvalue receiver: materialize a temporary to take its address.
            let tmp = self.fresh_tmp("recv");
            args.insert(0, format!("&{tmp}"));
            Ok(format!(
                "({{ {owner_c} {tmp} = {receiver}; {function}({}); }})",
                args.join(", ")
            ))
        }
    }

    fn emit_static_call(
        &mut self,
        call: &Rc<paw_ast::nodes::StaticCallExpression>,
    ) -> Result<String, CodegenError> {
        let type_args: Vec<TypeInfo> = call
            .type_args
            .iter()
            .map(|t| {
                self.resolved(
                    &TypeInfo::from_type_expr(t, &self.type_params, None)
                        .substitute(&self.bindings),
                )
            })
            .collect();
        let owner = if type_args.is_empty() {
            call.type_name.clone()
        } else {
            mangle(&call.type_name, &type_args)
        };
        let args = call
            .args
            .iter()
            .map(|a| self.emit_expr(a))
            .collect::<Result<Vec<_>, _>>()?
            .join(", ");
        Ok(format!("{owner}_{}({args})", call.method))
    }

    fn emit_if(
        &mut self,
        if_expr: &Rc<paw_ast::nodes::IfExpression>,
    ) -> Result<String, CodegenError> {
        let result_ty = self.ty_of(if_expr.id);
        let condition = self.emit_expr(&if_expr.condition)?;

        if result_ty.is_void() {
            let then_body = self.capture(|generator| {
                generator.emit_block_statements(&if_expr.then_branch, None)
            })?;
            let else_body = match &if_expr.else_branch {
                Some(else_branch) => {
                    let body = self.emit_void_branch(else_branch)?;
                    format!(" else {{ {body} }}")
                }
                None => String::new(),
            };
            return Ok(format!(
                "({{ if ({condition}) {{ {then_body} }}{else_body} }})"
            ));
        }

        let result = self.fresh_tmp("if_result");
        let then_body = self.capture(|generator| {
            generator.emit_block_statements(&if_expr.then_branch, Some(&result))
        })?;
        let else_body = match &if_expr.else_branch {
            Some(else_branch) => {
                let value = self.emit_expr(else_branch)?;
                format!(" else {{ {result} = {value}; }}")
            }
            None => String::new(),
        };
        Ok(format!(
            "({{ {}; if ({condition}) {{ {then_body} }}{else_body} {result}; }})",
            c_decl(&result_ty, &result)
        ))
    }

    fn emit_void_branch(&mut self, branch: &Expression) -> Result<String, CodegenError> {
        match branch {
            Expression::Block(block) => self.capture(|generator| {
                generator.emit_block_statements(block, None)
            }),
            other => {
                let value = self.emit_expr(other)?;
                Ok(format!("{value};"))
            }
        }
    }

    /// Emits a block's statements (and optional tail assignment into
    /// `target`) as flat C statements into the current buffer.
    fn emit_block_statements(
        &mut self,
        block: &Rc<BlockExpression>,
        target: Option<&str>,
    ) -> Result<(), CodegenError> {
        for statement in &block.statements {
            self.emit_statement(statement, 0)?;
        }
        match (&block.tail, target) {
            (Some(tail), Some(target)) => {
                let value = self.emit_expr(tail)?;
                let _ = writeln!(self.out, "{target} = {value};");
            }
            (Some(tail), None) => {
                let value = self.emit_expr(tail)?;
                let _ = writeln!(self.out, "{value};");
            }
            (None, _) => {}
        }
        Ok(())
    }

    fn emit_block_expr(
        &mut self,
        block: &Rc<BlockExpression>,
    ) -> Result<String, CodegenError> {
        let result_ty = self.ty_of(block.id);
        if result_ty.is_void() {
            let body = self.capture(|generator| generator.emit_block_statements(block, None))?;
            return Ok(format!("({{ {body} }})"));
        }
        let result = self.fresh_tmp("block_result");
        let body =
            self.capture(|generator| generator.emit_block_statements(block, Some(&result)))?;
        Ok(format!(
            "({{ {}; {body} {result}; }})",
            c_decl(&result_ty, &result)
        ))
    }

    // ---- pattern matching ----

    fn emit_is(&mut self, is_expr: &Rc<IsExpression>) -> Result<String, CodegenError> {
        let scrutinee_ty = self.ty_of(is_expr.scrutinee.id());
        let result_ty = self.ty_of(is_expr.id);
        let scrutinee = self.emit_expr(&is_expr.scrutinee)?;
        let scr = self.fresh_tmp("match_value");
        let res = self.fresh_tmp("match_result");
        let is_void = result_ty.is_void();

        let enum_layout = self.enum_layout_of(&scrutinee_ty);

        let mut body = String::new();
        let _ = write!(body, "{} {scr} = {scrutinee}; ", c_type(&scrutinee_ty));
        if !is_void {
            let _ = write!(body, "{}; ", c_decl(&result_ty, &res));
        }

        let mut first = true;
        for arm in &is_expr.arms {
            let connective = if first { "if" } else { "else if" };
            first = false;
            match &arm.pattern {
                Pattern::Wildcard => {
                    let value = self.emit_expr(&arm.body)?;
                    let assignment = if is_void {
                        format!("{value};")
                    } else {
                        format!("{res} = {value};")
                    };
                    // Irrefutable: matches everything, later arms are
                    // unreachable.
                    let prefix = if connective == "if" { "" } else { "else " };
                    let _ = write!(body, "{prefix}{{ {assignment} }} ");
                    break;
                }
                Pattern::Binding(name) if arm.guard.is_none() => {
                    let value = self.emit_expr(&arm.body)?;
                    let assignment = if is_void {
                        format!("{value};")
                    } else {
                        format!("{res} = {value};")
                    };
                    let prefix = if connective == "if" { "" } else { "else " };
                    let _ = write!(
                        body,
                        "{prefix}{{ {} = {scr}; {assignment} }} ",
                        c_decl(&scrutinee_ty, name)
                    );
                    break;
                }
                Pattern::Binding(name) => {
                    let guard_value = self
                        .emit_expr(arm.guard.as_ref().expect("guard checked above"))?;
                    let value = self.emit_expr(&arm.body)?;
                    let assignment = if is_void {
                        format!("{value};")
                    } else {
                        format!("{res} = {value};")
                    };
                    let _ = write!(
                        body,
                        "{connective} (({{ {} = {scr}; {guard_value}; }})) {{ {} = {scr}; {assignment} }} ",
                        c_decl(&scrutinee_ty, name),
                        c_decl(&scrutinee_ty, name)
                    );
                }
                Pattern::Literal(literal) => {
                    let lit = self.emit_literal(literal);
                    let mut condition = format!("{scr} == {lit}");
                    if let Some(guard) = &arm.guard {
                        let guard_value = self.emit_expr(guard)?;
                        condition = format!("{condition} && ({guard_value})");
                    }
                    let value = self.emit_expr(&arm.body)?;
                    let assignment = if is_void {
                        format!("{value};")
                    } else {
                        format!("{res} = {value};")
                    };
                    let _ = write!(body, "{connective} ({condition}) {{ {assignment} }} ");
                }
                Pattern::Variant { name, binders } => {
                    let Some((enum_c, payloads)) = enum_layout
                        .as_ref()
                        .and_then(|l| l.get(name).map(|p| (l.c_name(), p)))
                    else {
                        return Err(CodegenError::UnsupportedConstruct {
                            name: format!("variant pattern `{name}` on `{scrutinee_ty}`"),
                            location: arm.location.clone(),
                        });
                    };
                    let extraction = extraction_statements(&scr, name, binders, payloads);
                    let mut condition = format!("{scr}.tag == {enum_c}_TAG_{name}");
                    if let Some(guard) = &arm.guard {
                        let guard_value = self.emit_expr(guard)?;
                        condition =
                            format!("{condition} && (({{ {extraction}{guard_value}; }}))");
                    }
                    let value = self.emit_expr(&arm.body)?;
                    let assignment = if is_void {
                        format!("{value};")
                    } else {
                        format!("{res} = {value};")
                    };
                    let _ = write!(
                        body,
                        "{connective} ({condition}) {{ {extraction}{assignment} }} "
                    );
                }
            }
        }

        if is_void {
            Ok(format!("({{ {body}}})"))
        } else {
            Ok(format!("({{ {body}{res}; }})"))
        }
    }

    /// Variant payload layout of the scrutinee's enum, substituted for the
    /// concrete instance: variant name -> payload C declarations.
    fn enum_layout_of(&self, scrutinee_ty: &TypeInfo) -> Option<VariantPayloads> {
        let name = scrutinee_ty.nominal_name()?;
        let info = self.ctx.symbols().enum_info(name)?;
        let mut bindings: FxHashMap<String, TypeInfo> = FxHashMap::default();
        for (param, arg) in info.type_params.iter().zip(scrutinee_ty.type_args()) {
            bindings.insert(param.clone(), arg.clone());
        }
        let c_name = nominal_c_name(scrutinee_ty)?;
        let mut payloads = FxHashMap::default();
        for variant in &info.variants {
            payloads.insert(
                variant.name.clone(),
                variant
                    .payloads
                    .iter()
                    .map(|p| p.substitute(&bindings))
                    .collect::<Vec<_>>(),
            );
        }
        Some(VariantPayloads { c_name, payloads })
    }

    fn emit_interpolation(
        &mut self,
        interp: &Rc<paw_ast::nodes::StringInterpolation>,
    ) -> Result<String, CodegenError> {
        let buf = self.fresh_tmp("buf");
        let mut body = format!("static char {buf}[1024]; {buf}[0] = '\\0'; ");
        for segment in &interp.segments {
            match segment {
                InterpSegment::Literal(text) => {
                    let _ = write!(body, "strcat({buf}, \"{}\"); ", escape_string(text));
                }
                InterpSegment::Expr(expr) => {
                    let ty = self.ty_of(expr.id());
                    let value = self.emit_expr(expr)?;
                    if ty.is_string() {
                        let _ = write!(body, "strcat({buf}, {value}); ");
                    } else if ty.is_bool() {
                        let _ =
                            write!(body, "strcat({buf}, ({value}) ? \"true\" : \"false\"); ");
                    } else if let Some(spec) = c_format_spec(&ty) {
                        let tmp = self.fresh_tmp("seg");
                        let _ = write!(
                            body,
                            "{{ char {tmp}[64]; sprintf({tmp}, \"{spec}\", {value}); strcat({buf}, {tmp}); }} "
                        );
                    } else {
                        return Err(CodegenError::UnsupportedConstruct {
                            name: format!("interpolation of `{ty}`"),
                            location: expr.location(),
                        });
                    }
                }
            }
        }
        Ok(format!("({{ {body}{buf}; }})"))
    }
}

struct VariantPayloads {
    c_name: String,
    payloads: FxHashMap<String, Vec<TypeInfo>>,
}

impl VariantPayloads {
    fn get(&self, variant: &str) -> Option<&Vec<TypeInfo>> {
        self.payloads.get(variant)
    }

    fn c_name(&self) -> String {
        self.c_name.clone()
    }
}

/// Local declarations extracting variant payloads into the binder names.
fn extraction_statements(
    scr: &str,
    variant: &str,
    binders: &[String],
    payloads: &[TypeInfo],
) -> String {
    let mut out = String::new();
    for (index, (binder, payload)) in binders.iter().zip(payloads).enumerate() {
        if binder == "_" {
            continue;
        }
        let access = if payloads.len() == 1 {
            format!("{scr}.data.{variant}_value")
        } else {
            format!("{scr}.data.{variant}_value.field{index}")
        };
        let _ = write!(out, "{} = {access}; ", c_decl(payload, binder));
    }
    out
}

/// The C typedef name of a nominal type, mangled for generic instances.
fn nominal_c_name(ty: &TypeInfo) -> Option<String> {
    match ty.deref_alias() {
        TypeInfo::Named(name) => Some(name.clone()),
        TypeInfo::GenericInstance(..) => Some(mangle_type(ty.deref_alias())),
        _ => None,
    }
}

/// Conservative lvalue check: identifiers, field accesses and index
/// expressions rooted at an lvalue.
fn is_lvalue(expr: &Expression) -> bool {
    match expr {
        Expression::Identifier(_) => true,
        Expression::FieldAccess(access) => is_lvalue(&access.object),
        Expression::Index(index) => is_lvalue(&index.object),
        _ => false,
    }
}

fn escape_char(c: char) -> String {
    match c {
        '\n' => "\\n".to_string(),
        '\t' => "\\t".to_string(),
        '\r' => "\\r".to_string(),
        '\0' => "\\0".to_string(),
        '\'' => "\\'".to_string(),
        '\\' => "\\\\".to_string(),
        other => other.to_string(),
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}
