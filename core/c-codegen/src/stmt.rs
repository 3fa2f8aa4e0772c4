//! Statement lowering for the C backend.
//!
//! Loop lowering follows the source forms: bare `loop` becomes `for (;;)`,
//! a conditioned loop becomes `while`, a range iteration becomes a counted
//! `for`, and an array iteration becomes a bounded-index `for` using
//! `sizeof(arr)/sizeof(arr[0])` for statically sized arrays.

use std::fmt::Write as _;

use paw_ast::nodes::{Expression, FunctionDecl, LoopStatement, Statement};
use paw_type_checker::type_info::TypeInfo;
use std::rc::Rc;

use crate::CodegenError;
use crate::generator::CGenerator;
use crate::types::{c_decl, c_type};

impl CGenerator<'_> {
    pub(crate) fn emit_function_body(
        &mut self,
        decl: &Rc<FunctionDecl>,
        return_type: &TypeInfo,
        is_main: bool,
    ) -> Result<(), CodegenError> {
        for statement in &decl.body.statements {
            self.emit_statement(statement, 1)?;
        }
        if let Some(tail) = &decl.body.tail {
            let value = self.emit_expr(tail)?;
            if return_type.is_void() {
                let _ = writeln!(self.out, "    {value};");
            } else if is_main {
                let _ = writeln!(self.out, "    return (int)({value});");
            } else {
                let _ = writeln!(self.out, "    return {value};");
            }
        } else if is_main {
            self.out.push_str("    return 0;\n");
        }
        Ok(())
    }

    pub(crate) fn emit_statement(
        &mut self,
        statement: &Statement,
        indent: usize,
    ) -> Result<(), CodegenError> {
        let pad = "    ".repeat(indent);
        match statement {
            Statement::Let(let_stmt) => {
                let ty = self.ty_of(let_stmt.id);
                match &let_stmt.value {
                    Some(Expression::Array(array)) => {
                        // Array literals initialize in place.
                        let elements = array
                            .elements
                            .iter()
                            .map(|e| self.emit_expr(e))
                            .collect::<Result<Vec<_>, _>>()?
                            .join(", ");
                        let _ = writeln!(
                            self.out,
                            "{pad}{} = {{ {elements} }};",
                            c_decl(&ty, &let_stmt.name)
                        );
                    }
                    Some(value) => {
                        let value = self.emit_expr(value)?;
                        let _ = writeln!(
                            self.out,
                            "{pad}{} = {value};",
                            c_decl(&ty, &let_stmt.name)
                        );
                    }
                    None => {
                        let _ = writeln!(self.out, "{pad}{};", c_decl(&ty, &let_stmt.name));
                    }
                }
            }
            Statement::Assign(assign) => {
                let target = self.emit_expr(&assign.target)?;
                let value = self.emit_expr(&assign.value)?;
                let _ = writeln!(self.out, "{pad}{target} = {value};");
            }
            Statement::CompoundAssign(assign) => {
                let target = self.emit_expr(&assign.target)?;
                let value = self.emit_expr(&assign.value)?;
                let _ = writeln!(self.out, "{pad}{target} {}= {value};", assign.op.as_str());
            }
            Statement::Return(ret) => match &ret.value {
                Some(value) => {
                    let value = self.emit_expr(value)?;
                    let _ = writeln!(self.out, "{pad}return {value};");
                }
                None => {
                    let _ = writeln!(self.out, "{pad}return;");
                }
            },
            Statement::Loop(loop_stmt) => self.emit_loop(loop_stmt, indent)?,
            Statement::Break(_) => {
                let _ = writeln!(self.out, "{pad}break;");
            }
            Statement::Continue(_) => {
                let _ = writeln!(self.out, "{pad}continue;");
            }
            Statement::Expression(expr) => {
                let value = self.emit_expr(expr)?;
                let _ = writeln!(self.out, "{pad}{value};");
            }
        }
        Ok(())
    }

    fn emit_loop(&mut self, loop_stmt: &Rc<LoopStatement>, indent: usize) -> Result<(), CodegenError> {
        let pad = "    ".repeat(indent);

        if let Some(iterable) = &loop_stmt.iterable {
            return self.emit_iterator_loop(loop_stmt, iterable, indent);
        }
        if let Some(condition) = &loop_stmt.condition {
            let condition = self.emit_expr(condition)?;
            let _ = writeln!(self.out, "{pad}while ({condition}) {{");
        } else {
            let _ = writeln!(self.out, "{pad}for (;;) {{");
        }
        self.emit_loop_body(loop_stmt, indent)?;
        let _ = writeln!(self.out, "{pad}}}");
        Ok(())
    }

    fn emit_iterator_loop(
        &mut self,
        loop_stmt: &Rc<LoopStatement>,
        iterable: &Expression,
        indent: usize,
    ) -> Result<(), CodegenError> {
        let pad = "    ".repeat(indent);
        let binder = loop_stmt.binder.as_deref().unwrap_or("_");
        let element_ty = self.ty_of(loop_stmt.id);
        let element = c_type(&element_ty);

        match iterable {
            Expression::Range(range) => {
                let lo = self.emit_expr(&range.start)?;
                let hi = self.emit_expr(&range.end)?;
                let cmp = if range.inclusive { "<=" } else { "<" };
                let _ = writeln!(
                    self.out,
                    "{pad}for ({element} {binder} = {lo}; {binder} {cmp} {hi}; {binder}++) {{"
                );
                self.emit_loop_body(loop_stmt, indent)?;
                let _ = writeln!(self.out, "{pad}}}");
            }
            Expression::Identifier(identifier) => {
                let index = self.fresh_tmp("i");
                let name = &identifier.name;
                let _ = writeln!(
                    self.out,
                    "{pad}for (size_t {index} = 0; {index} < sizeof({name}) / sizeof({name}[0]); {index}++) {{"
                );
                let inner_pad = "    ".repeat(indent + 1);
                let _ = writeln!(self.out, "{inner_pad}{element} {binder} = {name}[{index}];");
                self.emit_loop_body(loop_stmt, indent)?;
                let _ = writeln!(self.out, "{pad}}}");
            }
            Expression::Array(array) => {
                let storage = self.fresh_tmp("it");
                let index = self.fresh_tmp("i");
                let elements = array
                    .elements
                    .iter()
                    .map(|e| self.emit_expr(e))
                    .collect::<Result<Vec<_>, _>>()?
                    .join(", ");
                let _ = writeln!(self.out, "{pad}{{");
                let inner_pad = "    ".repeat(indent + 1);
                let _ = writeln!(self.out, "{inner_pad}{element} {storage}[] = {{ {elements} }};");
                let _ = writeln!(
                    self.out,
                    "{inner_pad}for (size_t {index} = 0; {index} < sizeof({storage}) / sizeof({storage}[0]); {index}++) {{"
                );
                let deep_pad = "    ".repeat(indent + 2);
                let _ = writeln!(self.out, "{deep_pad}{element} {binder} = {storage}[{index}];");
                for statement in &loop_stmt.body.statements {
                    self.emit_statement(statement, indent + 2)?;
                }
                if let Some(tail) = &loop_stmt.body.tail {
                    let value = self.emit_expr(tail)?;
                    let _ = writeln!(self.out, "{deep_pad}{value};");
                }
                let _ = writeln!(self.out, "{inner_pad}}}");
                let _ = writeln!(self.out, "{pad}}}");
            }
            other => {
                return Err(CodegenError::UnsupportedConstruct {
                    name: "loop iterator source".to_string(),
                    location: other.location(),
                });
            }
        }
        Ok(())
    }

    fn emit_loop_body(
        &mut self,
        loop_stmt: &Rc<LoopStatement>,
        indent: usize,
    ) -> Result<(), CodegenError> {
        for statement in &loop_stmt.body.statements {
            self.emit_statement(statement, indent + 1)?;
        }
        if let Some(tail) = &loop_stmt.body.tail {
            let value = self.emit_expr(tail)?;
            let inner_pad = "    ".repeat(indent + 1);
            let _ = writeln!(self.out, "{inner_pad}{value};");
        }
        Ok(())
    }
}
