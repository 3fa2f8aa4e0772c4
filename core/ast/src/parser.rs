//! Recursive-descent parser for PawLang.
//!
//! One module is parsed at a time into the shared [`Arena`]. Binary
//! expressions use Pratt-style binding powers; everything else is plain
//! descent. The single grammar ambiguity — `Name <` as generic arguments
//! versus comparison — is resolved with the `known_types` table populated by
//! a pre-scan over the token stream (see [`ParserContext`]): the identifier
//! must be a declared type name AND the token after `<` must be able to
//! begin a type.
//!
//! Statements terminate at `;` or at a statement-level newline token; the
//! lexer already suppresses newlines that cannot end a statement. A block
//! whose final expression has no trailing terminator evaluates to that
//! expression.

use std::rc::Rc;

use crate::arena::Arena;
use crate::errors::ParseError;
use crate::lexer::tokenize;
use crate::nodes::{
    ArrayLiteralExpression, ArrayType, Ast, AssignStatement, AstNode, BinaryExpression, BinaryOp,
    BlockExpression, BoolLiteral, BreakStatement, CallExpression, CastExpression, CharLiteral,
    CompoundAssignStatement, ContinueStatement, Declaration, EnumVariant, Expression,
    FieldAccessExpression, FloatLiteral, FunctionDecl, FunctionType, GenericInstanceType,
    Identifier, IfExpression, ImplBlock, ImportDecl, ImportItems, IndexExpression, IntLiteral,
    InterpSegment, IsArm, IsExpression, LetStatement, Literal, Location, LoopStatement,
    MethodCallExpression, Misc, ModuleAst, NamedType, Parameter, Pattern, PointerType,
    RangeExpression, ReferenceExpression, ReturnStatement, SelfTypeNode, Statement, StaticCallExpression,
    StrLiteral, StringInterpolation, StructField, StructInitExpression, TraitMethodSig,
    TryExpression, TypeDecl, TypeDeclKind, TypeExpr, UnaryExpression, UnaryOp, Visibility,
};
use crate::parser_context::ParserContext;
use crate::token::{Token, TokenKind};

/// Parses one module's source text into the shared arena.
///
/// `module_path` is the dotted module path used later by the linker (the
/// root module uses its file stem).
///
/// # Errors
///
/// Returns the first lexical or syntactic error; nothing is recovered.
pub fn parse_module(
    text: &str,
    source_name: &str,
    module_path: &str,
    ctx: &mut ParserContext,
    arena: &mut Arena,
) -> Result<Rc<ModuleAst>, ParseError> {
    let tokens = tokenize(text, source_name)?;
    ctx.scan_type_declarations(&tokens);
    let mut parser = Parser {
        tokens,
        pos: 0,
        source: source_name.to_string(),
        ctx,
        arena,
        parent_stack: vec![],
    };
    parser.parse_module_ast(module_path)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: String,
    ctx: &'a mut ParserContext,
    arena: &'a mut Arena,
    parent_stack: Vec<u32>,
}

impl Parser<'_> {
    // ---- token cursor ----

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        Err(self.unexpected(kind.as_str()))
    }

    /// Like [`Parser::expect`] for closing delimiters: hitting end of file
    /// reports the unclosed opener instead of a generic mismatch.
    fn expect_closing(&mut self, kind: TokenKind, open: &Location) -> Result<Token, ParseError> {
        if self.check(TokenKind::Eof) {
            let delimiter = match kind {
                TokenKind::RParen => TokenKind::LParen,
                TokenKind::RBracket => TokenKind::LBracket,
                _ => TokenKind::LBrace,
            };
            return Err(ParseError::UnclosedDelimiter {
                delimiter,
                location: open.clone(),
            });
        }
        self.expect(kind)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: token.kind,
            location: self.token_location(token),
        }
    }

    fn token_location(&self, token: &Token) -> Location {
        Location::new(token.line, token.column, self.source.clone())
    }

    fn here(&self) -> Location {
        self.token_location(self.peek())
    }

    fn skip_terminators(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    // ---- arena bookkeeping ----

    fn begin_node(&mut self) -> u32 {
        let id = self.ctx.next_node_id();
        self.parent_stack.push(id);
        id
    }

    fn finish_node(&mut self, node: AstNode) {
        self.parent_stack.pop();
        let parent = self.parent_stack.last().copied().unwrap_or(0);
        self.arena.add_node(node, parent);
    }

    // ---- top level ----

    fn parse_module_ast(&mut self, module_path: &str) -> Result<Rc<ModuleAst>, ParseError> {
        let id = self.begin_node();
        let location = self.here();
        let mut imports = Vec::new();
        let mut declarations = Vec::new();

        loop {
            self.skip_terminators();
            if self.check(TokenKind::Eof) {
                break;
            }
            match self.peek_kind() {
                TokenKind::KwImport => {
                    let import = self.parse_import()?;
                    imports.push(import.clone());
                    declarations.push(Declaration::Import(import));
                }
                TokenKind::KwImpl => {
                    declarations.push(Declaration::Impl(self.parse_impl_block()?));
                }
                TokenKind::KwPub | TokenKind::KwFn | TokenKind::KwType | TokenKind::KwAsync => {
                    let visibility = if self.eat(TokenKind::KwPub) {
                        Visibility::Public
                    } else {
                        Visibility::Private
                    };
                    match self.peek_kind() {
                        TokenKind::KwFn | TokenKind::KwAsync => {
                            declarations
                                .push(Declaration::Function(self.parse_function(visibility)?));
                        }
                        TokenKind::KwType => {
                            declarations.push(Declaration::Type(self.parse_type_decl(visibility)?));
                        }
                        _ => return Err(self.unexpected("`fn` or `type`")),
                    }
                }
                _ => return Err(self.unexpected("a top-level declaration")),
            }
        }

        let module = Rc::new(ModuleAst {
            id,
            location,
            path: module_path.to_string(),
            imports,
            declarations,
        });
        self.finish_node(AstNode::Ast(Ast::Module(module.clone())));
        Ok(module)
    }

    fn parse_import(&mut self) -> Result<Rc<ImportDecl>, ParseError> {
        let id = self.begin_node();
        let location = self.here();
        self.expect(TokenKind::KwImport)?;
        let mut segments = vec![self.expect(TokenKind::Identifier)?.lexeme];
        let mut items = None;
        while self.eat(TokenKind::Dot) {
            match self.peek_kind() {
                TokenKind::Identifier => segments.push(self.advance().lexeme),
                TokenKind::Star => {
                    self.advance();
                    items = Some(ImportItems::Glob);
                    break;
                }
                TokenKind::LBrace => {
                    self.advance();
                    let mut names = Vec::new();
                    loop {
                        self.skip_newlines();
                        names.push(self.expect(TokenKind::Identifier)?.lexeme);
                        self.skip_newlines();
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.skip_newlines();
                    self.expect(TokenKind::RBrace)?;
                    items = Some(ImportItems::List(names));
                    break;
                }
                _ => return Err(self.unexpected("an import item")),
            }
        }
        let items = items.unwrap_or_else(|| {
            ImportItems::Single(segments.last().expect("at least one segment").clone())
        });
        let import = Rc::new(ImportDecl {
            id,
            location,
            segments,
            items,
        });
        self.finish_node(AstNode::Declaration(Declaration::Import(import.clone())));
        Ok(import)
    }

    fn parse_impl_block(&mut self) -> Result<Rc<ImplBlock>, ParseError> {
        let id = self.begin_node();
        let location = self.here();
        self.expect(TokenKind::KwImpl)?;
        let first = self.expect(TokenKind::Identifier)?.lexeme;
        let (trait_name, target) = if self.eat(TokenKind::KwIn) {
            (Some(first), self.expect(TokenKind::Identifier)?.lexeme)
        } else {
            (None, first)
        };
        let open = self.here();
        self.expect(TokenKind::LBrace)?;
        let mut methods = Vec::new();
        loop {
            self.skip_terminators();
            if self.check(TokenKind::RBrace) || self.check(TokenKind::Eof) {
                break;
            }
            let visibility = if self.eat(TokenKind::KwPub) {
                Visibility::Public
            } else {
                Visibility::Private
            };
            methods.push(self.parse_function(visibility)?);
        }
        self.expect_closing(TokenKind::RBrace, &open)?;
        let block = Rc::new(ImplBlock {
            id,
            location,
            target,
            trait_name,
            methods,
        });
        self.finish_node(AstNode::Declaration(Declaration::Impl(block.clone())));
        Ok(block)
    }

    fn parse_function(&mut self, visibility: Visibility) -> Result<Rc<FunctionDecl>, ParseError> {
        let id = self.begin_node();
        let location = self.here();
        let is_async = self.eat(TokenKind::KwAsync);
        self.expect(TokenKind::KwFn)?;
        let name = self.parse_identifier()?;

        let mut type_params = Vec::new();
        if self.eat(TokenKind::Lt) {
            loop {
                type_params.push(self.parse_identifier()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Gt)?;
        }

        let open = self.here();
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        loop {
            if self.check(TokenKind::RParen) {
                break;
            }
            params.push(self.parse_parameter()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect_closing(TokenKind::RParen, &open)?;

        let return_type = if self.eat(TokenKind::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = if self.eat(TokenKind::Assign) {
            // Single-expression form: `fn f(...) -> T = expr`.
            let body_id = self.begin_node();
            let body_location = self.here();
            let tail = self.parse_expression()?;
            let block = Rc::new(BlockExpression {
                id: body_id,
                location: body_location,
                statements: vec![],
                tail: Some(tail),
            });
            self.finish_node(AstNode::Expression(Expression::Block(block.clone())));
            block
        } else {
            self.parse_block()?
        };

        let function = Rc::new(FunctionDecl {
            id,
            location,
            visibility,
            name,
            type_params,
            params,
            return_type,
            body,
            is_async,
        });
        self.finish_node(AstNode::Declaration(Declaration::Function(function.clone())));
        Ok(function)
    }

    fn parse_parameter(&mut self) -> Result<Rc<Parameter>, ParseError> {
        let id = self.begin_node();
        let location = self.here();
        let is_mut = self.eat(TokenKind::KwMut);
        let parameter = if self.eat(TokenKind::KwSelfValue) {
            Rc::new(Parameter {
                id,
                location,
                name: "self".to_string(),
                is_mut,
                is_self: true,
                ty: None,
            })
        } else {
            let name = self.expect(TokenKind::Identifier)?.lexeme;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type()?;
            Rc::new(Parameter {
                id,
                location,
                name,
                is_mut,
                is_self: false,
                ty: Some(ty),
            })
        };
        self.finish_node(AstNode::Misc(Misc::Parameter(parameter.clone())));
        Ok(parameter)
    }

    fn parse_type_decl(&mut self, visibility: Visibility) -> Result<Rc<TypeDecl>, ParseError> {
        let id = self.begin_node();
        let location = self.here();
        self.expect(TokenKind::KwType)?;
        let name = self.parse_identifier()?;
        self.ctx.register_type(&name.name);

        let mut type_params = Vec::new();
        if self.eat(TokenKind::Lt) {
            loop {
                type_params.push(self.parse_identifier()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Gt)?;
        }

        self.expect(TokenKind::Assign)?;
        let kind = match self.peek_kind() {
            TokenKind::KwStruct => {
                self.advance();
                self.parse_struct_body()?
            }
            TokenKind::KwEnum => {
                self.advance();
                self.parse_enum_body()?
            }
            TokenKind::KwTrait => {
                self.advance();
                self.parse_trait_body()?
            }
            _ => TypeDeclKind::Alias(self.parse_type()?),
        };

        let decl = Rc::new(TypeDecl {
            id,
            location,
            visibility,
            name,
            type_params,
            kind,
        });
        self.finish_node(AstNode::Declaration(Declaration::Type(decl.clone())));
        Ok(decl)
    }

    fn parse_struct_body(&mut self) -> Result<TypeDeclKind, ParseError> {
        let open = self.here();
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        let mut methods = Vec::new();
        loop {
            self.skip_terminators();
            while self.eat(TokenKind::Comma) {
                self.skip_terminators();
            }
            if self.check(TokenKind::RBrace) || self.check(TokenKind::Eof) {
                break;
            }
            let visibility = if self.eat(TokenKind::KwPub) {
                Visibility::Public
            } else {
                Visibility::Private
            };
            if self.check(TokenKind::KwFn) || self.check(TokenKind::KwAsync) {
                methods.push(self.parse_function(visibility)?);
            } else {
                let field_id = self.begin_node();
                let field_location = self.here();
                let name = self.expect(TokenKind::Identifier)?.lexeme;
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type()?;
                let field = Rc::new(StructField {
                    id: field_id,
                    location: field_location,
                    visibility,
                    name,
                    ty,
                });
                self.finish_node(AstNode::Misc(Misc::StructField(field.clone())));
                fields.push(field);
            }
        }
        self.expect_closing(TokenKind::RBrace, &open)?;
        Ok(TypeDeclKind::Struct { fields, methods })
    }

    fn parse_enum_body(&mut self) -> Result<TypeDeclKind, ParseError> {
        let open = self.here();
        self.expect(TokenKind::LBrace)?;
        let mut variants = Vec::new();
        let mut methods = Vec::new();
        loop {
            self.skip_terminators();
            while self.eat(TokenKind::Comma) {
                self.skip_terminators();
            }
            if self.check(TokenKind::RBrace) || self.check(TokenKind::Eof) {
                break;
            }
            let visibility = if self.eat(TokenKind::KwPub) {
                Visibility::Public
            } else {
                Visibility::Private
            };
            if self.check(TokenKind::KwFn) || self.check(TokenKind::KwAsync) {
                methods.push(self.parse_function(visibility)?);
                continue;
            }
            let variant_id = self.begin_node();
            let variant_location = self.here();
            let name = self.expect(TokenKind::Identifier)?.lexeme;
            let mut payloads = Vec::new();
            if self.eat(TokenKind::LParen) {
                loop {
                    payloads.push(self.parse_type()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen)?;
            }
            let variant = Rc::new(EnumVariant {
                id: variant_id,
                location: variant_location,
                name,
                payloads,
            });
            self.finish_node(AstNode::Misc(Misc::EnumVariant(variant.clone())));
            variants.push(variant);
        }
        self.expect_closing(TokenKind::RBrace, &open)?;
        Ok(TypeDeclKind::Enum { variants, methods })
    }

    fn parse_trait_body(&mut self) -> Result<TypeDeclKind, ParseError> {
        let open = self.here();
        self.expect(TokenKind::LBrace)?;
        let mut methods = Vec::new();
        loop {
            self.skip_terminators();
            if self.check(TokenKind::RBrace) || self.check(TokenKind::Eof) {
                break;
            }
            let sig_id = self.begin_node();
            let sig_location = self.here();
            self.expect(TokenKind::KwFn)?;
            let name = self.expect(TokenKind::Identifier)?.lexeme;
            let open_paren = self.here();
            self.expect(TokenKind::LParen)?;
            let mut params = Vec::new();
            loop {
                if self.check(TokenKind::RParen) {
                    break;
                }
                params.push(self.parse_parameter()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect_closing(TokenKind::RParen, &open_paren)?;
            let return_type = if self.eat(TokenKind::Arrow) {
                Some(self.parse_type()?)
            } else {
                None
            };
            let sig = Rc::new(TraitMethodSig {
                id: sig_id,
                location: sig_location,
                name,
                params,
                return_type,
            });
            self.finish_node(AstNode::Misc(Misc::TraitMethodSig(sig.clone())));
            methods.push(sig);
        }
        self.expect_closing(TokenKind::RBrace, &open)?;
        Ok(TypeDeclKind::Trait { methods })
    }

    fn parse_identifier(&mut self) -> Result<Rc<Identifier>, ParseError> {
        let id = self.begin_node();
        let token = self.expect(TokenKind::Identifier)?;
        let location = self.token_location(&token);
        let identifier = Rc::new(Identifier {
            id,
            location,
            name: token.lexeme,
        });
        self.finish_node(AstNode::Expression(Expression::Identifier(
            identifier.clone(),
        )));
        Ok(identifier)
    }

    // ---- types ----

    fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        match self.peek_kind() {
            TokenKind::Amp => {
                let id = self.begin_node();
                let location = self.here();
                self.advance();
                let is_mut = self.eat(TokenKind::KwMut);
                let inner = self.parse_type()?;
                let node = Rc::new(PointerType {
                    id,
                    location,
                    is_mut,
                    inner,
                });
                self.finish_node(AstNode::TypeExpr(TypeExpr::Pointer(node.clone())));
                Ok(TypeExpr::Pointer(node))
            }
            TokenKind::LBracket => {
                let id = self.begin_node();
                let location = self.here();
                self.advance();
                let element = self.parse_type()?;
                let size = if self.eat(TokenKind::Semicolon) {
                    let token = self.expect(TokenKind::Int)?;
                    Some(token.lexeme.parse::<u32>().unwrap_or(0))
                } else {
                    None
                };
                self.expect(TokenKind::RBracket)?;
                let node = Rc::new(ArrayType {
                    id,
                    location,
                    element,
                    size,
                });
                self.finish_node(AstNode::TypeExpr(TypeExpr::Array(node.clone())));
                Ok(TypeExpr::Array(node))
            }
            TokenKind::KwFn => {
                let id = self.begin_node();
                let location = self.here();
                self.advance();
                let open = self.here();
                self.expect(TokenKind::LParen)?;
                let mut params = Vec::new();
                loop {
                    if self.check(TokenKind::RParen) {
                        break;
                    }
                    params.push(self.parse_type()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect_closing(TokenKind::RParen, &open)?;
                let ret = if self.eat(TokenKind::Arrow) {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                let node = Rc::new(FunctionType {
                    id,
                    location,
                    params,
                    ret,
                });
                self.finish_node(AstNode::TypeExpr(TypeExpr::Function(node.clone())));
                Ok(TypeExpr::Function(node))
            }
            TokenKind::KwSelfType => {
                let id = self.begin_node();
                let location = self.here();
                self.advance();
                let node = Rc::new(SelfTypeNode { id, location });
                self.finish_node(AstNode::TypeExpr(TypeExpr::SelfType(node.clone())));
                Ok(TypeExpr::SelfType(node))
            }
            TokenKind::Identifier => {
                let id = self.begin_node();
                let token = self.advance();
                let location = self.token_location(&token);
                let name = token.lexeme;
                if self.eat(TokenKind::Lt) {
                    let mut args = Vec::new();
                    loop {
                        args.push(self.parse_type()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::Gt)?;
                    let node = Rc::new(GenericInstanceType {
                        id,
                        location,
                        name,
                        args,
                    });
                    self.finish_node(AstNode::TypeExpr(TypeExpr::Instance(node.clone())));
                    return Ok(TypeExpr::Instance(node));
                }
                let node = Rc::new(NamedType { id, location, name });
                self.finish_node(AstNode::TypeExpr(TypeExpr::Named(node.clone())));
                Ok(TypeExpr::Named(node))
            }
            _ => Err(self.unexpected("a type")),
        }
    }

    /// True when the current token can begin a type, per the generic
    /// disambiguation rule.
    fn token_begins_type(&self, token: &Token) -> bool {
        matches!(
            token.kind,
            TokenKind::Identifier
                | TokenKind::LBracket
                | TokenKind::LParen
                | TokenKind::Amp
                | TokenKind::KwFn
                | TokenKind::KwSelfType
        )
    }

    // ---- statements ----

    fn parse_block(&mut self) -> Result<Rc<BlockExpression>, ParseError> {
        let id = self.begin_node();
        let location = self.here();
        let open = self.here();
        self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        let mut tail = None;
        loop {
            self.skip_terminators();
            if self.check(TokenKind::RBrace) || self.check(TokenKind::Eof) {
                break;
            }
            let statement = self.parse_statement()?;
            // An expression directly followed by `}` is the block's value.
            if self.check(TokenKind::RBrace) {
                if let Statement::Expression(expr) = statement {
                    tail = Some(expr);
                    break;
                }
                statements.push(statement);
                break;
            }
            if !matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semicolon) {
                // Brace-ended constructs (if/loop/is blocks) need no
                // terminator; anything else does.
                if !statement.is_block_terminated() {
                    return Err(self.unexpected("`;` or a newline"));
                }
            }
            statements.push(statement);
        }
        self.expect_closing(TokenKind::RBrace, &open)?;
        let block = Rc::new(BlockExpression {
            id,
            location,
            statements,
            tail,
        });
        self.finish_node(AstNode::Expression(Expression::Block(block.clone())));
        Ok(block)
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek_kind() {
            TokenKind::KwLet => self.parse_let(),
            TokenKind::KwReturn => {
                let id = self.begin_node();
                let location = self.here();
                self.advance();
                let value = if matches!(
                    self.peek_kind(),
                    TokenKind::Newline | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
                ) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                let node = Rc::new(ReturnStatement {
                    id,
                    location,
                    value,
                });
                self.finish_node(AstNode::Statement(Statement::Return(node.clone())));
                Ok(Statement::Return(node))
            }
            TokenKind::KwBreak => {
                let id = self.begin_node();
                let location = self.here();
                self.advance();
                let value = if matches!(
                    self.peek_kind(),
                    TokenKind::Newline | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
                ) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                let node = Rc::new(BreakStatement {
                    id,
                    location,
                    value,
                });
                self.finish_node(AstNode::Statement(Statement::Break(node.clone())));
                Ok(Statement::Break(node))
            }
            TokenKind::KwContinue => {
                let id = self.begin_node();
                let location = self.here();
                self.advance();
                let node = Rc::new(ContinueStatement { id, location });
                self.finish_node(AstNode::Statement(Statement::Continue(node.clone())));
                Ok(Statement::Continue(node))
            }
            TokenKind::KwLoop => self.parse_loop(),
            _ => {
                let expr = self.parse_expression()?;
                match self.peek_kind() {
                    TokenKind::Assign => {
                        let id = self.begin_node();
                        let location = self.here();
                        self.advance();
                        let value = self.parse_expression()?;
                        let node = Rc::new(AssignStatement {
                            id,
                            location,
                            target: expr,
                            value,
                        });
                        self.finish_node(AstNode::Statement(Statement::Assign(node.clone())));
                        Ok(Statement::Assign(node))
                    }
                    TokenKind::PlusEq
                    | TokenKind::MinusEq
                    | TokenKind::StarEq
                    | TokenKind::SlashEq
                    | TokenKind::PercentEq => {
                        let id = self.begin_node();
                        let location = self.here();
                        let op = match self.advance().kind {
                            TokenKind::PlusEq => BinaryOp::Add,
                            TokenKind::MinusEq => BinaryOp::Sub,
                            TokenKind::StarEq => BinaryOp::Mul,
                            TokenKind::SlashEq => BinaryOp::Div,
                            _ => BinaryOp::Mod,
                        };
                        let value = self.parse_expression()?;
                        let node = Rc::new(CompoundAssignStatement {
                            id,
                            location,
                            target: expr,
                            op,
                            value,
                        });
                        self.finish_node(AstNode::Statement(Statement::CompoundAssign(
                            node.clone(),
                        )));
                        Ok(Statement::CompoundAssign(node))
                    }
                    _ => Ok(Statement::Expression(expr)),
                }
            }
        }
    }

    fn parse_let(&mut self) -> Result<Statement, ParseError> {
        let id = self.begin_node();
        let location = self.here();
        self.expect(TokenKind::KwLet)?;
        let mutable = self.eat(TokenKind::KwMut);
        let name = self.expect(TokenKind::Identifier)?.lexeme;
        let ty = if self.eat(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let value = if self.eat(TokenKind::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let node = Rc::new(LetStatement {
            id,
            location,
            name,
            mutable,
            ty,
            value,
        });
        self.finish_node(AstNode::Statement(Statement::Let(node.clone())));
        Ok(Statement::Let(node))
    }

    /// Parses the three loop forms and desugars them into one node:
    /// `loop { }`, `loop cond { }`, `loop binder in iterable { }`.
    fn parse_loop(&mut self) -> Result<Statement, ParseError> {
        let id = self.begin_node();
        let location = self.here();
        self.expect(TokenKind::KwLoop)?;

        let mut binder = None;
        let mut iterable = None;
        let mut condition = None;

        if !self.check(TokenKind::LBrace) {
            if self.check(TokenKind::Identifier) && self.peek_at(1).kind == TokenKind::KwIn {
                binder = Some(self.advance().lexeme);
                self.advance(); // `in`
                iterable = Some(self.parse_expression()?);
            } else {
                condition = Some(self.parse_expression()?);
            }
        }

        let body = self.parse_block()?;
        let node = Rc::new(LoopStatement {
            id,
            location,
            binder,
            iterable,
            condition,
            body,
        });
        self.finish_node(AstNode::Statement(Statement::Loop(node.clone())));
        Ok(Statement::Loop(node))
    }

    // ---- expressions ----

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_range_expr()?;
        if self.check(TokenKind::KwIs) && self.peek_at(1).kind == TokenKind::LBrace {
            return self.parse_is(expr);
        }
        Ok(expr)
    }

    fn parse_is(&mut self, scrutinee: Expression) -> Result<Expression, ParseError> {
        let id = self.begin_node();
        let location = self.here();
        self.expect(TokenKind::KwIs)?;
        let open = self.here();
        self.expect(TokenKind::LBrace)?;
        let mut arms = Vec::new();
        loop {
            self.skip_terminators();
            while self.eat(TokenKind::Comma) {
                self.skip_terminators();
            }
            if self.check(TokenKind::RBrace) || self.check(TokenKind::Eof) {
                break;
            }
            arms.push(self.parse_is_arm()?);
        }
        self.expect_closing(TokenKind::RBrace, &open)?;
        let node = Rc::new(IsExpression {
            id,
            location,
            scrutinee,
            arms,
        });
        self.finish_node(AstNode::Expression(Expression::Is(node.clone())));
        Ok(Expression::Is(node))
    }

    fn parse_is_arm(&mut self) -> Result<Rc<IsArm>, ParseError> {
        let id = self.begin_node();
        let location = self.here();
        let pattern = self.parse_pattern()?;
        let guard = if self.eat(TokenKind::KwIf) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Arrow)?;
        let body = self.parse_expression()?;
        let arm = Rc::new(IsArm {
            id,
            location,
            pattern,
            guard,
            body,
        });
        self.finish_node(AstNode::Misc(Misc::IsArm(arm.clone())));
        Ok(arm)
    }

    fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        match self.peek_kind() {
            TokenKind::Identifier => {
                let token = self.advance();
                let name = token.lexeme;
                if name == "_" {
                    return Ok(Pattern::Wildcard);
                }
                if self.eat(TokenKind::LParen) {
                    let mut binders = Vec::new();
                    loop {
                        if self.check(TokenKind::RParen) {
                            break;
                        }
                        binders.push(self.expect(TokenKind::Identifier)?.lexeme);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    return Ok(Pattern::Variant { name, binders });
                }
                // A capitalized bare name is a payload-less variant;
                // a lowercase one binds the scrutinee.
                if name.chars().next().is_some_and(char::is_uppercase) {
                    Ok(Pattern::Variant {
                        name,
                        binders: vec![],
                    })
                } else {
                    Ok(Pattern::Binding(name))
                }
            }
            TokenKind::Int
            | TokenKind::Float
            | TokenKind::Char
            | TokenKind::Str
            | TokenKind::KwTrue
            | TokenKind::KwFalse
            | TokenKind::Minus => {
                let literal = self.parse_literal()?;
                Ok(Pattern::Literal(literal))
            }
            _ => Err(self.unexpected("a pattern")),
        }
    }

    fn binding_power(kind: TokenKind) -> Option<(BinaryOp, u8)> {
        Some(match kind {
            TokenKind::OrOr => (BinaryOp::Or, 1),
            TokenKind::AndAnd => (BinaryOp::And, 2),
            TokenKind::EqEq => (BinaryOp::Eq, 3),
            TokenKind::NotEq => (BinaryOp::Ne, 3),
            TokenKind::Lt => (BinaryOp::Lt, 3),
            TokenKind::Le => (BinaryOp::Le, 3),
            TokenKind::Gt => (BinaryOp::Gt, 3),
            TokenKind::Ge => (BinaryOp::Ge, 3),
            TokenKind::Plus => (BinaryOp::Add, 4),
            TokenKind::Minus => (BinaryOp::Sub, 4),
            TokenKind::Star => (BinaryOp::Mul, 5),
            TokenKind::Slash => (BinaryOp::Div, 5),
            TokenKind::Percent => (BinaryOp::Mod, 5),
            _ => return None,
        })
    }

    fn parse_range_expr(&mut self) -> Result<Expression, ParseError> {
        let start = self.parse_binary_expr(0)?;
        if matches!(self.peek_kind(), TokenKind::DotDot | TokenKind::DotDotEq) {
            let id = self.begin_node();
            let location = self.here();
            let inclusive = self.advance().kind == TokenKind::DotDotEq;
            let end = self.parse_binary_expr(0)?;
            let node = Rc::new(RangeExpression {
                id,
                location,
                start,
                end,
                inclusive,
            });
            self.finish_node(AstNode::Expression(Expression::Range(node.clone())));
            return Ok(Expression::Range(node));
        }
        Ok(start)
    }

    fn parse_binary_expr(&mut self, min_bp: u8) -> Result<Expression, ParseError> {
        let mut lhs = self.parse_cast_expr()?;
        while let Some((op, bp)) = Self::binding_power(self.peek_kind()) {
            if bp <= min_bp {
                break;
            }
            let id = self.begin_node();
            let location = self.here();
            self.advance();
            let rhs = self.parse_binary_expr(bp)?;
            let node = Rc::new(BinaryExpression {
                id,
                location,
                left: lhs,
                op,
                right: rhs,
            });
            self.finish_node(AstNode::Expression(Expression::Binary(node.clone())));
            lhs = Expression::Binary(node);
        }
        Ok(lhs)
    }

    fn parse_cast_expr(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_unary_expr()?;
        while self.check(TokenKind::KwAs) {
            let id = self.begin_node();
            let location = self.here();
            self.advance();
            let target = self.parse_type()?;
            let node = Rc::new(CastExpression {
                id,
                location,
                value: expr,
                target,
            });
            self.finish_node(AstNode::Expression(Expression::Cast(node.clone())));
            expr = Expression::Cast(node);
        }
        Ok(expr)
    }

    fn parse_unary_expr(&mut self) -> Result<Expression, ParseError> {
        match self.peek_kind() {
            TokenKind::Minus | TokenKind::Bang => {
                let id = self.begin_node();
                let location = self.here();
                let op = if self.advance().kind == TokenKind::Minus {
                    UnaryOp::Neg
                } else {
                    UnaryOp::Not
                };
                let operand = self.parse_unary_expr()?;
                let node = Rc::new(UnaryExpression {
                    id,
                    location,
                    op,
                    operand,
                });
                self.finish_node(AstNode::Expression(Expression::Unary(node.clone())));
                Ok(Expression::Unary(node))
            }
            TokenKind::Amp => {
                let id = self.begin_node();
                let location = self.here();
                self.advance();
                let is_mut = self.eat(TokenKind::KwMut);
                let inner = self.parse_unary_expr()?;
                let node = Rc::new(ReferenceExpression {
                    id,
                    location,
                    is_mut,
                    inner,
                });
                self.finish_node(AstNode::Expression(Expression::Reference(node.clone())));
                Ok(Expression::Reference(node))
            }
            _ => self.parse_postfix_expr(),
        }
    }

    fn parse_postfix_expr(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_primary_expr()?;
        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    let id = self.begin_node();
                    let location = self.here();
                    let open = self.here();
                    self.advance();
                    let args = self.parse_call_args(&open)?;
                    let node = Rc::new(CallExpression {
                        id,
                        location,
                        callee: expr,
                        args,
                        type_args: vec![],
                    });
                    self.finish_node(AstNode::Expression(Expression::Call(node.clone())));
                    expr = Expression::Call(node);
                }
                TokenKind::LBracket => {
                    let id = self.begin_node();
                    let location = self.here();
                    let open = self.here();
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect_closing(TokenKind::RBracket, &open)?;
                    let node = Rc::new(IndexExpression {
                        id,
                        location,
                        object: expr,
                        index,
                    });
                    self.finish_node(AstNode::Expression(Expression::Index(node.clone())));
                    expr = Expression::Index(node);
                }
                TokenKind::Dot => {
                    let id = self.begin_node();
                    let location = self.here();
                    self.advance();
                    let name = self.expect(TokenKind::Identifier)?.lexeme;
                    if self.check(TokenKind::LParen) {
                        let open = self.here();
                        self.advance();
                        let args = self.parse_call_args(&open)?;
                        let node = Rc::new(MethodCallExpression {
                            id,
                            location,
                            receiver: expr,
                            method: name,
                            args,
                        });
                        self.finish_node(AstNode::Expression(Expression::MethodCall(node.clone())));
                        expr = Expression::MethodCall(node);
                    } else {
                        let node = Rc::new(FieldAccessExpression {
                            id,
                            location,
                            object: expr,
                            field: name,
                        });
                        self.finish_node(AstNode::Expression(Expression::FieldAccess(
                            node.clone(),
                        )));
                        expr = Expression::FieldAccess(node);
                    }
                }
                TokenKind::Question => {
                    let id = self.begin_node();
                    let location = self.here();
                    self.advance();
                    let node = Rc::new(TryExpression {
                        id,
                        location,
                        inner: expr,
                    });
                    self.finish_node(AstNode::Expression(Expression::Try(node.clone())));
                    expr = Expression::Try(node);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self, open: &Location) -> Result<Vec<Expression>, ParseError> {
        let mut args = Vec::new();
        loop {
            if self.check(TokenKind::RParen) {
                break;
            }
            args.push(self.parse_expression()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect_closing(TokenKind::RParen, open)?;
        Ok(args)
    }

    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        match self.peek_kind() {
            TokenKind::Int => {
                let id = self.begin_node();
                let token = self.advance();
                let location = self.token_location(&token);
                let (digits, radix, suffix) = split_int_lexeme(&token.lexeme);
                let node = Rc::new(IntLiteral {
                    id,
                    location,
                    digits,
                    radix,
                    suffix,
                });
                self.finish_node(AstNode::Literal(Literal::Int(node.clone())));
                Ok(Literal::Int(node))
            }
            TokenKind::Float => {
                let id = self.begin_node();
                let token = self.advance();
                let location = self.token_location(&token);
                let value = token
                    .lexeme
                    .trim_end_matches("f32")
                    .trim_end_matches("f64")
                    .to_string();
                let node = Rc::new(FloatLiteral {
                    id,
                    location,
                    value,
                });
                self.finish_node(AstNode::Literal(Literal::Float(node.clone())));
                Ok(Literal::Float(node))
            }
            TokenKind::KwTrue | TokenKind::KwFalse => {
                let id = self.begin_node();
                let token = self.advance();
                let location = self.token_location(&token);
                let node = Rc::new(BoolLiteral {
                    id,
                    location,
                    value: token.kind == TokenKind::KwTrue,
                });
                self.finish_node(AstNode::Literal(Literal::Bool(node.clone())));
                Ok(Literal::Bool(node))
            }
            TokenKind::Char => {
                let id = self.begin_node();
                let token = self.advance();
                let location = self.token_location(&token);
                let node = Rc::new(CharLiteral {
                    id,
                    location,
                    value: token.lexeme.chars().next().unwrap_or('\0'),
                });
                self.finish_node(AstNode::Literal(Literal::Char(node.clone())));
                Ok(Literal::Char(node))
            }
            TokenKind::Str => {
                let id = self.begin_node();
                let token = self.advance();
                let location = self.token_location(&token);
                let node = Rc::new(StrLiteral {
                    id,
                    location,
                    value: token.lexeme,
                });
                self.finish_node(AstNode::Literal(Literal::Str(node.clone())));
                Ok(Literal::Str(node))
            }
            TokenKind::Minus => {
                // Negative literal in pattern position: fold the sign into
                // the digits.
                let minus = self.advance();
                let token = self.expect(TokenKind::Int)?;
                let id = self.begin_node();
                let location = self.token_location(&minus);
                let (digits, radix, suffix) = split_int_lexeme(&token.lexeme);
                let node = Rc::new(IntLiteral {
                    id,
                    location,
                    digits: format!("-{digits}"),
                    radix,
                    suffix,
                });
                self.finish_node(AstNode::Literal(Literal::Int(node.clone())));
                Ok(Literal::Int(node))
            }
            _ => Err(self.unexpected("a literal")),
        }
    }

    fn parse_primary_expr(&mut self) -> Result<Expression, ParseError> {
        match self.peek_kind() {
            TokenKind::Int
            | TokenKind::Float
            | TokenKind::Char
            | TokenKind::Str
            | TokenKind::KwTrue
            | TokenKind::KwFalse => Ok(Expression::Literal(self.parse_literal()?)),
            TokenKind::InterpStart => self.parse_interpolation(),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                Ok(Expression::Block(block))
            }
            TokenKind::LBracket => {
                let id = self.begin_node();
                let location = self.here();
                let open = self.here();
                self.advance();
                let mut elements = Vec::new();
                loop {
                    if self.check(TokenKind::RBracket) {
                        break;
                    }
                    elements.push(self.parse_expression()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect_closing(TokenKind::RBracket, &open)?;
                let node = Rc::new(ArrayLiteralExpression {
                    id,
                    location,
                    elements,
                });
                self.finish_node(AstNode::Expression(Expression::Array(node.clone())));
                Ok(Expression::Array(node))
            }
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwSelfValue => {
                let id = self.begin_node();
                let token = self.advance();
                let location = self.token_location(&token);
                let node = Rc::new(Identifier {
                    id,
                    location,
                    name: "self".to_string(),
                });
                self.finish_node(AstNode::Expression(Expression::Identifier(node.clone())));
                Ok(Expression::Identifier(node))
            }
            TokenKind::Identifier => self.parse_identifier_expr(),
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_interpolation(&mut self) -> Result<Expression, ParseError> {
        let id = self.begin_node();
        let location = self.here();
        self.expect(TokenKind::InterpStart)?;
        let mut segments = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::StrSegment => {
                    segments.push(InterpSegment::Literal(self.advance().lexeme));
                }
                TokenKind::InterpExprStart => {
                    self.advance();
                    let expr = self.parse_expression()?;
                    self.expect(TokenKind::InterpExprEnd)?;
                    segments.push(InterpSegment::Expr(expr));
                }
                TokenKind::InterpEnd => {
                    self.advance();
                    break;
                }
                _ => return Err(self.unexpected("an interpolation segment")),
            }
        }
        let node = Rc::new(StringInterpolation {
            id,
            location,
            segments,
        });
        self.finish_node(AstNode::Expression(Expression::Interp(node.clone())));
        Ok(Expression::Interp(node))
    }

    fn parse_if(&mut self) -> Result<Expression, ParseError> {
        let id = self.begin_node();
        let location = self.here();
        self.expect(TokenKind::KwIf)?;
        let condition = self.parse_expression()?;
        let then_branch = self.parse_block()?;
        // `else` on its own line still binds to this `if`.
        if self.check(TokenKind::Newline) && self.peek_at(1).kind == TokenKind::KwElse {
            self.advance();
        }
        let else_branch = if self.eat(TokenKind::KwElse) {
            if self.check(TokenKind::KwIf) {
                Some(self.parse_if()?)
            } else {
                Some(Expression::Block(self.parse_block()?))
            }
        } else {
            None
        };
        let node = Rc::new(IfExpression {
            id,
            location,
            condition,
            then_branch,
            else_branch,
        });
        self.finish_node(AstNode::Expression(Expression::If(node.clone())));
        Ok(Expression::If(node))
    }

    /// Identifier-led expressions: plain references, generic static calls
    /// `Vec<i32>::new()`, plain static calls `Type::method()`, and struct
    /// literals `Name { field: value }` (the name must be a declared type,
    /// which keeps `if x {` unambiguous).
    fn parse_identifier_expr(&mut self) -> Result<Expression, ParseError> {
        let name_token = self.peek().clone();
        let name = name_token.lexeme.clone();

        // `Name <` as generic arguments only for known types followed by
        // something that can begin a type.
        if self.ctx.is_known_type(&name)
            && self.peek_at(1).kind == TokenKind::Lt
            && self.token_begins_type(&self.peek_at(2).clone())
        {
            let checkpoint = self.pos;
            let stack_depth = self.parent_stack.len();
            if let Some(expr) = self.try_parse_static_call(&name)? {
                return Ok(expr);
            }
            self.pos = checkpoint;
            self.parent_stack.truncate(stack_depth);
        }

        if self.ctx.is_known_type(&name) && self.peek_at(1).kind == TokenKind::PathSep {
            let id = self.begin_node();
            let location = self.token_location(&name_token);
            self.advance(); // name
            self.advance(); // `::`
            let method = self.expect(TokenKind::Identifier)?.lexeme;
            let open = self.here();
            self.expect(TokenKind::LParen)?;
            let args = self.parse_call_args(&open)?;
            let node = Rc::new(StaticCallExpression {
                id,
                location,
                type_name: name,
                type_args: vec![],
                method,
                args,
            });
            self.finish_node(AstNode::Expression(Expression::StaticCall(node.clone())));
            return Ok(Expression::StaticCall(node));
        }

        if self.ctx.is_known_type(&name) && self.peek_at(1).kind == TokenKind::LBrace {
            return self.parse_struct_init();
        }

        let identifier = self.parse_identifier()?;
        Ok(Expression::Identifier(identifier))
    }

    /// Attempts `Name<Args>::method(args)`. Returns `Ok(None)` when the
    /// construct turns out not to be a static call (the caller rewinds and
    /// re-parses `<` as comparison).
    fn try_parse_static_call(&mut self, name: &str) -> Result<Option<Expression>, ParseError> {
        let name_token = self.advance();
        let location = self.token_location(&name_token);
        self.advance(); // `<`
        let mut type_args = Vec::new();
        loop {
            let Ok(ty) = self.parse_type() else {
                return Ok(None);
            };
            type_args.push(ty);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        if !self.eat(TokenKind::Gt) {
            return Ok(None);
        }
        if !self.check(TokenKind::PathSep) {
            return Ok(None);
        }
        let id = self.begin_node();
        self.advance(); // `::`
        let method = self.expect(TokenKind::Identifier)?.lexeme;
        let open = self.here();
        self.expect(TokenKind::LParen)?;
        let args = self.parse_call_args(&open)?;
        let node = Rc::new(StaticCallExpression {
            id,
            location,
            type_name: name.to_string(),
            type_args,
            method,
            args,
        });
        self.finish_node(AstNode::Expression(Expression::StaticCall(node.clone())));
        Ok(Some(Expression::StaticCall(node)))
    }

    fn parse_struct_init(&mut self) -> Result<Expression, ParseError> {
        let id = self.begin_node();
        let name_token = self.advance();
        let location = self.token_location(&name_token);
        let open = self.here();
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        loop {
            self.skip_terminators();
            if self.check(TokenKind::RBrace) || self.check(TokenKind::Eof) {
                break;
            }
            let field_name = self.expect(TokenKind::Identifier)?.lexeme;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expression()?;
            fields.push((field_name, value));
            self.skip_newlines();
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.skip_terminators();
        self.expect_closing(TokenKind::RBrace, &open)?;
        let node = Rc::new(StructInitExpression {
            id,
            location,
            type_name: name_token.lexeme,
            fields,
        });
        self.finish_node(AstNode::Expression(Expression::StructInit(node.clone())));
        Ok(Expression::StructInit(node))
    }
}

/// Splits an integer token lexeme into digits, radix and optional suffix.
fn split_int_lexeme(lexeme: &str) -> (String, u32, Option<String>) {
    let mut text = lexeme;
    let mut suffix = None;
    for candidate in [
        "i128", "u128", "i16", "i32", "i64", "u16", "u32", "u64", "i8", "u8",
    ] {
        if let Some(stripped) = text.strip_suffix(candidate) {
            // Hex digits can end with letters that look like a suffix start;
            // only strip when what remains is still a valid literal body.
            if !stripped.is_empty() && stripped.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                suffix = Some(candidate.to_string());
                text = stripped;
                break;
            }
        }
    }
    let (digits, radix) = if let Some(rest) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (rest.to_string(), 16)
    } else if let Some(rest) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        (rest.to_string(), 2)
    } else {
        (text.to_string(), 10)
    };
    (digits, radix, suffix)
}

impl Statement {
    /// True for statements ending in `}` which need no further terminator.
    #[must_use = "this is a pure check with no side effects"]
    pub fn is_block_terminated(&self) -> bool {
        match self {
            Statement::Loop(_) => true,
            Statement::Expression(expr) => matches!(
                expr,
                Expression::If(_) | Expression::Is(_) | Expression::Block(_)
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_source(text: &str) -> (Rc<ModuleAst>, Arena) {
        let mut ctx = ParserContext::new();
        let mut arena = Arena::default();
        let module = parse_module(text, "test.paw", "main", &mut ctx, &mut arena)
            .expect("parsing should succeed");
        (module, arena)
    }

    fn parse_err(text: &str) -> ParseError {
        let mut ctx = ParserContext::new();
        let mut arena = Arena::default();
        parse_module(text, "test.paw", "main", &mut ctx, &mut arena)
            .expect_err("parsing should fail")
    }

    #[test]
    fn parse_simple_function() {
        let (module, _) = parse_source("fn main() -> i32 { 0 }");
        assert_eq!(module.declarations.len(), 1);
        let Declaration::Function(func) = &module.declarations[0] else {
            panic!("expected function declaration");
        };
        assert_eq!(func.name.name, "main");
        assert!(func.body.tail.is_some());
    }

    #[test]
    fn parse_generic_function() {
        let (module, _) = parse_source("fn add<T>(a: T, b: T) -> T { a + b }");
        let Declaration::Function(func) = &module.declarations[0] else {
            panic!("expected function declaration");
        };
        assert_eq!(func.type_params.len(), 1);
        assert_eq!(func.type_params[0].name, "T");
        assert_eq!(func.params.len(), 2);
    }

    #[test]
    fn parse_single_expression_function() {
        let (module, _) = parse_source("fn twice(x: i32) -> i32 = x * 2");
        let Declaration::Function(func) = &module.declarations[0] else {
            panic!("expected function declaration");
        };
        assert!(func.body.statements.is_empty());
        assert!(func.body.tail.is_some());
    }

    #[test]
    fn parse_struct_with_method() {
        let (module, _) = parse_source(
            "type Box<T> = struct {\n    value: T\n    fn get(self) -> T { self.value }\n}",
        );
        let Declaration::Type(decl) = &module.declarations[0] else {
            panic!("expected type declaration");
        };
        let TypeDeclKind::Struct { fields, methods } = &decl.kind else {
            panic!("expected struct");
        };
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "value");
        assert_eq!(methods.len(), 1);
        assert!(methods[0].params[0].is_self);
    }

    #[test]
    fn parse_enum_with_payloads() {
        let (module, _) = parse_source("type Shape = enum { Point, Circle(f64), Rect(f64, f64) }");
        let Declaration::Type(decl) = &module.declarations[0] else {
            panic!("expected type declaration");
        };
        let TypeDeclKind::Enum { variants, .. } = &decl.kind else {
            panic!("expected enum");
        };
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0].payloads.len(), 0);
        assert_eq!(variants[1].payloads.len(), 1);
        assert_eq!(variants[2].payloads.len(), 2);
    }

    #[test]
    fn known_type_lt_parses_as_static_call() {
        let (module, _) = parse_source(
            "type Vec<T> = struct { len: i32 }\nfn main() -> i32 { Vec<i32>::new(); 0 }",
        );
        let Declaration::Function(func) = &module.declarations[1] else {
            panic!("expected function declaration");
        };
        let Statement::Expression(Expression::StaticCall(call)) = &func.body.statements[0] else {
            panic!("expected static call statement");
        };
        assert_eq!(call.type_name, "Vec");
        assert_eq!(call.type_args.len(), 1);
        assert_eq!(call.method, "new");
    }

    #[test]
    fn unknown_name_lt_parses_as_comparison() {
        let (module, _) = parse_source("fn main() -> bool { a < b }");
        let Declaration::Function(func) = &module.declarations[0] else {
            panic!("expected function declaration");
        };
        let Some(Expression::Binary(bin)) = &func.body.tail else {
            panic!("expected binary comparison");
        };
        assert_eq!(bin.op, BinaryOp::Lt);
    }

    #[test]
    fn known_type_lt_literal_parses_as_comparison() {
        // `x < 3` with x a known type name must still be comparison because
        // `3` cannot begin a type.
        let (module, _) = parse_source("type x = i32\nfn main() -> bool { x < 3 }");
        let Declaration::Function(func) = &module.declarations[1] else {
            panic!("expected function declaration");
        };
        assert!(matches!(func.body.tail, Some(Expression::Binary(_))));
    }

    #[test]
    fn parse_loop_forms() {
        let (module, _) = parse_source(
            "fn main() -> i32 {\n    loop { break }\n    loop x < 3 { x = x + 1 }\n    loop i in 1..=8 { sum = sum + i }\n    0\n}",
        );
        let Declaration::Function(func) = &module.declarations[0] else {
            panic!("expected function declaration");
        };
        let loops: Vec<_> = func
            .body
            .statements
            .iter()
            .filter_map(|s| match s {
                Statement::Loop(l) => Some(l.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(loops.len(), 3);
        assert!(loops[0].condition.is_none() && loops[0].iterable.is_none());
        assert!(loops[1].condition.is_some());
        assert_eq!(loops[2].binder.as_deref(), Some("i"));
        assert!(matches!(loops[2].iterable, Some(Expression::Range(_))));
    }

    #[test]
    fn parse_is_expression() {
        let (module, _) = parse_source(
            "fn main() -> i32 {\n    test() is {\n        Ok(v) -> v - 58,\n        Err(_) -> -1\n    }\n}",
        );
        let Declaration::Function(func) = &module.declarations[0] else {
            panic!("expected function declaration");
        };
        let Some(Expression::Is(is_expr)) = &func.body.tail else {
            panic!("expected is expression tail");
        };
        assert_eq!(is_expr.arms.len(), 2);
        let Pattern::Variant { name, binders } = &is_expr.arms[0].pattern else {
            panic!("expected variant pattern");
        };
        assert_eq!(name, "Ok");
        assert_eq!(binders, &vec!["v".to_string()]);
    }

    #[test]
    fn parse_guard_in_arm() {
        let (module, _) = parse_source("fn f(x: i32) -> i32 { x is { n if n > 0 -> n, _ -> 0 } }");
        let Declaration::Function(func) = &module.declarations[0] else {
            panic!("expected function declaration");
        };
        let Some(Expression::Is(is_expr)) = &func.body.tail else {
            panic!("expected is expression");
        };
        assert!(is_expr.arms[0].guard.is_some());
        assert!(matches!(is_expr.arms[1].pattern, Pattern::Wildcard));
    }

    #[test]
    fn parse_try_and_cast() {
        let (module, _) = parse_source("fn f() -> i32 { g()? as i32 }");
        let Declaration::Function(func) = &module.declarations[0] else {
            panic!("expected function declaration");
        };
        let Some(Expression::Cast(cast)) = &func.body.tail else {
            panic!("expected cast");
        };
        assert!(matches!(cast.value, Expression::Try(_)));
    }

    #[test]
    fn parse_struct_literal_requires_known_type() {
        let (module, _) = parse_source(
            "type Box<T> = struct { value: T }\nfn main() -> i32 { let b = Box { value: 7 }; 0 }",
        );
        let Declaration::Function(func) = &module.declarations[1] else {
            panic!("expected function declaration");
        };
        let Statement::Let(let_stmt) = &func.body.statements[0] else {
            panic!("expected let statement");
        };
        assert!(matches!(let_stmt.value, Some(Expression::StructInit(_))));
    }

    #[test]
    fn parse_imports() {
        let (module, _) = parse_source("import math.vec\nimport std.io.{read, write}\nimport util.*\nfn main() -> i32 { 0 }");
        assert_eq!(module.imports.len(), 3);
        assert!(matches!(module.imports[0].items, ImportItems::Single(_)));
        assert!(matches!(module.imports[1].items, ImportItems::List(_)));
        assert!(matches!(module.imports[2].items, ImportItems::Glob));
    }

    #[test]
    fn parse_semicolons_on_one_line() {
        let (module, _) = parse_source("fn main() -> i32 { let a = 1; let b = 2; a + b }");
        let Declaration::Function(func) = &module.declarations[0] else {
            panic!("expected function declaration");
        };
        assert_eq!(func.body.statements.len(), 2);
        assert!(func.body.tail.is_some());
    }

    #[test]
    fn parse_string_interpolation_expression() {
        let (module, _) = parse_source(r#"fn main() -> string { "x = ${1 + 2}" }"#);
        let Declaration::Function(func) = &module.declarations[0] else {
            panic!("expected function declaration");
        };
        let Some(Expression::Interp(interp)) = &func.body.tail else {
            panic!("expected interpolation");
        };
        assert_eq!(interp.segments.len(), 2);
        assert!(matches!(interp.segments[0], InterpSegment::Literal(_)));
        assert!(matches!(interp.segments[1], InterpSegment::Expr(_)));
    }

    #[test]
    fn unexpected_token_reports_location() {
        let err = parse_err("fn main( -> i32 { 0 }");
        let ParseError::UnexpectedToken { location, .. } = &err else {
            panic!("expected UnexpectedToken, got {err}");
        };
        assert_eq!(location.line, 1);
    }

    #[test]
    fn unclosed_brace_reports_opener() {
        let err = parse_err("fn main() -> i32 { 0");
        assert!(matches!(err, ParseError::UnclosedDelimiter { .. }));
    }

    #[test]
    fn mut_parameter_and_let_mut() {
        let (module, _) = parse_source("fn f(mut x: i32) -> i32 { let mut y = x; y = y + 1; y }");
        let Declaration::Function(func) = &module.declarations[0] else {
            panic!("expected function declaration");
        };
        assert!(func.params[0].is_mut);
        let Statement::Let(let_stmt) = &func.body.statements[0] else {
            panic!("expected let");
        };
        assert!(let_stmt.mutable);
        assert!(matches!(func.body.statements[1], Statement::Assign(_)));
    }

    #[test]
    fn trait_decl_parses() {
        let (module, _) = parse_source("type Printable = trait { fn print(self) }");
        let Declaration::Type(decl) = &module.declarations[0] else {
            panic!("expected type declaration");
        };
        assert!(matches!(decl.kind, TypeDeclKind::Trait { .. }));
    }
}
