use core::fmt;
use std::{
    fmt::{Display, Formatter},
    rc::Rc,
};

/// Source position of a node or token.
///
/// `source` is the file path the node came from; it is empty for sources
/// parsed from memory (tests, the prelude text resource).
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Location {
    pub line: u32,
    pub column: u32,
    pub source: String,
}

impl Location {
    #[must_use]
    pub fn new(line: u32, column: u32, source: impl Into<String>) -> Self {
        Self {
            line,
            column,
            source: source.into(),
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.source.is_empty() {
            write!(f, "{}:{}", self.line, self.column)
        } else {
            write!(f, "{}:{}:{}", self.source, self.line, self.column)
        }
    }
}

#[macro_export]
macro_rules! ast_node {
    (
        $(#[$outer:meta])*
        $struct_vis:vis struct $name:ident {
            $(
                $(#[$field_attr:meta])*
                $field_vis:vis $field_name:ident : $field_ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Clone, PartialEq, Eq, Debug)]
        $struct_vis struct $name {
            pub id: u32,
            pub location: $crate::nodes::Location,
            $(
                $(#[$field_attr])*
                $field_vis $field_name : $field_ty,
            )*
        }
    };
}

macro_rules! ast_nodes {
    (
        $(
            $(#[$outer:meta])*
            $struct_vis:vis struct $name:ident { $($fields:tt)* }
        )+
    ) => {
        $(
            ast_node! {
                $(#[$outer])*
                $struct_vis struct $name { $($fields)* }
            }
        )+
    };
}

macro_rules! ast_enum {
    (
        $(#[$outer:meta])*
        $enum_vis:vis enum $name:ident {
            $(
                $(#[$arm_attr:meta])*
                $(@$conv:ident)? $arm:ident ( $($tuple:tt)* ) ,
            )*
        }
    ) => {
        $(#[$outer])*
        #[derive(Clone, PartialEq, Eq, Debug)]
        $enum_vis enum $name {
            $(
                $(#[$arm_attr])*
                $arm ( $($tuple)* ) ,
            )*
        }

        impl $name {

            #[must_use]
            pub fn id(&self) -> u32 {
                match self {
                    $(
                        $name::$arm(n, ..) => { ast_enum!(@id_arm n, $($conv)?) }
                    )*
                }
            }

            #[must_use]
            pub fn location(&self) -> Location {
                match self {
                    $(
                        $name::$arm(n, ..) => { ast_enum!(@location_arm n, $($conv)?) }
                    )*
                }
            }
        }
    };

    (@id_arm $inner:ident, inner_enum) => {
        $inner.id()
    };

    (@id_arm $inner:ident, ) => {
        $inner.id
    };

    (@location_arm $inner:ident, inner_enum) => {
        $inner.location()
    };

    (@location_arm $inner:ident, ) => {
        $inner.location.clone()
    };
}

macro_rules! ast_enums {
    (
        $(
            $(#[$outer:meta])*
            $enum_vis:vis enum $name:ident { $($arms:tt)* }
        )+
    ) => {
        $(
            ast_enum! {
                $(#[$outer])*
                $enum_vis enum $name { $($arms)* }
            }
        )+

        #[derive(Clone, Debug)]
        pub enum AstNode {
            $(
                $name($name),
            )+
        }

        impl AstNode {
            #[must_use]
            pub fn id(&self) -> u32 {
                match self {
                    $(
                        AstNode::$name(node) => node.id(),
                    )+
                }
            }

            #[must_use]
            pub fn location(&self) -> Location {
                match self {
                    $(
                        AstNode::$name(node) => node.location(),
                    )+
                }
            }
        }
    };
}

ast_enums! {

    pub enum Ast {
        Module(Rc<ModuleAst>),
    }

    pub enum Declaration {
        Function(Rc<FunctionDecl>),
        Type(Rc<TypeDecl>),
        Import(Rc<ImportDecl>),
        Impl(Rc<ImplBlock>),
    }

    pub enum Statement {
        Let(Rc<LetStatement>),
        Assign(Rc<AssignStatement>),
        CompoundAssign(Rc<CompoundAssignStatement>),
        Return(Rc<ReturnStatement>),
        Loop(Rc<LoopStatement>),
        Break(Rc<BreakStatement>),
        Continue(Rc<ContinueStatement>),
        @inner_enum Expression(Expression),
    }

    pub enum Expression {
        @inner_enum Literal(Literal),
        Identifier(Rc<Identifier>),
        Binary(Rc<BinaryExpression>),
        Unary(Rc<UnaryExpression>),
        Call(Rc<CallExpression>),
        MethodCall(Rc<MethodCallExpression>),
        StaticCall(Rc<StaticCallExpression>),
        FieldAccess(Rc<FieldAccessExpression>),
        Index(Rc<IndexExpression>),
        Array(Rc<ArrayLiteralExpression>),
        Range(Rc<RangeExpression>),
        StructInit(Rc<StructInitExpression>),
        If(Rc<IfExpression>),
        Block(Rc<BlockExpression>),
        Is(Rc<IsExpression>),
        Try(Rc<TryExpression>),
        Cast(Rc<CastExpression>),
        Interp(Rc<StringInterpolation>),
        Reference(Rc<ReferenceExpression>),
    }

    pub enum Literal {
        Int(Rc<IntLiteral>),
        Float(Rc<FloatLiteral>),
        Bool(Rc<BoolLiteral>),
        Char(Rc<CharLiteral>),
        Str(Rc<StrLiteral>),
    }

    pub enum TypeExpr {
        Named(Rc<NamedType>),
        Instance(Rc<GenericInstanceType>),
        Pointer(Rc<PointerType>),
        Array(Rc<ArrayType>),
        Function(Rc<FunctionType>),
        SelfType(Rc<SelfTypeNode>),
    }

    pub enum Misc {
        StructField(Rc<StructField>),
        EnumVariant(Rc<EnumVariant>),
        Parameter(Rc<Parameter>),
        IsArm(Rc<IsArm>),
        TraitMethodSig(Rc<TraitMethodSig>),
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

/// Binary operators after lexing; compound assignments reuse these.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// Source spelling, used in diagnostics and by the C backend.
    #[must_use = "returns the operator spelling without modifying self"]
    pub const fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    #[must_use = "this is a pure check with no side effects"]
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    #[must_use = "this is a pure check with no side effects"]
    pub const fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}

/// What an `import` brings into scope.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ImportItems {
    /// `import a.b.item;`
    Single(String),
    /// `import a.b.{x, y};`
    List(Vec<String>),
    /// `import a.b.*;`
    Glob,
}

/// Body of a `type` declaration.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TypeDeclKind {
    Struct {
        fields: Vec<Rc<StructField>>,
        methods: Vec<Rc<FunctionDecl>>,
    },
    Enum {
        variants: Vec<Rc<EnumVariant>>,
        methods: Vec<Rc<FunctionDecl>>,
    },
    Trait {
        methods: Vec<Rc<TraitMethodSig>>,
    },
    Alias(TypeExpr),
}

/// A single arm pattern in an `is` expression.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Pattern {
    Literal(Literal),
    Wildcard,
    Binding(String),
    /// `Variant(a, b)`; binders may be `_`.
    Variant { name: String, binders: Vec<String> },
}

/// One piece of an interpolated string, in source order.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum InterpSegment {
    Literal(String),
    Expr(Expression),
}

ast_nodes! {

    pub struct ModuleAst {
        /// Dotted module path, e.g. `math.vec`. The root module's path is its
        /// file stem.
        pub path: String,
        pub imports: Vec<Rc<ImportDecl>>,
        pub declarations: Vec<Declaration>,
    }

    pub struct ImportDecl {
        /// Path segments of the target module, e.g. `["math", "vec"]`.
        pub segments: Vec<String>,
        pub items: ImportItems,
    }

    pub struct Identifier {
        pub name: String,
    }

    pub struct FunctionDecl {
        pub visibility: Visibility,
        pub name: Rc<Identifier>,
        pub type_params: Vec<Rc<Identifier>>,
        pub params: Vec<Rc<Parameter>>,
        pub return_type: Option<TypeExpr>,
        pub body: Rc<BlockExpression>,
        pub is_async: bool,
    }

    pub struct Parameter {
        pub name: String,
        pub is_mut: bool,
        /// `self` / `mut self` receivers have no written type; the checker
        /// infers the enclosing `Self`.
        pub is_self: bool,
        pub ty: Option<TypeExpr>,
    }

    pub struct TypeDecl {
        pub visibility: Visibility,
        pub name: Rc<Identifier>,
        pub type_params: Vec<Rc<Identifier>>,
        pub kind: TypeDeclKind,
    }

    pub struct StructField {
        pub visibility: Visibility,
        pub name: String,
        pub ty: TypeExpr,
    }

    pub struct EnumVariant {
        pub name: String,
        pub payloads: Vec<TypeExpr>,
    }

    pub struct TraitMethodSig {
        pub name: String,
        pub params: Vec<Rc<Parameter>>,
        pub return_type: Option<TypeExpr>,
    }

    pub struct ImplBlock {
        pub target: String,
        pub trait_name: Option<String>,
        pub methods: Vec<Rc<FunctionDecl>>,
    }

    pub struct LetStatement {
        pub name: String,
        pub mutable: bool,
        pub ty: Option<TypeExpr>,
        pub value: Option<Expression>,
    }

    pub struct AssignStatement {
        pub target: Expression,
        pub value: Expression,
    }

    pub struct CompoundAssignStatement {
        pub target: Expression,
        pub op: BinaryOp,
        pub value: Expression,
    }

    pub struct ReturnStatement {
        pub value: Option<Expression>,
    }

    /// The single loop construct; the parser desugars all three source forms
    /// into it. `loop {}` has neither condition nor iterator; `loop cond {}`
    /// has a condition; `loop x in iter {}` has a binder and an iterable.
    pub struct LoopStatement {
        pub binder: Option<String>,
        pub iterable: Option<Expression>,
        pub condition: Option<Expression>,
        pub body: Rc<BlockExpression>,
    }

    pub struct BreakStatement {
        pub value: Option<Expression>,
    }

    pub struct ContinueStatement {}

    pub struct IntLiteral {
        /// Digits as written, without radix prefix; `radix` records the base.
        pub digits: String,
        pub radix: u32,
        /// Optional written type suffix (`i64`, `u8`, ...).
        pub suffix: Option<String>,
    }

    pub struct FloatLiteral {
        pub value: String,
    }

    pub struct BoolLiteral {
        pub value: bool,
    }

    pub struct CharLiteral {
        pub value: char,
    }

    pub struct StrLiteral {
        pub value: String,
    }

    pub struct BinaryExpression {
        pub left: Expression,
        pub op: BinaryOp,
        pub right: Expression,
    }

    pub struct UnaryExpression {
        pub op: UnaryOp,
        pub operand: Expression,
    }

    pub struct CallExpression {
        pub callee: Expression,
        pub type_args: Vec<TypeExpr>,
        pub args: Vec<Expression>,
    }

    pub struct MethodCallExpression {
        pub receiver: Expression,
        pub method: String,
        pub args: Vec<Expression>,
    }

    /// `Type<Args>::method(args)` — explicit type arguments on the type.
    pub struct StaticCallExpression {
        pub type_name: String,
        pub type_args: Vec<TypeExpr>,
        pub method: String,
        pub args: Vec<Expression>,
    }

    pub struct FieldAccessExpression {
        pub object: Expression,
        pub field: String,
    }

    pub struct IndexExpression {
        pub object: Expression,
        pub index: Expression,
    }

    pub struct ArrayLiteralExpression {
        pub elements: Vec<Expression>,
    }

    pub struct RangeExpression {
        pub start: Expression,
        pub end: Expression,
        pub inclusive: bool,
    }

    pub struct StructInitExpression {
        pub type_name: String,
        pub fields: Vec<(String, Expression)>,
    }

    pub struct IfExpression {
        pub condition: Expression,
        pub then_branch: Rc<BlockExpression>,
        /// Either a block or a chained `if`.
        pub else_branch: Option<Expression>,
    }

    pub struct BlockExpression {
        pub statements: Vec<Statement>,
        /// Final expression without a trailing terminator; the block's value.
        pub tail: Option<Expression>,
    }

    pub struct IsExpression {
        pub scrutinee: Expression,
        pub arms: Vec<Rc<IsArm>>,
    }

    pub struct IsArm {
        pub pattern: Pattern,
        pub guard: Option<Expression>,
        pub body: Expression,
    }

    pub struct TryExpression {
        pub inner: Expression,
    }

    pub struct CastExpression {
        pub value: Expression,
        pub target: TypeExpr,
    }

    pub struct StringInterpolation {
        pub segments: Vec<InterpSegment>,
    }

    pub struct ReferenceExpression {
        pub is_mut: bool,
        pub inner: Expression,
    }

    pub struct NamedType {
        pub name: String,
    }

    pub struct GenericInstanceType {
        pub name: String,
        pub args: Vec<TypeExpr>,
    }

    pub struct PointerType {
        pub is_mut: bool,
        pub inner: TypeExpr,
    }

    pub struct ArrayType {
        pub element: TypeExpr,
        /// Written element count; `None` for unsized `[T]`.
        pub size: Option<u32>,
    }

    pub struct FunctionType {
        pub params: Vec<TypeExpr>,
        pub ret: Option<TypeExpr>,
    }

    pub struct SelfTypeNode {}

}
