//! Typed syntax tree lowered from the tree-sitter concrete tree.
//!
//! Every node kind the extractor and the analyzers care about has its own
//! variant. Anything else is kept as `Opaque` with its lowered children so
//! nested calls and branches are never lost.

use crate::model::{ContractKind, LineSpan};

#[derive(Debug, Clone, PartialEq)]
pub struct SourceUnit {
    pub items: Vec<SourceItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceItem {
    Contract(ContractDecl),
    /// Free functions, file-level structs, pragmas, imports and the like.
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractDecl {
    pub kind: ContractKind,
    pub name: String,
    pub bases: Vec<String>,
    pub members: Vec<Member>,
    pub span: LineSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Function(FunctionDecl),
    Modifier(ModifierDecl),
    Event(EventDecl),
    StateVariable(StateVariableDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    /// `using` directives, custom errors, user-defined value types.
    Other,
}

/// Which syntactic form a function-like declaration took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionForm {
    Named,
    Constructor,
    Fallback,
    Receive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub type_name: String,
    pub location: Option<String>,
    pub indexed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub form: FunctionForm,
    pub name: String,
    pub params: Vec<ParamDecl>,
    pub returns: Vec<ParamDecl>,
    /// Raw visibility keyword, if one was written.
    pub visibility: Option<String>,
    /// Raw mutability keyword, if one was written.
    pub mutability: Option<String>,
    pub modifiers: Vec<String>,
    /// `None` for declarations without a body.
    pub body: Option<Vec<Stmt>>,
    pub span: LineSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModifierDecl {
    pub name: String,
    pub params: Vec<ParamDecl>,
    pub span: LineSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDecl {
    pub name: String,
    pub params: Vec<ParamDecl>,
    pub span: LineSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateVariableDecl {
    pub name: String,
    pub type_name: String,
    pub visibility: Option<String>,
    pub constant: bool,
    pub immutable: bool,
    pub span: LineSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    /// `(name, type)` pairs in declaration order.
    pub members: Vec<(String, String)>,
    pub span: LineSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub values: Vec<String>,
    pub span: LineSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block(Vec<Stmt>),
    Expr(Expr),
    VarDecl(Vec<Expr>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    For {
        header: Vec<Stmt>,
        body: Box<Stmt>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },
    Return(Option<Expr>),
    Emit {
        event: Expr,
        args: Vec<Expr>,
    },
    Revert(Vec<Expr>),
    Try {
        call: Expr,
        clauses: Vec<Stmt>,
    },
    /// Inline assembly is not analyzed.
    Assembly,
    Break,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    /// Arithmetic, comparison and bitwise operators.
    Other,
}

impl BinaryOp {
    pub fn from_operator(op: &str) -> Self {
        match op {
            "&&" => Self::And,
            "||" => Self::Or,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    Member {
        object: Box<Expr>,
        property: String,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// Elementary-type conversion such as `address(x)`.
    TypeCast {
        target: String,
        arg: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary(Box<Expr>),
    Ternary {
        condition: Box<Expr>,
        then_value: Box<Expr>,
        else_value: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Index {
        base: Box<Expr>,
        index: Option<Box<Expr>>,
    },
    Tuple(Vec<Expr>),
    New(String),
    Literal,
    /// Node kinds without a dedicated variant, with their lowered children.
    Opaque(Vec<Expr>),
}
