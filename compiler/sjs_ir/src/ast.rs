//! Syntax tree consumed by the evaluator and the linker.
//!
//! The tree is produced by an external parser (or by [`AstBuilder`] in code).
//! Every node records the 1-based source line it came from so runtime
//! failures can report their origin.
//!
//! [`AstBuilder`]: crate::AstBuilder

use std::rc::Rc;

use crate::Name;

/// A constant embedded in the program text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    Int(i32),
    Str(Rc<str>),
    Bool(bool),
    Undefined,
}

/// A sequence of expressions evaluated for their side effects.
#[derive(Clone, Debug, Default)]
pub struct Block {
    pub instrs: Vec<Expr>,
}

impl Block {
    pub fn new(instrs: Vec<Expr>) -> Self {
        Block { instrs }
    }
}

/// A function literal.
///
/// Shared through `Rc` so every closure built from the literal points at the
/// same body.
#[derive(Debug)]
pub struct Fun {
    /// Declared name; a named literal is bound in its defining scope.
    pub name: Option<Name>,
    pub parameters: Vec<Name>,
    pub body: Block,
    pub line: u32,
}

/// Expression node kinds.
#[derive(Clone, Debug)]
pub enum ExprKind {
    Block(Block),
    Literal(Literal),
    /// `qualifier(args...)`; the callee receives `undefined` as receiver.
    FunCall {
        qualifier: Box<Expr>,
        args: Vec<Expr>,
    },
    LocalVarAccess(Name),
    /// `let name = expr` when `declaration`, `name = expr` otherwise.
    LocalVarAssignment {
        name: Name,
        expr: Box<Expr>,
        declaration: bool,
    },
    Fun(Rc<Fun>),
    Return(Box<Expr>),
    If {
        condition: Box<Expr>,
        then_block: Block,
        else_block: Block,
    },
    /// Record literal; initializers in declaration order.
    New(Vec<(Name, Expr)>),
    FieldAccess {
        receiver: Box<Expr>,
        name: Name,
    },
    FieldAssignment {
        receiver: Box<Expr>,
        name: Name,
        expr: Box<Expr>,
    },
    /// `receiver.name(args...)`; the callee receives `receiver` as `this`.
    MethodCall {
        receiver: Box<Expr>,
        name: Name,
        args: Vec<Expr>,
    },
}

/// An expression with its source line.
#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
}

impl Expr {
    #[inline]
    pub fn new(kind: ExprKind, line: u32) -> Self {
        Expr { kind, line }
    }
}

/// A whole program: the top-level statements.
#[derive(Clone, Debug, Default)]
pub struct Script {
    pub body: Block,
}

impl Script {
    pub fn new(body: Block) -> Self {
        Script { body }
    }
}
