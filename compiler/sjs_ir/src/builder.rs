//! Programmatic construction of syntax trees.
//!
//! Parsing source text happens outside this workspace; embedders and tests
//! build trees directly with `AstBuilder`. Nodes are stamped with the
//! builder's current line, which `at` moves forward.
//!
//! ```text
//! let b = AstBuilder::new(&interner);
//! // function f(x) { return x + 1; } print(f(41));
//! let script = b.script(vec![
//!     b.fun("f", &["x"], vec![b.ret(b.binary("+", b.var("x"), b.int(1)))]),
//!     b.at(2).call_named("print", vec![b.call_named("f", vec![b.int(41)])]),
//! ]);
//! ```

use std::cell::Cell;
use std::rc::Rc;

use crate::ast::{Block, Expr, ExprKind, Fun, Literal, Script};
use crate::{Name, StringInterner};

/// Builds expressions against a shared interner.
pub struct AstBuilder<'a> {
    interner: &'a StringInterner,
    line: Cell<u32>,
}

impl<'a> AstBuilder<'a> {
    /// Create a builder starting at line 1.
    pub fn new(interner: &'a StringInterner) -> Self {
        AstBuilder {
            interner,
            line: Cell::new(1),
        }
    }

    /// Set the line stamped on subsequently built nodes.
    pub fn at(&self, line: u32) -> &Self {
        self.line.set(line);
        self
    }

    /// Current line.
    pub fn line(&self) -> u32 {
        self.line.get()
    }

    /// Intern a name.
    pub fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    fn expr(&self, kind: ExprKind) -> Expr {
        Expr::new(kind, self.line.get())
    }

    pub fn int(&self, value: i32) -> Expr {
        self.expr(ExprKind::Literal(Literal::Int(value)))
    }

    pub fn string(&self, value: &str) -> Expr {
        self.expr(ExprKind::Literal(Literal::Str(Rc::from(value))))
    }

    pub fn boolean(&self, value: bool) -> Expr {
        self.expr(ExprKind::Literal(Literal::Bool(value)))
    }

    pub fn undefined(&self) -> Expr {
        self.expr(ExprKind::Literal(Literal::Undefined))
    }

    pub fn var(&self, name: &str) -> Expr {
        self.expr(ExprKind::LocalVarAccess(self.name(name)))
    }

    /// `let name = value`
    pub fn declare(&self, name: &str, value: Expr) -> Expr {
        self.expr(ExprKind::LocalVarAssignment {
            name: self.name(name),
            expr: Box::new(value),
            declaration: true,
        })
    }

    /// `name = value`
    pub fn assign(&self, name: &str, value: Expr) -> Expr {
        self.expr(ExprKind::LocalVarAssignment {
            name: self.name(name),
            expr: Box::new(value),
            declaration: false,
        })
    }

    pub fn call(&self, qualifier: Expr, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::FunCall {
            qualifier: Box::new(qualifier),
            args,
        })
    }

    /// Call of the function bound to `name`.
    pub fn call_named(&self, name: &str, args: Vec<Expr>) -> Expr {
        let qualifier = self.var(name);
        self.call(qualifier, args)
    }

    /// Binary operator; operators are ordinary global functions.
    pub fn binary(&self, op: &str, lhs: Expr, rhs: Expr) -> Expr {
        self.call_named(op, vec![lhs, rhs])
    }

    /// Named function literal.
    pub fn fun(&self, name: &str, parameters: &[&str], body: Vec<Expr>) -> Expr {
        self.function(Some(self.name(name)), parameters, body)
    }

    /// Anonymous function literal.
    pub fn lambda(&self, parameters: &[&str], body: Vec<Expr>) -> Expr {
        self.function(None, parameters, body)
    }

    fn function(&self, name: Option<Name>, parameters: &[&str], body: Vec<Expr>) -> Expr {
        let fun = Fun {
            name,
            parameters: parameters.iter().map(|p| self.name(p)).collect(),
            body: Block::new(body),
            line: self.line.get(),
        };
        self.expr(ExprKind::Fun(Rc::new(fun)))
    }

    pub fn ret(&self, value: Expr) -> Expr {
        self.expr(ExprKind::Return(Box::new(value)))
    }

    pub fn if_else(&self, condition: Expr, then_block: Vec<Expr>, else_block: Vec<Expr>) -> Expr {
        self.expr(ExprKind::If {
            condition: Box::new(condition),
            then_block: Block::new(then_block),
            else_block: Block::new(else_block),
        })
    }

    /// Record literal `{ name: init, ... }`.
    pub fn new_record(&self, fields: Vec<(&str, Expr)>) -> Expr {
        let fields = fields
            .into_iter()
            .map(|(name, init)| (self.name(name), init))
            .collect();
        self.expr(ExprKind::New(fields))
    }

    /// `receiver.name`
    pub fn get(&self, receiver: Expr, name: &str) -> Expr {
        self.expr(ExprKind::FieldAccess {
            receiver: Box::new(receiver),
            name: self.name(name),
        })
    }

    /// `receiver.name = value`
    pub fn set(&self, receiver: Expr, name: &str, value: Expr) -> Expr {
        self.expr(ExprKind::FieldAssignment {
            receiver: Box::new(receiver),
            name: self.name(name),
            expr: Box::new(value),
        })
    }

    /// `receiver.name(args...)`
    pub fn method(&self, receiver: Expr, name: &str, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::MethodCall {
            receiver: Box::new(receiver),
            name: self.name(name),
            args,
        })
    }

    pub fn block(&self, instrs: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Block(Block::new(instrs)))
    }

    pub fn script(&self, instrs: Vec<Expr>) -> Script {
        Script::new(Block::new(instrs))
    }
}
