//! Linked execution with per-call-site inline caches.
//!
//! `link` lowers a `Script` into a parallel tree in which every call
//! expression and method call owns one persistent [`CallSite`]. Function
//! literals are linked once, so every closure created from the same literal
//! runs the same linked body and shares its call sites.
//!
//! Execution lives in `exec.rs` as a second evaluation loop on
//! `Interpreter`; it differs from the tree walker only in how a call
//! resolves its callee.

mod call_site;
mod exec;

pub use call_site::{CacheStateKind, CallSite, CallSiteStats, Target, DEFAULT_CACHE_DEPTH};

use std::rc::Rc;

use sjs_ir::{Block, Expr, ExprKind, Name, Script};

use crate::Value;

/// A linked expression with its source line.
pub struct LinkedExpr {
    pub(crate) kind: LinkedKind,
    pub(crate) line: u32,
}

pub(crate) enum LinkedKind {
    Block(LinkedBlock),
    /// Literals are converted to values at link time.
    Literal(Value),
    FunCall {
        qualifier: Box<LinkedExpr>,
        args: Vec<LinkedExpr>,
        site: Rc<CallSite>,
    },
    LocalVarAccess(Name),
    LocalVarAssignment {
        name: Name,
        expr: Box<LinkedExpr>,
        declaration: bool,
    },
    Fun(Rc<LinkedFun>),
    Return(Box<LinkedExpr>),
    If {
        condition: Box<LinkedExpr>,
        then_block: LinkedBlock,
        else_block: LinkedBlock,
    },
    New(Vec<(Name, LinkedExpr)>),
    FieldAccess {
        receiver: Box<LinkedExpr>,
        name: Name,
    },
    FieldAssignment {
        receiver: Box<LinkedExpr>,
        name: Name,
        expr: Box<LinkedExpr>,
    },
    MethodCall {
        receiver: Box<LinkedExpr>,
        name: Name,
        args: Vec<LinkedExpr>,
        site: Rc<CallSite>,
    },
}

pub struct LinkedBlock {
    pub(crate) instrs: Vec<LinkedExpr>,
}

/// A linked function literal.
pub struct LinkedFun {
    name: Option<Name>,
    parameters: Vec<Name>,
    body: LinkedBlock,
    line: u32,
}

impl LinkedFun {
    pub fn name(&self) -> Option<Name> {
        self.name
    }

    pub fn parameters(&self) -> &[Name] {
        &self.parameters
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub(crate) fn body(&self) -> &LinkedBlock {
        &self.body
    }
}

/// A script ready for inline-cached execution.
pub struct LinkedProgram {
    body: LinkedBlock,
    sites: Vec<Rc<CallSite>>,
}

impl LinkedProgram {
    pub(crate) fn body(&self) -> &LinkedBlock {
        &self.body
    }

    /// Every call site in the program, outer calls before the calls nested
    /// inside them.
    pub fn call_sites(&self) -> &[Rc<CallSite>] {
        &self.sites
    }

    /// Call sites originating from `line`.
    pub fn sites_at(&self, line: u32) -> impl Iterator<Item = &Rc<CallSite>> {
        self.sites.iter().filter(move |site| site.line() == line)
    }
}

/// Link `script`, giving each call site room for `cache_depth` entries.
#[tracing::instrument(level = "debug", skip(script))]
pub fn link(script: &Script, cache_depth: usize) -> LinkedProgram {
    let mut linker = Linker {
        cache_depth,
        sites: Vec::new(),
    };
    let body = linker.block(&script.body);
    tracing::debug!(sites = linker.sites.len(), "linked");
    LinkedProgram {
        body,
        sites: linker.sites,
    }
}

struct Linker {
    cache_depth: usize,
    sites: Vec<Rc<CallSite>>,
}

impl Linker {
    fn site(&mut self, line: u32, argc: usize) -> Rc<CallSite> {
        let site = Rc::new(CallSite::new(line, argc, self.cache_depth));
        self.sites.push(Rc::clone(&site));
        site
    }

    fn block(&mut self, block: &Block) -> LinkedBlock {
        LinkedBlock {
            instrs: block.instrs.iter().map(|expr| self.expr(expr)).collect(),
        }
    }

    fn boxed(&mut self, expr: &Expr) -> Box<LinkedExpr> {
        Box::new(self.expr(expr))
    }

    fn exprs(&mut self, exprs: &[Expr]) -> Vec<LinkedExpr> {
        exprs.iter().map(|expr| self.expr(expr)).collect()
    }

    fn expr(&mut self, expr: &Expr) -> LinkedExpr {
        let line = expr.line;
        let kind = match &expr.kind {
            ExprKind::Block(block) => LinkedKind::Block(self.block(block)),
            ExprKind::Literal(literal) => LinkedKind::Literal(Value::from_literal(literal)),
            ExprKind::FunCall { qualifier, args } => {
                let site = self.site(line, args.len());
                let qualifier = self.boxed(qualifier);
                let args = self.exprs(args);
                LinkedKind::FunCall {
                    qualifier,
                    args,
                    site,
                }
            }
            ExprKind::LocalVarAccess(name) => LinkedKind::LocalVarAccess(*name),
            ExprKind::LocalVarAssignment {
                name,
                expr,
                declaration,
            } => LinkedKind::LocalVarAssignment {
                name: *name,
                expr: self.boxed(expr),
                declaration: *declaration,
            },
            ExprKind::Fun(fun) => LinkedKind::Fun(Rc::new(LinkedFun {
                name: fun.name,
                parameters: fun.parameters.clone(),
                body: self.block(&fun.body),
                line: fun.line,
            })),
            ExprKind::Return(expr) => LinkedKind::Return(self.boxed(expr)),
            ExprKind::If {
                condition,
                then_block,
                else_block,
            } => LinkedKind::If {
                condition: self.boxed(condition),
                then_block: self.block(then_block),
                else_block: self.block(else_block),
            },
            ExprKind::New(fields) => LinkedKind::New(
                fields
                    .iter()
                    .map(|(name, init)| (*name, self.expr(init)))
                    .collect(),
            ),
            ExprKind::FieldAccess { receiver, name } => LinkedKind::FieldAccess {
                receiver: self.boxed(receiver),
                name: *name,
            },
            ExprKind::FieldAssignment {
                receiver,
                name,
                expr,
            } => LinkedKind::FieldAssignment {
                receiver: self.boxed(receiver),
                name: *name,
                expr: self.boxed(expr),
            },
            ExprKind::MethodCall {
                receiver,
                name,
                args,
            } => {
                let site = self.site(line, args.len());
                let receiver = self.boxed(receiver);
                let args = self.exprs(args);
                LinkedKind::MethodCall {
                    receiver,
                    name: *name,
                    args,
                    site,
                }
            }
        };
        LinkedExpr { kind, line }
    }
}

#[cfg(test)]
mod tests;
