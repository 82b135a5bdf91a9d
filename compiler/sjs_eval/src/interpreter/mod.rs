//! The interpreter: shared runtime state plus the two execution strategies.
//!
//! # Architecture
//!
//! - `eval.rs` - tree-walking evaluator over `sjs_ir::Expr`; the reference
//!   semantics
//! - `call.rs` - the invocation protocol shared by both strategies (arity
//!   check, frame creation, early-return consumption, backtraces)
//! - `crate::dispatch` - the linked strategy, where every call expression
//!   owns an inline cache
//!
//! Both strategies run against the same `Interpreter`, the same global frame
//! and the same primitives, and must produce identical output and errors for
//! every program.

mod builder;
mod call;
mod eval;

pub use builder::InterpreterBuilder;
pub(crate) use eval::{bind_function, Evaluate};

use smallvec::SmallVec;
use sjs_ir::{Name, Script, StringInterner};

use crate::diagnostics::CallStack;
use crate::dispatch::{link, LinkedProgram};
use crate::print_handler::SharedPrintHandler;
use crate::{EvalError, ObjectRef, Value};

/// Evaluated call arguments; most calls pass few enough to stay inline.
pub(crate) type Args = SmallVec<[Value; 4]>;

/// Which execution path `Interpreter::run` takes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExecStrategy {
    /// Re-resolve every callee on every call.
    #[default]
    TreeWalk,
    /// Link the program first; call sites cache their resolved callees.
    InlineCache,
}

/// Names the runtime binds itself, interned once.
#[derive(Clone, Copy)]
pub(crate) struct ReservedNames {
    /// Receiver binding in every function frame.
    pub(crate) this: Name,
    /// Name given to anonymous function literals.
    pub(crate) lambda: Name,
}

impl ReservedNames {
    fn new(interner: &StringInterner) -> Self {
        ReservedNames {
            this: interner.intern("this"),
            lambda: interner.intern("lambda"),
        }
    }
}

/// Tree-walking and linked interpreter.
pub struct Interpreter<'a> {
    pub(crate) interner: &'a StringInterner,
    pub(crate) print_handler: SharedPrintHandler,
    pub(crate) global: ObjectRef,
    pub(crate) call_stack: CallStack,
    pub(crate) names: ReservedNames,
    strategy: ExecStrategy,
    cache_depth: usize,
}

impl<'a> Interpreter<'a> {
    /// Run a script to completion with the configured strategy.
    #[tracing::instrument(level = "debug", skip_all, fields(strategy = ?self.strategy))]
    pub fn run(&mut self, script: &Script) -> Result<(), EvalError> {
        match self.strategy {
            ExecStrategy::TreeWalk => self.run_tree(script),
            ExecStrategy::InlineCache => {
                let program = link(script, self.cache_depth);
                self.run_linked(&program)
            }
        }
    }

    /// Evaluate a script by walking its tree.
    pub fn run_tree(&mut self, script: &Script) -> Result<(), EvalError> {
        let global = self.global.clone();
        self.eval_block(&script.body, &global)
            .map(drop)
            .map_err(crate::ControlAction::into_eval_error)
    }

    /// Execute an already linked program.
    ///
    /// Linking once and running the same `LinkedProgram` repeatedly keeps
    /// call-site caches warm across runs.
    pub fn run_linked(&mut self, program: &LinkedProgram) -> Result<(), EvalError> {
        let global = self.global.clone();
        self.exec_block(program.body(), &global)
            .map(drop)
            .map_err(crate::ControlAction::into_eval_error)
    }

    /// The global frame.
    pub fn global(&self) -> &ObjectRef {
        &self.global
    }

    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print_handler
    }

    pub fn strategy(&self) -> ExecStrategy {
        self.strategy
    }

    pub fn cache_depth(&self) -> usize {
        self.cache_depth
    }

    /// Current call depth (zero between runs).
    pub fn call_depth(&self) -> usize {
        self.call_stack.depth()
    }
}
