//! `InterpreterBuilder` for creating Interpreter instances with various configurations.

use sjs_ir::StringInterner;

use super::{ExecStrategy, Interpreter, ReservedNames};
use crate::diagnostics::CallStack;
use crate::dispatch::DEFAULT_CACHE_DEPTH;
use crate::{create_global_env, stdout_handler, ObjectRef, SharedPrintHandler};

/// Builder for creating Interpreter instances.
///
/// Defaults: tree-walking strategy, stdout printing, cache depth
/// [`DEFAULT_CACHE_DEPTH`], no call-depth limit, a fresh global frame.
pub struct InterpreterBuilder<'a> {
    interner: &'a StringInterner,
    global: Option<ObjectRef>,
    print_handler: Option<SharedPrintHandler>,
    strategy: ExecStrategy,
    cache_depth: usize,
    max_call_depth: Option<usize>,
}

impl<'a> InterpreterBuilder<'a> {
    pub fn new(interner: &'a StringInterner) -> Self {
        Self {
            interner,
            global: None,
            print_handler: None,
            strategy: ExecStrategy::default(),
            cache_depth: DEFAULT_CACHE_DEPTH,
            max_call_depth: None,
        }
    }

    /// Set the print handler for output.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn strategy(mut self, strategy: ExecStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Maximum number of guarded entries per call site before it goes
    /// megamorphic. Zero disables caching entirely.
    #[must_use]
    pub fn cache_depth(mut self, depth: usize) -> Self {
        self.cache_depth = depth;
        self
    }

    /// Fail with a resource error past `limit` nested user calls.
    #[must_use]
    pub fn max_call_depth(mut self, limit: Option<usize>) -> Self {
        self.max_call_depth = limit;
        self
    }

    /// Run against an existing global frame instead of a fresh one.
    ///
    /// The frame must already hold the primitives the program uses.
    #[must_use]
    pub fn global_env(mut self, global: ObjectRef) -> Self {
        self.global = Some(global);
        self
    }

    pub fn build(self) -> Interpreter<'a> {
        let global = self
            .global
            .unwrap_or_else(|| create_global_env(self.interner));
        Interpreter {
            interner: self.interner,
            print_handler: self.print_handler.unwrap_or_else(stdout_handler),
            global,
            call_stack: CallStack::new(self.max_call_depth),
            names: ReservedNames::new(self.interner),
            strategy: self.strategy,
            cache_depth: self.cache_depth,
        }
    }
}
