//! Invocation protocol shared by the tree walker and the linked strategy.
//!
//! A call is split in two halves so the inline cache can skip the first:
//! `resolve_target` checks arity and extracts what to run, `invoke_target`
//! runs it. A cache hit goes straight to `invoke_target`.

use std::rc::Rc;

use sjs_ir::Name;

use super::Interpreter;
use crate::diagnostics::CallFrame;
use crate::dispatch::Target;
use crate::errors::wrong_arg_count;
use crate::{
    Arity, ControlAction, EvalError, EvalResult, ExecResult, Function, Invoker, NativeContext,
    ObjectRef, Value,
};

impl Interpreter<'_> {
    /// Checked call: arity, then invocation.
    pub fn invoke(
        &mut self,
        function: &Rc<Function>,
        receiver: Value,
        args: &[Value],
        line: u32,
    ) -> EvalResult {
        let target = self.resolve_target(function, args.len(), line)?;
        self.invoke_target(&target, receiver, args, line)
    }

    /// Verify `argc` against the callee's arity and capture its target.
    pub fn resolve_target(
        &self,
        function: &Function,
        argc: usize,
        line: u32,
    ) -> Result<Target, EvalError> {
        match function.arity() {
            Arity::Fixed(expected) if expected != argc => Err(wrong_arg_count(
                self.interner.lookup(function.name()),
                expected,
                argc,
            )
            .at_line(line)),
            Arity::Fixed(_) | Arity::Variadic => Ok(Target::of(function)),
        }
    }

    /// Unchecked call: the arity was verified when `target` was resolved.
    pub fn invoke_target(
        &mut self,
        target: &Target,
        receiver: Value,
        args: &[Value],
        line: u32,
    ) -> EvalResult {
        match target.invoker() {
            Invoker::Native(native) => {
                let ctx = NativeContext {
                    interner: self.interner,
                    print: &self.print_handler,
                };
                native(&ctx, &receiver, args).map_err(|error| error.at_line(line))
            }
            Invoker::Closure { fun, scope } => {
                let frame = self.bind_frame(scope, &fun.parameters, receiver, args);
                self.enter(target.name(), line, |interp| {
                    interp.eval_block(&fun.body, &frame)
                })
            }
            Invoker::Linked { fun, scope } => {
                let frame = self.bind_frame(scope, fun.parameters(), receiver, args);
                self.enter(target.name(), line, |interp| {
                    interp.exec_block(fun.body(), &frame)
                })
            }
        }
    }

    /// Fresh frame under the captured scope with `this` and the parameters bound.
    fn bind_frame(
        &self,
        scope: &ObjectRef,
        parameters: &[Name],
        receiver: Value,
        args: &[Value],
    ) -> ObjectRef {
        let frame = ObjectRef::new_env(Some(scope));
        frame.register(self.names.this, receiver);
        for (&parameter, arg) in parameters.iter().zip(args) {
            frame.register(parameter, arg.clone());
        }
        frame
    }

    /// Run a user function body inside a call frame.
    ///
    /// The early-return signal stops here. Errors leaving the frame carry
    /// the backtrace of the innermost frame they crossed.
    fn enter(
        &mut self,
        name: Name,
        line: u32,
        body: impl FnOnce(&mut Self) -> ExecResult,
    ) -> EvalResult {
        if let Err(error) = self.call_stack.push(CallFrame {
            name,
            call_line: line,
        }) {
            return Err(self.with_backtrace(error.at_line(line)));
        }
        let result = match body(self) {
            Ok(value) | Err(ControlAction::Return { value, .. }) => Ok(value),
            Err(ControlAction::Error(error)) => Err(self.with_backtrace(error)),
        };
        self.call_stack.pop();
        result
    }

    fn with_backtrace(&self, mut error: EvalError) -> EvalError {
        if error.backtrace.is_empty() {
            error.backtrace = self.call_stack.capture(self.interner);
        }
        error
    }
}
