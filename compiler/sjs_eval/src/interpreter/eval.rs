//! Tree-walking evaluation of `sjs_ir` expressions.
//!
//! Node semantics that do not involve calling are written once, as helpers
//! generic over [`Evaluate`], and shared with the linked evaluator in
//! `crate::dispatch::exec`. Each evaluator's own match only differs at
//! function literals and calls.

use std::rc::Rc;

use sjs_ir::{Block, Expr, ExprKind, Name};

use super::{Args, Interpreter};
use crate::errors::{duplicate_declaration, not_an_object, not_callable};
use crate::{ControlAction, EvalError, ExecResult, Function, ObjectRef, Value};

/// A node one of the evaluators can run in a scope.
pub(crate) trait Evaluate {
    fn evaluate(&self, interp: &mut Interpreter<'_>, env: &ObjectRef) -> ExecResult;
}

impl Evaluate for Expr {
    fn evaluate(&self, interp: &mut Interpreter<'_>, env: &ObjectRef) -> ExecResult {
        interp.eval(self, env)
    }
}

impl Evaluate for Block {
    fn evaluate(&self, interp: &mut Interpreter<'_>, env: &ObjectRef) -> ExecResult {
        interp.eval_block(self, env)
    }
}

impl Interpreter<'_> {
    pub(crate) fn eval_block(&mut self, block: &Block, env: &ObjectRef) -> ExecResult {
        self.eval_sequence(&block.instrs, env)
    }

    pub(crate) fn eval(&mut self, expr: &Expr, env: &ObjectRef) -> ExecResult {
        let line = expr.line;
        match &expr.kind {
            ExprKind::Block(block) => self.eval_block(block, env),
            ExprKind::Literal(literal) => Ok(Value::from_literal(literal)),
            ExprKind::LocalVarAccess(name) => Ok(env.lookup(*name)),
            ExprKind::LocalVarAssignment {
                name,
                expr,
                declaration,
            } => self.eval_assignment(*name, &**expr, *declaration, env, line),
            ExprKind::Fun(fun) => {
                let function = Function::closure(Rc::clone(fun), env.clone(), self.names.lambda);
                Ok(bind_function(env, fun.name, function))
            }
            ExprKind::FunCall { qualifier, args } => {
                let (function, args) = self.eval_call_parts(&**qualifier, args, env, line)?;
                Ok(self.invoke(&function, Value::Undefined, &args, line)?)
            }
            ExprKind::Return(expr) => self.eval_return(&**expr, env, line),
            ExprKind::If {
                condition,
                then_block,
                else_block,
            } => self.eval_if(&**condition, then_block, else_block, env),
            ExprKind::New(fields) => self.eval_record(fields, env),
            ExprKind::FieldAccess { receiver, name } => {
                self.eval_field_read(&**receiver, *name, env, line)
            }
            ExprKind::FieldAssignment {
                receiver,
                name,
                expr,
            } => self.eval_field_write(&**receiver, *name, &**expr, env, line),
            ExprKind::MethodCall {
                receiver,
                name,
                args,
            } => {
                let (object, function, args) =
                    self.eval_method_parts(&**receiver, *name, args, env, line)?;
                Ok(self.invoke(&function, Value::Object(object), &args, line)?)
            }
        }
    }

    /// Run statements in order; a block's own value is always `undefined`.
    pub(crate) fn eval_sequence<N: Evaluate>(
        &mut self,
        instrs: &[N],
        env: &ObjectRef,
    ) -> ExecResult {
        for instr in instrs {
            instr.evaluate(self, env)?;
        }
        Ok(Value::Undefined)
    }

    pub(crate) fn eval_assignment<N: Evaluate>(
        &mut self,
        name: Name,
        expr: &N,
        declaration: bool,
        env: &ObjectRef,
        line: u32,
    ) -> ExecResult {
        let value = expr.evaluate(self, env)?;
        self.assign_local(env, name, value, declaration, line)
    }

    /// The signal carries the line so a `return` outside any function can
    /// be reported where it was written.
    pub(crate) fn eval_return<N: Evaluate>(
        &mut self,
        expr: &N,
        env: &ObjectRef,
        line: u32,
    ) -> ExecResult {
        let value = expr.evaluate(self, env)?;
        Err(ControlAction::Return { value, line })
    }

    pub(crate) fn eval_if<C: Evaluate, B: Evaluate>(
        &mut self,
        condition: &C,
        then_block: &B,
        else_block: &B,
        env: &ObjectRef,
    ) -> ExecResult {
        let branch = if condition.evaluate(self, env)?.is_truthy() {
            then_block
        } else {
            else_block
        };
        branch.evaluate(self, env)
    }

    pub(crate) fn eval_record<N: Evaluate>(
        &mut self,
        fields: &[(Name, N)],
        env: &ObjectRef,
    ) -> ExecResult {
        let record = ObjectRef::new_record();
        for (name, init) in fields {
            let value = init.evaluate(self, env)?;
            record.register(*name, value);
        }
        Ok(Value::Object(record))
    }

    pub(crate) fn eval_field_read<N: Evaluate>(
        &mut self,
        receiver: &N,
        name: Name,
        env: &ObjectRef,
        line: u32,
    ) -> ExecResult {
        let receiver = receiver.evaluate(self, env)?;
        let object = self.expect_object(receiver, line)?;
        Ok(object.get_own(name).unwrap_or(Value::Undefined))
    }

    /// The receiver is checked before the new value is evaluated.
    pub(crate) fn eval_field_write<N: Evaluate>(
        &mut self,
        receiver: &N,
        name: Name,
        expr: &N,
        env: &ObjectRef,
        line: u32,
    ) -> ExecResult {
        let receiver = receiver.evaluate(self, env)?;
        let object = self.expect_object(receiver, line)?;
        let value = expr.evaluate(self, env)?;
        object.register(name, value.clone());
        Ok(value)
    }

    /// Callee and arguments of a plain call. The callee must be a function
    /// before any argument is evaluated.
    pub(crate) fn eval_call_parts<N: Evaluate>(
        &mut self,
        qualifier: &N,
        args: &[N],
        env: &ObjectRef,
        line: u32,
    ) -> Result<(Rc<Function>, Args), ControlAction> {
        let callee = qualifier.evaluate(self, env)?;
        let function = self.expect_function(callee, line)?;
        let args = self.eval_args(args, env)?;
        Ok((function, args))
    }

    /// Receiver, method and arguments of a method call.
    pub(crate) fn eval_method_parts<N: Evaluate>(
        &mut self,
        receiver: &N,
        name: Name,
        args: &[N],
        env: &ObjectRef,
        line: u32,
    ) -> Result<(ObjectRef, Rc<Function>, Args), ControlAction> {
        let receiver = receiver.evaluate(self, env)?;
        let object = self.expect_object(receiver, line)?;
        let field = object.get_own(name).unwrap_or(Value::Undefined);
        let function = self.expect_function(field, line)?;
        let args = self.eval_args(args, env)?;
        Ok((object, function, args))
    }

    fn eval_args<N: Evaluate>(
        &mut self,
        args: &[N],
        env: &ObjectRef,
    ) -> Result<Args, ControlAction> {
        args.iter().map(|arg| arg.evaluate(self, env)).collect()
    }

    /// Bind a variable in `env`. A declaration fails if the name is visible
    /// anywhere on the chain; a plain assignment writes the current frame.
    fn assign_local(
        &self,
        env: &ObjectRef,
        name: Name,
        value: Value,
        declaration: bool,
        line: u32,
    ) -> ExecResult {
        if declaration && env.is_visible(name) {
            return Err(duplicate_declaration(self.interner.lookup(name))
                .at_line(line)
                .into());
        }
        env.register(name, value.clone());
        Ok(value)
    }

    fn expect_function(&self, value: Value, line: u32) -> Result<Rc<Function>, EvalError> {
        match value {
            Value::Function(function) => Ok(function),
            other => Err(not_callable(other.display(self.interner).to_string()).at_line(line)),
        }
    }

    fn expect_object(&self, value: Value, line: u32) -> Result<ObjectRef, EvalError> {
        match value {
            Value::Object(object) => Ok(object),
            other => Err(not_an_object(other.display(self.interner).to_string()).at_line(line)),
        }
    }
}

/// Wrap a fresh closure; a named literal is also bound in its defining frame.
pub(crate) fn bind_function(env: &ObjectRef, name: Option<Name>, function: Function) -> Value {
    let value = Value::Function(Rc::new(function));
    if let Some(name) = name {
        env.register(name, value.clone());
    }
    value
}
