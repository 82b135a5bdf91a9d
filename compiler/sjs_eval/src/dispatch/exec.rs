//! Execution of linked programs.
//!
//! Shares every non-call node with `interpreter::eval` through the
//! [`Evaluate`] helpers. The only divergence is at calls: the callee goes
//! through its site's cache before falling back to the checked protocol.

use std::rc::Rc;

use super::{CallSite, LinkedBlock, LinkedExpr, LinkedKind};
use crate::interpreter::{bind_function, Evaluate, Interpreter};
use crate::{EvalResult, ExecResult, Function, ObjectRef, Value};

impl Evaluate for LinkedExpr {
    fn evaluate(&self, interp: &mut Interpreter<'_>, env: &ObjectRef) -> ExecResult {
        interp.exec(self, env)
    }
}

impl Evaluate for LinkedBlock {
    fn evaluate(&self, interp: &mut Interpreter<'_>, env: &ObjectRef) -> ExecResult {
        interp.exec_block(self, env)
    }
}

impl Interpreter<'_> {
    pub(crate) fn exec_block(&mut self, block: &LinkedBlock, env: &ObjectRef) -> ExecResult {
        self.eval_sequence(&block.instrs, env)
    }

    fn exec(&mut self, expr: &LinkedExpr, env: &ObjectRef) -> ExecResult {
        let line = expr.line;
        match &expr.kind {
            LinkedKind::Block(block) => self.exec_block(block, env),
            LinkedKind::Literal(value) => Ok(value.clone()),
            LinkedKind::LocalVarAccess(name) => Ok(env.lookup(*name)),
            LinkedKind::LocalVarAssignment {
                name,
                expr,
                declaration,
            } => self.eval_assignment(*name, &**expr, *declaration, env, line),
            LinkedKind::Fun(fun) => {
                let function = Function::linked(Rc::clone(fun), env.clone(), self.names.lambda);
                Ok(bind_function(env, fun.name(), function))
            }
            LinkedKind::FunCall {
                qualifier,
                args,
                site,
            } => {
                let (function, args) = self.eval_call_parts(&**qualifier, args, env, line)?;
                Ok(self.dispatch(site, &function, Value::Undefined, &args, line)?)
            }
            LinkedKind::Return(expr) => self.eval_return(&**expr, env, line),
            LinkedKind::If {
                condition,
                then_block,
                else_block,
            } => self.eval_if(&**condition, then_block, else_block, env),
            LinkedKind::New(fields) => self.eval_record(fields, env),
            LinkedKind::FieldAccess { receiver, name } => {
                self.eval_field_read(&**receiver, *name, env, line)
            }
            LinkedKind::FieldAssignment {
                receiver,
                name,
                expr,
            } => self.eval_field_write(&**receiver, *name, &**expr, env, line),
            LinkedKind::MethodCall {
                receiver,
                name,
                args,
                site,
            } => {
                let (object, function, args) =
                    self.eval_method_parts(&**receiver, *name, args, env, line)?;
                Ok(self.dispatch(site, &function, Value::Object(object), &args, line)?)
            }
        }
    }

    /// Call `callee` through `site`: a guard hit runs the cached target,
    /// a miss takes the checked path and offers the result to the cache.
    fn dispatch(
        &mut self,
        site: &CallSite,
        callee: &Rc<Function>,
        receiver: Value,
        args: &[Value],
        line: u32,
    ) -> EvalResult {
        if let Some(target) = site.lookup(callee) {
            return self.invoke_target(&target, receiver, args, line);
        }
        let target = self.resolve_target(callee, args.len(), line)?;
        site.install(callee, &target);
        self.invoke_target(&target, receiver, args, line)
    }
}
