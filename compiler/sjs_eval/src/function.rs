//! Callable values.
//!
//! A `Function` pairs a name and an arity with an `Invoker`: either a native
//! primitive or a closure over the environment that was current when the
//! literal was evaluated. Closures come in two flavours, one per execution
//! strategy, differing only in which body representation they run.

use std::fmt;
use std::rc::Rc;

use sjs_ir::{Fun, Name, StringInterner};

use crate::dispatch::LinkedFun;
use crate::print_handler::PrintHandlerImpl;
use crate::{EvalError, ObjectRef, Value};

/// What a native primitive gets to see of the interpreter.
pub struct NativeContext<'a> {
    pub interner: &'a StringInterner,
    pub print: &'a PrintHandlerImpl,
}

/// Native primitive: `(context, receiver, args)`.
pub type NativeFn = fn(&NativeContext<'_>, &Value, &[Value]) -> Result<Value, EvalError>;

/// Number of arguments a callable accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Variadic,
}

impl Arity {
    #[inline]
    pub fn accepts(self, argc: usize) -> bool {
        match self {
            Arity::Fixed(n) => n == argc,
            Arity::Variadic => true,
        }
    }
}

/// How a callable runs.
#[derive(Clone)]
pub enum Invoker {
    Native(NativeFn),
    /// Tree-walked body with its defining scope.
    Closure { fun: Rc<Fun>, scope: ObjectRef },
    /// Linked body (inline-cached call sites) with its defining scope.
    Linked { fun: Rc<LinkedFun>, scope: ObjectRef },
}

/// A first-class function value.
pub struct Function {
    name: Name,
    arity: Arity,
    invoker: Invoker,
}

impl Function {
    pub fn native(name: Name, arity: Arity, func: NativeFn) -> Self {
        Function {
            name,
            arity,
            invoker: Invoker::Native(func),
        }
    }

    /// Closure over `scope`; anonymous literals are named `fallback`.
    pub fn closure(fun: Rc<Fun>, scope: ObjectRef, fallback: Name) -> Self {
        Function {
            name: fun.name.unwrap_or(fallback),
            arity: Arity::Fixed(fun.parameters.len()),
            invoker: Invoker::Closure { fun, scope },
        }
    }

    /// Linked closure over `scope`; anonymous literals are named `fallback`.
    pub fn linked(fun: Rc<LinkedFun>, scope: ObjectRef, fallback: Name) -> Self {
        Function {
            name: fun.name().unwrap_or(fallback),
            arity: Arity::Fixed(fun.parameters().len()),
            invoker: Invoker::Linked { fun, scope },
        }
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    #[inline]
    pub fn arity(&self) -> Arity {
        self.arity
    }

    #[inline]
    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    pub fn is_native(&self) -> bool {
        matches!(self.invoker, Invoker::Native(_))
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.invoker {
            Invoker::Native(_) => "native",
            Invoker::Closure { .. } => "closure",
            Invoker::Linked { .. } => "linked",
        };
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("kind", &kind)
            .finish()
    }
}
