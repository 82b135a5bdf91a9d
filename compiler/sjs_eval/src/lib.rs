//! SmallJS Eval - runtime for the SmallJS scripting language.
//!
//! # Architecture
//!
//! The runtime uses:
//! - `ObjectRef`: one shared object type for both lexical scope frames and
//!   user records
//! - `Function`: first-class callables (native primitives and closures)
//! - `create_global_env`: the global frame with operators and `print` bound
//!   as ordinary functions
//! - `Interpreter`: a tree-walking evaluator and a linked evaluator whose
//!   call expressions carry inline caches (`dispatch`)
//!
//! Both strategies are required to behave identically; the linked one only
//! resolves callees faster.

mod builtins;
pub mod diagnostics;
pub mod dispatch;
mod environment;
pub mod errors;
mod function;
pub mod interpreter;
mod print_handler;
mod value;

pub use builtins::{create_global_env, register_native, GLOBAL_NAME};
pub use diagnostics::{CallFrame, CallStack};
pub use dispatch::{
    link, CacheStateKind, CallSite, CallSiteStats, LinkedProgram, Target, DEFAULT_CACHE_DEPTH,
};
pub use environment::{Object, ObjectRef, Role};
pub use errors::{
    Backtrace, BacktraceFrame, ControlAction, ErrorCategory, EvalError, EvalErrorKind, EvalResult,
    ExecResult,
};
pub use function::{Arity, Function, Invoker, NativeContext, NativeFn};
pub use interpreter::{ExecStrategy, Interpreter, InterpreterBuilder};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, writer_handler, BufferPrintHandler,
    PrintHandlerImpl, SharedPrintHandler, WriterPrintHandler,
};
pub use value::{Value, ValueDisplay};

use sjs_ir::{Script, StringInterner};

/// Run `script` on the tree-walking evaluator with default settings.
pub fn interpret(
    script: &Script,
    interner: &StringInterner,
    print_handler: SharedPrintHandler,
) -> Result<(), EvalError> {
    InterpreterBuilder::new(interner)
        .print_handler(print_handler)
        .build()
        .run(script)
}
