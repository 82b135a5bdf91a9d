//! Global frame bootstrap.
//!
//! Operators and `print` are ordinary function values bound in the global
//! frame; the evaluator resolves `a + b` as a plain call to whatever `+` is
//! bound to, with no special casing.

use std::cmp::Ordering;
use std::rc::Rc;

use sjs_ir::StringInterner;

use crate::errors::{division_by_zero, operand_type, wrong_arg_count};
use crate::{Arity, EvalError, Function, NativeContext, NativeFn, ObjectRef, Value};

/// Name under which the global frame binds itself.
pub const GLOBAL_NAME: &str = "global";

/// Create the global frame with every primitive registered.
pub fn create_global_env(interner: &StringInterner) -> ObjectRef {
    let global = ObjectRef::new_env(None);
    global.register(interner.intern(GLOBAL_NAME), Value::Object(global.clone()));
    register_native(&global, interner, "print", Arity::Variadic, print);
    for &(op, func) in BINARY_OPERATORS {
        register_native(&global, interner, op, Arity::Fixed(2), func);
    }
    global
}

/// Bind a native primitive in `env`.
pub fn register_native(
    env: &ObjectRef,
    interner: &StringInterner,
    name: &str,
    arity: Arity,
    func: NativeFn,
) {
    let name = interner.intern(name);
    let function = Function::native(name, arity, func);
    env.register(name, Value::Function(Rc::new(function)));
}

const BINARY_OPERATORS: &[(&str, NativeFn)] = &[
    ("+", add),
    ("-", sub),
    ("*", mul),
    ("/", div),
    ("%", rem),
    ("==", eq),
    ("!=", ne),
    ("<", lt),
    ("<=", le),
    (">", gt),
    (">=", ge),
];

fn print(ctx: &NativeContext<'_>, _receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let line = args
        .iter()
        .map(|value| value.display(ctx.interner).to_string())
        .collect::<Vec<_>>()
        .join(" ");
    tracing::debug!(argc = args.len(), %line, "print called");
    ctx.print.println(&line);
    Ok(Value::Undefined)
}

fn operands<'v>(op: &str, args: &'v [Value]) -> Result<(&'v Value, &'v Value), EvalError> {
    match args {
        [lhs, rhs] => Ok((lhs, rhs)),
        _ => Err(wrong_arg_count(op, 2, args.len())),
    }
}

fn int_operands(op: &str, args: &[Value]) -> Result<(i32, i32), EvalError> {
    match operands(op, args)? {
        (Value::Int(a), Value::Int(b)) => Ok((*a, *b)),
        (Value::Int(_), other) | (other, _) => Err(operand_type(op, "int", other)),
    }
}

fn ordering(op: &str, args: &[Value]) -> Result<Ordering, EvalError> {
    let (lhs, rhs) = operands(op, args)?;
    lhs.compare(rhs)
        .ok_or_else(|| operand_type(op, lhs.type_name(), rhs))
}

macro_rules! int_arith {
    ($name:ident, $op:literal, |$a:ident, $b:ident| $body:expr) => {
        fn $name(_: &NativeContext<'_>, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
            let ($a, $b) = int_operands($op, args)?;
            $body.map(Value::Int)
        }
    };
}

int_arith!(add, "+", |a, b| Ok::<_, EvalError>(a.wrapping_add(b)));
int_arith!(sub, "-", |a, b| Ok::<_, EvalError>(a.wrapping_sub(b)));
int_arith!(mul, "*", |a, b| Ok::<_, EvalError>(a.wrapping_mul(b)));
int_arith!(div, "/", |a, b| if b == 0 {
    Err(division_by_zero())
} else {
    Ok(a.wrapping_div(b))
});
int_arith!(rem, "%", |a, b| if b == 0 {
    Err(division_by_zero())
} else {
    Ok(a.wrapping_rem(b))
});

fn eq(_: &NativeContext<'_>, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let (lhs, rhs) = operands("==", args)?;
    Ok(Value::from_flag(lhs == rhs))
}

fn ne(_: &NativeContext<'_>, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let (lhs, rhs) = operands("!=", args)?;
    Ok(Value::from_flag(lhs != rhs))
}

macro_rules! compare_op {
    ($name:ident, $op:literal, $test:expr) => {
        fn $name(_: &NativeContext<'_>, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
            let test: fn(Ordering) -> bool = $test;
            Ok(Value::from_flag(test(ordering($op, args)?)))
        }
    };
}

compare_op!(lt, "<", Ordering::is_lt);
compare_op!(le, "<=", Ordering::is_le);
compare_op!(gt, ">", Ordering::is_gt);
compare_op!(ge, ">=", Ordering::is_ge);
