//! Runtime values.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use sjs_ir::{Literal, StringInterner};

use crate::{Function, ObjectRef};

/// A dynamically typed runtime value.
#[derive(Clone)]
pub enum Value {
    Undefined,
    Int(i32),
    Bool(bool),
    Str(Rc<str>),
    /// A record or a scope frame.
    Object(ObjectRef),
    Function(Rc<Function>),
}

impl Value {
    /// Create a string value.
    pub fn string(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    /// Integer `1`/`0` for a comparison outcome.
    #[inline]
    pub fn from_flag(flag: bool) -> Self {
        Value::Int(i32::from(flag))
    }

    /// Value of a literal node.
    pub fn from_literal(literal: &Literal) -> Self {
        match literal {
            Literal::Int(n) => Value::Int(*n),
            Literal::Str(s) => Value::Str(Rc::clone(s)),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Undefined => Value::Undefined,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    /// Condition test used by `if`: only the integer zero is false.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Int(0))
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Rc<Function>> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Ordering between two values of the same primitive kind.
    ///
    /// Returns `None` across kinds and for objects, functions and `undefined`.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// String form used by `print` and error messages.
    pub fn display<'a>(&'a self, interner: &'a StringInterner) -> ValueDisplay<'a> {
        ValueDisplay {
            value: self,
            interner,
            nested: false,
        }
    }
}

/// Equality by value for primitives, by identity for objects and functions.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Object(o) => write!(f, "Object({o:?})"),
            Value::Function(func) => write!(f, "Function({func:?})"),
        }
    }
}

/// Display adapter resolving names through the interner.
///
/// Records show their fields one level deep; nested objects render as
/// `{...}` so self-referencing frames terminate.
pub struct ValueDisplay<'a> {
    value: &'a Value,
    interner: &'a StringInterner,
    nested: bool,
}

impl fmt::Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Undefined => write!(f, "undefined"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Function(func) => write!(f, "function {}", self.interner.lookup(func.name())),
            Value::Object(object) if !object.is_record() => write!(f, "[scope]"),
            Value::Object(_) if self.nested => write!(f, "{{...}}"),
            Value::Object(object) => {
                write!(f, "{{")?;
                for (i, (name, value)) in object.fields().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    let inner = ValueDisplay {
                        value,
                        interner: self.interner,
                        nested: true,
                    };
                    write!(f, "{}: {inner}", self.interner.lookup(*name))?;
                }
                write!(f, "}}")
            }
        }
    }
}
