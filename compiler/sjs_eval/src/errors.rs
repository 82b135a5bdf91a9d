//! Evaluation errors and control-flow signals.
//!
//! Every error is fatal to the run: the language has no catch construct.
//! Factory functions are the public way to build errors so message wording
//! lives in one place.

use std::fmt;

use crate::Value;

/// Result of evaluating to a value.
pub type EvalResult = Result<Value, EvalError>;

/// Result of evaluating a statement or body, where an early `return` may be
/// in flight.
pub type ExecResult = Result<Value, ControlAction>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalErrorKind {
    #[error("type error, {value} is not a function")]
    NotCallable { value: String },

    #[error("type error, {value} is not an object")]
    NotAnObject { value: String },

    #[error("type error, operator {op} expects {expected}, got {got}")]
    OperandType {
        op: String,
        expected: &'static str,
        got: String,
    },

    #[error("wrong number of arguments, {name} expects {expected}, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("{name} is already declared")]
    DuplicateDeclaration { name: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("maximum call depth exceeded (limit: {depth})")]
    StackOverflow { depth: usize },

    /// An early-return signal reached the top level. Indicates an
    /// interpreter defect or a malformed tree, never a user error.
    #[error("internal error, return signal escaped its function")]
    ReturnOutsideFunction,
}

/// Coarse error classes reported to embedders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    TypeError,
    ArityError,
    DuplicateDeclarationError,
    ArithmeticError,
    ResourceError,
    InternalError,
}

impl EvalErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotCallable { .. } | Self::NotAnObject { .. } | Self::OperandType { .. } => {
                ErrorCategory::TypeError
            }
            Self::ArityMismatch { .. } => ErrorCategory::ArityError,
            Self::DuplicateDeclaration { .. } => ErrorCategory::DuplicateDeclarationError,
            Self::DivisionByZero => ErrorCategory::ArithmeticError,
            Self::StackOverflow { .. } => ErrorCategory::ResourceError,
            Self::ReturnOutsideFunction => ErrorCategory::InternalError,
        }
    }
}

/// A single frame in an evaluation backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    /// Function name.
    pub name: String,
    /// Line of the call expression that entered the function.
    pub line: u32,
}

/// Snapshot of the active calls at an error site, innermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Backtrace {
    frames: Vec<BacktraceFrame>,
}

impl Backtrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for Backtrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "stack backtrace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            writeln!(f, "  {i}: {} called at line {}", frame.name, frame.line)?;
        }
        Ok(())
    }
}

/// Evaluation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Source line of the node that failed.
    pub line: Option<u32>,
    /// Active calls when the error was raised.
    pub backtrace: Backtrace,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind) -> Self {
        EvalError {
            kind,
            line: None,
            backtrace: Backtrace::default(),
        }
    }

    /// Attach a source line unless one is already recorded.
    #[must_use]
    pub fn at_line(mut self, line: u32) -> Self {
        if self.line.is_none() {
            self.line = Some(line);
        }
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "at line {line}, {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for EvalError {}

/// Non-local exits threaded through evaluation results.
///
/// `Return` is consumed by the nearest enclosing invocation; seeing it
/// anywhere else is an internal failure.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlAction {
    Error(EvalError),
    /// Early return raised by the `return` on `line`.
    Return { value: Value, line: u32 },
}

impl ControlAction {
    /// Collapse at the top level, where a pending return is a defect.
    pub fn into_eval_error(self) -> EvalError {
        match self {
            ControlAction::Error(error) => error,
            ControlAction::Return { line, .. } => {
                EvalError::new(EvalErrorKind::ReturnOutsideFunction).at_line(line)
            }
        }
    }
}

impl From<EvalError> for ControlAction {
    #[inline]
    fn from(error: EvalError) -> Self {
        ControlAction::Error(error)
    }
}

// Factories

pub fn not_callable(value: String) -> EvalError {
    EvalError::new(EvalErrorKind::NotCallable { value })
}

pub fn not_an_object(value: String) -> EvalError {
    EvalError::new(EvalErrorKind::NotAnObject { value })
}

pub fn operand_type(op: &str, expected: &'static str, got: &Value) -> EvalError {
    EvalError::new(EvalErrorKind::OperandType {
        op: op.to_string(),
        expected,
        got: got.type_name().to_string(),
    })
}

pub fn wrong_arg_count(name: &str, expected: usize, got: usize) -> EvalError {
    EvalError::new(EvalErrorKind::ArityMismatch {
        name: name.to_string(),
        expected,
        got,
    })
}

pub fn duplicate_declaration(name: &str) -> EvalError {
    EvalError::new(EvalErrorKind::DuplicateDeclaration {
        name: name.to_string(),
    })
}

pub fn division_by_zero() -> EvalError {
    EvalError::new(EvalErrorKind::DivisionByZero)
}

pub fn recursion_limit_exceeded(depth: usize) -> EvalError {
    EvalError::new(EvalErrorKind::StackOverflow { depth })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_includes_line() {
        let error = not_callable("3".to_string()).at_line(4);
        assert_eq!(error.to_string(), "at line 4, type error, 3 is not a function");
    }

    #[test]
    fn display_without_line() {
        assert_eq!(division_by_zero().to_string(), "division by zero");
    }

    #[test]
    fn at_line_keeps_innermost_line() {
        let error = duplicate_declaration("x").at_line(2).at_line(9);
        assert_eq!(error.line, Some(2));
    }

    #[test]
    fn categories() {
        assert_eq!(
            not_an_object("1".to_string()).category(),
            ErrorCategory::TypeError
        );
        assert_eq!(
            operand_type("+", "int", &Value::Undefined).category(),
            ErrorCategory::TypeError
        );
        assert_eq!(
            wrong_arg_count("f", 1, 2).category(),
            ErrorCategory::ArityError
        );
        assert_eq!(
            duplicate_declaration("x").category(),
            ErrorCategory::DuplicateDeclarationError
        );
        assert_eq!(
            recursion_limit_exceeded(10).category(),
            ErrorCategory::ResourceError
        );
    }

    #[test]
    fn escaped_return_is_internal() {
        let error = ControlAction::Return {
            value: Value::Int(1),
            line: 7,
        }
        .into_eval_error();
        assert_eq!(error.kind, EvalErrorKind::ReturnOutsideFunction);
        assert_eq!(error.line, Some(7));
        assert_eq!(error.category(), ErrorCategory::InternalError);
    }

    #[test]
    fn arity_message_names_function() {
        assert_eq!(
            wrong_arg_count("f", 1, 2).to_string(),
            "wrong number of arguments, f expects 1, got 2"
        );
    }

    #[test]
    fn backtrace_display() {
        let backtrace = Backtrace::new(vec![
            BacktraceFrame {
                name: "inner".to_string(),
                line: 3,
            },
            BacktraceFrame {
                name: "outer".to_string(),
                line: 7,
            },
        ]);
        assert_eq!(
            backtrace.to_string(),
            "stack backtrace:\n  0: inner called at line 3\n  1: outer called at line 7\n"
        );
        assert_eq!(Backtrace::default().to_string(), "");
    }
}
