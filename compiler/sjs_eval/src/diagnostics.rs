//! Live call stack for depth limits and error backtraces.
//!
//! Both execution strategies push a `CallFrame` when entering a user
//! function and pop it on the way out. When an error crosses the innermost
//! invocation boundary the stack is snapshotted into a `Backtrace`.

use sjs_ir::{Name, StringInterner};

use crate::errors::{recursion_limit_exceeded, Backtrace, BacktraceFrame, EvalError};

/// A single frame in the live call stack.
#[derive(Clone, Copy, Debug)]
pub struct CallFrame {
    /// Function name.
    pub name: Name,
    /// Line of the call expression (where the call was made, not the definition).
    pub call_line: u32,
}

/// Live call stack for the interpreter.
///
/// Without a limit, depth is bounded only by the host stack: there is no
/// tail-call elimination and deep recursion in a script can exhaust it.
#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: Option<usize>,
}

impl CallStack {
    /// `max_depth` is `None` for unlimited.
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a call frame, checking the depth limit.
    ///
    /// The frame is NOT pushed on overflow.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), EvalError> {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(recursion_limit_exceeded(max));
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pop the most recent call frame.
    pub fn pop(&mut self) {
        debug_assert!(
            !self.frames.is_empty(),
            "CallStack::pop() called on empty stack"
        );
        self.frames.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Snapshot of the current stack, most recent call first.
    pub fn capture(&self, interner: &StringInterner) -> Backtrace {
        let frames = self
            .frames
            .iter()
            .rev()
            .map(|f| BacktraceFrame {
                name: interner.lookup(f.name).to_string(),
                line: f.call_line,
            })
            .collect();
        Backtrace::new(frames)
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new(None)
    }
}
