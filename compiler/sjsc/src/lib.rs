//! SmallJS driver.
//!
//! Runs already-built scripts on either execution strategy, turns fatal
//! errors into diagnostics and owns the process-wide tracing setup.
//!
//! ```text
//! let options = RunOptions { strategy: ExecStrategy::InlineCache, ..RunOptions::default() };
//! run_and_report(&script, &interner, stdout_handler(), &options)?;
//! ```

use std::fmt::Write as _;
use std::io;
use std::sync::Once;

pub use sjs_eval::ExecStrategy;
use sjs_eval::{
    buffer_handler, EvalError, InterpreterBuilder, SharedPrintHandler, DEFAULT_CACHE_DEPTH,
};
use sjs_ir::{Script, StringInterner};

/// Execution settings for a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOptions {
    pub strategy: ExecStrategy,
    /// Entries per call site before it goes megamorphic.
    pub cache_depth: usize,
    /// Nested user calls allowed; `None` leaves depth bounded by the host
    /// stack.
    pub max_call_depth: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            strategy: ExecStrategy::TreeWalk,
            cache_depth: DEFAULT_CACHE_DEPTH,
            max_call_depth: None,
        }
    }
}

impl RunOptions {
    pub fn with_strategy(strategy: ExecStrategy) -> Self {
        RunOptions {
            strategy,
            ..RunOptions::default()
        }
    }
}

/// Run `script` to completion.
pub fn run_script(
    script: &Script,
    interner: &StringInterner,
    print_handler: SharedPrintHandler,
    options: &RunOptions,
) -> Result<(), EvalError> {
    InterpreterBuilder::new(interner)
        .print_handler(print_handler)
        .strategy(options.strategy)
        .cache_depth(options.cache_depth)
        .max_call_depth(options.max_call_depth)
        .build()
        .run(script)
}

/// Run `script`; a fatal error is reported on stderr before it is returned.
pub fn run_and_report(
    script: &Script,
    interner: &StringInterner,
    print_handler: SharedPrintHandler,
    options: &RunOptions,
) -> Result<(), EvalError> {
    run_and_report_to(script, interner, print_handler, options, &mut io::stderr().lock())
}

/// Like [`run_and_report`], with the diagnostic written to `diagnostics`.
///
/// The report is written whether or not a tracing subscriber is installed;
/// it is also logged at error level.
pub fn run_and_report_to(
    script: &Script,
    interner: &StringInterner,
    print_handler: SharedPrintHandler,
    options: &RunOptions,
    diagnostics: &mut dyn io::Write,
) -> Result<(), EvalError> {
    run_script(script, interner, print_handler, options).inspect_err(|error| {
        let report = report(error);
        tracing::error!(category = ?error.category(), "{report}");
        if let Err(write_error) = writeln!(diagnostics, "{report}") {
            tracing::warn!(%write_error, "failed to write diagnostic");
        }
    })
}

/// Fatal diagnostic text: the error line followed by its backtrace.
pub fn report(error: &EvalError) -> String {
    let mut out = format!("error: {error}");
    for (i, frame) in error.backtrace.frames().iter().enumerate() {
        let _ = write!(out, "\n  {i}: {} called at line {}", frame.name, frame.line);
    }
    out
}

/// Captured result of a run: printed output plus the fatal error, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub output: String,
    pub error: Option<EvalError>,
}

/// Run with output captured into a buffer.
pub fn run_captured(script: &Script, interner: &StringInterner, options: &RunOptions) -> Outcome {
    let handler = buffer_handler();
    let error = run_script(script, interner, handler.clone(), options).err();
    Outcome {
        output: handler.get_output(),
        error,
    }
}

static TRACING_INIT: Once = Once::new();

/// Install the global tracing subscriber.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=sjs_eval=debug` or `RUST_LOG=sjs_eval=trace`
/// (trace shows call-site cache transitions).
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(EnvFilter::from_default_env())
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .init();
        }
    });
}
