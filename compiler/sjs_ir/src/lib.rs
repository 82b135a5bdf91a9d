//! SmallJS IR - syntax tree and identifier types.
//!
//! This crate contains the data structures shared by the evaluator and the
//! linker:
//! - `Name` and `StringInterner` for interned identifiers
//! - the syntax tree (`Expr`, `Block`, `Fun`, `Script`)
//! - `AstBuilder` for constructing trees in code
//!
//! Source text parsing is not part of this workspace; programs arrive as
//! already-built trees.

pub mod ast;
mod builder;
mod interner;
mod name;

pub use ast::{Block, Expr, ExprKind, Fun, Literal, Script};
pub use builder::AstBuilder;
pub use interner::{InternError, StringInterner};
pub use name::Name;
