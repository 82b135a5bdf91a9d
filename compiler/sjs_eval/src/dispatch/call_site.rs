//! Per-call-site inline cache.
//!
//! Each call expression in a linked program owns one `CallSite`. The site
//! remembers which function values it has seen (by identity) together with
//! the resolved target for each, so a repeat call skips arity checking and
//! invoker selection.
//!
//! State machine:
//!
//! ```text
//! Uninitialized --miss--> Monomorphic --miss--> Polymorphic --miss (full)--> Megamorphic
//! ```
//!
//! Megamorphic is terminal: the chain it reached is frozen. Callees already
//! on it still hit; anything else re-resolves on every call and is never
//! added.

use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::Rc;

use smallvec::{smallvec, SmallVec};
use sjs_ir::Name;

use crate::{Function, Invoker};

/// Guarded entries a site holds before going megamorphic.
pub const DEFAULT_CACHE_DEPTH: usize = 3;

/// What a resolved call runs: the callee's name (for backtraces) and its
/// invoker, detached from the `Function` that produced them.
#[derive(Clone)]
pub struct Target {
    name: Name,
    invoker: Invoker,
}

impl Target {
    pub fn of(function: &Function) -> Self {
        Target {
            name: function.name(),
            invoker: function.invoker().clone(),
        }
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    #[inline]
    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }
}

struct CacheEntry {
    /// Held strongly so the identity can't be reused while cached.
    guard: Rc<Function>,
    target: Target,
}

impl CacheEntry {
    #[inline]
    fn matches(&self, callee: &Rc<Function>) -> bool {
        Rc::ptr_eq(&self.guard, callee)
    }
}

enum CacheState {
    Uninitialized,
    Monomorphic(CacheEntry),
    /// Most recently installed first.
    Polymorphic(SmallVec<[CacheEntry; DEFAULT_CACHE_DEPTH]>),
    /// Full chain, kept as it was when the site overflowed.
    Megamorphic(SmallVec<[CacheEntry; DEFAULT_CACHE_DEPTH]>),
}

impl CacheState {
    fn kind(&self) -> CacheStateKind {
        match self {
            CacheState::Uninitialized => CacheStateKind::Uninitialized,
            CacheState::Monomorphic(_) => CacheStateKind::Monomorphic,
            CacheState::Polymorphic(_) => CacheStateKind::Polymorphic,
            CacheState::Megamorphic(_) => CacheStateKind::Megamorphic,
        }
    }

    fn depth(&self) -> usize {
        match self {
            CacheState::Uninitialized => 0,
            CacheState::Monomorphic(_) => 1,
            CacheState::Polymorphic(entries) | CacheState::Megamorphic(entries) => entries.len(),
        }
    }
}

/// Observable cache state of a call site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheStateKind {
    Uninitialized,
    Monomorphic,
    Polymorphic,
    Megamorphic,
}

/// Hit/miss counters for one call site.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallSiteStats {
    pub hits: u64,
    pub misses: u64,
}

/// Inline cache attached to a single call expression.
pub struct CallSite {
    line: u32,
    argc: usize,
    max_depth: usize,
    state: RefCell<CacheState>,
    stats: Cell<CallSiteStats>,
}

impl CallSite {
    pub(crate) fn new(line: u32, argc: usize, max_depth: usize) -> Self {
        CallSite {
            line,
            argc,
            max_depth,
            state: RefCell::new(CacheState::Uninitialized),
            stats: Cell::new(CallSiteStats::default()),
        }
    }

    /// Look up `callee` in the cache, counting a hit or a miss.
    ///
    /// The state borrow ends before returning; callers invoke the target
    /// afterwards, possibly re-entering this site.
    pub(crate) fn lookup(&self, callee: &Rc<Function>) -> Option<Target> {
        let found = match &*self.state.borrow() {
            CacheState::Monomorphic(entry) => {
                entry.matches(callee).then(|| entry.target.clone())
            }
            CacheState::Polymorphic(entries) | CacheState::Megamorphic(entries) => entries
                .iter()
                .find(|entry| entry.matches(callee))
                .map(|entry| entry.target.clone()),
            CacheState::Uninitialized => None,
        };
        let mut stats = self.stats.get();
        if found.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        self.stats.set(stats);
        found
    }

    /// Record a freshly resolved callee after a miss.
    ///
    /// A full chain is frozen in place; the callee is then left uncached.
    pub(crate) fn install(&self, callee: &Rc<Function>, target: &Target) {
        let mut state = self.state.borrow_mut();
        let entry = CacheEntry {
            guard: Rc::clone(callee),
            target: target.clone(),
        };
        let previous = mem::replace(&mut *state, CacheState::Uninitialized);
        let from = previous.kind();
        let next = match previous {
            CacheState::Megamorphic(entries) => CacheState::Megamorphic(entries),
            _ if self.max_depth == 0 => CacheState::Megamorphic(SmallVec::new()),
            CacheState::Uninitialized => CacheState::Monomorphic(entry),
            CacheState::Monomorphic(first) if self.max_depth > 1 => {
                CacheState::Polymorphic(smallvec![entry, first])
            }
            CacheState::Monomorphic(first) => CacheState::Megamorphic(smallvec![first]),
            CacheState::Polymorphic(mut entries) if entries.len() < self.max_depth => {
                entries.insert(0, entry);
                CacheState::Polymorphic(entries)
            }
            CacheState::Polymorphic(entries) => CacheState::Megamorphic(entries),
        };
        if from != next.kind() || from == CacheStateKind::Polymorphic {
            tracing::trace!(
                line = self.line,
                ?from,
                to = ?next.kind(),
                depth = next.depth(),
                "call site transition"
            );
        }
        *state = next;
    }

    /// Source line of the call expression.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Number of arguments the call expression passes.
    pub fn argc(&self) -> usize {
        self.argc
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of cached entries.
    pub fn depth(&self) -> usize {
        self.state.borrow().depth()
    }

    pub fn state_kind(&self) -> CacheStateKind {
        self.state.borrow().kind()
    }

    pub fn stats(&self) -> CallSiteStats {
        self.stats.get()
    }
}

impl std::fmt::Debug for CallSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSite")
            .field("line", &self.line)
            .field("argc", &self.argc)
            .field("state", &self.state_kind())
            .field("depth", &self.depth())
            .field("stats", &self.stats())
            .finish()
    }
}
