//! Unified scope frame and record storage.
//!
//! A lexical scope and a user-level record are the same thing here: an
//! ordered name-to-value map. A scope frame carries a parent link that
//! `lookup` climbs; a record never has one. Frames are shared by every
//! closure that captured them, so they live behind `Rc<RefCell<_>>`.
//!
//! # Thread Safety
//! `ObjectRef` is NOT thread-safe. The evaluator is single-threaded; running
//! two evaluations over the same frames concurrently would require swapping
//! the handle for a locked one.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use sjs_ir::Name;

use crate::Value;

/// What an object is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// A function's local scope (or the global frame).
    Scope,
    /// User-level record storage.
    Record,
}

/// Ordered bindings plus an optional parent frame.
pub struct Object {
    /// Bindings in insertion order.
    slots: Vec<(Name, Value)>,
    /// Position of each name in `slots`.
    index: FxHashMap<Name, usize>,
    parent: Option<ObjectRef>,
    role: Role,
}

impl Object {
    fn new(role: Role, parent: Option<ObjectRef>) -> Self {
        Object {
            slots: Vec::new(),
            index: FxHashMap::default(),
            parent,
            role,
        }
    }

    /// Local binding, without climbing.
    #[inline]
    pub fn get(&self, name: Name) -> Option<&Value> {
        self.index.get(&name).map(|&i| &self.slots[i].1)
    }

    /// Bind or overwrite in this frame. Overwriting keeps the original
    /// insertion position.
    #[inline]
    pub fn set(&mut self, name: Name, value: Value) {
        if let Some(&i) = self.index.get(&name) {
            self.slots[i].1 = value;
        } else {
            self.index.insert(name, self.slots.len());
            self.slots.push((name, value));
        }
    }

    /// Look up a name through the parent chain.
    pub fn lookup(&self, name: Name) -> Value {
        if let Some(value) = self.get(name) {
            return value.clone();
        }
        match &self.parent {
            Some(parent) => parent.lookup(name),
            None => Value::Undefined,
        }
    }

    /// Whether `name` is bound in this frame or any ancestor.
    pub fn is_visible(&self, name: Name) -> bool {
        self.index.contains_key(&name)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.is_visible(name))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// Shared handle to an [`Object`].
///
/// Cloning the handle shares the object; identity is pointer identity.
#[repr(transparent)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    /// Create a scope frame linked to `parent` (`None` for the global frame).
    pub fn new_env(parent: Option<&ObjectRef>) -> Self {
        ObjectRef(Rc::new(RefCell::new(Object::new(
            Role::Scope,
            parent.cloned(),
        ))))
    }

    /// Create an empty parentless record.
    pub fn new_record() -> Self {
        ObjectRef(Rc::new(RefCell::new(Object::new(Role::Record, None))))
    }

    /// Bind `name` in this frame, overwriting a local binding of the same name.
    #[inline]
    pub fn register(&self, name: Name, value: Value) {
        self.0.borrow_mut().set(name, value);
    }

    /// Resolve `name` through the parent chain; `Undefined` if unbound.
    #[inline]
    pub fn lookup(&self, name: Name) -> Value {
        self.0.borrow().lookup(name)
    }

    /// Whether `name` is bound anywhere on the chain.
    pub fn is_visible(&self, name: Name) -> bool {
        self.0.borrow().is_visible(name)
    }

    /// Local binding only (field access).
    #[inline]
    pub fn get_own(&self, name: Name) -> Option<Value> {
        self.0.borrow().get(name).cloned()
    }

    /// Local bindings in insertion order.
    pub fn fields(&self) -> Vec<(Name, Value)> {
        self.0.borrow().slots.clone()
    }

    pub fn parent(&self) -> Option<ObjectRef> {
        self.0.borrow().parent.clone()
    }

    pub fn role(&self) -> Role {
        self.0.borrow().role
    }

    pub fn is_record(&self) -> bool {
        self.role() == Role::Record
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Identity comparison.
    #[inline]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Clone for ObjectRef {
    #[inline]
    fn clone(&self) -> Self {
        ObjectRef(Rc::clone(&self.0))
    }
}

// Frames routinely contain themselves (`global.global`), so Debug stays shallow.
impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let object = self.0.borrow();
        f.debug_struct("ObjectRef")
            .field("role", &object.role)
            .field("len", &object.slots.len())
            .field("has_parent", &object.parent.is_some())
            .finish()
    }
}
