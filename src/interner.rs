use std::cell::RefCell;
use std::hash::Hash;
use std::rc::Rc;

use ahash::{HashMap, HashMapExt};

/// A simple interner to associate unique (cheap) identifiers to every distinct instance of a
/// type `T`.
///
/// Comparing identifiers is cheaper than comparing the raw `T` values directly, and handing
/// out the same identifier for equal values is exactly what gives two independently-built
/// [`crate::resolver::resolved_bindings::BindingNodeData`] instances a shared *identity*
/// when a descendant inherits an ancestor's binding node.
#[derive(Debug)]
pub struct Interner<T> {
    arena: la_arena::Arena<T>,
    item2id: HashMap<T, la_arena::Idx<T>>,
}

impl<T> Default for Interner<T> {
    fn default() -> Self {
        Self {
            arena: la_arena::Arena::new(),
            item2id: HashMap::new(),
        }
    }
}

impl<T> Interner<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T> Interner<T>
where
    T: Hash + Eq + Clone,
{
    /// Intern a value, returning its id. If the value is already interned, return its
    /// existing id without storing an additional copy.
    pub fn get_or_intern(&mut self, value: T) -> la_arena::Idx<T> {
        match self.item2id.get(&value) {
            Some(id) => *id,
            None => {
                let id = self.arena.alloc(value.clone());
                self.item2id.insert(value, id);
                id
            }
        }
    }
}

impl<T> std::ops::Index<la_arena::Idx<T>> for Interner<T> {
    type Output = T;

    fn index(&self, index: la_arena::Idx<T>) -> &Self::Output {
        &self.arena[index]
    }
}

/// A [`Interner`] shared (read+write) across every [`crate::resolver::Resolver`] in a
/// component tree, so that binding-node identity is comparable across resolvers rather than
/// only within one.
pub type SharedInterner<T> = Rc<RefCell<Interner<T>>>;

pub fn new_shared_interner<T>() -> SharedInterner<T> {
    Rc::new(RefCell::new(Interner::new()))
}
