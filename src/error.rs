use thiserror::Error;

use crate::key::Key;

/// A violated invariant: a bug in the resolver itself (or in a collaborator's contract), never
/// a consequence of user input. These are unrecoverable and are raised via `panic!`, not
/// returned as a `Result`, because there is no sane way for the embedding compiler driver to
/// recover from a broken invariant in its own dependency graph.
#[derive(Debug, Error)]
pub enum ResolverBug {
    #[error(
        "multibinding synthesis was attempted for key {key:?}, but its type is neither a map nor a set"
    )]
    MultibindingOnNonCollectionKey { key: Box<Key> },

    #[error(
        "key {key:?} was looked up for consumption but isn't present in the current resolver's \
         table or any ancestor's"
    )]
    KeyMissingAtConsumption { key: Box<Key> },

    #[error(
        "the re-resolution cache was read for key {key:?} before `visit_uncached_dependencies` \
         finished populating its strongly-connected component"
    )]
    SccCachePostconditionViolated { key: Box<Key> },

    #[error("`cycle_stack` was non-empty at a public entry/exit point of `resolve`")]
    CycleStackNotEmptyAtBoundary,
}

impl ResolverBug {
    /// Raise this bug as a panic, the way the rest of the compiler treats "this should be
    /// unreachable" states in its own traversal code.
    pub fn raise(self) -> ! {
        panic!("{self}")
    }
}
