use indexmap::IndexSet;

use crate::binding::Binding;
use crate::component::ComponentPath;
use crate::declarations::{MultibindingDeclaration, OptionalDeclaration};
use crate::interner::SharedInterner;
use crate::key::Key;

/// Everything a [`BindingNode`] carries beyond the binding itself: where it is installed, and
/// the owning component's declaration sets at the time it was built. Two `BindingNodeData`
/// values that agree on all of this are, for every purpose this crate cares about, the same
/// node — which is exactly the property `Interner::get_or_intern` needs to hand back the
/// existing id instead of minting a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingNodeData {
    pub binding: Binding,
    pub installation_path: ComponentPath,
    pub multibinding_declarations: Vec<MultibindingDeclaration>,
    pub optional_declarations: Vec<OptionalDeclaration>,
    pub has_subcomponent_declaration: bool,
}

/// A handle into the tree-wide [`SharedInterner`]. Cheap to copy, comparable by equality, and
/// — crucially — identical across two resolvers when one inherits the other's node, so
/// ownership can be checked by comparing ids rather than deep-comparing binding data.
pub type BindingNode = la_arena::Idx<BindingNodeData>;

/// The complete set of bindings satisfying a single key, as seen from one component.
///
/// Holds a handle to the shared interner so that `bindings()` and `binding_nodes_owned_by` can
/// dereference the [`BindingNode`]s it stores without every caller having to thread the
/// interner through separately.
#[derive(Clone)]
pub struct ResolvedBindings {
    key: Key,
    nodes: IndexSet<BindingNode>,
    interner: SharedInterner<BindingNodeData>,
}

impl ResolvedBindings {
    pub fn empty(key: Key, interner: SharedInterner<BindingNodeData>) -> Self {
        Self {
            key,
            nodes: IndexSet::new(),
            interner,
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn insert(&mut self, node: BindingNode) {
        self.nodes.insert(node);
    }

    pub fn nodes(&self) -> impl Iterator<Item = BindingNode> + '_ {
        self.nodes.iter().copied()
    }

    /// The underlying [`Binding`] values, in insertion order.
    pub fn bindings(&self) -> Vec<Binding> {
        let interner = self.interner.borrow();
        self.nodes.iter().map(|n| interner[*n].binding.clone()).collect()
    }

    /// Nodes whose `installation_path` equals `path`, i.e. the ones this component actually
    /// owns rather than merely inherited.
    pub fn binding_nodes_owned_by(&self, path: &ComponentPath) -> Vec<BindingNode> {
        let interner = self.interner.borrow();
        self.nodes
            .iter()
            .copied()
            .filter(|n| &interner[*n].installation_path == path)
            .collect()
    }

    pub fn node_data(&self, node: BindingNode) -> BindingNodeData {
        self.interner.borrow()[node].clone()
    }
}

impl std::fmt::Debug for ResolvedBindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedBindings")
            .field("key", &self.key)
            .field("node_count", &self.nodes.len())
            .finish()
    }
}
