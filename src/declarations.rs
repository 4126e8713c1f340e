use std::sync::{Arc, OnceLock};

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;

use crate::binding::{Binding, Scope};
use crate::component::ComponentDescriptor;
use crate::key::Key;
use crate::request::DependencyRequest;

/// A `@Binds`-like declaration: "whatever satisfies `delegate_request.key` also satisfies the
/// key this declaration is filed under".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DelegateDeclaration {
    pub delegate_request: DependencyRequest,
    pub scope: Option<Scope>,
    pub contributing_module: Option<Arc<str>>,
    pub binding_element: Option<Arc<str>>,
}

impl DelegateDeclaration {
    pub fn new(delegate_request: DependencyRequest) -> Self {
        Self {
            delegate_request,
            scope: None,
            contributing_module: None,
            binding_element: None,
        }
    }

    pub fn with_binding_element(mut self, element: impl Into<Arc<str>>) -> Self {
        self.binding_element = Some(element.into());
        self
    }

    pub fn with_contributing_module(mut self, module: impl Into<Arc<str>>) -> Self {
        self.contributing_module = Some(module.into());
        self
    }
}

/// A bare `@Multibinds`-like declaration: asserts that a multibound collection exists even if
/// no contribution has been registered for it (yet).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MultibindingDeclaration {
    pub contributing_module: Option<Arc<str>>,
}

/// A `@BindsOptionalOf`-like declaration, filed under the *unwrapped* key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OptionalDeclaration {
    pub contributing_module: Option<Arc<str>>,
}

fn empty_bindings() -> &'static IndexSet<Binding> {
    static EMPTY: OnceLock<IndexSet<Binding>> = OnceLock::new();
    EMPTY.get_or_init(IndexSet::new)
}

fn empty_delegates() -> &'static IndexSet<DelegateDeclaration> {
    static EMPTY: OnceLock<IndexSet<DelegateDeclaration>> = OnceLock::new();
    EMPTY.get_or_init(IndexSet::new)
}

fn empty_multibinding_declarations() -> &'static IndexSet<MultibindingDeclaration> {
    static EMPTY: OnceLock<IndexSet<MultibindingDeclaration>> = OnceLock::new();
    EMPTY.get_or_init(IndexSet::new)
}

fn empty_optional_declarations() -> &'static IndexSet<OptionalDeclaration> {
    static EMPTY: OnceLock<IndexSet<OptionalDeclaration>> = OnceLock::new();
    EMPTY.get_or_init(IndexSet::new)
}

/// The full set of declarations materialized for a single component: everything the module
/// system and the user's annotations contributed, indexed by key so the resolver can look
/// them up in O(1) rather than scanning.
///
/// This is built once per component by the (external) declaration-extraction pass and handed
/// to the resolver read-only.
#[derive(Debug, Clone, Default)]
pub struct ComponentDeclarations {
    bindings: IndexMap<Key, IndexSet<Binding>>,
    multibinding_contributions: IndexMap<Key, IndexSet<Binding>>,
    delegates: IndexMap<Key, IndexSet<DelegateDeclaration>>,
    delegate_multibinding_contributions: IndexMap<Key, IndexSet<DelegateDeclaration>>,
    multibinding_declarations: IndexMap<Key, IndexSet<MultibindingDeclaration>>,
    optional_declarations: IndexMap<Key, IndexSet<OptionalDeclaration>>,
    subcomponent_declarations: IndexMap<Key, Arc<ComponentDescriptor>>,
}

impl ComponentDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_binding(&mut self, key: Key, binding: Binding) -> &mut Self {
        self.bindings.entry(key).or_default().insert(binding);
        self
    }

    pub fn add_multibinding_contribution(&mut self, key: Key, contribution: Binding) -> &mut Self {
        self.multibinding_contributions
            .entry(key)
            .or_default()
            .insert(contribution);
        self
    }

    pub fn add_delegate(&mut self, key: Key, decl: DelegateDeclaration) -> &mut Self {
        self.delegates.entry(key).or_default().insert(decl);
        self
    }

    pub fn add_delegate_multibinding_contribution(
        &mut self,
        key: Key,
        decl: DelegateDeclaration,
    ) -> &mut Self {
        self.delegate_multibinding_contributions
            .entry(key)
            .or_default()
            .insert(decl);
        self
    }

    pub fn add_multibinding_declaration(&mut self, key: Key, decl: MultibindingDeclaration) -> &mut Self {
        self.multibinding_declarations
            .entry(key)
            .or_default()
            .insert(decl);
        self
    }

    /// `key` must already be unwrapped (see [`crate::key::Key::unwrap_optional`]).
    pub fn add_optional_declaration(&mut self, unwrapped_key: Key, decl: OptionalDeclaration) -> &mut Self {
        self.optional_declarations
            .entry(unwrapped_key)
            .or_default()
            .insert(decl);
        self
    }

    pub fn add_subcomponent(&mut self, creator_key: Key, child: Arc<ComponentDescriptor>) -> &mut Self {
        self.subcomponent_declarations.insert(creator_key, child);
        self
    }

    pub fn bindings(&self, key: &Key) -> &IndexSet<Binding> {
        self.bindings.get(key).unwrap_or_else(|| empty_bindings())
    }

    pub fn multibinding_contributions(&self, key: &Key) -> &IndexSet<Binding> {
        self.multibinding_contributions
            .get(key)
            .unwrap_or_else(|| empty_bindings())
    }

    pub fn delegates(&self, key: &Key) -> &IndexSet<DelegateDeclaration> {
        self.delegates.get(key).unwrap_or_else(|| empty_delegates())
    }

    pub fn delegate_multibinding_contributions(&self, key: &Key) -> &IndexSet<DelegateDeclaration> {
        self.delegate_multibinding_contributions
            .get(key)
            .unwrap_or_else(|| empty_delegates())
    }

    pub fn multibindings(&self, key: &Key) -> &IndexSet<MultibindingDeclaration> {
        self.multibinding_declarations
            .get(key)
            .unwrap_or_else(|| empty_multibinding_declarations())
    }

    pub fn optional_bindings(&self, key: &Key) -> &IndexSet<OptionalDeclaration> {
        self.optional_declarations
            .get(key)
            .unwrap_or_else(|| empty_optional_declarations())
    }

    pub fn subcomponents(&self, key: &Key) -> Option<&Arc<ComponentDescriptor>> {
        self.subcomponent_declarations.get(key)
    }

    /// Every key with at least one module-originated declaration, in first-seen order. Used by
    /// the orchestrator in full-binding-graph mode. A key can have both a plain binding and a
    /// multibinding contribution, so the three sources are deduplicated.
    pub fn all_declared_keys(&self) -> impl Iterator<Item = &Key> {
        self.bindings
            .keys()
            .chain(self.multibinding_contributions.keys())
            .chain(self.delegates.keys())
            .unique()
    }
}
