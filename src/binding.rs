use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::key::Key;
use crate::request::DependencyRequest;

/// How many times a scope's binding is built per owning component, and whether it colors
/// ownership selection (production, reusable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// A normal scope: at most one instance per component bearing it.
    Normal,
    /// A relaxed scope with no uniqueness guarantee across the hierarchy.
    Reusable,
    /// Marks a binding as belonging to a production (async/producer) pipeline.
    Production,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    pub name: Arc<str>,
    pub kind: ScopeKind,
}

impl Scope {
    pub fn new(name: impl Into<Arc<str>>, kind: ScopeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn is_reusable(&self) -> bool {
        self.kind == ScopeKind::Reusable
    }

    pub fn is_production(&self) -> bool {
        self.kind == ScopeKind::Production
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Injection,
    AssistedInjection,
    AssistedFactory,
    Provision,
    Production,
    Delegate,
    MultiboundSet,
    MultiboundMap,
    Optional,
    SubcomponentCreator,
    MembersInjector,
    Component,
    ComponentProvision,
    ComponentDependency,
    BoundInstance,
    UnresolvedDelegate,
}

impl BindingKind {
    /// Bindings `ownership::owning_resolver`'s production-colored rule is willing to hoist to
    /// the nearest production component regardless of scope, because they're constructor
    /// injections rather than explicit provisions.
    pub fn is_injection(&self) -> bool {
        matches!(self, BindingKind::Injection | BindingKind::AssistedInjection)
    }
}

/// A rule for satisfying a [`Key`]: either a contribution binding or a members-injection
/// binding, depending on `kind`.
///
/// Bindings are value types. Their identity — used for deduplication and for the "is this
/// binding already installed here" checks in `ownership::owning_resolver` and
/// `reresolution::requires_resolution` — is the subset of fields that distinguish two
/// *distinct* installations of the same key:
/// `kind`, `key`, `scope`, `contributing_module` and `binding_element`. `dependencies` is
/// excluded from identity: it never differs between two bindings that already agree on the
/// above.
#[derive(Debug, Clone)]
pub struct Binding {
    pub key: Key,
    pub kind: BindingKind,
    pub scope: Option<Scope>,
    pub contributing_module: Option<Arc<str>>,
    pub binding_element: Option<Arc<str>>,
    pub dependencies: Vec<DependencyRequest>,
}

impl Binding {
    pub fn new(key: Key, kind: BindingKind) -> Self {
        Self {
            key,
            kind,
            scope: None,
            contributing_module: None,
            binding_element: None,
            dependencies: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_contributing_module(mut self, module: impl Into<Arc<str>>) -> Self {
        self.contributing_module = Some(module.into());
        self
    }

    pub fn with_binding_element(mut self, element: impl Into<Arc<str>>) -> Self {
        self.binding_element = Some(element.into());
        self
    }

    pub fn with_dependencies(mut self, deps: Vec<DependencyRequest>) -> Self {
        self.dependencies = deps;
        self
    }

    /// An `UNRESOLVED_DELEGATE` placeholder for `key`: no dependencies, no scope, no source.
    pub fn unresolved_delegate(key: Key) -> Self {
        Binding::new(key, BindingKind::UnresolvedDelegate)
    }

    fn identity_tuple(&self) -> (&Key, BindingKind, Option<&Scope>, Option<&str>, Option<&str>) {
        (
            &self.key,
            self.kind,
            self.scope.as_ref(),
            self.contributing_module.as_deref(),
            self.binding_element.as_deref(),
        )
    }
}

impl PartialEq for Binding {
    fn eq(&self, other: &Self) -> bool {
        self.identity_tuple() == other.identity_tuple()
    }
}

impl Eq for Binding {}

impl Hash for Binding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity_tuple().hash(state);
    }
}
