use std::sync::Arc;

use indexmap::IndexSet;

use crate::binding::Scope;
use crate::declarations::ComponentDeclarations;
use crate::key::Key;
use crate::request::{DependencyRequest, RequestKind};

/// One of a component's entry-point methods, declaring a single outgoing dependency request.
#[derive(Debug, Clone)]
pub struct EntryPoint {
    pub name: Arc<str>,
    pub request: DependencyRequest,
}

impl EntryPoint {
    pub fn new(name: impl Into<Arc<str>>, request: DependencyRequest) -> Self {
        Self {
            name: name.into(),
            request,
        }
    }

    pub fn is_members_injection(&self) -> bool {
        self.request.kind == RequestKind::MembersInjection
    }
}

/// A node in the component hierarchy: a root component or one of its (transitively) nested
/// subcomponents.
///
/// Children aren't tracked here directly — `look_up_bindings` discovers them through
/// `declarations.subcomponents(creator_key)`, keyed by the subcomponent factory method's
/// return type or the builder/factory type exposed as an entry point.
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    pub type_element: Arc<str>,
    pub scopes: IndexSet<Scope>,
    pub is_production: bool,
    pub is_subcomponent: bool,
    pub entry_points: Vec<EntryPoint>,
    /// This component's own declaration set, as materialized by the (external)
    /// declaration-extraction pass. The resolver only ever reads this.
    pub declarations: ComponentDeclarations,
}

impl ComponentDescriptor {
    pub fn root(type_element: impl Into<Arc<str>>) -> Self {
        Self {
            type_element: type_element.into(),
            scopes: IndexSet::new(),
            is_production: false,
            is_subcomponent: false,
            entry_points: Vec::new(),
            declarations: ComponentDeclarations::new(),
        }
    }

    pub fn subcomponent(type_element: impl Into<Arc<str>>) -> Self {
        Self {
            is_subcomponent: true,
            ..Self::root(type_element)
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scopes.insert(scope);
        self
    }

    pub fn with_production(mut self, is_production: bool) -> Self {
        self.is_production = is_production;
        self
    }

    pub fn with_entry_point(mut self, entry_point: EntryPoint) -> Self {
        self.entry_points.push(entry_point);
        self
    }

    pub fn with_declarations(mut self, declarations: ComponentDeclarations) -> Self {
        self.declarations = declarations;
        self
    }
}

/// An ordered list of component type elements from root to a particular component.
///
/// Equality is by sequence, which is exactly the identity `ResolvedBindings::bindings_owned_by`
/// and the interner rely on to recognise "is this the same installation site".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentPath(Vec<Arc<str>>);

impl ComponentPath {
    pub fn root(type_element: Arc<str>) -> Self {
        Self(vec![type_element])
    }

    pub fn child(&self, type_element: Arc<str>) -> Self {
        let mut path = self.0.clone();
        path.push(type_element);
        Self(path)
    }

    pub fn current_component(&self) -> &Arc<str> {
        self.0.last().expect("a component path is never empty")
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[Arc<str>] {
        &self.0
    }
}

impl std::fmt::Display for ComponentPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(" > "))
    }
}
