use std::sync::Arc;

use crate::request::RequestKind;

/// A framework container that wraps a value type in a request for something other than a
/// plain instance — e.g. the value side of a multibound map, or the inner type of an
/// `Optional<·>` binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameworkWrapper {
    Provider,
    Lazy,
    Producer,
    Produced,
    Future,
}

impl FrameworkWrapper {
    /// The [`RequestKind`] a value wrapped by this container corresponds to.
    pub fn request_kind(self) -> RequestKind {
        match self {
            FrameworkWrapper::Provider => RequestKind::Provider,
            FrameworkWrapper::Lazy => RequestKind::Lazy,
            FrameworkWrapper::Producer => RequestKind::Producer,
            FrameworkWrapper::Produced => RequestKind::Produced,
            FrameworkWrapper::Future => RequestKind::Future,
        }
    }
}

/// The resolver's view of a type: opaque beyond the shapes it has to reason about directly
/// (`Optional<·>`, `Map<K, V>`, multibindings, members injectors, assisted factories).
///
/// Everything else — a user type, a framework primitive, a qualifier-bearing newtype — is
/// `Named`, identified by its fully-qualified path and generic arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedType {
    Named {
        path: Arc<str>,
        generics: Vec<ResolvedType>,
    },
    Optional(Box<ResolvedType>),
    Set(Box<ResolvedType>),
    Map(Box<ResolvedType>, Box<ResolvedType>),
    Wrapped(FrameworkWrapper, Box<ResolvedType>),
    MembersInjector(Box<ResolvedType>),
    AssistedFactory { path: Arc<str> },
}

impl ResolvedType {
    /// Build a simple named type with no generic parameters.
    pub fn simple(path: impl Into<Arc<str>>) -> Self {
        ResolvedType::Named {
            path: path.into(),
            generics: Vec::new(),
        }
    }

    pub fn optional(inner: ResolvedType) -> Self {
        ResolvedType::Optional(Box::new(inner))
    }

    pub fn set(element: ResolvedType) -> Self {
        ResolvedType::Set(Box::new(element))
    }

    pub fn map(key: ResolvedType, value: ResolvedType) -> Self {
        ResolvedType::Map(Box::new(key), Box::new(value))
    }

    pub fn wrapped(wrapper: FrameworkWrapper, inner: ResolvedType) -> Self {
        ResolvedType::Wrapped(wrapper, Box::new(inner))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, ResolvedType::Map(..))
    }

    pub fn is_set(&self) -> bool {
        matches!(self, ResolvedType::Set(..))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, ResolvedType::Optional(_))
    }

    pub fn is_members_injector(&self) -> bool {
        matches!(self, ResolvedType::MembersInjector(_))
    }

    pub fn is_assisted_factory(&self) -> bool {
        matches!(self, ResolvedType::AssistedFactory { .. })
    }

    /// If this is `Optional<T>`, the inner `T`.
    pub fn unwrap_optional(&self) -> Option<&ResolvedType> {
        match self {
            ResolvedType::Optional(inner) => Some(inner),
            _ => None,
        }
    }

    /// The [`RequestKind`] implied by the value half of an `Optional<·>`: `Optional<Foo>` is
    /// an instance request, `Optional<Provider<Foo>>` is a provider request, and so on.
    pub fn optional_value_request_kind(&self) -> RequestKind {
        match self {
            ResolvedType::Wrapped(wrapper, _) => wrapper.request_kind(),
            _ => RequestKind::Instance,
        }
    }

    /// If this is `Map<K, Wrapper<V>>`, return `Map<K, V>`; otherwise, return this type
    /// unchanged. Mirrors `maybeUnwrapMapValue`.
    pub fn unwrap_map_value(&self) -> ResolvedType {
        match self {
            ResolvedType::Map(k, v) => match v.as_ref() {
                ResolvedType::Wrapped(_, inner) => {
                    ResolvedType::map(k.as_ref().clone(), inner.as_ref().clone())
                }
                _ => self.clone(),
            },
            _ => self.clone(),
        }
    }
}

/// Identity of a dependency-request target: a type, an optional qualifier annotation, and an
/// optional multibinding contribution identifier.
///
/// Equality and hashing are defined over exactly these three fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    qualifier: Option<Arc<str>>,
    type_: ResolvedType,
    contribution_id: Option<u64>,
}

impl Key {
    pub fn new(type_: ResolvedType) -> Self {
        Self {
            qualifier: None,
            type_,
            contribution_id: None,
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<Arc<str>>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    pub fn with_contribution_id(mut self, id: u64) -> Self {
        self.contribution_id = Some(id);
        self
    }

    pub fn type_(&self) -> &ResolvedType {
        &self.type_
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn contribution_id(&self) -> Option<u64> {
        self.contribution_id
    }

    pub fn is_multibinding_contribution(&self) -> bool {
        self.contribution_id.is_some()
    }

    /// Strip the multibinding contribution identifier, if any.
    pub fn strip_multibinding_contribution_identifier(&self) -> Key {
        Key {
            qualifier: self.qualifier.clone(),
            type_: self.type_.clone(),
            contribution_id: None,
        }
    }

    /// If this key's type is `Optional<T>`, the key for `T`, preserving the qualifier.
    /// Contribution identifiers don't carry across an optional unwrap: the inner lookup is a
    /// fresh request, not a multibinding contribution in its own right.
    pub fn unwrap_optional(&self) -> Option<Key> {
        self.type_.unwrap_optional().map(|inner| Key {
            qualifier: self.qualifier.clone(),
            type_: inner.clone(),
            contribution_id: None,
        })
    }

    /// Strip a framework wrapper from the value type of a `Map<K, Wrapper<V>>` key.
    pub fn unwrap_map_value(&self) -> Key {
        Key {
            qualifier: self.qualifier.clone(),
            type_: self.type_.unwrap_map_value(),
            contribution_id: self.contribution_id,
        }
    }
}
