use crate::binding::{Binding, BindingKind};
use crate::key::Key;
use crate::request::DependencyRequest;

/// Builds the single synthesized binding that stands in for a multibound collection: one
/// `DependencyRequest` per contribution key, so the normal dependency walk in `resolve` pulls
/// each contribution (and transitively, its own dependencies) into the table.
///
/// Panics (via [`crate::error::ResolverBug`]) if `key`'s type is neither a map nor a set —
/// `look_up_bindings` only calls this once it already knows contributions exist, so that would
/// mean a declaration was filed under the wrong kind of key, a bug upstream of this crate.
pub fn multibound_binding(key: &Key, contribution_keys: Vec<Key>) -> Binding {
    let kind = if key.type_().is_map() {
        BindingKind::MultiboundMap
    } else if key.type_().is_set() {
        BindingKind::MultiboundSet
    } else {
        crate::error::ResolverBug::MultibindingOnNonCollectionKey {
            key: Box::new(key.clone()),
        }
        .raise();
    };
    let dependencies = contribution_keys.into_iter().map(DependencyRequest::instance).collect();
    Binding::new(key.clone(), kind).with_dependencies(dependencies)
}

/// Builds the `OPTIONAL` binding for `key` (which must be `Optional<T>`). Its single
/// dependency is the unwrapped inner key, requested with whatever [`crate::request::RequestKind`]
/// the optional's value type implies (`Optional<Provider<Foo>>` requests `Foo` as a provider,
/// and so on) — see `ResolvedType::optional_value_request_kind`.
pub fn optional_binding(key: &Key, unwrapped: &Key) -> Binding {
    let request_kind = key.type_().optional_value_request_kind();
    Binding::new(key.clone(), BindingKind::Optional)
        .with_dependencies(vec![DependencyRequest::new(unwrapped.clone(), request_kind)])
}

pub fn subcomponent_creator_binding(key: &Key) -> Binding {
    Binding::new(key.clone(), BindingKind::SubcomponentCreator)
}

pub fn assisted_factory_binding(key: &Key) -> Binding {
    Binding::new(key.clone(), BindingKind::AssistedFactory)
}
