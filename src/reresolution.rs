//! Deciding whether a binding inherited from an ancestor must be re-resolved (rebuilt
//! and re-installed) at the current component because something local changes the answer.

use std::collections::HashSet;

use indexmap::IndexMap;
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;

use crate::binding::{Binding, BindingKind};
use crate::key::Key;
use crate::resolver::Resolver;

fn is_scoped_to_component(binding: &Binding) -> bool {
    binding.scope.as_ref().map(|s| !s.is_reusable()).unwrap_or(false)
}

fn should_check_dependencies(binding: &Binding) -> bool {
    !is_scoped_to_component(binding) && binding.kind != BindingKind::Production
}

fn has_local_multibinding_contributions(resolver: &Resolver, key: &Key) -> bool {
    !resolver.declarations().multibinding_contributions(key).is_empty()
        || !resolver.declarations().delegate_multibinding_contributions(key).is_empty()
}

fn has_duplicate_explicit_binding(resolver: &Resolver, key: &Key, previously_resolved: &[Binding]) -> bool {
    let previously_resolved_nonempty = if resolver.options().exclude_injection_from_duplicate_check {
        previously_resolved.iter().any(|b| b.kind != BindingKind::Injection)
    } else {
        !previously_resolved.is_empty()
    };
    previously_resolved_nonempty && !resolver.declarations().bindings(key).is_empty()
}

fn has_local_optional_binding_contribution(resolver: &Resolver, key: &Key, previously_resolved: &[Binding]) -> bool {
    let Some(inner) = key.unwrap_optional() else {
        return false;
    };
    if previously_resolved.iter().any(|b| b.kind == BindingKind::Optional) {
        return !resolver.declarations().bindings(&inner).is_empty();
    }
    let local_has_declaration = !resolver.declarations().optional_bindings(&inner).is_empty();
    if !local_has_declaration {
        return false;
    }
    let mut ancestor = resolver.parent().cloned();
    while let Some(anc) = ancestor {
        let anc_ref = anc.borrow();
        if !anc_ref.declarations().optional_bindings(&inner).is_empty() {
            return false;
        }
        ancestor = anc_ref.parent().cloned();
    }
    true
}

fn has_local_bindings_for_key(resolver: &Resolver, key: &Key) -> bool {
    let previously_resolved = resolver
        .previously_resolved_in_ancestor(key)
        .map(|rb| rb.bindings())
        .unwrap_or_default();
    has_local_multibinding_contributions(resolver, key)
        || has_duplicate_explicit_binding(resolver, key, &previously_resolved)
        || has_local_optional_binding_contribution(resolver, key, &previously_resolved)
}

/// `has_local_bindings(binding)`: same predicate, but seeded with the binding's own key and
/// the singleton `{binding}` standing in for "the previously resolved set".
fn has_local_bindings_for_binding(resolver: &Resolver, binding: &Binding) -> bool {
    let previously_resolved = std::slice::from_ref(binding);
    has_local_multibinding_contributions(resolver, &binding.key)
        || has_duplicate_explicit_binding(resolver, &binding.key, previously_resolved)
        || has_local_optional_binding_contribution(resolver, &binding.key, previously_resolved)
}

fn is_not_allowed_to_float(resolver: &mut Resolver, binding: &Binding) -> bool {
    !binding.kind.is_injection() && depends_on_missing_binding(resolver, &binding.key)
}

fn depends_on_missing_binding(resolver: &mut Resolver, key: &Key) -> bool {
    ensure_cached(resolver, key);
    resolver.missing_cache_get(key).unwrap_or(false)
}

fn depends_on_local_binding(resolver: &mut Resolver, key: &Key) -> bool {
    ensure_cached(resolver, key);
    resolver.local_cache_get(key).unwrap_or(false)
}

fn requires_resolution_for_key(resolver: &mut Resolver, key: &Key) -> bool {
    depends_on_local_binding(resolver, key) || depends_on_missing_binding(resolver, key)
}

/// Whether `binding`, inherited from an ancestor, must be re-resolved locally rather than
/// reused as-is.
pub fn requires_resolution(resolver: &mut Resolver, binding: &Binding) -> bool {
    if is_not_allowed_to_float(resolver, binding) {
        return false;
    }
    if has_local_bindings_for_binding(resolver, binding) {
        return true;
    }
    if !should_check_dependencies(binding) {
        return false;
    }
    binding
        .dependencies
        .iter()
        .any(|d| requires_resolution_for_key(resolver, &d.key))
}

fn ensure_cached(resolver: &mut Resolver, key: &Key) {
    if !resolver.missing_cache_contains(key) {
        visit_uncached_dependencies(resolver, key);
    }
}

/// A Tarjan-SCC pass over the subgraph of previously-resolved bindings reachable from
/// `start_key`, filling both caches for every key it touches in one shot (they must agree on
/// the same SCC partition, since a key's answer can depend on a sibling in its own cycle).
fn visit_uncached_dependencies(resolver: &mut Resolver, start_key: &Key) {
    if resolver.missing_cache_contains(start_key) {
        return;
    }

    let mut index_of: IndexMap<Key, usize> = IndexMap::new();
    let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
    let mut seen: HashSet<Key> = HashSet::new();
    let mut stack = vec![start_key.clone()];

    while let Some(k) = stack.pop() {
        if !seen.insert(k.clone()) {
            continue;
        }
        if resolver.missing_cache_contains(&k) {
            continue;
        }
        let idx = *index_of.entry(k.clone()).or_insert_with_key(|_| {
            let i = graph.node_count();
            graph.add_node(i);
            i
        });

        let Some(resolved) = resolver.previously_resolved_in_ancestor(&k) else {
            continue;
        };
        for binding in resolved.bindings() {
            if !should_check_dependencies(&binding) {
                continue;
            }
            for dep in &binding.dependencies {
                if resolver.missing_cache_contains(&dep.key) {
                    continue;
                }
                let dep_idx = *index_of.entry(dep.key.clone()).or_insert_with_key(|_| {
                    let i = graph.node_count();
                    graph.add_node(i);
                    i
                });
                graph.add_edge(idx, dep_idx, ());
                stack.push(dep.key.clone());
            }
        }
    }

    // tarjan_scc returns components in reverse topological order: a component's out-edges
    // only ever point at components already emitted earlier in this list.
    for scc in tarjan_scc(&graph) {
        let members: Vec<Key> = scc.iter().map(|i| index_of.get_index(*i).unwrap().0.clone()).collect();
        let member_set: HashSet<&Key> = members.iter().collect();

        let mut cycle_bindings: Vec<Binding> = Vec::new();
        let mut any_empty = false;
        for k in &members {
            match resolver.previously_resolved_in_ancestor(k) {
                Some(rb) => {
                    if rb.is_empty() {
                        any_empty = true;
                    }
                    cycle_bindings.extend(rb.bindings());
                }
                None => any_empty = true,
            }
        }

        let depends_on_missing = any_empty
            || cycle_bindings.iter().any(|b| {
                should_check_dependencies(b)
                    && b.dependencies.iter().any(|d| {
                        !member_set.contains(&d.key) && resolver.missing_cache_get(&d.key).unwrap_or(false)
                    })
            });

        let depends_on_local = members.iter().any(|k| has_local_bindings_for_key(resolver, k))
            || cycle_bindings.iter().any(|b| {
                should_check_dependencies(b)
                    && b.dependencies.iter().any(|d| {
                        !member_set.contains(&d.key) && resolver.local_cache_get(&d.key).unwrap_or(false)
                    })
            });

        for k in members {
            resolver.insert_cache_entries(k, depends_on_missing, depends_on_local);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use std::sync::Arc;

    use super::*;
    use crate::collaborators::{CompilerOptions, EmptyInjectBindingRegistry};
    use crate::component::ComponentDescriptor;
    use crate::declarations::ComponentDeclarations;
    use crate::key::ResolvedType;

    fn key(name: &str) -> Key {
        Key::new(ResolvedType::simple(name))
    }

    #[test]
    fn missing_binding_is_not_allowed_to_float_for_non_inject_kinds() {
        let root = Resolver::new_root(
            Arc::new(ComponentDescriptor::root("test::Root")),
            ComponentDeclarations::new(),
            crate::interner::new_shared_interner(),
            Rc::new(EmptyInjectBindingRegistry),
            Rc::new(CompilerOptions::default()),
        );
        root.borrow_mut().resolve(&key("test::Foo"));
        let binding = Binding::new(key("test::Foo"), BindingKind::Provision);
        let mut root_mut = root.borrow_mut();
        let requires = requires_resolution(&mut root_mut, &binding);
        assert!(!requires);
    }
}
