use std::rc::Rc;

use crate::binding::{Binding, BindingKind};
use crate::resolver::{Resolver, ResolverRef};

/// Where a binding should be installed: at the current resolver, or at a strict ancestor.
///
/// Kept as an enum rather than always handing back a `ResolverRef` so that "install locally"
/// never needs to go through the current resolver's own `Rc<RefCell<_>>` handle — doing that
/// while a caller already holds `&mut self` on the same `RefCell` would panic at the first
/// `.borrow()`.
#[derive(Clone)]
pub enum Ownership {
    Local,
    Ancestor(ResolverRef),
}

impl Ownership {
    pub fn is_local(&self) -> bool {
        matches!(self, Ownership::Local)
    }
}

enum LineageNode<'a> {
    Current(&'a Resolver),
    Ancestor(ResolverRef),
}

impl<'a> LineageNode<'a> {
    fn is_production_component(&self) -> bool {
        match self {
            LineageNode::Current(r) => r.component_descriptor().is_production,
            LineageNode::Ancestor(rc) => rc.borrow().component_descriptor().is_production,
        }
    }

    fn contains_explicit_binding(&self, binding: &Binding) -> bool {
        match self {
            LineageNode::Current(r) => contains_explicit_binding(r, binding),
            LineageNode::Ancestor(rc) => contains_explicit_binding(&rc.borrow(), binding),
        }
    }

    fn already_resolved_with_identity(&self, binding: &Binding) -> bool {
        match self {
            LineageNode::Current(r) => r.has_resolved_binding_identity(binding),
            LineageNode::Ancestor(rc) => rc.borrow().has_resolved_binding_identity(binding),
        }
    }

    fn has_scope(&self, scope: &crate::binding::Scope) -> bool {
        match self {
            LineageNode::Current(r) => r.component_descriptor().scopes.contains(scope),
            LineageNode::Ancestor(rc) => rc.borrow().component_descriptor().scopes.contains(scope),
        }
    }

    fn to_ownership(&self) -> Ownership {
        match self {
            LineageNode::Current(_) => Ownership::Local,
            LineageNode::Ancestor(rc) => Ownership::Ancestor(Rc::clone(rc)),
        }
    }
}

fn ancestors_self_to_root(current: &Resolver) -> Vec<ResolverRef> {
    let mut out = Vec::new();
    let mut cursor = current.parent().cloned();
    while let Some(p) = cursor {
        let next = p.borrow().parent().cloned();
        out.push(p);
        cursor = next;
    }
    out
}

fn lineage_root_to_self(current: &Resolver) -> Vec<LineageNode<'_>> {
    let mut ancestors = ancestors_self_to_root(current);
    ancestors.reverse();
    let mut nodes: Vec<LineageNode> = ancestors.into_iter().map(LineageNode::Ancestor).collect();
    nodes.push(LineageNode::Current(current));
    nodes
}

fn lineage_self_to_root(current: &Resolver) -> Vec<LineageNode<'_>> {
    let mut nodes = lineage_root_to_self(current);
    nodes.reverse();
    nodes
}

/// Whether `resolver`'s own declarations (not its ancestors') already name `binding` as an
/// explicit binding, delegate, or subcomponent creator.
pub fn contains_explicit_binding(resolver: &Resolver, binding: &Binding) -> bool {
    let declarations = resolver.declarations();
    if declarations.bindings(&binding.key).contains(binding) {
        return true;
    }
    if binding.kind == BindingKind::Delegate {
        let unwrapped = binding.key.unwrap_map_value();
        if declarations
            .delegates(&unwrapped)
            .iter()
            .any(|d| d.contributing_module == binding.contributing_module && d.binding_element == binding.binding_element)
        {
            return true;
        }
    }
    declarations.subcomponents(&binding.key).is_some()
}

/// Picks the component that should own `binding`, given where `current` sits in the
/// hierarchy. Rules are evaluated in order; the first match wins.
pub fn owning_resolver(current: &Resolver, binding: &Binding) -> Ownership {
    let is_production_colored =
        binding.scope.as_ref().map(|s| s.is_production()).unwrap_or(false) || binding.kind == BindingKind::Production;

    if is_production_colored {
        for node in lineage_root_to_self(current) {
            if binding.kind == BindingKind::Injection {
                if node.is_production_component() {
                    return node.to_ownership();
                }
            } else if node.contains_explicit_binding(binding) {
                return node.to_ownership();
            }
        }
        // No production component (for an injection) or no explicit install site found: this
        // rule simply doesn't match, fall through to (b).
    }

    if let Some(scope) = &binding.scope {
        if scope.is_reusable() {
            for node in lineage_self_to_root(current) {
                if node.already_resolved_with_identity(binding) {
                    return node.to_ownership();
                }
            }
            return Ownership::Local;
        }
    }

    for node in lineage_self_to_root(current) {
        if node.contains_explicit_binding(binding) {
            return node.to_ownership();
        }
    }

    if let Some(scope) = &binding.scope {
        for node in lineage_self_to_root(current) {
            if node.has_scope(scope) {
                return node.to_ownership();
            }
        }
    }

    Ownership::Local
}

/// Guards whether an implicit constructor-injection fallback binding is acceptable at all,
/// when the whole tree's root is itself a subcomponent.
pub fn is_correctly_scoped_in_subcomponent(current: &Resolver, root_is_subcomponent: bool, binding: &Binding) -> bool {
    if !root_is_subcomponent {
        return true;
    }
    let Some(scope) = &binding.scope else {
        return true;
    };
    if scope.is_reusable() {
        return true;
    }
    match owning_resolver(current, binding) {
        Ownership::Local => current.component_descriptor().scopes.contains(scope),
        Ownership::Ancestor(anc) => anc.borrow().component_descriptor().scopes.contains(scope),
    }
}
