//! The top-level entry point: seeds entry points, drains the subcomponent queue, and
//! assembles the per-component resolution tables into a tree.

use std::rc::Rc;
use std::sync::Arc;

use crate::collaborators::{CompilerOptions, InjectBindingRegistry};
use crate::component::{ComponentDescriptor, ComponentPath};
use crate::interner::new_shared_interner;
use crate::request::DependencyRequest;
use crate::resolver::{Resolver, ResolverRef, ResolvedBindings};

/// A resolved component and its (already resolved) subcomponents, in the order they were
/// drained from the queue.
pub struct ResolvedComponentTree {
    resolver: ResolverRef,
    subgraphs: Vec<ResolvedComponentTree>,
}

impl ResolvedComponentTree {
    pub fn component_node(&self) -> &ResolverRef {
        &self.resolver
    }

    pub fn component_path(&self) -> ComponentPath {
        self.resolver.borrow().component_path().clone()
    }

    pub fn component_descriptor(&self) -> Arc<ComponentDescriptor> {
        self.resolver.borrow().component_descriptor_arc()
    }

    /// Contribution or members-injection resolution for `request`, walking to parent when
    /// absent locally (contribution bindings only).
    pub fn resolved_bindings(&self, request: &DependencyRequest) -> Option<ResolvedBindings> {
        self.resolver.borrow().resolved_bindings(&request.key, request.kind)
    }

    /// This component's own local resolutions (contribution ∪ members-injection), no parent
    /// walk.
    pub fn resolved_bindings_iter(&self) -> Vec<(crate::key::Key, ResolvedBindings)> {
        self.resolver
            .borrow()
            .resolved_bindings_iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Subgraphs in the order their subcomponents were drained from the queue.
    pub fn subgraphs(&self) -> &[ResolvedComponentTree] {
        &self.subgraphs
    }
}

pub struct Orchestrator;

impl Orchestrator {
    /// Resolves every entry point of `root_descriptor` (and, transitively, every nested
    /// subcomponent it reaches) into a tree of per-component resolution tables.
    #[tracing::instrument(skip_all)]
    pub fn build_graph(
        root_descriptor: Arc<ComponentDescriptor>,
        full_mode: bool,
        inject_registry: Rc<dyn InjectBindingRegistry>,
        options: Rc<CompilerOptions>,
    ) -> ResolvedComponentTree {
        let interner = new_shared_interner();
        let declarations = root_descriptor.declarations.clone();
        let root = Resolver::new_root(root_descriptor, declarations, interner, inject_registry, options);
        Self::build_subtree(root, full_mode)
    }

    fn build_subtree(resolver: ResolverRef, full_mode: bool) -> ResolvedComponentTree {
        let descriptor = resolver.borrow().component_descriptor_arc();

        // Step 2: seed every entry point.
        for entry_point in &descriptor.entry_points {
            if entry_point.is_members_injection() {
                resolver.borrow_mut().resolve_members_injection(&entry_point.request.key);
            } else {
                resolver.borrow_mut().resolve(&entry_point.request.key);
            }
        }

        // Step 3: full-binding-graph mode resolves every module-originated declaration too.
        if full_mode {
            let keys: Vec<crate::key::Key> = descriptor
                .declarations
                .all_declared_keys()
                .map(|k| k.strip_multibinding_contribution_identifier())
                .collect();
            for key in keys {
                resolver.borrow_mut().resolve(&key);
            }
        }

        // Step 4: drain this resolver's subcomponent queue, re-reading it after every
        // recursive build since a descendant may enqueue onto an ancestor.
        let mut subgraphs = Vec::new();
        loop {
            let next = resolver.borrow_mut().pop_queued_subcomponent();
            let Some((_creator_key, child_descriptor)) = next else {
                break;
            };
            let child_declarations = child_descriptor.declarations.clone();
            let child_resolver = Resolver::new_child(&resolver, child_descriptor, child_declarations);
            subgraphs.push(Self::build_subtree(child_resolver, full_mode));
        }

        ResolvedComponentTree { resolver, subgraphs }
    }
}
