//! End-to-end scenarios exercising ownership hoisting, re-resolution, and synthetic binding
//! construction across a small component hierarchy.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use binding_graph_resolver::*;

fn key(name: &str) -> Key {
    Key::new(ResolvedType::simple(name))
}

#[derive(Default)]
struct FakeInjectBindingRegistry {
    injections: HashMap<Key, Binding>,
    members_injectors: HashMap<Key, Binding>,
}

impl FakeInjectBindingRegistry {
    fn new() -> Self {
        Self::default()
    }

    fn with_injection(mut self, key: Key, binding: Binding) -> Self {
        self.injections.insert(key, binding);
        self
    }

    fn with_members_injector(mut self, key: Key, binding: Binding) -> Self {
        self.members_injectors.insert(key, binding);
        self
    }
}

impl InjectBindingRegistry for FakeInjectBindingRegistry {
    fn get_or_find_injection_binding(&self, key: &Key) -> Option<Binding> {
        self.injections.get(key).cloned()
    }

    fn get_or_find_members_injector_binding(&self, key: &Key) -> Option<Binding> {
        self.members_injectors.get(key).cloned()
    }
}

fn root_resolver(
    descriptor: ComponentDescriptor,
    registry: impl InjectBindingRegistry + 'static,
) -> ResolverRef {
    Resolver::new_root(
        Arc::new(descriptor),
        ComponentDeclarations::new(),
        interner::new_shared_interner(),
        Rc::new(registry),
        Rc::new(CompilerOptions::default()),
    )
}

/// S1 — hoisted singleton inject: a @Singleton-scoped `Foo @Inject(Bar)` requested only from a
/// subcomponent ends up installed at the root, and `Bar` (unscoped) follows it there.
#[test]
fn s1_hoisted_singleton_inject() {
    let singleton = Scope::new("Singleton", ScopeKind::Normal);
    let foo = key("test::Foo");
    let bar = key("test::Bar");

    let foo_binding = Binding::new(foo.clone(), BindingKind::Injection)
        .with_scope(singleton.clone())
        .with_dependencies(vec![DependencyRequest::instance(bar.clone())]);
    let bar_binding = Binding::new(bar.clone(), BindingKind::Injection);

    let registry = FakeInjectBindingRegistry::new()
        .with_injection(foo.clone(), foo_binding)
        .with_injection(bar.clone(), bar_binding);

    let root = root_resolver(
        ComponentDescriptor::root("test::Root").with_scope(singleton.clone()),
        registry,
    );
    let sub = Resolver::new_child(
        &root,
        Arc::new(ComponentDescriptor::subcomponent("test::Sub")),
        ComponentDeclarations::new(),
    );

    sub.borrow_mut().resolve(&foo);

    let root_foo = root.borrow().resolved_bindings_including_self(&foo).unwrap();
    assert_eq!(root_foo.bindings().len(), 1);
    let root_bar = root.borrow().resolved_bindings_including_self(&bar).unwrap();
    assert_eq!(root_bar.bindings().len(), 1);

    let sub_foo = sub.borrow().resolved_bindings_including_self(&foo).unwrap();
    let sub_nodes: Vec<_> = sub_foo.nodes().collect();
    let root_nodes: Vec<_> = root_foo.nodes().collect();
    assert_eq!(sub_nodes, root_nodes, "Sub must inherit the identical BindingNode Root owns");
}

/// S2 — multibinding inheritance requires re-resolution: a local `@IntoSet` contribution at a
/// subcomponent forces that subcomponent to resolve its own (larger) set rather than inherit
/// the root's.
#[test]
fn s2_multibinding_inheritance_requires_re_resolution() {
    let set_key = Key::new(ResolvedType::set(ResolvedType::simple("std::string::String")));

    let mut root_decls = ComponentDeclarations::new();
    root_decls.add_multibinding_contribution(
        set_key.clone(),
        Binding::new(set_key.clone().with_contribution_id(1), BindingKind::Provision),
    );

    let mut sub_decls = ComponentDeclarations::new();
    sub_decls.add_multibinding_contribution(
        set_key.clone(),
        Binding::new(set_key.clone().with_contribution_id(2), BindingKind::Provision),
    );

    let root = Resolver::new_root(
        Arc::new(ComponentDescriptor::root("test::Root")),
        root_decls,
        interner::new_shared_interner(),
        Rc::new(FakeInjectBindingRegistry::new()),
        Rc::new(CompilerOptions::default()),
    );
    let sub = Resolver::new_child(&root, Arc::new(ComponentDescriptor::subcomponent("test::Sub")), sub_decls);

    root.borrow_mut().resolve(&set_key);
    sub.borrow_mut().resolve(&set_key);

    let root_set = root.borrow().resolved_bindings_including_self(&set_key).unwrap();
    assert_eq!(root_set.bindings()[0].dependencies.len(), 1, "Root sees only its own contribution");

    let sub_set = sub.borrow().resolved_bindings_including_self(&set_key).unwrap();
    assert_eq!(sub_set.bindings()[0].dependencies.len(), 2, "Sub re-resolves with both contributions");

    let root_nodes: Vec<_> = root_set.nodes().collect();
    let sub_nodes: Vec<_> = sub_set.nodes().collect();
    assert_ne!(root_nodes, sub_nodes, "Sub must install its own node, not inherit Root's");
}

/// S3 — optional with missing inner: a bare `@BindsOptionalOf` with no binding anywhere for the
/// wrapped type still synthesizes a single OPTIONAL node; the missing inner is not an error here.
#[test]
fn s3_optional_with_missing_inner() {
    let foo = key("test::Foo");
    let optional_foo = Key::new(ResolvedType::optional(foo.type_().clone()));

    let mut decls = ComponentDeclarations::new();
    decls.add_optional_declaration(foo.clone(), OptionalDeclaration { contributing_module: None });

    let root = Resolver::new_root(
        Arc::new(ComponentDescriptor::root("test::Root")),
        decls,
        interner::new_shared_interner(),
        Rc::new(FakeInjectBindingRegistry::new()),
        Rc::new(CompilerOptions::default()),
    );

    root.borrow_mut().resolve(&optional_foo);

    let resolved = root.borrow().resolved_bindings_including_self(&optional_foo).unwrap();
    assert_eq!(resolved.bindings().len(), 1);
    assert_eq!(resolved.bindings()[0].kind, BindingKind::Optional);

    let inner = root.borrow().resolved_bindings_including_self(&foo).unwrap();
    assert!(inner.is_empty(), "missing inner binding resolves to an empty set, not an error");
}

/// S4 — floating provision blocked by missing: Root provides Foo(Bar) with no Bar bound
/// anywhere at Root; Sub separately provides Bar. Foo must stay resolved only at Root (with an
/// empty Bar there) rather than floating down to Sub and picking up Sub's local Bar.
#[test]
fn s4_floating_provision_blocked_by_missing() {
    let foo = key("test::Foo");
    let bar = key("test::Bar");

    let mut root_decls = ComponentDeclarations::new();
    root_decls.add_binding(
        foo.clone(),
        Binding::new(foo.clone(), BindingKind::Provision).with_dependencies(vec![DependencyRequest::instance(bar.clone())]),
    );

    let mut sub_decls = ComponentDeclarations::new();
    sub_decls.add_binding(bar.clone(), Binding::new(bar.clone(), BindingKind::Provision));

    let root = Resolver::new_root(
        Arc::new(ComponentDescriptor::root("test::Root")),
        root_decls,
        interner::new_shared_interner(),
        Rc::new(FakeInjectBindingRegistry::new()),
        Rc::new(CompilerOptions::default()),
    );
    let sub = Resolver::new_child(&root, Arc::new(ComponentDescriptor::subcomponent("test::Sub")), sub_decls);

    sub.borrow_mut().resolve(&foo);
    sub.borrow_mut().resolve(&bar);

    let foo_from_sub = sub.borrow().resolved_bindings(&foo, RequestKind::Instance).unwrap();
    let foo_from_root = root.borrow().resolved_bindings_including_self(&foo).unwrap();
    assert_eq!(
        foo_from_sub.nodes().collect::<Vec<_>>(),
        foo_from_root.nodes().collect::<Vec<_>>(),
        "Foo's resolution from Sub is exactly Root's"
    );

    let bar_at_root = root.borrow().resolved_bindings_including_self(&bar).unwrap();
    assert!(bar_at_root.is_empty(), "Bar was never resolved at Root through Foo's dependency walk");

    let bar_from_sub = sub.borrow().resolved_bindings(&bar, RequestKind::Instance).unwrap();
    assert_eq!(bar_from_sub.bindings().len(), 1, "Sub's own Bar resolution is separate and non-empty");
}

/// S5 — delegate cycle: two mutually delegating bindings resolve to UNRESOLVED_DELEGATE rather
/// than recursing forever.
#[test]
fn s5_delegate_cycle() {
    let a = key("test::A");
    let b = key("test::B");

    let mut decls = ComponentDeclarations::new();
    decls.add_delegate(a.clone(), DelegateDeclaration::new(DependencyRequest::instance(b.clone())));
    decls.add_delegate(b.clone(), DelegateDeclaration::new(DependencyRequest::instance(a.clone())));

    let root = Resolver::new_root(
        Arc::new(ComponentDescriptor::root("test::Root")),
        decls,
        interner::new_shared_interner(),
        Rc::new(FakeInjectBindingRegistry::new()),
        Rc::new(CompilerOptions::default()),
    );

    root.borrow_mut().resolve(&a);
    root.borrow_mut().resolve(&b);

    let resolved_a = root.borrow().resolved_bindings_including_self(&a).unwrap();
    assert_eq!(resolved_a.bindings()[0].kind, BindingKind::UnresolvedDelegate);
    let resolved_b = root.borrow().resolved_bindings_including_self(&b).unwrap();
    assert_eq!(resolved_b.bindings()[0].kind, BindingKind::UnresolvedDelegate);
}

/// S6 — subcomponent creator discovery: no entry point mentions the creator key, but it's
/// transitively reachable through an explicit binding; resolving it enqueues exactly one
/// subgraph no matter how many times it's requested.
#[test]
fn s6_subcomponent_creator_discovery() {
    let builder_key = key("test::Sub::Builder");
    let needs_builder_key = key("test::NeedsBuilder");

    let sub_descriptor = Arc::new(ComponentDescriptor::subcomponent("test::Sub"));

    let mut decls = ComponentDeclarations::new();
    decls.add_binding(builder_key.clone(), Binding::new(builder_key.clone(), BindingKind::Provision));
    decls.add_subcomponent(builder_key.clone(), Arc::clone(&sub_descriptor));
    decls.add_binding(
        needs_builder_key.clone(),
        Binding::new(needs_builder_key.clone(), BindingKind::Provision)
            .with_dependencies(vec![DependencyRequest::instance(builder_key.clone())]),
    );

    let root_descriptor = Arc::new(
        ComponentDescriptor::root("test::Root")
            .with_entry_point(EntryPoint::new("needsBuilder", DependencyRequest::instance(needs_builder_key.clone())))
            .with_declarations(decls),
    );

    let tree = Orchestrator::build_graph(
        root_descriptor,
        false,
        Rc::new(FakeInjectBindingRegistry::new()),
        Rc::new(CompilerOptions::default()),
    );

    assert_eq!(tree.subgraphs().len(), 1, "exactly one subgraph, regardless of how the creator key was reached");
    assert_eq!(tree.subgraphs()[0].component_descriptor().type_element.as_ref(), "test::Sub");

    // Requesting the creator key again directly must not enqueue a second subgraph.
    tree.component_node().borrow_mut().resolve(&builder_key);
    assert!(tree.component_node().borrow_mut().pop_queued_subcomponent().is_none());
}

/// A binding whose scope marks it production-colored is hoisted to the nearest production
/// component in the lineage even though that component doesn't carry a matching scope itself —
/// this is distinct from ordinary scope-membership hoisting.
#[test]
fn ownership_production_colored_binding_hoists_to_production_component() {
    let production = Scope::new("Production", ScopeKind::Production);
    let foo = key("test::Foo");

    let foo_binding = Binding::new(foo.clone(), BindingKind::Injection).with_scope(production);
    let registry = FakeInjectBindingRegistry::new().with_injection(foo.clone(), foo_binding);

    let root = root_resolver(ComponentDescriptor::root("test::Root").with_production(true), registry);
    let child = Resolver::new_child(&root, Arc::new(ComponentDescriptor::subcomponent("test::Sub")), ComponentDeclarations::new());

    child.borrow_mut().resolve(&foo);

    let root_foo = root.borrow().resolved_bindings_including_self(&foo).unwrap();
    assert_eq!(root_foo.bindings().len(), 1, "the production component installs it, not the plain root");

    let child_foo = child.borrow().resolved_bindings_including_self(&foo).unwrap();
    assert_eq!(
        child_foo.nodes().collect::<Vec<_>>(),
        root_foo.nodes().collect::<Vec<_>>(),
        "the child inherits the exact node the production component owns"
    );
}

/// A reusable-scoped binding, once resolved at an ancestor, is reused by identity at a
/// descendant rather than re-resolved into a distinct local node.
#[test]
fn ownership_reusable_scope_reuses_already_resolved_ancestor_node() {
    let reusable = Scope::new("Reusable", ScopeKind::Reusable);
    let foo = key("test::Foo");

    let mut root_decls = ComponentDeclarations::new();
    root_decls.add_binding(
        foo.clone(),
        Binding::new(foo.clone(), BindingKind::Provision).with_scope(reusable),
    );

    let root = Resolver::new_root(
        Arc::new(ComponentDescriptor::root("test::Root")),
        root_decls,
        interner::new_shared_interner(),
        Rc::new(FakeInjectBindingRegistry::new()),
        Rc::new(CompilerOptions::default()),
    );
    let child = Resolver::new_child(&root, Arc::new(ComponentDescriptor::subcomponent("test::Sub")), ComponentDeclarations::new());

    root.borrow_mut().resolve(&foo);
    child.borrow_mut().resolve(&foo);

    let root_foo = root.borrow().resolved_bindings_including_self(&foo).unwrap();
    let child_foo = child.borrow().resolved_bindings_including_self(&foo).unwrap();
    assert_eq!(
        child_foo.nodes().collect::<Vec<_>>(),
        root_foo.nodes().collect::<Vec<_>>(),
        "the child must reuse root's already-resolved node rather than install its own"
    );
}

/// A delegate multibinding contribution is synthesized under a stable contribution-tagged key
/// and stored (with its own dependency walked) the same way an ordinary contribution is, so the
/// multibound collection sees it as one of its dependencies.
#[test]
fn delegate_multibinding_contribution_resolves_its_tagged_key() {
    let set_key = Key::new(ResolvedType::set(ResolvedType::simple("std::string::String")));
    let target = key("test::StringProvider");

    let mut decls = ComponentDeclarations::new();
    decls.add_delegate_multibinding_contribution(
        set_key.clone(),
        DelegateDeclaration::new(DependencyRequest::instance(target.clone())),
    );
    decls.add_binding(target.clone(), Binding::new(target.clone(), BindingKind::Provision));

    let root = Resolver::new_root(
        Arc::new(ComponentDescriptor::root("test::Root")),
        decls,
        interner::new_shared_interner(),
        Rc::new(FakeInjectBindingRegistry::new()),
        Rc::new(CompilerOptions::default()),
    );

    root.borrow_mut().resolve(&set_key);

    let resolved_set = root.borrow().resolved_bindings_including_self(&set_key).unwrap();
    let multibound = &resolved_set.bindings()[0];
    assert_eq!(multibound.dependencies.len(), 1);

    let tagged_key = &multibound.dependencies[0].key;
    assert!(tagged_key.is_multibinding_contribution());

    let resolved_tagged = root.borrow().resolved_bindings_including_self(tagged_key).unwrap();
    assert_eq!(resolved_tagged.bindings().len(), 1);
    assert_eq!(resolved_tagged.bindings()[0].kind, BindingKind::Delegate);

    let resolved_target = root.borrow().resolved_bindings_including_self(&target).unwrap();
    assert_eq!(resolved_target.bindings().len(), 1, "the delegate's own target must have been walked and resolved too");
}

/// A `MembersInjector<T>`-shaped key resolves through the injected-members registry, independent
/// of any declaration.
#[test]
fn members_injector_binding_resolves_from_registry() {
    let inner = ResolvedType::simple("test::Foo");
    let mi_key = Key::new(ResolvedType::MembersInjector(Box::new(inner)));

    let binding = Binding::new(mi_key.clone(), BindingKind::MembersInjector);
    let registry = FakeInjectBindingRegistry::new().with_members_injector(mi_key.clone(), binding);

    let root = root_resolver(ComponentDescriptor::root("test::Root"), registry);
    root.borrow_mut().resolve(&mi_key);

    let resolved = root.borrow().resolved_bindings_including_self(&mi_key).unwrap();
    assert_eq!(resolved.bindings().len(), 1);
    assert_eq!(resolved.bindings()[0].kind, BindingKind::MembersInjector);
}

/// An assisted-factory-shaped key is synthesized unconditionally, with no declaration or
/// registry entry required.
#[test]
fn assisted_factory_binding_is_synthesized_without_declaration() {
    let af_key = Key::new(ResolvedType::AssistedFactory { path: "test::FooFactory".into() });

    let root = root_resolver(ComponentDescriptor::root("test::Root"), FakeInjectBindingRegistry::new());
    root.borrow_mut().resolve(&af_key);

    let resolved = root.borrow().resolved_bindings_including_self(&af_key).unwrap();
    assert_eq!(resolved.bindings().len(), 1);
    assert_eq!(resolved.bindings()[0].kind, BindingKind::AssistedFactory);
}
