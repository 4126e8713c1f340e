//! Resolves a component hierarchy's dependency-injection binding graph.
//!
//! Given a root [`component::ComponentDescriptor`] (with nested subcomponents, entry points,
//! and declaration sets already extracted by an external front end), [`orchestrator::Orchestrator::build_graph`]
//! computes, for every component in the hierarchy, which binding satisfies each requested key,
//! at which component that binding is owned, and which synthetic bindings (multibindings,
//! optionals, delegates, subcomponent creators) had to be materialized to make that true.
//!
//! Missing or duplicate bindings are not diagnosed here — see [`error`] for the narrower set of
//! things this crate does treat as fatal (broken internal invariants, not malformed input).

pub mod binding;
pub mod collaborators;
pub mod component;
pub mod declarations;
pub mod error;
pub mod interner;
pub mod key;
pub mod orchestrator;
pub mod ownership;
pub mod request;
pub mod reresolution;
pub mod resolver;
pub mod synthesis;

pub use binding::{Binding, BindingKind, Scope, ScopeKind};
pub use collaborators::{CompilerOptions, ConflictSeverity, EmptyInjectBindingRegistry, InjectBindingRegistry};
pub use component::{ComponentDescriptor, ComponentPath, EntryPoint};
pub use declarations::{ComponentDeclarations, DelegateDeclaration, MultibindingDeclaration, OptionalDeclaration};
pub use error::ResolverBug;
pub use key::{FrameworkWrapper, Key, ResolvedType};
pub use orchestrator::{Orchestrator, ResolvedComponentTree};
pub use request::{DependencyRequest, RequestKind};
pub use resolver::{BindingNode, BindingNodeData, Resolver, ResolverRef, ResolvedBindings};
