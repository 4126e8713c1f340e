use crate::binding::Binding;
use crate::key::Key;

/// External collaborator: given a key, may produce an implicit constructor-injection binding
/// or a members-injector binding.
///
/// This is consumed, never implemented, by the resolver — producing these bindings from
/// annotations is a front-end concern. The default in-memory implementation in this crate's
/// tests stands in for what would otherwise be a view over annotation-processor output.
pub trait InjectBindingRegistry {
    /// The implicit `@Inject`-constructor binding for `key`, if its type has one.
    fn get_or_find_injection_binding(&self, key: &Key) -> Option<Binding>;

    /// The members-injector binding for `key` (a `MembersInjector<T>` key), if `T` declares
    /// injected members.
    fn get_or_find_members_injector_binding(&self, key: &Key) -> Option<Binding>;
}

/// A registry with nothing in it — useful as a default when members-injection and implicit
/// constructor injection are out of scope for a particular call site.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyInjectBindingRegistry;

impl InjectBindingRegistry for EmptyInjectBindingRegistry {
    fn get_or_find_injection_binding(&self, _key: &Key) -> Option<Binding> {
        None
    }

    fn get_or_find_members_injector_binding(&self, _key: &Key) -> Option<Binding> {
        None
    }
}

/// Severity the embedding driver wants for the "an explicit binding conflicts with an implicit
/// `@Inject` binding for the same key" situation. The resolver doesn't act on this value — it
/// only threads it through so a later diagnostic pass can honour it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConflictSeverity {
    Error,
    Warning,
    #[default]
    None,
    Note,
}

/// Knobs the embedding compiler driver exposes to the resolver. Not a file format — this is
/// constructed in-process by whoever owns the overall compilation pipeline.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    explicit_binding_conflicts_with_inject_validation_type: ConflictSeverity,
    /// Whether full-binding-graph mode should resolve every declaration or only
    /// module-originated ones. Defaults to the conservative, module-only behavior.
    pub full_binding_graph_mode_includes_all_declarations: bool,
    /// Governs `has_duplicate_explicit_binding`'s treatment of floating injection bindings:
    /// when `true`, an `INJECTION` binding is excluded from the "previously resolved" set
    /// before checking for a local duplicate, so a local explicit binding doesn't appear to
    /// silently override a floating inject binding that was never actually installed yet.
    pub exclude_injection_from_duplicate_check: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            explicit_binding_conflicts_with_inject_validation_type: ConflictSeverity::default(),
            full_binding_graph_mode_includes_all_declarations: false,
            exclude_injection_from_duplicate_check: true,
        }
    }
}

impl CompilerOptions {
    pub fn explicit_binding_conflicts_with_inject_validation_type(&self) -> ConflictSeverity {
        self.explicit_binding_conflicts_with_inject_validation_type
    }

    pub fn with_explicit_binding_conflicts_with_inject_validation_type(
        mut self,
        severity: ConflictSeverity,
    ) -> Self {
        self.explicit_binding_conflicts_with_inject_validation_type = severity;
        self
    }

    /// Whether strict multibinding rules apply to `binding`. The reference implementation
    /// wires this up to a per-binding opt-in; absent that signal, every binding uses the
    /// relaxed (non-strict) rules, which only affects downstream diagnosis and is therefore
    /// inert at this layer.
    pub fn use_strict_multibindings(&self, _binding: &Binding) -> bool {
        false
    }
}
