use crate::level::OptLevel;
use crate::pass::Pass;
use crate::unit::CompilationUnit;
use std::any::Any;

/// Scope at which a pass manager applies its passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassScope {
    /// Runs once per function in the compilation unit.
    Function,
    /// Runs once over the whole compilation unit.
    Module,
}

/// Contexts that must outlive a pass manager that may call back into them.
///
/// An engine that hands a closure through an opaque-context pointer to a
/// native callback cannot let that closure drop while the pass manager is
/// alive. It boxes the context and retains it here; the caller keeps the
/// collection alive exactly as long as the manager it was populated for.
#[derive(Default)]
pub struct Keepalive {
    contexts: Vec<Box<dyn Any>>,
}

impl Keepalive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retains `context` until the collection is dropped.
    pub fn retain(&mut self, context: Box<dyn Any>) {
        self.contexts.push(context);
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

impl std::fmt::Debug for Keepalive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keepalive")
            .field("contexts", &self.contexts.len())
            .finish()
    }
}

/// The boundary onto the external pass-management and pass-population
/// machinery.
///
/// The pipeliner drives this trait and nothing else: it never inspects IR,
/// never schedules passes itself, and assumes every engine call succeeds once
/// a valid pass is supplied. Dropping a [`PassEngine::Manager`] releases the
/// underlying native resource.
pub trait PassEngine {
    /// The compilation unit this engine mutates.
    type Unit: CompilationUnit;
    /// Opaque handle to a configured sequence of passes.
    type Manager;

    /// Creates an empty module-scoped pass manager.
    fn create_manager(&mut self) -> Self::Manager;

    /// Creates an empty function-scoped pass manager bound to `unit`.
    fn create_function_manager(&mut self, unit: &Self::Unit) -> Self::Manager;

    /// Configures one pass into `manager`.
    ///
    /// Callback contexts the engine must keep alive (for example the
    /// internalize predicate) are retained in `keepalive`, which the caller
    /// guarantees to outlive `manager`.
    fn add_pass(&mut self, manager: &mut Self::Manager, pass: &Pass, keepalive: &mut Keepalive);

    /// Populates `manager` with the standard pass set for the given scope and
    /// tuning pair.
    fn populate_standard(
        &mut self,
        manager: &mut Self::Manager,
        scope: PassScope,
        opt: OptLevel,
        size: OptLevel,
    );

    /// Prepares a function-scoped manager for a sequence of per-function
    /// runs.
    fn initialize_function_manager(&mut self, manager: &mut Self::Manager);

    /// Runs `manager` once over the whole unit, mutating it in place.
    fn run_on_unit(&mut self, manager: &mut Self::Manager, unit: &mut Self::Unit);

    /// Runs `manager` once over a single function of `unit`.
    fn run_on_function(
        &mut self,
        manager: &mut Self::Manager,
        unit: &mut Self::Unit,
        function: <Self::Unit as CompilationUnit>::Function,
    );
}
