use irpass_core::{CompilationUnit, Keepalive, OptLevel, Pass, PassEngine, PassScope};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// What a registered stage will do when its turn comes.
enum StagePlan<E: PassEngine> {
    /// A list of passes configured into a transient manager at execution
    /// time.
    Passes(Vec<Pass>),
    /// A pre-built function-scoped manager, run once per function.
    FunctionManager(E::Manager),
    /// A pre-built module-scoped manager, run once over the unit.
    ModuleManager(E::Manager),
}

/// Accumulates the passes of one stage. Handed to the builder function of
/// [`PassPipeliner::add_stage`].
#[derive(Default)]
pub struct StageBuilder {
    passes: Vec<Pass>,
}

impl StageBuilder {
    /// Appends a pass to the stage under construction.
    pub fn add(&mut self, pass: Pass) -> &mut Self {
        self.passes.push(pass);
        self
    }
}

/// Sequences named stages of optimizer passes and executes them, in
/// registration order, against a single bound compilation unit.
///
/// Grouping passes into stages serves two purposes: optimizer passes are
/// extremely sensitive to their ordering relative to other passes, and named
/// groups allow otherwise unrelated passes to be segregated cleanly. A
/// pipeline might keep "mandatory" passes such as jump threading, LICM, and
/// DCE in one stage and diagnostic passes in another, then run either subset
/// through the `mask` parameter of [`PassPipeliner::execute_mask`].
///
/// The pipeliner borrows its engine and unit for its whole lifetime; it never
/// owns the unit. Pre-built stage managers are released when the pipeliner is
/// dropped.
pub struct PassPipeliner<'ctx, E: PassEngine> {
    engine: &'ctx mut E,
    unit: &'ctx mut E::Unit,
    stages: Vec<String>,
    plans: HashMap<String, StagePlan<E>>,
    frozen: bool,
}

/// Clears the frozen flag on every exit path out of `execute_mask`,
/// unwinding included.
struct Thaw<'a>(&'a mut bool);

impl Drop for Thaw<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

impl<'ctx, E: PassEngine> PassPipeliner<'ctx, E> {
    /// A new, empty pipeliner bound to `unit`.
    pub fn new(engine: &'ctx mut E, unit: &'ctx mut E::Unit) -> Self {
        Self {
            engine,
            unit,
            stages: Vec::new(),
            plans: HashMap::new(),
            frozen: false,
        }
    }

    /// The registered stage names, in registration order.
    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    /// Appends a pass-list stage.
    ///
    /// `build` receives a [`StageBuilder`] into which it adds the stage's
    /// passes; they will be configured in exactly that order. Registering a
    /// name a second time replaces the earlier stage in place, keeping its
    /// position in the order.
    ///
    /// Panics if the pipeline is currently executing.
    pub fn add_stage(&mut self, name: impl Into<String>, build: impl FnOnce(&mut StageBuilder)) {
        assert!(!self.frozen, "cannot add stages to a frozen pipeline");
        let mut builder = StageBuilder::default();
        build(&mut builder);
        self.register(name.into(), StagePlan::Passes(builder.passes));
    }

    /// Appends a stage holding a function-scoped manager populated with the
    /// standard pass set for the given tuning pair: `opt` controls
    /// optimization aggressiveness, `size` controls code-size aggressiveness.
    ///
    /// Panics if the pipeline is currently executing.
    pub fn add_standard_function_pipeline(
        &mut self,
        name: impl Into<String>,
        opt: OptLevel,
        size: OptLevel,
    ) {
        assert!(!self.frozen, "cannot add stages to a frozen pipeline");
        let mut manager = self.engine.create_function_manager(&*self.unit);
        self.engine
            .populate_standard(&mut manager, PassScope::Function, opt, size);
        self.register(name.into(), StagePlan::FunctionManager(manager));
    }

    /// Appends a stage holding a module-scoped manager populated with the
    /// standard pass set for the given tuning pair.
    ///
    /// Panics if the pipeline is currently executing.
    pub fn add_standard_module_pipeline(
        &mut self,
        name: impl Into<String>,
        opt: OptLevel,
        size: OptLevel,
    ) {
        assert!(!self.frozen, "cannot add stages to a frozen pipeline");
        let mut manager = self.engine.create_manager();
        self.engine
            .populate_standard(&mut manager, PassScope::Module, opt, size);
        self.register(name.into(), StagePlan::ModuleManager(manager));
    }

    fn register(&mut self, name: String, plan: StagePlan<E>) {
        // Last registration wins; a replaced stage keeps its position.
        if self.plans.insert(name.clone(), plan).is_none() {
            self.stages.push(name);
        }
    }

    /// Executes every registered stage, in registration order.
    pub fn execute(&mut self) {
        self.execute_mask(&HashSet::new());
    }

    /// Executes the registered stages whose names appear in `mask`, in
    /// registration order. An empty mask runs every stage. The mask filters;
    /// it never reorders.
    ///
    /// The same pipeline may be re-executed, but execution is not re-entrancy
    /// safe: the pipeline is frozen for the duration of the call, and both
    /// mutation and re-execution of a frozen pipeline panic.
    pub fn execute_mask(&mut self, mask: &HashSet<String>) {
        assert!(!self.frozen, "cannot execute a frozen pipeline");
        self.frozen = true;
        let Self {
            engine,
            unit,
            stages,
            plans,
            frozen,
        } = self;
        let _thaw = Thaw(frozen);

        for name in stages.iter() {
            if !mask.is_empty() && !mask.contains(name) {
                continue;
            }
            let plan = plans
                .get_mut(name)
                .unwrap_or_else(|| panic!("unregistered pass stage {name:?}"));
            match plan {
                StagePlan::Passes(passes) => {
                    if passes.is_empty() {
                        continue;
                    }
                    debug!(stage = %name, passes = passes.len(), "running pass-list stage");
                    run_pass_list(&mut **engine, &mut **unit, passes);
                }
                StagePlan::FunctionManager(manager) => {
                    debug!(stage = %name, "running standard function stage");
                    run_function_manager(&mut **engine, &mut **unit, manager);
                }
                StagePlan::ModuleManager(manager) => {
                    debug!(stage = %name, "running standard module stage");
                    engine.run_on_unit(manager, unit);
                }
            }
        }
    }
}

/// Builds a transient manager for one pass-list stage, runs it once over the
/// unit, and discards it. The keepalive for any callback contexts lives
/// exactly as long as the manager.
fn run_pass_list<E: PassEngine>(engine: &mut E, unit: &mut E::Unit, passes: &[Pass]) {
    let mut keepalive = Keepalive::new();
    let mut manager = engine.create_manager();
    for pass in passes {
        configure_pass(engine, &mut manager, pass, &mut keepalive);
    }
    engine.run_on_unit(&mut manager, unit);
}

/// Runs a pre-built function-scoped manager once per function, in the unit's
/// declared order.
fn run_function_manager<E: PassEngine>(
    engine: &mut E,
    unit: &mut E::Unit,
    manager: &mut E::Manager,
) {
    engine.initialize_function_manager(manager);
    let mut cursor = unit.first_function();
    while let Some(function) = cursor {
        engine.run_on_function(manager, unit, function);
        cursor = unit.next_function(function);
    }
}

/// Configures one pass into `manager`, rejecting invalid markers before they
/// reach the engine.
fn configure_pass<E: PassEngine>(
    engine: &mut E,
    manager: &mut E::Manager,
    pass: &Pass,
    keepalive: &mut Keepalive,
) {
    if let Pass::Invalid { reason } = pass {
        panic!("cannot configure pass: {reason}");
    }
    trace!(pass = pass.name(), "configuring pass");
    engine.add_pass(manager, pass, keepalive);
}
