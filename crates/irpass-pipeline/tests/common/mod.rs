// Test doubles: a vector-backed compilation unit and an engine that records
// every call the pipeliner makes into it.

use irpass_core::{
    CompilationUnit, GlobalKind, IrGlobal, Keepalive, MustPreserve, OptLevel, Pass, PassEngine,
    PassScope,
};
use std::sync::{Arc, Weak};

pub struct TestGlobal {
    pub name: String,
    pub kind: GlobalKind,
    pub internalized: bool,
}

impl IrGlobal for TestGlobal {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> GlobalKind {
        self.kind
    }
}

pub struct TestUnit {
    pub functions: Vec<String>,
    pub globals: Vec<TestGlobal>,
}

impl TestUnit {
    pub fn new(functions: &[&str], globals: &[&str]) -> Self {
        Self {
            functions: functions.iter().map(|f| f.to_string()).collect(),
            globals: globals
                .iter()
                .map(|g| TestGlobal {
                    name: g.to_string(),
                    kind: GlobalKind::Variable,
                    internalized: false,
                })
                .collect(),
        }
    }
}

impl CompilationUnit for TestUnit {
    type Function = usize;

    fn first_function(&self) -> Option<usize> {
        (!self.functions.is_empty()).then_some(0)
    }

    fn next_function(&self, function: usize) -> Option<usize> {
        let next = function + 1;
        (next < self.functions.len()).then_some(next)
    }
}

pub struct InternalizeContext {
    predicate: MustPreserve,
}

enum ConfiguredPass {
    Named(&'static str),
    Internalize(Weak<InternalizeContext>),
}

pub struct TestManager {
    id: usize,
    passes: Vec<ConfiguredPass>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    CreateManager {
        manager: usize,
        scope: PassScope,
    },
    Configure {
        manager: usize,
        pass: &'static str,
    },
    PopulateStandard {
        manager: usize,
        scope: PassScope,
        opt: OptLevel,
        size: OptLevel,
    },
    Initialize {
        manager: usize,
    },
    RunOnUnit {
        manager: usize,
    },
    RunOnFunction {
        manager: usize,
        function: String,
    },
}

/// Engine that performs no IR work; it records the calls the pipeliner makes
/// and evaluates internalize predicates against the test unit's globals.
#[derive(Default)]
pub struct RecordingEngine {
    next_id: usize,
    pub events: Vec<Event>,
    /// Weak handle to the most recent internalize context, used to observe
    /// that keepalives are released with their transient manager.
    pub last_internalize: Option<Weak<InternalizeContext>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_manager(&mut self, scope: PassScope) -> TestManager {
        let id = self.next_id;
        self.next_id += 1;
        self.events.push(Event::CreateManager { manager: id, scope });
        TestManager {
            id,
            passes: Vec::new(),
        }
    }

    /// The unit-level runs in event order, as (manager, configured passes).
    pub fn unit_runs(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::RunOnUnit { manager } => Some(*manager),
                _ => None,
            })
            .collect()
    }

    /// Names of passes configured into `manager`, in configuration order.
    pub fn configured(&self, manager: usize) -> Vec<&'static str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Configure { manager: m, pass } if *m == manager => Some(*pass),
                _ => None,
            })
            .collect()
    }
}

impl PassEngine for RecordingEngine {
    type Unit = TestUnit;
    type Manager = TestManager;

    fn create_manager(&mut self) -> TestManager {
        self.fresh_manager(PassScope::Module)
    }

    fn create_function_manager(&mut self, _unit: &TestUnit) -> TestManager {
        self.fresh_manager(PassScope::Function)
    }

    fn add_pass(&mut self, manager: &mut TestManager, pass: &Pass, keepalive: &mut Keepalive) {
        match pass {
            Pass::Internalize(predicate) => {
                let context = Arc::new(InternalizeContext {
                    predicate: predicate.clone(),
                });
                let weak = Arc::downgrade(&context);
                keepalive.retain(Box::new(context));
                self.last_internalize = Some(weak.clone());
                manager.passes.push(ConfiguredPass::Internalize(weak));
            }
            Pass::Invalid { .. } => unreachable!("the pipeliner rejects invalid passes"),
            other => manager.passes.push(ConfiguredPass::Named(other.name())),
        }
        self.events.push(Event::Configure {
            manager: manager.id,
            pass: pass.name(),
        });
    }

    fn populate_standard(
        &mut self,
        manager: &mut TestManager,
        scope: PassScope,
        opt: OptLevel,
        size: OptLevel,
    ) {
        self.events.push(Event::PopulateStandard {
            manager: manager.id,
            scope,
            opt,
            size,
        });
    }

    fn initialize_function_manager(&mut self, manager: &mut TestManager) {
        self.events.push(Event::Initialize {
            manager: manager.id,
        });
    }

    fn run_on_unit(&mut self, manager: &mut TestManager, unit: &mut TestUnit) {
        self.events.push(Event::RunOnUnit {
            manager: manager.id,
        });
        for pass in &manager.passes {
            if let ConfiguredPass::Internalize(weak) = pass {
                let context = weak
                    .upgrade()
                    .expect("internalize context dropped before its manager ran");
                for global in unit.globals.iter_mut() {
                    let keep = (context.predicate)(&*global);
                    global.internalized = !keep;
                }
            }
        }
    }

    fn run_on_function(&mut self, manager: &mut TestManager, unit: &mut TestUnit, function: usize) {
        self.events.push(Event::RunOnFunction {
            manager: manager.id,
            function: unit.functions[function].clone(),
        });
    }
}
