// irpass-core: pass vocabulary and the native-engine boundary for irpass
//
// Architecture:
// - pass: the closed set of optimizer passes and their name tables
// - level: the optimization/size tuning axis
// - unit: the opaque compilation unit and its function chain
// - engine: the trait boundary onto the external pass machinery

pub mod engine;
pub mod level;
pub mod pass;
pub mod unit;

pub use engine::{Keepalive, PassEngine, PassScope};
pub use level::{OptLevel, ParseLevelError};
pub use pass::{MustPreserve, Pass};
pub use unit::{CompilationUnit, Functions, GlobalKind, IrGlobal};
