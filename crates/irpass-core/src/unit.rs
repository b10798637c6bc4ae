/// The kind of a global value presented to an internalize predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalKind {
    Function,
    Alias,
    Variable,
}

/// Read-only view of a global value, as presented to the internalize
/// predicate by the engine.
pub trait IrGlobal {
    fn name(&self) -> &str;
    fn kind(&self) -> GlobalKind;
}

/// An opaque container of functions and globals owned by the caller.
///
/// Functions are exposed the way the native layer stores them: as a chain of
/// opaque handles walked with a "first" and a "next" accessor. Handles are
/// plain copies, not borrows, so the engine can mutate the unit while a walk
/// is in progress.
pub trait CompilationUnit {
    /// Opaque handle to one function in this unit.
    type Function: Copy;

    /// The head of the function chain, in the unit's declared order.
    fn first_function(&self) -> Option<Self::Function>;

    /// The function after `function` in declared order.
    fn next_function(&self, function: Self::Function) -> Option<Self::Function>;

    /// Lazy forward-only walk over the function chain. Each call starts a
    /// fresh walk from [`CompilationUnit::first_function`].
    fn functions(&self) -> Functions<'_, Self>
    where
        Self: Sized,
    {
        Functions {
            unit: self,
            cursor: None,
            started: false,
        }
    }
}

/// Iterator over a unit's function chain. See
/// [`CompilationUnit::functions`].
pub struct Functions<'a, U: CompilationUnit> {
    unit: &'a U,
    cursor: Option<U::Function>,
    started: bool,
}

impl<U: CompilationUnit> Iterator for Functions<'_, U> {
    type Item = U::Function;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor = match self.cursor {
            None if !self.started => {
                self.started = true;
                self.unit.first_function()
            }
            None => None,
            Some(current) => self.unit.next_function(current),
        };
        self.cursor
    }
}
