use crate::unit::IrGlobal;
use std::fmt;
use std::sync::Arc;

/// Predicate consulted by the internalize pass for every global in the
/// compilation unit. Returning `true` preserves the global's linkage.
///
/// Engines that cross an FFI boundary must keep the closure alive for as long
/// as the pass manager that may invoke it; see [`crate::engine::Keepalive`].
pub type MustPreserve = Arc<dyn Fn(&dyn IrGlobal) -> bool + Send + Sync>;

/// The closed set of optimizer passes the engine knows how to configure.
///
/// Every variant except [`Pass::Internalize`] and [`Pass::Invalid`] is a plain
/// identifier with a stable textual name; see [`Pass::name`] and
/// [`Pass::from_name`].
#[derive(Clone)]
pub enum Pass {
    /// SSA-based aggressive dead code elimination. Assumes instructions are
    /// dead until proven otherwise.
    AggressiveDce,
    /// Bit-tracking dead code elimination. Removes computations of dead bits.
    BitTrackingDce,
    /// Uses assume intrinsics to set load/store alignments.
    AlignmentFromAssumptions,
    /// Merges basic blocks, eliminates unreachable blocks, simplifies
    /// terminators.
    CfgSimplification,
    /// Deletes stores that are post-dominated by must-aliased stores.
    DeadStoreElimination,
    /// Converts vector operations into scalar operations.
    Scalarizer,
    /// Merges loads and stores in diamonds: loads hoisted into the header,
    /// stores sunk into the footer.
    MergedLoadStoreMotion,
    /// Global value numbering with redundant load elimination.
    Gvn,
    /// Canonicalizes induction variables to a single one per loop.
    IndVarSimplify,
    /// Combines instructions into fewer, simpler instructions. Does not
    /// modify the CFG; tends to leave dead instructions behind, so pair it
    /// with a DCE pass.
    InstructionCombining,
    /// Threads control through multi-pred/multi-succ blocks where some
    /// predecessors always reach some successor.
    JumpThreading,
    /// Loop-invariant code motion and memory promotion.
    Licm,
    /// Deletes non-infinite loops provable dead.
    LoopDeletion,
    /// Recognizes and replaces common idioms in loops.
    LoopIdiom,
    /// Simple loop rotation.
    LoopRotate,
    /// Simple loop rerolling.
    LoopReroll,
    /// Simple loop unrolling.
    LoopUnroll,
    /// Loop unroll-and-jam.
    LoopUnrollAndJam,
    /// Simple loop unswitching.
    LoopUnswitch,
    /// Lowers atomic intrinsics to non-atomic form for non-preemptible
    /// environments.
    LowerAtomic,
    /// Eliminates `memcpy` calls and combines stores into memsets.
    MemCpyOpt,
    /// Inlines the fast path of library calls such as sqrt.
    PartiallyInlineLibCalls,
    /// Lowers switch instructions to chained binary branches.
    LowerSwitch,
    /// Promotes memory references to register references (mem2reg).
    PromoteMemoryToRegister,
    /// Adds DWARF discriminators to distinguish CFG paths that share line and
    /// column information.
    AddDiscriminators,
    /// Reassociates commutative expressions to promote better constant
    /// propagation and CSE, e.g. `4 + (x + 5)` into `x + (4 + 5)`.
    Reassociate,
    /// Sparse conditional constant propagation.
    Sccp,
    /// Eliminates calls immediately preceding a return from the same
    /// function.
    TailCallElimination,
    /// Demotes register references back to memory (reg2mem). Undoes
    /// [`Pass::PromoteMemoryToRegister`] to make CFG hacking easier.
    DemoteMemoryToRegister,
    /// Propagates CFG-derived value information.
    CorrelatedValuePropagation,
    /// Fast common subexpression elimination over the dominator tree.
    EarlyCse,
    /// Removes `expect` intrinsics, recording branch-weight metadata.
    LowerExpectIntrinsic,
    /// Metadata-driven type-based alias analysis.
    TypeBasedAliasAnalysis,
    /// Metadata-driven scoped no-alias analysis.
    ScopedNoAliasAa,
    /// The primary stateless local alias analysis. Schedule ahead of other AA
    /// passes.
    BasicAliasAnalysis,
    /// Alias and mod/ref analysis for non-address-taken internal globals.
    GlobalsAliasAnalysis,
    /// Ensures each function has at most one return instruction.
    UnifyFunctionExitNodes,
    /// Runs the IR verifier to sanity check the results of prior passes.
    Verifier,
    /// Inlines and removes functions marked always-inline.
    AlwaysInliner,
    /// Promotes small by-reference arguments to by-value.
    ArgumentPromotion,
    /// Merges duplicate global constants into a single shared constant.
    ConstantMerge,
    /// Removes function arguments unused by the body.
    DeadArgElimination,
    /// Walks call-graph SCCs in RPO to deduce and propagate function
    /// attributes.
    FunctionAttrs,
    /// Heuristic inlining of direct calls to small functions.
    FunctionInlining,
    /// Eliminates unreachable internal globals, functions and variables both.
    GlobalDce,
    /// Optimizes non-address-taken internal globals.
    GlobalOptimizer,
    /// Interprocedural sparse conditional constant propagation.
    IpSccp,
    /// Turns invoke instructions into calls when the callee cannot unwind.
    PruneEh,
    /// Scalar replacement of aggregates (SROA): breaks up aggregate allocas
    /// into component scalars.
    ScalarReplacementOfAggregates,
    /// Removes unused function declarations.
    StripDeadPrototypes,
    /// Strips symbols without touching debug info.
    StripSymbols,
    /// Widens loop instructions to operate on consecutive iterations.
    LoopVectorize,
    /// Superword-level parallelism: combines similar independent instructions
    /// into vector instructions.
    SlpVectorize,
    /// Internalizes every global in the compilation unit, optionally keeping
    /// `main` external.
    InternalizeAll { preserve_main: bool },
    /// Internalizes globals for which the carried predicate returns `false`.
    ///
    /// Build one with [`Pass::internalize`].
    Internalize(MustPreserve),
    /// A removed or renamed pass. Configuring it into a pass manager is
    /// fatal; the reason is surfaced in the panic message.
    Invalid { reason: &'static str },
}

impl Pass {
    /// Removed upstream; use [`Pass::Sccp`] instead.
    pub const CONSTANT_PROPAGATION: Pass = Pass::Invalid {
        reason: "the constant propagation pass has been removed, use sccp instead",
    };
    /// Removed upstream; use [`Pass::IpSccp`] instead.
    pub const IP_CONSTANT_PROPAGATION: Pass = Pass::Invalid {
        reason: "the IP constant propagation pass has been removed, use ipsccp instead",
    };
    /// Removed upstream; instruction combining subsumes it.
    pub const SIMPLIFY_LIB_CALLS: Pass = Pass::Invalid {
        reason: "the simplify-lib-calls pass has been removed",
    };
    /// Renamed upstream to [`Pass::ScalarReplacementOfAggregates`].
    pub const SCALAR_REPL_AGGREGATES: Pass = Pass::Invalid {
        reason: "scalar-repl-aggregates has been renamed to sroa",
    };

    /// Every pass constructible from a textual name, in configuration-table
    /// order.
    pub const NAMED: &'static [Pass] = &[
        Pass::AggressiveDce,
        Pass::BitTrackingDce,
        Pass::AlignmentFromAssumptions,
        Pass::CfgSimplification,
        Pass::DeadStoreElimination,
        Pass::Scalarizer,
        Pass::MergedLoadStoreMotion,
        Pass::Gvn,
        Pass::IndVarSimplify,
        Pass::InstructionCombining,
        Pass::JumpThreading,
        Pass::Licm,
        Pass::LoopDeletion,
        Pass::LoopIdiom,
        Pass::LoopRotate,
        Pass::LoopReroll,
        Pass::LoopUnroll,
        Pass::LoopUnrollAndJam,
        Pass::LoopUnswitch,
        Pass::LowerAtomic,
        Pass::MemCpyOpt,
        Pass::PartiallyInlineLibCalls,
        Pass::LowerSwitch,
        Pass::PromoteMemoryToRegister,
        Pass::AddDiscriminators,
        Pass::Reassociate,
        Pass::Sccp,
        Pass::TailCallElimination,
        Pass::DemoteMemoryToRegister,
        Pass::CorrelatedValuePropagation,
        Pass::EarlyCse,
        Pass::LowerExpectIntrinsic,
        Pass::TypeBasedAliasAnalysis,
        Pass::ScopedNoAliasAa,
        Pass::BasicAliasAnalysis,
        Pass::GlobalsAliasAnalysis,
        Pass::UnifyFunctionExitNodes,
        Pass::Verifier,
        Pass::AlwaysInliner,
        Pass::ArgumentPromotion,
        Pass::ConstantMerge,
        Pass::DeadArgElimination,
        Pass::FunctionAttrs,
        Pass::FunctionInlining,
        Pass::GlobalDce,
        Pass::GlobalOptimizer,
        Pass::IpSccp,
        Pass::PruneEh,
        Pass::ScalarReplacementOfAggregates,
        Pass::StripDeadPrototypes,
        Pass::StripSymbols,
        Pass::LoopVectorize,
        Pass::SlpVectorize,
        Pass::InternalizeAll {
            preserve_main: false,
        },
        Pass::InternalizeAll {
            preserve_main: true,
        },
    ];

    /// Builds an internalize pass from a preservation predicate. Globals for
    /// which the predicate returns `false` have their linkage internalized.
    pub fn internalize<F>(must_preserve: F) -> Pass
    where
        F: Fn(&dyn IrGlobal) -> bool + Send + Sync + 'static,
    {
        Pass::Internalize(Arc::new(must_preserve))
    }

    /// The stable textual name of this pass.
    pub fn name(&self) -> &'static str {
        match self {
            Pass::AggressiveDce => "aggressive-dce",
            Pass::BitTrackingDce => "bit-tracking-dce",
            Pass::AlignmentFromAssumptions => "alignment-from-assumptions",
            Pass::CfgSimplification => "cfg-simplification",
            Pass::DeadStoreElimination => "dead-store-elimination",
            Pass::Scalarizer => "scalarizer",
            Pass::MergedLoadStoreMotion => "merged-load-store-motion",
            Pass::Gvn => "gvn",
            Pass::IndVarSimplify => "ind-var-simplify",
            Pass::InstructionCombining => "instruction-combining",
            Pass::JumpThreading => "jump-threading",
            Pass::Licm => "licm",
            Pass::LoopDeletion => "loop-deletion",
            Pass::LoopIdiom => "loop-idiom",
            Pass::LoopRotate => "loop-rotate",
            Pass::LoopReroll => "loop-reroll",
            Pass::LoopUnroll => "loop-unroll",
            Pass::LoopUnrollAndJam => "loop-unroll-and-jam",
            Pass::LoopUnswitch => "loop-unswitch",
            Pass::LowerAtomic => "lower-atomic",
            Pass::MemCpyOpt => "memcpy-opt",
            Pass::PartiallyInlineLibCalls => "partially-inline-lib-calls",
            Pass::LowerSwitch => "lower-switch",
            Pass::PromoteMemoryToRegister => "mem2reg",
            Pass::AddDiscriminators => "add-discriminators",
            Pass::Reassociate => "reassociate",
            Pass::Sccp => "sccp",
            Pass::TailCallElimination => "tail-call-elimination",
            Pass::DemoteMemoryToRegister => "reg2mem",
            Pass::CorrelatedValuePropagation => "correlated-value-propagation",
            Pass::EarlyCse => "early-cse",
            Pass::LowerExpectIntrinsic => "lower-expect-intrinsic",
            Pass::TypeBasedAliasAnalysis => "tbaa",
            Pass::ScopedNoAliasAa => "scoped-no-alias-aa",
            Pass::BasicAliasAnalysis => "basic-aa",
            Pass::GlobalsAliasAnalysis => "globals-aa",
            Pass::UnifyFunctionExitNodes => "unify-function-exit-nodes",
            Pass::Verifier => "verifier",
            Pass::AlwaysInliner => "always-inliner",
            Pass::ArgumentPromotion => "argument-promotion",
            Pass::ConstantMerge => "constant-merge",
            Pass::DeadArgElimination => "dead-arg-elimination",
            Pass::FunctionAttrs => "function-attrs",
            Pass::FunctionInlining => "function-inlining",
            Pass::GlobalDce => "global-dce",
            Pass::GlobalOptimizer => "global-optimizer",
            Pass::IpSccp => "ipsccp",
            Pass::PruneEh => "prune-eh",
            Pass::ScalarReplacementOfAggregates => "sroa",
            Pass::StripDeadPrototypes => "strip-dead-prototypes",
            Pass::StripSymbols => "strip-symbols",
            Pass::LoopVectorize => "loop-vectorize",
            Pass::SlpVectorize => "slp-vectorize",
            Pass::InternalizeAll {
                preserve_main: false,
            } => "internalize-all",
            Pass::InternalizeAll {
                preserve_main: true,
            } => "internalize-all-keep-main",
            Pass::Internalize(_) => "internalize",
            Pass::Invalid { .. } => "invalid",
        }
    }

    /// Resolves a textual pass name. Passes carrying a closure payload and
    /// the invalid marker are not nameable.
    pub fn from_name(name: &str) -> Option<Pass> {
        let pass = match name {
            "aggressive-dce" => Pass::AggressiveDce,
            "bit-tracking-dce" => Pass::BitTrackingDce,
            "alignment-from-assumptions" => Pass::AlignmentFromAssumptions,
            "cfg-simplification" => Pass::CfgSimplification,
            "dead-store-elimination" => Pass::DeadStoreElimination,
            "scalarizer" => Pass::Scalarizer,
            "merged-load-store-motion" => Pass::MergedLoadStoreMotion,
            "gvn" => Pass::Gvn,
            "ind-var-simplify" => Pass::IndVarSimplify,
            "instruction-combining" => Pass::InstructionCombining,
            "jump-threading" => Pass::JumpThreading,
            "licm" => Pass::Licm,
            "loop-deletion" => Pass::LoopDeletion,
            "loop-idiom" => Pass::LoopIdiom,
            "loop-rotate" => Pass::LoopRotate,
            "loop-reroll" => Pass::LoopReroll,
            "loop-unroll" => Pass::LoopUnroll,
            "loop-unroll-and-jam" => Pass::LoopUnrollAndJam,
            "loop-unswitch" => Pass::LoopUnswitch,
            "lower-atomic" => Pass::LowerAtomic,
            "memcpy-opt" => Pass::MemCpyOpt,
            "partially-inline-lib-calls" => Pass::PartiallyInlineLibCalls,
            "lower-switch" => Pass::LowerSwitch,
            "mem2reg" => Pass::PromoteMemoryToRegister,
            "add-discriminators" => Pass::AddDiscriminators,
            "reassociate" => Pass::Reassociate,
            "sccp" => Pass::Sccp,
            "tail-call-elimination" => Pass::TailCallElimination,
            "reg2mem" => Pass::DemoteMemoryToRegister,
            "correlated-value-propagation" => Pass::CorrelatedValuePropagation,
            "early-cse" => Pass::EarlyCse,
            "lower-expect-intrinsic" => Pass::LowerExpectIntrinsic,
            "tbaa" => Pass::TypeBasedAliasAnalysis,
            "scoped-no-alias-aa" => Pass::ScopedNoAliasAa,
            "basic-aa" => Pass::BasicAliasAnalysis,
            "globals-aa" => Pass::GlobalsAliasAnalysis,
            "unify-function-exit-nodes" => Pass::UnifyFunctionExitNodes,
            "verifier" => Pass::Verifier,
            "always-inliner" => Pass::AlwaysInliner,
            "argument-promotion" => Pass::ArgumentPromotion,
            "constant-merge" => Pass::ConstantMerge,
            "dead-arg-elimination" => Pass::DeadArgElimination,
            "function-attrs" => Pass::FunctionAttrs,
            "function-inlining" => Pass::FunctionInlining,
            "global-dce" => Pass::GlobalDce,
            "global-optimizer" => Pass::GlobalOptimizer,
            "ipsccp" => Pass::IpSccp,
            "prune-eh" => Pass::PruneEh,
            "sroa" => Pass::ScalarReplacementOfAggregates,
            "strip-dead-prototypes" => Pass::StripDeadPrototypes,
            "strip-symbols" => Pass::StripSymbols,
            "loop-vectorize" => Pass::LoopVectorize,
            "slp-vectorize" => Pass::SlpVectorize,
            "internalize-all" => Pass::InternalizeAll {
                preserve_main: false,
            },
            "internalize-all-keep-main" => Pass::InternalizeAll {
                preserve_main: true,
            },
            _ => return None,
        };
        Some(pass)
    }
}

impl fmt::Debug for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Invalid { reason } => f.debug_struct("Invalid").field("reason", reason).finish(),
            other => f.write_str(other.name()),
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn names_round_trip() {
        for pass in Pass::NAMED {
            let resolved = Pass::from_name(pass.name());
            assert_eq!(resolved.as_ref().map(Pass::name), Some(pass.name()));
        }
    }

    #[test]
    fn names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for pass in Pass::NAMED {
            assert!(seen.insert(pass.name()), "duplicate name {}", pass.name());
        }
    }

    #[test]
    fn unnameable_passes_do_not_resolve() {
        assert!(Pass::from_name("internalize").is_none());
        assert!(Pass::from_name("invalid").is_none());
        assert!(Pass::from_name("no-such-pass").is_none());
    }

    #[test]
    fn removed_passes_are_invalid_markers() {
        for pass in [
            Pass::CONSTANT_PROPAGATION,
            Pass::IP_CONSTANT_PROPAGATION,
            Pass::SIMPLIFY_LIB_CALLS,
            Pass::SCALAR_REPL_AGGREGATES,
        ] {
            assert!(matches!(pass, Pass::Invalid { .. }), "{pass:?}");
        }
    }

    #[test]
    fn internalize_carries_its_predicate() {
        let pass = Pass::internalize(|global| global.name() == "main");
        match pass {
            Pass::Internalize(ref predicate) => {
                struct Fake;
                impl IrGlobal for Fake {
                    fn name(&self) -> &str {
                        "main"
                    }
                    fn kind(&self) -> crate::unit::GlobalKind {
                        crate::unit::GlobalKind::Function
                    }
                }
                assert!(predicate(&Fake));
            }
            ref other => panic!("expected internalize, got {other:?}"),
        }
        assert_eq!(pass.name(), "internalize");
    }
}
