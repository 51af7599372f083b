//! Bounded prompt context built from retrieval hits.

pub mod assembler;

pub use assembler::{
    AssembledContext, AssemblyReport, ContextAssembler, ContextBudget, DEFAULT_MAX_CONTEXT_CHARS,
    FilterOutcome, TRUNCATION_MARKER, format_block,
};
