//! # morphex-engine
//!
//! The pattern compiler and matching engine.
//!
//! The pipeline, from a checked configuration and pattern source to spans:
//!
//! ```text
//! definitions ── builder ──▶ Patterns (IR)
//! Patterns ── variant expansion ──▶ PatternVariants
//! PatternVariants ── States::compile ──▶ States
//! States × Text ── MatchContext ──▶ MatchedSpan*
//! ```
//!
//! Expansion is bounded: the caller picks a maximal variant length and every
//! recursive pattern reference runs under a per-name budget that shrinks on
//! re-entry, so even mutually recursive pattern sets expand to a finite,
//! deduplicated variant list. The matcher then explores the compiled state
//! machine depth-first, narrowing per-word annotation sets under agreement
//! conditions and restoring every mutation on backtrack.

pub mod builder;
pub mod conditions;
pub mod ir;
pub mod matcher;
pub mod states;
pub mod transposition;
pub mod variants;

pub use builder::{build_patterns_from_file, build_patterns_from_source, PatternsBuilder};
pub use conditions::{Condition, Conditions};
pub use ir::{Pattern, PatternArgument, PatternBase, Patterns, SignRestriction, SignRestrictions};
pub use matcher::{MatchContext, MatchedSpan};
pub use states::{States, StateIndex};
pub use transposition::{TranspositionSupport, MAX_TRANSPOSITION_SIZE};
pub use variants::{PatternBuildContext, PatternVariant, PatternVariants, PatternWord};
