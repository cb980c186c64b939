//! # morphex-base
//!
//! Pure structural atoms for the morphex ecosystem.
//!
//! This crate provides the foundational types used throughout morphex:
//!
//! - [`OrderedSet`] — insertion-sorted vector sets with linear set algebra
//! - [`Interner`]/[`Symbol`] — string interning for O(1) equality
//! - [`Span`] — byte-offset extents for tokens and diagnostics
//!
//! # Design Principles
//!
//! This crate has **no knowledge of word attributes, patterns or I/O**. It
//! provides only generic, reusable infrastructure that higher-level crates
//! build upon.

pub mod intern;
pub mod ordered;
pub mod span;

pub use intern::{Interner, Symbol};
pub use ordered::OrderedSet;
pub use span::Span;
