//! Core traits and types for driving optimization models.
//!
//! This crate defines the shared abstractions that a driver builds on:
//!
//! - [`NameMap`] — an insertion-ordered name-to-value mapping
//! - [`VariableMeta`], [`Indices`], [`Registry`] — per-variable scaling and
//!   selection metadata
//! - [`StateStore`], [`FlatState`] — named views into a model's flat state
//! - [`Model`], [`ProblemMeta`] — the model being driven and the metadata it
//!   registers
//! - [`TotalsEngine`], [`Partials`] — the source of raw total derivatives

mod meta;
mod model;
mod names;
mod state;
mod totals;

pub use meta::{Indices, Registry, VariableMeta};
pub use model::{Model, ProblemMeta};
pub use names::NameMap;
pub use state::{FlatState, StateError, StateStore};
pub use totals::{Partials, TotalsEngine};
