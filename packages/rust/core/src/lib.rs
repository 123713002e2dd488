//! Aggregation pipeline: chained provider lookups and the correlation join.
//!
//! This crate provides:
//! - [`Correlator`] — drives the four lookup stages per identifier and joins
//!   the batched property fetch back onto the per-identifier records
//! - [`RateGate`] — fixed-interval pacing between upstream lookups

pub mod correlator;
pub mod gate;

pub use correlator::Correlator;
pub use gate::RateGate;
