//! Analysis modules.
//!
//! The aggregator computes per-domain common solved sets and the averaged
//! report rows built on them.

pub mod aggregator;

pub use aggregator::*;
