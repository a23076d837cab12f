//! Benchmark support crate for agglo.
//!
//! Provides seeded synthetic point sets and parameter labels for the
//! Criterion benchmarks of the matrix and vector linkage drivers.

pub mod error;
pub mod params;
pub mod source;
