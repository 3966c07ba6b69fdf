//! Flight Module
//!
//! Singleflight request coalescing: at most one execution per key at a time,
//! with every concurrent caller for that key receiving the same result.

mod group;

#[cfg(test)]
mod property_tests;

pub use group::{Execution, FlightError, Group};
